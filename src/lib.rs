//! A software 3-D rasterizer: transform, light, clip, project and shade
//! triangle meshes into a 32 bit pixel buffer on the CPU.
//!
//! [`device::RenderDevice`] is the entry point; bind vertex/index buffers
//! and a texture, set the transforms, and submit triangle lists or strips.
//! [`window::App`] wraps it in a winit/softbuffer shell that presents the
//! pixel buffer and drives a [`window::FrameListener`].

pub mod buffer;
pub mod clipper;
pub mod color;
pub mod device;
mod error;
pub mod geometry;
pub mod input;
pub mod lighting;
pub mod maths;
pub mod rasterizer;
pub mod texture;
pub mod window;

pub use error::RenderError;
