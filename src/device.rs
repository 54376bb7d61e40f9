//! The render device orchestrates a draw: assemble vertices from the bound
//! buffers, transform to world/camera space, light, cull, project, clip,
//! then hand each surviving triangle to the rasterizer.

use std::rc::Rc;

use crate::{
    RenderError,
    buffer::{DepthBuffer, PixelBuffer},
    clipper::TriangleClipper,
    color::Color32,
    geometry::{IndexBuffer, Vertex, VertexBuffer},
    lighting::{LightFilter, LightTable},
    maths::{Mat4, Vec3, cotan},
    rasterizer::Rasterizer,
    texture::Texture,
};

/// Light slots the device reserves at startup.
pub const DEVICE_LIGHT_SLOTS: usize = 5;

/// Bits per display pixel. Only 32 bit output is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    Bit16,
    Bit32,
}

/// Affine interpolates UVs linearly in screen space; cheap but distorts
/// under foreshortening. Perspective correction is accepted but downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMapping {
    Affine,
    Perspective,
}

/// Which winding is treated as front-facing by the backface cull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullWinding {
    Clockwise,
    AntiClockwise,
}

#[derive(Debug, Clone, Copy)]
pub struct InitParams {
    pub buffer_width: u32,
    pub buffer_height: u32,
    pub use_z_buffer: bool,
    pub bit_depth: BitDepth,
    pub tex_mapping: TextureMapping,
}

impl Default for InitParams {
    fn default() -> Self {
        Self {
            buffer_width: 800,
            buffer_height: 600,
            use_z_buffer: false,
            bit_depth: BitDepth::Bit32,
            tex_mapping: TextureMapping::Affine,
        }
    }
}

/// Screen-space blit source rectangle, half open on right/bottom.
#[derive(Debug, Clone, Copy)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub submitted: u32,
    pub culled: u32,
    pub drawn: u32,
}

#[derive(Clone, Copy)]
enum Fill<'a> {
    Solid,
    Textured(&'a Texture),
}

pub struct RenderDevice {
    pixels: PixelBuffer,
    depth: DepthBuffer,
    rasterizer: Rasterizer,
    clipper: TriangleClipper,
    lights: LightTable,

    vertex_source: Option<Rc<VertexBuffer>>,
    index_source: Option<Rc<IndexBuffer>>,
    source_texture: Option<Rc<Texture>>,

    world: Mat4,
    world_inv: Mat4,
    camera: Mat4,
    camera_inv: Mat4,
    cam_location: Vec3,
    /// Committed object-to-camera concatenation `world * camera^-1`.
    transform: Mat4,

    fov: f32,
    near_plane: f32,
    far_plane: f32,
    focal_x: f32,
    focal_y: f32,
    half_vp_w: f32,
    half_vp_h: f32,

    culling_enabled: bool,
    cull_winding: CullWinding,
    tex_mapping: TextureMapping,
    use_z_buffer: bool,

    stats: RenderStats,
}

impl RenderDevice {
    pub fn new(params: InitParams) -> Result<Self, RenderError> {
        if params.buffer_width < 1 || params.buffer_height < 1 {
            log::error!(
                "invalid back-buffer dimensions for render device: {}x{}",
                params.buffer_width,
                params.buffer_height
            );
            return Err(RenderError::InvalidDimensions {
                width: params.buffer_width,
                height: params.buffer_height,
            });
        }
        if params.bit_depth != BitDepth::Bit32 {
            log::error!("display bit depth {:?} is not implemented", params.bit_depth);
            return Err(RenderError::UnsupportedBitDepth(params.bit_depth));
        }

        let tex_mapping = match params.tex_mapping {
            TextureMapping::Perspective => {
                log::warn!("perspective texture mapping downgraded to affine");
                TextureMapping::Affine
            }
            affine => affine,
        };

        let mut device = Self {
            pixels: PixelBuffer::new(params.buffer_width, params.buffer_height),
            depth: DepthBuffer::new(params.buffer_width, params.buffer_height),
            rasterizer: Rasterizer::new(params.buffer_height),
            clipper: TriangleClipper::new(
                params.buffer_width as f32,
                params.buffer_height as f32,
            ),
            lights: LightTable::new(DEVICE_LIGHT_SLOTS),
            vertex_source: None,
            index_source: None,
            source_texture: None,
            world: Mat4::identity(),
            world_inv: Mat4::identity(),
            camera: Mat4::identity(),
            camera_inv: Mat4::identity(),
            cam_location: Vec3::default(),
            transform: Mat4::identity(),
            fov: 45.,
            near_plane: 1.,
            far_plane: 1000.,
            focal_x: 0.,
            focal_y: 0.,
            half_vp_w: 0.,
            half_vp_h: 0.,
            culling_enabled: false,
            cull_winding: CullWinding::Clockwise,
            tex_mapping,
            use_z_buffer: params.use_z_buffer,
            stats: RenderStats::default(),
        };
        device.clipper.set_view_planes(device.near_plane, device.far_plane);
        device.calculate_focal();
        log::info!(
            "render device startup successful ({}x{})",
            params.buffer_width,
            params.buffer_height
        );
        Ok(device)
    }

    // *********************************************************************
    // Configuration
    // *********************************************************************

    pub fn set_clip_planes(&mut self, near_plane: f32, far_plane: f32) {
        self.near_plane = near_plane;
        self.far_plane = far_plane;
        self.clipper.set_view_planes(near_plane, far_plane);
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
        self.calculate_focal();
    }

    fn calculate_focal(&mut self) {
        let width = self.pixels.width() as f32;
        let height = self.pixels.height() as f32;

        self.half_vp_h = height * 0.5;
        self.half_vp_w = width * 0.5;

        let cot_fov = cotan((self.fov * 0.5).to_radians());
        self.focal_y = self.half_vp_h * cot_fov;
        self.focal_x = self.focal_y * (height / width);
    }

    pub fn set_texture_mapping(&mut self, mapping: TextureMapping) {
        self.tex_mapping = match mapping {
            TextureMapping::Perspective => {
                log::warn!("perspective texture mapping downgraded to affine");
                TextureMapping::Affine
            }
            affine => affine,
        };
    }

    pub fn texture_mapping(&self) -> TextureMapping {
        self.tex_mapping
    }

    pub fn enable_backface_culling(&mut self, enable: bool) {
        self.culling_enabled = enable;
    }

    pub fn is_backface_culling_enabled(&self) -> bool {
        self.culling_enabled
    }

    pub fn set_cull_winding(&mut self, winding: CullWinding) {
        self.cull_winding = winding;
    }

    pub fn is_z_buffer_enabled(&self) -> bool {
        self.use_z_buffer
    }

    /// Route textured triangles through the rasterizer's edge-list batch
    /// mode instead of the direct span fill.
    pub fn set_edge_list_mode(&mut self, enabled: bool) {
        self.rasterizer.set_edge_list_mode(enabled);
    }

    pub fn lights(&mut self) -> &mut LightTable {
        &mut self.lights
    }

    // *********************************************************************
    // Transform stack
    // *********************************************************************

    pub fn set_world_transform(&mut self, m: Mat4) {
        self.world = m;
    }

    pub fn set_camera_transform(&mut self, m: Mat4) {
        self.camera = m;
        self.cam_location = Vec3::new(m.translation[0], m.translation[1], m.translation[2]);
        self.camera_inv = m.inverse();
    }

    /// Recompute `world^-1` and the object-to-camera concatenation after
    /// the transforms changed.
    pub fn commit_matrix_changes(&mut self) {
        self.world_inv = self.world.inverse();
        self.transform = self.world * self.camera_inv;
    }

    pub fn world_transform(&self) -> &Mat4 {
        &self.world
    }

    pub fn camera_transform(&self) -> &Mat4 {
        &self.camera
    }

    pub fn world_inverse(&self) -> &Mat4 {
        &self.world_inv
    }

    pub fn camera_location(&self) -> Vec3 {
        self.cam_location
    }

    // *********************************************************************
    // Buffer state and presentation surface
    // *********************************************************************

    pub fn clear_back_buffer(&mut self, value: u32) {
        self.pixels.clear(value);
    }

    pub fn clear_z_buffer(&mut self) {
        self.depth.clear(DepthBuffer::DEPTH_MAX);
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        self.pixels.plot(x, y, color);
    }

    /// Raw pixels for the platform presenter to blit.
    pub fn pixels(&self) -> &[u32] {
        self.pixels.pixels()
    }

    pub fn buffer_width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn buffer_height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn set_vertex_buffer(&mut self, buffer: &Rc<VertexBuffer>) {
        self.vertex_source = Some(buffer.clone());
    }

    pub fn set_index_buffer(&mut self, buffer: &Rc<IndexBuffer>) {
        self.index_source = Some(buffer.clone());
    }

    pub fn set_source_texture(&mut self, texture: &Rc<Texture>) {
        self.source_texture = Some(texture.clone());
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn reset_stats_counters(&mut self) {
        self.stats = RenderStats::default();
    }

    // *********************************************************************
    // Per-vertex pipeline stages
    // *********************************************************************

    fn to_world_camera_space(&self, vert: &mut Vertex) {
        vert.set_position(self.transform.transform_point(vert.position()));
    }

    fn to_world_space(&self, vert: &mut Vertex) {
        vert.set_position(self.world.transform_point(vert.position()));
    }

    fn to_camera_space(&self, vert: &mut Vertex) {
        vert.set_position(self.camera_inv.transform_point(vert.position()));
    }

    /// Perspective-project a camera-space vertex onto the screen, writing
    /// the screen coordinates and normalised depth back in place.
    pub(crate) fn project_vertex(&self, vert: &mut Vertex) {
        let mut p = vert.position();
        self.project_point(&mut p);
        vert.set_position(p);
    }

    fn project_point(&self, p: &mut Vec3) {
        let q = self.far_plane / (self.far_plane - self.near_plane);
        let w = p.z;
        let x = self.focal_x * p.x / w;
        // Y is inverted: +Y is up in the world but down in screen space.
        let y = self.focal_y * -p.y / w;
        let z = (p.z * q - q * self.near_plane) / w;
        p.x = x + self.half_vp_w;
        p.y = y + self.half_vp_h;
        p.z = z;
    }

    /// Backface test in camera space: the pinhole sits at the origin, so a
    /// vertex position doubles as the view ray.
    fn is_backfacing(&mut self, verts: &[Vertex; 3]) -> bool {
        if !self.culling_enabled {
            return false;
        }

        let v1 = verts[0].position();
        let v2 = verts[1].position();
        let v3 = verts[2].position();
        let view_normal = v1.normalize();

        let normal = match self.cull_winding {
            CullWinding::Clockwise => (v3 - v1).cross(v3 - v2),
            CullWinding::AntiClockwise => (v3 - v2).cross(v3 - v1),
        }
        .normalize();

        if normal.dot(view_normal) >= 0. {
            self.stats.culled += 1;
            return true;
        }
        false
    }

    /// Cull, near/far reject, project, clip and rasterize one camera-space
    /// triangle.
    fn submit_camera_triangle(&mut self, mut tri: [Vertex; 3], fill: Fill<'_>) {
        if self.is_backfacing(&tri) {
            return;
        }
        if self.clipper.rejects_depth(&tri) {
            self.stats.culled += 1;
            return;
        }

        for v in tri.iter_mut() {
            self.project_vertex(v);
        }

        let mut clipped = [Vertex::default(); 9];
        let total = self.clipper.clip_triangle(&tri, &mut clipped);
        for j in 0..total {
            let sub = [clipped[j * 3], clipped[j * 3 + 1], clipped[j * 3 + 2]];
            self.stats.drawn += 1;
            match fill {
                Fill::Solid => self.rasterizer.rasterize_tri_solid(&mut self.pixels, &sub),
                Fill::Textured(texture) => {
                    self.rasterizer.rasterize_tri_tex(&mut self.pixels, texture, &sub)
                }
            }
        }
    }

    // *********************************************************************
    // Draw submission
    // *********************************************************************

    /// Triangle list, color only, Gouraud shaded.
    pub fn draw_tris_col_list(&mut self, use_index_buffer: bool, total_tris: usize, start: usize) {
        self.draw_list(use_index_buffer, total_tris, start, false, false);
    }

    /// Triangle list with per-vertex lighting evaluated in world space
    /// before culling.
    pub fn draw_tris_col_lit_list(
        &mut self,
        use_index_buffer: bool,
        total_tris: usize,
        start: usize,
    ) {
        self.draw_list(use_index_buffer, total_tris, start, true, false);
    }

    /// Affine textured triangle list.
    pub fn draw_tris_tex_list(&mut self, use_index_buffer: bool, total_tris: usize, start: usize) {
        self.draw_list(use_index_buffer, total_tris, start, false, true);
    }

    /// Reserved: lit textured lists are not implemented.
    pub fn draw_tris_tex_lit_list(
        &mut self,
        _use_index_buffer: bool,
        _total_tris: usize,
        _start: usize,
    ) {
    }

    /// Colour-only triangle strip.
    pub fn draw_tris_col_strip(&mut self, use_index_buffer: bool, total_tris: usize, start: usize) {
        self.draw_strip(use_index_buffer, total_tris, start, false);
    }

    /// Reserved: lit strips are not implemented.
    pub fn draw_tris_col_lit_strip(
        &mut self,
        _use_index_buffer: bool,
        _total_tris: usize,
        _start: usize,
    ) {
    }

    /// Affine textured triangle strip.
    pub fn draw_tris_tex_strip(&mut self, use_index_buffer: bool, total_tris: usize, start: usize) {
        self.draw_strip(use_index_buffer, total_tris, start, true);
    }

    /// Reserved: lit textured strips are not implemented.
    pub fn draw_tris_tex_lit_strip(
        &mut self,
        _use_index_buffer: bool,
        _total_tris: usize,
        _start: usize,
    ) {
    }

    fn draw_list(
        &mut self,
        use_index_buffer: bool,
        total_tris: usize,
        start: usize,
        lit: bool,
        textured: bool,
    ) {
        let Some(sources) = self.bind_sources(use_index_buffer, textured) else {
            return;
        };
        let (vertex_source, index_source, texture) = sources;

        for t in 0..total_tris {
            let base = start + t * 3;
            let Some(mut tri) =
                load_triangle(&vertex_source, index_source.as_deref(), base)
            else {
                return;
            };
            self.stats.submitted += 1;

            if lit {
                for v in tri.iter_mut() {
                    self.to_world_space(v);
                }
                for v in tri.iter_mut() {
                    self.lights.process_vertex(v, &self.world, LightFilter::All);
                }
                for v in tri.iter_mut() {
                    self.to_camera_space(v);
                }
            } else {
                for v in tri.iter_mut() {
                    self.to_world_camera_space(v);
                }
            }

            let fill = match &texture {
                Some(texture) => Fill::Textured(texture.as_ref()),
                None => Fill::Solid,
            };
            self.submit_camera_triangle(tri, fill);
        }
    }

    fn draw_strip(
        &mut self,
        use_index_buffer: bool,
        total_tris: usize,
        start: usize,
        textured: bool,
    ) {
        let Some(sources) = self.bind_sources(use_index_buffer, textured) else {
            return;
        };
        let (vertex_source, index_source, texture) = sources;

        let mut window = [Vertex::default(); 3];
        for (i, slot) in window.iter_mut().enumerate() {
            let Some(v) = load_vertex(&vertex_source, index_source.as_deref(), start + i) else {
                return;
            };
            *slot = v;
            self.to_world_camera_space(slot);
        }

        // Each following vertex replaces the oldest slot of the window.
        let mut next_swap = 0;
        for t in 0..total_tris {
            self.stats.submitted += 1;
            let fill = match &texture {
                Some(texture) => Fill::Textured(texture.as_ref()),
                None => Fill::Solid,
            };
            self.submit_camera_triangle(window, fill);

            if t + 1 < total_tris {
                let Some(mut v) =
                    load_vertex(&vertex_source, index_source.as_deref(), start + t + 3)
                else {
                    return;
                };
                self.to_world_camera_space(&mut v);
                window[next_swap % 3] = v;
                next_swap += 1;
            }
        }
    }

    /// Edge-only rendering of a triangle list in the given color.
    pub fn draw_wire_frame(
        &mut self,
        use_index_buffer: bool,
        total_tris: usize,
        start: usize,
        color: Color32,
    ) {
        let Some(sources) = self.bind_sources(use_index_buffer, false) else {
            return;
        };
        let (vertex_source, index_source, _) = sources;

        for t in 0..total_tris {
            let base = start + t * 3;
            let Some(mut tri) =
                load_triangle(&vertex_source, index_source.as_deref(), base)
            else {
                return;
            };
            for v in tri.iter_mut() {
                v.color = color;
                self.to_world_camera_space(v);
            }
            if self.clipper.rejects_depth(&tri) {
                continue;
            }
            for v in tri.iter_mut() {
                self.project_vertex(v);
            }

            let mut clipped = [Vertex::default(); 9];
            let total = self.clipper.clip_triangle(&tri, &mut clipped);
            for j in 0..total {
                self.rasterizer.rasterize_tri_edges(
                    &mut self.pixels,
                    &clipped[j * 3],
                    &clipped[j * 3 + 1],
                    &clipped[j * 3 + 2],
                );
            }
        }
    }

    /// Short line segments from every vertex along its normal.
    pub fn draw_normals(&mut self, buffer: &VertexBuffer, color: Color32, normal_length: f32) {
        for vert in buffer.vertices() {
            let mut start = self.transform.transform_point(vert.position());
            let mut end = self
                .transform
                .transform_point(vert.position() + vert.normal() * normal_length);

            // Segments reaching behind the near plane would project to
            // garbage coordinates.
            if start.z <= self.near_plane || end.z <= self.near_plane {
                continue;
            }
            self.project_point(&mut start);
            self.project_point(&mut end);

            self.rasterizer.plot_line(
                &mut self.pixels,
                start.x.ceil() as i32,
                start.y.ceil() as i32,
                end.x.ceil() as i32,
                end.y.ceil() as i32,
                color,
                color,
            );
        }
    }

    /// Screen-space blit of a texture at `(x, y)`, optionally restricted to
    /// a source rectangle, optionally skipping one chroma-key color.
    pub fn draw_texture_2d(
        &mut self,
        x: u32,
        y: u32,
        texture: &Texture,
        src_rect: Option<Rect>,
        chroma_key: Option<u32>,
    ) {
        let rect = src_rect.unwrap_or(Rect {
            left: 0,
            top: 0,
            right: texture.width(),
            bottom: texture.height(),
        });
        let right = rect.right.min(texture.width());
        let bottom = rect.bottom.min(texture.height());
        if rect.left >= right || rect.top >= bottom {
            return;
        }

        let buffer_width = self.pixels.width() as usize;
        let buffer_height = self.pixels.height();
        let span = (right - rect.left).min(self.pixels.width().saturating_sub(x)) as usize;
        if span == 0 {
            return;
        }

        for (row_offset, row) in (rect.top..bottom).enumerate() {
            let dest_y = y + row_offset as u32;
            if dest_y >= buffer_height {
                break;
            }
            let dest_base = x as usize + dest_y as usize * buffer_width;
            let src_base = rect.left as usize + row as usize * texture.width() as usize;

            match chroma_key {
                None => {
                    self.pixels.pixels_mut()[dest_base..dest_base + span]
                        .copy_from_slice(&texture.texels()[src_base..src_base + span]);
                }
                Some(filter) => {
                    for col in 0..span {
                        let texel = texture.texels()[src_base + col];
                        if texel != filter {
                            self.pixels.pixels_mut()[dest_base + col] = texel;
                        }
                    }
                }
            }
        }
    }

    fn bind_sources(
        &self,
        use_index_buffer: bool,
        textured: bool,
    ) -> Option<(Rc<VertexBuffer>, Option<Rc<IndexBuffer>>, Option<Rc<Texture>>)> {
        let Some(vertex_source) = self.vertex_source.clone() else {
            log::error!("draw submitted without a bound vertex buffer");
            return None;
        };
        let index_source = if use_index_buffer {
            match self.index_source.clone() {
                Some(buffer) => Some(buffer),
                None => {
                    log::error!("indexed draw submitted without a bound index buffer");
                    return None;
                }
            }
        } else {
            None
        };
        let texture = if textured {
            match self.source_texture.clone() {
                Some(texture) => Some(texture),
                None => {
                    log::error!("textured draw submitted without a bound texture");
                    return None;
                }
            }
        } else {
            None
        };
        Some((vertex_source, index_source, texture))
    }
}

/// Index values are trusted; a slip past the end only asserts in debug.
fn load_vertex(
    vertex_source: &VertexBuffer,
    index_source: Option<&IndexBuffer>,
    i: usize,
) -> Option<Vertex> {
    let slot = match index_source {
        Some(indices) => {
            let index = indices.indices().get(i).copied();
            debug_assert!(index.is_some(), "index buffer overrun at {i}");
            index? as usize
        }
        None => i,
    };
    let vertex = vertex_source.vertices().get(slot).copied();
    debug_assert!(vertex.is_some(), "vertex buffer overrun at {slot}");
    vertex
}

fn load_triangle(
    vertex_source: &VertexBuffer,
    index_source: Option<&IndexBuffer>,
    base: usize,
) -> Option<[Vertex; 3]> {
    Some([
        load_vertex(vertex_source, index_source, base)?,
        load_vertex(vertex_source, index_source, base + 1)?,
        load_vertex(vertex_source, index_source, base + 2)?,
    ])
}
