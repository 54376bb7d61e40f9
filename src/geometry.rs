//! Vertices and the owning vertex/index containers, plus the raw
//! little-endian mesh file readers.

use std::{fs::File, io::BufReader, path::Path};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::{RenderError, color::Color32, maths::Vec3};

/// The single vertex record used through the whole pipeline. Position is
/// rewritten in place as the vertex moves from object to camera to screen
/// space, and the color slot carries the lighting result.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub color: Color32,
    pub u: f32,
    pub v: f32,
    pub nx: f32,
    pub ny: f32,
    pub nz: f32,
}

impl Vertex {
    pub const fn new(
        position: Vec3,
        color: Color32,
        u: f32,
        v: f32,
        normal: Vec3,
    ) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            color,
            u,
            v,
            nx: normal.x,
            ny: normal.y,
            nz: normal.z,
        }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn set_position(&mut self, p: Vec3) {
        self.x = p.x;
        self.y = p.y;
        self.z = p.z;
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::new(self.nx, self.ny, self.nz)
    }
}

/// Owns a finite sequence of vertices, immutable after creation and
/// addressed by 16 bit offsets.
pub struct VertexBuffer {
    vertices: Vec<Vertex>,
}

impl VertexBuffer {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        debug_assert!(vertices.len() <= u16::MAX as usize);
        Self { vertices }
    }

    /// Read `total_verts` packed records: x,y,z (f32), r,g,b,a (u8),
    /// u,v (f32), nx,ny,nz (f32), all little-endian.
    pub fn from_file<P: AsRef<Path>>(path: P, total_verts: usize) -> Result<Self, RenderError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut vertices = Vec::with_capacity(total_verts);
        for _ in 0..total_verts {
            let x = reader.read_f32::<LittleEndian>()?;
            let y = reader.read_f32::<LittleEndian>()?;
            let z = reader.read_f32::<LittleEndian>()?;
            let r = reader.read_u8()?;
            let g = reader.read_u8()?;
            let b = reader.read_u8()?;
            let a = reader.read_u8()?;
            let u = reader.read_f32::<LittleEndian>()?;
            let v = reader.read_f32::<LittleEndian>()?;
            let nx = reader.read_f32::<LittleEndian>()?;
            let ny = reader.read_f32::<LittleEndian>()?;
            let nz = reader.read_f32::<LittleEndian>()?;
            vertices.push(Vertex {
                x,
                y,
                z,
                color: Color32::new(r, g, b, a),
                u,
                v,
                nx,
                ny,
                nz,
            });
        }
        log::info!("model file loaded ({} vertices)", vertices.len());
        Ok(Self::new(vertices))
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> u16 {
        self.vertices.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Owns a finite sequence of 16 bit indices into a vertex buffer.
pub struct IndexBuffer {
    indices: Vec<u16>,
}

impl IndexBuffer {
    pub fn new(indices: Vec<u16>) -> Self {
        Self { indices }
    }

    /// Read `total_indices` packed little-endian u16 values.
    pub fn from_file<P: AsRef<Path>>(path: P, total_indices: usize) -> Result<Self, RenderError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut indices = Vec::with_capacity(total_indices);
        for _ in 0..total_indices {
            indices.push(reader.read_u16::<LittleEndian>()?);
        }
        log::info!("index file loaded ({} indices)", indices.len());
        Ok(Self::new(indices))
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn len(&self) -> u16 {
        self.indices.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
