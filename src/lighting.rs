//! Per-vertex Gouraud lighting. Vertices and normals are processed in world
//! space; contributing lights are averaged, not summed.

use crate::{
    color::Color128,
    geometry::Vertex,
    maths::{Mat4, Vec3},
};

#[derive(Debug, Clone, Copy)]
pub enum Light {
    Point {
        color: Color128,
        position: Vec3,
        /// Quadratic attenuation coefficients `1 / (a0 + a1*r + a2*r^2)`.
        atten: [f32; 3],
        /// No contribution beyond this distance.
        falloff: f32,
    },
    Directional {
        color: Color128,
        /// The ray towards a vertex is taken from this position, not from
        /// `direction`; the demo scenes depend on that.
        position: Vec3,
        direction: Vec3,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightFilter {
    PointOnly,
    DirectionalOnly,
    All,
}

impl LightFilter {
    fn accepts(self, light: &Light) -> bool {
        match (self, light) {
            (LightFilter::All, _) => true,
            (LightFilter::PointOnly, Light::Point { .. }) => true,
            (LightFilter::DirectionalOnly, Light::Directional { .. }) => true,
            _ => false,
        }
    }
}

struct Slot {
    light: Light,
    active: bool,
}

/// Fixed-capacity table of light slots addressed by small integer handles.
/// An empty slot is `None`.
pub struct LightTable {
    slots: Vec<Option<Slot>>,
}

impl LightTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// First empty slot, if any.
    pub fn find_next_handle(&self) -> Option<usize> {
        self.slots.iter().position(|slot| slot.is_none())
    }

    /// Store `light` in the next free slot, inactive until enabled.
    /// Returns the handle, or `None` when the table is full.
    pub fn add(&mut self, light: Light) -> Option<usize> {
        let handle = self.find_next_handle()?;
        self.slots[handle] = Some(Slot {
            light,
            active: false,
        });
        Some(handle)
    }

    /// Overwrite a slot. Out-of-range handles are ignored.
    pub fn set(&mut self, handle: usize, light: Light) {
        if let Some(slot) = self.slots.get_mut(handle) {
            *slot = Some(Slot {
                light,
                active: false,
            });
        }
    }

    pub fn enable(&mut self, handle: usize) {
        if let Some(Some(slot)) = self.slots.get_mut(handle) {
            slot.active = true;
        }
    }

    pub fn disable(&mut self, handle: usize) {
        if let Some(Some(slot)) = self.slots.get_mut(handle) {
            slot.active = false;
        }
    }

    pub fn enable_all(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.active = true;
        }
    }

    pub fn disable_all(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.active = false;
        }
    }

    pub fn set_position(&mut self, handle: usize, new_pos: Vec3) {
        if let Some(Some(slot)) = self.slots.get_mut(handle) {
            match &mut slot.light {
                Light::Point { position, .. } => *position = new_pos,
                Light::Directional { position, .. } => *position = new_pos,
            }
        }
    }

    /// Accumulate the active lights into the vertex color. The vertex must
    /// already be in world space. `_world` is reserved for transforming
    /// normals of non-identity object rotations.
    pub fn process_vertex(&self, vertex: &mut Vertex, _world: &Mat4, filter: LightFilter) {
        let mut result = Color128::new(0., 0., 0., 0.);
        let mut applied = 0.;

        for slot in self.slots.iter().flatten() {
            if !slot.active || !filter.accepts(&slot.light) {
                continue;
            }
            let contribution = match slot.light {
                Light::Point {
                    color,
                    position,
                    atten,
                    falloff,
                } => apply_point_light(vertex, color, position, atten, falloff),
                Light::Directional {
                    color, position, ..
                } => Some(apply_directional_light(vertex, color, position)),
            };
            if let Some(col) = contribution {
                result = result + col;
                applied += 1.;
            }
        }

        if applied > 0. {
            vertex.color = (result / applied).to_color32();
        }
    }
}

fn apply_point_light(
    vertex: &Vertex,
    color: Color128,
    position: Vec3,
    atten: [f32; 3],
    falloff: f32,
) -> Option<Color128> {
    let to_vertex = position - vertex.position();
    let dist = to_vertex.magnitude();
    if dist > falloff {
        return None;
    }

    let cos = (-to_vertex.normalize().dot(vertex.normal())).clamp(0., 1.);
    let attenuation = 1. / (atten[0] + atten[1] * dist + atten[2] * dist * dist);
    let vert_col = Color128::from_color32(vertex.color);

    Some(vert_col * color.normalized() * cos * attenuation)
}

fn apply_directional_light(vertex: &Vertex, color: Color128, position: Vec3) -> Color128 {
    let ray = (vertex.position() - position).normalize();
    let cos = ray.dot(vertex.normal()).clamp(0., 1.);
    let vert_col = Color128::from_color32(vertex.color);

    vert_col * color.normalized() * cos
}
