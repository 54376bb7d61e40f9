//! Demo scene: a spinning cube that can be viewed textured, Gouraud lit or
//! as a wireframe, with an orbiting point light and a fixed directional
//! fill light.

use std::rc::Rc;

use winit::keyboard::KeyCode;

use swrender::{
    color::{Color32, Color128},
    device::RenderDevice,
    geometry::{IndexBuffer, Vertex, VertexBuffer},
    input::InputHandler,
    lighting::Light,
    maths::{Mat4, Vec3},
    texture::Texture,
    window::{App, AppSettings, FrameListener},
};

const CRATE_TEXTURE_PATH: &str = "resources/crate.bmp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewMode {
    Textured,
    Lit,
    WireFrame,
}

/// Unit cube with one quad per face: per-face normals, UVs over the full
/// texture, and a distinct color per face for the lit mode.
fn cube_vertices() -> Vec<Vertex> {
    // (outward normal, face u axis, face v axis) with u x v = normal.
    let faces = [
        (Vec3::new(0., 0., -1.), Vec3::new(1., 0., 0.), Vec3::new(0., -1., 0.)),
        (Vec3::new(0., 0., 1.), Vec3::new(1., 0., 0.), Vec3::new(0., 1., 0.)),
        (Vec3::new(1., 0., 0.), Vec3::new(0., 1., 0.), Vec3::new(0., 0., 1.)),
        (Vec3::new(-1., 0., 0.), Vec3::new(0., 0., 1.), Vec3::new(0., 1., 0.)),
        (Vec3::new(0., 1., 0.), Vec3::new(0., 0., 1.), Vec3::new(1., 0., 0.)),
        (Vec3::new(0., -1., 0.), Vec3::new(1., 0., 0.), Vec3::new(0., 0., 1.)),
    ];
    let colors = [
        Color32::RED,
        Color32::GREEN,
        Color32::BLUE,
        Color32::YELLOW,
        Color32::CYAN,
        Color32::MAGENTA,
    ];
    let corner_uvs = [(0., 0.), (1., 0.), (1., 1.), (0., 1.)];

    let mut vertices = Vec::with_capacity(faces.len() * 4);
    for ((normal, u_axis, v_axis), color) in faces.into_iter().zip(colors) {
        let corners = [
            normal - u_axis - v_axis,
            normal + u_axis - v_axis,
            normal + u_axis + v_axis,
            normal - u_axis + v_axis,
        ];
        for (corner, (u, v)) in corners.into_iter().zip(corner_uvs) {
            vertices.push(Vertex::new(corner, color, u, v, normal));
        }
    }
    vertices
}

fn cube_indices() -> Vec<u16> {
    (0..6u16)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect()
}

fn checker_texture() -> Texture {
    const SIZE: u32 = 64;
    let texels = (0..SIZE * SIZE)
        .map(|i| {
            let x = i % SIZE;
            let y = i / SIZE;
            if (x / 8 + y / 8) % 2 == 0 {
                0x00c8a060
            } else {
                0x00604028
            }
        })
        .collect();
    Texture::new(SIZE, SIZE, texels)
}

struct DemoScene {
    vertices: Rc<VertexBuffer>,
    indices: Rc<IndexBuffer>,
    texture: Rc<Texture>,
    mode: ViewMode,
    show_normals: bool,
    angle: f32,
    light_theta: f32,
    point_light: Option<usize>,
}

impl DemoScene {
    fn new() -> Self {
        let texture = Texture::load_bmp(CRATE_TEXTURE_PATH, true)
            .unwrap_or_else(|_| checker_texture());
        Self {
            vertices: Rc::new(VertexBuffer::new(cube_vertices())),
            indices: Rc::new(IndexBuffer::new(cube_indices())),
            texture: Rc::new(texture),
            mode: ViewMode::Textured,
            show_normals: false,
            angle: 0.,
            light_theta: 0.,
            point_light: None,
        }
    }
}

impl FrameListener for DemoScene {
    fn initialise(&mut self, device: &mut RenderDevice) {
        device.set_fov(60.);
        device.set_clip_planes(1., 100.);
        device.enable_backface_culling(true);

        device.set_vertex_buffer(&self.vertices);
        device.set_index_buffer(&self.indices);
        device.set_source_texture(&self.texture);

        let lights = device.lights();
        self.point_light = lights.add(Light::Point {
            color: Color128::new(255., 255., 255., 255.),
            position: Vec3::new(0., 2., 4.),
            atten: [0.5, 0.25, 0.],
            falloff: 15.,
        });
        if let Some(handle) = self.point_light {
            lights.enable(handle);
        }
        if let Some(handle) = lights.add(Light::Directional {
            color: Color128::new(120., 120., 140., 255.),
            position: Vec3::new(-6., 6., 0.),
            direction: Vec3::new(1., -1., 1.),
        }) {
            lights.enable(handle);
        }

        log::info!("demo scene initialised");
    }

    fn on_frame_start(
        &mut self,
        device: &mut RenderDevice,
        input: &InputHandler,
        _frame_delta: f32,
    ) {
        if input.is_key_hit(KeyCode::Digit1) {
            self.mode = ViewMode::Textured;
        }
        if input.is_key_hit(KeyCode::Digit2) {
            self.mode = ViewMode::Lit;
        }
        if input.is_key_hit(KeyCode::Digit3) {
            self.mode = ViewMode::WireFrame;
        }
        if input.is_key_hit(KeyCode::KeyN) {
            self.show_normals = !self.show_normals;
        }
        if input.is_key_hit(KeyCode::KeyC) {
            let enabled = device.is_backface_culling_enabled();
            device.enable_backface_culling(!enabled);
        }
    }

    fn render(&mut self, device: &mut RenderDevice, frame_delta: f32) {
        self.angle = (self.angle + frame_delta * 40.) % 360.;
        self.light_theta += frame_delta;

        if let Some(handle) = self.point_light {
            let theta = self.light_theta;
            device.lights().set_position(
                handle,
                Vec3::new(theta.cos() * 4., 2., 6. + theta.sin() * 4.),
            );
        }

        let world = Mat4::rotate_y(self.angle)
            * Mat4::rotate_x(self.angle * 0.35)
            * Mat4::translate(Vec3::new(0., 0., 6.));
        device.set_world_transform(world);
        device.set_camera_transform(Mat4::identity());
        device.commit_matrix_changes();

        match self.mode {
            ViewMode::Textured => device.draw_tris_tex_list(true, 12, 0),
            ViewMode::Lit => device.draw_tris_col_lit_list(true, 12, 0),
            ViewMode::WireFrame => device.draw_wire_frame(true, 12, 0, Color32::GREEN),
        }
        if self.show_normals {
            device.draw_normals(&self.vertices, Color32::YELLOW, 0.5);
        }
    }
}

fn main() {
    env_logger::init();

    let settings = AppSettings {
        title: String::from("swrender demo"),
        width: 800,
        height: 600,
        clear_color: 0x00181818,
    };
    App::run(settings, Box::new(DemoScene::new()));
}
