//! End-to-end pipeline tests: full draws through the device, from bound
//! buffers to pixels.

use std::rc::Rc;

use swrender::{
    color::{Color32, Color128},
    device::{InitParams, RenderDevice, RenderStats},
    geometry::{IndexBuffer, Vertex, VertexBuffer},
    lighting::Light,
    maths::{Mat4, Vec3},
    texture::Texture,
};

const CLEAR: u32 = 0x00181818;

fn cube_vertices() -> Vec<Vertex> {
    // One quad per face, outward normals, u x v = normal so the standard
    // index pattern is front-facing under clockwise culling.
    let faces = [
        (Vec3::new(0., 0., -1.), Vec3::new(1., 0., 0.), Vec3::new(0., -1., 0.)),
        (Vec3::new(0., 0., 1.), Vec3::new(1., 0., 0.), Vec3::new(0., 1., 0.)),
        (Vec3::new(1., 0., 0.), Vec3::new(0., 1., 0.), Vec3::new(0., 0., 1.)),
        (Vec3::new(-1., 0., 0.), Vec3::new(0., 0., 1.), Vec3::new(0., 1., 0.)),
        (Vec3::new(0., 1., 0.), Vec3::new(0., 0., 1.), Vec3::new(1., 0., 0.)),
        (Vec3::new(0., -1., 0.), Vec3::new(1., 0., 0.), Vec3::new(0., 0., 1.)),
    ];
    let corner_uvs = [(0., 0.), (1., 0.), (1., 1.), (0., 1.)];

    let mut vertices = Vec::with_capacity(faces.len() * 4);
    for (normal, u_axis, v_axis) in faces {
        let corners = [
            normal - u_axis - v_axis,
            normal + u_axis - v_axis,
            normal + u_axis + v_axis,
            normal - u_axis + v_axis,
        ];
        for (corner, (u, v)) in corners.into_iter().zip(corner_uvs) {
            vertices.push(Vertex::new(corner, Color32::LIGHT_GREY, u, v, normal));
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

fn cube_device() -> (RenderDevice, Rc<VertexBuffer>, Rc<IndexBuffer>) {
    let mut device = RenderDevice::new(InitParams {
        buffer_width: 64,
        buffer_height: 64,
        ..Default::default()
    })
    .unwrap();
    device.set_fov(60.);
    device.set_clip_planes(1., 100.);
    device.enable_backface_culling(true);

    device.set_world_transform(Mat4::translate(Vec3::new(0., 0., 6.)));
    device.set_camera_transform(Mat4::identity());
    device.commit_matrix_changes();
    device.clear_back_buffer(CLEAR);
    device.clear_z_buffer();

    let vertices = Rc::new(VertexBuffer::new(cube_vertices()));
    let indices = Rc::new(IndexBuffer::new(cube_indices()));
    device.set_vertex_buffer(&vertices);
    device.set_index_buffer(&indices);
    (device, vertices, indices)
}

fn painted(device: &RenderDevice) -> usize {
    device.pixels().iter().filter(|p| **p != CLEAR).count()
}

#[test]
fn solid_cube_draw_culls_hidden_faces_and_fills_pixels() {
    let (mut device, _vb, _ib) = cube_device();
    device.draw_tris_col_list(true, 12, 0);

    let stats = device.stats();
    assert_eq!(stats.submitted, 12);
    // Head-on, only the front face survives: the back faces away and the
    // four side faces are edge-on.
    assert_eq!(stats.culled, 10);
    assert_eq!(stats.drawn, 2);
    assert!(painted(&device) > 0);
}

#[test]
fn rotated_cube_shows_more_faces() {
    let (mut device, _vb, _ib) = cube_device();
    device.set_world_transform(
        Mat4::rotate_y(30.) * Mat4::rotate_x(20.) * Mat4::translate(Vec3::new(0., 0., 6.)),
    );
    device.commit_matrix_changes();
    device.draw_tris_col_list(true, 12, 0);

    let stats = device.stats();
    assert_eq!(stats.submitted, 12);
    // Three faces visible from a corner-on view.
    assert_eq!(stats.culled, 6);
    assert!(stats.drawn >= 6);
    assert!(painted(&device) > 0);
}

#[test]
fn textured_cube_paints_only_texture_colors() {
    const LIGHT: u32 = 0x00c0c0c0;
    const DARK: u32 = 0x00303030;
    let texture = Rc::new(Texture::new(
        4,
        4,
        (0..16).map(|i| if i % 2 == 0 { LIGHT } else { DARK }).collect(),
    ));

    let (mut device, _vb, _ib) = cube_device();
    device.set_source_texture(&texture);
    device.draw_tris_tex_list(true, 12, 0);

    assert!(painted(&device) > 0);
    for pixel in device.pixels() {
        assert!(
            *pixel == CLEAR || *pixel == LIGHT || *pixel == DARK,
            "unexpected pixel {pixel:#010x}"
        );
    }
}

#[test]
fn light_beyond_falloff_matches_unlit_output() {
    let (mut unlit, _vb1, _ib1) = cube_device();
    unlit.draw_tris_col_list(true, 12, 0);

    let (mut lit, _vb2, _ib2) = cube_device();
    let handle = lit
        .lights()
        .add(Light::Point {
            color: Color128::new(255., 255., 255., 255.),
            position: Vec3::new(0., 0., 200.),
            atten: [0., 1., 0.],
            falloff: 1.,
        })
        .unwrap();
    lit.lights().enable(handle);
    lit.draw_tris_col_lit_list(true, 12, 0);

    assert_eq!(unlit.pixels(), lit.pixels());
}

#[test]
fn nearby_point_light_changes_the_image() {
    let (mut unlit, _vb1, _ib1) = cube_device();
    unlit.draw_tris_col_list(true, 12, 0);

    let (mut lit, _vb2, _ib2) = cube_device();
    let handle = lit
        .lights()
        .add(Light::Point {
            color: Color128::new(255., 64., 64., 255.),
            position: Vec3::new(0., 0., 9.),
            atten: [1., 0., 0.],
            falloff: 50.,
        })
        .unwrap();
    lit.lights().enable(handle);
    lit.draw_tris_col_lit_list(true, 12, 0);

    assert_ne!(unlit.pixels(), lit.pixels());
}

#[test]
fn wireframe_draws_without_touching_stats() {
    let (mut device, _vb, _ib) = cube_device();
    device.draw_wire_frame(true, 12, 0, Color32::GREEN);

    assert_eq!(device.stats(), RenderStats::default());
    assert!(painted(&device) > 0);
    // Wireframe pixels are all the requested color.
    for pixel in device.pixels() {
        assert!(*pixel == CLEAR || *pixel == Color32::GREEN.to_u32());
    }
}

#[test]
fn strip_submission_counts_each_window_triangle() {
    let mut device = RenderDevice::new(InitParams {
        buffer_width: 64,
        buffer_height: 64,
        ..Default::default()
    })
    .unwrap();
    device.set_clip_planes(1., 100.);
    device.clear_back_buffer(CLEAR);

    // A quad as a two-triangle strip, already in camera space.
    let vertices = Rc::new(VertexBuffer::new(vec![
        Vertex::new(Vec3::new(-1., -1., 8.), Color32::WHITE, 0., 0., Vec3::new(0., 0., -1.)),
        Vertex::new(Vec3::new(1., -1., 8.), Color32::WHITE, 1., 0., Vec3::new(0., 0., -1.)),
        Vertex::new(Vec3::new(-1., 1., 8.), Color32::WHITE, 0., 1., Vec3::new(0., 0., -1.)),
        Vertex::new(Vec3::new(1., 1., 8.), Color32::WHITE, 1., 1., Vec3::new(0., 0., -1.)),
    ]));
    device.set_vertex_buffer(&vertices);
    device.draw_tris_col_strip(false, 2, 0);

    let stats = device.stats();
    assert_eq!(stats.submitted, 2);
    assert_eq!(stats.drawn, 2);
    assert!(painted(&device) > 0);
}

#[test]
fn edge_list_mode_renders_the_same_textured_image() {
    let texture = Rc::new(Texture::new(
        8,
        8,
        (0..64).map(|i| 0x00010203u32.wrapping_mul(i)).collect(),
    ));

    let (mut direct, _vb1, _ib1) = cube_device();
    direct.set_source_texture(&texture);
    direct.draw_tris_tex_list(true, 12, 0);

    let (mut batched, _vb2, _ib2) = cube_device();
    batched.set_source_texture(&texture);
    batched.set_edge_list_mode(true);
    batched.draw_tris_tex_list(true, 12, 0);

    assert_eq!(direct.pixels(), batched.pixels());
}
