//! Edge-walking scan-line rasterization. Triangles are sorted by y,
//! classified major/minor by which side carries the long edge, and walked
//! in two passes (top to middle, middle to bottom) emitting one span per
//! scanline. Uses a top-left fill convention by ceiling floating point
//! endpoints.

mod line;
mod span;

use std::mem;

use crate::{
    buffer::PixelBuffer,
    color::Color32,
    geometry::Vertex,
    maths::EPSILON,
    texture::Texture,
};
use line::plot_line_col;
use span::{ScanlineCol, ScanlineTex, scan_line_col, scan_line_tex_affine};

const TOP: usize = 0;
const MIDDLE: usize = 1;
const BOTTOM: usize = 2;

/// Major means the edge with the greatest Y delta runs down the left of the
/// two smaller edges, minor means it runs down the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriangleEdgeType {
    Minor,
    Major,
}

pub struct Rasterizer {
    height: u32,
    edge_list_mode: bool,
    // Pre-sized per-triangle scanline store for the batch mode.
    tex_scanlines: Vec<ScanlineTex>,
}

impl Rasterizer {
    /// `height` is the target buffer height; it sizes the scanline store
    /// for the batch mode.
    pub fn new(height: u32) -> Self {
        Self {
            height,
            edge_list_mode: false,
            tex_scanlines: vec![ScanlineTex::default(); height as usize * 2],
        }
    }

    /// Route textured triangles through the pre-built edge list instead of
    /// filling spans while walking. Cleaner memory access, slightly slower.
    pub fn set_edge_list_mode(&mut self, enabled: bool) {
        self.edge_list_mode = enabled;
    }

    pub fn edge_list_mode(&self) -> bool {
        self.edge_list_mode
    }

    /// Gouraud-shaded solid triangle from screen-space vertices.
    pub fn rasterize_tri_solid(&self, target: &mut PixelBuffer, tri: &[Vertex; 3]) {
        let verts = sort_by_y(tri);
        walk_edges(
            &verts,
            |v| [v.color.r as f32, v.color.g as f32, v.color.b as f32],
            |y, x1, x2, left, right| {
                let span_x_inv = 1. / (x1 - x2).abs();
                let scanline = ScanlineCol {
                    y,
                    x_start: x1,
                    x_end: x2,
                    r_start: left[0],
                    r_slope: (right[0] - left[0]) * span_x_inv,
                    g_start: left[1],
                    g_slope: (right[1] - left[1]) * span_x_inv,
                    b_start: left[2],
                    b_slope: (right[2] - left[2]) * span_x_inv,
                };
                scan_line_col(target, &scanline);
            },
        );
    }

    /// Affine texture-mapped triangle from screen-space vertices. UVs are
    /// scaled out by the texture dimensions once, then interpolated like the
    /// color channels.
    pub fn rasterize_tri_tex(&mut self, target: &mut PixelBuffer, texture: &Texture, tri: &[Vertex; 3]) {
        if self.edge_list_mode {
            self.rasterize_tri_tex_edge_list(target, texture, tri);
            return;
        }

        let verts = scale_uvs(sort_by_y(tri), texture);
        let tex_width = texture.width() as f32;
        let tex_height = texture.height() as f32;
        walk_edges(
            &verts,
            |v| [v.u, v.v],
            |y, x1, x2, left, right| {
                let scanline = tex_scanline(y, x1, x2, left, right, tex_width, tex_height);
                scan_line_tex_affine(target, texture, &scanline);
            },
        );
    }

    /// The batch variant: edge walking records every scanline into the
    /// pre-sized buffer, then the spans are filled in one loop.
    pub fn rasterize_tri_tex_edge_list(
        &mut self,
        target: &mut PixelBuffer,
        texture: &Texture,
        tri: &[Vertex; 3],
    ) {
        let verts = scale_uvs(sort_by_y(tri), texture);
        let tex_width = texture.width() as f32;
        let tex_height = texture.height() as f32;

        let scanlines = &mut self.tex_scanlines;
        let mut total = 0usize;
        walk_edges(
            &verts,
            |v| [v.u, v.v],
            |y, x1, x2, left, right| {
                if total < scanlines.len() {
                    scanlines[total] = tex_scanline(y, x1, x2, left, right, tex_width, tex_height);
                    total += 1;
                }
            },
        );

        for scanline in &self.tex_scanlines[..total] {
            scan_line_tex_affine(target, texture, scanline);
        }
    }

    /// The three edges of a triangle as interpolated lines.
    pub fn rasterize_tri_edges(&self, target: &mut PixelBuffer, v1: &Vertex, v2: &Vertex, v3: &Vertex) {
        self.plot_line(target, v1.x as i32, v1.y as i32, v2.x as i32, v2.y as i32, v1.color, v2.color);
        self.plot_line(target, v1.x as i32, v1.y as i32, v3.x as i32, v3.y as i32, v1.color, v3.color);
        self.plot_line(target, v2.x as i32, v2.y as i32, v3.x as i32, v3.y as i32, v2.color, v3.color);
    }

    pub fn plot_line(
        &self,
        target: &mut PixelBuffer,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        c1: Color32,
        c2: Color32,
    ) {
        plot_line_col(target, x1, y1, x2, y2, c1, c2);
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn tex_scanline(
    y: i32,
    x1: f32,
    x2: f32,
    left: [f32; 2],
    right: [f32; 2],
    tex_width: f32,
    tex_height: f32,
) -> ScanlineTex {
    // Walked texel coordinates can drift just past the texture edge.
    let u1 = left[0].clamp(0., tex_width);
    let u2 = right[0].clamp(0., tex_width);
    let v1 = left[1].clamp(0., tex_height);
    let v2 = right[1].clamp(0., tex_height);
    let span_x_inv = 1. / (x1 - x2).abs();
    ScanlineTex {
        y,
        x_start: x1,
        x_end: x2,
        u_start: u1,
        u_slope: (u2 - u1) * span_x_inv,
        v_start: v1,
        v_slope: (v2 - v1) * span_x_inv,
    }
}

fn scale_uvs(mut verts: [Vertex; 3], texture: &Texture) -> [Vertex; 3] {
    for v in verts.iter_mut() {
        v.u *= texture.width() as f32;
        v.v *= texture.height() as f32;
    }
    verts
}

/// Selection sort of the triangle into ascending y; ties keep input order.
fn sort_by_y(source: &[Vertex; 3]) -> [Vertex; 3] {
    let mut used = [false; 3];
    let mut target = [Vertex::default(); 3];
    for out in target.iter_mut() {
        let mut best = 0;
        let mut best_y = f32::INFINITY;
        for (j, vert) in source.iter().enumerate() {
            if !used[j] && vert.y < best_y {
                best_y = vert.y;
                best = j;
            }
        }
        *out = source[best];
        used[best] = true;
    }
    target
}

fn scaled_delta<const N: usize>(from: &[f32; N], to: &[f32; N], inv_delta: f32) -> [f32; N] {
    std::array::from_fn(|i| (to[i] - from[i]) * inv_delta)
}

fn advance<const N: usize>(values: &mut [f32; N], slopes: &[f32; N], t: f32) {
    for i in 0..N {
        values[i] += slopes[i] * t;
    }
}

/// Walk the triangle edges top to bottom, emitting one row per scanline
/// with the x endpoints and the `N` attributes interpolated down each side.
/// `verts` must already be sorted by ascending y.
fn walk_edges<const N: usize>(
    verts: &[Vertex; 3],
    attr: impl Fn(&Vertex) -> [f32; N],
    mut row: impl FnMut(i32, f32, f32, [f32; N], [f32; N]),
) {
    let tri_type = if verts[BOTTOM].x > verts[MIDDLE].x {
        TriangleEdgeType::Minor
    } else {
        TriangleEdgeType::Major
    };

    let inv_delta_tb = 1. / (verts[BOTTOM].y - verts[TOP].y);
    let inv_delta_tm = 1. / (verts[MIDDLE].y - verts[TOP].y);
    let inv_delta_mb = 1. / (verts[BOTTOM].y - verts[MIDDLE].y);

    let a_top = attr(&verts[TOP]);
    let a_middle = attr(&verts[MIDDLE]);
    let a_bottom = attr(&verts[BOTTOM]);

    // The long edge carries the left interpolants on a major triangle and
    // the right on a minor one.
    let (mut x_slope_left, mut x_slope_right, mut a_slope_left, mut a_slope_right) = match tri_type
    {
        TriangleEdgeType::Minor => (
            (verts[MIDDLE].x - verts[TOP].x) * inv_delta_tm,
            (verts[BOTTOM].x - verts[TOP].x) * inv_delta_tb,
            scaled_delta(&a_top, &a_middle, inv_delta_tm),
            scaled_delta(&a_top, &a_bottom, inv_delta_tb),
        ),
        TriangleEdgeType::Major => (
            (verts[BOTTOM].x - verts[TOP].x) * inv_delta_tb,
            (verts[MIDDLE].x - verts[TOP].x) * inv_delta_tm,
            scaled_delta(&a_top, &a_bottom, inv_delta_tb),
            scaled_delta(&a_top, &a_middle, inv_delta_tm),
        ),
    };

    let mut x1 = verts[TOP].x;
    let mut x2 = verts[TOP].x;
    let mut a1 = a_top;
    let mut a2 = a_top;
    let y_start = verts[TOP].y.ceil() as i32;
    let y_end = verts[MIDDLE].y.ceil() as i32 - 1;

    // An incomplete triangle comes out if the right side walks slower than
    // the left; swap the interpolant sets and remember to swap back.
    let mut has_swapped = false;
    if x_slope_right < x_slope_left {
        mem::swap(&mut x1, &mut x2);
        mem::swap(&mut x_slope_left, &mut x_slope_right);
        mem::swap(&mut a1, &mut a2);
        mem::swap(&mut a_slope_left, &mut a_slope_right);
        has_swapped = true;
    }

    // Correct the starting row for the offset the ceil introduced.
    let sub = y_start as f32 - verts[TOP].y;
    x1 += x_slope_left * sub;
    x2 += x_slope_right * sub;
    advance(&mut a1, &a_slope_left, sub);
    advance(&mut a2, &a_slope_right, sub);

    if inv_delta_tm > EPSILON {
        for y in y_start..=y_end {
            row(y, x1, x2, a1, a2);
            x1 += x_slope_left;
            x2 += x_slope_right;
            advance(&mut a1, &a_slope_left, 1.);
            advance(&mut a2, &a_slope_right, 1.);
        }
    }

    if has_swapped {
        mem::swap(&mut x1, &mut x2);
        mem::swap(&mut x_slope_left, &mut x_slope_right);
        mem::swap(&mut a1, &mut a2);
        mem::swap(&mut a_slope_left, &mut a_slope_right);
    }

    // Second pass: the middle-to-bottom slope replaces the side the middle
    // vertex terminated; the long edge keeps walking.
    let y_start = verts[MIDDLE].y.ceil() as i32;
    let y_end = verts[BOTTOM].y.ceil() as i32 - 1;
    let sub = y_start as f32 - verts[MIDDLE].y;

    match tri_type {
        TriangleEdgeType::Minor => {
            x_slope_left = (verts[BOTTOM].x - verts[MIDDLE].x) * inv_delta_mb;
            x1 = verts[MIDDLE].x + x_slope_left * sub;
            a_slope_left = scaled_delta(&a_middle, &a_bottom, inv_delta_mb);
            a1 = a_middle;
            advance(&mut a1, &a_slope_left, sub);
        }
        TriangleEdgeType::Major => {
            x_slope_right = (verts[BOTTOM].x - verts[MIDDLE].x) * inv_delta_mb;
            x2 = verts[MIDDLE].x + x_slope_right * sub;
            a_slope_right = scaled_delta(&a_middle, &a_bottom, inv_delta_mb);
            a2 = a_middle;
            advance(&mut a2, &a_slope_right, sub);
        }
    }

    if x2 < x1 {
        mem::swap(&mut x1, &mut x2);
        mem::swap(&mut x_slope_left, &mut x_slope_right);
        mem::swap(&mut a1, &mut a2);
        mem::swap(&mut a_slope_left, &mut a_slope_right);
    }

    if inv_delta_mb > EPSILON {
        for y in y_start..=y_end {
            row(y, x1, x2, a1, a2);
            x1 += x_slope_left;
            x2 += x_slope_right;
            advance(&mut a1, &a_slope_left, 1.);
            advance(&mut a2, &a_slope_right, 1.);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maths::Vec3;

    fn screen_vertex(x: f32, y: f32, color: Color32, u: f32, v: f32) -> Vertex {
        Vertex::new(Vec3::new(x, y, 0.5), color, u, v, Vec3::new(0., 0., 1.))
    }

    fn painted(buffer: &PixelBuffer) -> usize {
        buffer.pixels().iter().filter(|p| **p != 0).count()
    }

    #[test]
    fn sort_by_y_is_stable_for_ties() {
        let tri = [
            screen_vertex(1., 1., Color32::RED, 0., 0.),
            screen_vertex(6., 1., Color32::GREEN, 0., 0.),
            screen_vertex(1., 6., Color32::BLUE, 0., 0.),
        ];
        let sorted = sort_by_y(&tri);
        assert_eq!(sorted[TOP].color, Color32::RED);
        assert_eq!(sorted[MIDDLE].color, Color32::GREEN);
        assert_eq!(sorted[BOTTOM].color, Color32::BLUE);
    }

    #[test]
    fn solid_right_triangle_fills_expected_pixels() {
        let rasterizer = Rasterizer::new(8);
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.clear(0);

        let tri = [
            screen_vertex(1., 1., Color32::WHITE, 0., 0.),
            screen_vertex(6., 1., Color32::WHITE, 0., 0.),
            screen_vertex(1., 6., Color32::WHITE, 0., 0.),
        ];
        rasterizer.rasterize_tri_solid(&mut buffer, &tri);

        for y in 0..8i32 {
            for x in 0..8i32 {
                let expected = if x >= 1 && y >= 1 && x + y < 7 {
                    0x00ffffff
                } else {
                    0
                };
                assert_eq!(
                    buffer.pixels()[x as usize + y as usize * 8],
                    expected,
                    "pixel ({x},{y})"
                );
            }
        }
    }

    #[test]
    fn shared_edge_is_painted_exactly_once() {
        // Two triangles forming a quad: together they must cover the quad
        // with no double-filled and no skipped pixels along the diagonal.
        let rasterizer = Rasterizer::new(8);
        let a = [
            screen_vertex(0., 0., Color32::WHITE, 0., 0.),
            screen_vertex(4., 0., Color32::WHITE, 0., 0.),
            screen_vertex(0., 4., Color32::WHITE, 0., 0.),
        ];
        let b = [
            screen_vertex(4., 0., Color32::WHITE, 0., 0.),
            screen_vertex(4., 4., Color32::WHITE, 0., 0.),
            screen_vertex(0., 4., Color32::WHITE, 0., 0.),
        ];

        let mut first = PixelBuffer::new(8, 8);
        first.clear(0);
        rasterizer.rasterize_tri_solid(&mut first, &a);
        let count_a = painted(&first);

        let mut second = PixelBuffer::new(8, 8);
        second.clear(0);
        rasterizer.rasterize_tri_solid(&mut second, &b);
        let count_b = painted(&second);

        let mut both = PixelBuffer::new(8, 8);
        both.clear(0);
        rasterizer.rasterize_tri_solid(&mut both, &a);
        rasterizer.rasterize_tri_solid(&mut both, &b);

        assert_eq!(painted(&both), count_a + count_b);
        assert_eq!(painted(&both), 16);
    }

    #[test]
    fn textured_quad_maps_texels_one_to_one() {
        const A: u32 = 0x00aa0000;
        const B: u32 = 0x0000bb00;
        const C: u32 = 0x000000cc;
        const D: u32 = 0x00dd00dd;
        let texture = Texture::new(2, 2, vec![A, B, C, D]);

        let mut rasterizer = Rasterizer::new(2);
        let mut buffer = PixelBuffer::new(2, 2);
        buffer.clear(0);

        let quad_a = [
            screen_vertex(0., 0., Color32::WHITE, 0., 0.),
            screen_vertex(2., 0., Color32::WHITE, 1., 0.),
            screen_vertex(0., 2., Color32::WHITE, 0., 1.),
        ];
        let quad_b = [
            screen_vertex(2., 0., Color32::WHITE, 1., 0.),
            screen_vertex(2., 2., Color32::WHITE, 1., 1.),
            screen_vertex(0., 2., Color32::WHITE, 0., 1.),
        ];
        rasterizer.rasterize_tri_tex(&mut buffer, &texture, &quad_a);
        rasterizer.rasterize_tri_tex(&mut buffer, &texture, &quad_b);

        assert_eq!(buffer.pixels(), &[A, B, C, D][..]);
    }

    #[test]
    fn edge_list_mode_matches_direct_mode() {
        let texture = Texture::new(
            4,
            4,
            (0..16).map(|i| 0x00010101 * i as u32).collect(),
        );
        let tri = [
            screen_vertex(1., 1., Color32::WHITE, 0., 0.),
            screen_vertex(14., 2., Color32::WHITE, 1., 0.),
            screen_vertex(3., 14., Color32::WHITE, 0., 1.),
        ];

        let mut direct = Rasterizer::new(16);
        let mut direct_buffer = PixelBuffer::new(16, 16);
        direct_buffer.clear(0);
        direct.rasterize_tri_tex(&mut direct_buffer, &texture, &tri);

        let mut batched = Rasterizer::new(16);
        batched.set_edge_list_mode(true);
        let mut batched_buffer = PixelBuffer::new(16, 16);
        batched_buffer.clear(0);
        batched.rasterize_tri_tex(&mut batched_buffer, &texture, &tri);

        assert_eq!(direct_buffer.pixels(), batched_buffer.pixels());
    }

    #[test]
    fn gouraud_span_interpolates_between_vertex_colors() {
        let rasterizer = Rasterizer::new(16);
        let mut buffer = PixelBuffer::new(16, 16);
        buffer.clear(0);

        // Left edge red, right edge green.
        let tri = [
            screen_vertex(0., 0., Color32::RED, 0., 0.),
            screen_vertex(15., 0., Color32::GREEN, 0., 0.),
            screen_vertex(0., 15., Color32::RED, 0., 0.),
        ];
        rasterizer.rasterize_tri_solid(&mut buffer, &tri);

        let row: &[u32] = &buffer.pixels()[..15];
        let red_of = |p: u32| (p >> 16) & 0xff;
        let green_of = |p: u32| (p >> 8) & 0xff;
        assert!(red_of(row[0]) > 200 && green_of(row[0]) < 60);
        assert!(red_of(row[14]) < 60 && green_of(row[14]) > 200);
        // Monotonic fade left to right.
        for x in 1..15 {
            assert!(red_of(row[x]) <= red_of(row[x - 1]));
        }
    }

    #[test]
    fn wireframe_draws_all_three_edges() {
        let rasterizer = Rasterizer::new(8);
        let mut buffer = PixelBuffer::new(8, 8);
        buffer.clear(0);

        let tri = [
            screen_vertex(1., 1., Color32::WHITE, 0., 0.),
            screen_vertex(6., 1., Color32::WHITE, 0., 0.),
            screen_vertex(1., 6., Color32::WHITE, 0., 0.),
        ];
        rasterizer.rasterize_tri_edges(&mut buffer, &tri[0], &tri[1], &tri[2]);

        // Corners of the triangle are on every pair of edges.
        assert_ne!(buffer.pixels()[1 + 8], 0);
        assert_ne!(buffer.pixels()[6 + 8], 0);
        assert_ne!(buffer.pixels()[1 + 6 * 8], 0);
        // Interior stays empty.
        assert_eq!(buffer.pixels()[2 + 2 * 8], 0);
    }
}
