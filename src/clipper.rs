//! 2-D triangle clipping against the view rectangle.
//!
//! Each triangle edge is classified with Cohen-Sutherland style region
//! codes, intersected against the screen edges where it leaves the view,
//! and the surviving vertex loop is fan-triangulated. Clipping against the
//! near/far planes is not done here; triangles straddling them must be
//! rejected before projection or they will break the clipper.

use crate::{
    color::Color128,
    geometry::Vertex,
    maths::{Vec2, lerp},
};

const INNER_REGION: u8 = 0x00;
const LEFT_REGION: u8 = 0x01;
const RIGHT_REGION: u8 = 0x02;
const BOTTOM_REGION: u8 = 0x04;
const TOP_REGION: u8 = 0x08;

const LEFT: usize = 0;
const RIGHT: usize = 1;
const TOP: usize = 2;
const BOTTOM: usize = 3;

#[derive(Default, Debug, Clone, Copy)]
struct Line {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

pub struct TriangleClipper {
    screen_width: f32,
    screen_height: f32,
    near_plane: f32,
    far_plane: f32,
    screen_edges: [Line; 4],
}

impl TriangleClipper {
    pub fn new(width: f32, height: f32) -> Self {
        let mut clipper = Self {
            screen_width: width,
            screen_height: height,
            near_plane: 0.,
            far_plane: 0.,
            screen_edges: [Line::default(); 4],
        };
        clipper.build_screen_edges();
        clipper
    }

    pub fn set_view_dimensions(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;
        self.build_screen_edges();
    }

    pub fn set_view_planes(&mut self, near_plane: f32, far_plane: f32) {
        self.near_plane = near_plane;
        self.far_plane = far_plane;
    }

    fn build_screen_edges(&mut self) {
        self.screen_edges[LEFT] = Line {
            x1: 0.,
            y1: 0.,
            x2: 0.,
            y2: self.screen_height,
        };
        self.screen_edges[RIGHT] = Line {
            x1: self.screen_width,
            y1: 0.,
            x2: self.screen_width,
            y2: self.screen_height,
        };
        self.screen_edges[TOP] = Line {
            x1: 0.,
            y1: 0.,
            x2: self.screen_width,
            y2: 0.,
        };
        self.screen_edges[BOTTOM] = Line {
            x1: 0.,
            y1: self.screen_height - 1.,
            x2: self.screen_width,
            y2: self.screen_height - 1.,
        };
    }

    fn classify_point(&self, x: f32, y: f32) -> u8 {
        let mut region = INNER_REGION;
        if x < 0. {
            region |= LEFT_REGION;
        }
        if x >= self.screen_width {
            region |= RIGHT_REGION;
        }
        if y < 0. {
            region |= TOP_REGION;
        }
        if y >= self.screen_height {
            region |= BOTTOM_REGION;
        }
        region
    }

    fn region_to_edge_index(region: u8) -> Option<usize> {
        match region {
            LEFT_REGION => Some(LEFT),
            RIGHT_REGION => Some(RIGHT),
            TOP_REGION => Some(TOP),
            BOTTOM_REGION => Some(BOTTOM),
            _ => None,
        }
    }

    /// Pick a side for a corner region: a slope steeper than 1 crosses the
    /// vertical edges first, otherwise the horizontal ones.
    fn find_best_edge_index(region: u8, slope: f32) -> usize {
        match region {
            r if r == TOP_REGION | LEFT_REGION => {
                if slope > 1. {
                    LEFT
                } else {
                    TOP
                }
            }
            r if r == TOP_REGION | RIGHT_REGION => {
                if slope > 1. {
                    RIGHT
                } else {
                    TOP
                }
            }
            r if r == BOTTOM_REGION | LEFT_REGION => {
                if slope > 1. {
                    LEFT
                } else {
                    BOTTOM
                }
            }
            r if r == BOTTOM_REGION | RIGHT_REGION => {
                if slope > 1. {
                    RIGHT
                } else {
                    BOTTOM
                }
            }
            _ => {
                debug_assert!(false, "point classified to an impossible region");
                log::error!("clipper could not map region {region:#x} to a screen edge");
                LEFT
            }
        }
    }

    /// Parametric line/line test. Returns the scalar along the triangle
    /// edge when the segment crosses the screen edge's line.
    fn intersects(tri_edge: &Line, screen_edge: &Line) -> Option<f32> {
        let p1 = Vec2::new(tri_edge.x1, tri_edge.y1);
        let d1 = Vec2::new(tri_edge.x2 - tri_edge.x1, tri_edge.y2 - tri_edge.y1);

        let p2 = Vec2::new(screen_edge.x1, screen_edge.y1);
        let d2 = Vec2::new(screen_edge.x2 - screen_edge.x1, screen_edge.y2 - screen_edge.y1);

        let denom = d2.perp().dot(d1);
        if denom == 0. {
            return None;
        }

        let delta = p2 - p1;
        let s = d2.perp().dot(delta) / denom;
        let t = d1.perp().dot(delta) / denom;

        (s >= 0. && (0. ..=1.).contains(&t)).then_some(s)
    }

    /// Rebuild a vertex at `scale` along the edge, interpolating position,
    /// texture coordinates and color (in float color space).
    fn build_new_vertex(start: &Vertex, end: &Vertex, scale: f32) -> Vertex {
        let color = Color128::from_color32(start.color)
            .lerp(Color128::from_color32(end.color), scale)
            .to_color32();
        Vertex {
            x: lerp(start.x, end.x, scale),
            y: lerp(start.y, end.y, scale),
            z: lerp(start.z, end.z, scale),
            color,
            u: lerp(start.u, end.u, scale),
            v: lerp(start.v, end.v, scale),
            nx: start.nx,
            ny: start.ny,
            nz: start.nz,
        }
    }

    /// True when any vertex sits at or beyond the near or far plane; such
    /// triangles must be discarded whole.
    pub fn rejects_depth(&self, tri: &[Vertex; 3]) -> bool {
        tri.iter()
            .any(|v| v.z <= self.near_plane || v.z >= self.far_plane)
    }

    /// Clip a screen-space triangle, writing up to 3 fan triangles (9
    /// vertices) into `result`. Returns the triangle count.
    pub fn clip_triangle(&self, tri: &[Vertex; 3], result: &mut [Vertex; 9]) -> usize {
        let edges = [(0, 1), (1, 2), (2, 0)];

        // At most 7 vertices can come out of clipping a triangle against a
        // rectangle.
        let mut output: [Vertex; 7] = Default::default();
        let mut total_output = 0;

        for (start_i, end_i) in edges {
            let start = &tri[start_i];
            let end = &tri[end_i];
            let line = Line {
                x1: start.x,
                y1: start.y,
                x2: end.x,
                y2: end.y,
            };
            let line_slope = ((line.x2 - line.x1) / (line.y1 - line.y2)).abs();

            let start_region = self.classify_point(line.x1, line.y1);
            let end_region = self.classify_point(line.x2, line.y2);

            if start_region | end_region == 0 {
                // Trivial accept: emit the start, the end belongs to the
                // next edge.
                output[total_output] = *start;
                total_output += 1;
            } else if start_region & end_region > 0 {
                // Trivial reject, the edge never enters the view.
                continue;
            } else {
                if start_region == INNER_REGION {
                    output[total_output] = *start;
                    total_output += 1;
                } else {
                    let edge_index = Self::region_to_edge_index(start_region)
                        .unwrap_or_else(|| Self::find_best_edge_index(start_region, line_slope));
                    if let Some(scale) = Self::intersects(&line, &self.screen_edges[edge_index]) {
                        output[total_output] = Self::build_new_vertex(start, end, scale);
                        total_output += 1;
                    }
                }

                if end_region != INNER_REGION {
                    let edge_index = Self::region_to_edge_index(end_region)
                        .unwrap_or_else(|| Self::find_best_edge_index(end_region, line_slope));
                    if let Some(scale) = Self::intersects(&line, &self.screen_edges[edge_index]) {
                        output[total_output] = Self::build_new_vertex(start, end, scale);
                        total_output += 1;
                    }
                }
            }
        }

        if total_output < 3 {
            return 0;
        }

        // Fan triangulate around the first output vertex.
        for i in 0..total_output - 2 {
            result[i * 3] = output[0];
            result[i * 3 + 1] = output[i + 1];
            result[i * 3 + 2] = output[i + 2];
        }
        total_output - 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Color32, maths::Vec3};

    fn vertex(x: f32, y: f32) -> Vertex {
        Vertex::new(
            Vec3::new(x, y, 0.5),
            Color32::WHITE,
            x / 10.,
            y / 10.,
            Vec3::new(0., 0., 1.),
        )
    }

    #[test]
    fn fully_inside_triangle_passes_through_unchanged() {
        let clipper = TriangleClipper::new(10., 10.);
        let tri = [vertex(1., 1.), vertex(8., 2.), vertex(3., 7.)];
        let mut out: [Vertex; 9] = Default::default();

        assert_eq!(clipper.clip_triangle(&tri, &mut out), 1);
        assert_eq!(out[0], tri[0]);
        assert_eq!(out[1], tri[1]);
        assert_eq!(out[2], tri[2]);
    }

    #[test]
    fn fully_outside_triangle_is_rejected() {
        let clipper = TriangleClipper::new(10., 10.);
        let tri = [vertex(-5., 1.), vertex(-2., 2.), vertex(-3., 7.)];
        let mut out: [Vertex; 9] = Default::default();

        assert_eq!(clipper.clip_triangle(&tri, &mut out), 0);
    }

    #[test]
    fn clip_against_left_edge() {
        let clipper = TriangleClipper::new(4., 4.);
        let tri = [vertex(-2., 1.), vertex(3., 1.), vertex(-2., 3.)];
        let mut out: [Vertex; 9] = Default::default();

        assert_eq!(clipper.clip_triangle(&tri, &mut out), 1);
        // Edge v0->v1 enters at x = 0; edge v1->v2 leaves at x = 0,
        // y = 1 + 2 * 0.6; edge v2->v0 never enters the view.
        assert_eq!((out[0].x, out[0].y), (0., 1.));
        assert_eq!((out[1].x, out[1].y), (3., 1.));
        assert_eq!((out[2].x, out[2].y), (0., 2.2));
    }

    #[test]
    fn clipped_vertex_interpolates_attributes() {
        let clipper = TriangleClipper::new(4., 4.);
        let mut start = vertex(-2., 1.);
        let mut end = vertex(3., 1.);
        start.color = Color32::new(0, 0, 0, 0);
        end.color = Color32::new(250, 100, 50, 0);
        start.u = 0.;
        end.u = 1.;
        let tri = [start, end, vertex(-2., 3.)];
        let mut out: [Vertex; 9] = Default::default();

        assert_eq!(clipper.clip_triangle(&tri, &mut out), 1);
        // Entry point is 40% along the edge.
        assert_eq!(out[0].color, Color32::new(100, 40, 20, 0));
        assert!((out[0].u - 0.4).abs() < 1e-5);
    }

    #[test]
    fn crossing_one_edge_preserves_clipped_area() {
        let clipper = TriangleClipper::new(100., 100.);
        // Crosses only the right edge.
        let tri = [vertex(80., 10.), vertex(120., 50.), vertex(80., 90.)];
        let mut out: [Vertex; 9] = Default::default();

        let count = clipper.clip_triangle(&tri, &mut out);
        assert!(count >= 1);

        let area = |a: &Vertex, b: &Vertex, c: &Vertex| {
            0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs()
        };
        let clipped_area: f32 = (0..count)
            .map(|i| area(&out[i * 3], &out[i * 3 + 1], &out[i * 3 + 2]))
            .sum();
        // Input area 1600, the part beyond x = 100 is a triangle of area 400.
        assert!((clipped_area - 1200.).abs() < 0.5);
    }

    #[test]
    fn corner_region_picks_side_by_slope() {
        let clipper = TriangleClipper::new(10., 10.);
        // One vertex in the top-left corner region with a shallow slope, so
        // the horizontal screen edge is chosen for the intersection.
        let tri = [vertex(-2., -8.), vertex(4., 4.), vertex(1., 8.)];
        let mut out: [Vertex; 9] = Default::default();

        let count = clipper.clip_triangle(&tri, &mut out);
        assert!(count >= 1);
        for i in 0..count * 3 {
            assert!(out[i].x >= 0. && out[i].y >= 0.);
        }
    }

    #[test]
    fn depth_reject_catches_near_and_far_straddlers() {
        let mut clipper = TriangleClipper::new(10., 10.);
        clipper.set_view_planes(1., 100.);

        let mut tri = [vertex(1., 1.), vertex(2., 1.), vertex(1., 2.)];
        tri.iter_mut().for_each(|v| v.z = 50.);
        assert!(!clipper.rejects_depth(&tri));

        tri[0].z = 0.5;
        assert!(clipper.rejects_depth(&tri));

        tri[0].z = 150.;
        assert!(clipper.rejects_depth(&tri));
    }
}
