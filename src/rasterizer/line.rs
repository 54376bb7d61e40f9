//! Bresenham line plotting with per-pixel color interpolation, used for
//! wireframe overlays and normal visualisation.

use crate::{
    buffer::PixelBuffer,
    color::{Color32, GREEN_SHIFT, RED_SHIFT},
};

pub(crate) fn plot_line_col(
    target: &mut PixelBuffer,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    c1: Color32,
    c2: Color32,
) {
    let delta_x = (x2 - x1).abs();
    let delta_y = (y2 - y1).abs();

    let mut x_pos = x1;
    let mut y_pos = y1;

    // Increment pairs cover the 8 direction cases of a line; one of each
    // pair is zeroed below depending on the dominant axis.
    let mut x_inc1 = if x2 >= x1 { 1 } else { -1 };
    let mut x_inc2 = x_inc1;
    let mut y_inc1 = if y2 >= y1 { 1 } else { -1 };
    let mut y_inc2 = y_inc1;

    let den;
    let mut num;
    let num_inc;
    let num_of_pixels;

    if delta_x >= delta_y {
        // At least one x step for every y step.
        x_inc1 = 0;
        y_inc2 = 0;
        den = delta_x;
        num = delta_x >> 1;
        num_inc = delta_y;
        num_of_pixels = delta_x;
    } else {
        x_inc2 = 0;
        y_inc1 = 0;
        den = delta_y;
        num = delta_y >> 1;
        num_inc = delta_x;
        num_of_pixels = delta_y;
    }

    if num_of_pixels == 0 {
        target.plot(x_pos, y_pos, c1.to_u32());
        return;
    }

    let num_of_pixels_inv = 1. / num_of_pixels as f32;
    let mut r = c1.r as f32;
    let mut g = c1.g as f32;
    let mut b = c1.b as f32;
    let r_slope = (c2.r as f32 - c1.r as f32) * num_of_pixels_inv;
    let g_slope = (c2.g as f32 - c1.g as f32) * num_of_pixels_inv;
    let b_slope = (c2.b as f32 - c1.b as f32) * num_of_pixels_inv;

    for _ in 0..=num_of_pixels {
        let color = ((r.clamp(0., 255.) as u32) << RED_SHIFT)
            | ((g.clamp(0., 255.) as u32) << GREEN_SHIFT)
            | (b.clamp(0., 255.) as u32);
        target.plot(x_pos, y_pos, color);

        r += r_slope;
        g += g_slope;
        b += b_slope;

        num += num_inc;
        if num < den {
            x_pos += x_inc2;
            y_pos += y_inc2;
        } else {
            num -= den;
            x_pos += x_inc1 + x_inc2;
            y_pos += y_inc1 + y_inc2;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_fills_the_row() {
        let mut buffer = PixelBuffer::new(8, 8);
        plot_line_col(&mut buffer, 0, 3, 5, 3, Color32::WHITE, Color32::WHITE);
        for x in 0..=5 {
            assert_eq!(buffer.pixels()[x + 3 * 8], 0x00ffffff, "x = {x}");
        }
        assert_eq!(buffer.pixels()[6 + 3 * 8], 0);
    }

    #[test]
    fn diagonal_line_hits_both_endpoints() {
        let mut buffer = PixelBuffer::new(8, 8);
        plot_line_col(&mut buffer, 0, 0, 7, 7, Color32::RED, Color32::RED);
        assert_ne!(buffer.pixels()[0], 0);
        assert_ne!(buffer.pixels()[7 + 7 * 8], 0);
    }

    #[test]
    fn single_point_line_plots_once() {
        let mut buffer = PixelBuffer::new(4, 4);
        plot_line_col(&mut buffer, 2, 2, 2, 2, Color32::GREEN, Color32::GREEN);
        assert_eq!(buffer.pixels()[2 + 2 * 4], Color32::GREEN.to_u32());
    }

    #[test]
    fn out_of_range_pixels_are_dropped() {
        let mut buffer = PixelBuffer::new(4, 4);
        plot_line_col(&mut buffer, -2, 0, 5, 0, Color32::WHITE, Color32::WHITE);
        // Only the in-range part of the row is written.
        for x in 0..4 {
            assert_eq!(buffer.pixels()[x], 0x00ffffff);
        }
    }
}
