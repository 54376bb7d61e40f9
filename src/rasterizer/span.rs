//! Fixed-point span interiors. Colour channels and texel coordinates step
//! across a scanline in 20.12 fixed point with wrapping arithmetic; spans
//! longer than ~524288 pixels would overflow the accumulators, which is
//! unreachable for realistic viewports.

use crate::{
    buffer::PixelBuffer,
    color::{GREEN_SHIFT, RED_SHIFT},
    maths::EPSILON,
    texture::Texture,
};

pub(crate) const FIXED_INTEGER_SHIFT: i32 = 12;
const FIXED_ONE: f32 = (1 << FIXED_INTEGER_SHIFT) as f32;

#[derive(Default, Debug, Clone, Copy)]
pub(crate) struct ScanlineCol {
    pub y: i32,
    pub x_start: f32,
    pub x_end: f32,
    pub r_start: f32,
    pub r_slope: f32,
    pub g_start: f32,
    pub g_slope: f32,
    pub b_start: f32,
    pub b_slope: f32,
}

#[derive(Default, Debug, Clone, Copy)]
pub(crate) struct ScanlineTex {
    pub y: i32,
    pub x_start: f32,
    pub x_end: f32,
    pub u_start: f32,
    pub u_slope: f32,
    pub v_start: f32,
    pub v_slope: f32,
}

pub(crate) fn scan_line_col(target: &mut PixelBuffer, scanline: &ScanlineCol) {
    // A span ending left of x = 1 would wrap around once ceiled.
    if scanline.x_end <= 1. - EPSILON {
        return;
    }
    if scanline.y < 0 || scanline.y >= target.height() as i32 {
        return;
    }

    // Top-left fill convention: ceil the endpoints, exclusive on the right.
    let x_start = (scanline.x_start.ceil() as i32).max(0);
    let x_end = (scanline.x_end.ceil() as i32).min(target.width() as i32);
    if x_start >= x_end {
        return;
    }

    let mut r = (scanline.r_start * FIXED_ONE) as i32;
    let mut g = (scanline.g_start * FIXED_ONE) as i32;
    let mut b = (scanline.b_start * FIXED_ONE) as i32;
    let r_slope = (scanline.r_slope * FIXED_ONE) as i32;
    let g_slope = (scanline.g_slope * FIXED_ONE) as i32;
    let b_slope = (scanline.b_slope * FIXED_ONE) as i32;

    let row_base = scanline.y as usize * target.width() as usize;
    let pixels = target.pixels_mut();
    for x in x_start..x_end {
        let color = (((r >> FIXED_INTEGER_SHIFT) as u32 & 0xff) << RED_SHIFT)
            | (((g >> FIXED_INTEGER_SHIFT) as u32 & 0xff) << GREEN_SHIFT)
            | ((b >> FIXED_INTEGER_SHIFT) as u32 & 0xff);
        pixels[row_base + x as usize] = color;
        r = r.wrapping_add(r_slope);
        g = g.wrapping_add(g_slope);
        b = b.wrapping_add(b_slope);
    }
}

pub(crate) fn scan_line_tex_affine(
    target: &mut PixelBuffer,
    texture: &Texture,
    scanline: &ScanlineTex,
) {
    if scanline.x_end <= 1. - EPSILON {
        return;
    }
    if scanline.y < 0 || scanline.y >= target.height() as i32 {
        return;
    }

    let x_start = (scanline.x_start.ceil() as i32).max(0);
    let x_end = (scanline.x_end.ceil() as i32).min(target.width() as i32);
    if x_start >= x_end {
        return;
    }

    let texels = texture.texels();
    let tex_width = texture.width() as i32;

    let mut u = (scanline.u_start * FIXED_ONE) as i32;
    let mut v = (scanline.v_start * FIXED_ONE) as i32;
    let u_slope = (scanline.u_slope * FIXED_ONE) as i32;
    let v_slope = (scanline.v_slope * FIXED_ONE) as i32;

    let row_base = scanline.y as usize * target.width() as usize;
    let pixels = target.pixels_mut();
    for x in x_start..x_end {
        let texel_index = (u >> FIXED_INTEGER_SHIFT) + (v >> FIXED_INTEGER_SHIFT) * tex_width;
        let texel_index = (texel_index.max(0) as usize).min(texels.len() - 1);
        pixels[row_base + x as usize] = texels[texel_index];
        u = u.wrapping_add(u_slope);
        v = v.wrapping_add(v_slope);
    }
}
