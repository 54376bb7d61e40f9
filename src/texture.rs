//! 32 bit textures and the bitmap loading path. Decode goes through the
//! `image` crate; the conversion to packed texels (and the dirty-magenta
//! fallback for missing files) lives here.

use std::path::Path;

use crate::{RenderError, color::Color32};

/// Row-major `0x00RRGGBB` texel image. Width and height need not be powers
/// of two, but mapping quality degrades otherwise.
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<u32>,
}

impl Texture {
    pub fn new(width: u32, height: u32, texels: Vec<u32>) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert_eq!(texels.len(), width as usize * height as usize);
        Self {
            width,
            height,
            texels,
        }
    }

    /// The diagnostic substitute for a texture that failed to load.
    pub fn dirty(width: u32, height: u32) -> Self {
        let color = Color32::DIRTY.to_u32();
        Self {
            width,
            height,
            texels: vec![color; width as usize * height as usize],
        }
    }

    /// Pack a raw RGB byte buffer into texels, padding the alpha byte to 0.
    /// With `flip` the rows are reversed so y = 0 is the top scanline.
    pub fn from_rgb_bytes(bytes: &[u8], width: u32, height: u32, flip: bool) -> Self {
        debug_assert_eq!(bytes.len(), width as usize * height as usize * 3);
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        texels.extend(bytes.chunks_exact(3).map(|rgb| {
            Color32::new(rgb[0], rgb[1], rgb[2], 0).to_u32()
        }));

        if flip {
            let row = width as usize;
            let flipped: Vec<u32> = texels
                .chunks_exact(row)
                .rev()
                .flat_map(|r| r.iter().copied())
                .collect();
            texels = flipped;
        }

        Self::new(width, height, texels)
    }

    /// Decode a bitmap from disk. The decoder hands back raw bytes and
    /// dimensions; everything else is [`Texture::from_rgb_bytes`].
    pub fn load_bmp<P: AsRef<Path>>(path: P, flip: bool) -> Result<Self, RenderError> {
        let image = image::ImageReader::open(&path)?.decode()?.to_rgb8();
        let (width, height) = image.dimensions();
        log::info!(
            "texture '{}' loaded ({}x{})",
            path.as_ref().to_string_lossy(),
            width,
            height
        );
        Ok(Self::from_rgb_bytes(image.as_raw(), width, height, flip))
    }

    /// Like [`Texture::load_bmp`] but failure substitutes a dirty texture of
    /// the given size so rendering can continue.
    pub fn load_bmp_or_dirty<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        flip: bool,
    ) -> Self {
        match Self::load_bmp(&path, flip) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!(
                    "texture '{}' failed to load, substituting dirty texture: {}",
                    path.as_ref().to_string_lossy(),
                    err
                );
                Self::dirty(width, height)
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[u32] {
        &self.texels
    }

    pub fn texel(&self, x: u32, y: u32) -> u32 {
        self.texels[x as usize + y as usize * self.width as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_bytes_pack_top_row_first() {
        #[rustfmt::skip]
        let bytes = [
            1, 2, 3,    4, 5, 6,
            7, 8, 9,    10, 11, 12,
        ];
        let texture = Texture::from_rgb_bytes(&bytes, 2, 2, false);
        assert_eq!(texture.texel(0, 0), 0x00010203);
        assert_eq!(texture.texel(1, 0), 0x00040506);
        assert_eq!(texture.texel(0, 1), 0x00070809);
        assert_eq!(texture.texel(1, 1), 0x000a0b0c);
    }

    #[test]
    fn flip_reverses_rows() {
        #[rustfmt::skip]
        let bytes = [
            1, 2, 3,    4, 5, 6,
            7, 8, 9,    10, 11, 12,
        ];
        let texture = Texture::from_rgb_bytes(&bytes, 2, 2, true);
        assert_eq!(texture.texel(0, 0), 0x00070809);
        assert_eq!(texture.texel(1, 1), 0x00040506);
    }

    #[test]
    fn missing_file_substitutes_dirty_texture() {
        let texture = Texture::load_bmp_or_dirty("/nonexistent/crate.bmp", 4, 4, false);
        assert_eq!(texture.width(), 4);
        assert!(
            texture
                .texels()
                .iter()
                .all(|t| *t == Color32::DIRTY.to_u32())
        );
    }
}
