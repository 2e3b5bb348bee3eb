//! Model textures.
//!
//! Models name up to two textures in their metadata. [`ModelTextures`] loads
//! them relative to a texture directory and applies the post-processing the
//! metadata asks for (vertical flip, team-color alpha inversion).

use std::path::Path;

use image::RgbaImage;
use log::debug;

use crate::error::TextureError;
use crate::model::TextureNames;

/// A decoded 2D texture.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    data: Vec<u32>, // ARGB, row-major from the top row
    width: u32,
    height: u32,
}

impl Texture {
    pub fn from_rgba(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();

        // Convert RGBA bytes to ARGB u32
        let data: Vec<u32> = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
            })
            .collect();

        Self {
            data,
            width,
            height,
        }
    }

    /// Sample at UV coordinates with nearest-neighbor filtering.
    ///
    /// (0,0) is the first stored row; UVs outside [0,1) wrap. An empty
    /// texture samples as transparent black.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }

        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);

        self.data[(y * self.width + x) as usize]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// The decoded textures of one model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelTextures {
    /// Diffuse color, team color in alpha.
    pub tex1: Texture,
    /// Absent when the model names no second texture.
    pub tex2: Option<Texture>,
}

impl ModelTextures {
    /// Load the textures named by `names` from `dir`.
    pub fn load(names: &TextureNames, dir: &Path) -> Result<Self, TextureError> {
        let tex1 = load_processed(&dir.join(&names.tex1), names.flip_y, names.invert_alpha)?;
        let tex2 = if names.tex2.is_empty() {
            None
        } else {
            Some(load_processed(&dir.join(&names.tex2), names.flip_y, false)?)
        };
        Ok(Self { tex1, tex2 })
    }
}

fn load_processed(path: &Path, flip_y: bool, invert_alpha: bool) -> Result<Texture, TextureError> {
    debug!("Loading texture '{}'", path.display());
    let mut img = image::open(path)
        .map_err(|source| TextureError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    process(&mut img, flip_y, invert_alpha);
    Ok(Texture::from_rgba(&img))
}

fn process(img: &mut RgbaImage, flip_y: bool, invert_alpha: bool) {
    if flip_y {
        image::imageops::flip_vertical_in_place(img);
    }
    if invert_alpha {
        for pixel in img.pixels_mut() {
            pixel.0[3] = 255 - pixel.0[3];
        }
    }
}
