/// Palette extraction and color quantization for limited-color output
use std::collections::BTreeSet;

use crate::error::CoreError;

/// An image as a plain pixel matrix of RGB triples.
///
/// Pixels are stored row-major; `(x, y)` addresses column `x` of row
/// `y`. How the pixel data got here (bitmap decoding and so on) is the
/// ingestion layer's concern, not this module's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 3]>,
}

impl Image {
    /// An all-black image of the given dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0]; width * height],
        }
    }

    /// Wrap existing row-major pixel data.
    pub fn from_pixels(
        width: usize,
        height: usize,
        pixels: Vec<[u8; 3]>,
    ) -> Result<Self, CoreError> {
        if pixels.len() != width * height {
            return Err(CoreError::OutOfRange {
                what: "pixel data length",
                index: pixels.len(),
                len: width * height,
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Result<[u8; 3], CoreError> {
        if x >= self.width || y >= self.height {
            return Err(CoreError::OutOfRange {
                what: "pixel coordinate",
                index: y * self.width + x,
                len: self.pixels.len(),
            });
        }
        Ok(self.pixels[y * self.width + x])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: [u8; 3]) -> Result<(), CoreError> {
        if x >= self.width || y >= self.height {
            return Err(CoreError::OutOfRange {
                what: "pixel coordinate",
                index: y * self.width + x,
                len: self.pixels.len(),
            });
        }
        self.pixels[y * self.width + x] = color;
        Ok(())
    }

    /// Sample the image at normalized texture coordinates, wrapping
    /// out-of-range values. Used by the fragment color stage.
    pub fn sample(&self, u: f32, v: f32) -> [u8; 3] {
        if self.pixels.is_empty() {
            return [0, 0, 0];
        }
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        let x = ((u * self.width as f32) as usize).min(self.width - 1);
        let y = ((v * self.height as f32) as usize).min(self.height - 1);
        self.pixels[y * self.width + x]
    }
}

/// The deduplicated set of colors present in an image.
///
/// Returned sorted, so equal color sets compare equal regardless of
/// pixel order.
pub fn extract_palette(image: &Image) -> Vec<[u8; 3]> {
    let set: BTreeSet<[u8; 3]> = image.pixels.iter().copied().collect();
    set.into_iter().collect()
}

/// A copy of `image` with every pixel snapped to its nearest palette
/// entry (squared Euclidean distance in RGB space).
///
/// Ties resolve to the earliest entry in palette order, so the result
/// is deterministic for the same inputs. An empty palette is a caller
/// error.
pub fn round_to_palette(image: &Image, palette: &[[u8; 3]]) -> Result<Image, CoreError> {
    if palette.is_empty() {
        return Err(CoreError::InvalidPalette);
    }
    let pixels = image
        .pixels
        .iter()
        .map(|&pixel| nearest_entry(palette, pixel))
        .collect();
    Ok(Image {
        width: image.width,
        height: image.height,
        pixels,
    })
}

fn distance_squared(a: [u8; 3], b: [u8; 3]) -> i32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    dr * dr + dg * dg + db * db
}

fn nearest_entry(palette: &[[u8; 3]], pixel: [u8; 3]) -> [u8; 3] {
    let mut best = palette[0];
    let mut best_dist = distance_squared(best, pixel);
    for &entry in &palette[1..] {
        let dist = distance_squared(entry, pixel);
        // strict comparison keeps the earliest entry on ties
        if dist < best_dist {
            best = entry;
            best_dist = dist;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A small image with a deterministic spread of colors.
    fn gradient_image(width: usize, height: usize) -> Image {
        let mut image = Image::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let b = ((x + y) * 17 % 256) as u8;
                image.set_pixel(x, y, [r, g, b]).unwrap();
            }
        }
        image
    }

    #[test]
    fn test_extract_palette_deduplicates() {
        let image = Image::from_pixels(
            2,
            2,
            vec![[255, 0, 0], [0, 255, 0], [255, 0, 0], [0, 255, 0]],
        )
        .unwrap();
        let palette = extract_palette(&image);
        assert_eq!(palette, vec![[0, 255, 0], [255, 0, 0]]);
    }

    #[test]
    fn test_extract_palette_is_order_independent() {
        let a = Image::from_pixels(2, 1, vec![[1, 2, 3], [4, 5, 6]]).unwrap();
        let b = Image::from_pixels(2, 1, vec![[4, 5, 6], [1, 2, 3]]).unwrap();
        assert_eq!(extract_palette(&a), extract_palette(&b));
    }

    #[test]
    fn test_round_to_own_palette_is_fixed_point() {
        let image = gradient_image(16, 16);
        let palette = extract_palette(&image);
        let rounded = round_to_palette(&image, &palette).unwrap();
        assert_eq!(rounded, image);
    }

    #[test]
    fn test_quantization_cannot_increase_colors() {
        let image = gradient_image(32, 32);
        let palette = vec![[0, 0, 0], [85, 85, 85], [170, 170, 170], [255, 255, 255]];
        let rounded = round_to_palette(&image, &palette).unwrap();
        let result_palette = extract_palette(&rounded);
        assert!(result_palette.len() <= palette.len());
        for color in &result_palette {
            assert!(palette.contains(color));
        }
    }

    #[test]
    fn test_requantization_bound_holds_for_any_palette() {
        let image = gradient_image(24, 24);
        let palette = extract_palette(&gradient_image(4, 4));
        let rounded = round_to_palette(&image, &palette).unwrap();
        assert!(extract_palette(&rounded).len() <= palette.len());
    }

    #[test]
    fn test_empty_palette_is_rejected() {
        let image = gradient_image(4, 4);
        assert_eq!(
            round_to_palette(&image, &[]),
            Err(CoreError::InvalidPalette)
        );
    }

    #[test]
    fn test_ties_resolve_to_first_entry() {
        // (100, 0, 0) is equidistant from (90, 0, 0) and (110, 0, 0).
        let image = Image::from_pixels(1, 1, vec![[100, 0, 0]]).unwrap();
        let palette = vec![[90, 0, 0], [110, 0, 0]];
        let rounded = round_to_palette(&image, &palette).unwrap();
        assert_eq!(rounded.pixel(0, 0).unwrap(), [90, 0, 0]);

        // Reversed palette order flips the winner: deterministic, not random.
        let palette = vec![[110, 0, 0], [90, 0, 0]];
        let rounded = round_to_palette(&image, &palette).unwrap();
        assert_eq!(rounded.pixel(0, 0).unwrap(), [110, 0, 0]);
    }

    #[test]
    fn test_from_pixels_validates_length() {
        assert!(Image::from_pixels(2, 2, vec![[0, 0, 0]; 3]).is_err());
    }

    #[test]
    fn test_sample_wraps_coordinates() {
        let image = Image::from_pixels(
            2,
            2,
            vec![[1, 1, 1], [2, 2, 2], [3, 3, 3], [4, 4, 4]],
        )
        .unwrap();
        assert_eq!(image.sample(0.0, 0.0), [1, 1, 1]);
        assert_eq!(image.sample(0.75, 0.0), [2, 2, 2]);
        assert_eq!(image.sample(0.25, 0.75), [3, 3, 3]);
        // wraps past 1.0
        assert_eq!(image.sample(1.25, 0.0), [1, 1, 1]);
    }
}
