/// Cell canvas consuming the fragment stream for terminal output
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use trast_core::Fragment;

/// Character luminosity ramp (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// A depth-tested grid of colored cells, one per terminal character.
///
/// This is the fragment consumer side of the pipeline: fragments arrive
/// in arbitrary order, the canvas keeps the nearest one per cell along
/// with its resolved color, and `draw` prints the result as ANSI cells.
pub struct CellCanvas {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    color_buffer: Vec<Option<[u8; 3]>>,
}

impl CellCanvas {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            color_buffer: vec![None; size],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        for i in 0..self.depth_buffer.len() {
            self.depth_buffer[i] = f32::INFINITY;
            self.color_buffer[i] = None;
        }
    }

    /// Depth-test a fragment into its cell. The caller has already
    /// resolved the fragment's color against its material/texture.
    pub fn blit(&mut self, fragment: &Fragment, color: [u8; 3]) {
        let row = fragment.row.floor();
        let col = fragment.col.floor();
        if row < 0.0 || col < 0.0 {
            return;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.height || col >= self.width {
            return;
        }
        let idx = row * self.width + col;
        if fragment.depth < self.depth_buffer[idx] {
            self.depth_buffer[idx] = fragment.depth;
            self.color_buffer[idx] = Some(color);
        }
    }

    /// Color of the cell at (row, col), if any fragment landed there.
    pub fn cell(&self, row: usize, col: usize) -> Option<[u8; 3]> {
        self.color_buffer[row * self.width + col]
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                match self.color_buffer[y * self.width + x] {
                    Some([r, g, b]) => {
                        writer.queue(SetForegroundColor(Color::Rgb { r, g, b }))?;
                        writer.queue(Print(glyph_for([r, g, b])))?;
                    }
                    None => {
                        writer.queue(Print(' '))?;
                    }
                }
            }
            writer.queue(Print('\n'))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Map a color's luminance to a ramp character, so dim cells read as
/// sparse even on terminals that approximate RGB colors.
fn glyph_for([r, g, b]: [u8; 3]) -> char {
    let luminance = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    let index = (luminance / 255.0 * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
    LUMINOSITY_RAMP[index.min(LUMINOSITY_RAMP.len() - 1)]
}
