//! Offline image backend.
//!
//! Renders a PNG of the requested size so the service can run end to end
//! without provider credentials: a pastel background derived from the
//! prompt, with the prompt itself (first 500 characters, word-wrapped)
//! drawn on top in a built-in 3x5 bitmap font.
use std::io::Cursor;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};

use crate::config::GenerationOptions;
use crate::images::{GenerationError, ImageGenerator};

const FALLBACK_SIZE: (u32, u32) = (1024, 1024);
const TEXT_COLOUR: Rgb<u8> = Rgb([24, 24, 24]);
const MAX_PROMPT_CHARS: usize = 500;
const MAX_COLUMNS: usize = 52;

/// 3x5 glyph rows, most significant of the three bits on the left. Letters
/// are drawn upper-case; anything unknown is left blank.
fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '?' => [0b110, 0b001, 0b010, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        _ => [0; 5],
    }
}

/// Greedy word wrap on whitespace. A word longer than `width` gets a line
/// of its own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed <= width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Glyphs scale with the image (x4 at 1024 wide); anything past the right
/// or bottom edge is clipped.
fn draw_text(img: &mut RgbImage, text: &str) {
    let (width, height) = img.dimensions();
    let scale = (width / 256).max(1);
    let margin = 10 * scale;
    let cell = 4 * scale;
    let line_height = 7 * scale;
    let columns = ((width.saturating_sub(2 * margin) / cell).max(1) as usize).min(MAX_COLUMNS);

    let text: String = text.chars().take(MAX_PROMPT_CHARS).collect();
    for (row, line) in wrap(&text, columns).iter().enumerate() {
        let top = margin + row as u32 * line_height;
        if top >= height {
            break;
        }
        for (col, c) in line.chars().enumerate() {
            let left = margin + col as u32 * cell;
            if left >= width {
                break;
            }
            for (gy, bits) in glyph(c).iter().enumerate() {
                for gx in 0..3u32 {
                    if bits & (0b100 >> gx) == 0 {
                        continue;
                    }
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let x = left + gx * scale + dx;
                            let y = top + gy as u32 * scale + dy;
                            if x < width && y < height {
                                img.put_pixel(x, y, TEXT_COLOUR);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderGenerator;

impl PlaceholderGenerator {
    pub fn new() -> Self {
        PlaceholderGenerator
    }

    /// FNV-1a over the prompt, folded into a light pastel.
    fn colour_for(prompt: &str) -> Rgb<u8> {
        let mut hash: u32 = 0x811c_9dc5;
        for b in prompt.bytes() {
            hash ^= b as u32;
            hash = hash.wrapping_mul(0x0100_0193);
        }
        let [r, g, b, _] = hash.to_le_bytes();
        Rgb([160 + r % 96, 160 + g % 96, 160 + b % 96])
    }

    pub fn render(prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>, GenerationError> {
        let (width, height) = options.dimensions().unwrap_or(FALLBACK_SIZE);
        let mut img = RgbImage::from_pixel(width, height, Self::colour_for(prompt));
        draw_text(&mut img, prompt);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .map_err(|e| GenerationError::Render(e.to_string()))?;
        Ok(out.into_inner())
    }
}

#[async_trait]
impl ImageGenerator for PlaceholderGenerator {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<u8>, GenerationError> {
        let prompt = prompt.to_string();
        let options = options.clone();
        tokio::task::spawn_blocking(move || Self::render(&prompt, &options))
            .await
            .map_err(|e| GenerationError::Render(e.to_string()))?
    }
}
