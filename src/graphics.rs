use image::{DynamicImage, imageops::FilterType};
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

// --- Thumbnail Widget ---

pub struct ThumbnailWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_CHARS: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for ThumbnailWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_direct(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
      DisplayMode::Off => {}
    }
  }
}

/// Resize `image` to fill `area`, accounting for two pixel rows per cell in
/// half-block mode.
pub fn fit_to_area(image: &DynamicImage, area: Rect, display_mode: DisplayMode) -> DynamicImage {
  let target_w = (area.width as u32).max(1);
  let target_h = match display_mode {
    DisplayMode::Direct => area.height as u32 * 2,
    _ => area.height as u32,
  };
  image.resize_to_fill(target_w, target_h.max(1), FilterType::Triangle)
}

fn cell_offset(base: u16, offset: u32, i: u32) -> u16 {
  base.saturating_add(offset.min(u16::MAX as u32) as u16).saturating_add(i.min(u16::MAX as u32) as u16)
}

fn render_direct(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  // Image is already resized by the caller; just convert to RGB8.
  let resized = image.to_rgb8();
  let img_w = resized.width().min(area.width as u32);
  let img_h = resized.height();
  let cell_h = img_h.div_ceil(2);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(cell_h) / 2;

  for y in 0..cell_h.min(area.height as u32) {
    for x in 0..img_w {
      let upper = resized.get_pixel(x, y * 2);
      let lower_y = y * 2 + 1;
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if lower_y < img_h {
        let lower = resized.get_pixel(x, lower_y);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      buf.set_string(
        cell_offset(area.x, offset_x, x),
        cell_offset(area.y, offset_y, y),
        "▀",
        Style::default().fg(fg).bg(bg),
      );
    }
  }
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  let resized = image.to_luma8();
  let img_w = resized.width().min(area.width as u32);
  let img_h = resized.height().min(area.height as u32);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(img_h) / 2;

  for y in 0..img_h {
    for x in 0..img_w {
      let pixel = resized.get_pixel(x, y)[0];
      buf.set_string(
        cell_offset(area.x, offset_x, x),
        cell_offset(area.y, offset_y, y),
        ascii_for_luma(pixel),
        Style::default(),
      );
    }
  }
}

fn ascii_for_luma(luma: u8) -> &'static str {
  let idx = ((luma as f32 / 255.0) * (ASCII_CHARS.len() - 1) as f32).round() as usize;
  ASCII_CHARS[idx.min(ASCII_CHARS.len() - 1)]
}
