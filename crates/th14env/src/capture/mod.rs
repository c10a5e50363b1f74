//! Playfield capture and frame history.

mod history;
#[cfg(target_os = "windows")]
mod screen;

use crate::error::Result;
use crate::process::{FrameGeometry, WindowRect};

pub use history::{FrameHistory, FrameStack};
#[cfg(target_os = "windows")]
pub use screen::ScreenCapturer;

/// Source of playfield frames; returns one frame per call
pub trait FrameSource {
    fn capture(&mut self) -> Result<Frame>;
}

impl<F: FrameSource + ?Sized> FrameSource for &mut F {
    fn capture(&mut self) -> Result<Frame> {
        (**self).capture()
    }
}

/// Screen-absolute rectangle to grab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn from_window(window: &WindowRect, frame: &FrameGeometry) -> Self {
        Self {
            left: window.left + frame.left,
            top: window.top + frame.top,
            width: frame.width,
            height: frame.height,
        }
    }
}

/// Row-major RGB pixels, `height × width × 3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 3) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A frame of one uniform colour
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Self::new(width, height, pixels)
    }

    /// ITU-R BT.601 luma
    pub fn to_gray(&self) -> GrayFrame {
        let pixels = self
            .pixels
            .chunks_exact(3)
            .map(|px| {
                let luma = 299 * u32::from(px[0]) + 587 * u32::from(px[1]) + 114 * u32::from(px[2]);
                ((luma + 500) / 1000) as u8
            })
            .collect();
        GrayFrame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Row-major single-channel pixels, `height × width`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl GrayFrame {
    /// Output size for a downsize ratio, never smaller than 1×1
    pub fn scaled_size(width: u32, height: u32, ratio: f32) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * ratio).round() as u32).max(1);
        (scale(width), scale(height))
    }

    /// Box-filter downscale; `ratio` of 1.0 returns an identical frame
    pub fn downsize(&self, ratio: f32) -> GrayFrame {
        let (out_w, out_h) = Self::scaled_size(self.width, self.height, ratio);
        if out_w == self.width && out_h == self.height {
            return self.clone();
        }

        let (src_w, src_h) = (self.width as usize, self.height as usize);
        let mut pixels = Vec::with_capacity((out_w * out_h) as usize);
        for oy in 0..out_h as usize {
            let y0 = oy * src_h / out_h as usize;
            let y1 = ((oy + 1) * src_h / out_h as usize).max(y0 + 1);
            for ox in 0..out_w as usize {
                let x0 = ox * src_w / out_w as usize;
                let x1 = ((ox + 1) * src_w / out_w as usize).max(x0 + 1);

                let mut sum = 0u32;
                for y in y0..y1 {
                    let row = &self.pixels[y * src_w..(y + 1) * src_w];
                    sum += row[x0..x1].iter().map(|&p| u32::from(p)).sum::<u32>();
                }
                let count = ((y1 - y0) * (x1 - x0)) as u32;
                pixels.push(((sum + count / 2) / count) as u8);
            }
        }

        GrayFrame {
            width: out_w,
            height: out_h,
            pixels,
        }
    }
}

/// Grayscale then downsize, the per-frame observation preprocessing
pub fn preprocess(frame: &Frame, ratio: f32) -> GrayFrame {
    frame.to_gray().downsize(ratio)
}
