//! GDI screen grab of the playfield region.

use std::ffi::c_void;

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDC, GetDIBits, HBITMAP, HDC, ReleaseDC, SRCCOPY,
    SelectObject,
};

use super::{CaptureRegion, Frame, FrameSource};
use crate::error::{Error, Result};

/// Grabs a fixed screen rectangle; the game window must stay put and uncovered
#[derive(Debug)]
pub struct ScreenCapturer {
    region: CaptureRegion,
}

impl ScreenCapturer {
    pub fn new(region: CaptureRegion) -> Self {
        Self { region }
    }
}

/// Releases the GDI objects of one grab in reverse order of creation
struct GdiGrab {
    screen_dc: HDC,
    memory_dc: HDC,
    bitmap: HBITMAP,
}

impl Drop for GdiGrab {
    fn drop(&mut self) {
        // SAFETY: each object was created by this grab and is released once.
        unsafe {
            let _ = DeleteObject(self.bitmap);
            let _ = DeleteDC(self.memory_dc);
            ReleaseDC(HWND::default(), self.screen_dc);
        }
    }
}

impl FrameSource for ScreenCapturer {
    fn capture(&mut self) -> Result<Frame> {
        let CaptureRegion {
            left,
            top,
            width,
            height,
        } = self.region;
        let (w, h) = (width as i32, height as i32);

        // SAFETY: all handles are owned by `grab` and freed on drop; the DIB
        // buffer is sized for `width × height` 32-bit pixels.
        unsafe {
            let screen_dc = GetDC(HWND::default());
            if screen_dc.is_invalid() {
                return Err(Error::Capture("GetDC failed".to_string()));
            }
            let memory_dc = CreateCompatibleDC(screen_dc);
            let bitmap = CreateCompatibleBitmap(screen_dc, w, h);
            let grab = GdiGrab {
                screen_dc,
                memory_dc,
                bitmap,
            };

            let previous = SelectObject(grab.memory_dc, grab.bitmap);
            BitBlt(grab.memory_dc, 0, 0, w, h, grab.screen_dc, left, top, SRCCOPY)
                .map_err(|e| Error::Capture(format!("BitBlt failed: {}", e)))?;
            SelectObject(grab.memory_dc, previous);

            let mut info = BITMAPINFO {
                bmiHeader: BITMAPINFOHEADER {
                    biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                    biWidth: w,
                    // Negative height: top-down rows
                    biHeight: -h,
                    biPlanes: 1,
                    biBitCount: 32,
                    biCompression: BI_RGB.0,
                    ..Default::default()
                },
                ..Default::default()
            };

            let mut bgra = vec![0u8; (width * height * 4) as usize];
            let lines = GetDIBits(
                grab.memory_dc,
                grab.bitmap,
                0,
                height,
                Some(bgra.as_mut_ptr() as *mut c_void),
                &mut info,
                DIB_RGB_COLORS,
            );
            if lines != h {
                return Err(Error::Capture(format!(
                    "GetDIBits copied {} of {} lines",
                    lines, height
                )));
            }

            let pixels = bgra
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect();
            Ok(Frame::new(width, height, pixels))
        }
    }
}
