//! Synthetic camera
//!
//! Produces BGR8 frames: a diagonal gradient with a vertical bar that moves
//! a few pixels per frame. Output is a pure function of (variant, frame
//! index), so tests can rely on it.

use bytes::Bytes;
use contracts::{CaptureDevice, ContractError, FrameData, PixelFormat};
use tracing::debug;

/// Bar width (px)
const BAR_WIDTH: u32 = 16;

/// Bar movement per frame (px)
const BAR_STEP: u32 = 8;

/// Built-in pattern generator
#[derive(Debug)]
pub struct SyntheticCamera {
    variant: u32,
    width: u32,
    height: u32,
    frame_index: u64,
    released: bool,
}

impl SyntheticCamera {
    pub fn new(variant: u32, width: u32, height: u32) -> Result<Self, ContractError> {
        if width == 0 || height == 0 {
            return Err(ContractError::device_open(
                format!("synthetic:{variant}"),
                format!("invalid resolution {width}x{height}"),
            ));
        }

        debug!(variant, width, height, "synthetic camera opened");
        Ok(Self {
            variant,
            width,
            height,
            frame_index: 0,
            released: false,
        })
    }

    /// Frames produced so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn render(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let bar_x = ((self.frame_index * u64::from(BAR_STEP)) % u64::from(self.width)) as usize;
        let tint = (self.variant.wrapping_mul(53) % 256) as u8;

        let mut data = vec![0u8; w * h * 3];
        for (y, row) in data.chunks_exact_mut(w * 3).enumerate() {
            let g = (y * 255 / h.max(1)) as u8;
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                if x >= bar_x && x < bar_x + BAR_WIDTH as usize {
                    px.copy_from_slice(&[255, 255, 255]);
                } else {
                    let r = (x * 255 / w.max(1)) as u8;
                    px.copy_from_slice(&[tint, g, r]);
                }
            }
        }
        data
    }
}

impl CaptureDevice for SyntheticCamera {
    fn describe(&self) -> String {
        format!("synthetic:{} ({}x{})", self.variant, self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<Option<FrameData>, ContractError> {
        if self.released {
            return Err(ContractError::device_read(self.describe(), "device released"));
        }

        let frame = FrameData::new(
            self.width,
            self.height,
            PixelFormat::Bgr8,
            Bytes::from(self.render()),
        )?;
        self.frame_index += 1;
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.released = true;
    }
}
