//! Image-sequence camera
//!
//! Plays the still images of a directory in file-name order, looping at the
//! end. Every image is scaled to the requested resolution and converted to
//! BGR8.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use contracts::{CaptureDevice, ContractError, FrameData, PixelFormat};
use image::imageops::FilterType;
use tracing::{debug, info};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Directory-backed capture device
#[derive(Debug)]
pub struct ImageSequenceCamera {
    dir: PathBuf,
    files: Vec<PathBuf>,
    width: u32,
    height: u32,
    cursor: usize,
    released: bool,
}

impl ImageSequenceCamera {
    /// Scan `dir` for images. Fails if it holds none.
    pub fn open(dir: &Path, width: u32, height: u32) -> Result<Self, ContractError> {
        let device = dir.display().to_string();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ContractError::device_open(&device, e.to_string()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(ContractError::device_open(device, "no images in directory"));
        }

        info!(dir = %dir.display(), frames = files.len(), "image sequence opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            width,
            height,
            cursor: 0,
            released: false,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn decode(&self, path: &Path) -> Result<FrameData, ContractError> {
        let img = image::open(path)
            .map_err(|e| ContractError::device_read(path.display().to_string(), e.to_string()))?;

        let img = if img.width() == self.width && img.height() == self.height {
            img
        } else {
            img.resize_exact(self.width, self.height, FilterType::Triangle)
        };

        let mut data = img.to_rgb8().into_raw();
        for px in data.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        FrameData::new(self.width, self.height, PixelFormat::Bgr8, Bytes::from(data))
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

impl CaptureDevice for ImageSequenceCamera {
    fn describe(&self) -> String {
        format!("{} ({} images)", self.dir.display(), self.files.len())
    }

    fn read_frame(&mut self) -> Result<Option<FrameData>, ContractError> {
        if self.released {
            return Err(ContractError::device_read(self.describe(), "device released"));
        }

        let path = self.files[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.files.len();

        let frame = self.decode(&path)?;
        debug!(file = %path.display(), "image frame decoded");
        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.released = true;
    }
}
