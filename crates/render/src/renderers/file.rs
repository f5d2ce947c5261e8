//! FileRenderer - writes composites to disk
//!
//! Layout under `base_path`:
//! - `frames/<tick>.png`: displayed frame (when one is known)
//! - `overlay/<tick>.json`: overlay lines and freshness meta

use contracts::{CompositeFrame, CompositeMeta, ContractError, FrameData, OverlayLine, PixelFormat, Renderer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

use crate::error::{RenderError, Result};

/// Configuration for FileRenderer
#[derive(Debug, Clone)]
pub struct FileRendererConfig {
    /// Base output directory
    pub base_path: PathBuf,
    /// Persist every n-th composite
    pub every_n: u64,
}

impl FileRendererConfig {
    /// Create config from params map
    pub fn from_params(name: &str, params: &HashMap<String, String>) -> Result<Self> {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let every_n = match params.get("every_n") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    RenderError::invalid_param(name, "every_n", format!("expected a positive integer, got '{raw}'"))
                })?,
            None => 1,
        };

        Ok(Self { base_path, every_n })
    }
}

#[derive(Serialize)]
struct OverlayRecord<'a> {
    tick: u64,
    composed_at_ms: u64,
    has_frame: bool,
    overlay: &'a [OverlayLine],
    meta: &'a CompositeMeta,
}

/// Renderer that persists composites as PNG + JSON
pub struct FileRenderer {
    name: String,
    config: FileRendererConfig,
    created_dirs: HashSet<PathBuf>,
    written: u64,
}

impl FileRenderer {
    /// Create a new FileRenderer
    pub fn new(name: impl Into<String>, config: FileRendererConfig) -> Result<Self> {
        let name = name.into();
        fs::create_dir_all(&config.base_path).map_err(|e| RenderError::write(&name, e))?;

        Ok(Self {
            name,
            config,
            created_dirs: HashSet::new(),
            written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(name: impl Into<String>, params: &HashMap<String, String>) -> Result<Self> {
        let name = name.into();
        let config = FileRendererConfig::from_params(&name, params)?;
        Self::new(name, config)
    }

    /// Composites persisted so far
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    fn ensure_dir(&mut self, sub: &str) -> std::io::Result<PathBuf> {
        let dir = self.config.base_path.join(sub);
        if !self.created_dirs.contains(&dir) {
            fs::create_dir_all(&dir)?;
            self.created_dirs.insert(dir.clone());
        }
        Ok(dir)
    }

    fn write_composite(&mut self, frame: &CompositeFrame) -> std::io::Result<()> {
        let tick = frame.tick;

        // 1. Frame image
        if let Some(image) = &frame.frame {
            let frames_dir = self.ensure_dir("frames")?;
            save_frame(&frames_dir.join(format!("{tick}.png")), image)?;
        }

        // 2. Overlay + meta
        let overlay_dir = self.ensure_dir("overlay")?;
        let file = File::create(overlay_dir.join(format!("{tick}.json")))?;
        let record = OverlayRecord {
            tick,
            composed_at_ms: frame.composed_at.as_millis() as u64,
            has_frame: frame.frame.is_some(),
            overlay: &frame.overlay,
            meta: &frame.meta,
        };
        serde_json::to_writer_pretty(BufWriter::new(file), &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        Ok(())
    }

    fn persist(&mut self, frame: &CompositeFrame) -> std::result::Result<(), ContractError> {
        self.write_composite(frame).map_err(|e| {
            error!(renderer = %self.name, tick = frame.tick, error = %e, "Write failed");
            ContractError::from(RenderError::write(&self.name, e))
        })
    }
}

fn save_frame(path: &Path, frame: &FrameData) -> std::io::Result<()> {
    match frame.format {
        PixelFormat::Rgb8 => image::save_buffer(
            path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::Rgb8,
        )
        .map_err(std::io::Error::other),

        PixelFormat::Bgr8 => {
            let mut rgb = frame.data.to_vec();
            for chunk in rgb.chunks_exact_mut(3) {
                chunk.swap(0, 2);
            }
            image::save_buffer(path, &rgb, frame.width, frame.height, image::ColorType::Rgb8)
                .map_err(std::io::Error::other)
        }

        PixelFormat::Gray8 => image::save_buffer(
            path,
            &frame.data,
            frame.width,
            frame.height,
            image::ColorType::L8,
        )
        .map_err(std::io::Error::other),
    }
}

impl Renderer for FileRenderer {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_renderer_render",
        skip(self, frame),
        fields(renderer = %self.name, tick = frame.tick)
    )]
    fn render(&mut self, frame: &CompositeFrame) -> std::result::Result<(), ContractError> {
        if frame.tick % self.config.every_n != 0 {
            return Ok(());
        }
        self.persist(frame)?;
        self.written += 1;
        Ok(())
    }

    fn quit_requested(&self) -> bool {
        false
    }

    #[instrument(name = "file_renderer_close", skip(self))]
    fn close(&mut self) -> std::result::Result<(), ContractError> {
        debug!(renderer = %self.name, written = self.written, "FileRenderer closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn composite(tick: u64, frame: Option<FrameData>) -> CompositeFrame {
        CompositeFrame {
            tick,
            composed_at: Duration::from_millis(tick * 33),
            frame,
            overlay: vec![OverlayLine {
                sensor_id: "sensor1".into(),
                text: "sensor1: 7".to_string(),
                origin: OverlayLine::origin_for(0),
                value: Some(7),
                extrapolated: true,
            }],
            meta: CompositeMeta::default(),
        }
    }

    #[test]
    fn test_file_renderer_writes_png_and_overlay() {
        let dir = tempdir().unwrap();
        let config = FileRendererConfig {
            base_path: dir.path().to_path_buf(),
            every_n: 1,
        };
        let mut renderer = FileRenderer::new("test_file", config).unwrap();

        // 2x1 BGR: pure blue, pure red
        let data = vec![255u8, 0, 0, 0, 0, 255];
        let frame = FrameData::new(2, 1, PixelFormat::Bgr8, data).unwrap();
        renderer.render(&composite(1, Some(frame))).unwrap();
        renderer.close().unwrap();

        let png = image::open(dir.path().join("frames/1.png")).unwrap().to_rgb8();
        assert_eq!(png.get_pixel(0, 0).0, [0, 0, 255]);
        assert_eq!(png.get_pixel(1, 0).0, [255, 0, 0]);

        let json = fs::read_to_string(dir.path().join("overlay/1.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tick"], 1);
        assert_eq!(value["overlay"][0]["text"], "sensor1: 7");
        assert_eq!(value["overlay"][0]["extrapolated"], true);
    }

    #[test]
    fn test_file_renderer_without_frame_writes_overlay_only() {
        let dir = tempdir().unwrap();
        let config = FileRendererConfig {
            base_path: dir.path().to_path_buf(),
            every_n: 1,
        };
        let mut renderer = FileRenderer::new("test_file", config).unwrap();
        renderer.render(&composite(3, None)).unwrap();

        assert!(!dir.path().join("frames").exists());
        assert!(dir.path().join("overlay/3.json").exists());
    }

    #[test]
    fn test_every_n_skips_ticks() {
        let dir = tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert("base_path".to_string(), dir.path().display().to_string());
        params.insert("every_n".to_string(), "2".to_string());

        let mut renderer = FileRenderer::from_params("sparse", &params).unwrap();
        for tick in 1..=5 {
            renderer.render(&composite(tick, None)).unwrap();
        }
        assert_eq!(renderer.written(), 2);
        let entries: Vec<_> = fs::read_dir(dir.path().join("overlay")).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_invalid_every_n_rejected() {
        let mut params = HashMap::new();
        params.insert("every_n".to_string(), "0".to_string());
        let err = FileRendererConfig::from_params("bad", &params).unwrap_err();
        assert!(matches!(err, RenderError::InvalidParam { ref param, .. } if param == "every_n"));
    }
}
