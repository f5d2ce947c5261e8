//! Command-line overrides applied on top of a loaded blueprint

use std::collections::HashMap;
use std::path::PathBuf;

use contracts::{CameraConfig, ContractError, DisplayBlueprint, RendererConfig, RendererKind};

/// Name of the renderer added for `output_dir`
pub const OUTPUT_RENDERER_NAME: &str = "file";

/// Parse a `WIDTHxHEIGHT` resolution string, e.g. `640x480`.
pub fn parse_resolution(s: &str) -> Result<(u32, u32), ContractError> {
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| ContractError::config_parse(format!("invalid resolution '{s}', expected WxH")))?;

    let parse_dim = |v: &str, what: &str| -> Result<u32, ContractError> {
        let dim: u32 = v.trim().parse().map_err(|_| {
            ContractError::config_parse(format!("invalid resolution {what} '{v}' in '{s}'"))
        })?;
        if dim == 0 {
            return Err(ContractError::config_validation(
                "resolution",
                format!("{what} must be > 0"),
            ));
        }
        Ok(dim)
    };

    Ok((parse_dim(w, "width")?, parse_dim(h, "height")?))
}

/// Optional per-field overrides (from CLI flags or environment)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Camera device spec
    pub camera: Option<String>,
    /// Camera resolution (width, height)
    pub resolution: Option<(u32, u32)>,
    /// Display frequency (Hz)
    pub frequency_hz: Option<f64>,
    /// Sampler join timeout (ms)
    pub join_timeout_ms: Option<u64>,
    /// Error log path
    pub error_log: Option<PathBuf>,
    /// Directory for a file renderer
    pub output_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.camera.is_none()
            && self.resolution.is_none()
            && self.frequency_hz.is_none()
            && self.join_timeout_ms.is_none()
            && self.error_log.is_none()
            && self.output_dir.is_none()
    }

    /// Apply overrides and re-validate the result.
    ///
    /// Camera overrides create a default camera when the blueprint has none.
    pub fn apply(&self, blueprint: &mut DisplayBlueprint) -> Result<(), ContractError> {
        if self.camera.is_some() || self.resolution.is_some() {
            let camera = blueprint.camera.get_or_insert_with(CameraConfig::default);
            if let Some(device) = &self.camera {
                camera.device = device.clone();
            }
            if let Some((width, height)) = self.resolution {
                camera.width = width;
                camera.height = height;
            }
        }

        if let Some(hz) = self.frequency_hz {
            blueprint.display.frequency_hz = hz;
        }
        if let Some(ms) = self.join_timeout_ms {
            blueprint.display.join_timeout_ms = ms;
        }
        if let Some(path) = &self.error_log {
            blueprint.logging.error_log = Some(path.clone());
        }

        if let Some(dir) = &self.output_dir {
            let base_path = dir.to_string_lossy().into_owned();
            match blueprint
                .renderers
                .iter_mut()
                .find(|r| r.name == OUTPUT_RENDERER_NAME)
            {
                Some(existing) => {
                    existing.kind = RendererKind::File;
                    existing.params.insert("base_path".to_string(), base_path);
                }
                None => blueprint.renderers.push(RendererConfig {
                    name: OUTPUT_RENDERER_NAME.to_string(),
                    kind: RendererKind::File,
                    params: HashMap::from([("base_path".to_string(), base_path)]),
                }),
            }
        }

        crate::validator::validate(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("640x480").unwrap(), (640, 480));
        assert_eq!(parse_resolution(" 1280X720 ").unwrap(), (1280, 720));
        assert!(parse_resolution("640").is_err());
        assert!(parse_resolution("640x").is_err());
        assert!(parse_resolution("axb").is_err());
        assert!(parse_resolution("0x480").is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut bp = DisplayBlueprint::default();
        let overrides = ConfigOverrides {
            camera: Some("/dev/video2".into()),
            resolution: Some((320, 240)),
            frequency_hz: Some(24.0),
            join_timeout_ms: Some(250),
            ..Default::default()
        };
        overrides.apply(&mut bp).unwrap();

        let camera = bp.camera.as_ref().unwrap();
        assert_eq!(camera.device, "/dev/video2");
        assert_eq!(camera.resolution(), (320, 240));
        assert_eq!(bp.display.frequency_hz, 24.0);
        assert_eq!(bp.display.join_timeout_ms, 250);
    }

    #[test]
    fn test_camera_override_creates_camera() {
        let mut bp = DisplayBlueprint {
            camera: None,
            ..Default::default()
        };
        ConfigOverrides {
            camera: Some("synthetic:1".into()),
            ..Default::default()
        }
        .apply(&mut bp)
        .unwrap();
        assert_eq!(bp.camera.unwrap().device, "synthetic:1");
    }

    #[test]
    fn test_output_dir_adds_file_renderer() {
        let mut bp = DisplayBlueprint::default();
        ConfigOverrides {
            output_dir: Some(PathBuf::from("/tmp/out")),
            ..Default::default()
        }
        .apply(&mut bp)
        .unwrap();

        let renderer = bp
            .renderers
            .iter()
            .find(|r| r.name == OUTPUT_RENDERER_NAME)
            .unwrap();
        assert_eq!(renderer.kind, RendererKind::File);
        assert_eq!(renderer.params["base_path"], "/tmp/out");
        assert_eq!(bp.renderers.len(), 2);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut bp = DisplayBlueprint::default();
        let err = ConfigOverrides {
            frequency_hz: Some(0.0),
            ..Default::default()
        }
        .apply(&mut bp);
        assert!(err.is_err());
    }
}
