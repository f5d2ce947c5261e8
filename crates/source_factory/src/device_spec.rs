//! Camera device spec parsing
//!
//! Accepted forms:
//! - `/dev/videoN` (or `videoN`, or a bare index `N`): capture device N
//! - `synthetic` / `synthetic:N`: built-in pattern generator, variant N
//! - an existing directory: image sequence, files played in name order

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{FactoryError, Result};

/// Parsed camera device spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraSpec {
    /// Platform capture device by index
    Video(u32),
    /// Built-in pattern generator
    Synthetic(u32),
    /// Directory of still images
    ImageSequence(PathBuf),
}

impl CameraSpec {
    /// Parse a device spec string.
    ///
    /// `/dev/video` with a non-numeric suffix is rejected; other strings are
    /// only accepted if they name an existing directory.
    pub fn parse(spec: &str) -> Result<Self> {
        let trimmed = spec.trim();
        if trimmed.is_empty() {
            return Err(FactoryError::invalid_spec(spec, "empty device spec"));
        }

        if let Some(rest) = trimmed.strip_prefix("synthetic") {
            return match rest.strip_prefix(':') {
                None if rest.is_empty() => Ok(Self::Synthetic(0)),
                Some(variant) => variant
                    .parse()
                    .map(Self::Synthetic)
                    .map_err(|_| FactoryError::invalid_spec(spec, "variant must be an integer")),
                None => Err(FactoryError::invalid_spec(spec, "unknown synthetic variant")),
            };
        }

        let video = trimmed
            .strip_prefix("/dev/video")
            .or_else(|| trimmed.strip_prefix("video"));
        if let Some(index) = video {
            return index
                .parse()
                .map(Self::Video)
                .map_err(|_| FactoryError::invalid_spec(spec, "device index must be an integer"));
        }

        if let Ok(index) = trimmed.parse() {
            return Ok(Self::Video(index));
        }

        let path = Path::new(trimmed);
        if path.is_dir() {
            return Ok(Self::ImageSequence(path.to_path_buf()));
        }

        Err(FactoryError::invalid_spec(
            spec,
            "not a video device, synthetic source or image directory",
        ))
    }
}

impl fmt::Display for CameraSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(index) => write!(f, "/dev/video{index}"),
            Self::Synthetic(0) => f.write_str("synthetic"),
            Self::Synthetic(variant) => write!(f, "synthetic:{variant}"),
            Self::ImageSequence(dir) => write!(f, "{}", dir.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_index() {
        assert_eq!(CameraSpec::parse("/dev/video0").unwrap(), CameraSpec::Video(0));
        assert_eq!(CameraSpec::parse("/dev/video12").unwrap(), CameraSpec::Video(12));
        assert_eq!(CameraSpec::parse("video3").unwrap(), CameraSpec::Video(3));
        assert_eq!(CameraSpec::parse("2").unwrap(), CameraSpec::Video(2));
        assert!(CameraSpec::parse("/dev/videoX").is_err());
    }

    #[test]
    fn test_parse_synthetic() {
        assert_eq!(CameraSpec::parse("synthetic").unwrap(), CameraSpec::Synthetic(0));
        assert_eq!(CameraSpec::parse("synthetic:4").unwrap(), CameraSpec::Synthetic(4));
        assert!(CameraSpec::parse("synthetic:x").is_err());
        assert!(CameraSpec::parse("synthetically").is_err());
    }

    #[test]
    fn test_parse_directory() {
        let dir = tempfile::tempdir().unwrap();
        let spec = CameraSpec::parse(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(spec, CameraSpec::ImageSequence(dir.path().to_path_buf()));
    }

    #[test]
    fn test_parse_unknown() {
        assert!(CameraSpec::parse("").is_err());
        assert!(CameraSpec::parse("/no/such/device/here").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CameraSpec::Video(1).to_string(), "/dev/video1");
        assert_eq!(CameraSpec::Synthetic(0).to_string(), "synthetic");
        assert_eq!(CameraSpec::Synthetic(2).to_string(), "synthetic:2");
    }
}
