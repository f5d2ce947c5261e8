//! SourceFactory core implementation
//!
//! Builds every source of a blueprint, releasing whatever was already built
//! if a later source fails.

use std::collections::HashSet;

use contracts::{CameraConfig, CounterConfig, DisplayBlueprint, SensorSource};
use tracing::{error, info, instrument, warn};

use crate::counter::PeriodicCounter;
use crate::device_spec::CameraSpec;
use crate::error::{FactoryError, Result};
use crate::frame_source::FrameSource;
use crate::opener::{DefaultDeviceOpener, DeviceOpener};

/// One source to build
#[derive(Debug, Clone)]
pub enum SourceSpec {
    Camera(CameraConfig),
    Counter(CounterConfig),
}

impl SourceSpec {
    pub fn id(&self) -> &str {
        match self {
            Self::Camera(c) => &c.id,
            Self::Counter(c) => &c.id,
        }
    }

    /// Specs in construction order (camera first, then counters)
    pub fn from_blueprint(blueprint: &DisplayBlueprint) -> Vec<Self> {
        blueprint
            .camera
            .iter()
            .cloned()
            .map(Self::Camera)
            .chain(blueprint.counters.iter().cloned().map(Self::Counter))
            .collect()
    }
}

/// Source Factory
///
/// Constructs sources and provides rollback on partial failure.
pub struct SourceFactory<O: DeviceOpener = DefaultDeviceOpener> {
    opener: O,
}

impl SourceFactory<DefaultDeviceOpener> {
    pub fn new() -> Self {
        Self {
            opener: DefaultDeviceOpener,
        }
    }
}

impl Default for SourceFactory<DefaultDeviceOpener> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: DeviceOpener> SourceFactory<O> {
    pub fn with_opener(opener: O) -> Self {
        Self { opener }
    }

    /// Build all sources of a blueprint
    pub fn build_from_blueprint(
        &self,
        blueprint: &DisplayBlueprint,
    ) -> Result<Vec<Box<dyn SensorSource>>> {
        self.build(&SourceSpec::from_blueprint(blueprint))
    }

    /// Build sources in order
    ///
    /// # Atomicity
    /// If any source fails, every source built so far is released before
    /// the error is returned.
    #[instrument(
        name = "source_factory_build",
        skip(self, specs),
        fields(source_count = specs.len())
    )]
    pub fn build(&self, specs: &[SourceSpec]) -> Result<Vec<Box<dyn SensorSource>>> {
        let mut built: Vec<Box<dyn SensorSource>> = Vec::with_capacity(specs.len());
        let mut seen = HashSet::new();

        for spec in specs {
            let result = if seen.insert(spec.id()) {
                self.build_one(spec)
            } else {
                Err(FactoryError::DuplicateSource {
                    sensor_id: spec.id().to_string(),
                })
            };

            match result {
                Ok(source) => built.push(source),
                Err(e) => {
                    error!(
                        sensor_id = %spec.id(),
                        error = %e,
                        "source construction failed, rolling back"
                    );
                    Self::rollback(built);
                    return Err(e);
                }
            }
        }

        info!(sources = built.len(), "all sources built successfully");
        Ok(built)
    }

    fn build_one(&self, spec: &SourceSpec) -> Result<Box<dyn SensorSource>> {
        match spec {
            SourceSpec::Counter(config) => {
                info!(sensor_id = %config.id, period_ms = config.period_ms, "building counter");
                Ok(Box::new(PeriodicCounter::new(
                    config.id.as_str(),
                    config.period(),
                )))
            }
            SourceSpec::Camera(config) => self.build_camera(config),
        }
    }

    #[instrument(
        name = "source_factory_build_camera",
        skip(self, config),
        fields(sensor_id = %config.id, device = %config.device)
    )]
    fn build_camera(&self, config: &CameraConfig) -> Result<Box<dyn SensorSource>> {
        let spec = CameraSpec::parse(&config.device)?;
        // Rate is checked before the device is opened
        let frame_interval = config.frame_interval()?;
        let device = self
            .opener
            .open(&spec, config)
            .map_err(|e| match e {
                FactoryError::Contract(inner) => {
                    FactoryError::camera_open(&config.id, spec.to_string(), inner.to_string())
                }
                other => other,
            })?;

        Ok(Box::new(FrameSource::new(
            config.id.as_str(),
            device,
            frame_interval,
        )))
    }

    /// Release already-built sources, last built first
    #[instrument(name = "source_factory_rollback", skip(built), fields(count = built.len()))]
    fn rollback(mut built: Vec<Box<dyn SensorSource>>) {
        warn!("performing rollback");
        while let Some(source) = built.pop() {
            info!(sensor_id = %source.sensor_id(), "releasing source");
            drop(source);
        }
    }
}
