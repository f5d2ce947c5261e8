//! Renderer construction from configuration

use contracts::{RendererConfig, RendererKind};
use tracing::{info, instrument};

use crate::error::{RenderError, Result};
use crate::quit::QuitSignal;
use crate::renderers::{FileRenderer, LogRenderer};
use crate::set::RendererSet;

/// Build one renderer per config entry, wrapped in a [`RendererSet`]
#[instrument(name = "render_create", skip(configs, quit), fields(count = configs.len()))]
pub fn create_renderers(configs: &[RendererConfig], quit: QuitSignal) -> Result<RendererSet> {
    let mut set = RendererSet::new(quit);

    for config in configs {
        match config.kind {
            RendererKind::Log => set.push(Box::new(LogRenderer::new(&config.name))),
            RendererKind::File => {
                let renderer = FileRenderer::from_params(&config.name, &config.params)
                    .map_err(|e| RenderError::create(&config.name, e.to_string()))?;
                info!(
                    renderer = %config.name,
                    base_path = %renderer.base_path().display(),
                    "file renderer ready"
                );
                set.push(Box::new(renderer));
            }
        }
    }

    Ok(set)
}
