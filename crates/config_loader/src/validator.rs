//! Configuration validation
//!
//! Rules:
//! - field ranges (frequency_hz > 0, period_ms > 0, resolution > 0) via `validator` derive
//! - source ids unique across camera and counters
//! - renderer names unique
//! - file renderers carry a `base_path`
//! - error log path not empty

use std::collections::HashSet;

use contracts::{ContractError, DisplayBlueprint, RendererKind};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Validate a DisplayBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &DisplayBlueprint) -> Result<(), ContractError> {
    validate_field_ranges(blueprint)?;
    validate_source_ids(blueprint)?;
    validate_renderers(blueprint)?;
    validate_logging(blueprint)?;
    Ok(())
}

/// Derive-based range checks, flattened into a single error
fn validate_field_ranges(blueprint: &DisplayBlueprint) -> Result<(), ContractError> {
    let Err(errors) = blueprint.validate() else {
        return Ok(());
    };

    let mut flat = Vec::new();
    flatten_errors("", &errors, &mut flat);
    flat.sort();

    let field = flat
        .first()
        .map(|(path, _)| path.clone())
        .unwrap_or_else(|| "blueprint".to_string());
    let message = flat
        .iter()
        .map(|(path, msg)| format!("{path}: {msg}"))
        .collect::<Vec<_>>()
        .join("; ");

    Err(ContractError::config_validation(field, message))
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let value = e
                        .params
                        .get("value")
                        .map(|v| format!(" (got {v})"))
                        .unwrap_or_default();
                    out.push((path.clone(), format!("failed '{}' check{value}", e.code)));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

/// Source ids are unique (they key channels and overlay lines)
fn validate_source_ids(blueprint: &DisplayBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for id in blueprint.source_ids() {
        if !seen.insert(id) {
            return Err(ContractError::config_validation(
                format!("sources[id={id}]"),
                "duplicate source id",
            ));
        }
    }
    Ok(())
}

/// Validate renderer configuration
fn validate_renderers(blueprint: &DisplayBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, renderer) in blueprint.renderers.iter().enumerate() {
        if !seen.insert(renderer.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("renderers[{idx}].name"),
                format!("duplicate renderer name '{}'", renderer.name),
            ));
        }

        if renderer.kind == RendererKind::File
            && renderer
                .params
                .get("base_path")
                .is_none_or(|p| p.trim().is_empty())
        {
            return Err(ContractError::config_validation(
                format!("renderers[{idx}].params.base_path"),
                "file renderer requires base_path",
            ));
        }
    }
    Ok(())
}

fn validate_logging(blueprint: &DisplayBlueprint) -> Result<(), ContractError> {
    if let Some(path) = &blueprint.logging.error_log {
        if path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(
                "logging.error_log",
                "error log path cannot be empty",
            ));
        }
    }
    Ok(())
}
