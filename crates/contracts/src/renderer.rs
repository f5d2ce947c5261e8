//! Renderer trait - display collaborator interface

use crate::{CompositeFrame, ContractError};

/// Output collaborator driven by the aggregator, once per tick.
pub trait Renderer: Send {
    /// Renderer name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Present one composed artifact
    ///
    /// # Errors
    /// Returns render error (should include context)
    fn render(&mut self, frame: &CompositeFrame) -> Result<(), ContractError>;

    /// Non-blocking quit poll
    fn quit_requested(&self) -> bool;

    /// Release renderer resources
    fn close(&mut self) -> Result<(), ContractError>;
}
