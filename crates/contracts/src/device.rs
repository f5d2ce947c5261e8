//! CaptureDevice trait - external frame capture collaborator
//!
//! The actual driver is out of scope; the frame source only needs a
//! blocking read and a release hook.

use crate::{ContractError, FrameData};

/// Frame capture device handle
///
/// `read_frame` may block for up to one device frame interval. `Ok(None)`
/// means the device produced no frame this time (transient); `Err` means
/// the read itself failed.
pub trait CaptureDevice: Send {
    /// Human-readable device name (for logs)
    fn describe(&self) -> String;

    /// Blocking read of the next frame
    fn read_frame(&mut self) -> Result<Option<FrameData>, ContractError>;

    /// Release the underlying handle
    ///
    /// The owning frame source calls this exactly once.
    fn release(&mut self);
}
