//! Error taxonomy for the binding layer.
//!
//! Three failure classes exist, each with its own policy:
//!
//! - transient presentation failures ([`PresentError`]) are caught at the
//!   point of use, logged, and treated as no-ops;
//! - configuration errors ([`BindingError::MissingArgument`]) fail fast at
//!   construction time;
//! - host service unavailability is caught once, cached, and silently
//!   no-ops afterwards (see `HostServices` consumers in `host.rs`).
//!
//! Panics on the toolkit thread are a fourth class handled by the task loop
//! in `dispatch.rs`: caught per task, routed to a blocking error dialog, and
//! then the loop resumes.

use thiserror::Error;

/// A transient failure while copying the framebuffer to the host surface.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PresentError {
    /// The presentable surface went away mid-blit (lifecycle transition).
    #[error("presentable surface lost")]
    SurfaceLost,
    /// The host rejected the blit region.
    #[error("blit region rejected by host surface")]
    BadRegion,
}

/// Errors surfaced by the binding's construction and host bridging APIs.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A required host service was not supplied to the context builder.
    #[error("missing required binding argument: {0}")]
    MissingArgument(&'static str),
    /// A host service is permanently unavailable on this device.
    #[error("host service unavailable: {0}")]
    ServiceUnavailable(&'static str),
    /// The toolkit thread has already been shut down.
    #[error("toolkit thread is not running")]
    ToolkitStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_argument() {
        let err = BindingError::MissingArgument("ui_dispatcher");
        assert_eq!(
            err.to_string(),
            "missing required binding argument: ui_dispatcher"
        );
        assert_eq!(PresentError::SurfaceLost.to_string(), "presentable surface lost");
    }
}
