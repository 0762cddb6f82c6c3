//! Failure taxonomy for the tick pipeline.
//!
//! Nothing here is fatal to the process. The caller decides whether to drop
//! the offending frame and continue, or abort. `UnknownChannel` is recoverable
//! per-channel; the other variants abort the current tick and leave the
//! pipeline state untouched.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Frame dimensions do not match the configured resolution. The core does
    /// not resize; consistent resolution is the caller's contract.
    #[error(
        "frame is {got_width}x{got_height}, configured resolution is {want_width}x{want_height}"
    )]
    Input {
        want_width: u32,
        want_height: u32,
        got_width: u32,
        got_height: u32,
    },

    /// Sample timestamp precedes the previous one. Frames must arrive in
    /// non-decreasing timestamp order.
    #[error("sample at t={got_s}s precedes previous sample at t={prev_s}s")]
    OutOfOrder { prev_s: u64, got_s: u64 },

    /// The named appliance channel is not present in configuration.
    #[error("unknown appliance channel: {0}")]
    UnknownChannel(String),
}
