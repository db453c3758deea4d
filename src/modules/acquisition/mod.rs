//! Resolving remote URLs into locally playable files.
//!
//! Work happens on worker threads that report back only through
//! [`AcquisitionEvent`](crate::core::events::AcquisitionEvent) messages. The
//! control thread keeps the request context in the [`AcquisitionRegistry`].

pub mod registry;
pub mod worker;
pub mod ytdlp;

use std::fmt;

pub use registry::{AcquisitionContext, AcquisitionRegistry, PendingAcquisition};
pub use worker::spawn_acquisition;
pub use ytdlp::YtDlpAcquirer;

/// Identifies one acquisition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcquisitionTicket(u64);

impl fmt::Display for AcquisitionTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acq-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionProgress {
    /// 0..=100
    pub percent: u8,
    pub status: String,
}

impl AcquisitionProgress {
    pub fn new(percent: u8, status: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            status: status.into(),
        }
    }
}
