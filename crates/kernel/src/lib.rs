//! Lifecycle kernel: event hub, frame clock, viewport state and the host
//! platform seam that drives them.
//!
//! # Invariants
//! - All mutation happens on the single event-loop thread.
//! - The clock never ticks inside its constructor; the first tick waits for a
//!   host frame.
//! - A cancelled frame token is never honoured.

pub mod clock;
pub mod event;
pub mod host;
pub mod viewport;

pub use clock::{Clock, FrameStats, NOMINAL_FRAME, TICK, Tick};
pub use event::{EventHub, Handler};
pub use host::{FrameScheduler, FrameToken, HostPlatform, ManualHost, TimeSource};
pub use viewport::{RESIZE, ViewportMetrics, ViewportState};

pub fn crate_info() -> &'static str {
    "experience-kernel v0.1.0"
}
