use std::time::Duration;

use experience_common::Size;

/// Handle of one requested animation frame. Revoked by [`FrameScheduler::cancel_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// "Request next frame" half of the host platform.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;

    fn cancel_frame(&mut self, token: FrameToken);
}

/// Monotonic high-resolution time, measured from an arbitrary host origin.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Everything the lifecycle needs from the platform it runs on.
pub trait HostPlatform: FrameScheduler + TimeSource {
    fn surface_size(&self) -> Size;

    fn device_pixel_ratio(&self) -> f64;
}

/// Host driven by hand: time only moves when told to and frames are
/// delivered by the caller. Used by headless runs and tests.
#[derive(Debug, Clone)]
pub struct ManualHost {
    now: Duration,
    next_token: u64,
    pending: Vec<FrameToken>,
    cancelled: usize,
    size: Size,
    pixel_ratio: f64,
}

impl ManualHost {
    pub fn new(size: Size) -> Self {
        Self {
            now: Duration::ZERO,
            next_token: 0,
            pending: Vec::new(),
            cancelled: 0,
            size,
            pixel_ratio: 1.0,
        }
    }

    pub fn with_pixel_ratio(mut self, ratio: f64) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    pub fn advance(&mut self, dt: Duration) {
        self.now += dt;
    }

    pub fn set_surface_size(&mut self, size: Size) {
        self.size = size;
    }

    /// Pop the oldest outstanding frame request.
    pub fn next_frame(&mut self) -> Option<FrameToken> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    pub fn pending_frames(&self) -> &[FrameToken] {
        &self.pending
    }

    /// Number of requests revoked through `cancel_frame`.
    pub fn cancelled_frames(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualHost {
    fn request_frame(&mut self) -> FrameToken {
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        self.pending.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let before = self.pending.len();
        self.pending.retain(|t| *t != token);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

impl TimeSource for ManualHost {
    fn now(&self) -> Duration {
        self.now
    }
}

impl HostPlatform for ManualHost {
    fn surface_size(&self) -> Size {
        self.size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }
}
