use std::collections::VecDeque;
use std::time::Duration;

use crate::event::EventHub;
use crate::host::{FrameScheduler, FrameToken, TimeSource};

/// Event fired once per accepted frame.
pub const TICK: &str = "tick";

/// Delta reported before two distinct timestamps have been observed (60 Hz).
pub const NOMINAL_FRAME: Duration = Duration::from_millis(16);

const STATS_WINDOW: usize = 120;

/// Timing of one frame, handed to every `tick` handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// 1-based frame counter.
    pub frame: u64,
    pub delta: Duration,
    pub elapsed: Duration,
}

impl Tick {
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Per-frame timer driven by host animation frames.
///
/// The first frame is requested on construction and only handled when the
/// host delivers it, so the first delta always spans two distinct calls to
/// the time source. Each handled frame requests the next one; the pending
/// request is kept as a token so [`Clock::cancel`] can revoke it.
pub struct Clock<C> {
    start: Duration,
    current: Duration,
    elapsed: Duration,
    delta: Duration,
    frame: u64,
    pending: Option<FrameToken>,
    cancelled: bool,
    stats: FrameStats,
    events: EventHub<C, Tick>,
}

impl<C> Clock<C> {
    pub fn new<H>(host: &mut H) -> Self
    where
        H: FrameScheduler + TimeSource + ?Sized,
    {
        let start = host.now();
        let pending = host.request_frame();
        tracing::debug!(?pending, "clock started, first frame requested");
        Self {
            start,
            current: start,
            elapsed: Duration::ZERO,
            delta: NOMINAL_FRAME,
            frame: 0,
            pending: Some(pending),
            cancelled: false,
            stats: FrameStats::new(STATS_WINDOW),
            events: EventHub::new(),
        }
    }

    /// Handle a frame delivered by the host.
    ///
    /// Frames whose token is not the outstanding request (stale, duplicated
    /// or revoked) are ignored and return `None`.
    pub fn on_frame<H>(&mut self, token: FrameToken, ctx: &mut C, host: &mut H) -> Option<Tick>
    where
        H: FrameScheduler + TimeSource + ?Sized,
    {
        if self.cancelled || self.pending != Some(token) {
            tracing::trace!(?token, pending = ?self.pending, "ignoring frame");
            return None;
        }
        self.pending = None;

        let now = host.now();
        let advanced = now.saturating_sub(self.current);
        // Host time did not move: keep the previous delta rather than report zero.
        if !advanced.is_zero() {
            self.delta = advanced;
        }
        self.current = self.current.max(now);
        self.elapsed = self.current - self.start;
        self.frame += 1;
        self.stats.record(self.delta);

        let tick = Tick {
            frame: self.frame,
            delta: self.delta,
            elapsed: self.elapsed,
        };
        self.events.trigger(TICK, ctx, &tick);

        self.pending = Some(host.request_frame());
        Some(tick)
    }

    /// Revoke the outstanding frame request. Returns `false` if already cancelled.
    pub fn cancel<H>(&mut self, host: &mut H) -> bool
    where
        H: FrameScheduler + ?Sized,
    {
        if self.cancelled {
            return false;
        }
        self.cancelled = true;
        if let Some(token) = self.pending.take() {
            host.cancel_frame(token);
        }
        tracing::debug!(frames = self.frame, "clock cancelled");
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn events(&mut self) -> &mut EventHub<C, Tick> {
        &mut self.events
    }
}

impl<C> std::fmt::Debug for Clock<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("frame", &self.frame)
            .field("elapsed", &self.elapsed)
            .field("delta", &self.delta)
            .field("pending", &self.pending)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}

/// Rolling window over the most recent frame deltas.
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: VecDeque<Duration>,
    capacity: usize,
    sum: Duration,
}

impl FrameStats {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            sum: Duration::ZERO,
        }
    }

    pub fn record(&mut self, delta: Duration) {
        if self.window.len() == self.capacity {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
            }
        }
        self.window.push_back(delta);
        self.sum += delta;
    }

    pub fn count(&self) -> usize {
        self.window.len()
    }

    pub fn average(&self) -> Duration {
        match self.window.len() {
            0 => Duration::ZERO,
            n => self.sum / n as u32,
        }
    }

    pub fn min(&self) -> Duration {
        self.window.iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn max(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Frames per second implied by the average delta.
    pub fn fps(&self) -> f64 {
        let avg = self.average().as_secs_f64();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ManualHost;
    use experience_common::Size;

    fn host() -> ManualHost {
        ManualHost::new(Size::new(800, 600))
    }

    #[test]
    fn construction_requests_but_does_not_tick() {
        let mut host = host();
        let clock: Clock<Vec<Tick>> = Clock::new(&mut host);

        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.delta(), NOMINAL_FRAME);
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert_eq!(host.pending_frames().len(), 1);
        assert_eq!(clock.pending(), host.pending_frames().first().copied());
    }

    #[test]
    fn first_delta_never_from_identical_timestamps() {
        let mut host = host();
        let mut clock: Clock<()> = Clock::new(&mut host);
        // Host time has not advanced between construction and the first frame.
        let token = host.next_frame().unwrap();
        let tick = clock.on_frame(token, &mut (), &mut host).unwrap();
        assert_eq!(tick.delta, NOMINAL_FRAME);
        assert_eq!(tick.elapsed, Duration::ZERO);
    }

    #[test]
    fn tick_measures_delta_and_elapsed() {
        let mut host = host();
        host.advance(Duration::from_secs(5));
        let mut clock: Clock<Vec<Tick>> = Clock::new(&mut host);
        clock.events().on(TICK, |log: &mut Vec<Tick>, t: &Tick| log.push(*t));
        let mut log = Vec::new();

        for ms in [10, 20, 30] {
            host.advance(Duration::from_millis(ms));
            let token = host.next_frame().unwrap();
            clock.on_frame(token, &mut log, &mut host).unwrap();
        }

        let deltas: Vec<u128> = log.iter().map(|t| t.delta.as_millis()).collect();
        assert_eq!(deltas, vec![10, 20, 30]);
        assert_eq!(log[2].elapsed, Duration::from_millis(60));
        assert_eq!(log[2].frame, 3);
        assert_eq!(clock.start(), Duration::from_secs(5));
    }

    #[test]
    fn elapsed_is_monotonic() {
        let mut host = host();
        let mut clock: Clock<()> = Clock::new(&mut host);
        let mut last = Duration::ZERO;
        for step in [16, 0, 17, 0, 0, 33] {
            host.advance(Duration::from_millis(step));
            let token = host.next_frame().unwrap();
            let tick = clock.on_frame(token, &mut (), &mut host).unwrap();
            assert!(tick.elapsed >= last);
            assert!(!tick.delta.is_zero());
            last = tick.elapsed;
        }
    }

    #[test]
    fn each_tick_requests_exactly_one_frame() {
        let mut host = host();
        let mut clock: Clock<()> = Clock::new(&mut host);
        for _ in 0..4 {
            host.advance(NOMINAL_FRAME);
            let token = host.next_frame().unwrap();
            clock.on_frame(token, &mut (), &mut host);
            assert_eq!(host.pending_frames().len(), 1);
        }
    }

    #[test]
    fn stale_token_is_ignored() {
        let mut host = host();
        let mut clock: Clock<u32> = Clock::new(&mut host);
        clock.events().on(TICK, |n: &mut u32, _: &Tick| *n += 1);
        let mut count = 0;

        let first = host.next_frame().unwrap();
        clock.on_frame(first, &mut count, &mut host).unwrap();
        assert!(clock.on_frame(first, &mut count, &mut host).is_none());
        assert_eq!(count, 1);
    }

    #[test]
    fn cancel_revokes_pending_frame_and_stops_ticking() {
        let mut host = host();
        let mut clock: Clock<u32> = Clock::new(&mut host);
        clock.events().on(TICK, |n: &mut u32, _: &Tick| *n += 1);
        let token = clock.pending().unwrap();

        assert!(clock.cancel(&mut host));
        assert!(!clock.cancel(&mut host));
        assert!(host.pending_frames().is_empty());
        assert_eq!(host.cancelled_frames(), 1);

        let mut count = 0;
        assert!(clock.on_frame(token, &mut count, &mut host).is_none());
        assert_eq!(count, 0);
        assert!(host.pending_frames().is_empty());
    }

    #[test]
    fn frame_stats_window() {
        let mut stats = FrameStats::new(2);
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));
        stats.record(Duration::from_millis(30));

        assert_eq!(stats.count(), 2);
        assert_eq!(stats.average(), Duration::from_millis(25));
        assert_eq!(stats.min(), Duration::from_millis(20));
        assert_eq!(stats.max(), Duration::from_millis(30));
        assert!((stats.fps() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn empty_stats() {
        let stats = FrameStats::new(0);
        assert_eq!(stats.average(), Duration::ZERO);
        assert_eq!(stats.fps(), 0.0);
    }
}
