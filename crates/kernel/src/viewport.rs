use experience_common::Size;

use crate::event::EventHub;
use crate::host::HostPlatform;

/// Event fired after the viewport changed size or pixel ratio.
pub const RESIZE: &str = "resize";

/// Snapshot handed to `resize` handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub size: Size,
    pub pixel_ratio: f64,
}

impl ViewportMetrics {
    pub fn aspect(&self) -> f32 {
        self.size.aspect()
    }
}

/// Mirrors the host surface size.
///
/// There is no debouncing: every accepted notification reconfigures the
/// subscribers synchronously, before control returns to the host.
pub struct ViewportState<C> {
    size: Size,
    pixel_ratio: f64,
    max_pixel_ratio: f64,
    events: EventHub<C, ViewportMetrics>,
}

impl<C> ViewportState<C> {
    pub fn new(size: Size, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let max_pixel_ratio = max_pixel_ratio.max(1.0);
        Self {
            size,
            pixel_ratio: clamp_ratio(device_pixel_ratio, max_pixel_ratio),
            max_pixel_ratio,
            events: EventHub::new(),
        }
    }

    pub fn from_host<H: HostPlatform + ?Sized>(host: &H, max_pixel_ratio: f64) -> Self {
        Self::new(host.surface_size(), host.device_pixel_ratio(), max_pixel_ratio)
    }

    /// Apply a size-change notification and fire `resize`.
    ///
    /// Zero-sized notifications (a minimised window) are ignored and return `false`.
    pub fn resize(&mut self, width: u32, height: u32, ctx: &mut C) -> bool {
        let size = Size::new(width, height);
        if size.is_empty() {
            tracing::debug!(%size, "ignoring empty viewport size");
            return false;
        }
        self.size = size;
        tracing::debug!(%size, pixel_ratio = self.pixel_ratio, "viewport resized");
        let metrics = self.metrics();
        self.events.trigger(RESIZE, ctx, &metrics);
        true
    }

    /// Update the device pixel ratio (e.g. the window moved to another monitor).
    pub fn set_device_pixel_ratio(&mut self, ratio: f64, ctx: &mut C) -> bool {
        let clamped = clamp_ratio(ratio, self.max_pixel_ratio);
        if clamped == self.pixel_ratio {
            return false;
        }
        self.pixel_ratio = clamped;
        let metrics = self.metrics();
        self.events.trigger(RESIZE, ctx, &metrics);
        true
    }

    pub fn metrics(&self) -> ViewportMetrics {
        ViewportMetrics {
            size: self.size,
            pixel_ratio: self.pixel_ratio,
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn aspect(&self) -> f32 {
        self.size.aspect()
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    pub fn events(&mut self) -> &mut EventHub<C, ViewportMetrics> {
        &mut self.events
    }
}

impl<C> std::fmt::Debug for ViewportState<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportState")
            .field("size", &self.size)
            .field("pixel_ratio", &self.pixel_ratio)
            .finish()
    }
}

fn clamp_ratio(ratio: f64, max: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(max)
    } else {
        1.0
    }
}
