// Progress source: turns scroll position (or engine ticks) into normalized progress,
// and progress back into document scroll offsets for programmatic seeks.
// Degrades to native scrolling instead of failing.

use crate::error::ScrollError;
use crate::types::*;

/// Owns the pinned-region geometry and the current display mode.
#[derive(Debug, Clone)]
pub struct ProgressSource {
    panel_count: usize,
    mobile_breakpoint_px: f64,
    header_offset_px: f64,
    reduced_motion: bool,
    engine_available: bool,
    viewport: Viewport,
    section_top: f64,
    progress: Progress,
    mode: DisplayMode,
}

impl ProgressSource {
    pub fn new(panel_count: usize, config: &ScrollConfig, env: &HostEnvironment) -> Self {
        let viewport = Viewport::new(env.viewport.width, env.viewport.height);
        let mut source = ProgressSource {
            panel_count: panel_count.max(1),
            mobile_breakpoint_px: config.mobile_breakpoint_px,
            header_offset_px: config.header_offset_px,
            reduced_motion: env.reduced_motion,
            engine_available: env.engine_available,
            viewport,
            section_top: sanitize_offset(env.section_top),
            progress: Progress::START,
            mode: DisplayMode::Pinned,
        };
        source.mode = source.decide_mode();

        match source.mode {
            DisplayMode::Native(NativeReason::EngineUnavailable) => {
                let err = ScrollError::InitializationUnavailable(
                    "pinned-scroll engine or anchors missing".to_string(),
                );
                tracing::warn!(error = %err, "Staying in native scroll mode");
            }
            DisplayMode::Native(reason) => {
                tracing::info!(?reason, width = viewport.width, "Using native scroll mode");
            }
            DisplayMode::Pinned => {
                tracing::info!(panels = panel_count, width = viewport.width, "Using pinned scroll mode");
            }
        }

        source
    }

    fn decide_mode(&self) -> DisplayMode {
        if !self.engine_available {
            DisplayMode::Native(NativeReason::EngineUnavailable)
        } else if self.reduced_motion {
            DisplayMode::Native(NativeReason::ReducedMotion)
        } else if self.viewport.width <= self.mobile_breakpoint_px {
            DisplayMode::Native(NativeReason::NarrowViewport)
        } else {
            DisplayMode::Pinned
        }
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn section_top(&self) -> f64 {
        self.section_top
    }

    /// Scroll distance consumed by the pinned region: `(n - 1) * viewport height`.
    pub fn scrollable_range(&self) -> f64 {
        (self.panel_count - 1) as f64 * self.viewport.height
    }

    /// Height the pinned section needs so every panel can be scrolled through.
    pub fn section_height(&self) -> f64 {
        self.viewport.height + self.scrollable_range()
    }

    /// Accept a progress value from the animation engine. Returns `None` in
    /// native mode, where progress tracking is skipped.
    pub fn on_tick(&mut self, raw: f64) -> Option<Progress> {
        if self.mode.is_native() {
            return None;
        }
        self.progress = Progress::new(raw);
        Some(self.progress)
    }

    /// Progress for a document scroll offset, for hosts that drive the
    /// choreography from native scroll events instead of the engine.
    pub fn progress_from_scroll(&self, scroll_y: f64) -> Progress {
        let range = self.scrollable_range();
        if range <= 0.0 {
            return Progress::START;
        }
        Progress::new((scroll_y - self.section_top) / range)
    }

    /// Document offset that corresponds to `target`.
    pub fn scroll_offset_for(&self, target: Progress) -> f64 {
        self.section_top + target.value() * self.scrollable_range()
    }

    /// Programmatic scroll to `target` progress. Reduced motion always jumps.
    pub fn seek(&self, target: Progress, animate: bool) -> ScrollCommand {
        let top = self.scroll_offset_for(target);
        tracing::debug!(target = target.value(), top, animate, "Seek");
        ScrollCommand::Seek {
            top,
            behavior: self.behavior(animate),
        }
    }

    /// Seek to a panel. In native mode panels are stacked vertically, so the
    /// host scrolls the element into view instead.
    pub fn seek_panel(&self, panel: &Panel, target: Progress, animate: bool) -> ScrollCommand {
        match self.mode {
            DisplayMode::Pinned => self.seek(target, animate),
            DisplayMode::Native(_) => self.scroll_into_view(&panel.id, animate),
        }
    }

    pub fn scroll_into_view(&self, panel_id: &str, animate: bool) -> ScrollCommand {
        ScrollCommand::ScrollIntoView {
            panel_id: panel_id.to_string(),
            header_offset_px: self.header_offset_px,
            behavior: self.behavior(animate),
        }
    }

    fn behavior(&self, animate: bool) -> ScrollBehavior {
        if animate && !self.reduced_motion {
            ScrollBehavior::Smooth
        } else {
            ScrollBehavior::Instant
        }
    }

    /// Refresh cached geometry. Returns true if the display mode changed.
    pub fn resize(&mut self, viewport: Viewport, section_top: f64) -> bool {
        self.viewport = Viewport::new(viewport.width, viewport.height);
        self.section_top = sanitize_offset(section_top);

        let previous = self.mode;
        self.mode = self.decide_mode();
        if previous != self.mode {
            tracing::info!(from = ?previous, to = ?self.mode, width = self.viewport.width, "Display mode changed");
            true
        } else {
            false
        }
    }
}

fn sanitize_offset(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(width: f64, height: f64) -> HostEnvironment {
        HostEnvironment {
            viewport: Viewport::new(width, height),
            section_top: 200.0,
            reduced_motion: false,
            engine_available: true,
        }
    }

    #[test]
    fn pinned_on_wide_viewport() {
        let source = ProgressSource::new(5, &ScrollConfig::default(), &env(1200.0, 800.0));
        assert_eq!(source.mode(), DisplayMode::Pinned);
        assert_eq!(source.scrollable_range(), 3200.0);
        assert_eq!(source.section_height(), 4000.0);
    }

    #[test]
    fn native_modes() {
        let config = ScrollConfig::default();
        let narrow = ProgressSource::new(5, &config, &env(768.0, 800.0));
        assert_eq!(narrow.mode(), DisplayMode::Native(NativeReason::NarrowViewport));

        let mut reduced_env = env(1200.0, 800.0);
        reduced_env.reduced_motion = true;
        let reduced = ProgressSource::new(5, &config, &reduced_env);
        assert_eq!(reduced.mode(), DisplayMode::Native(NativeReason::ReducedMotion));

        let mut missing_env = env(1200.0, 800.0);
        missing_env.engine_available = false;
        let missing = ProgressSource::new(5, &config, &missing_env);
        assert_eq!(missing.mode(), DisplayMode::Native(NativeReason::EngineUnavailable));
    }

    #[test]
    fn on_tick_clamps_and_skips_native() {
        let config = ScrollConfig::default();
        let mut pinned = ProgressSource::new(5, &config, &env(1200.0, 800.0));
        assert_eq!(pinned.on_tick(1.4), Some(Progress::END));
        assert_eq!(pinned.on_tick(-3.0), Some(Progress::START));
        assert_eq!(pinned.on_tick(f64::NAN), Some(Progress::START));

        let mut native = ProgressSource::new(5, &config, &env(500.0, 800.0));
        assert_eq!(native.on_tick(0.5), None);
        assert_eq!(native.progress(), Progress::START);
    }

    #[test]
    fn seek_computes_offset() {
        let source = ProgressSource::new(5, &ScrollConfig::default(), &env(1200.0, 800.0));
        assert_eq!(
            source.seek(Progress::new(0.5), true),
            ScrollCommand::Seek {
                top: 200.0 + 0.5 * 3200.0,
                behavior: ScrollBehavior::Smooth,
            }
        );
        assert_eq!(
            source.seek(Progress::END, false),
            ScrollCommand::Seek {
                top: 3400.0,
                behavior: ScrollBehavior::Instant,
            }
        );
    }

    #[test]
    fn reduced_motion_never_animates() {
        let mut e = env(1200.0, 800.0);
        e.reduced_motion = true;
        let source = ProgressSource::new(5, &ScrollConfig::default(), &e);
        assert_eq!(
            source.scroll_into_view("blog", true),
            ScrollCommand::ScrollIntoView {
                panel_id: "blog".to_string(),
                header_offset_px: 80.0,
                behavior: ScrollBehavior::Instant,
            }
        );
    }

    #[test]
    fn progress_from_scroll_inverts_seek() {
        let source = ProgressSource::new(5, &ScrollConfig::default(), &env(1200.0, 800.0));
        let top = source.scroll_offset_for(Progress::new(0.75));
        assert_eq!(source.progress_from_scroll(top), Progress::new(0.75));
        assert_eq!(source.progress_from_scroll(0.0), Progress::START);
        assert_eq!(source.progress_from_scroll(1e9), Progress::END);
    }

    #[test]
    fn lone_panel_has_no_range() {
        let source = ProgressSource::new(1, &ScrollConfig::default(), &env(1200.0, 800.0));
        assert_eq!(source.scrollable_range(), 0.0);
        assert_eq!(source.progress_from_scroll(5000.0), Progress::START);
    }

    #[test]
    fn resize_crosses_breakpoint() {
        let mut source = ProgressSource::new(5, &ScrollConfig::default(), &env(1200.0, 800.0));
        assert!(source.resize(Viewport::new(600.0, 800.0), 200.0));
        assert_eq!(source.mode(), DisplayMode::Native(NativeReason::NarrowViewport));
        assert!(!source.resize(Viewport::new(700.0, 900.0), 200.0));
        assert!(source.resize(Viewport::new(1024.0, 900.0), 150.0));
        assert_eq!(source.mode(), DisplayMode::Pinned);
        assert_eq!(source.section_top(), 150.0);
        assert_eq!(source.scrollable_range(), 3600.0);
    }

    #[test]
    fn reduced_motion_is_sticky_across_resize() {
        let mut e = env(1200.0, 800.0);
        e.reduced_motion = true;
        let mut source = ProgressSource::new(5, &ScrollConfig::default(), &e);
        assert!(!source.resize(Viewport::new(1600.0, 900.0), 0.0));
        assert_eq!(source.mode(), DisplayMode::Native(NativeReason::ReducedMotion));
    }
}
