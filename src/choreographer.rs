// Panel choreography: maps one progress value to track offset, per-panel entrance
// animation, path reveal, and hero offset. Every frame is recomputed from a single
// progress snapshot, so recomputing with the same inputs yields the same frame.

use crate::events::{Publisher, Subscription};
use crate::panels::PanelIndex;
use crate::types::*;

/// Owns the scroll state and broadcasts active-panel and progress events.
pub struct PanelChoreographer {
    panels: PanelIndex,
    state: ScrollState,
    viewport: Viewport,
    layout: LayoutMeasurement,
    /// `-natural_track_x`, so panel 0 sits at x = 0 before any scroll.
    correction_x: f64,
    hero_start_y: f64,
    hero_target_y: f64,
    entrance_offset_px: f64,
    window_lead: f64,
    window_tail: f64,
    ready: bool,
    last_active: Option<usize>,
    active_events: Publisher<ActivePanelEvent>,
    progress_events: Publisher<ProgressEvent>,
}

impl PanelChoreographer {
    pub fn new(panels: PanelIndex, config: &ScrollConfig) -> Self {
        PanelChoreographer {
            panels,
            state: ScrollState::default(),
            viewport: Viewport::default(),
            layout: LayoutMeasurement::default(),
            correction_x: 0.0,
            hero_start_y: 0.0,
            hero_target_y: config.hero_target_top_px,
            entrance_offset_px: config.entrance_offset_px,
            window_lead: config.window_lead,
            window_tail: config.window_tail,
            ready: false,
            last_active: None,
            active_events: Publisher::new(),
            progress_events: Publisher::new(),
        }
    }

    pub fn panels(&self) -> &PanelIndex {
        &self.panels
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn correction_x(&self) -> f64 {
        self.correction_x
    }

    /// True once the layout has been measured and pinned scrolling is live.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Measure the layout and go live. Called once the animation engine has started.
    pub fn activate(&mut self, viewport: Viewport, layout: LayoutMeasurement) {
        self.refresh(viewport, layout);
        if !self.ready {
            self.ready = true;
            tracing::info!(
                panels = self.panels.len(),
                correction_x = self.correction_x,
                "Choreographer ready"
            );
        }
    }

    /// Re-measure after a resize or layout refresh. The correction offset is
    /// never assumed to be zero.
    pub fn refresh(&mut self, viewport: Viewport, layout: LayoutMeasurement) {
        self.viewport = Viewport::new(viewport.width, viewport.height);
        let natural_x = if layout.natural_track_x.is_finite() {
            layout.natural_track_x
        } else {
            0.0
        };
        self.layout = LayoutMeasurement {
            natural_track_x: natural_x,
            hero_height: layout.hero_height.filter(|h| h.is_finite()),
        };
        self.correction_x = -natural_x;
        self.hero_start_y = match self.layout.hero_height {
            Some(height) => ((self.viewport.height - height) / 2.0).max(0.0),
            None => 0.0,
        };
        tracing::debug!(
            width = self.viewport.width,
            height = self.viewport.height,
            correction_x = self.correction_x,
            "Layout refreshed"
        );
    }

    /// Derive the frame for `progress` without touching state.
    pub fn compute(&self, progress: Progress, mode: DisplayMode) -> FrameState {
        if mode.is_native() {
            return self.passthrough(progress, mode);
        }

        let span = self.panels.span();
        // A lone panel is always fully active at progress 0.
        let p = if span == 0 { 0.0 } else { progress.value() };
        let active = self.panels.active_ordinal(Progress::new(p));

        let scroll_x = -(p * span as f64 * self.viewport.width);
        let track_x = self.correction_x + scroll_x;

        let panels = (0..self.panels.len())
            .map(|ordinal| self.panel_state(ordinal, p))
            .collect();

        let hero_offset_y = self.layout.hero_height.map(|_| {
            let phase = (p * span as f64).clamp(0.0, 1.0);
            let eased = ease_out_quad(phase);
            self.hero_start_y + (self.hero_target_y - self.hero_start_y) * eased
        });

        FrameState {
            mode,
            progress: Progress::new(p),
            active_panel: active,
            active_panel_id: self.panels.clamped_id(active).to_string(),
            track_x,
            reveal: p,
            path_dash_offset: 1.0 - p,
            hero_offset_y,
            panels,
        }
    }

    /// Native scrolling: no transform, full path, every panel visible.
    fn passthrough(&self, progress: Progress, mode: DisplayMode) -> FrameState {
        let active = self.panels.active_ordinal(progress);
        FrameState {
            mode,
            progress,
            active_panel: active,
            active_panel_id: self.panels.clamped_id(active).to_string(),
            track_x: 0.0,
            reveal: 1.0,
            path_dash_offset: 0.0,
            hero_offset_y: None,
            panels: vec![PanelAnimationState::visible(); self.panels.len()],
        }
    }

    fn panel_state(&self, ordinal: usize, p: f64) -> PanelAnimationState {
        // The entry panel never animates away.
        if ordinal == 0 {
            return PanelAnimationState::visible();
        }

        let span = self.panels.span() as f64;
        let i = ordinal as f64;
        let start = ((i - self.window_lead) / span).max(0.0);
        let end = (i + self.window_tail) / span;

        let linear = if p < start {
            0.0
        } else if p > end {
            1.0
        } else if end > start {
            ((p - start) / (end - start)).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let eased = ease_out_quad(linear);
        PanelAnimationState {
            local_progress: eased,
            offset_x: -self.entrance_offset_px * (1.0 - eased),
            opacity: eased,
        }
    }

    /// Apply a progress update: recompute, store, and notify subscribers.
    /// Active-panel events fire only when the active panel changes.
    pub fn update(&mut self, progress: Progress, mode: DisplayMode) -> FrameState {
        let frame = self.compute(progress, mode);
        self.state = ScrollState {
            progress: frame.progress,
            active_panel: frame.active_panel,
        };

        if self.last_active != Some(frame.active_panel) {
            self.last_active = Some(frame.active_panel);
            self.active_events.emit(&ActivePanelEvent {
                index: frame.active_panel,
                id: frame.active_panel_id.clone(),
            });
        }
        self.progress_events.emit(&ProgressEvent {
            progress: frame.progress,
            active_panel: frame.active_panel,
        });

        frame
    }

    /// Screen x of a panel's left edge for a computed frame.
    pub fn panel_screen_x(&self, ordinal: usize, frame: &FrameState) -> f64 {
        self.layout.natural_track_x + ordinal as f64 * self.viewport.width + frame.track_x
    }

    pub fn subscribe_active(
        &self,
        listener: impl FnMut(&ActivePanelEvent) + 'static,
    ) -> Subscription<ActivePanelEvent> {
        self.active_events.subscribe(listener)
    }

    pub fn subscribe_progress(
        &self,
        listener: impl FnMut(&ProgressEvent) + 'static,
    ) -> Subscription<ProgressEvent> {
        self.progress_events.subscribe(listener)
    }
}

/// power2.out
pub(crate) fn ease_out_quad(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}
