// Strong typing over raw numbers. Newtypes for progress, value types for viewport
// geometry, per-frame output, and the JSON config passed from JS.

use serde::{Deserialize, Serialize};

use crate::error::ScrollError;

/// Normalized scroll progress through the whole panel sequence, always in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(from = "f64")]
pub struct Progress(f64);

impl Progress {
    pub const START: Progress = Progress(0.0);
    pub const END: Progress = Progress(1.0);

    /// Clamp into [0, 1]. NaN collapses to the start.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Progress::START;
        }
        Progress(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Progress {
    fn from(value: f64) -> Self {
        Progress::new(value)
    }
}

/// Browser viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport {
            width: sanitize_px(width),
            height: sanitize_px(height),
        }
    }
}

/// Negative or non-finite sizes are treated as zero.
pub(crate) fn sanitize_px(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// One horizontally-arranged narrative section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub id: String,
    pub ordinal: usize,
}

/// The single scroll state of a page. Owned by the choreographer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScrollState {
    pub progress: Progress,
    pub active_panel: usize,
}

/// Entrance animation state of one panel for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelAnimationState {
    pub local_progress: f64,
    pub offset_x: f64,
    pub opacity: f64,
}

impl PanelAnimationState {
    pub fn visible() -> Self {
        PanelAnimationState {
            local_progress: 1.0,
            offset_x: 0.0,
            opacity: 1.0,
        }
    }
}

/// Why the page runs without the pinned horizontal scroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NativeReason {
    /// User asked for reduced motion. Sticky for the page lifetime.
    ReducedMotion,
    /// Viewport at or below the mobile breakpoint. Re-evaluated on resize.
    NarrowViewport,
    /// Scroll animation engine or DOM anchors missing. Sticky.
    EngineUnavailable,
}

/// How scroll progress is turned into visuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "reason")]
pub enum DisplayMode {
    /// Pinned stage with a horizontally translated track.
    Pinned,
    /// Native vertical stacking; no transforms, full path visible.
    Native(NativeReason),
}

impl DisplayMode {
    pub fn is_native(&self) -> bool {
        matches!(self, DisplayMode::Native(_))
    }
}

/// Everything a host needs to paint one frame. A pure function of
/// progress, panel count, viewport, and the measured layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameState {
    pub mode: DisplayMode,
    pub progress: Progress,
    pub active_panel: usize,
    pub active_panel_id: String,
    /// Horizontal translation of the panel track in px.
    pub track_x: f64,
    /// Fraction of the decorative path that is drawn.
    pub reveal: f64,
    /// CSS stroke-dashoffset for a path normalized with `pathLength="1"`.
    pub path_dash_offset: f64,
    /// Vertical offset of the hero block, when one was measured.
    pub hero_offset_y: Option<f64>,
    pub panels: Vec<PanelAnimationState>,
}

/// Broadcast whenever the active panel changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePanelEvent {
    pub index: usize,
    pub id: String,
}

/// Broadcast on every progress update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub progress: Progress,
    pub active_panel: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// A scroll the host must perform. Never executed by the engine itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScrollCommand {
    /// Scroll the document to an absolute offset.
    Seek { top: f64, behavior: ScrollBehavior },
    /// Scroll the panel element into view, minus the fixed header height.
    ScrollIntoView {
        panel_id: String,
        header_offset_px: f64,
        behavior: ScrollBehavior,
    },
}

/// Host facts the engine cannot measure itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEnvironment {
    pub viewport: Viewport,
    /// Document offset of the scroller section.
    #[serde(default)]
    pub section_top: f64,
    #[serde(default)]
    pub reduced_motion: bool,
    /// Whether the pinned-scroll animation engine and DOM anchors were found.
    #[serde(default = "default_true")]
    pub engine_available: bool,
}

/// Measured with the track transform cleared. Re-measured after every
/// layout-affecting resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LayoutMeasurement {
    /// Natural x of the track's left edge, relative to the viewport.
    pub natural_track_x: f64,
    /// Height of the hero block, if the page has one.
    #[serde(default)]
    pub hero_height: Option<f64>,
}

/// Engine configuration passed from JS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_panels")]
    pub panels: Vec<String>,
    #[serde(default = "default_mobile_breakpoint")]
    pub mobile_breakpoint_px: f64,
    #[serde(default = "default_header_offset")]
    pub header_offset_px: f64,
    #[serde(default = "default_poll_ms")]
    pub deep_link_poll_ms: u32,
    #[serde(default = "default_budget_ms")]
    pub deep_link_budget_ms: u32,
    /// Panels slide in from `-entrance_offset_px` to 0.
    #[serde(default = "default_entrance_offset")]
    pub entrance_offset_px: f64,
    /// Entrance window of panel i is `[(i - lead)/(n-1), (i + tail)/(n-1)]`.
    #[serde(default = "default_window_lead")]
    pub window_lead: f64,
    #[serde(default = "default_window_tail")]
    pub window_tail: f64,
    #[serde(default = "default_hero_target_top")]
    pub hero_target_top_px: f64,
    #[serde(default)]
    pub nav: NavLayout,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        ScrollConfig {
            panels: default_panels(),
            mobile_breakpoint_px: default_mobile_breakpoint(),
            header_offset_px: default_header_offset(),
            deep_link_poll_ms: default_poll_ms(),
            deep_link_budget_ms: default_budget_ms(),
            entrance_offset_px: default_entrance_offset(),
            window_lead: default_window_lead(),
            window_tail: default_window_tail(),
            hero_target_top_px: default_hero_target_top(),
            nav: NavLayout::default(),
        }
    }
}

impl ScrollConfig {
    pub fn from_json(json: &str) -> Result<Self, ScrollError> {
        let config: ScrollConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Panel ids are checked by `PanelIndex`; this covers the numeric fields.
    pub fn validate(&self) -> Result<(), ScrollError> {
        let numbers = [
            ("mobile_breakpoint_px", self.mobile_breakpoint_px),
            ("header_offset_px", self.header_offset_px),
            ("entrance_offset_px", self.entrance_offset_px),
            ("window_lead", self.window_lead),
            ("window_tail", self.window_tail),
            ("hero_target_top_px", self.hero_target_top_px),
            ("nav.start_x", self.nav.start_x),
            ("nav.gap", self.nav.gap),
            ("nav.dot_size", self.nav.dot_size),
            ("nav.active_pad", self.nav.active_pad),
            ("nav.max_stretch", self.nav.max_stretch),
        ];
        if let Some((name, _)) = numbers.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ScrollError::InvalidConfig(format!("{} must be finite", name)));
        }
        if self.deep_link_poll_ms == 0 {
            return Err(ScrollError::InvalidConfig(
                "deep_link_poll_ms must be positive".to_string(),
            ));
        }
        if self.window_lead + self.window_tail <= 0.0 {
            return Err(ScrollError::InvalidConfig(
                "entrance window must have positive width".to_string(),
            ));
        }
        Ok(())
    }
}

/// Geometry of the gooey navigation dots, in SVG user units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavLayout {
    #[serde(default = "default_nav_start_x")]
    pub start_x: f64,
    #[serde(default = "default_nav_gap")]
    pub gap: f64,
    #[serde(default = "default_nav_dot_size")]
    pub dot_size: f64,
    #[serde(default = "default_nav_active_pad")]
    pub active_pad: f64,
    #[serde(default = "default_nav_max_stretch")]
    pub max_stretch: f64,
}

impl Default for NavLayout {
    fn default() -> Self {
        NavLayout {
            start_x: default_nav_start_x(),
            gap: default_nav_gap(),
            dot_size: default_nav_dot_size(),
            active_pad: default_nav_active_pad(),
            max_stretch: default_nav_max_stretch(),
        }
    }
}

fn default_panels() -> Vec<String> {
    ["home", "about", "projects", "blog", "contact"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_mobile_breakpoint() -> f64 {
    768.0
}

fn default_header_offset() -> f64 {
    80.0
}

fn default_poll_ms() -> u32 {
    100
}

fn default_budget_ms() -> u32 {
    2000
}

fn default_entrance_offset() -> f64 {
    100.0
}

fn default_window_lead() -> f64 {
    0.8
}

fn default_window_tail() -> f64 {
    0.2
}

fn default_hero_target_top() -> f64 {
    140.0
}

fn default_nav_start_x() -> f64 {
    100.0
}

fn default_nav_gap() -> f64 {
    24.0
}

fn default_nav_dot_size() -> f64 {
    12.0
}

fn default_nav_active_pad() -> f64 {
    5.0
}

fn default_nav_max_stretch() -> f64 {
    42.0
}

fn default_true() -> bool {
    true
}
