// scroll_core: Rust/WASM engine for scroll-driven panel choreography
// Vertical scroll through a pinned section drives a horizontal panel track. The
// engine owns progress, active panel, URL fragment, and deep-link state; JS only
// measures the page, feeds ticks, and applies the frames and commands it gets back.

mod cards;
mod choreographer;
mod deep_link;
mod error;
mod events;
mod hash_sync;
mod nav_indicator;
mod panels;
mod progress;
mod session;
mod types;

use std::collections::HashMap;

use wasm_bindgen::prelude::*;

pub use cards::{load_cards, parse_blog_feed, placeholder_blog_cards, resolve_feed, Card, FeedKind};
pub use choreographer::PanelChoreographer;
pub use deep_link::{DeepLinkPolicy, DeepLinkResolver, DeepLinkStep};
pub use error::ScrollError;
pub use events::{Publisher, Subscription};
pub use hash_sync::{parse_fragment, BrowserHistory, HashSync, HistoryHost};
pub use nav_indicator::{IndicatorFrame, NavIndicator};
pub use panels::PanelIndex;
pub use progress::ProgressSource;
pub use session::ScrollSession;
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

enum Listener {
    Active(Subscription<ActivePanelEvent>),
    Progress(Subscription<ProgressEvent>),
}

impl Listener {
    fn detach(self) -> bool {
        match self {
            Listener::Active(sub) => sub.unsubscribe(),
            Listener::Progress(sub) => sub.unsubscribe(),
        }
    }
}

/// Scroller interface exposed to JavaScript.
/// Inputs and outputs cross the boundary as JSON strings.
#[wasm_bindgen]
pub struct Scroller {
    session: ScrollSession,
    listeners: HashMap<u32, Listener>,
    next_listener: u32,
}

impl Scroller {
    /// Build against any history host. The JS constructor uses the page's history.
    pub fn with_history(
        config: ScrollConfig,
        env: &HostEnvironment,
        fragment: &str,
        history: Box<dyn HistoryHost>,
    ) -> Result<Scroller, ScrollError> {
        Ok(Scroller {
            session: ScrollSession::new(config, env, fragment, history)?,
            listeners: HashMap::new(),
            next_listener: 1,
        })
    }

    pub fn session(&self) -> &ScrollSession {
        &self.session
    }

    fn add_listener(&mut self, listener: Listener) -> u32 {
        let id = self.next_listener;
        self.next_listener = self.next_listener.wrapping_add(1).max(1);
        self.listeners.insert(id, listener);
        id
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn to_js_error(e: ScrollError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Forward an event to a JS callback as a JSON string.
fn forward<E: serde::Serialize>(callback: &js_sys::Function, event: &E) {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!(error = %e, "Event serialization failed");
            return;
        }
    };
    if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
        tracing::warn!(error = ?err, "Event listener threw");
    }
}

#[wasm_bindgen]
impl Scroller {
    /// Create a scroller for this page load.
    ///
    /// # Arguments
    /// * `config_json` - `ScrollConfig`; `{}` takes every default
    /// * `env_json` - `HostEnvironment`: viewport, section top, capability flags
    /// * `fragment` - `location.hash` at load time
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str, env_json: &str, fragment: &str) -> Result<Scroller, JsValue> {
        let config = ScrollConfig::from_json(config_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?;
        let env: HostEnvironment = serde_json::from_str(env_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid environment: {}", e)))?;

        Scroller::with_history(config, &env, fragment, Box::new(BrowserHistory)).map_err(to_js_error)
    }

    /// The animation engine is up and the layout was measured with the track
    /// transform cleared. Returns a `ScrollCommand` for a pending deep link.
    pub fn activate(&mut self, layout_json: &str) -> Result<Option<String>, JsValue> {
        let layout: LayoutMeasurement = serde_json::from_str(layout_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid layout: {}", e)))?;
        self.session.activate(layout).map(|cmd| to_json(&cmd)).transpose()
    }

    /// Per-frame progress from the animation engine. Returns the `FrameState`.
    pub fn on_tick(&mut self, progress: f64) -> Result<String, JsValue> {
        to_json(&self.session.on_tick(progress))
    }

    /// Per-frame native scroll offset, for hosts that drive from `scrollY`.
    pub fn on_scroll(&mut self, scroll_y: f64) -> Result<String, JsValue> {
        to_json(&self.session.on_scroll(scroll_y))
    }

    /// Viewport resize. Takes a fresh `HostEnvironment` and `LayoutMeasurement`.
    pub fn resize(&mut self, env_json: &str, layout_json: &str) -> Result<String, JsValue> {
        let env: HostEnvironment = serde_json::from_str(env_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid environment: {}", e)))?;
        let layout: LayoutMeasurement = serde_json::from_str(layout_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid layout: {}", e)))?;
        to_json(&self.session.resize(env.viewport, env.section_top, layout))
    }

    pub fn seek_to_panel(&self, panel_id: &str, animate: bool) -> Result<String, JsValue> {
        let cmd = self.session.seek_to_panel(panel_id, animate).map_err(to_js_error)?;
        to_json(&cmd)
    }

    /// Nav click. Pushes a history entry and returns the smooth scroll to perform.
    pub fn navigate(&mut self, panel_id: &str) -> Result<String, JsValue> {
        let cmd = self.session.navigate(panel_id).map_err(to_js_error)?;
        to_json(&cmd)
    }

    pub fn on_pop_state(&mut self, fragment: &str) -> Result<String, JsValue> {
        to_json(&self.session.on_pop_state(fragment))
    }

    /// One deep-link retry. Returns a `DeepLinkStep`.
    pub fn poll_deep_link(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.poll_deep_link())
    }

    /// Listen for active-panel changes. Returns an id for `unsubscribe`.
    pub fn on_active_panel(&mut self, callback: js_sys::Function) -> u32 {
        let sub = self
            .session
            .choreographer()
            .subscribe_active(move |event| forward(&callback, event));
        self.add_listener(Listener::Active(sub))
    }

    /// Listen for per-frame progress. Returns an id for `unsubscribe`.
    pub fn on_progress(&mut self, callback: js_sys::Function) -> u32 {
        let sub = self
            .session
            .choreographer()
            .subscribe_progress(move |event| forward(&callback, event));
        self.add_listener(Listener::Progress(sub))
    }

    pub fn unsubscribe(&mut self, listener_id: u32) -> bool {
        self.listeners
            .remove(&listener_id)
            .map(Listener::detach)
            .unwrap_or(false)
    }

    pub fn section_height(&self) -> f64 {
        self.session.section_height()
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Current `DisplayMode` as JSON.
    pub fn mode(&self) -> Result<String, JsValue> {
        to_json(&self.session.mode())
    }

    pub fn state(&self) -> Result<String, JsValue> {
        to_json(&self.session.state())
    }

    /// Current `IndicatorFrame` for the nav indicator.
    pub fn nav_frame(&self) -> Result<String, JsValue> {
        to_json(&self.session.nav_frame())
    }

    /// Page teardown. Detaches every listener, internal and JS.
    pub fn teardown(&mut self) {
        for (_, listener) in self.listeners.drain() {
            listener.detach();
        }
        self.session.teardown();
    }
}
