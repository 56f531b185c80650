// URL fragment sync. Mirrors the active panel into `#<panel id>` with history
// replacement, so reloads and shared links land on the same panel. Native fragment
// navigation is never used; it would scroll the page on its own.

use wasm_bindgen::prelude::*;

use crate::error::ScrollError;
use crate::panels::PanelIndex;
use crate::progress::ProgressSource;
use crate::types::ScrollCommand;

/// Where fragment writes go. The browser implementation is [`BrowserHistory`].
pub trait HistoryHost {
    /// Replace the current history entry's fragment without navigating.
    fn replace_fragment(&mut self, fragment: &str);
    /// Push a new history entry with `fragment`.
    fn push_fragment(&mut self, fragment: &str);
}

// Direct global bindings; a fragment-only URL keeps the current path and query.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = history, js_name = "replaceState")]
    fn history_replace_state(state: &JsValue, unused: &str, url: &str);

    #[wasm_bindgen(js_namespace = history, js_name = "pushState")]
    fn history_push_state(state: &JsValue, unused: &str, url: &str);
}

/// `window.history` of the current page.
pub struct BrowserHistory;

impl HistoryHost for BrowserHistory {
    fn replace_fragment(&mut self, fragment: &str) {
        history_replace_state(&JsValue::NULL, "", &format!("#{}", fragment));
    }

    fn push_fragment(&mut self, fragment: &str) {
        history_push_state(&JsValue::NULL, "", &format!("#{}", fragment));
    }
}

/// Strip the leading `#`. Empty fragments are `None`.
pub fn parse_fragment(raw: &str) -> Option<&str> {
    let fragment = raw.strip_prefix('#').unwrap_or(raw).trim();
    if fragment.is_empty() {
        None
    } else {
        Some(fragment)
    }
}

pub struct HashSync {
    host: Box<dyn HistoryHost>,
    current: Option<String>,
}

impl HashSync {
    pub fn new(host: Box<dyn HistoryHost>) -> Self {
        HashSync {
            host,
            current: None,
        }
    }

    /// Fragment last written or observed.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Replace the fragment with `panel_id` if it differs. Returns true on write.
    pub fn update(&mut self, panel_id: &str) -> bool {
        if self.current.as_deref() == Some(panel_id) {
            return false;
        }
        self.host.replace_fragment(panel_id);
        self.current = Some(panel_id.to_string());
        true
    }

    /// Nav click: push a history entry for `panel_id`, then scroll there smoothly.
    pub fn navigate(
        &mut self,
        panel_id: &str,
        panels: &PanelIndex,
        source: &ProgressSource,
    ) -> Result<ScrollCommand, ScrollError> {
        let ordinal = panels
            .ordinal_of(panel_id)
            .ok_or_else(|| ScrollError::UnknownPanel(panel_id.to_string()))?;
        let panel = panels
            .get(ordinal)
            .ok_or_else(|| ScrollError::UnknownPanel(panel_id.to_string()))?;

        self.host.push_fragment(panel_id);
        self.current = Some(panel_id.to_string());
        tracing::debug!(panel = panel_id, ordinal, "Navigate");

        Ok(source.seek_panel(panel, panels.progress_for(ordinal), true))
    }

    /// Back/forward: the browser already changed the URL, so only scroll.
    /// Empty or unknown fragments go to the first panel.
    pub fn on_pop_state(
        &mut self,
        raw_fragment: &str,
        panels: &PanelIndex,
        source: &ProgressSource,
    ) -> ScrollCommand {
        let known = parse_fragment(raw_fragment).and_then(|id| panels.ordinal_of(id));
        let ordinal = known.unwrap_or(0);
        let panel = panels.get(ordinal).unwrap_or_else(|| panels.first());

        self.current = known.map(|_| panel.id.clone());
        tracing::debug!(panel = %panel.id, "Pop state");

        source.seek_panel(panel, panels.progress_for(ordinal), true)
    }
}
