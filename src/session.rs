// One page load: wires the progress source, choreographer, hash sync, deep-link
// resolver, and nav indicator together. Hash sync and the nav indicator are plain
// subscribers of the choreographer's events.

use std::cell::RefCell;
use std::rc::Rc;

use crate::choreographer::PanelChoreographer;
use crate::deep_link::{DeepLinkPolicy, DeepLinkResolver, DeepLinkStep};
use crate::error::ScrollError;
use crate::events::Subscription;
use crate::hash_sync::{HashSync, HistoryHost};
use crate::nav_indicator::{IndicatorFrame, NavIndicator};
use crate::panels::PanelIndex;
use crate::progress::ProgressSource;
use crate::types::*;

pub struct ScrollSession {
    config: ScrollConfig,
    source: ProgressSource,
    choreographer: PanelChoreographer,
    hash_sync: Rc<RefCell<HashSync>>,
    nav: Rc<RefCell<NavIndicator>>,
    deep_link: DeepLinkResolver,
    wiring: Vec<Wiring>,
}

enum Wiring {
    Active(Subscription<ActivePanelEvent>),
    Progress(Subscription<ProgressEvent>),
}

impl ScrollSession {
    /// Set up a page load. `fragment` is the URL fragment at load time.
    pub fn new(
        config: ScrollConfig,
        env: &HostEnvironment,
        fragment: &str,
        history: Box<dyn HistoryHost>,
    ) -> Result<Self, ScrollError> {
        config.validate()?;
        let panels = PanelIndex::new(config.panels.iter().cloned())?;

        let source = ProgressSource::new(panels.len(), &config, env);
        let deep_link =
            DeepLinkResolver::from_fragment(fragment, &panels, DeepLinkPolicy::from_config(&config));
        let mut indicator = NavIndicator::new(&panels, config.nav);
        if let Some(ordinal) = deep_link.target().and_then(|id| panels.ordinal_of(id)) {
            indicator.snap_to(ordinal);
        }
        let nav = Rc::new(RefCell::new(indicator));
        let choreographer = PanelChoreographer::new(panels, &config);
        let hash_sync = Rc::new(RefCell::new(HashSync::new(history)));

        let mut wiring = Vec::new();
        let hash = Rc::clone(&hash_sync);
        wiring.push(Wiring::Active(choreographer.subscribe_active(move |event| {
            hash.borrow_mut().update(&event.id);
        })));
        let nav_progress = Rc::clone(&nav);
        wiring.push(Wiring::Progress(choreographer.subscribe_progress(move |event| {
            nav_progress.borrow_mut().on_progress(event);
        })));

        Ok(ScrollSession {
            config,
            source,
            choreographer,
            hash_sync,
            nav,
            deep_link,
            wiring,
        })
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn mode(&self) -> DisplayMode {
        self.source.mode()
    }

    pub fn panels(&self) -> &PanelIndex {
        self.choreographer.panels()
    }

    pub fn state(&self) -> ScrollState {
        self.choreographer.state()
    }

    pub fn source(&self) -> &ProgressSource {
        &self.source
    }

    pub fn choreographer(&self) -> &PanelChoreographer {
        &self.choreographer
    }

    pub fn is_ready(&self) -> bool {
        self.choreographer.is_ready()
    }

    pub fn section_height(&self) -> f64 {
        self.source.section_height()
    }

    pub fn current_fragment(&self) -> Option<String> {
        self.hash_sync.borrow().current().map(str::to_string)
    }

    pub fn nav_frame(&self) -> IndicatorFrame {
        self.nav.borrow().frame().clone()
    }

    /// The animation engine has started and the layout was measured. Returns
    /// the scroll for a pending deep link, if any.
    pub fn activate(&mut self, layout: LayoutMeasurement) -> Option<ScrollCommand> {
        if self.source.mode().is_native() {
            tracing::debug!(mode = ?self.source.mode(), "Activation skipped in native mode");
            return None;
        }
        self.choreographer.activate(self.source.viewport(), layout);
        self.deep_link.on_ready(self.choreographer.panels(), &self.source)
    }

    /// Progress from the animation engine for this frame.
    pub fn on_tick(&mut self, raw_progress: f64) -> FrameState {
        match self.source.on_tick(raw_progress) {
            Some(progress) if self.choreographer.is_ready() => {
                self.choreographer.update(progress, self.source.mode())
            }
            _ => self.idle_frame(),
        }
    }

    /// Native scroll offset for this frame, for hosts without an engine-fed tick.
    pub fn on_scroll(&mut self, scroll_y: f64) -> FrameState {
        let progress = self.source.progress_from_scroll(scroll_y);
        self.on_tick(progress.value())
    }

    /// Frame shown while nothing is tracked: before activation the entry
    /// panel with the path hidden, in native mode the passthrough frame.
    fn idle_frame(&self) -> FrameState {
        self.choreographer.compute(Progress::START, self.source.mode())
    }

    /// Viewport resize or layout refresh. Recomputes geometry and the
    /// correction offset, then repaints at the current progress.
    pub fn resize(
        &mut self,
        viewport: Viewport,
        section_top: f64,
        layout: LayoutMeasurement,
    ) -> FrameState {
        self.source.resize(viewport, section_top);
        if self.source.mode().is_native() {
            return self.idle_frame();
        }
        self.choreographer.activate(self.source.viewport(), layout);
        let progress = self.source.progress();
        self.choreographer.update(progress, self.source.mode())
    }

    /// Programmatic seek to a panel by id.
    pub fn seek_to_panel(&self, panel_id: &str, animate: bool) -> Result<ScrollCommand, ScrollError> {
        let panels = self.choreographer.panels();
        let ordinal = panels
            .ordinal_of(panel_id)
            .ok_or_else(|| ScrollError::UnknownPanel(panel_id.to_string()))?;
        let panel = panels
            .get(ordinal)
            .ok_or_else(|| ScrollError::UnknownPanel(panel_id.to_string()))?;
        Ok(self.source.seek_panel(panel, panels.progress_for(ordinal), animate))
    }

    pub fn navigate(&mut self, panel_id: &str) -> Result<ScrollCommand, ScrollError> {
        let command = self
            .hash_sync
            .borrow_mut()
            .navigate(panel_id, self.choreographer.panels(), &self.source)?;
        self.snap_nav_if_native(&command);
        Ok(command)
    }

    pub fn on_pop_state(&mut self, fragment: &str) -> ScrollCommand {
        let command = self
            .hash_sync
            .borrow_mut()
            .on_pop_state(fragment, self.choreographer.panels(), &self.source);
        self.snap_nav_if_native(&command);
        command
    }

    pub fn poll_deep_link(&mut self) -> DeepLinkStep {
        let ready = self.choreographer.is_ready();
        let step = self
            .deep_link
            .poll(ready, self.choreographer.panels(), &self.source);
        if let DeepLinkStep::Resolved { command } = &step {
            self.snap_nav_if_native(command);
        }
        step
    }

    /// Native mode emits no choreographer events, so the indicator follows
    /// resolved scroll targets directly.
    fn snap_nav_if_native(&self, command: &ScrollCommand) {
        if !self.source.mode().is_native() {
            return;
        }
        if let ScrollCommand::ScrollIntoView { panel_id, .. } = command {
            if let Some(ordinal) = self.choreographer.panels().ordinal_of(panel_id) {
                self.nav.borrow_mut().snap_to(ordinal);
            }
        }
    }

    pub fn deep_link_pending(&self) -> bool {
        self.deep_link.is_pending()
    }

    /// Page teardown: detach the internal subscribers.
    pub fn teardown(&mut self) {
        for wiring in self.wiring.drain(..) {
            match wiring {
                Wiring::Active(sub) => {
                    sub.unsubscribe();
                }
                Wiring::Progress(sub) => {
                    sub.unsubscribe();
                }
            }
        }
        tracing::debug!("Scroll session torn down");
    }
}
