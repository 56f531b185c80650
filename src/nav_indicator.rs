// Gooey navigation indicator. A lead blob stretches toward the next dot while a
// follower lags behind; the label names the dot nearest to the pair.
// Follows choreographer progress events; never feeds back into scroll state.

use serde::{Deserialize, Serialize};

use crate::panels::PanelIndex;
use crate::types::{NavLayout, Progress, ProgressEvent};

/// Blob geometry for one frame, in SVG user units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub lead_x: f64,
    pub lead_width: f64,
    pub follower_x: f64,
    pub follower_width: f64,
    /// Resting blob size; also the blob height.
    pub rest_size: f64,
    pub label: String,
    pub label_x: f64,
    /// Index of the dot nearest to the current progress.
    pub current: usize,
}

pub struct NavIndicator {
    layout: NavLayout,
    ids: Vec<String>,
    frame: IndicatorFrame,
}

impl NavIndicator {
    pub fn new(panels: &PanelIndex, layout: NavLayout) -> Self {
        let ids: Vec<String> = panels.iter().map(|p| p.id.clone()).collect();
        let mut indicator = NavIndicator {
            layout,
            ids,
            frame: IndicatorFrame {
                lead_x: 0.0,
                lead_width: 0.0,
                follower_x: 0.0,
                follower_width: 0.0,
                rest_size: 0.0,
                label: String::new(),
                label_x: 0.0,
                current: 0,
            },
        };
        indicator.frame = indicator.rest_at(0);
        indicator
    }

    pub fn frame(&self) -> &IndicatorFrame {
        &self.frame
    }

    pub fn dot_x(&self, index: usize) -> f64 {
        self.layout.start_x + index as f64 * self.layout.gap
    }

    fn rest_size(&self) -> f64 {
        self.layout.dot_size + self.layout.active_pad
    }

    fn span(&self) -> usize {
        self.ids.len().saturating_sub(1)
    }

    /// Both blobs resting on dot `index`.
    fn rest_at(&self, index: usize) -> IndicatorFrame {
        let index = index.min(self.span());
        let x = self.dot_x(index);
        let size = self.rest_size();
        IndicatorFrame {
            lead_x: x,
            lead_width: size,
            follower_x: x,
            follower_width: size,
            rest_size: size,
            label: self.ids.get(index).cloned().unwrap_or_default(),
            label_x: x,
            current: index,
        }
    }

    /// Continuous sync from scroll progress.
    pub fn sync_progress(&mut self, progress: Progress) -> &IndicatorFrame {
        let span = self.span();
        let pos = progress.value() * span as f64;
        let i = pos.floor() as usize;
        let frac = (pos - i as f64).clamp(0.0, 1.0);

        let from_x = self.dot_x(i.min(span));
        let to_x = self.dot_x((i + 1).min(span));
        let rest = self.rest_size();
        let max_stretch = self.layout.max_stretch.min(16.0 + (to_x - from_x).abs() * 0.35);

        let lead_x = lerp(from_x, to_x, frac);
        let lead_width = lerp(rest, max_stretch, (frac * std::f64::consts::PI).sin());
        let follower_x = lerp(from_x, to_x, (frac - 0.25).max(0.0));

        let (label_index, label_x) = self.nearest_dot((lead_x + follower_x) / 2.0);
        self.frame = IndicatorFrame {
            lead_x,
            lead_width,
            follower_x,
            follower_width: rest,
            rest_size: rest,
            label: self.ids.get(label_index).cloned().unwrap_or_default(),
            label_x,
            current: (pos.round() as usize).min(span),
        };
        &self.frame
    }

    /// Discrete sync: snap both blobs onto the active dot.
    pub fn snap_to(&mut self, index: usize) -> &IndicatorFrame {
        self.frame = self.rest_at(index);
        &self.frame
    }

    pub fn on_progress(&mut self, event: &ProgressEvent) {
        self.sync_progress(event.progress);
    }

    fn nearest_dot(&self, x: f64) -> (usize, f64) {
        let mut best = (0, self.dot_x(0));
        for index in 1..self.ids.len() {
            let dot = self.dot_x(index);
            if (x - dot).abs() < (x - best.1).abs() {
                best = (index, dot);
            }
        }
        best
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
