// Panel id <-> ordinal mapping. Panels are fixed at page-description time.

use crate::error::ScrollError;
use crate::types::{Panel, Progress};

/// Ordered, non-empty set of panels with unique ids and contiguous ordinals.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelIndex {
    panels: Vec<Panel>,
}

impl PanelIndex {
    pub fn new<I, S>(ids: I) -> Result<Self, ScrollError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut panels: Vec<Panel> = Vec::new();
        for (ordinal, id) in ids.into_iter().enumerate() {
            let id = id.into();
            if id.trim().is_empty() {
                return Err(ScrollError::InvalidConfig(format!(
                    "panel {} has an empty id",
                    ordinal
                )));
            }
            if panels.iter().any(|p| p.id == id) {
                return Err(ScrollError::InvalidConfig(format!(
                    "duplicate panel id '{}'",
                    id
                )));
            }
            panels.push(Panel { id, ordinal });
        }

        if panels.is_empty() {
            return Err(ScrollError::InvalidConfig(
                "at least one panel is required".to_string(),
            ));
        }

        Ok(PanelIndex { panels })
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    /// Construction rejects empty id lists, so this is false for any built index.
    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Number of panel-to-panel steps, `len - 1`. Zero for a lone panel.
    pub fn span(&self) -> usize {
        self.panels.len() - 1
    }

    pub fn get(&self, ordinal: usize) -> Option<&Panel> {
        self.panels.get(ordinal)
    }

    pub fn first(&self) -> &Panel {
        &self.panels[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Panel> {
        self.panels.iter()
    }

    pub fn ordinal_of(&self, id: &str) -> Option<usize> {
        self.panels.iter().position(|p| p.id == id)
    }

    pub fn id_of(&self, ordinal: usize) -> Option<&str> {
        self.panels.get(ordinal).map(|p| p.id.as_str())
    }

    /// Id of the panel at `ordinal`, clamped into range.
    pub fn clamped_id(&self, ordinal: usize) -> &str {
        &self.panels[self.clamp_ordinal(ordinal)].id
    }

    pub fn clamp_ordinal(&self, ordinal: usize) -> usize {
        ordinal.min(self.span())
    }

    /// Nearest panel to `progress`: `round(p * (n - 1))`.
    pub fn active_ordinal(&self, progress: Progress) -> usize {
        let span = self.span();
        if span == 0 {
            return 0;
        }
        let pos = (progress.value() * span as f64).round();
        self.clamp_ordinal(pos as usize)
    }

    /// Progress at which `ordinal` is exactly centered.
    pub fn progress_for(&self, ordinal: usize) -> Progress {
        let span = self.span();
        if span == 0 {
            return Progress::START;
        }
        Progress::new(self.clamp_ordinal(ordinal) as f64 / span as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn five() -> PanelIndex {
        PanelIndex::new(["home", "about", "projects", "blog", "contact"]).unwrap()
    }

    #[test]
    fn maps_ids_and_ordinals() {
        let panels = five();
        assert_eq!(panels.len(), 5);
        assert!(!panels.is_empty());
        assert_eq!(panels.span(), 4);
        assert_eq!(panels.ordinal_of("blog"), Some(3));
        assert_eq!(panels.id_of(2), Some("projects"));
        assert_eq!(panels.ordinal_of("missing"), None);
        assert_eq!(panels.id_of(9), None);
        assert_eq!(panels.clamped_id(9), "contact");
        assert_eq!(panels.first().id, "home");
    }

    #[test]
    fn rejects_bad_panel_sets() {
        assert!(PanelIndex::new(Vec::<String>::new()).is_err());
        assert!(PanelIndex::new(["home", "home"]).is_err());
        assert!(PanelIndex::new(["home", " "]).is_err());
    }

    #[test]
    fn active_ordinal_rounds_to_nearest() {
        let panels = five();
        assert_eq!(panels.active_ordinal(Progress::new(0.0)), 0);
        assert_eq!(panels.active_ordinal(Progress::new(0.124)), 0);
        assert_eq!(panels.active_ordinal(Progress::new(0.125)), 1);
        assert_eq!(panels.active_ordinal(Progress::new(0.5)), 2);
        assert_eq!(panels.active_ordinal(Progress::new(1.0)), 4);
    }

    #[test]
    fn lone_panel_guards_division() {
        let panels = PanelIndex::new(["home"]).unwrap();
        assert_eq!(panels.span(), 0);
        assert_eq!(panels.active_ordinal(Progress::new(0.7)), 0);
        assert_eq!(panels.progress_for(0), Progress::START);
        assert!(!panels.progress_for(3).value().is_nan());
    }

    #[test]
    fn progress_for_round_trips_to_ordinal() {
        let panels = five();
        for ordinal in 0..panels.len() {
            assert_eq!(panels.active_ordinal(panels.progress_for(ordinal)), ordinal);
        }
    }

    proptest! {
        #[test]
        fn active_ordinal_in_range(p in 0.0f64..=1.0, n in 1usize..12) {
            let ids: Vec<String> = (0..n).map(|i| format!("panel-{}", i)).collect();
            let panels = PanelIndex::new(ids).unwrap();
            let active = panels.active_ordinal(Progress::new(p));
            prop_assert!(active < n);
        }

        #[test]
        fn active_ordinal_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0, n in 1usize..12) {
            let ids: Vec<String> = (0..n).map(|i| format!("panel-{}", i)).collect();
            let panels = PanelIndex::new(ids).unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                panels.active_ordinal(Progress::new(lo)) <= panels.active_ordinal(Progress::new(hi))
            );
        }
    }
}
