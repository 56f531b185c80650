// Deep-link resolution on page load. The choreographer comes up asynchronously,
// so a pending link either waits for an explicit ready notification or is polled
// against a deadline; on timeout it falls back to a plain scroll-into-view.

use serde::{Deserialize, Serialize};

use crate::error::ScrollError;
use crate::hash_sync::parse_fragment;
use crate::panels::PanelIndex;
use crate::progress::ProgressSource;
use crate::types::{ScrollCommand, ScrollConfig};

/// Poll cadence and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLinkPolicy {
    pub poll_ms: u32,
    pub budget_ms: u32,
}

impl DeepLinkPolicy {
    pub fn from_config(config: &ScrollConfig) -> Self {
        DeepLinkPolicy {
            poll_ms: config.deep_link_poll_ms.max(1),
            budget_ms: config.deep_link_budget_ms,
        }
    }
}

impl Default for DeepLinkPolicy {
    fn default() -> Self {
        DeepLinkPolicy::from_config(&ScrollConfig::default())
    }
}

/// What the host should do after a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step")]
pub enum DeepLinkStep {
    /// Nothing pending.
    Idle,
    /// Poll again after `retry_in_ms`.
    Wait { retry_in_ms: u32 },
    /// Perform `command`; the link is resolved.
    Resolved { command: ScrollCommand },
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Pending {
        panel_id: String,
        ordinal: usize,
        waited_ms: u32,
    },
    Done,
}

#[derive(Debug, Clone)]
pub struct DeepLinkResolver {
    policy: DeepLinkPolicy,
    phase: Phase,
}

impl DeepLinkResolver {
    /// Start from the load-time fragment. Missing or unknown fragments resolve
    /// to nothing.
    pub fn from_fragment(raw_fragment: &str, panels: &PanelIndex, policy: DeepLinkPolicy) -> Self {
        let phase = match parse_fragment(raw_fragment) {
            Some(id) => match panels.ordinal_of(id) {
                Some(ordinal) => {
                    tracing::info!(panel = id, ordinal, "Deep link detected");
                    Phase::Pending {
                        panel_id: id.to_string(),
                        ordinal,
                        waited_ms: 0,
                    }
                }
                None => {
                    tracing::debug!(fragment = id, "Ignoring fragment that names no panel");
                    Phase::Done
                }
            },
            None => Phase::Done,
        };
        DeepLinkResolver { policy, phase }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Pending { .. })
    }

    pub fn target(&self) -> Option<&str> {
        match &self.phase {
            Phase::Pending { panel_id, .. } => Some(panel_id),
            Phase::Done => None,
        }
    }

    /// One retry-loop iteration. Native mode needs no choreographer, so it
    /// resolves immediately just like a ready one.
    pub fn poll(&mut self, ready: bool, panels: &PanelIndex, source: &ProgressSource) -> DeepLinkStep {
        if !self.is_pending() {
            return DeepLinkStep::Idle;
        }

        if ready || source.mode().is_native() {
            return match self.resolve(panels, source) {
                Some(command) => DeepLinkStep::Resolved { command },
                None => DeepLinkStep::Idle,
            };
        }

        let poll_ms = self.policy.poll_ms;
        let budget_ms = self.policy.budget_ms;
        if let Phase::Pending { waited_ms, .. } = &mut self.phase {
            if *waited_ms < budget_ms {
                *waited_ms = waited_ms.saturating_add(poll_ms);
                return DeepLinkStep::Wait {
                    retry_in_ms: poll_ms,
                };
            }
        }

        self.time_out(source)
    }

    /// Explicit ready signal from the choreographer; resolves without polling.
    pub fn on_ready(&mut self, panels: &PanelIndex, source: &ProgressSource) -> Option<ScrollCommand> {
        self.resolve(panels, source)
    }

    fn resolve(&mut self, panels: &PanelIndex, source: &ProgressSource) -> Option<ScrollCommand> {
        let Phase::Pending {
            panel_id,
            ordinal,
            waited_ms,
        } = std::mem::replace(&mut self.phase, Phase::Done)
        else {
            return None;
        };
        let panel = panels.get(ordinal)?;
        tracing::info!(panel = %panel_id, waited_ms, "Deep link resolved");
        Some(source.seek_panel(panel, panels.progress_for(ordinal), false))
    }

    fn time_out(&mut self, source: &ProgressSource) -> DeepLinkStep {
        let Phase::Pending {
            panel_id,
            waited_ms,
            ..
        } = std::mem::replace(&mut self.phase, Phase::Done)
        else {
            return DeepLinkStep::Idle;
        };
        let err = ScrollError::DeepLinkTimeout {
            panel_id: panel_id.clone(),
            waited_ms,
        };
        tracing::warn!(error = %err, "Falling back to scroll-into-view");
        DeepLinkStep::Resolved {
            command: source.scroll_into_view(&panel_id, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn panels() -> PanelIndex {
        PanelIndex::new(["home", "about", "projects", "blog", "contact"]).unwrap()
    }

    fn source(width: f64) -> ProgressSource {
        ProgressSource::new(
            5,
            &ScrollConfig::default(),
            &HostEnvironment {
                viewport: Viewport::new(width, 800.0),
                section_top: 100.0,
                reduced_motion: false,
                engine_available: true,
            },
        )
    }

    #[test]
    fn ignores_missing_and_unknown_fragments() {
        let mut empty = DeepLinkResolver::from_fragment("", &panels(), DeepLinkPolicy::default());
        assert!(!empty.is_pending());
        assert_eq!(empty.poll(true, &panels(), &source(1200.0)), DeepLinkStep::Idle);

        let unknown = DeepLinkResolver::from_fragment("#resume", &panels(), DeepLinkPolicy::default());
        assert!(!unknown.is_pending());
    }

    #[test]
    fn resolves_instantly_once_ready() {
        let mut resolver = DeepLinkResolver::from_fragment("#blog", &panels(), DeepLinkPolicy::default());
        assert_eq!(resolver.target(), Some("blog"));

        assert_eq!(
            resolver.poll(false, &panels(), &source(1200.0)),
            DeepLinkStep::Wait { retry_in_ms: 100 }
        );
        assert_eq!(
            resolver.poll(true, &panels(), &source(1200.0)),
            DeepLinkStep::Resolved {
                command: ScrollCommand::Seek {
                    top: 100.0 + 0.75 * 3200.0,
                    behavior: ScrollBehavior::Instant,
                },
            }
        );
        assert!(!resolver.is_pending());
        assert_eq!(resolver.poll(true, &panels(), &source(1200.0)), DeepLinkStep::Idle);
    }

    #[test]
    fn native_mode_resolves_without_ready() {
        let mut resolver = DeepLinkResolver::from_fragment("#projects", &panels(), DeepLinkPolicy::default());
        assert_eq!(
            resolver.poll(false, &panels(), &source(600.0)),
            DeepLinkStep::Resolved {
                command: ScrollCommand::ScrollIntoView {
                    panel_id: "projects".to_string(),
                    header_offset_px: 80.0,
                    behavior: ScrollBehavior::Instant,
                },
            }
        );
    }

    #[test]
    fn times_out_after_budget() {
        let policy = DeepLinkPolicy {
            poll_ms: 100,
            budget_ms: 2000,
        };
        let mut resolver = DeepLinkResolver::from_fragment("#contact", &panels(), policy);

        let mut waits = 0;
        loop {
            match resolver.poll(false, &panels(), &source(1200.0)) {
                DeepLinkStep::Wait { retry_in_ms } => {
                    assert_eq!(retry_in_ms, 100);
                    waits += 1;
                }
                DeepLinkStep::Resolved { command } => {
                    assert_eq!(
                        command,
                        ScrollCommand::ScrollIntoView {
                            panel_id: "contact".to_string(),
                            header_offset_px: 80.0,
                            behavior: ScrollBehavior::Smooth,
                        }
                    );
                    break;
                }
                DeepLinkStep::Idle => panic!("resolver went idle before resolving"),
            }
        }
        assert_eq!(waits, 20);
        assert!(!resolver.is_pending());
    }

    #[test]
    fn ready_signal_skips_polling() {
        let mut resolver = DeepLinkResolver::from_fragment("about", &panels(), DeepLinkPolicy::default());
        let command = resolver.on_ready(&panels(), &source(1200.0));
        assert_eq!(
            command,
            Some(ScrollCommand::Seek {
                top: 100.0 + 0.25 * 3200.0,
                behavior: ScrollBehavior::Instant,
            })
        );
        assert_eq!(resolver.on_ready(&panels(), &source(1200.0)), None);
    }
}
