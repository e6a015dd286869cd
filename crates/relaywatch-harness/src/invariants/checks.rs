//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use relaywatch_core::ConnectionState;

use super::{Invariant, InvariantResult, SystemSnapshot, Violation};

/// At most one visible notification per dedupe key.
pub struct UniqueDedupeKeys;

impl Invariant for UniqueDedupeKeys {
    fn name(&self) -> &'static str {
        "unique_dedupe_keys"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for n in &state.notifications {
            if !seen.insert(n.dedupe_key.as_str()) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("key {:?} visible more than once", n.dedupe_key),
                });
            }
        }
        Ok(())
    }
}

/// Visible notifications have distinct render keys.
pub struct UniqueIds;

impl Invariant for UniqueIds {
    fn name(&self) -> &'static str {
        "unique_ids"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for n in &state.notifications {
            if !seen.insert(n.id.as_str()) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("id {} rendered twice", n.id),
                });
            }
        }
        Ok(())
    }
}

/// Every armed timer belongs to a pending debounce or an auto-hide card.
///
/// Catches leaked timers after cancel, dismiss or replacement.
pub struct TimersAccountedFor;

impl Invariant for TimersAccountedFor {
    fn name(&self) -> &'static str {
        "timers_accounted_for"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(queue) = state.queue else { return Ok(()) };
        let auto_hide = state.notifications.iter().filter(|n| n.auto_hide).count();
        let expected = queue.pending + auto_hide;
        if queue.armed_timers != expected {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} timers armed, expected {} pending + {} auto-hide",
                    queue.armed_timers, queue.pending, auto_hide
                ),
            });
        }
        Ok(())
    }
}

/// Connecting, reconnecting and failed are always shown.
pub struct DisruptionVisible;

impl Invariant for DisruptionVisible {
    fn name(&self) -> &'static str {
        "disruption_visible"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(indicator) = &state.indicator else { return Ok(()) };
        let must_show = matches!(
            indicator.state,
            ConnectionState::Connecting | ConnectionState::Reconnecting | ConnectionState::Failed
        );
        if must_show && !indicator.visible {
            return Err(Violation {
                invariant: self.name(),
                message: format!("indicator hidden while {}", indicator.state),
            });
        }
        Ok(())
    }
}

/// The reconnect button is only enabled in `failed` or `disconnected`.
pub struct ReconnectGated;

impl Invariant for ReconnectGated {
    fn name(&self) -> &'static str {
        "reconnect_gated"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        let Some(indicator) = &state.indicator else { return Ok(()) };
        if indicator.can_reconnect && !indicator.state.allows_manual_reconnect() {
            return Err(Violation {
                invariant: self.name(),
                message: format!("reconnect enabled while {}", indicator.state),
            });
        }
        Ok(())
    }
}
