//! Exclusive busy state shared by the actions that lock the form controls.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::view::UiView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Question,
    ResetCache,
    GraphImage,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Question => "question",
            ActionKind::ResetCache => "reset_cache",
            ActionKind::GraphImage => "graph_image",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{in_flight} request already in progress")]
pub struct Busy {
    pub in_flight: ActionKind,
}

#[derive(Default)]
struct GateState {
    in_flight: Option<ActionKind>,
    generation: u64,
}

/// At most one control-locking action runs at a time. Controls are disabled
/// when a permit is handed out and enabled again when it drops, whichever way
/// the action ends.
pub struct ControlsGate {
    state: Mutex<GateState>,
    view: Arc<dyn UiView>,
}

impl ControlsGate {
    pub fn new(view: Arc<dyn UiView>) -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            view,
        }
    }

    pub fn try_acquire(&self, kind: ActionKind) -> Result<ControlsPermit<'_>, Busy> {
        let generation = {
            let mut state = self.state.lock();
            if let Some(in_flight) = state.in_flight {
                return Err(Busy { in_flight });
            }
            state.in_flight = Some(kind);
            state.generation += 1;
            state.generation
        };
        debug!(action = %kind, generation, "controls: locked");
        self.view.set_controls_enabled(false);
        Ok(ControlsPermit {
            gate: self,
            kind,
            generation,
        })
    }

    pub fn in_flight(&self) -> Option<ActionKind> {
        self.state.lock().in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight().is_some()
    }

    fn release(&self, kind: ActionKind, generation: u64) {
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.in_flight = None;
        }
        debug!(action = %kind, generation, "controls: released");
        self.view.set_controls_enabled(true);
    }
}

#[must_use = "controls unlock as soon as the permit is dropped"]
pub struct ControlsPermit<'a> {
    gate: &'a ControlsGate,
    kind: ActionKind,
    generation: u64,
}

impl ControlsPermit<'_> {
    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

impl Drop for ControlsPermit<'_> {
    fn drop(&mut self) {
        self.gate.release(self.kind, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::RecordingView;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let view = Arc::new(RecordingView::default());
        let gate = ControlsGate::new(view.clone());

        let permit = gate.try_acquire(ActionKind::Question).expect("idle gate");
        assert!(!view.controls_enabled());
        assert_eq!(
            gate.try_acquire(ActionKind::ResetCache).err(),
            Some(Busy {
                in_flight: ActionKind::Question
            })
        );

        drop(permit);
        assert!(view.controls_enabled());
        assert!(!gate.is_busy());
        let _again = gate.try_acquire(ActionKind::ResetCache).expect("released");
        assert_eq!(gate.in_flight(), Some(ActionKind::ResetCache));
    }

    #[test]
    fn permit_released_when_holder_unwinds() {
        let view = Arc::new(RecordingView::default());
        let gate = ControlsGate::new(view.clone());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = gate.try_acquire(ActionKind::GraphImage).expect("idle gate");
            panic!("render failed");
        }));

        assert!(result.is_err());
        assert!(!gate.is_busy());
        assert!(view.controls_enabled());
    }
}
