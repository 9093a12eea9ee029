//! Load-mode state machine.
//!
//! "Is this a fresh model load or a workflow restore" used to be implied by
//! which values happened to be populated; here it is an explicit state with
//! defined transitions. Invalid transitions are logged and ignored rather
//! than panicking, matching the self-healing posture of the rest of the
//! engine.

use tracing::debug;

/// Lifecycle phase of the node's parameter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// No load in progress; bindings (if any) are settled.
    #[default]
    Idle,
    /// The user picked a model; bindings are being built from scratch.
    Fresh,
    /// A saved document is being replayed; restored values and links take
    /// precedence over schema defaults.
    Restoring,
}

/// Events that drive [`LoadMode`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadEvent {
    /// The user selected a model in the picker.
    ModelSelected,
    /// The host handed over a saved document.
    DocumentLoaded,
    /// Bindings for the current field list have been created.
    BindingsActivated,
    /// The restore pass finished and cleared its state.
    RestoreComplete,
}

impl LoadMode {
    /// Applies `event`, returning the next mode. Transitions not in the
    /// table leave the mode unchanged with a debug line.
    pub fn apply(self, event: LoadEvent) -> LoadMode {
        let next = match (self, event) {
            (_, LoadEvent::ModelSelected) => Some(LoadMode::Fresh),
            (_, LoadEvent::DocumentLoaded) => Some(LoadMode::Restoring),
            (LoadMode::Fresh, LoadEvent::BindingsActivated) => Some(LoadMode::Idle),
            // During a restore, activation is an intermediate step; the
            // mode stays Restoring until the value/link replay finishes.
            (LoadMode::Restoring, LoadEvent::BindingsActivated) => Some(LoadMode::Restoring),
            (LoadMode::Restoring, LoadEvent::RestoreComplete) => Some(LoadMode::Idle),
            _ => None,
        };

        match next {
            Some(next) => next,
            None => {
                debug!(?self, ?event, "ignoring load event with no defined transition");
                self
            }
        }
    }

    /// Whether restored values should override schema defaults right now.
    pub fn is_restoring(self) -> bool {
        self == LoadMode::Restoring
    }
}
