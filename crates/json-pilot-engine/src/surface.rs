//! Host-surface seam.
//!
//! The engine computes byte-ranged edits; rendering surfaces speak
//! line/column. [`surface_edits`] translates one into the other against
//! the snapshot the edits were computed for. The two traits here are the
//! only things a host must implement to drive the engine.

use json_pilot_tree::{LineIndex, Position};

use crate::toggle::TextEdit;

/// A replacement addressed in line/column space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEdit {
    pub start: Position,
    pub end: Position,
    pub text: String,
}

/// Translates byte-ranged edits into line/column edits against `text`.
pub fn surface_edits(text: &str, edits: &[TextEdit]) -> Vec<SurfaceEdit> {
    let index = LineIndex::new(text);
    edits
        .iter()
        .map(|edit| SurfaceEdit {
            start: index.position(edit.offset),
            end: index.position(edit.end()),
            text: edit.text.clone(),
        })
        .collect()
}

/// A text-editing surface the engine can push edits and actions to.
pub trait TextSurface {
    /// Applies the edits as one undoable operation.
    fn apply_edits(&mut self, edits: &[SurfaceEdit]);
    /// Triggers a surface-native action by identifier. Returns `false`
    /// when the surface does not provide the action.
    fn run_action(&mut self, action: &str) -> bool;
}

/// Receiver for user-facing operation outcomes.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
}
