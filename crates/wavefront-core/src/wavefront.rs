//! Wavefront state: where the committed region ends, in visual coordinates.
//!
//! The frontier is kept as a [`VisualY`] rather than a position because
//! visual rows stay put when text below them changes. Only the engine moves
//! these values; hosts read them through
//! [`WavefrontEngine::state`](crate::WavefrontEngine::state) or a
//! [`WavefrontSnapshot`] from the watch channel.

use crate::node::PlaceholderId;
use crate::types::VisualY;

/// Where the engine is in the commit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Span extraction and placeholder swap. Never observable between calls.
    Committing,
    /// A transform is outstanding.
    AwaitingTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WavefrontState {
    pub frontier_visual_y: VisualY,
    pub previous_frontier_visual_y: VisualY,
    pub cursor_visual_y: VisualY,
    pub in_flight: bool,
    /// Where the frontier lands once the outstanding transform completes.
    /// Fixed at commit time.
    pub target_visual_y: VisualY,
}

impl WavefrontState {
    pub(crate) fn at(frontier: VisualY) -> Self {
        Self {
            frontier_visual_y: frontier,
            previous_frontier_visual_y: frontier,
            cursor_visual_y: frontier,
            ..Self::default()
        }
    }

    /// A commit was dispatched.
    pub(crate) fn begin(&mut self, target: VisualY) {
        self.previous_frontier_visual_y = self.frontier_visual_y;
        self.target_visual_y = target;
        self.in_flight = true;
    }

    /// The transform result was spliced in.
    pub(crate) fn finish(&mut self) {
        self.frontier_visual_y = self.target_visual_y;
        self.in_flight = false;
    }

    /// The result had nowhere to go. The frontier stays where it was.
    pub(crate) fn abandon(&mut self) {
        self.in_flight = false;
    }

    /// Re-derive cursor and frontier after any change to the document,
    /// selection or layout.
    ///
    /// `origin` is the projection of offset 0 and is only passed when the
    /// document is blank; `end` is the projection of the document end.
    pub(crate) fn observe(&mut self, cursor: VisualY, end: VisualY, origin: Option<VisualY>) {
        self.cursor_visual_y = cursor;
        if let Some(origin) = origin {
            self.frontier_visual_y = origin;
        } else if self.frontier_visual_y > end {
            self.frontier_visual_y = cursor;
        }
    }
}

/// Everything a host indicator needs, published on every change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WavefrontSnapshot {
    pub state: WavefrontState,
    pub phase: Phase,
    pub pending: Option<PlaceholderId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_cycle() {
        let mut state = WavefrontState::at(0.0);
        state.frontier_visual_y = 21.0;

        state.begin(63.0);
        assert!(state.in_flight);
        assert_eq!(state.previous_frontier_visual_y, 21.0);
        assert_eq!(state.frontier_visual_y, 21.0);

        state.finish();
        assert!(!state.in_flight);
        assert_eq!(state.frontier_visual_y, 63.0);
    }

    #[test]
    fn test_abandon_keeps_frontier() {
        let mut state = WavefrontState::at(10.0);
        state.begin(50.0);
        state.abandon();
        assert!(!state.in_flight);
        assert_eq!(state.frontier_visual_y, 10.0);
    }

    #[test]
    fn test_observe_resets_frontier_past_end() {
        let mut state = WavefrontState::at(0.0);
        state.frontier_visual_y = 84.0;
        state.observe(21.0, 42.0, None);
        assert_eq!(state.frontier_visual_y, 21.0);
        assert_eq!(state.cursor_visual_y, 21.0);
    }

    #[test]
    fn test_observe_keeps_frontier_on_last_row() {
        let mut state = WavefrontState::at(0.0);
        state.frontier_visual_y = 42.0;
        state.observe(42.0, 42.0, None);
        assert_eq!(state.frontier_visual_y, 42.0);
    }

    #[test]
    fn test_observe_blank_document_resets_to_origin() {
        let mut state = WavefrontState::at(0.0);
        state.frontier_visual_y = 42.0;
        state.observe(0.0, 0.0, Some(0.0));
        assert_eq!(state.frontier_visual_y, 0.0);
    }
}
