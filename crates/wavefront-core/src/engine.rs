//! The wavefront engine: one owner for the document, the layout and the
//! wavefront state of an editing session.
//!
//! A commit cycle runs in two synchronous halves around one await:
//!
//! 1. [`WavefrontEngine::commit`] resolves the frontier, extracts the span up
//!    to the cursor, swaps it for a placeholder and returns a
//!    [`TransformRequest`].
//! 2. The host awaits [`TransformRequest::run`]. The document stays editable
//!    the whole time.
//! 3. [`WavefrontEngine::complete`] finds the placeholder by identity and
//!    splices the result (or the original text on failure) in its place.
//!
//! Only one request is ever outstanding. Commits in the meantime are refused,
//! not queued.

use std::ops::Range;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::document::Document;
use crate::error::{ConfigError, EditError};
use crate::layout::Layout;
use crate::locate::resolve_at_visual_y;
use crate::node::{Edit, Placeholder, PlaceholderId};
use crate::position_map::{Assoc, PositionMap};
use crate::transform::{TransformCompletion, TransformRequest};
use crate::types::{Position, Selection};
use crate::wavefront::{Phase, WavefrontSnapshot, WavefrontState};

/// Result of [`WavefrontEngine::commit`].
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// A placeholder was swapped in; run this request and hand the
    /// completion back.
    Dispatched(TransformRequest),
    /// A transform is already outstanding. Nothing changed.
    Busy,
    /// The span was degenerate. Nothing changed.
    NothingToCommit(NothingToCommit),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NothingToCommit {
    /// The frontier resolved at or past the cursor.
    FrontierPastCursor { start: Position, end: Position },
    /// The span held no text worth sending.
    EmptySpan { start: Position, end: Position },
    /// The placeholder swap was refused by the document.
    Rejected(EditError),
}

/// Result of [`WavefrontEngine::complete`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpliceOutcome {
    /// The placeholder was replaced. `range` covers the inserted block and
    /// its boundary; `fell_back` is set when the original text was used
    /// because the transformer failed.
    Spliced {
        range: Range<Position>,
        fell_back: bool,
    },
    /// The placeholder was gone (deleted by the user). The result was
    /// dropped and the engine is idle again.
    PlaceholderMissing,
    /// The completion does not belong to the outstanding request.
    Stale,
}

/// Owns one editing session.
pub struct WavefrontEngine<L: Layout> {
    document: Document,
    layout: L,
    config: EngineConfig,
    state: WavefrontState,
    phase: Phase,
    pending: Option<PlaceholderId>,
    next_id: u64,
    notify: watch::Sender<WavefrontSnapshot>,
}

impl<L: Layout> WavefrontEngine<L> {
    /// Engine with the default configuration.
    pub fn new(document: Document, layout: L) -> Self {
        let origin = layout.project(&document, 0);
        let state = WavefrontState::at(origin);
        let (notify, _) = watch::channel(WavefrontSnapshot {
            state,
            ..Default::default()
        });
        let mut engine = Self {
            document,
            layout,
            config: EngineConfig::default(),
            state,
            phase: Phase::Idle,
            pending: None,
            next_id: 1,
            notify,
        };
        engine.observe();
        engine
    }

    pub fn with_config(
        document: Document,
        layout: L,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = Self::new(document, layout);
        engine.config = config;
        Ok(engine)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn layout(&self) -> &L {
        &self.layout
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &WavefrontState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Placeholder of the outstanding request, if any.
    pub fn pending(&self) -> Option<PlaceholderId> {
        self.pending
    }

    pub fn snapshot(&self) -> WavefrontSnapshot {
        WavefrontSnapshot {
            state: self.state,
            phase: self.phase,
            pending: self.pending,
        }
    }

    /// Receiver that sees a new snapshot whenever state or phase changes.
    pub fn subscribe(&self) -> watch::Receiver<WavefrontSnapshot> {
        self.notify.subscribe()
    }

    /// Offset the frontier currently resolves to.
    pub fn frontier_position(&self) -> Position {
        resolve_at_visual_y(
            &self.document,
            &self.layout,
            self.state.frontier_visual_y,
            self.config.tolerance,
        )
    }

    /// Apply a host edit. Allowed in every phase.
    pub fn edit(&mut self, edit: Edit) -> Result<PositionMap, EditError> {
        let map = self.document.apply(edit)?;
        self.observe();
        Ok(map)
    }

    /// Replace the selection with `text`, as typing does.
    pub fn type_text(&mut self, text: &str) -> Result<PositionMap, EditError> {
        let selection = self.document.selection();
        self.edit(Edit::replace(selection.start(), selection.end(), text))
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.document.set_selection(selection);
        self.observe();
    }

    /// Change the layout (resize, font change) and re-project.
    pub fn relayout(&mut self, update: impl FnOnce(&mut L)) {
        update(&mut self.layout);
        self.observe();
    }

    /// Commit everything between the frontier and the cursor.
    pub fn commit(&mut self) -> CommitOutcome {
        if self.state.in_flight {
            debug!(pending = ?self.pending, "commit ignored, transform in flight");
            return CommitOutcome::Busy;
        }

        self.phase = Phase::Committing;
        match self.swap_in_placeholder() {
            Ok(request) => {
                self.phase = Phase::AwaitingTransform;
                self.observe();
                CommitOutcome::Dispatched(request)
            }
            Err(reason) => {
                debug!(?reason, "nothing to commit");
                self.phase = Phase::Idle;
                CommitOutcome::NothingToCommit(reason)
            }
        }
    }

    fn swap_in_placeholder(&mut self) -> Result<TransformRequest, NothingToCommit> {
        let start = self.frontier_position();
        let end = self.document.selection().start();
        if start >= end {
            return Err(NothingToCommit::FrontierPastCursor { start, end });
        }

        let text = self.document.text_between(start, end, "\n");
        let payload = self.config.trim.payload(&text);
        if payload.is_empty() {
            return Err(NothingToCommit::EmptySpan { start, end });
        }

        let rendered = self.layout.project(&self.document, end)
            - self.layout.project(&self.document, start);
        let height = rendered.max(self.config.min_line_height);
        let target = self.layout.project_bottom(&self.document, end);

        let id = PlaceholderId(self.next_id);
        let placeholder = Placeholder {
            id,
            original: text,
            payload,
            height,
        };
        let request = TransformRequest {
            placeholder: id,
            text: self.outgoing(placeholder.payload_text()),
        };
        self.document
            .apply(Edit::placeholder(start, end, placeholder))
            .map_err(NothingToCommit::Rejected)?;

        self.next_id += 1;
        self.pending = Some(id);
        self.state.begin(target);
        debug!(
            placeholder = %id,
            start,
            end,
            height,
            target_y = target,
            "placeholder swapped in"
        );
        Ok(request)
    }

    /// Splice a finished transform back into the document.
    pub fn complete(&mut self, completion: TransformCompletion) -> SpliceOutcome {
        let TransformCompletion {
            placeholder: id,
            result,
        } = completion;
        if self.pending != Some(id) {
            debug!(placeholder = %id, "ignoring stale completion");
            return SpliceOutcome::Stale;
        }
        self.pending = None;

        let Some((at, placeholder)) = self.document.find_placeholder(id) else {
            warn!(placeholder = %id, "placeholder vanished before its transform finished");
            return self.abandon();
        };

        let (text, fell_back) = match result {
            Ok(result) => (placeholder.splice(&self.incoming(result)), false),
            Err(err) => {
                warn!(placeholder = %id, error = %err, "transform failed, keeping original text");
                (placeholder.original.clone(), true)
            }
        };

        let map = match self.document.apply(Edit::block(at, at + 1, text)) {
            Ok(map) => map,
            Err(err) => {
                warn!(placeholder = %id, error = %err, "could not splice transform result");
                return self.abandon();
            }
        };
        let range = at..map.map(at + 1, Assoc::After);

        self.state.finish();
        self.phase = Phase::Idle;
        self.observe();
        debug!(placeholder = %id, ?range, fell_back, "transform spliced");
        SpliceOutcome::Spliced { range, fell_back }
    }

    /// Payload as the transformer sees it: block boundaries as the
    /// configured marker.
    fn outgoing(&self, payload: &str) -> String {
        match self.config.line_break.as_str() {
            "\n" => payload.to_string(),
            marker => payload.replace('\n', marker),
        }
    }

    /// Transformer output with the marker turned back into boundaries.
    fn incoming(&self, result: String) -> String {
        match self.config.line_break.as_str() {
            "\n" => result,
            marker => result.replace(marker, "\n"),
        }
    }

    fn abandon(&mut self) -> SpliceOutcome {
        self.state.abandon();
        self.phase = Phase::Idle;
        self.observe();
        SpliceOutcome::PlaceholderMissing
    }

    /// Recompute the cursor row and pull the frontier back inside the
    /// document, then publish.
    fn observe(&mut self) {
        let doc = &self.document;
        let cursor = self.layout.project(doc, doc.selection().head);
        let end = self.layout.project(doc, doc.size());
        let origin = doc.is_blank().then(|| self.layout.project(doc, 0));
        self.state.observe(cursor, end, origin);

        let snapshot = self.snapshot();
        self.notify.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
