//! wavefront-core: the wavefront synchronization engine.
//!
//! This crate provides:
//! - `Document` - block/placeholder node sequence with atomic edits and `PositionMap`s
//! - `Layout` trait for projecting positions onto visual rows, with `WrapLayout`
//! - `resolve_at_visual_y` - the frontier locator
//! - `WavefrontEngine<L>` - single-flight commit / transform / splice cycle
//! - `Transformer` trait for the external rewriting service

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod layout;
pub mod locate;
pub mod node;
pub mod position_map;
pub mod transform;
pub mod types;
pub mod wavefront;

pub use config::EngineConfig;
pub use document::Document;
pub use engine::{CommitOutcome, NothingToCommit, SpliceOutcome, WavefrontEngine};
pub use error::{ConfigError, EditError, TransformError};
pub use layout::{Layout, Row, RowKind, WrapLayout};
pub use locate::{DEFAULT_TOLERANCE, resolve_at_visual_y};
pub use node::{Edit, InlineRun, Marks, Node, Placeholder, PlaceholderId, TextBlock};
pub use position_map::{Assoc, Mapped, PositionMap};
pub use transform::{
    Identity, TransformCompletion, TransformRequest, Transformer, TrimPolicy,
};
pub use types::{Position, Selection, VisualY};
pub use wavefront::{Phase, WavefrontSnapshot, WavefrontState};
