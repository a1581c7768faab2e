//! scriv: a selection-driven rich-text authoring core.
//!
//! This crate provides:
//! - `document` - the block/run document tree, positions and selections
//! - `resolver` - mapping a selection onto run boundaries without mutation
//! - `engine` - mark toggling, block alignment and the editing primitives
//! - `markup` - the tagged-text serialization format and its parser
//! - `session` - the host-facing action surface over a provider/sink pair
//!
//! Rendering, event capture and toolbar chrome live in the host; the core
//! holds no UI state and performs no I/O.

pub mod document;
pub mod engine;
pub mod error;
pub mod markup;
pub mod resolver;
pub mod session;

pub use document::{Alignment, Block, Document, Mark, Position, Selection, StyleSet, TextRun};
pub use error::{EditResult, EditorError};
pub use markup::{parse, serialize};
pub use resolver::{ResolvedSpan, SpanSegment, resolve};
pub use session::{EditSession, RenderSink, SelectionProvider};
