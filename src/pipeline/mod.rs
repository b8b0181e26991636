//! Processing Pipeline Module
//!
//! ```text
//! MessageSource ──▶ ProcessingLoop ──▶ MessageSink
//!                        │
//!                  MessageOperator (e.g. fromprofile)
//! ```
//!
//! The loop guarantees one output per input, in input order, and stops at the
//! first lookup failure.

pub mod processing_loop;
pub mod sink;
pub mod source;

pub use processing_loop::{PipelineError, PipelineStats, ProcessingLoop};
pub use sink::{CollectSink, JsonLinesSink, MessageSink};
pub use source::{JsonLinesSource, MessageSource, SourceEvent, VecSource};
