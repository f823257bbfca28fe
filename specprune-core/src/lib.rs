//! Embeddable core library for specprune.
//!
//! Provides a clap-free, I/O-abstracted entry point: prune a primary spec
//! file, fold any number of fragments into it, and persist it once.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`DescriptorSource`](ports::DescriptorSource) loads and parses spec files
//! - [`DescriptorSink`](ports::DescriptorSink) persists the edited primary
//!
//! The [`adapters`] module provides filesystem-backed and in-memory implementations.
//!
//! # Entry point
//!
//! - [`run`](pipeline::run) executes the whole transaction and returns notices, patch and report

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the edit types embedders configure runs with.
pub use specprune_edit::{InsertionPoint, MergeReport, PruneReport};
pub use specprune_spec::{Document, MacroTable};
