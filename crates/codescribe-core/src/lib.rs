//! # Codescribe Core
//!
//! Runtime-agnostic logic for codescribe: chunking, content fingerprints,
//! per-file documentation synthesis, and incremental reconciliation.
//!
//! This crate does no filesystem, network, or database I/O of its own.
//! Storage and the language-model summarizer are reached through the
//! [`store::Store`], [`store::ContentSource`], and
//! [`summarize::Summarizer`] traits; the `codescribe` crate provides the
//! SQLite and HTTP implementations.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chunk`] | Recursive, overlap-aware text splitter |
//! | [`fingerprint`] | Chunk hashes and the Merkle-style root |
//! | [`synthesize`] | Chunk → summarize → stitch one file's documentation |
//! | [`reconcile`] | Full generation and atomic incremental updates |
//! | [`changes`] | Change sets from two content snapshots |
//! | [`store`] | Persistence traits and an in-memory store |

pub mod changes;
pub mod chunk;
pub mod error;
pub mod events;
pub mod filter;
pub mod fingerprint;
pub mod models;
pub mod reconcile;
pub mod store;
pub mod summarize;
pub mod synthesize;

#[cfg(test)]
mod testing;
