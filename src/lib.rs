//! # codescribe
//!
//! Incremental, fingerprinted source documentation for code repositories.
//!
//! Each source file is split into overlapping chunks, every chunk is
//! summarized by a language model, and the fragments are stitched into one
//! Markdown document per file. Chunk hashes form a Merkle-style fingerprint
//! so a repository's documented state can be compared cheaply. Changes are
//! applied incrementally inside a single SQLite transaction.
//!
//! The pipeline itself lives in [`codescribe_core`]; this crate provides the
//! SQLite store, the HTTP summarizer providers, configuration, the `scribe`
//! CLI, and the HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────┐   ┌──────────┐
//! │   import    │──▶│ Reconciler           │──▶│  SQLite   │
//! │  sync/apply │   │ chunk+summarize+hash │   │ files+docs│
//! └─────────────┘   └──────────┬───────────┘   └────┬─────┘
//!                              │                    │
//!                       ┌──────▼─────┐       ┌──────▼─────┐
//!                       │ Summarizer │       │ CLI / HTTP │
//!                       │ OpenAI/Olm │       │  (scribe)  │
//!                       └────────────┘       └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! scribe init                       # create database
//! scribe import demo ./my-repo      # record source files
//! scribe generate demo              # document everything
//! scribe sync demo ./my-repo        # later: document only what changed
//! scribe get demo src/app.py
//! scribe serve                      # start HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite persistence adapter and content store |
//! | [`summarizer`] | OpenAI / Ollama summarizer providers |
//! | [`progress`] | Progress output on stderr |
//! | [`import`] | Directory scanning into the content store |
//! | [`generate`] | Full generation, change files, directory sync |
//! | [`get`] | Document retrieval |
//! | [`repos`] | Repository listing |
//! | [`server`] | HTTP API server |

pub mod config;
pub mod db;
pub mod generate;
pub mod get;
pub mod import;
pub mod migrate;
pub mod progress;
pub mod repos;
pub mod server;
pub mod sqlite_store;
pub mod summarizer;
