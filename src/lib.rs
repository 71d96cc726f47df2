//! # Needle - Exact-Line Membership Search Server
//!
//! Needle answers one question: "does this exact line exist in a large
//! text corpus?" It serves many concurrent clients over TCP or TLS, with
//! one query per connection.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`corpus`] - Corpus stores (materialized hash set and memory-mapped scan)
//! - [`engine`] - Query evaluation: refresh-then-lookup producing a typed result
//! - [`server`] - TCP/TLS listener, per-connection handlers, wire protocol, client
//! - [`config`] - Configuration file parsing and resolved server settings
//!
//! ## Quick Start
//!
//! ```ignore
//! use needle::config::{ConfigFile, Overrides, ServerSettings};
//! use needle::server::Server;
//!
//! let file = ConfigFile::load(std::path::Path::new("needle.json")).unwrap();
//! let settings = ServerSettings::resolve(file, Overrides::default()).unwrap();
//!
//! let server = Server::bind(settings).unwrap();
//! server.run().unwrap();
//! ```
//!
//! ## Matching semantics
//!
//! A query matches only a whole corpus line, byte for byte: no trimming,
//! no case folding, internal whitespace significant. The two corpus
//! backends trade memory for per-query cost but always agree on results:
//!
//! 1. **Materialized set** - the file parsed once into an ahash set; O(1)
//!    lookups, rebuilt when the file's modification stamp changes
//! 2. **Memory-mapped scan** - the file mapped read-only and scanned per
//!    query with a whole-line substring search; no parse step, O(1) memory

pub mod config;
pub mod corpus;
pub mod engine;
pub mod server;
