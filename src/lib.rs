//! # corpus-qa
//!
//! Retrieval-augmented question answering over a personal document corpus.
//!
//! Documents (PDFs, text files, web pages) are segmented into passages,
//! embedded, and indexed per collection. Queries retrieve the best-matching
//! passages across all collections, merged under one global distance order,
//! and feed them as context to a local LLM. Near-duplicate queries are
//! served from a similarity-keyed response cache that is invalidated
//! whenever the corpus changes.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Ingestion   │──▶│ Passage store │──▶│ Similarity     │
//! │ pdf/txt/web  │   │   (SQLite)    │   │ index (k-NN)   │
//! └─────────────┘   └──────────────┘   └──────┬────────┘
//!                                             │
//!        query ──▶ response cache ──miss──▶ retrieval ──▶ LLM ──▶ answer
//!                        ▲                                         │
//!                        └──────────────── cache write ────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`segment`] | Blank-line passage segmentation |
//! | [`ingest`] | Load orchestration and kind dispatch |
//! | [`pdf`] | PDF passage extraction |
//! | [`web`] | URL fetch and visible-text extraction |
//! | [`embedding`] | Embedding provider abstraction and vector utilities |
//! | [`index`] | Passage store writes and per-collection k-NN |
//! | [`retrieve`] | Multi-collection merge and context assembly |
//! | [`cache`] | Similarity-keyed response cache |
//! | [`llm`] | LLM generation client |
//! | [`answer`] | Cache lookup → retrieval → generation pipeline |
//! | [`registry`] | Document registry (dedup gate) |
//! | [`session`] | Session lifecycle and working directory |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod answer;
pub mod cache;
pub mod config;
pub mod db;
pub mod embedding;
pub mod index;
pub mod ingest;
pub mod llm;
pub mod migrate;
pub mod models;
pub mod pdf;
pub mod registry;
pub mod retrieve;
pub mod segment;
pub mod session;
pub mod web;
