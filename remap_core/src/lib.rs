//! `remap_core` is the core library for the remap batch generator. One
//! template draft project plus one row of tabular substitution data produce
//! one derivative project: the engine rewrites embedded file-path references
//! and text placeholders anywhere inside the schema-free document trees, and
//! the resolver decides which concrete file replaces each referenced
//! material.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Rule configuration (JSON)
//!   → RuleConfig (validates, filters enabled, sorts by priority)
//!   → Engine (compiles rules into executable path/text rule lists)
//! Per CSV row:
//!   DraftProject (loads the two project documents, declares materials)
//!   → MaterialResolver (change tree → template tree → original path)
//!   → Engine::process (walks each document, applies rules, recurses into
//!     nested JSON held in content-key strings)
//!   → DraftProject::save
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Rule configuration loading and normalization.
//! - [`resolver`] — Material resolution across the override and template
//!   asset trees.
//! - [`project`] — Draft project documents: open, rename, apply a row, save.
//!
//! ## Key Types
//!
//! - [`Engine`] — The recursive document walker, built once per rule
//!   configuration and reused across rows.
//! - [`Rule`] — A compiled rule: direct material lookup, regex substitution,
//!   or placeholder expansion.
//! - [`MaterialResolver`] — Probes the filesystem through the ordered
//!   fallback chain and builds the per-row material map.
//! - [`DraftProject`] — The pair of documents a batch row transforms.
//! - [`RemapError`] — The crate error type, with miette diagnostics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! use remap_core::DraftProject;
//! use remap_core::Engine;
//! use remap_core::MaterialResolver;
//! use remap_core::RuleConfig;
//!
//! # fn main() -> remap_core::RemapResult<()> {
//! let config = RuleConfig::load(Path::new("rules.json"))?;
//! let engine = Engine::new(&config);
//!
//! let mut project = DraftProject::open(Path::new("out/my_project"))?;
//! let resolver = MaterialResolver::new(
//! 	Some(Path::new("TemplateMaterial")),
//! 	Some(Path::new("ChangeMaterial")),
//! 	project.template_name(),
//! );
//!
//! let row: HashMap<String, String> = HashMap::new();
//! project.apply_row(&engine, &resolver, &row)?;
//! project.save()?;
//! # Ok(())
//! # }
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use project::*;
pub use resolver::*;
pub use rules::*;

pub mod config;
mod engine;
mod error;
pub mod project;
pub mod resolver;
mod rules;

#[cfg(test)]
mod __fixtures;
