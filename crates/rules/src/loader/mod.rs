//! File-based loading of rules, event snapshots and metric rows.
//!
//! Used by the offline `check` command and fixtures. Files may be YAML or
//! JSON (YAML is a superset). A rule file holds a list of rules, a
//! `rules:` mapping with a list, or a single rule. A directory is scanned
//! recursively for `*.yml` / `*.yaml` / `*.json`, skipping dotfiles.

mod core;
mod error;

pub use self::core::{load_events, load_metrics, load_rules};
pub use error::{LoadError, Result};
