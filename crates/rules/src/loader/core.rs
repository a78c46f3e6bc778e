//! Loading functions for rules, events and metrics.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use super::error::{LoadError, Result};
use crate::enrichment::EventMetrics;
use crate::schema::LinterRule;

/// Load rules from a file or a directory tree.
///
/// Duplicate `rule_id`s across files are rejected.
pub fn load_rules(path: &Path) -> Result<Vec<LinterRule>> {
    let files = if path.is_dir() {
        let mut files = Vec::new();
        scan_dir_recursive(path, &mut files)?;
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut seen = HashSet::new();
    let mut rules = Vec::new();
    for file in files {
        let loaded: Vec<LinterRule> = read_list(&file, "rules")?;
        for rule in loaded {
            if !seen.insert(rule.rule_id.clone()) {
                return Err(LoadError::Duplicate(rule.rule_id));
            }
            rules.push(rule);
        }
    }
    info!(path = %path.display(), count = rules.len(), "loaded rules");
    Ok(rules)
}

/// Load an event snapshot: a list of records or an `events:` mapping.
pub fn load_events(path: &Path) -> Result<Vec<Value>> {
    let events: Vec<Value> = read_list(path, "events")?;
    info!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

/// Load metric rows: a list or a `metrics:` mapping.
pub fn load_metrics(path: &Path) -> Result<Vec<EventMetrics>> {
    let metrics: Vec<EventMetrics> = read_list(path, "metrics")?;
    info!(path = %path.display(), count = metrics.len(), "loaded metrics");
    Ok(metrics)
}

/// Read `path` as a list of `T`, accepting a bare list, `{<key>: [...]}`
/// or a single mapping.
fn read_list<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Vec<T>> {
    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: Value = serde_yaml::from_str(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let items = match doc {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(LoadError::Shape {
                    path: path.to_path_buf(),
                    message: format!("`{key}` must be a list"),
                })
            }
            None => vec![Value::Object(map)],
        },
        Value::Null => Vec::new(),
        _ => {
            return Err(LoadError::Shape {
                path: path.to_path_buf(),
                message: "expected a list or a mapping".to_string(),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).map_err(|e| LoadError::Shape {
                path: path.to_path_buf(),
                message: format!("item {i}: {e}"),
            })
        })
        .collect()
}

fn scan_dir_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
        {
            continue;
        }

        if path.is_dir() {
            scan_dir_recursive(&path, files)?;
            continue;
        }

        let supported = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e, "yml" | "yaml" | "json"));
        if supported {
            files.push(path);
        } else {
            warn!(path = %path.display(), "skipping non-rule file");
        }
    }
    Ok(())
}
