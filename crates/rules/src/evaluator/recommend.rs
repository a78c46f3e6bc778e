//! Authoring hints for rules that matched nothing.

use super::diagnostics::Diagnostics;

/// Fields missing from more than this share of records get flagged.
const MISSING_RATIO_THRESHOLD: f64 = 0.8;

/// Suggestions for a rule author. Empty whenever the rule matched something.
pub fn recommendations(condition_count: usize, diagnostics: &Diagnostics) -> Vec<String> {
    if diagnostics.matching_count > 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    if condition_count == 0 {
        out.push(
            "Rule has no conditions defined - it may be handled by database functions or RPC calls instead"
                .to_string(),
        );
    }

    for (field, presence) in &diagnostics.field_presence {
        let ratio = presence.missing_ratio();
        if ratio > MISSING_RATIO_THRESHOLD {
            out.push(format!(
                "Field \"{field}\" is missing in {}% of events - may not be populated in database",
                (ratio * 100.0).round() as u64
            ));
        }
    }

    if diagnostics.near_match_count > 0 {
        out.push(format!(
            "Found {} events that almost match (off by 1 condition) - conditions may be too strict",
            diagnostics.near_match_count
        ));
    }

    out
}

/// One-line verdict for the report.
pub fn reason(matching_count: usize) -> String {
    if matching_count == 0 {
        "No events match all conditions".to_string()
    } else {
        format!("{matching_count} events match")
    }
}
