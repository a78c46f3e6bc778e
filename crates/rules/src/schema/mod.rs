//! Rule schema types with serde deserialization.
//!
//! Rules come from the `event_linter_rules` table (JSON rows) or from YAML
//! files for offline checks. Both use the same shape:
//! - `LinterRule`: identity, severity, category, status, message template
//! - `Condition`: field path, operator, literal value, optional `compare_to`
//! - `Operator`: closed operator vocabulary with a fail-closed fallback

mod condition;
mod operator;
mod rule;

pub use condition::*;
pub use operator::*;
pub use rule::*;

use serde::{Deserialize, Deserializer};

/// Nullable columns fall back to the type's default instead of failing the row.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests;
