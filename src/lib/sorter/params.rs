//! Sorter parameter mappings.
//!
//! Sorter options are a flat name-to-value mapping. Values are JSON scalars
//! or lists, which covers the mixed option tables external sorters declare
//! (floats, ints, bools, strings, lists, and nulls for "unset").

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, SpikesortError};

/// An ordered, flat mapping from option name to JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SorterParams(BTreeMap<String, Value>);

impl SorterParams {
    /// Creates an empty parameter mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of options in the mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an option with this name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// The value of an option, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Sets an option, replacing any previous value.
    pub fn insert<N: Into<String>>(&mut self, name: N, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Iterates over `(name, value)` pairs in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Returns these parameters with `overrides` applied on top.
    ///
    /// Every override name must already be declared in `self`; the caller's
    /// spelling is validated against the declared option table rather than
    /// silently accepting unknown names.
    ///
    /// # Errors
    /// Returns an error naming the first override that is not a declared
    /// option.
    pub fn merged_with(&self, overrides: &SorterParams) -> Result<SorterParams> {
        let mut merged = self.clone();
        for (name, value) in overrides.iter() {
            if !merged.contains(name) {
                return Err(SpikesortError::InvalidParameter {
                    parameter: name.clone(),
                    reason: "not a declared option for this sorter".to_string(),
                });
            }
            merged.insert(name.clone(), value.clone());
        }
        Ok(merged)
    }

    /// Parses a `NAME=VALUE` assignment, as taken on the command line.
    ///
    /// The value is parsed as JSON (`Th=[10,4]`, `nblocks=5`,
    /// `stable_mode=true`); anything that is not valid JSON is kept as a
    /// plain string (`preprocessing_function=kilosort2`).
    ///
    /// # Errors
    /// Returns an error if the assignment has no `=` or an empty name.
    pub fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
        let (name, raw) = assignment.split_once('=').ok_or_else(|| {
            SpikesortError::InvalidParameter {
                parameter: assignment.to_string(),
                reason: "expected NAME=VALUE".to_string(),
            }
        })?;
        if name.is_empty() {
            return Err(SpikesortError::InvalidParameter {
                parameter: assignment.to_string(),
                reason: "empty option name".to_string(),
            });
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok((name.to_string(), value))
    }
}

impl FromIterator<(String, Value)> for SorterParams {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SorterParams {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
