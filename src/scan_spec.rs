//! Scan specifications handed to the planner.
//!
//! A [`ScanSpec`] is assumed to be already optimized: predicates simplified
//! to at most one per column, key bounds consistent, and the short-circuit
//! flag set when the predicates imply an empty result.

use std::collections::HashMap;

use crate::{key::EncodedKey, predicate::ColumnPredicate};

/// Predicates and bounds describing one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSpec {
    predicates: HashMap<String, ColumnPredicate>,
    lower_bound_key: Option<EncodedKey>,
    exclusive_upper_bound_key: Option<EncodedKey>,
    lower_bound_partition_key: Vec<u8>,
    exclusive_upper_bound_partition_key: Vec<u8>,
    can_short_circuit: bool,
}

impl ScanSpec {
    /// An unconstrained scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the predicate for a column, replacing any previous one.
    pub fn add_predicate(&mut self, column: impl Into<String>, predicate: ColumnPredicate) {
        self.predicates.insert(column.into(), predicate);
    }

    /// Predicates by column name.
    pub fn predicates(&self) -> &HashMap<String, ColumnPredicate> {
        &self.predicates
    }

    /// Set the inclusive primary-key lower bound.
    pub fn set_lower_bound_key(&mut self, key: EncodedKey) {
        self.lower_bound_key = Some(key);
    }

    /// The inclusive primary-key lower bound, if any.
    pub fn lower_bound_key(&self) -> Option<&EncodedKey> {
        self.lower_bound_key.as_ref()
    }

    /// Set the exclusive primary-key upper bound.
    pub fn set_exclusive_upper_bound_key(&mut self, key: EncodedKey) {
        self.exclusive_upper_bound_key = Some(key);
    }

    /// The exclusive primary-key upper bound, if any.
    pub fn exclusive_upper_bound_key(&self) -> Option<&EncodedKey> {
        self.exclusive_upper_bound_key.as_ref()
    }

    /// Set the inclusive partition-key lower bound.
    pub fn set_lower_bound_partition_key(&mut self, key: Vec<u8>) {
        self.lower_bound_partition_key = key;
    }

    /// The inclusive partition-key lower bound; empty means unbounded.
    pub fn lower_bound_partition_key(&self) -> &[u8] {
        &self.lower_bound_partition_key
    }

    /// Set the exclusive partition-key upper bound.
    pub fn set_exclusive_upper_bound_partition_key(&mut self, key: Vec<u8>) {
        self.exclusive_upper_bound_partition_key = key;
    }

    /// The exclusive partition-key upper bound; empty means unbounded.
    pub fn exclusive_upper_bound_partition_key(&self) -> &[u8] {
        &self.exclusive_upper_bound_partition_key
    }

    /// Mark the scan as provably empty.
    pub fn set_can_short_circuit(&mut self, value: bool) {
        self.can_short_circuit = value;
    }

    /// Whether the predicates imply an empty result.
    pub fn can_short_circuit(&self) -> bool {
        self.can_short_circuit
    }
}
