//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use dirdb_core::Id;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating well-formed identifiers.
pub fn id_strategy() -> impl Strategy<Value = Id> {
    any::<[u8; 8]>().prop_map(Id::from_entropy)
}

/// Strategy for generating valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_-]{0,31}")
        .expect("Invalid regex")
        .prop_filter("Collection name must be valid", |s| {
            dirdb_core::is_valid_collection_name(s)
        })
}

/// Strategy for generating arbitrary JSON values.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON numbers are finite", |f| f.is_finite())
            .prop_map(Value::from),
        ".{0,32}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,12}", inner, 0..8)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for generating serialized JSON documents.
pub fn json_payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    json_value_strategy().prop_map(|v| serde_json::to_vec(&v).expect("Value always serializes"))
}

/// A single document operation.
#[derive(Debug, Clone)]
pub enum DocumentOperation {
    /// Create a document
    Create {
        /// Document payload
        data: Vec<u8>,
    },
    /// Update the `n`-th live document (modulo the live count)
    Update {
        /// Index into live documents
        index: usize,
        /// New payload
        data: Vec<u8>,
    },
    /// Delete the `n`-th live document (modulo the live count)
    Delete {
        /// Index into live documents
        index: usize,
    },
    /// Read the `n`-th live document (modulo the live count)
    Read {
        /// Index into live documents
        index: usize,
    },
}

/// Strategy for generating document operations.
pub fn document_operation_strategy() -> impl Strategy<Value = DocumentOperation> {
    prop_oneof![
        3 => json_payload_strategy().prop_map(|data| DocumentOperation::Create { data }),
        2 => (any::<usize>(), json_payload_strategy())
            .prop_map(|(index, data)| DocumentOperation::Update { index, data }),
        1 => any::<usize>().prop_map(|index| DocumentOperation::Delete { index }),
        2 => any::<usize>().prop_map(|index| DocumentOperation::Read { index }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<DocumentOperation>> {
    prop::collection::vec(document_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
