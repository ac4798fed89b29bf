//! Partition pruning for tablet-sharded analytical tables.
//!
//! Rows of a table are distributed across tablets by hash bucketing on zero
//! or more column groups and range bucketing on an ordered column prefix.
//! Given a scan's predicates and primary-key bounds, [`PartitionPruner`]
//! computes the minimal set of encoded partition-key intervals the scan must
//! visit, then acts as a cursor over those intervals as tablets report
//! completion.
//!
//! ```
//! use arrow_schema::DataType;
//! use tessera::{
//!     partition::schema::{HashDimension, PartitionSchema},
//!     ColumnPredicate, PartitionPruner, ScanSpec, SchemaBuilder, Value,
//! };
//!
//! let schema = SchemaBuilder::new()
//!     .key_column("host", DataType::Utf8)
//!     .key_column("metric", DataType::Utf8)
//!     .build()
//!     .unwrap();
//! let partition_schema = PartitionSchema::new(
//!     &schema,
//!     vec![HashDimension {
//!         column_ids: vec![schema.column_id(0)],
//!         num_buckets: 8,
//!         seed: 0,
//!     }],
//!     vec![],
//! )
//! .unwrap();
//!
//! let mut scan = ScanSpec::new();
//! scan.add_predicate("host", ColumnPredicate::equality(Value::from("web-01")));
//!
//! let mut pruner = PartitionPruner::new();
//! pruner.init(&schema, &partition_schema, &scan);
//! assert_eq!(pruner.num_ranges_remaining(), 1);
//! ```

mod logging;

pub mod key;
pub mod partition;
pub mod predicate;
pub mod scan_spec;
pub mod schema;
pub mod value;

pub use key::EncodedKey;
pub use partition::{pruner::PartitionPruner, Partition};
pub use predicate::ColumnPredicate;
pub use scan_spec::ScanSpec;
pub use schema::{ColumnId, ColumnSchema, Schema, SchemaBuilder};
pub use value::Value;
