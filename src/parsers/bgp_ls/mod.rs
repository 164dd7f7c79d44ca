/*!
BGP-LS input side.

- `record`: the classified Node/Link/Prefix records the topology builder consumes.
- `gobgp_json`: classification of GoBGP `ListPath` dumps into records.
- `source`: async record sources (snapshot files, in-memory fixtures).
*/

pub mod gobgp_json;
pub mod record;
pub mod source;

pub use record::{Attributes, LinkLsa, LsaRecord, NodeLsa, PrefixLsa, RecordKind};
pub use source::{LsdbSource, SnapshotConfig, SnapshotFileSource, SnapshotFormat, SourceError};
