/*!
Topology module

Turns a BGP-LS table into a `TopologyGraph`.

Structure:
- `builder`: `TopologyBuilder` and its `BuildConfig`; the three-pass LSDB-to-graph build.
- `error`: malformed-record and identity-collision types, plus the combined `TopologyError`.
- `source`: the async `TopologySource` trait and `LsdbTopology`, which pairs any
            `LsdbSource` with a builder.

Re-exports:
- `TopologyBuilder`, `BuildConfig`, `PseudonodePrecedence` and `build` for one-shot builds.
- `TopologySource`, `LsdbTopology`, `TopologyError` and `TopologyResult` for callers that
  fetch and build.
*/

pub mod builder;
pub mod error;
pub mod source;

pub use builder::{BuildConfig, PseudonodePrecedence, TopologyBuilder, build};
pub use error::{IdentityCollision, MalformedRecordError, TopologyError, TopologyResult};
pub use source::{LsdbTopology, TopologySource};
