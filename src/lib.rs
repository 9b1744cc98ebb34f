//! # tripledb - an in-process, immutable, versioned triple-store graph database
//!
//! tripledb organizes data as (subject, predicate, object) triples with
//! first-class temporal versioning. Clients assert and retract triples, then
//! query the graph with a pattern-and-join language that supports
//! conjunctions, disjunctions, negations, value bindings, filters,
//! aggregations, transitive traversal, and entity-shaped materialization.
//!
//! The database is immutable at the value level: every successful
//! transaction produces a new [`Database`] value sharing structure with its
//! predecessor, and prior snapshots remain queryable by transaction number
//! or wall-clock instant.
//!
//! ## Quick start
//!
//! ```rust
//! use tripledb::{Connection, Database, Graph, GraphFlavor, Triple};
//! use tripledb::value::{Keyword, Value};
//!
//! let conn = Connection::new(Database::empty(Graph::new(GraphFlavor::Simple)), 100_000);
//!
//! let alice = tripledb::node::new_node();
//! let result = conn
//!     .transact(|g, tx| {
//!         let triple = Triple::new(alice, Keyword::namespaced("person", "name"), "Alice");
//!         (g.add(triple.s.clone(), triple.p.clone(), triple.o.clone(), tx), vec![triple])
//!     })
//!     .unwrap();
//! assert_eq!(result.db_after.t, 1);
//! ```
//!
//! ## Architecture
//!
//! tripledb is layered bottom-up:
//! - **Value domain** (`value`, `triple`, `node`): the (s, p, o) data model.
//! - **Index layer** (`index`): the persistent, structurally-shared
//!   three-level map backing each index rotation.
//! - **Graph layer** (`graph`): the three rotationally-redundant indexes
//!   (SPO/POS/OSP), pattern resolution, and transitive traversal.
//! - **Query layer** (`query`): the join/query engine — AST, planner,
//!   sandboxed expression evaluation, execution, and projection.
//! - **Entity layer** (`entity`): nested-document materialization.
//! - **Connection layer** (`db`): versioned connections, transactional
//!   snapshots, point-in-time retrieval, and the connection registry.
//!
//! See `DESIGN.md` in the repository root for the grounding behind each
//! module's design choices.

pub mod db;
pub mod durable;
pub mod entity;
pub mod error;
pub mod graph;
pub mod index;
pub mod logging;
pub mod node;
pub mod query;
pub mod triple;
pub mod value;

pub use crate::db::{Config, Connection, ConnectionRegistry, Database, TransactionResult};
pub use crate::entity::{materialize_entity, resolve_ident, Doc};
pub use crate::error::{GraphError, Result};
pub use crate::graph::{Graph, GraphFlavor};
pub use crate::node::Node;
pub use crate::query::ast::Query;
pub use crate::query::{query, result_columns};
pub use crate::triple::Triple;
pub use crate::value::{Keyword, Value};
