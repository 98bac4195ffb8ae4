#![allow(dead_code)]

//! Role/resource permission evaluation engine: role graph, resource-tree
//! inheritance, ACL dependencies, strategy chain, chmod-style executor.
//!
//! The synchronous [`Store`]/[`Evaluator`]/[`Executor`] trio is the
//! feature-gate-free default surface. Enabling the `async` feature
//! additionally compiles [`async_support::AsyncStore`] and its
//! `AsyncEvaluator`/`AsyncExecutor` counterparts, built on `async-trait`,
//! mirroring every sync method one-to-one against the same plain-data
//! types and the same [`error::AccessError`].

pub mod acl_table;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod model;
pub mod persisted;
pub mod permission;
pub mod resource_tree;
pub mod role_graph;
pub mod store;
pub mod strategy;

#[cfg(feature = "async")]
pub mod async_support;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use acl_table::AclTable;
pub use config::Config;
pub use error::{AccessError, Result};
pub use evaluator::Evaluator;
pub use executor::{Executor, Pattern};
pub use model::{
  AclDependency, AclEntry, InheritMode, ResourceNode, ResourceType, Role, SubjectKind, Track, TrackLevel, User,
};
pub use permission::Permission;
pub use persisted::PersistedState;
pub use resource_tree::ResourceTree;
pub use role_graph::RoleGraph;
pub use store::{InMemoryStore, Store};
pub use strategy::{StrategyEngine, StrategyFn, StrategyLookup};

#[cfg(feature = "async")]
pub use async_support::{AsyncEvaluator, AsyncExecutor, AsyncStore};
