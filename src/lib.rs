//! Facade over the `aclcore` workspace, mirroring the teacher's
//! feature-per-member pattern so a consumer can depend on this crate
//! alone and pull in only what it needs.

#[cfg(feature = "acl")]
pub use aclcore;

#[cfg(feature = "digraph")]
pub use aclcore_digraph;
