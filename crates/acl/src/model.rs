use std::fmt;

use serde_derive::{Deserialize, Serialize};

use crate::permission::Permission;

/// Whether a subject is a user or a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
  User,
  Role,
}

impl fmt::Display for SubjectKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SubjectKind::User => write!(f, "user"),
      SubjectKind::Role => write!(f, "role"),
    }
  }
}

/// How a resource node combines its own ACLs with what its ancestors
/// contributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InheritMode {
  /// Pass the ancestor's effective mask through unchanged.
  Inherit,
  /// Union this node's allow bits onto the ancestor mask.
  Merge,
  /// Replace the ancestor mask outright with this node's allow bits.
  Override,
}

impl Default for InheritMode {
  fn default() -> Self {
    InheritMode::Merge
  }
}

/// Coarse resource type; `Dir` for interior nodes created implicitly by
/// `define`, freely chosen otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
  Dir,
  Generic(String),
}

impl Default for ResourceType {
  fn default() -> Self {
    ResourceType::Generic("GENERIC".to_string())
  }
}

/// A node in the resource tree, addressed by its full, separator-joined
/// path from a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
  pub id: String,
  pub name: String,
  pub parent_id: Option<String>,
  pub inherit_mode: InheritMode,
  pub resource_type: ResourceType,
}

impl ResourceNode {
  pub fn new(id: impl Into<String>, name: impl Into<String>, parent_id: Option<String>) -> Self {
    ResourceNode {
      id: id.into(),
      name: name.into(),
      parent_id,
      inherit_mode: InheritMode::Override,
      resource_type: ResourceType::default(),
    }
  }
}

/// A role: a named node in the role-inheritance DAG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id: String,
  pub name: String,
  pub parent_role_ids: Vec<String>,
}

impl Role {
  pub fn new(id: impl Into<String>) -> Self {
    let id = id.into();
    Role {
      name: id.clone(),
      id,
      parent_role_ids: Vec::new(),
    }
  }
}

/// A user: direct role memberships only, inherited roles are resolved by
/// `expand_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id: String,
  pub name: String,
  pub role_ids: Vec<String>,
}

impl User {
  pub fn new(id: impl Into<String>) -> Self {
    let id = id.into();
    User {
      name: id.clone(),
      id,
      role_ids: Vec::new(),
    }
  }
}

/// A precondition on another `(subject, resource)`'s effective mask that
/// must hold for the owning `AclEntry` to contribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclDependency {
  pub subject_kind: SubjectKind,
  pub subject_id: String,
  pub resource_id: String,
  pub required_mask: Permission,
}

/// A single allow/deny rule binding a subject to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
  pub subject_kind: SubjectKind,
  pub subject_id: String,
  pub resource_id: String,
  pub allow_mask: Permission,
  pub deny_mask: Permission,
  pub dependencies: Vec<AclDependency>,
}

impl AclEntry {
  pub fn new(subject_kind: SubjectKind, subject_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
    AclEntry {
      subject_kind,
      subject_id: subject_id.into(),
      resource_id: resource_id.into(),
      allow_mask: Permission::empty(),
      deny_mask: Permission::empty(),
      dependencies: Vec::new(),
    }
  }
}

/// A named rung in a `Track`'s promotion ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackLevel {
  pub role_id: String,
  pub level_name: String,
}

/// An ordered list of roles modelling a promotion ladder. Evaluation-neutral:
/// nothing in the evaluator consults a `Track`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
  pub id: String,
  pub name: String,
  pub levels: Vec<TrackLevel>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn subject_kind_display() {
    assert_eq!(SubjectKind::User.to_string(), "user");
    assert_eq!(SubjectKind::Role.to_string(), "role");
  }

  #[test]
  fn inherit_mode_default_is_merge() {
    assert_eq!(InheritMode::default(), InheritMode::Merge);
  }

  #[test]
  fn resource_node_default_is_override() {
    let node = ResourceNode::new("a.b", "b", Some("a".to_string()));
    assert_eq!(node.inherit_mode, InheritMode::Override);
  }

  #[test]
  fn acl_entry_starts_empty() {
    let entry = AclEntry::new(SubjectKind::User, "u1", "a.b");
    assert_eq!(entry.allow_mask, Permission::empty());
    assert_eq!(entry.deny_mask, Permission::empty());
    assert!(entry.dependencies.is_empty());
  }
}
