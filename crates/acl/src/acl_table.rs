use crate::error::{AccessError, Result};
use crate::model::{AclDependency, AclEntry, SubjectKind};
use crate::permission::Permission;

/// Allow/deny rules per `(subject, resource)`, in insertion order.
///
/// An entry is *primary* iff it is the first (by insertion order) with a
/// matching `(subject_kind, subject_id, resource_id)`; there can be at
/// most one primary per key.
#[derive(Debug, Clone, Default)]
pub struct AclTable {
  entries: Vec<AclEntry>,
}

impl AclTable {
  pub fn new() -> Self {
    AclTable::default()
  }

  /// All entries for a resource, in insertion order.
  pub fn iter_acls_for_resource(&self, resource_id: &str) -> impl Iterator<Item = &AclEntry> {
    self.entries.iter().filter(move |e| e.resource_id == resource_id)
  }

  /// Every entry across every resource, in insertion order, for
  /// snapshotting into §6.3's persisted shape.
  pub fn all_entries(&self) -> impl Iterator<Item = &AclEntry> {
    self.entries.iter()
  }

  pub fn get_primary_acl(&self, kind: SubjectKind, subject_id: &str, resource_id: &str) -> Option<&AclEntry> {
    self
      .entries
      .iter()
      .find(|e| e.subject_kind == kind && e.subject_id == subject_id && e.resource_id == resource_id)
  }

  fn get_primary_acl_mut(&mut self, kind: SubjectKind, subject_id: &str, resource_id: &str) -> Option<&mut AclEntry> {
    self
      .entries
      .iter_mut()
      .find(|e| e.subject_kind == kind && e.subject_id == subject_id && e.resource_id == resource_id)
  }

  /// Appends an already-constructed entry as-is, for loading persisted
  /// state (§6.3) where entries (and their inline `dependencies[]`) came
  /// straight from the serialised shape. Does not check for an existing
  /// primary — callers loading a well-formed dump only supply one.
  pub fn insert_raw(&mut self, entry: AclEntry) {
    self.entries.push(entry);
  }

  /// Creates the primary entry for `(kind, subject_id, resource_id)`. A
  /// no-op if one already exists — callers that want to overwrite an
  /// existing primary should use `update_acl`.
  pub fn assign(
    &mut self,
    kind: SubjectKind,
    subject_id: impl Into<String>,
    resource_id: impl Into<String>,
    allow_mask: Permission,
    deny_mask: Permission,
  ) -> &AclEntry {
    let subject_id = subject_id.into();
    let resource_id = resource_id.into();
    let existing_idx = self
      .entries
      .iter()
      .position(|e| e.subject_kind == kind && e.subject_id == subject_id && e.resource_id == resource_id);
    if let Some(idx) = existing_idx {
      return &self.entries[idx];
    }
    let mut entry = AclEntry::new(kind, subject_id, resource_id);
    entry.allow_mask = allow_mask;
    entry.deny_mask = deny_mask;
    self.entries.push(entry);
    self.entries.last().expect("just pushed")
  }

  /// Updates the allow/deny masks of an existing primary entry in place.
  pub fn update_acl(
    &mut self,
    kind: SubjectKind,
    subject_id: &str,
    resource_id: &str,
    allow_mask: Permission,
    deny_mask: Permission,
  ) -> Result<()> {
    let entry = self
      .get_primary_acl_mut(kind, subject_id, resource_id)
      .ok_or_else(|| AccessError::AclMissing {
        subject: subject_id.to_string(),
        resource: resource_id.to_string(),
      })?;
    entry.allow_mask = allow_mask;
    entry.deny_mask = deny_mask;
    Ok(())
  }

  /// Appends a dependency onto an existing primary entry.
  pub fn depend(
    &mut self,
    kind: SubjectKind,
    subject_id: &str,
    resource_id: &str,
    dependency: AclDependency,
  ) -> Result<()> {
    let entry = self
      .get_primary_acl_mut(kind, subject_id, resource_id)
      .ok_or_else(|| AccessError::AclMissing {
        subject: subject_id.to_string(),
        resource: resource_id.to_string(),
      })?;
    entry.dependencies.push(dependency);
    Ok(())
  }
}
