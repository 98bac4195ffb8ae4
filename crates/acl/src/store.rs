use crate::acl_table::AclTable;
use crate::config::Config;
use crate::error::{AccessError, Result};
use crate::model::{AclDependency, AclEntry, InheritMode, ResourceNode, ResourceType, Role, SubjectKind, Track, User};
use crate::resource_tree::ResourceTree;
use crate::role_graph::RoleGraph;

/// The abstract read/write surface the evaluator and executor consume.
///
/// Read methods return owned clones rather than borrows tied to `&self`:
/// this keeps the trait object-safe and lets the same method shapes work
/// for the `async` feature's `AsyncStore` counterpart, whose methods
/// can't return anything borrowed across an `.await`.
pub trait Store {
  fn get_resource(&self, id: &str) -> Result<ResourceNode>;
  fn get_resource_chain(&self, id: &str) -> Result<Vec<ResourceNode>>;
  fn glob_resources(&self, pattern: &str) -> Vec<ResourceNode>;
  fn match_resources(&self, predicate: &dyn Fn(&str) -> bool) -> Vec<ResourceNode>;
  fn iter_acls_for_resource(&self, resource_id: &str) -> Vec<AclEntry>;
  fn get_primary_acl(&self, kind: SubjectKind, subject_id: &str, resource_id: &str) -> Option<AclEntry>;
  fn get_user(&self, id: &str) -> Result<User>;
  fn get_role(&self, id: &str) -> Option<Role>;
  /// Depth-first transitive closure over `parent_role_ids`, starting
  /// from `seed_ids` (see `RoleGraph::expand_roles`).
  fn expand_roles(&self, seed_ids: &[String]) -> Vec<String>;

  fn define(
    &mut self,
    path: &str,
    inherit_mode: Option<InheritMode>,
    resource_type: Option<ResourceType>,
  ) -> ResourceNode;
  fn assign(
    &mut self,
    kind: SubjectKind,
    subject_id: &str,
    resource_id: &str,
    allow_mask: crate::permission::Permission,
    deny_mask: crate::permission::Permission,
  ) -> AclEntry;
  fn update_acl(
    &mut self,
    kind: SubjectKind,
    subject_id: &str,
    resource_id: &str,
    allow_mask: crate::permission::Permission,
    deny_mask: crate::permission::Permission,
  ) -> Result<()>;
  fn depend(&mut self, kind: SubjectKind, subject_id: &str, resource_id: &str, dependency: AclDependency) -> Result<()>;
  fn inherit(&mut self, child_role: &str, parent_role: &str) -> Result<()>;
}

/// A plain in-process `Store`: `HashMap`-backed, single-writer, no
/// transactions. Ships as the one concrete backend this crate provides,
/// sufficient to exercise the evaluator/executor and to serve consumers
/// who don't need a durable backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
  pub config: Config,
  pub resources: ResourceTree,
  pub roles: RoleGraph,
  pub users: std::collections::HashMap<String, User>,
  pub acls: AclTable,
  /// Ordered promotion ladders. Evaluation-neutral: nothing in the
  /// evaluator or executor reads this field.
  pub tracks: Vec<Track>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    InMemoryStore::default()
  }

  pub fn with_config(config: Config) -> Self {
    InMemoryStore {
      config,
      ..Default::default()
    }
  }

  pub fn add_user(&mut self, user: User) -> &mut Self {
    self.users.insert(user.id.clone(), user);
    self
  }

  pub fn add_role(&mut self, role: Role) -> Result<&mut Self> {
    self.roles.add_role(role)?;
    Ok(self)
  }
}

impl Store for InMemoryStore {
  fn get_resource(&self, id: &str) -> Result<ResourceNode> {
    self
      .resources
      .get(id)
      .cloned()
      .ok_or_else(|| AccessError::ResourceNotFound(id.to_string()))
  }

  fn get_resource_chain(&self, id: &str) -> Result<Vec<ResourceNode>> {
    let chain = self.resources.get_resource_chain(id);
    if chain.is_empty() {
      return Err(AccessError::ResourceNotFound(id.to_string()));
    }
    Ok(chain.into_iter().cloned().collect())
  }

  fn glob_resources(&self, pattern: &str) -> Vec<ResourceNode> {
    self.resources.glob_resources(pattern).into_iter().cloned().collect()
  }

  fn match_resources(&self, predicate: &dyn Fn(&str) -> bool) -> Vec<ResourceNode> {
    self
      .resources
      .match_resources(predicate)
      .into_iter()
      .cloned()
      .collect()
  }

  fn iter_acls_for_resource(&self, resource_id: &str) -> Vec<AclEntry> {
    self.acls.iter_acls_for_resource(resource_id).cloned().collect()
  }

  fn get_primary_acl(&self, kind: SubjectKind, subject_id: &str, resource_id: &str) -> Option<AclEntry> {
    self.acls.get_primary_acl(kind, subject_id, resource_id).cloned()
  }

  fn get_user(&self, id: &str) -> Result<User> {
    self
      .users
      .get(id)
      .cloned()
      .ok_or_else(|| AccessError::ResourceNotFound(id.to_string()))
  }

  fn get_role(&self, id: &str) -> Option<Role> {
    self.roles.get(id).cloned()
  }

  fn expand_roles(&self, seed_ids: &[String]) -> Vec<String> {
    self.roles.expand_roles(seed_ids)
  }

  fn define(
    &mut self,
    path: &str,
    inherit_mode: Option<InheritMode>,
    resource_type: Option<ResourceType>,
  ) -> ResourceNode {
    self
      .resources
      .define(&self.config.clone(), path, inherit_mode, resource_type)
      .clone()
  }

  fn assign(
    &mut self,
    kind: SubjectKind,
    subject_id: &str,
    resource_id: &str,
    allow_mask: crate::permission::Permission,
    deny_mask: crate::permission::Permission,
  ) -> AclEntry {
    self.acls.assign(kind, subject_id, resource_id, allow_mask, deny_mask).clone()
  }

  fn update_acl(
    &mut self,
    kind: SubjectKind,
    subject_id: &str,
    resource_id: &str,
    allow_mask: crate::permission::Permission,
    deny_mask: crate::permission::Permission,
  ) -> Result<()> {
    self.acls.update_acl(kind, subject_id, resource_id, allow_mask, deny_mask)
  }

  fn depend(&mut self, kind: SubjectKind, subject_id: &str, resource_id: &str, dependency: AclDependency) -> Result<()> {
    self.acls.depend(kind, subject_id, resource_id, dependency)
  }

  fn inherit(&mut self, child_role: &str, parent_role: &str) -> Result<()> {
    let mut role = self
      .roles
      .get(child_role)
      .cloned()
      .ok_or_else(|| AccessError::ResourceNotFound(child_role.to_string()))?;
    if !role.parent_role_ids.iter().any(|p| p == parent_role) {
      role.parent_role_ids.push(parent_role.to_string());
    }
    self.roles.add_role(role)?;
    Ok(())
  }
}
