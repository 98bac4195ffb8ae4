use std::collections::HashMap;

use aclcore_digraph::{DirectedCycle, DisymGraph};

use crate::error::{AccessError, Result};
use crate::model::Role;

/// The role-inheritance DAG plus the `Role` records themselves.
///
/// Edges run child -> parent (`add_parent(child, parent)`), matching
/// `Role.parent_role_ids`; `expand_roles` walks them to a transitive
/// closure.
#[derive(Debug, Clone, Default)]
pub struct RoleGraph {
  roles: HashMap<String, Role>,
  edges: DisymGraph,
}

impl RoleGraph {
  pub fn new() -> Self {
    RoleGraph::default()
  }

  pub fn get(&self, id: &str) -> Option<&Role> {
    self.roles.get(id)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.roles.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.roles.len()
  }

  pub fn is_empty(&self) -> bool {
    self.roles.is_empty()
  }

  /// All role records, for snapshotting into §6.3's persisted shape.
  /// Unordered (backed by a `HashMap`); a loader restoring parent/child
  /// edges doesn't need insertion order since `add_role` only requires
  /// declared parents to resolve, not ancestors-before-descendants.
  pub fn roles(&self) -> impl Iterator<Item = &Role> {
    self.roles.values()
  }

  /// Adds (or replaces) a role record and wires up edges to the parents
  /// it already lists in `parent_role_ids`.
  ///
  /// Rejects the role outright if doing so would immediately close a
  /// cycle reachable from one of its declared parents back to itself —
  /// the cheap, insertion-time half of cycle handling described in the
  /// design notes. This does not replace the evaluator's own
  /// visited-stack guard (`expand_roles` below still terminates safely
  /// on any cycle that slips in through a bulk loader).
  pub fn add_role(&mut self, role: Role) -> Result<&mut Self> {
    self.edges.add_vertex(&role.id);
    for parent in &role.parent_role_ids {
      self.edges.add_vertex(parent);
    }
    // Probe in a scratch copy so a rejected role doesn't leave partial edges.
    let mut probe = self.edges.clone();
    for parent in &role.parent_role_ids {
      probe.add_edge(&role.id, &[parent.as_str()])?;
    }
    let cycle_finder = DirectedCycle::new(probe.graph());
    if let Some(cycle) = cycle_finder.cycle() {
      let chain = cycle
        .iter()
        .filter_map(|&idx| probe.name(idx))
        .map(|name| (crate::model::SubjectKind::Role, name.to_string(), name.to_string()))
        .collect();
      return Err(AccessError::DependencyCycle(chain));
    }
    self.edges = probe;
    self.roles.insert(role.id.clone(), role);
    Ok(self)
  }

  /// Depth-first closure over `parent_role_ids`, starting from `seed_ids`.
  /// Visited-guarded so it terminates even if a cycle reached this graph
  /// through a path that bypassed `add_role`'s own check (e.g. a bulk
  /// loader that populated `roles` directly).
  pub fn expand_roles(&self, seed_ids: &[String]) -> Vec<String> {
    let mut result = Vec::new();
    let mut visited = std::collections::HashSet::new();
    let mut stack: Vec<String> = seed_ids.to_vec();

    while let Some(rid) = stack.pop() {
      if !visited.insert(rid.clone()) {
        continue;
      }
      let Some(role) = self.roles.get(&rid) else {
        continue;
      };
      result.push(rid.clone());
      for parent in &role.parent_role_ids {
        if !visited.contains(parent) {
          stack.push(parent.clone());
        }
      }
    }
    result
  }
}
