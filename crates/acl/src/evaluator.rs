use std::collections::HashMap;

use crate::error::{AccessError, Result};
use crate::model::{AclEntry, InheritMode, SubjectKind, User};
use crate::permission::Permission;
use crate::store::Store;
use crate::strategy::{StrategyEngine, StrategyLookup};

type CacheKey = (SubjectKind, String, String);

/// Per-call evaluation state: a memo cache keyed by `(kind, subject_id,
/// resource_id)` and a visited stack for cycle detection. Both are
/// request-scoped — created empty at the top of `effective_permissions`
/// and discarded on return.
#[derive(Debug, Default)]
struct EvalState {
  cache: HashMap<CacheKey, Permission>,
  visited: Vec<CacheKey>,
}

/// Computes effective permission masks over a borrowed `Store`.
///
/// Holds no per-request state of its own — the cache and visited stack
/// live only inside one `effective_permissions`/`effective_permissions_for_role`
/// call, so the same `Evaluator` is freely reusable across concurrent
/// top-level calls (subject to the `Store`'s own synchronisation).
pub struct Evaluator<'s, S: Store> {
  store: &'s S,
}

impl<'s, S: Store> Evaluator<'s, S> {
  pub fn new(store: &'s S) -> Self {
    Evaluator { store }
  }

  /// `effective_permissions(user, resource, context)`: the base mask
  /// folded over the resource chain, then pushed through `strategies`
  /// (only reached for USER subjects, which this method always is).
  pub fn effective_permissions<Ctx>(
    &self,
    user: &User,
    resource_id: &str,
    context: Option<&Ctx>,
    strategies: &StrategyEngine<Ctx>,
  ) -> Result<Permission> {
    let mut state = EvalState::default();
    let mask = self.compute_mask(SubjectKind::User, &user.id, resource_id, context, &mut state)?;

    let resource = self.store.get_resource(resource_id)?;
    // `lookup` shares the base pass's cache (spec 4.6, service.py:114's
    // `permission_lookup(cache=cache)`) so a re-entrant lookup onto a key
    // already memoized short-circuits instead of re-walking it; only the
    // visited stack resets per call, since each lookup starts a new root.
    let mut lookup: Box<StrategyLookup<'_, Ctx>> = Box::new(|kind, sid, ctx| {
      state.visited.clear();
      self.compute_mask(kind, sid, resource_id, ctx, &mut state)
    });
    strategies.apply(user, &resource, context, mask, &mut *lookup)
  }

  /// Same fold, for a bare role subject; bypasses the strategy chain
  /// entirely, matching the source's only non-strategy call site.
  pub fn effective_permissions_for_role<Ctx>(
    &self,
    role_id: &str,
    resource_id: &str,
    context: Option<&Ctx>,
  ) -> Result<Permission> {
    let mut state = EvalState::default();
    self.compute_mask(SubjectKind::Role, role_id, resource_id, context, &mut state)
  }

  fn compute_mask<Ctx>(
    &self,
    kind: SubjectKind,
    subject_id: &str,
    resource_id: &str,
    ctx: Option<&Ctx>,
    state: &mut EvalState,
  ) -> Result<Permission> {
    let key: CacheKey = (kind, subject_id.to_string(), resource_id.to_string());
    if let Some(mask) = state.cache.get(&key) {
      #[cfg(feature = "logging")]
      log::debug!("compute_mask cache hit for {:?}:{} @ {}", kind, subject_id, resource_id);
      return Ok(*mask);
    }
    if state.visited.contains(&key) {
      let chain = state
        .visited
        .iter()
        .map(|(k, s, r)| (*k, s.clone(), r.clone()))
        .collect();
      #[cfg(feature = "logging")]
      log::debug!("dependency cycle detected at {:?}:{} @ {}", kind, subject_id, resource_id);
      return Err(AccessError::DependencyCycle(chain));
    }
    state.visited.push(key.clone());

    let relevant = self.relevant_subjects(kind, subject_id)?;
    let chain = self.store.get_resource_chain(resource_id)?;

    let mut eff = Permission::empty();
    for node in chain.into_iter().rev() {
      let mut node_allow = Permission::empty();
      let mut node_deny = Permission::empty();
      for acl in self.store.iter_acls_for_resource(&node.id) {
        if !relevant.contains(&(acl.subject_kind, acl.subject_id.clone())) {
          continue;
        }
        if !self.check_deps(&acl, ctx, state)? {
          continue;
        }
        node_allow |= acl.allow_mask;
        node_deny |= acl.deny_mask;
      }
      match node.inherit_mode {
        InheritMode::Merge => eff |= node_allow,
        InheritMode::Override => eff = node_allow,
        InheritMode::Inherit => {}
      }
      if !node_deny.is_empty() {
        eff &= !node_deny;
      }
    }

    #[cfg(feature = "logging")]
    log::debug!("compute_mask cache miss for {:?}:{} @ {} -> {}", kind, subject_id, resource_id, eff);
    state.cache.insert(key.clone(), eff);
    state.visited.pop();
    Ok(eff)
  }

  fn check_deps<Ctx>(&self, acl: &AclEntry, ctx: Option<&Ctx>, state: &mut EvalState) -> Result<bool> {
    for dep in &acl.dependencies {
      let dep_mask = self.compute_mask(dep.subject_kind, &dep.subject_id, &dep.resource_id, ctx, state)?;
      if (dep_mask & dep.required_mask) != dep.required_mask {
        return Ok(false);
      }
    }
    Ok(true)
  }

  /// `{(kind, subject_id)} ∪ {(ROLE, r) for r in expand_roles(...)}`.
  fn relevant_subjects(&self, kind: SubjectKind, subject_id: &str) -> Result<Vec<(SubjectKind, String)>> {
    let mut relevant = vec![(kind, subject_id.to_string())];
    let seeds = match kind {
      SubjectKind::User => self.store.get_user(subject_id)?.role_ids,
      SubjectKind::Role => vec![subject_id.to_string()],
    };
    for role in self.store.expand_roles(&seeds) {
      relevant.push((SubjectKind::Role, role));
    }
    Ok(relevant)
  }
}
