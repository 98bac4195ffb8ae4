use crate::error::{AccessError, Result};
use crate::evaluator::Evaluator;
use crate::model::{AclDependency, SubjectKind, User};
use crate::permission::Permission;
use crate::store::Store;
use crate::strategy::StrategyEngine;

/// Glob/predicate pattern forms accepted by the pattern-dispatching
/// operations (`set`, `suset`, `chmod`).
pub enum Pattern<'a> {
  Literal(&'a str),
  Glob(&'a str),
  Predicate(&'a dyn Fn(&str) -> bool),
}

impl<'a> Pattern<'a> {
  /// Treats a bare string as a glob automatically when it carries any of
  /// `*`, `?`, `[`, matching the source's own sniffing of path strings.
  pub fn from_path(path: &'a str) -> Self {
    if path.contains(['*', '?', '[']) {
      Pattern::Glob(path)
    } else {
      Pattern::Literal(path)
    }
  }
}

/// Root-tier (ungated) plus executor-tier (gated) operations over a
/// `Store`, using an `Evaluator` for permission questions.
pub struct Executor<S: Store, Ctx = ()> {
  pub store: S,
  pub strategies: StrategyEngine<Ctx>,
}

impl<S: Store, Ctx> Executor<S, Ctx> {
  pub fn new(store: S) -> Self {
    Executor {
      store,
      strategies: StrategyEngine::new(),
    }
  }

  fn resolve(&self, pattern: &Pattern<'_>) -> Vec<String> {
    match pattern {
      Pattern::Literal(path) => vec![path.to_string()],
      Pattern::Glob(glob) => self.store.glob_resources(glob).into_iter().map(|n| n.id).collect(),
      Pattern::Predicate(predicate) => self
        .store
        .match_resources(*predicate)
        .into_iter()
        .map(|n| n.id)
        .collect(),
    }
  }

  fn mask_for_user(&self, user: &User, resource_id: &str, context: Option<&Ctx>) -> Result<Permission> {
    Evaluator::new(&self.store).effective_permissions(user, resource_id, context, &self.strategies)
  }

  /// Root-tier read: no gating, used by `suget`/`test`.
  pub fn suget(&self, subject: &User, path: &str, missing_ok: bool, context: Option<&Ctx>) -> Result<Option<Permission>> {
    if self.store.get_resource(path).is_err() {
      return if missing_ok { Ok(None) } else { Err(AccessError::ResourceNotFound(path.to_string())) };
    }
    Ok(Some(self.mask_for_user(subject, path, context)?))
  }

  /// Executor-tier read: `executor` must hold VISIT on `path` itself.
  /// A deny anywhere on the ancestor chain already zeros VISIT in the
  /// computed mask, so no separate parent check is required.
  pub fn get(&self, executor: &User, path: &str, missing_ok: bool, context: Option<&Ctx>) -> Result<Option<Permission>> {
    if self.store.get_resource(path).is_err() {
      return if missing_ok { Ok(None) } else { Err(AccessError::ResourceNotFound(path.to_string())) };
    }
    let self_mask = self.mask_for_user(executor, path, context)?;
    if !self_mask.contains(Permission::VISIT) {
      return Err(AccessError::PermissionDenied {
        subject: executor.id.clone(),
        required: Permission::VISIT,
        resource: path.to_string(),
      });
    }
    Ok(Some(self_mask))
  }

  /// `test(subject, path, required, missing_ok, context)`: `suget` then
  /// compare. Absent-and-allowed resources default to `VISIT|AVAILABLE`.
  pub fn test(&self, subject: &User, path: &str, required: Permission, missing_ok: bool, context: Option<&Ctx>) -> Result<bool> {
    let mask = match self.suget(subject, path, missing_ok, context)? {
      Some(mask) => mask,
      None => Permission::VISIT | Permission::AVAILABLE,
    };
    Ok((mask & required) == required)
  }

  /// Root-tier write: no gating, creates resources when `missing_ok`.
  pub fn suset(
    &mut self,
    target: SubjectKind,
    target_id: &str,
    pattern: &Pattern<'_>,
    mask: Permission,
    op: char,
    deny: bool,
    missing_ok: bool,
  ) -> Result<()> {
    let resource_ids = self.resolve(pattern);
    for resource_id in resource_ids {
      if self.store.get_resource(&resource_id).is_err() {
        if missing_ok {
          self.store.define(&resource_id, None, None);
        } else {
          return Err(AccessError::ResourceNotFound(resource_id));
        }
      }
      self.apply_mutation(target, target_id, &resource_id, mask, op, deny)?;
    }
    Ok(())
  }

  /// Executor-tier write: gates on `executor`'s VISIT|MODIFY|AVAILABLE
  /// over each match's parent, and MODIFY over the match itself. A match
  /// failing the self-MODIFY check is silently skipped, not failed —
  /// pattern operations must not abort halfway through.
  pub fn set(
    &mut self,
    executor: &User,
    target: SubjectKind,
    target_id: &str,
    pattern: &Pattern<'_>,
    mask: Permission,
    op: char,
    deny: bool,
    missing_ok: bool,
    context: Option<&Ctx>,
  ) -> Result<()> {
    let resource_ids = self.resolve(pattern);
    const GATE: Permission = Permission::VISIT.union(Permission::MODIFY).union(Permission::AVAILABLE);

    for resource_id in resource_ids {
      let node = match self.store.get_resource(&resource_id) {
        Ok(node) => node,
        Err(_) if missing_ok => continue,
        Err(err) => return Err(err),
      };
      if let Some(parent_id) = node.parent_id.clone() {
        let parent_mask = self.mask_for_user(executor, &parent_id, context)?;
        if (parent_mask & GATE) != GATE {
          return Err(AccessError::PermissionDenied {
            subject: executor.id.clone(),
            required: GATE,
            resource: parent_id,
          });
        }
      }
      let self_mask = self.mask_for_user(executor, &resource_id, context)?;
      if !self_mask.contains(Permission::MODIFY) {
        #[cfg(feature = "logging")]
        log::warn!(
          "set: skipping '{}' for {:?}:{} — executor '{}' lacks MODIFY ({})",
          resource_id,
          target,
          target_id,
          executor.id,
          self_mask
        );
        continue;
      }
      self.apply_mutation(target, target_id, &resource_id, mask, op, deny)?;
    }
    Ok(())
  }

  fn apply_mutation(
    &mut self,
    target: SubjectKind,
    target_id: &str,
    resource_id: &str,
    mask: Permission,
    op: char,
    deny: bool,
  ) -> Result<()> {
    let existing = self.store.get_primary_acl(target, target_id, resource_id);
    let (old_allow, old_deny) = match &existing {
      Some(acl) => (acl.allow_mask, acl.deny_mask),
      None => (Permission::empty(), Permission::empty()),
    };
    let old_side = if deny { old_deny } else { old_allow };
    let new_mask = Permission::apply_op(old_side, mask, op)?;

    if existing.is_none() {
      let (allow, deny_mask) = if deny {
        (Permission::empty(), new_mask)
      } else {
        (new_mask, Permission::empty())
      };
      self.store.assign(target, target_id, resource_id, allow, deny_mask);
    } else {
      let (allow, deny_mask) = if deny { (old_allow, new_mask) } else { (new_mask, old_deny) };
      self.store.update_acl(target, target_id, resource_id, allow, deny_mask)?;
    }
    Ok(())
  }

  /// `depend(target_subject, target_rid, dep_subject, dep_rid, required)`:
  /// root tier, forwards to the store.
  pub fn depend(
    &mut self,
    target: SubjectKind,
    target_id: &str,
    target_resource_id: &str,
    dependency: AclDependency,
  ) -> Result<()> {
    self.store.depend(target, target_id, target_resource_id, dependency)
  }

  /// `chmod(subject, path_or_pattern, expr, missing_ok)`: parses `expr`
  /// with the `Permission::parse` grammar and forwards to `suset`. Root
  /// tier only; the gated equivalent is reached by combining
  /// `Permission::parse` with `set` directly.
  pub fn chmod(
    &mut self,
    target: SubjectKind,
    target_id: &str,
    pattern: &Pattern<'_>,
    expr: &str,
    missing_ok: bool,
  ) -> Result<()> {
    let (mask, op, deny) = Permission::parse(expr)?;
    self.suset(target, target_id, pattern, mask, op, deny, missing_ok)
  }
}
