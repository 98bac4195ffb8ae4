//! Task-based counterpart to the synchronous [`Store`]/[`Evaluator`]/
//! [`Executor`] trio, gated behind the `async` feature.
//!
//! Every method mirrors its sync sibling one-to-one; the evaluator awaits
//! exactly at the points it would otherwise call into the [`Store`] — all
//! logic between those suspension points is the same pure fold over local
//! state. Both flavours share the same plain-data types and the same
//! [`AccessError`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::error::{AccessError, Result};
use crate::model::{AclDependency, AclEntry, InheritMode, ResourceNode, ResourceType, Role, SubjectKind, User};
use crate::permission::Permission;
use crate::store::{InMemoryStore, Store};
use crate::strategy::StrategyEngine;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The `async` mirror of [`Store`]. Every method signature matches its
/// sync counterpart save for the `async`/`.await`.
#[async_trait]
pub trait AsyncStore: Send + Sync {
  async fn get_resource(&self, id: &str) -> Result<ResourceNode>;
  async fn get_resource_chain(&self, id: &str) -> Result<Vec<ResourceNode>>;
  async fn glob_resources(&self, pattern: &str) -> Vec<ResourceNode>;
  async fn match_resources(&self, predicate: &(dyn Fn(&str) -> bool + Sync)) -> Vec<ResourceNode>;
  async fn iter_acls_for_resource(&self, resource_id: &str) -> Vec<AclEntry>;
  async fn get_primary_acl(&self, kind: SubjectKind, subject_id: &str, resource_id: &str) -> Option<AclEntry>;
  async fn get_user(&self, id: &str) -> Result<User>;
  async fn get_role(&self, id: &str) -> Option<Role>;
  async fn expand_roles(&self, seed_ids: &[String]) -> Vec<String>;

  async fn define(&self, path: &str, inherit_mode: Option<InheritMode>, resource_type: Option<ResourceType>) -> ResourceNode;
  async fn assign(&self, kind: SubjectKind, subject_id: &str, resource_id: &str, allow_mask: Permission, deny_mask: Permission) -> AclEntry;
  async fn update_acl(&self, kind: SubjectKind, subject_id: &str, resource_id: &str, allow_mask: Permission, deny_mask: Permission) -> Result<()>;
  async fn depend(&self, kind: SubjectKind, subject_id: &str, resource_id: &str, dependency: AclDependency) -> Result<()>;
  async fn inherit(&self, child_role: &str, parent_role: &str) -> Result<()>;
}

/// Adapts a synchronous [`Store`] to [`AsyncStore`] by running each call
/// to completion immediately; there is no real suspension to perform
/// against an in-memory backend, but the shape lets a genuinely async
/// backend (a network-backed Store) slot in behind the same trait.
pub struct AsyncStoreAdapter<S: Store + Send + Sync> {
  inner: tokio::sync::Mutex<S>,
}

impl<S: Store + Send + Sync> AsyncStoreAdapter<S> {
  pub fn new(store: S) -> Self {
    AsyncStoreAdapter {
      inner: tokio::sync::Mutex::new(store),
    }
  }

  pub async fn into_inner(self) -> S {
    self.inner.into_inner()
  }
}

#[async_trait]
impl<S: Store + Send + Sync> AsyncStore for AsyncStoreAdapter<S> {
  async fn get_resource(&self, id: &str) -> Result<ResourceNode> {
    self.inner.lock().await.get_resource(id)
  }

  async fn get_resource_chain(&self, id: &str) -> Result<Vec<ResourceNode>> {
    self.inner.lock().await.get_resource_chain(id)
  }

  async fn glob_resources(&self, pattern: &str) -> Vec<ResourceNode> {
    self.inner.lock().await.glob_resources(pattern)
  }

  async fn match_resources(&self, predicate: &(dyn Fn(&str) -> bool + Sync)) -> Vec<ResourceNode> {
    self.inner.lock().await.match_resources(predicate)
  }

  async fn iter_acls_for_resource(&self, resource_id: &str) -> Vec<AclEntry> {
    self.inner.lock().await.iter_acls_for_resource(resource_id)
  }

  async fn get_primary_acl(&self, kind: SubjectKind, subject_id: &str, resource_id: &str) -> Option<AclEntry> {
    self.inner.lock().await.get_primary_acl(kind, subject_id, resource_id)
  }

  async fn get_user(&self, id: &str) -> Result<User> {
    self.inner.lock().await.get_user(id)
  }

  async fn get_role(&self, id: &str) -> Option<Role> {
    self.inner.lock().await.get_role(id)
  }

  async fn expand_roles(&self, seed_ids: &[String]) -> Vec<String> {
    self.inner.lock().await.expand_roles(seed_ids)
  }

  async fn define(&self, path: &str, inherit_mode: Option<InheritMode>, resource_type: Option<ResourceType>) -> ResourceNode {
    self.inner.lock().await.define(path, inherit_mode, resource_type)
  }

  async fn assign(&self, kind: SubjectKind, subject_id: &str, resource_id: &str, allow_mask: Permission, deny_mask: Permission) -> AclEntry {
    self.inner.lock().await.assign(kind, subject_id, resource_id, allow_mask, deny_mask)
  }

  async fn update_acl(&self, kind: SubjectKind, subject_id: &str, resource_id: &str, allow_mask: Permission, deny_mask: Permission) -> Result<()> {
    self.inner.lock().await.update_acl(kind, subject_id, resource_id, allow_mask, deny_mask)
  }

  async fn depend(&self, kind: SubjectKind, subject_id: &str, resource_id: &str, dependency: AclDependency) -> Result<()> {
    self.inner.lock().await.depend(kind, subject_id, resource_id, dependency)
  }

  async fn inherit(&self, child_role: &str, parent_role: &str) -> Result<()> {
    self.inner.lock().await.inherit(child_role, parent_role)
  }
}

impl From<InMemoryStore> for AsyncStoreAdapter<InMemoryStore> {
  fn from(store: InMemoryStore) -> Self {
    AsyncStoreAdapter::new(store)
  }
}

type CacheKey = (SubjectKind, String, String);

#[derive(Debug, Default)]
struct EvalState {
  cache: HashMap<CacheKey, Permission>,
  visited: Vec<CacheKey>,
}

/// The `async` mirror of [`crate::evaluator::Evaluator`]: same memo
/// cache/visited-stack discipline, same per-node fold, only the calls
/// into the `Store` are awaited.
pub struct AsyncEvaluator<'s, S: AsyncStore> {
  store: &'s S,
}

impl<'s, S: AsyncStore> AsyncEvaluator<'s, S> {
  pub fn new(store: &'s S) -> Self {
    AsyncEvaluator { store }
  }

  pub async fn effective_permissions<Ctx: Sync>(
    &self,
    user: &User,
    resource_id: &str,
    context: Option<&Ctx>,
    strategies: &StrategyEngine<Ctx>,
  ) -> Result<Permission> {
    let mut state = EvalState::default();
    let mask = self
      .compute_mask(SubjectKind::User, user.id.clone(), resource_id.to_string(), context, &mut state)
      .await?;

    let resource = self.store.get_resource(resource_id).await?;
    if strategies.is_empty() {
      return Ok(mask);
    }
    // Strategies are synchronous transforms; `lookup` re-enters the async
    // fold sharing the base pass's cache (so a key already memoized, e.g.
    // one on a dependency cycle, short-circuits instead of recursing) with
    // only the visited stack reset per call. Bridging the `.await` back
    // into this `FnMut` goes through `block_on_local`, which hands the
    // thread back to the runtime instead of spinning, so a task holding a
    // contended `Store` lock elsewhere can still make progress.
    let mut lookup = |kind: SubjectKind, sid: &str, ctx: Option<&Ctx>| -> Result<Permission> {
      state.visited.clear();
      block_on_local(self.compute_mask(kind, sid.to_string(), resource_id.to_string(), ctx, &mut state))
    };
    strategies.apply(user, &resource, context, mask, &mut lookup)
  }

  pub async fn effective_permissions_for_role<Ctx: Sync>(
    &self,
    role_id: &str,
    resource_id: &str,
    context: Option<&Ctx>,
  ) -> Result<Permission> {
    let mut state = EvalState::default();
    self
      .compute_mask(SubjectKind::Role, role_id.to_string(), resource_id.to_string(), context, &mut state)
      .await
  }

  fn compute_mask<'a, Ctx: Sync + 'a>(
    &'a self,
    kind: SubjectKind,
    subject_id: String,
    resource_id: String,
    ctx: Option<&'a Ctx>,
    state: &'a mut EvalState,
  ) -> BoxFuture<'a, Result<Permission>> {
    Box::pin(async move {
      let key: CacheKey = (kind, subject_id.clone(), resource_id.clone());
      if let Some(mask) = state.cache.get(&key) {
        return Ok(*mask);
      }
      if state.visited.contains(&key) {
        let chain = state
          .visited
          .iter()
          .map(|(k, s, r)| (*k, s.clone(), r.clone()))
          .collect();
        return Err(AccessError::DependencyCycle(chain));
      }
      state.visited.push(key.clone());

      let relevant = self.relevant_subjects(kind, &subject_id).await?;
      let chain = self.store.get_resource_chain(&resource_id).await?;

      let mut eff = Permission::empty();
      for node in chain.into_iter().rev() {
        let mut node_allow = Permission::empty();
        let mut node_deny = Permission::empty();
        for acl in self.store.iter_acls_for_resource(&node.id).await {
          if !relevant.contains(&(acl.subject_kind, acl.subject_id.clone())) {
            continue;
          }
          if !self.check_deps(&acl, ctx, state).await? {
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

      state.cache.insert(key.clone(), eff);
      state.visited.pop();
      Ok(eff)
    })
  }

  fn check_deps<'a, Ctx: Sync + 'a>(
    &'a self,
    acl: &'a AclEntry,
    ctx: Option<&'a Ctx>,
    state: &'a mut EvalState,
  ) -> BoxFuture<'a, Result<bool>> {
    Box::pin(async move {
      for dep in &acl.dependencies {
        let dep_mask = self
          .compute_mask(dep.subject_kind, dep.subject_id.clone(), dep.resource_id.clone(), ctx, state)
          .await?;
        if (dep_mask & dep.required_mask) != dep.required_mask {
          return Ok(false);
        }
      }
      Ok(true)
    })
  }

  async fn relevant_subjects(&self, kind: SubjectKind, subject_id: &str) -> Result<Vec<(SubjectKind, String)>> {
    let mut relevant = vec![(kind, subject_id.to_string())];
    let seeds = match kind {
      SubjectKind::User => self.store.get_user(subject_id).await?.role_ids,
      SubjectKind::Role => vec![subject_id.to_string()],
    };
    for role in self.store.expand_roles(&seeds).await {
      relevant.push((SubjectKind::Role, role));
    }
    Ok(relevant)
  }
}

/// Bridges the synchronous strategy `lookup` callback back into the async
/// fold. `block_in_place` moves this task off its worker thread for the
/// duration of the call, so the thread stops driving this task and the
/// runtime can schedule whatever task holds the `Store` lock `fut` is
/// waiting on; `Handle::block_on` then drives `fut` on the freed thread.
/// Requires a multi-threaded runtime, same as any other `block_in_place`
/// user — there is no way to synchronously await from inside a plain
/// `FnMut` on a current-thread runtime without risking the single worker
/// thread deadlocking against itself.
fn block_on_local<T>(fut: impl Future<Output = T>) -> T {
  tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut))
}

/// The `async` mirror of [`crate::executor::Executor`]: root-tier and
/// executor-tier operations over an [`AsyncStore`], gating with an
/// [`AsyncEvaluator`].
pub struct AsyncExecutor<S: AsyncStore, Ctx = ()> {
  pub store: S,
  pub strategies: StrategyEngine<Ctx>,
}

impl<S: AsyncStore, Ctx: Sync> AsyncExecutor<S, Ctx> {
  pub fn new(store: S) -> Self {
    AsyncExecutor {
      store,
      strategies: StrategyEngine::new(),
    }
  }

  async fn mask_for_user(&self, user: &User, resource_id: &str, context: Option<&Ctx>) -> Result<Permission> {
    AsyncEvaluator::new(&self.store)
      .effective_permissions(user, resource_id, context, &self.strategies)
      .await
  }

  pub async fn suget(&self, subject: &User, path: &str, missing_ok: bool, context: Option<&Ctx>) -> Result<Option<Permission>> {
    if self.store.get_resource(path).await.is_err() {
      return if missing_ok { Ok(None) } else { Err(AccessError::ResourceNotFound(path.to_string())) };
    }
    Ok(Some(self.mask_for_user(subject, path, context).await?))
  }

  pub async fn get(&self, executor: &User, path: &str, missing_ok: bool, context: Option<&Ctx>) -> Result<Option<Permission>> {
    if self.store.get_resource(path).await.is_err() {
      return if missing_ok { Ok(None) } else { Err(AccessError::ResourceNotFound(path.to_string())) };
    }
    let self_mask = self.mask_for_user(executor, path, context).await?;
    if !self_mask.contains(Permission::VISIT) {
      return Err(AccessError::PermissionDenied {
        subject: executor.id.clone(),
        required: Permission::VISIT,
        resource: path.to_string(),
      });
    }
    Ok(Some(self_mask))
  }

  pub async fn test(&self, subject: &User, path: &str, required: Permission, missing_ok: bool, context: Option<&Ctx>) -> Result<bool> {
    let mask = match self.suget(subject, path, missing_ok, context).await? {
      Some(mask) => mask,
      None => Permission::VISIT | Permission::AVAILABLE,
    };
    Ok((mask & required) == required)
  }

  pub async fn suset(
    &self,
    target: SubjectKind,
    target_id: &str,
    resource_ids: &[String],
    mask: Permission,
    op: char,
    deny: bool,
    missing_ok: bool,
  ) -> Result<()> {
    for resource_id in resource_ids {
      if self.store.get_resource(resource_id).await.is_err() {
        if missing_ok {
          self.store.define(resource_id, None, None).await;
        } else {
          return Err(AccessError::ResourceNotFound(resource_id.clone()));
        }
      }
      self.apply_mutation(target, target_id, resource_id, mask, op, deny).await?;
    }
    Ok(())
  }

  pub async fn set(
    &self,
    executor: &User,
    target: SubjectKind,
    target_id: &str,
    resource_ids: &[String],
    mask: Permission,
    op: char,
    deny: bool,
    missing_ok: bool,
    context: Option<&Ctx>,
  ) -> Result<()> {
    const GATE: Permission = Permission::VISIT.union(Permission::MODIFY).union(Permission::AVAILABLE);

    for resource_id in resource_ids {
      let node = match self.store.get_resource(resource_id).await {
        Ok(node) => node,
        Err(_) if missing_ok => continue,
        Err(err) => return Err(err),
      };
      if let Some(parent_id) = node.parent_id.clone() {
        let parent_mask = self.mask_for_user(executor, &parent_id, context).await?;
        if (parent_mask & GATE) != GATE {
          return Err(AccessError::PermissionDenied {
            subject: executor.id.clone(),
            required: GATE,
            resource: parent_id,
          });
        }
      }
      let self_mask = self.mask_for_user(executor, resource_id, context).await?;
      if !self_mask.contains(Permission::MODIFY) {
        continue;
      }
      self.apply_mutation(target, target_id, resource_id, mask, op, deny).await?;
    }
    Ok(())
  }

  async fn apply_mutation(&self, target: SubjectKind, target_id: &str, resource_id: &str, mask: Permission, op: char, deny: bool) -> Result<()> {
    let existing = self.store.get_primary_acl(target, target_id, resource_id).await;
    let (old_allow, old_deny) = match &existing {
      Some(acl) => (acl.allow_mask, acl.deny_mask),
      None => (Permission::empty(), Permission::empty()),
    };
    let old_side = if deny { old_deny } else { old_allow };
    let new_mask = Permission::apply_op(old_side, mask, op)?;

    if existing.is_none() {
      let (allow, deny_mask) = if deny { (Permission::empty(), new_mask) } else { (new_mask, Permission::empty()) };
      self.store.assign(target, target_id, resource_id, allow, deny_mask).await;
    } else {
      let (allow, deny_mask) = if deny { (old_allow, new_mask) } else { (new_mask, old_deny) };
      self.store.update_acl(target, target_id, resource_id, allow, deny_mask).await?;
    }
    Ok(())
  }

  pub async fn depend(&self, target: SubjectKind, target_id: &str, target_resource_id: &str, dependency: AclDependency) -> Result<()> {
    self.store.depend(target, target_id, target_resource_id, dependency).await
  }

  pub async fn chmod(&self, target: SubjectKind, target_id: &str, resource_ids: &[String], expr: &str, missing_ok: bool) -> Result<()> {
    let (mask, op, deny) = Permission::parse(expr)?;
    self.suset(target, target_id, resource_ids, mask, op, deny, missing_ok).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::Role;
  use crate::store::InMemoryStore;

  fn adapter_with_tree() -> AsyncStoreAdapter<InMemoryStore> {
    let mut store = InMemoryStore::new();
    store.define("foo.bar.baz", None, None);
    store.add_role(Role::new("admin")).unwrap();
    store.add_user(User {
      role_ids: vec!["admin".to_string()],
      ..User::new("u")
    });
    AsyncStoreAdapter::new(store)
  }

  #[tokio::test]
  async fn basic_grant_via_role_matches_sync_scenario() {
    let adapter = adapter_with_tree();
    let exec: AsyncExecutor<_, ()> = AsyncExecutor::new(adapter);
    exec
      .suset(
        SubjectKind::Role,
        "admin",
        &["foo.bar.baz".to_string()],
        Permission::all(),
        '=',
        false,
        false,
      )
      .await
      .unwrap();
    let u = exec.store.get_user("u").await.unwrap();
    assert!(exec.test(&u, "foo.bar.baz", Permission::VISIT, false, None).await.unwrap());
    assert!(exec.test(&u, "foo.bar.baz", Permission::all(), false, None).await.unwrap());
  }

  #[tokio::test]
  async fn deny_masks_allow() {
    let adapter = adapter_with_tree();
    let exec: AsyncExecutor<_, ()> = AsyncExecutor::new(adapter);
    exec
      .suset(SubjectKind::User, "u", &["foo.bar.baz".to_string()], Permission::all(), '=', false, false)
      .await
      .unwrap();
    exec
      .suset(SubjectKind::User, "u", &["foo.bar.baz".to_string()], Permission::MODIFY, '=', true, false)
      .await
      .unwrap();
    let u = exec.store.get_user("u").await.unwrap();
    let mask = exec.suget(&u, "foo.bar.baz", false, None).await.unwrap().unwrap();
    assert_eq!(mask, Permission::VISIT | Permission::AVAILABLE);
  }

  #[tokio::test]
  async fn dependency_cycle_is_detected() {
    let mut store = InMemoryStore::new();
    store.define("a", None, None);
    store.define("a.b", None, None);
    store.add_user(User::new("u1"));
    store.assign(SubjectKind::User, "u1", "a", Permission::all(), Permission::empty());
    store.assign(SubjectKind::User, "u1", "a.b", Permission::all(), Permission::empty());
    store
      .depend(
        SubjectKind::User,
        "u1",
        "a",
        AclDependency {
          subject_kind: SubjectKind::User,
          subject_id: "u1".to_string(),
          resource_id: "a.b".to_string(),
          required_mask: Permission::VISIT,
        },
      )
      .unwrap();
    store
      .depend(
        SubjectKind::User,
        "u1",
        "a.b",
        AclDependency {
          subject_kind: SubjectKind::User,
          subject_id: "u1".to_string(),
          resource_id: "a".to_string(),
          required_mask: Permission::VISIT,
        },
      )
      .unwrap();

    let adapter = AsyncStoreAdapter::new(store);
    let evaluator = AsyncEvaluator::new(&adapter);
    let user = adapter.inner.lock().await.get_user("u1").unwrap();
    let strategies: StrategyEngine<()> = StrategyEngine::new();
    let err = evaluator.effective_permissions(&user, "a.b", None, &strategies).await.unwrap_err();
    assert!(matches!(err, AccessError::DependencyCycle(_)));
  }
}
