use crate::error::Result;
use crate::model::{ResourceNode, SubjectKind, User};
use crate::permission::Permission;

/// The re-entrant lookup callback a strategy may call to compute the
/// effective mask of an arbitrary subject, with a fresh visited stack
/// but the evaluation's shared memo cache.
pub type StrategyLookup<'a, Ctx> = dyn FnMut(SubjectKind, &str, Option<&Ctx>) -> Result<Permission> + 'a;

/// `strategy(user, resource, context, current_mask, lookup) -> new_mask`.
pub type StrategyFn<Ctx> = dyn Fn(&User, &ResourceNode, Option<&Ctx>, Permission, &mut StrategyLookup<'_, Ctx>) -> Result<Permission>
  + Send
  + Sync;

/// An ordered chain of user-supplied mask transforms, applied in
/// registration order after the base evaluation. Only invoked when the
/// top-level subject is a `User` — role evaluations bypass the chain.
pub struct StrategyEngine<Ctx> {
  strategies: Vec<Box<StrategyFn<Ctx>>>,
}

impl<Ctx> Default for StrategyEngine<Ctx> {
  fn default() -> Self {
    StrategyEngine { strategies: Vec::new() }
  }
}

impl<Ctx> StrategyEngine<Ctx> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn register_strategy<F>(&mut self, strategy: F) -> &mut Self
  where
    F: Fn(&User, &ResourceNode, Option<&Ctx>, Permission, &mut StrategyLookup<'_, Ctx>) -> Result<Permission>
      + Send
      + Sync
      + 'static,
  {
    self.strategies.push(Box::new(strategy));
    self
  }

  pub fn len(&self) -> usize {
    self.strategies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.strategies.is_empty()
  }

  pub fn apply(
    &self,
    user: &User,
    resource: &ResourceNode,
    context: Option<&Ctx>,
    base_mask: Permission,
    lookup: &mut StrategyLookup<'_, Ctx>,
  ) -> Result<Permission> {
    let mut mask = base_mask;
    for strategy in &self.strategies {
      mask = strategy(user, resource, context, mask, lookup)?;
    }
    Ok(mask)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::InheritMode;

  fn dummy_resource() -> ResourceNode {
    ResourceNode::new("r", "r", None)
  }

  #[test]
  fn empty_engine_returns_base_mask() {
    let engine: StrategyEngine<()> = StrategyEngine::new();
    let user = User::new("u1");
    let resource = dummy_resource();
    let mut lookup = |_k: SubjectKind, _id: &str, _ctx: Option<&()>| Ok(Permission::empty());
    let result = engine
      .apply(&user, &resource, None, Permission::VISIT, &mut lookup)
      .unwrap();
    assert_eq!(result, Permission::VISIT);
  }

  #[test]
  fn strategies_run_in_registration_order() {
    let mut engine: StrategyEngine<()> = StrategyEngine::new();
    engine.register_strategy(|_, _, _, mask, _| Ok(mask | Permission::MODIFY));
    engine.register_strategy(|_, _, _, mask, _| Ok(mask | Permission::AVAILABLE));
    let user = User::new("u1");
    let resource = dummy_resource();
    let mut lookup = |_k: SubjectKind, _id: &str, _ctx: Option<&()>| Ok(Permission::empty());
    let result = engine
      .apply(&user, &resource, None, Permission::empty(), &mut lookup)
      .unwrap();
    assert_eq!(result, Permission::MODIFY | Permission::AVAILABLE);
  }

  #[test]
  fn strategy_can_use_context_to_gate_a_grant() {
    let mut engine: StrategyEngine<&'static str> = StrategyEngine::new();
    engine.register_strategy(|_, _, ctx, mask, _| {
      if ctx == Some(&"owner") {
        Ok(mask | Permission::MODIFY)
      } else {
        Ok(mask)
      }
    });
    let user = User::new("u1");
    let resource = dummy_resource();
    let mut lookup = |_k: SubjectKind, _id: &str, _ctx: Option<&&str>| Ok(Permission::empty());

    let owner_result = engine
      .apply(&user, &resource, Some(&"owner"), Permission::empty(), &mut lookup)
      .unwrap();
    assert_eq!(owner_result, Permission::MODIFY);

    let other_result = engine
      .apply(&user, &resource, Some(&"user"), Permission::empty(), &mut lookup)
      .unwrap();
    assert_eq!(other_result, Permission::empty());
  }

  #[test]
  fn strategy_can_call_lookup() {
    let mut engine: StrategyEngine<()> = StrategyEngine::new();
    engine.register_strategy(|_, _, ctx, mask, lookup| {
      let other = lookup(SubjectKind::User, "other", ctx)?;
      Ok(mask | other)
    });
    let user = User::new("u1");
    let resource = dummy_resource();
    let mut lookup = |_k: SubjectKind, id: &str, _ctx: Option<&()>| {
      if id == "other" {
        Ok(Permission::VISIT)
      } else {
        Ok(Permission::empty())
      }
    };
    let result = engine
      .apply(&user, &resource, None, Permission::empty(), &mut lookup)
      .unwrap();
    assert_eq!(result, Permission::VISIT);
  }

  #[test]
  fn inherit_mode_is_unused_here_but_resource_carries_it() {
    let resource = ResourceNode {
      inherit_mode: InheritMode::Inherit,
      ..dummy_resource()
    };
    assert_eq!(resource.inherit_mode, InheritMode::Inherit);
  }
}
