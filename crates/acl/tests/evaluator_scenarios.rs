use aclcore::{
  AclDependency, AccessError, Evaluator, InheritMode, InMemoryStore, Permission, Role, Store, StrategyEngine, SubjectKind, User,
};

fn user(store: &InMemoryStore, id: &str) -> User {
  store.get_user(id).unwrap()
}

/// S2. Deny masks allow: `assign(u, "a", allow=7, deny=2)` nets VISIT|AVAILABLE.
#[test]
fn s2_deny_masks_allow() {
  let mut store = InMemoryStore::new();
  store.define("a", None, None);
  store.add_user(User::new("u"));
  store.assign(SubjectKind::User, "u", "a", Permission::all(), Permission::MODIFY);

  let evaluator = Evaluator::new(&store);
  let strategies: StrategyEngine<()> = StrategyEngine::new();
  let mask = evaluator.effective_permissions(&user(&store, "u"), "a", None, &strategies).unwrap();

  assert_eq!(mask, Permission::VISIT | Permission::AVAILABLE);
}

/// S3. Ancestor OVERRIDE wipes: `x` MERGE with a grant, `x.y` OVERRIDE with none.
#[test]
fn s3_ancestor_override_wipes_inherited_grant() {
  let mut store = InMemoryStore::new();
  store.define("x", Some(InheritMode::Merge), None);
  store.define("x.y", Some(InheritMode::Override), None);
  store.add_user(User::new("u"));
  store.assign(SubjectKind::User, "u", "x", Permission::all(), Permission::empty());

  let evaluator = Evaluator::new(&store);
  let strategies: StrategyEngine<()> = StrategyEngine::new();
  let u = user(&store, "u");

  let x_mask = evaluator.effective_permissions(&u, "x", None, &strategies).unwrap();
  let y_mask = evaluator.effective_permissions(&u, "x.y", None, &strategies).unwrap();

  assert_eq!(x_mask, Permission::all());
  assert_eq!(y_mask, Permission::empty());
}

/// S4. Strategy chain: adds MODIFY iff `ctx == "owner"`.
#[test]
fn s4_strategy_chain_is_context_gated() {
  let mut store = InMemoryStore::new();
  store.define("a", None, None);
  store.add_user(User::new("u"));

  let mut strategies: StrategyEngine<&'static str> = StrategyEngine::new();
  strategies.register_strategy(|_, _, ctx, mask, _| {
    if ctx == Some(&"owner") {
      Ok(mask | Permission::MODIFY)
    } else {
      Ok(mask)
    }
  });

  let evaluator = Evaluator::new(&store);
  let u = user(&store, "u");

  let owner_mask = evaluator
    .effective_permissions(&u, "a", Some(&"owner"), &strategies)
    .unwrap();
  assert_eq!(owner_mask, Permission::MODIFY);

  let other_mask = evaluator
    .effective_permissions(&u, "a", Some(&"someone-else"), &strategies)
    .unwrap();
  assert_eq!(other_mask, Permission::empty());
}

/// S5. Dependency gate: unmet dependency zeroes the depending ACL's
/// contribution; raising the dependency's mask lets it through.
#[test]
fn s5_dependency_gate() {
  let mut store = InMemoryStore::new();
  store.define("p", None, None);
  store.define("q", None, None);
  store.add_user(User::new("u"));
  store.assign(SubjectKind::User, "u", "p", Permission::all(), Permission::empty());
  store.assign(SubjectKind::User, "u", "q", Permission::AVAILABLE, Permission::empty());
  store
    .depend(
      SubjectKind::User,
      "u",
      "p",
      AclDependency {
        subject_kind: SubjectKind::User,
        subject_id: "u".to_string(),
        resource_id: "q".to_string(),
        required_mask: Permission::VISIT,
      },
    )
    .unwrap();

  let strategies: StrategyEngine<()> = StrategyEngine::new();
  let u = user(&store, "u");

  let unmet_mask = Evaluator::new(&store)
    .effective_permissions(&u, "p", None, &strategies)
    .unwrap();
  assert_eq!(unmet_mask, Permission::empty());

  store
    .update_acl(SubjectKind::User, "u", "q", Permission::VISIT, Permission::empty())
    .unwrap();
  let met_mask = Evaluator::new(&store)
    .effective_permissions(&u, "p", None, &strategies)
    .unwrap();
  assert_eq!(met_mask, Permission::all());
}

/// S7. Cycle detection: two ACLs that depend on each other raise
/// `DependencyCycle` naming both keys.
#[test]
fn s7_cycle_detection() {
  let mut store = InMemoryStore::new();
  store.define("a", None, None);
  store.define("b", None, None);
  store.add_user(User::new("u"));
  store.assign(SubjectKind::User, "u", "a", Permission::all(), Permission::empty());
  store.assign(SubjectKind::User, "u", "b", Permission::all(), Permission::empty());
  store
    .depend(
      SubjectKind::User,
      "u",
      "a",
      AclDependency {
        subject_kind: SubjectKind::User,
        subject_id: "u".to_string(),
        resource_id: "b".to_string(),
        required_mask: Permission::VISIT,
      },
    )
    .unwrap();
  store
    .depend(
      SubjectKind::User,
      "u",
      "b",
      AclDependency {
        subject_kind: SubjectKind::User,
        subject_id: "u".to_string(),
        resource_id: "a".to_string(),
        required_mask: Permission::VISIT,
      },
    )
    .unwrap();

  let evaluator = Evaluator::new(&store);
  let strategies: StrategyEngine<()> = StrategyEngine::new();
  let u = user(&store, "u");

  let err = evaluator.effective_permissions(&u, "a", None, &strategies).unwrap_err();
  match err {
    AccessError::DependencyCycle(chain) => {
      let resources: Vec<&str> = chain.iter().map(|(_, _, r)| r.as_str()).collect();
      assert!(resources.contains(&"a"));
      assert!(resources.contains(&"b"));
    }
    other => panic!("expected DependencyCycle, got {other:?}"),
  }
}

/// Role inheritance feeds the same fold: a role three levels up a chain
/// still contributes its grant to a user that only holds the bottom role.
#[test]
fn transitive_role_grant_reaches_a_deep_user() {
  let mut store = InMemoryStore::new();
  store.define("shared", None, None);
  store.add_role(Role::new("viewer")).unwrap();
  store
    .add_role(Role {
      parent_role_ids: vec!["viewer".to_string()],
      ..Role::new("editor")
    })
    .unwrap();
  store
    .add_role(Role {
      parent_role_ids: vec!["editor".to_string()],
      ..Role::new("admin")
    })
    .unwrap();
  store.add_user(User {
    role_ids: vec!["admin".to_string()],
    ..User::new("u")
  });
  store.assign(SubjectKind::Role, "viewer", "shared", Permission::VISIT, Permission::empty());

  let evaluator = Evaluator::new(&store);
  let strategies: StrategyEngine<()> = StrategyEngine::new();
  let mask = evaluator
    .effective_permissions(&user(&store, "u"), "shared", None, &strategies)
    .unwrap();
  assert_eq!(mask, Permission::VISIT);
}
