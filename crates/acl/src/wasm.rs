//! WebAssembly bindings for `aclcore`.
//!
//! Thin, data-shape-focused wrappers — mirroring the teacher's own wasm
//! surface area (`walrs_acl`/`walrs_rbac`'s `wasm.rs`) rather than a full
//! 1:1 mirror of the Rust API: permission parsing/formatting plus a
//! JSON-driven [`InMemoryStore`] constructor.

use wasm_bindgen::prelude::*;

use crate::permission::Permission;
use crate::persisted::PersistedState;
use crate::store::{InMemoryStore, Store};

/// Parses a chmod-style expression and returns its glyph rendering,
/// e.g. `parseExpr("d+v")` → `"v--"`.
#[wasm_bindgen(js_name = parseExpr)]
pub fn parse_expr(expr: &str) -> Result<String, JsValue> {
  let (mask, _, _) = Permission::parse(expr).map_err(|e| JsValue::from_str(&e.to_string()))?;
  Ok(mask.glyph())
}

/// Parses a bare flags string (digit, `*`, or `vma`/`rwx` sequence) and
/// returns its glyph rendering.
#[wasm_bindgen(js_name = parseFlags)]
pub fn parse_flags(flags: &str) -> Result<String, JsValue> {
  let mask = Permission::parse_flags(flags).map_err(|e| JsValue::from_str(&e.to_string()))?;
  Ok(mask.glyph())
}

/// JavaScript-compatible wrapper for [`InMemoryStore`].
#[wasm_bindgen]
pub struct JsStore {
  inner: InMemoryStore,
}

#[wasm_bindgen]
impl JsStore {
  /// Creates a new, empty store.
  #[wasm_bindgen(constructor)]
  pub fn new() -> Self {
    JsStore {
      inner: InMemoryStore::new(),
    }
  }

  /// Builds a store from the §6.3 persisted-state JSON shape.
  #[wasm_bindgen(js_name = fromJson)]
  pub fn from_json(json: &str) -> Result<JsStore, JsValue> {
    let state: PersistedState = serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("failed to parse JSON: {}", e)))?;
    let inner = InMemoryStore::load(state).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(JsStore { inner })
  }

  /// Serialises the store back to the §6.3 JSON shape.
  #[wasm_bindgen(js_name = toJson)]
  pub fn to_json(&self) -> Result<String, JsValue> {
    serde_json::to_string(&self.inner.to_persisted()).map_err(|e| JsValue::from_str(&format!("failed to serialize: {}", e)))
  }

  /// Glyph-rendered effective permission mask for `user` on `resource`,
  /// or `null` if the user or resource doesn't exist.
  #[wasm_bindgen(js_name = effectivePermissions)]
  pub fn effective_permissions(&self, user_id: &str, resource_id: &str) -> Option<String> {
    let user = self.inner.get_user(user_id).ok()?;
    let evaluator = crate::evaluator::Evaluator::new(&self.inner);
    let strategies: crate::strategy::StrategyEngine<()> = crate::strategy::StrategyEngine::new();
    evaluator
      .effective_permissions(&user, resource_id, None, &strategies)
      .ok()
      .map(|mask| mask.glyph())
  }

  /// `true` iff the resource id exists in the store.
  #[wasm_bindgen(js_name = hasResource)]
  pub fn has_resource(&self, resource_id: &str) -> bool {
    self.inner.resources.contains(resource_id)
  }

  /// Batch existence check over a JS array of resource ids, returning a
  /// parallel array of booleans.
  #[wasm_bindgen(js_name = hasResources)]
  pub fn has_resources(&self, resource_ids: Vec<JsValue>) -> Result<Vec<u8>, JsValue> {
    let ids: Vec<String> =
      serde_wasm_bindgen::from_value(JsValue::from(resource_ids)).map_err(|e| JsValue::from_str(&format!("failed to parse resource ids: {:?}", e)))?;
    Ok(ids.iter().map(|id| self.inner.resources.contains(id) as u8).collect())
  }
}

impl Default for JsStore {
  fn default() -> Self {
    JsStore::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_expr_renders_glyph() {
    assert_eq!(parse_expr("vma").unwrap(), "vma");
    assert_eq!(parse_expr("d+v").unwrap(), "v--");
  }

  #[test]
  fn parse_flags_rejects_bad_input() {
    assert!(parse_flags("q").is_err());
  }

  #[test]
  fn js_store_round_trips_json() {
    let mut store = InMemoryStore::new();
    store.define("a", None, None);
    let json = serde_json::to_string(&store.to_persisted()).unwrap();
    let js_store = JsStore::from_json(&json).unwrap();
    assert!(js_store.has_resource("a"));
  }
}
