use std::collections::HashMap;

use crate::config::Config;
use crate::model::{InheritMode, ResourceNode, ResourceType};

/// Shell-style `*`, `?`, `[...]` glob matching over a single string,
/// applied to the full resource id.
pub fn glob_match(pattern: &str, text: &str) -> bool {
  fn inner(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
      None => text.is_empty(),
      Some((b'*', rest)) => {
        inner(rest, text) || (!text.is_empty() && inner(pattern, &text[1..]))
      }
      Some((b'?', rest)) => !text.is_empty() && inner(rest, &text[1..]),
      Some((b'[', rest)) => {
        let close = match rest.iter().position(|&b| b == b']') {
          Some(i) => i,
          None => return false,
        };
        if text.is_empty() {
          return false;
        }
        let class = &rest[..close];
        let (negate, class) = match class.split_first() {
          Some((b'!', tail)) => (true, tail),
          _ => (false, class),
        };
        let matched = class_matches(class, text[0]);
        if matched != negate {
          inner(&rest[close + 1..], &text[1..])
        } else {
          false
        }
      }
      Some((&c, rest)) => !text.is_empty() && text[0] == c && inner(rest, &text[1..]),
    }
  }

  fn class_matches(class: &[u8], c: u8) -> bool {
    let mut i = 0;
    while i < class.len() {
      if i + 2 < class.len() && class[i + 1] == b'-' {
        if class[i] <= c && c <= class[i + 2] {
          return true;
        }
        i += 3;
      } else {
        if class[i] == c {
          return true;
        }
        i += 1;
      }
    }
    false
  }

  inner(pattern.as_bytes(), text.as_bytes())
}

/// The resource forest: id-addressed nodes with inherit-mode attributes.
///
/// Owned by a `Store` implementation; this type only manages the tree
/// shape and lookups, not ACLs.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
  nodes: HashMap<String, ResourceNode>,
  /// Insertion order, so `glob_resources`/`match_resources` are deterministic.
  order: Vec<String>,
}

impl ResourceTree {
  pub fn new() -> Self {
    ResourceTree::default()
  }

  pub fn get(&self, id: &str) -> Option<&ResourceNode> {
    self.nodes.get(id)
  }

  pub fn contains(&self, id: &str) -> bool {
    self.nodes.contains_key(id)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Inserts a fully-formed node as-is, for loading persisted state
  /// (§6.3) where `parent_id`/`inherit_mode`/`resource_type` already
  /// came from the serialised shape rather than `define`'s path-walking
  /// defaults. Callers are responsible for inserting ancestors first so
  /// `get_resource_chain` doesn't see a dangling `parent_id`.
  pub fn insert_raw(&mut self, node: ResourceNode) {
    if !self.nodes.contains_key(&node.id) {
      self.order.push(node.id.clone());
    }
    self.nodes.insert(node.id.clone(), node);
  }

  /// `define(path)`: normalises by stripping the separator, splitting on
  /// it, and walking segments; each missing ancestor is materialised as
  /// `type=DIR`/`MERGE`, the terminal uses the caller-supplied mode
  /// (default `OVERRIDE`) and type. Re-defining an existing terminal
  /// updates `inherit_mode` (if given) and `type`; a node re-encountered
  /// as an interior (because a longer path was defined through it) has
  /// its mode forced to `MERGE` and type forced to `DIR`.
  pub fn define(
    &mut self,
    config: &Config,
    path: &str,
    inherit_mode: Option<InheritMode>,
    resource_type: Option<ResourceType>,
  ) -> &ResourceNode {
    let sep = config.node_separator.as_str();
    let path = path.trim_matches(|c: char| sep.contains(c));
    let segments: Vec<&str> = path.split(sep).filter(|s| !s.is_empty()).collect();

    let mut parent_id: Option<String> = None;
    let mut built = String::new();
    let last = segments.len().saturating_sub(1);

    for (i, seg) in segments.iter().enumerate() {
      if !built.is_empty() {
        built.push_str(sep);
      }
      built.push_str(seg);
      let is_terminal = i == last;

      if let Some(existing) = self.nodes.get_mut(&built) {
        if is_terminal {
          if let Some(mode) = inherit_mode {
            existing.inherit_mode = mode;
          }
          if let Some(ref ty) = resource_type {
            existing.resource_type = ty.clone();
          }
        } else {
          existing.inherit_mode = InheritMode::Merge;
          existing.resource_type = ResourceType::Dir;
        }
      } else {
        let mut node = ResourceNode::new(built.clone(), seg.to_string(), parent_id.clone());
        if is_terminal {
          node.inherit_mode = inherit_mode.unwrap_or(InheritMode::Override);
          node.resource_type = resource_type.clone().unwrap_or_default();
        } else {
          node.inherit_mode = InheritMode::Merge;
          node.resource_type = ResourceType::Dir;
        }
        self.order.push(built.clone());
        self.nodes.insert(built.clone(), node);
      }

      parent_id = Some(built.clone());
    }

    self.nodes.get(&built).expect("just inserted or updated")
  }

  /// `get_resource_chain(id)`: `[self, parent, …, root]`.
  pub fn get_resource_chain(&self, id: &str) -> Vec<&ResourceNode> {
    let mut chain = Vec::new();
    let mut current = self.nodes.get(id);
    while let Some(node) = current {
      chain.push(node);
      current = node.parent_id.as_deref().and_then(|pid| self.nodes.get(pid));
    }
    chain
  }

  /// Shell-style `*`/`?`/`[...]` match over the full id, in insertion order.
  pub fn glob_resources(&self, pattern: &str) -> Vec<&ResourceNode> {
    self
      .order
      .iter()
      .filter_map(|id| self.nodes.get(id))
      .filter(|node| glob_match(pattern, &node.id))
      .collect()
  }

  /// All nodes in insertion order, for snapshotting into §6.3's
  /// persisted shape.
  pub fn nodes_in_order(&self) -> impl Iterator<Item = &ResourceNode> {
    self.order.iter().filter_map(|id| self.nodes.get(id))
  }

  /// Id-predicate filter, in insertion order.
  pub fn match_resources(&self, mut predicate: impl FnMut(&str) -> bool) -> Vec<&ResourceNode> {
    self
      .order
      .iter()
      .filter_map(|id| self.nodes.get(id))
      .filter(|node| predicate(&node.id))
      .collect()
  }
}
