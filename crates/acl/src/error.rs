use std::fmt;

use aclcore_digraph::GraphError;

use crate::model::SubjectKind;
use crate::permission::Permission;

/// Errors surfaced to callers of the evaluator, executor and store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
  /// No resource exists at the given path.
  ResourceNotFound(String),
  /// The executor lacks the required bits on the resource (or its parent).
  PermissionDenied {
    subject: String,
    required: Permission,
    resource: String,
  },
  /// A chmod-style `op` character wasn't one of `=`, `+`, `-`.
  InvalidOp(String),
  /// A chmod-style expression didn't match the parse grammar.
  InvalidMaskExpression(String),
  /// A cycle was found while resolving ACL dependencies; lists the
  /// `(subject_kind, subject_id, resource_id)` keys on the cycle, in
  /// the order they were first visited.
  DependencyCycle(Vec<(SubjectKind, String, String)>),
  /// `depend` targeted a `(subject, resource)` with no primary ACL.
  AclMissing { subject: String, resource: String },
  /// Persisted state failed to deserialize (bad JSON, wrong shape).
  Deserialize(String),
}

impl fmt::Display for AccessError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AccessError::ResourceNotFound(path) => write!(f, "resource not found: '{}'", path),
      AccessError::PermissionDenied {
        subject,
        required,
        resource,
      } => write!(
        f,
        "subject '{}' lacks {} on '{}'",
        subject, required, resource
      ),
      AccessError::InvalidOp(op) => write!(f, "invalid chmod op: '{}'", op),
      AccessError::InvalidMaskExpression(expr) => {
        write!(f, "invalid mask expression: '{}'", expr)
      }
      AccessError::DependencyCycle(chain) => {
        write!(f, "dependency cycle detected: ")?;
        let rendered: Vec<String> = chain
          .iter()
          .map(|(kind, sid, rid)| format!("{}:{}@{}", kind, sid, rid))
          .collect();
        write!(f, "{}", rendered.join(" -> "))
      }
      AccessError::AclMissing { subject, resource } => {
        write!(f, "no primary ACL for '{}' on '{}'", subject, resource)
      }
      AccessError::Deserialize(msg) => write!(f, "failed to deserialize persisted state: {}", msg),
    }
  }
}

impl std::error::Error for AccessError {}

impl From<GraphError> for AccessError {
  fn from(err: GraphError) -> Self {
    match err {
      GraphError::VertexOutOfRange { .. } => AccessError::ResourceNotFound(err.to_string()),
      GraphError::UnknownSymbol(symbol) => AccessError::ResourceNotFound(symbol),
    }
  }
}

impl From<serde_json::Error> for AccessError {
  fn from(err: serde_json::Error) -> Self {
    AccessError::Deserialize(err.to_string())
  }
}

pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_resource_not_found() {
    let err = AccessError::ResourceNotFound("foo.bar".to_string());
    assert_eq!(err.to_string(), "resource not found: 'foo.bar'");
  }

  #[test]
  fn display_permission_denied() {
    let err = AccessError::PermissionDenied {
      subject: "u1".to_string(),
      required: Permission::VISIT,
      resource: "foo".to_string(),
    };
    assert!(err.to_string().contains("u1"));
    assert!(err.to_string().contains("foo"));
  }

  #[test]
  fn display_dependency_cycle() {
    let err = AccessError::DependencyCycle(vec![
      (SubjectKind::User, "u".to_string(), "a".to_string()),
      (SubjectKind::User, "u".to_string(), "b".to_string()),
    ]);
    let rendered = err.to_string();
    assert!(rendered.starts_with("dependency cycle detected: "));
    assert!(rendered.contains("user:u@a"));
    assert!(rendered.contains("->"));
  }

  #[test]
  fn graph_error_converts() {
    let err: AccessError = GraphError::UnknownSymbol("x".to_string()).into();
    assert!(matches!(err, AccessError::ResourceNotFound(_)));
  }

  #[test]
  fn serde_error_converts_to_deserialize_variant() {
    let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
    let err: AccessError = parse_err.into();
    assert!(matches!(err, AccessError::Deserialize(_)));
  }
}
