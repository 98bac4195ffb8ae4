use std::fmt;

/// Errors produced by the graph algorithms in this crate.
///
/// Kept separate from `aclcore`'s own error enum so this crate stays
/// usable on its own; `aclcore` converts this into its error type at
/// the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
  /// A vertex index was outside `0..vert_count`.
  VertexOutOfRange { vertex: usize, vert_count: usize },
  /// A symbol was looked up in a `DisymGraph` that never saw it added.
  UnknownSymbol(String),
}

impl fmt::Display for GraphError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GraphError::VertexOutOfRange { vertex, vert_count } => write!(
        f,
        "vertex {} is outside the defined range 0..{}",
        vertex, vert_count
      ),
      GraphError::UnknownSymbol(symbol) => write!(f, "unknown symbol '{}'", symbol),
    }
  }
}

impl std::error::Error for GraphError {}

pub type Result<T> = std::result::Result<T, GraphError>;
