use crate::digraph::Digraph;
use crate::error::Result;

/// A `Digraph` addressed by string symbols instead of raw indices.
///
/// Mirrors the vertex-indexed `Digraph` one-for-one through a small
/// symbol table; callers never see raw indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisymGraph {
  vertices: Vec<String>,
  graph: Digraph,
}

impl DisymGraph {
  pub fn new() -> Self {
    DisymGraph {
      vertices: Vec::new(),
      graph: Digraph::new(0),
    }
  }

  pub fn vert_count(&self) -> usize {
    self.graph.vert_count()
  }

  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  pub fn graph(&self) -> &Digraph {
    &self.graph
  }

  pub fn contains(&self, symbol: &str) -> bool {
    self.index(symbol).is_some()
  }

  pub fn index(&self, symbol: &str) -> Option<usize> {
    self.vertices.iter().position(|v| v == symbol)
  }

  pub fn name(&self, index: usize) -> Option<&str> {
    self.vertices.get(index).map(|s| s.as_str())
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.vertices.iter().map(|s| s.as_str())
  }

  /// Adds `symbol` if unseen, and returns its (possibly pre-existing) index.
  pub fn add_vertex(&mut self, symbol: &str) -> usize {
    if let Some(idx) = self.index(symbol) {
      return idx;
    }
    self.vertices.push(symbol.to_string());
    self.graph.add_vertex()
  }

  pub fn outdegree(&self, symbol: &str) -> Result<usize> {
    let idx = self.add_vertex_lookup(symbol);
    self.graph.outdegree(idx)
  }

  pub fn indegree(&self, symbol: &str) -> Result<usize> {
    let idx = self.add_vertex_lookup(symbol);
    self.graph.indegree(idx)
  }

  fn add_vertex_lookup(&self, symbol: &str) -> usize {
    self.index(symbol).unwrap_or(usize::MAX)
  }

  /// Returns the symbols adjacent to `symbol`, or `None` if `symbol` was
  /// never added.
  pub fn adj(&self, symbol: &str) -> Option<Vec<&str>> {
    let idx = self.index(symbol)?;
    let adj = self.graph.adj(idx).expect("index came from this graph");
    Some(adj.iter().map(|&i| self.vertices[i].as_str()).collect())
  }

  /// Adds `symbol -> weight` for every `weight` in `weights`, creating any
  /// vertex that hasn't been seen yet (including `symbol` itself).
  pub fn add_edge(&mut self, symbol: &str, weights: &[&str]) -> Result<&mut Self> {
    let v = self.add_vertex(symbol);
    for w in weights {
      let wi = self.add_vertex(w);
      self.graph.add_edge(v, wi)?;
    }
    Ok(self)
  }

  pub fn reverse(&self) -> Self {
    DisymGraph {
      vertices: self.vertices.clone(),
      graph: self.graph.reverse(),
    }
  }
}
