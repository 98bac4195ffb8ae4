use crate::error::{GraphError, Result};

/// An index-based adjacency-list digraph.
///
/// Vertices are plain `usize` indices `0..vert_count`; edges are stored
/// sorted per-vertex so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digraph {
  adj_lists: Vec<Vec<usize>>,
  edge_count: usize,
  in_degree: Vec<usize>,
}

impl Digraph {
  /// Creates a digraph with `vert_count` isolated vertices.
  pub fn new(vert_count: usize) -> Self {
    Digraph {
      adj_lists: vec![Vec::new(); vert_count],
      edge_count: 0,
      in_degree: vec![0; vert_count],
    }
  }

  pub fn vert_count(&self) -> usize {
    self.adj_lists.len()
  }

  pub fn edge_count(&self) -> usize {
    self.edge_count
  }

  /// Appends a new, isolated vertex and returns its index.
  pub fn add_vertex(&mut self) -> usize {
    self.adj_lists.push(Vec::new());
    self.in_degree.push(0);
    self.adj_lists.len() - 1
  }

  pub fn validate_vertex(&self, v: usize) -> Result<()> {
    if v >= self.vert_count() {
      Err(GraphError::VertexOutOfRange {
        vertex: v,
        vert_count: self.vert_count(),
      })
    } else {
      Ok(())
    }
  }

  /// Adds a directed edge `v -> w`, keeping `v`'s adjacency list sorted.
  pub fn add_edge(&mut self, v: usize, w: usize) -> Result<&mut Self> {
    self.validate_vertex(v)?;
    self.validate_vertex(w)?;
    let list = &mut self.adj_lists[v];
    if let Err(pos) = list.binary_search(&w) {
      list.insert(pos, w);
      self.edge_count += 1;
      self.in_degree[w] += 1;
    }
    Ok(self)
  }

  pub fn adj(&self, v: usize) -> Result<&Vec<usize>> {
    self.validate_vertex(v)?;
    Ok(&self.adj_lists[v])
  }

  pub fn outdegree(&self, v: usize) -> Result<usize> {
    self.adj(v).map(|l| l.len())
  }

  pub fn indegree(&self, v: usize) -> Result<usize> {
    self.validate_vertex(v)?;
    Ok(self.in_degree[v])
  }

  /// Returns a new digraph with every edge reversed.
  pub fn reverse(&self) -> Self {
    let mut rev = Digraph::new(self.vert_count());
    for v in 0..self.vert_count() {
      for &w in &self.adj_lists[v] {
        rev.add_edge(w, v).expect("vertices already validated");
      }
    }
    rev
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn new_has_no_edges() {
    let g = Digraph::new(5);
    assert_eq!(g.vert_count(), 5);
    assert_eq!(g.edge_count(), 0);
  }

  #[test]
  fn add_edge_increments_counts() {
    let mut g = Digraph::new(3);
    g.add_edge(0, 1).unwrap();
    g.add_edge(0, 2).unwrap();
    assert_eq!(g.edge_count(), 2);
    assert_eq!(g.outdegree(0).unwrap(), 2);
    assert_eq!(g.indegree(1).unwrap(), 1);
    assert_eq!(g.indegree(2).unwrap(), 1);
  }

  #[test]
  fn add_edge_is_idempotent() {
    let mut g = Digraph::new(2);
    g.add_edge(0, 1).unwrap();
    g.add_edge(0, 1).unwrap();
    assert_eq!(g.edge_count(), 1);
  }

  #[test]
  fn adj_is_sorted() {
    let mut g = Digraph::new(4);
    g.add_edge(0, 3).unwrap();
    g.add_edge(0, 1).unwrap();
    g.add_edge(0, 2).unwrap();
    assert_eq!(g.adj(0).unwrap(), &vec![1, 2, 3]);
  }

  #[test]
  fn out_of_range_vertex_errors() {
    let g = Digraph::new(2);
    assert!(g.adj(5).is_err());
    assert!(matches!(
      g.adj(5),
      Err(GraphError::VertexOutOfRange {
        vertex: 5,
        vert_count: 2
      })
    ));
  }

  #[test]
  fn reverse_flips_edges() {
    let mut g = Digraph::new(3);
    g.add_edge(0, 1).unwrap();
    g.add_edge(1, 2).unwrap();
    let r = g.reverse();
    assert_eq!(r.adj(1).unwrap(), &vec![0]);
    assert_eq!(r.adj(2).unwrap(), &vec![1]);
    assert_eq!(r.edge_count(), g.edge_count());
  }

  #[test]
  fn add_vertex_grows_graph() {
    let mut g = Digraph::new(1);
    let idx = g.add_vertex();
    assert_eq!(idx, 1);
    assert_eq!(g.vert_count(), 2);
  }
}
