use crate::digraph::Digraph;

/// Determines whether a digraph has a directed cycle and, if so, finds one.
///
/// Based on the `DirectedCycle` implementation from *Algorithms, 4th
/// Edition* by Robert Sedgewick and Kevin Wayne: depth-first search
/// tracking an on-stack marker per vertex; a back-edge to a vertex still
/// on the stack means a cycle, reconstructed by walking `edge_to` back
/// from the near end to the far end.
pub struct DirectedCycle {
  marked: Vec<bool>,
  edge_to: Vec<Option<usize>>,
  on_stack: Vec<bool>,
  cycle: Option<Vec<usize>>,
}

impl DirectedCycle {
  pub fn new(g: &Digraph) -> Self {
    let vert_count = g.vert_count();
    let mut out = DirectedCycle {
      marked: vec![false; vert_count],
      on_stack: vec![false; vert_count],
      edge_to: vec![None; vert_count],
      cycle: None,
    };
    for v in 0..vert_count {
      if !out.marked[v] && out.cycle.is_none() {
        out.dfs(g, v);
      }
    }
    out
  }

  fn dfs(&mut self, g: &Digraph, v: usize) {
    self.on_stack[v] = true;
    self.marked[v] = true;

    if let Ok(adj) = g.adj(v) {
      for &w in adj {
        if self.cycle.is_some() {
          return;
        } else if !self.marked[w] {
          self.edge_to[w] = Some(v);
          self.dfs(g, w);
        } else if self.on_stack[w] {
          let mut cycle = Vec::new();
          let mut x = v;
          while x != w {
            cycle.push(x);
            x = self.edge_to[x].expect("on-stack vertex reached via an edge");
          }
          cycle.push(w);
          cycle.push(v);
          self.cycle = Some(cycle);
        }
      }
    }

    self.on_stack[v] = false;
  }

  pub fn has_cycle(&self) -> bool {
    self.cycle.is_some()
  }

  pub fn cycle(&self) -> Option<&[usize]> {
    self.cycle.as_deref()
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn detects_simple_cycle() {
    let mut g = Digraph::new(3);
    g.add_edge(0, 1).unwrap();
    g.add_edge(1, 2).unwrap();
    g.add_edge(2, 0).unwrap();

    let finder = DirectedCycle::new(&g);
    assert!(finder.has_cycle());
    let cycle = finder.cycle().unwrap();
    assert_eq!(cycle[0], cycle[cycle.len() - 1]);
  }

  #[test]
  fn dag_has_no_cycle() {
    let mut g = Digraph::new(3);
    g.add_edge(0, 1).unwrap();
    g.add_edge(1, 2).unwrap();

    let finder = DirectedCycle::new(&g);
    assert!(!finder.has_cycle());
    assert!(finder.cycle().is_none());
  }

  #[test]
  fn self_loop_is_a_cycle() {
    let mut g = Digraph::new(1);
    g.add_edge(0, 0).unwrap();
    assert!(DirectedCycle::new(&g).has_cycle());
  }

  #[test]
  fn diamond_shape_has_no_cycle() {
    let mut g = Digraph::new(4);
    g.add_edge(0, 1).unwrap();
    g.add_edge(0, 2).unwrap();
    g.add_edge(1, 3).unwrap();
    g.add_edge(2, 3).unwrap();
    assert!(!DirectedCycle::new(&g).has_cycle());
  }

  #[test]
  fn empty_graph_has_no_cycle() {
    let g = Digraph::new(0);
    assert!(!DirectedCycle::new(&g).has_cycle());
  }
}
