//! Small, dependency-free directed-graph algorithms shared by `aclcore`'s
//! role graph and resource tree: an index-based digraph, a string-keyed
//! symbol table over it, directed-cycle detection, and DFS reachability.

pub mod digraph;
pub mod directed_cycle;
pub mod disymgraph;
pub mod error;
pub mod reachability;

pub use digraph::Digraph;
pub use directed_cycle::DirectedCycle;
pub use disymgraph::DisymGraph;
pub use error::{GraphError, Result};
pub use reachability::DirectedPathsDfs;
