use serde_derive::{Deserialize, Serialize};

use crate::permission::Permission;

/// Process-wide configuration. Defaults are read-only; callers may
/// supply their own at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// The path separator used to split/join resource ids (default `.`).
  pub node_separator: String,
  /// Default mask for ancestor directories auto-created by `define`.
  pub default_dir_mask: Permission,
  /// Default mask assumed by `test` for a missing leaf when `missing_ok`.
  pub default_file_mask: Permission,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      node_separator: ".".to_string(),
      default_dir_mask: Permission::all(),
      default_file_mask: Permission::VISIT | Permission::MODIFY,
    }
  }
}
