//! Department hierarchy
//!
//! Path resolution and tree shaping over flat department rows.

pub mod path;
pub mod tree;

pub use path::{
    resolve_path_index, resolve_paths, DepartmentNode, DepartmentRecord, PathResolver, Pathed,
    PATH_SEPARATOR,
};
pub use tree::{build_tree, build_tree_with_paths, to_options, DepartmentOption, TreeNode};
