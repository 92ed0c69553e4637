//! Department tree building
//!
//! Nests flat department rows under their parents and shapes the result for
//! cascading selection widgets.

use serde::Serialize;
use std::collections::HashMap;

use super::path::{resolve_path_index, DepartmentRecord};

/// Department tree node (used in API responses)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub record: T,
    pub path: String,
    pub children: Vec<TreeNode<T>>,
}

/// Option entry for cascader/select widgets
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DepartmentOption {
    pub value: i64,
    pub label: String,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DepartmentOption>,
}

/// Build a forest from flat rows
///
/// Rows whose parent is absent become roots. Children keep input order. Rows
/// only reachable through a parent cycle are hoisted to the top level at the
/// first cycle member encountered.
pub fn build_tree<T: DepartmentRecord>(rows: Vec<T>) -> Vec<TreeNode<T>> {
    let paths = resolve_path_index(&rows);
    build_tree_with_paths(rows, &paths)
}

/// Build a forest from `rows`, taking paths from an index resolved elsewhere
///
/// Used when the rows are a filtered subset and paths must still reflect the
/// full hierarchy.
pub fn build_tree_with_paths<T: DepartmentRecord>(
    rows: Vec<T>,
    paths: &HashMap<i64, String>,
) -> Vec<TreeNode<T>> {
    let position: HashMap<i64, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (row.id(), i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        match row.parent_id().and_then(|p| position.get(&p)) {
            Some(&parent) if parent != i => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    let mut slots: Vec<Option<T>> = rows.into_iter().map(Some).collect();
    let mut forest = Vec::with_capacity(roots.len());

    for root in roots {
        if let Some(node) = assemble(root, &mut slots, &children, paths) {
            forest.push(node);
        }
    }

    // Anything left is stranded on a cycle
    for i in 0..slots.len() {
        if let Some(node) = assemble(i, &mut slots, &children, paths) {
            forest.push(node);
        }
    }

    forest
}

/// Detach the subtree under `root` from `slots`
///
/// Rows are claimed top-down with an explicit stack, then attached to their
/// parents from the deepest claim back up, so depth costs no call frames.
fn assemble<T: DepartmentRecord>(
    root: usize,
    slots: &mut [Option<T>],
    children: &[Vec<usize>],
    paths: &HashMap<i64, String>,
) -> Option<TreeNode<T>> {
    let mut claimed: Vec<TreeNode<T>> = Vec::new();
    let mut parent_of: Vec<Option<usize>> = Vec::new();
    let mut stack: Vec<(usize, Option<usize>)> = vec![(root, None)];

    while let Some((index, parent)) = stack.pop() {
        let Some(record) = slots[index].take() else {
            continue;
        };
        let path = paths.get(&record.id()).cloned().unwrap_or_default();

        let at = claimed.len();
        claimed.push(TreeNode {
            record,
            path,
            children: Vec::new(),
        });
        parent_of.push(parent);
        stack.extend(children[index].iter().rev().map(|&child| (child, Some(at))));
    }

    // Every claim comes after its parent's, and siblings arrive last-first
    while let Some(mut node) = claimed.pop() {
        node.children.reverse();
        match parent_of.pop().flatten() {
            Some(parent) => claimed[parent].children.push(node),
            None => return Some(node),
        }
    }

    None
}

/// Convert a department tree into `{value, label, path, children}` options
pub fn to_options<T: DepartmentRecord>(tree: &[TreeNode<T>]) -> Vec<DepartmentOption> {
    let mut flat: Vec<DepartmentOption> = Vec::new();
    let mut parent_of: Vec<Option<usize>> = Vec::new();
    let mut stack: Vec<(&TreeNode<T>, Option<usize>)> =
        tree.iter().rev().map(|node| (node, None)).collect();

    while let Some((node, parent)) = stack.pop() {
        let at = flat.len();
        flat.push(DepartmentOption {
            value: node.record.id(),
            label: node.record.name().to_string(),
            path: node.path.clone(),
            children: Vec::new(),
        });
        parent_of.push(parent);
        stack.extend(node.children.iter().rev().map(|child| (child, Some(at))));
    }

    let mut roots = Vec::new();
    while let Some(mut option) = flat.pop() {
        option.children.reverse();
        match parent_of.pop().flatten() {
            Some(parent) => flat[parent].children.push(option),
            None => roots.push(option),
        }
    }
    roots.reverse();
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::DepartmentNode;

    fn rows() -> Vec<DepartmentNode> {
        vec![
            DepartmentNode::new(1, None, "Eng"),
            DepartmentNode::new(2, Some(1), "Backend"),
            DepartmentNode::new(3, Some(1), "Frontend"),
            DepartmentNode::new(4, Some(2), "Platform"),
            DepartmentNode::new(5, None, "Sales"),
            DepartmentNode::new(6, Some(99), "Orphan"),
        ]
    }

    #[test]
    fn test_build_tree() {
        let tree = build_tree(rows());
        let roots: Vec<&str> = tree.iter().map(|n| n.record.name.as_str()).collect();
        assert_eq!(roots, vec!["Eng", "Sales", "Orphan"]);

        let eng = &tree[0];
        assert_eq!(eng.children.len(), 2);
        assert_eq!(eng.children[0].record.name, "Backend");
        assert_eq!(eng.children[0].children[0].path, "Eng/Backend/Platform");
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_build_tree_keeps_cycle_members() {
        let rows = vec![
            DepartmentNode::new(1, Some(2), "A"),
            DepartmentNode::new(2, Some(1), "B"),
            DepartmentNode::new(3, Some(3), "Self"),
        ];
        let tree = build_tree(rows);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].record.name, "Self");
        assert_eq!(tree[1].record.name, "A");
        assert_eq!(tree[1].children[0].record.name, "B");
    }

    #[test]
    fn test_build_tree_empty() {
        let tree = build_tree(Vec::<DepartmentNode>::new());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_to_options() {
        let options = to_options(&build_tree(rows()));
        assert_eq!(options[0].value, 1);
        assert_eq!(options[0].label, "Eng");
        assert_eq!(options[0].children[0].path, "Eng/Backend");

        let value = serde_json::to_value(&options[1]).unwrap();
        assert_eq!(value["label"], "Sales");
        assert!(value.get("children").is_none());
    }

    #[test]
    fn test_deep_chain_builds_without_recursion() {
        let depth = 1_500;
        let rows: Vec<DepartmentNode> = (0..depth)
            .map(|i| DepartmentNode::new(i, if i == 0 { None } else { Some(i - 1) }, "d"))
            .collect();

        let tree = build_tree(rows);
        assert_eq!(tree.len(), 1);

        let options = to_options(&tree);
        assert_eq!(options.len(), 1);

        let mut levels = 1;
        let mut node = &tree[0];
        while let Some(child) = node.children.first() {
            assert_eq!(node.children.len(), 1);
            node = child;
            levels += 1;
        }
        assert_eq!(levels, depth);
        assert_eq!(node.record.id, depth - 1);
        assert_eq!(node.path.split('/').count(), depth as usize);

        let mut option = &options[0];
        while let Some(child) = option.children.first() {
            option = child;
        }
        assert_eq!(option.value, depth - 1);
    }

    #[test]
    fn test_siblings_keep_input_order() {
        let rows = vec![
            DepartmentNode::new(1, None, "Root"),
            DepartmentNode::new(2, Some(1), "First"),
            DepartmentNode::new(3, Some(1), "Second"),
            DepartmentNode::new(4, Some(1), "Third"),
            DepartmentNode::new(5, Some(3), "Nested"),
        ];
        let options = to_options(&build_tree(rows));
        let labels: Vec<&str> = options[0].children.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["First", "Second", "Third"]);
        assert_eq!(options[0].children[1].children[0].label, "Nested");
    }
}
