//! Department path resolution
//!
//! Turns a flat list of parent-referencing department rows into
//! slash-separated paths running from the root down to each row, e.g.
//! `"Engineering/Backend/Platform"`.
//!
//! Resolution never fails: a parent id missing from the collection makes the
//! row a root, and every member of a parent cycle resolves to its own name.
//! Chains of any depth are walked iteratively, each row exactly once.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Separator placed between path segments. Names are not escaped.
pub const PATH_SEPARATOR: &str = "/";

/// Anything that looks like a department row
pub trait DepartmentRecord {
    fn id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;
    fn name(&self) -> &str;
}

/// Plain department node, detached from any storage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentNode {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub name: String,
    /// Materialized path, filled by [`DepartmentNode::annotate`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl DepartmentNode {
    pub fn new(id: i64, parent_id: Option<i64>, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
            path: None,
        }
    }

    /// Write the resolved path onto every node in place
    pub fn annotate(nodes: &mut [DepartmentNode]) {
        let index = resolve_path_index(nodes);
        for node in nodes.iter_mut() {
            node.path = index.get(&node.id).cloned();
        }
    }
}

impl DepartmentRecord for DepartmentNode {
    fn id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A record paired with its resolved path
///
/// Serializes as the record's own fields plus a `path` field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pathed<T> {
    #[serde(flatten)]
    pub record: T,
    pub path: String,
}

/// Memoizing path resolver over one snapshot of department rows
pub struct PathResolver<'a, T> {
    index: HashMap<i64, &'a T>,
    cache: HashMap<i64, String>,
}

impl<'a, T: DepartmentRecord> PathResolver<'a, T> {
    pub fn new(nodes: &'a [T]) -> Self {
        // Later rows overwrite earlier ones sharing an id
        let index = nodes.iter().map(|node| (node.id(), node)).collect();

        Self {
            index,
            cache: HashMap::with_capacity(nodes.len()),
        }
    }

    /// Path of the department `id`, or `None` if it is not in the snapshot
    pub fn resolve(&mut self, id: i64) -> Option<String> {
        let node = self.index.get(&id).copied()?;
        Some(self.path(node))
    }

    fn path(&mut self, start: &'a T) -> String {
        if let Some(hit) = self.cache.get(&start.id()) {
            return hit.clone();
        }

        // Ascend until a cached ancestor, a root, or a node already walked
        let mut chain: Vec<&'a T> = Vec::new();
        let mut on_chain: HashSet<i64> = HashSet::new();
        let mut current = start;
        let mut base: Option<String> = None;

        loop {
            if let Some(hit) = self.cache.get(&current.id()) {
                base = Some(hit.clone());
                break;
            }

            if !on_chain.insert(current.id()) {
                // `current` closes a cycle; its members become roots
                let cycle_start = chain
                    .iter()
                    .position(|node| node.id() == current.id())
                    .unwrap_or(0);
                for member in chain.drain(cycle_start..) {
                    self.cache.insert(member.id(), member.name().to_string());
                }
                base = Some(current.name().to_string());
                break;
            }

            chain.push(current);

            match current
                .parent_id()
                .and_then(|parent_id| self.index.get(&parent_id).copied())
            {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Descend the walked chain, root side first
        let mut path = base;
        for node in chain.into_iter().rev() {
            let resolved = match path {
                Some(parent) => format!("{}{}{}", parent, PATH_SEPARATOR, node.name()),
                None => node.name().to_string(),
            };
            self.cache.insert(node.id(), resolved.clone());
            path = Some(resolved);
        }

        path.unwrap_or_default()
    }
}

/// Pair every record with its path, keeping input order
pub fn resolve_paths<T: DepartmentRecord>(nodes: Vec<T>) -> Vec<Pathed<T>> {
    let index = resolve_path_index(&nodes);

    nodes
        .into_iter()
        .map(|record| {
            let path = index.get(&record.id()).cloned().unwrap_or_default();
            Pathed { record, path }
        })
        .collect()
}

/// Resolve every record and flatten the result into an id -> path table
pub fn resolve_path_index<T: DepartmentRecord>(nodes: &[T]) -> HashMap<i64, String> {
    let mut resolver = PathResolver::new(nodes);

    nodes
        .iter()
        .filter_map(|node| resolver.resolve(node.id()).map(|path| (node.id(), path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, parent_id: Option<i64>, name: &str) -> DepartmentNode {
        DepartmentNode::new(id, parent_id, name)
    }

    fn sample() -> Vec<DepartmentNode> {
        vec![
            node(1, None, "Eng"),
            node(2, Some(1), "Backend"),
            node(3, Some(2), "Platform"),
        ]
    }

    #[test]
    fn test_resolve_paths_example() {
        let resolved = resolve_paths(sample());
        let paths: Vec<&str> = resolved.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["Eng", "Eng/Backend", "Eng/Backend/Platform"]);
        assert_eq!(resolved[2].record.name, "Platform");
    }

    #[test]
    fn test_resolve_path_index_example() {
        let index = resolve_path_index(&sample());
        assert_eq!(index.len(), 3);
        assert_eq!(index[&1], "Eng");
        assert_eq!(index[&2], "Eng/Backend");
        assert_eq!(index[&3], "Eng/Backend/Platform");
    }

    #[test]
    fn test_empty_input() {
        let nodes: Vec<DepartmentNode> = Vec::new();
        assert!(resolve_paths(nodes.clone()).is_empty());
        assert!(resolve_path_index(&nodes).is_empty());
    }

    #[test]
    fn test_child_before_parent() {
        let nodes = vec![
            node(3, Some(2), "Platform"),
            node(2, Some(1), "Backend"),
            node(1, None, "Eng"),
        ];
        let index = resolve_path_index(&nodes);
        assert_eq!(index[&3], "Eng/Backend/Platform");
    }

    #[test]
    fn test_child_extends_parent_path() {
        let nodes = vec![
            node(1, None, "Eng"),
            node(2, Some(1), "Backend"),
            node(3, Some(1), "Frontend"),
            node(4, Some(2), "Platform"),
            node(5, Some(2), "Storage"),
            node(6, None, "Sales"),
            node(7, Some(6), "EMEA"),
        ];
        let index = resolve_path_index(&nodes);

        for n in &nodes {
            match n.parent_id {
                None => assert_eq!(index[&n.id], n.name),
                Some(parent) => {
                    assert_eq!(index[&n.id], format!("{}/{}", index[&parent], n.name))
                }
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let nodes = sample();
        assert_eq!(resolve_path_index(&nodes), resolve_path_index(&nodes));
    }

    #[test]
    fn test_order_independent() {
        let nodes = vec![
            node(1, None, "Eng"),
            node(2, Some(1), "Backend"),
            node(3, Some(2), "Platform"),
            node(4, Some(9), "Orphan"),
            node(5, Some(6), "Loop A"),
            node(6, Some(5), "Loop B"),
            node(7, Some(5), "Below Loop"),
        ];
        let expected = resolve_path_index(&nodes);

        let mut reversed = nodes.clone();
        reversed.reverse();
        assert_eq!(resolve_path_index(&reversed), expected);

        for shift in 1..nodes.len() {
            let mut rotated = nodes.clone();
            rotated.rotate_left(shift);
            assert_eq!(resolve_path_index(&rotated), expected, "rotation {}", shift);
        }
    }

    #[test]
    fn test_dangling_parent_is_root() {
        let nodes = vec![node(5, Some(404), "Orphan"), node(6, Some(5), "Child")];
        let index = resolve_path_index(&nodes);
        assert_eq!(index[&5], "Orphan");
        assert_eq!(index[&6], "Orphan/Child");
    }

    #[test]
    fn test_self_cycle() {
        let nodes = vec![node(1, Some(1), "Self")];
        let index = resolve_path_index(&nodes);
        assert_eq!(index[&1], "Self");
    }

    #[test]
    fn test_mutual_cycle() {
        let nodes = vec![node(1, Some(2), "A"), node(2, Some(1), "B")];
        let index = resolve_path_index(&nodes);
        assert_eq!(index[&1], "A");
        assert_eq!(index[&2], "B");
    }

    #[test]
    fn test_node_below_cycle_extends_member() {
        let nodes = vec![
            node(3, Some(1), "Leaf"),
            node(1, Some(2), "A"),
            node(2, Some(1), "B"),
        ];
        let index = resolve_path_index(&nodes);
        assert_eq!(index[&3], "A/Leaf");
        assert_eq!(index[&1], "A");
        assert_eq!(index[&2], "B");
    }

    fn chain(depth: i64) -> Vec<DepartmentNode> {
        (0..depth)
            .map(|i| node(i, if i == 0 { None } else { Some(i - 1) }, &format!("d{}", i)))
            .collect()
    }

    #[test]
    fn test_deep_chain_keeps_every_segment() {
        let nodes = chain(120);
        let index = resolve_path_index(&nodes);

        let deepest = index[&119].split('/').collect::<Vec<_>>();
        assert_eq!(deepest.len(), 120);
        assert_eq!(deepest.first(), Some(&"d0"));
        assert_eq!(deepest.last(), Some(&"d119"));

        for n in nodes.iter().skip(1) {
            let parent = n.parent_id.unwrap();
            assert_eq!(index[&n.id], format!("{}/{}", index[&parent], n.name));
        }

        let mut reversed = nodes.clone();
        reversed.reverse();
        assert_eq!(resolve_path_index(&reversed), index);
    }

    #[test]
    fn test_very_deep_chain_does_not_recurse() {
        let nodes = chain(2_000);
        let mut resolver = PathResolver::new(&nodes);
        let path = resolver.resolve(1_999).unwrap();
        assert_eq!(path.split('/').count(), 2_000);
        assert!(path.starts_with("d0/d1/"));
    }

    #[test]
    fn test_resolve_unknown_id() {
        let nodes = sample();
        let mut resolver = PathResolver::new(&nodes);
        assert_eq!(resolver.resolve(3).as_deref(), Some("Eng/Backend/Platform"));
        assert_eq!(resolver.resolve(42), None);
    }

    #[test]
    fn test_names_used_verbatim() {
        let nodes = vec![
            node(1, None, "R&D/Labs"),
            node(2, Some(1), ""),
            node(3, Some(2), "  "),
        ];
        let index = resolve_path_index(&nodes);
        assert_eq!(index[&1], "R&D/Labs");
        assert_eq!(index[&2], "R&D/Labs/");
        assert_eq!(index[&3], "R&D/Labs//  ");
    }

    #[test]
    fn test_duplicate_ids_do_not_crash() {
        let nodes = vec![
            node(1, None, "First"),
            node(1, None, "Second"),
            node(2, Some(1), "Child"),
        ];
        let index = resolve_path_index(&nodes);
        assert_eq!(index[&1], "Second");
        assert_eq!(index[&2], "Second/Child");
    }

    #[test]
    fn test_annotate_in_place() {
        let mut nodes = sample();
        assert!(nodes.iter().all(|n| n.path.is_none()));
        DepartmentNode::annotate(&mut nodes);
        assert_eq!(nodes[1].path.as_deref(), Some("Eng/Backend"));
    }

    #[test]
    fn test_pathed_serializes_flat() {
        let resolved = resolve_paths(vec![node(1, None, "Eng")]);
        let value = serde_json::to_value(&resolved[0]).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["name"], "Eng");
        assert_eq!(value["path"], "Eng");
    }
}
