//! # Collection Hierarchy
//!
//! Turns the flat collection list returned by the catalog into a forest of
//! folder nodes with vault-relative paths.
//!
//! Each node's path is its parent's path joined with the sanitized collection
//! name. Siblings are sorted by name before recursing so the traversal order
//! (and therefore folder creation order) is the same on every pass.
//!
//! Only collections reachable from a root are built. A parent reference that
//! points at an unknown key, or a cycle of parent references, leaves those
//! collections out of the tree; items filed only under them land in the
//! fallback folder.

use bridge_traits::catalog::Collection;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Characters that are unsafe in a folder or file name on at least one
/// supported platform.
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// A collection mapped onto a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionTreeNode {
    pub key: String,
    pub name: String,
    /// Folder path relative to the vault root.
    pub path: PathBuf,
    pub children: Vec<CollectionTreeNode>,
    pub item_count: u32,
}

/// Replace path-unsafe characters with `-` and trim surrounding whitespace.
///
/// A name that would resolve to nothing or to a relative directory marker
/// becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '-' } else { c })
        .collect();

    match replaced.trim() {
        "" | "." | ".." => "_".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Case-insensitive order; names equal ignoring case put lowercase first
/// (`"a"` before `"A"`), then fall back to the key.
fn compare_names(a: &Collection, b: &Collection) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| {
            let upper = |name: &str| name.chars().map(char::is_uppercase).collect::<Vec<_>>();
            upper(&a.name).cmp(&upper(&b.name))
        })
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.key.cmp(&b.key))
}

/// Build the collection forest rooted at `root` (usually the library folder,
/// relative to the vault).
pub fn build_collection_tree(collections: &[Collection], root: &Path) -> Vec<CollectionTreeNode> {
    let mut roots: Vec<&Collection> = Vec::new();
    let mut children: HashMap<&str, Vec<&Collection>> = HashMap::new();

    for collection in collections {
        match collection.parent_key.as_deref() {
            None => roots.push(collection),
            Some(parent) => children.entry(parent).or_default().push(collection),
        }
    }

    let mut visited = HashSet::new();
    build_level(roots, root, &children, &mut visited)
}

fn build_level<'a>(
    mut level: Vec<&'a Collection>,
    parent_path: &Path,
    children: &HashMap<&str, Vec<&'a Collection>>,
    visited: &mut HashSet<&'a str>,
) -> Vec<CollectionTreeNode> {
    level.sort_by(|a, b| compare_names(a, b));

    let mut nodes = Vec::with_capacity(level.len());
    for collection in level {
        // Duplicate keys are built once
        if !visited.insert(collection.key.as_str()) {
            continue;
        }

        let path = parent_path.join(sanitize_name(&collection.name));
        let child_nodes = match children.get(collection.key.as_str()) {
            Some(kids) => build_level(kids.clone(), &path, children, visited),
            None => Vec::new(),
        };

        nodes.push(CollectionTreeNode {
            key: collection.key.clone(),
            name: collection.name.clone(),
            path,
            children: child_nodes,
            item_count: collection.item_count,
        });
    }
    nodes
}

/// Pre-order flattening: every node is followed by its descendants.
pub fn flatten_collection_tree(nodes: &[CollectionTreeNode]) -> Vec<&CollectionTreeNode> {
    let mut flat = Vec::new();
    let mut stack: Vec<&CollectionTreeNode> = nodes.iter().rev().collect();

    while let Some(node) = stack.pop() {
        flat.push(node);
        stack.extend(node.children.iter().rev());
    }
    flat
}

/// Collection key to folder path, for every node in the forest.
pub fn collection_paths(nodes: &[CollectionTreeNode]) -> HashMap<String, PathBuf> {
    flatten_collection_tree(nodes)
        .into_iter()
        .map(|node| (node.key.clone(), node.path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(key: &str, name: &str, parent: Option<&str>) -> Collection {
        Collection {
            key: key.to_string(),
            name: name.to_string(),
            parent_key: parent.map(String::from),
            item_count: 0,
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  AI/ML: Survey?  "), "AI-ML- Survey-");
        assert_eq!(sanitize_name(r#"a\b*c"d<e>f|g"#), "a-b-c-d-e-f-g");
        assert_eq!(sanitize_name("   "), "_");
        assert_eq!(sanitize_name(".."), "_");
        assert_eq!(sanitize_name("Plain"), "Plain");
    }

    #[test]
    fn test_nested_paths_follow_parents() {
        let collections = vec![
            collection("C1", "Forecasting", Some("R1")),
            collection("R1", "PhD", None),
            collection("C2", "Transformers", Some("C1")),
        ];

        let tree = build_collection_tree(&collections, Path::new("Library"));

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].path, PathBuf::from("Library/PhD"));
        assert_eq!(tree[0].children[0].path, PathBuf::from("Library/PhD/Forecasting"));
        assert_eq!(
            tree[0].children[0].children[0].path,
            PathBuf::from("Library/PhD/Forecasting/Transformers")
        );
    }

    #[test]
    fn test_siblings_sorted_by_name() {
        let collections = vec![
            collection("R3", "zeta", None),
            collection("R1", "Beta", None),
            collection("R2", "alpha", None),
        ];

        let tree = build_collection_tree(&collections, Path::new("Library"));
        let names: Vec<_> = tree.iter().map(|n| n.name.as_str()).collect();

        assert_eq!(names, vec!["alpha", "Beta", "zeta"]);
    }

    #[test]
    fn test_case_ties_put_lowercase_first() {
        let collections = vec![
            collection("R1", "Ml", None),
            collection("R2", "ML", None),
            collection("R3", "ml", None),
        ];

        let tree = build_collection_tree(&collections, Path::new("Library"));
        let names: Vec<_> = tree.iter().map(|n| n.name.as_str()).collect();

        assert_eq!(names, vec!["ml", "Ml", "ML"]);
    }

    #[test]
    fn test_cycles_and_dangling_parents_are_dropped() {
        let collections = vec![
            collection("R1", "Root", None),
            collection("A", "A", Some("B")),
            collection("B", "B", Some("A")),
            collection("X", "Lost", Some("MISSING")),
        ];

        let tree = build_collection_tree(&collections, Path::new("Library"));
        let paths = collection_paths(&tree);

        assert_eq!(paths.len(), 1);
        assert!(paths.contains_key("R1"));
    }

    #[test]
    fn test_flatten_is_preorder() {
        let collections = vec![
            collection("R1", "A", None),
            collection("R2", "B", None),
            collection("C1", "A1", Some("R1")),
            collection("C2", "A2", Some("R1")),
        ];

        let tree = build_collection_tree(&collections, Path::new("Library"));
        let keys: Vec<_> = flatten_collection_tree(&tree)
            .iter()
            .map(|n| n.key.as_str())
            .collect();

        assert_eq!(keys, vec!["R1", "C1", "C2", "R2"]);
    }
}
