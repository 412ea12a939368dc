//! Ordered report tree.
//!
//! A report is a tree of string keys whose leaves are lists of display
//! lines. Key order is insertion order, which is also rendering order.

use serde::Serialize;

/// One level of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Branch(Vec<(String, Node)>),
    Leaves(Vec<String>),
}

impl Node {
    /// Child nodes, empty for a leaf list.
    pub fn children(&self) -> &[(String, Node)] {
        match self {
            Node::Branch(children) => children,
            Node::Leaves(_) => &[],
        }
    }

    /// Leaf lines, empty for a branch.
    pub fn leaves(&self) -> &[String] {
        match self {
            Node::Branch(_) => &[],
            Node::Leaves(leaves) => leaves,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        find(self.children(), key)
    }

    /// Total number of leaf lines below this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Branch(children) => children.iter().map(|(_, n)| n.leaf_count()).sum(),
            Node::Leaves(leaves) => leaves.len(),
        }
    }
}

fn find<'a>(children: &'a [(String, Node)], key: &str) -> Option<&'a Node> {
    children.iter().find(|(k, _)| k == key).map(|(_, n)| n)
}

/// A finished report. Read-only; build one with [`ReportBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    root: Vec<(String, Node)>,
}

impl Report {
    pub fn entries(&self) -> &[(String, Node)] {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        find(&self.root, key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.iter().map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }
}

impl IntoIterator for Report {
    type Item = (String, Node);
    type IntoIter = std::vec::IntoIter<(String, Node)>;

    fn into_iter(self) -> Self::IntoIter {
        self.root.into_iter()
    }
}

/// Builds a [`Report`] one leaf at a time.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    root: Vec<(String, Node)>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `leaf` under `path`, creating every missing level on the way.
    ///
    /// All appends to one builder should use paths of the same depth. When
    /// they don't, the node created first keeps its kind: a leaf list met
    /// early swallows the leaf, and a branch reached with no path left
    /// files it under `-`. An empty path is ignored.
    pub fn append(&mut self, path: &[&str], leaf: impl Into<String>) {
        append_into(&mut self.root, path, leaf.into());
    }

    pub fn build(self) -> Report {
        Report { root: self.root }
    }
}

fn append_into(children: &mut Vec<(String, Node)>, path: &[&str], leaf: String) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };

    let idx = match children.iter().position(|(k, _)| k == head) {
        Some(idx) => idx,
        None => {
            let node = if rest.is_empty() {
                Node::Leaves(Vec::new())
            } else {
                Node::Branch(Vec::new())
            };
            children.push((head.to_string(), node));
            children.len() - 1
        }
    };

    match &mut children[idx].1 {
        Node::Leaves(leaves) => leaves.push(leaf),
        Node::Branch(grand) if rest.is_empty() => append_into(grand, &["-"], leaf),
        Node::Branch(grand) => append_into(grand, rest, leaf),
    }
}
