//! Immutable process-tree snapshots of a linked execution graph.
//!
//! A [`ProcessTree`] is built fresh from one root [`ExecutionRecord`] on
//! every access — no caching, no mutation after construction. Sibling
//! sub-runs are ordered by ascending creation time of the underlying
//! records, with link insertion order as the stable tie-break, so the tree
//! reflects actual execution order.

use std::collections::VecDeque;
use std::sync::Arc;

use runtriage_records::ExecutionRecord;

use crate::diagnosis::ROOT_PATH;
use crate::error::{Result, TriageError};

/// Traversal depth cap. A graph deeper than this is treated as pathological
/// (likely self-referential) and construction fails closed.
pub const MAX_TREE_DEPTH: usize = 64;

/// One node of the snapshot: a name, a shared record handle, and ordered
/// children. Leaf records always carry an empty child list.
pub struct ProcessTree {
    /// Link label, or a fallback name when the link carried none.
    pub name: String,
    /// Shared handle to the underlying record; not owned by the snapshot.
    pub record: Arc<dyn ExecutionRecord>,
    children: Vec<ProcessTree>,
}

impl ProcessTree {
    /// Build a snapshot rooted at `record`, named [`ROOT_PATH`].
    pub fn build(record: Arc<dyn ExecutionRecord>) -> Result<Self> {
        Self::build_named(record, ROOT_PATH)
    }

    /// Build a snapshot rooted at `record` with an explicit root name.
    ///
    /// Construction never fails for a resolvable graph: a record with no
    /// resolvable children yields a childless node. It does fail when a
    /// linked child has become unavailable, or when the graph exceeds
    /// [`MAX_TREE_DEPTH`].
    pub fn build_named(record: Arc<dyn ExecutionRecord>, name: &str) -> Result<Self> {
        Self::build_at(record, name, 0)
    }

    fn build_at(record: Arc<dyn ExecutionRecord>, name: &str, depth: usize) -> Result<Self> {
        if depth > MAX_TREE_DEPTH {
            return Err(TriageError::DepthLimitExceeded {
                limit: MAX_TREE_DEPTH,
            });
        }

        let mut children = Vec::new();
        if record.is_composite() {
            let mut links = record.children()?;
            // sort_by_key is stable: equal creation times keep link order.
            links.sort_by_key(|link| link.record.created_at());

            for link in links {
                let label = link
                    .label
                    .clone()
                    .or_else(|| link.record.process_label())
                    .unwrap_or_else(|| {
                        format!("unlabeled_process_{}", link.record.identity().short())
                    });
                children.push(Self::build_at(link.record, &label, depth + 1)?);
            }
        }

        Ok(Self {
            name: name.to_string(),
            record,
            children,
        })
    }

    /// Direct children, in execution order.
    pub fn children(&self) -> &[ProcessTree] {
        &self.children
    }

    /// Look up a direct child by label. No path traversal.
    pub fn get(&self, label: &str) -> Result<&ProcessTree> {
        self.children
            .iter()
            .find(|child| child.name == label)
            .ok_or_else(|| TriageError::NotFound {
                label: label.to_string(),
                parent: self.name.clone(),
            })
    }

    /// Whether a direct child with this label exists. Never fails.
    pub fn contains(&self, label: &str) -> bool {
        self.children.iter().any(|child| child.name == label)
    }

    /// The last node visited by a breadth-first walk — the deepest,
    /// most recently started execution. Useful when a failed run ends in
    /// an unlabeled leaf.
    pub fn find_last_node(&self) -> &ProcessTree {
        let mut queue: VecDeque<&ProcessTree> = VecDeque::new();
        queue.push_back(self);
        let mut last = self;
        while let Some(node) = queue.pop_front() {
            last = node;
            for child in &node.children {
                queue.push_back(child);
            }
        }
        last
    }

    /// Locate the first leaf execution, in pre-order, that did not finish
    /// successfully, together with its `/`-joined path from the root.
    ///
    /// Pre-order first-match is the load-bearing tie-break: when several
    /// branches failed, the one that started earliest is reported. Returns
    /// `None` when every leaf is successful.
    pub fn locate_failed_leaf(&self) -> Option<(String, &ProcessTree)> {
        if !self.record.is_composite() && !self.record.is_finished_ok() {
            return Some((ROOT_PATH.to_string(), self));
        }
        Self::locate_below(self, "")
    }

    fn locate_below<'a>(node: &'a ProcessTree, prefix: &str) -> Option<(String, &'a ProcessTree)> {
        for child in &node.children {
            let path = if prefix.is_empty() {
                child.name.clone()
            } else {
                format!("{prefix}/{}", child.name)
            };
            if !child.record.is_composite() && !child.record.is_finished_ok() {
                return Some((path, child));
            }
            if let Some(found) = Self::locate_below(child, &path) {
                return Some(found);
            }
        }
        None
    }

    /// Pre-order walk applying `extract` to every record matching
    /// `run_type`; returns `(path, text)` pairs. Surfaces per-leaf details
    /// such as remote scratch locations without touching diagnosis logic.
    pub fn collect_info<F>(&self, run_type: &str, extract: &F) -> Vec<(String, String)>
    where
        F: Fn(&dyn ExecutionRecord) -> String,
    {
        let mut out = Vec::new();
        if self.record.run_type() == run_type {
            out.push((ROOT_PATH.to_string(), extract(self.record.as_ref())));
        }
        for child in &self.children {
            Self::collect_below(child, &child.name, run_type, extract, &mut out);
        }
        out
    }

    fn collect_below<F>(
        node: &ProcessTree,
        path: &str,
        run_type: &str,
        extract: &F,
        out: &mut Vec<(String, String)>,
    ) where
        F: Fn(&dyn ExecutionRecord) -> String,
    {
        if node.record.run_type() == run_type {
            out.push((path.to_string(), extract(node.record.as_ref())));
        }
        for child in &node.children {
            let child_path = format!("{path}/{}", child.name);
            Self::collect_below(child, &child_path, run_type, extract, out);
        }
    }

    /// Render the tree as indented ASCII, one node per line.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.describe());
        let count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            child.render_into(&mut out, "", i == count - 1);
        }
        out
    }

    fn render_into(&self, out: &mut String, prefix: &str, is_last: bool) {
        let connector = if is_last { "`-- " } else { "|-- " };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&self.describe());
        out.push('\n');

        let next_prefix = format!("{prefix}{}", if is_last { "    " } else { "|   " });
        let count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            child.render_into(out, &next_prefix, i == count - 1);
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} ({} {})",
            self.name,
            self.record.run_type(),
            self.record.identity().short()
        )
    }
}
