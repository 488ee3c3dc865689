//! Box-drawing dump of a tree, for debugging.

use std::fmt::Write;

use super::node::{NodeId, Tree};

const ANONYMOUS_ROOT: &str = "<ROOT>";

/// Render `tree` one node per line.
///
/// ```text
/// gallery (2 children)
/// ├─ a.png
/// └─┬sub (1 children)
///   └─ b.png
/// ```
pub fn render(tree: &Tree) -> String {
    let mut out = String::new();
    if let Some(root) = tree.root() {
        render_directory(tree, root, "", &mut out);
    }
    out
}

fn name(tree: &Tree, id: NodeId) -> &str {
    tree.data(id)
        .map(|data| data.display_name())
        .unwrap_or(ANONYMOUS_ROOT)
}

fn render_directory(tree: &Tree, dir: NodeId, prefix: &str, out: &mut String) {
    let is_root = tree.is_root(dir);
    let has_more = tree.next_sibling(dir).is_some();
    let connector = match (is_root, has_more, tree.has_children(dir)) {
        (true, _, _) => "",
        (false, true, true) => "├─┬",
        (false, true, false) => "├──",
        (false, false, true) => "└─┬",
        (false, false, false) => "└──",
    };
    let _ = writeln!(
        out,
        "{prefix}{connector}{} ({} children)",
        name(tree, dir),
        tree.children(dir).len()
    );

    let child_prefix = match (is_root, has_more) {
        (true, _) => prefix.to_owned(),
        (false, true) => format!("{prefix}│ "),
        (false, false) => format!("{prefix}  "),
    };
    for &child in tree.children(dir) {
        if tree.is_leaf(child) {
            let branch = if tree.next_sibling(child).is_some() { "├─ " } else { "└─ " };
            let _ = writeln!(out, "{child_prefix}{branch}{}", name(tree, child));
        } else {
            render_directory(tree, child, &child_prefix, out);
        }
    }
}
