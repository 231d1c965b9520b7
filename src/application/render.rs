//! Render the knowledge tree for the terminal with termtree.

use termtree::Tree;

use crate::domain::{Answer, KnowledgeTree, NodeId};

/// Levels drawn below the root; deeper subtrees collapse into a count.
pub const MAX_RENDER_DEPTH: usize = 64;

fn label(tree: &KnowledgeTree, id: NodeId, edge: Option<Answer>) -> String {
    let text = tree
        .get_node(id)
        .map(|n| {
            if n.is_question() {
                n.text.clone()
            } else {
                format!("[{}]", n.text)
            }
        })
        .unwrap_or_else(|| "<missing>".to_string());
    match edge {
        Some(answer) => format!("{}: {}", answer, text),
        None => text,
    }
}

pub fn to_tree_string(tree: &KnowledgeTree) -> Tree<String> {
    fn build(tree: &KnowledgeTree, id: NodeId, depth: usize, parent: &mut Tree<String>) {
        let Some(node) = tree.get_node(id) else {
            return;
        };
        for answer in [Answer::Yes, Answer::No] {
            let Some(child) = node.child(answer) else {
                continue;
            };
            if depth >= MAX_RENDER_DEPTH {
                let hidden = tree.count_nodes(Some(child));
                parent.push(Tree::new(format!("{}: ... {} more nodes", answer, hidden)));
                continue;
            }
            let mut subtree = Tree::new(label(tree, child, Some(answer)));
            build(tree, child, depth + 1, &mut subtree);
            parent.push(subtree);
        }
    }

    match tree.root() {
        Some(root) => {
            let mut out = Tree::new(label(tree, root, None));
            build(tree, root, 0, &mut out);
            out
        }
        None => Tree::new("Empty tree".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_seeded_tree_when_rendering_then_edges_labelled() {
        let tree = KnowledgeTree::seeded().unwrap();
        let rendered = to_tree_string(&tree).to_string();
        assert!(rendered.starts_with("Does it meow?"));
        assert!(rendered.contains("yes: [cat]"));
        assert!(rendered.contains("no: [dog]"));
    }

    #[test]
    fn given_chain_deeper_than_limit_when_rendering_then_tail_collapsed() {
        let mut tree = KnowledgeTree::new();
        let mut tail = tree.create_leaf("end").unwrap();
        for i in 0..MAX_RENDER_DEPTH + 10 {
            let side = tree.create_leaf(&format!("side {}", i)).unwrap();
            let q = tree.create_question(&format!("q {}", i)).unwrap();
            tree.set_child(q, Answer::Yes, Some(side)).unwrap();
            tree.set_child(q, Answer::No, Some(tail)).unwrap();
            tail = q;
        }
        tree.set_root(Some(tail));

        let rendered = to_tree_string(&tree).to_string();
        assert!(rendered.contains("no: ... 19 more nodes"), "{rendered}");
        assert!(!rendered.contains("[end]"));
    }
}
