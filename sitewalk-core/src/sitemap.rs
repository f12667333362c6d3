//! Markdown sitemap rendering.
//!
//! The link graph routinely contains cycles (pages linking back home), so the
//! walk uses an explicit stack and expands every node at most once. Repeat
//! visits of an already expanded node still print a line at their own depth
//! but never descend again, and identical lines are printed only once.

use sitewalk_scanner::LinkGraph;
use std::collections::HashSet;

const INDENT_STEP: usize = 2;

pub fn render_markdown<'a>(graph: &'a LinkGraph, root: &'a str) -> String {
    let mut text = String::from("# Sitemap\n\n");
    if !graph.contains_node(root) {
        return text;
    }

    let mut emitted: HashSet<String> = HashSet::new();
    let mut expanded: HashSet<&str> = HashSet::new();
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];

    while let Some((node, indent)) = stack.pop() {
        let line = format!("{}* [{}]({})", " ".repeat(indent), node, node);
        if emitted.insert(line.clone()) {
            text.push_str(&line);
            text.push('\n');
        }

        if !expanded.insert(node) {
            continue;
        }

        // Reverse so the smallest child is popped first.
        for child in graph.successors(node).into_iter().rev() {
            stack.push((child, indent + INDENT_STEP));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_node() {
        let mut graph = LinkGraph::new();
        graph.add_node("https://a.test/");

        let md = render_markdown(&graph, "https://a.test/");
        assert_eq!(md, "# Sitemap\n\n* [https://a.test/](https://a.test/)\n");
    }

    #[test]
    fn test_missing_root_renders_heading_only() {
        let graph = LinkGraph::new();
        assert_eq!(render_markdown(&graph, "https://a.test/"), "# Sitemap\n\n");
    }

    #[test]
    fn test_nested_children_in_order() {
        let mut graph = LinkGraph::new();
        graph.add_edge("r", "b");
        graph.add_edge("r", "a");
        graph.add_edge("a", "a1");

        let md = render_markdown(&graph, "r");
        assert_eq!(
            md,
            "# Sitemap\n\n\
             * [r](r)\n\
             \x20\x20* [a](a)\n\
             \x20\x20\x20\x20* [a1](a1)\n\
             \x20\x20* [b](b)\n"
        );
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = LinkGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");

        let md = render_markdown(&graph, "a");
        assert_eq!(
            md,
            "# Sitemap\n\n* [a](a)\n  * [b](b)\n    * [a](a)\n"
        );
    }

    #[test]
    fn test_self_loop_and_dense_graph_terminate() {
        let mut graph = LinkGraph::new();
        let pages: Vec<String> = (0..20).map(|i| format!("p{:02}", i)).collect();
        for from in &pages {
            for to in &pages {
                graph.add_edge(from, to);
            }
        }

        let md = render_markdown(&graph, "p00");
        // every page expanded once: root line plus its 20 children, then each
        // child's children one level deeper
        let lines = md.lines().filter(|l| l.contains("* [")).count();
        assert!(lines <= 1 + 20 * 21);
        assert!(md.contains("  * [p19](p19)"));
    }

    #[test]
    fn test_duplicate_lines_are_dropped() {
        let mut graph = LinkGraph::new();
        graph.add_edge("r", "x");
        graph.add_edge("r", "y");
        graph.add_edge("x", "z");
        graph.add_edge("y", "z");

        let md = render_markdown(&graph, "r");
        assert_eq!(md.matches("    * [z](z)").count(), 1);
    }
}
