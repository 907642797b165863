//! Graphviz rendering of the object graph.
//!
//! Node colour reflects the `marked` flag at render time, so callers mark
//! first (see [`Simulator::visualize`](crate::Simulator::visualize)).

use crate::{ObjectStore, RootSet};

/// Default output file used by front ends.
pub const DEFAULT_DOT_PATH: &str = "heap_visual.dot";

const REACHABLE: &str = "green";
const UNREACHABLE: &str = "red";
const ROOT: &str = "lightblue";

pub fn render(store: &ObjectStore, roots: &RootSet) -> String {
    let mut builder = DotBuilder::new();

    for (_, object) in store.iter() {
        let color = if object.is_marked() { REACHABLE } else { UNREACHABLE };
        builder.add_node(object.name(), color);
        for target in object.refs().iter().filter_map(|&id| store.get(id)) {
            builder.add_edge(object.name(), target.name());
        }
    }

    // roots are restyled after every plain node so the later attributes win
    for object in roots.iter().filter_map(|id| store.get(id)) {
        builder.highlight_root(object.name());
    }

    builder.finish()
}

struct DotBuilder {
    body: Vec<String>,
    roots: Vec<String>,
}

impl DotBuilder {
    fn new() -> Self {
        Self {
            body: Vec::new(),
            roots: Vec::new(),
        }
    }

    fn finish(self) -> String {
        let mut out = String::new();
        out.push_str("digraph MemoryGraph {\n");
        out.push_str("  node [shape=circle, style=filled, color=black];\n\n");

        out.push_str("  subgraph cluster_legend {\n");
        out.push_str("    label=\"Legend\";\n");
        out.push_str(&format!(
            "    key_alive [label=\"Reachable (green)\", fillcolor={REACHABLE}];\n"
        ));
        out.push_str(&format!(
            "    key_garbage [label=\"Unreachable (red)\", fillcolor={UNREACHABLE}];\n"
        ));
        out.push_str(&format!(
            "    key_root [label=\"Root (light blue)\", shape=doublecircle, fillcolor={ROOT}];\n"
        ));
        out.push_str("  }\n\n");

        for line in self.body.iter().chain(&self.roots) {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }

    fn add_node(&mut self, name: &str, color: &str) {
        let name = escape_label(name);
        let line = format!("\"{name}\" [label=\"{name}\", fillcolor={color}];");
        self.body.push(line);
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        let line = format!("\"{}\" -> \"{}\";", escape_label(from), escape_label(to));
        self.body.push(line);
    }

    fn highlight_root(&mut self, name: &str) {
        self.roots.push(format!(
            "\"{}\" [shape=doublecircle, fillcolor={ROOT}];",
            escape_label(name)
        ));
    }
}

fn escape_label(input: &str) -> String {
    let mut out = String::new();
    for ch in input.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector;

    #[test]
    fn renders_marked_state_edges_and_roots() {
        let mut store = ObjectStore::new(None);
        let a = store.create(1, "A").unwrap();
        let b = store.create(2, "B").unwrap();
        let c = store.create(3, "C").unwrap();
        store.add_edge(a, b).unwrap();
        store.add_edge(c, a).unwrap();
        let mut roots = RootSet::default();
        roots.add(a).unwrap();
        collector::mark_all(&mut store, &roots);

        let dot = render(&store, &roots);

        let expected = "\
digraph MemoryGraph {
  node [shape=circle, style=filled, color=black];

  subgraph cluster_legend {
    label=\"Legend\";
    key_alive [label=\"Reachable (green)\", fillcolor=green];
    key_garbage [label=\"Unreachable (red)\", fillcolor=red];
    key_root [label=\"Root (light blue)\", shape=doublecircle, fillcolor=lightblue];
  }

  \"C\" [label=\"C\", fillcolor=red];
  \"C\" -> \"A\";
  \"B\" [label=\"B\", fillcolor=green];
  \"A\" [label=\"A\", fillcolor=green];
  \"A\" -> \"B\";
  \"A\" [shape=doublecircle, fillcolor=lightblue];
}
";
        assert_eq!(dot, expected);
    }

    #[test]
    fn empty_heap_renders_only_the_legend() {
        let dot = render(&ObjectStore::new(None), &RootSet::default());

        assert!(dot.starts_with("digraph MemoryGraph {\n"));
        assert!(dot.ends_with("  }\n\n}\n"));
        assert_eq!(dot.matches("fillcolor").count(), 3);
    }

    #[test]
    fn names_are_escaped() {
        assert_eq!(escape_label("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escape_label("plain"), "plain");
    }
}
