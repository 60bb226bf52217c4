//! Translation of a [`Topology`] into DOT, the input language of the Graphviz layout engine.
//!
//! Nodes and clusters of a scope are written in declaration order, nodes first, each
//! cluster as a nested `subgraph cluster_<n>`. Edges follow once every scope is closed.
//! Unset edge decorations are left out so the graph-wide `edge` defaults apply.

use std::fmt::Write;

use crate::topology::*;

pub const FONT_NAME: &str = "Sans-Serif";
pub const FONT_COLOR: &str = "#2D3436";
pub const EDGE_COLOR: &str = "#7B8894";

const GRAPH_ATTRS: [(&str, &str); 7] = [
    ("pad", "2.0"),
    ("splines", "ortho"),
    ("nodesep", "0.60"),
    ("ranksep", "0.75"),
    ("fontname", FONT_NAME),
    ("fontsize", "15"),
    ("fontcolor", FONT_COLOR),
];

const NODE_ATTRS: [(&str, &str); 4] = [
    ("fontname", FONT_NAME),
    ("fontsize", "13"),
    ("fontcolor", FONT_COLOR),
    ("style", "filled"),
];

const EDGE_ATTRS: [(&str, &str); 4] = [
    ("color", EDGE_COLOR),
    ("fontname", FONT_NAME),
    ("fontsize", "13"),
    ("fontcolor", FONT_COLOR),
];

const CLUSTER_ATTRS: [(&str, &str); 5] = [
    ("labeljust", "l"),
    ("style", "rounded"),
    ("pencolor", "#AEB6BE"),
    ("fontname", FONT_NAME),
    ("fontsize", "12"),
];

/// Cluster backgrounds, cycled by nesting depth.
pub const CLUSTER_BGCOLORS: [&str; 4] = ["#E5F5FD", "#EBF3E7", "#ECE8F6", "#FDF7E3"];

/// Escape a value for use inside a double-quoted DOT string.
pub fn escape(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

pub fn to_dot(topology: &Topology) -> String {
    let mut w = DotWriter::new(topology.title());

    let mut graph_attrs = vec![
        ("label", topology.title()),
        ("rankdir", topology.direction().rankdir()),
    ];
    graph_attrs.extend(GRAPH_ATTRS);
    w.statement("graph", &graph_attrs);
    w.statement("node", &NODE_ATTRS);
    w.statement("edge", &EDGE_ATTRS);
    w.blank();

    write_scope(&mut w, topology, None);

    if !topology.edges().is_empty() {
        w.blank();
    }
    for edge in topology.edges() {
        write_edge(&mut w, edge);
    }

    w.finish()
}

fn write_scope(w: &mut DotWriter, topology: &Topology, scope: Option<ClusterId>) {
    for node in topology.nodes_in(scope) {
        write_node(w, node);
    }
    for cluster in topology.clusters_in(scope) {
        w.open_cluster(cluster.id);
        let mut attrs = vec![
            ("label", cluster.name.as_str()),
            ("bgcolor", CLUSTER_BGCOLORS[cluster.depth % CLUSTER_BGCOLORS.len()]),
        ];
        attrs.extend(CLUSTER_ATTRS);
        w.statement("graph", &attrs);
        write_scope(w, topology, Some(cluster.id));
        w.close_cluster();
    }
}

fn write_node(w: &mut DotWriter, node: &Node) {
    let (fill, pen) = node.category.palette();
    w.statement(
        &node.id.to_string(),
        &[
            ("label", node.label.as_str()),
            ("class", node.category.name()),
            ("shape", node.category.shape()),
            ("fillcolor", fill),
            ("color", pen),
        ],
    );
}

fn write_edge(w: &mut DotWriter, edge: &Edge) {
    let mut attrs: Vec<(&str, &str)> = Vec::new();
    if edge.direction != EdgeDirection::Forward {
        attrs.push(("dir", edge.direction.dot_dir()));
    }
    if let Some(style) = edge.attrs.style {
        attrs.push(("style", style.name()));
    }
    if let Some(color) = &edge.attrs.color {
        attrs.push(("color", color.as_str()));
    }
    if let Some(label) = &edge.attrs.label {
        attrs.push(("label", label.as_str()));
    }
    w.statement(&format!("{} -> {}", edge.from, edge.to), &attrs);
}

struct DotWriter {
    output: String,
    indent: usize,
}

impl DotWriter {
    fn new(name: &str) -> Self {
        let mut output = String::with_capacity(4096);
        let _ = writeln!(output, "digraph \"{}\" {{", escape(name));
        Self { output, indent: 1 }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
    }

    /// `head [k="v", ...];`, or `head;` without attributes.
    fn statement(&mut self, head: &str, attrs: &[(&str, &str)]) {
        self.write_indent();
        self.output.push_str(head);
        if !attrs.is_empty() {
            self.output.push_str(" [");
            for (i, (key, value)) in attrs.iter().enumerate() {
                if i > 0 {
                    self.output.push_str(", ");
                }
                let _ = write!(self.output, "{}=\"{}\"", key, escape(value));
            }
            self.output.push(']');
        }
        self.output.push_str(";\n");
    }

    fn open_cluster(&mut self, id: ClusterId) {
        self.write_indent();
        let _ = writeln!(self.output, "subgraph {id} {{");
        self.indent += 1;
    }

    fn close_cluster(&mut self) {
        self.indent -= 1;
        self.write_indent();
        self.output.push_str("}\n");
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }

    fn finish(mut self) -> String {
        self.output.push_str("}\n");
        self.output
    }
}
