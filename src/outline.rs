//! Plain-text preview of a topology: the containment tree followed by the edge list.
//! Needs no layout engine.

use crate::display_width::{display_width, pad_to, single_line};
use crate::topology::*;

pub fn render(topology: &Topology) -> String {
    let mut lines = vec![format!(
        "{} ({})",
        topology.title(),
        topology.direction().rankdir()
    )];
    write_scope(topology, None, "", &mut lines);

    if !topology.edges().is_empty() {
        lines.push(String::new());
        lines.push(format!("Edges ({})", topology.edges().len()));
        for edge in topology.edges() {
            lines.push(format!("  {}", edge_line(topology, edge)));
        }
    }
    lines.join("\n")
}

fn write_scope(
    topology: &Topology,
    scope: Option<ClusterId>,
    prefix: &str,
    lines: &mut Vec<String>,
) {
    let nodes: Vec<&Node> = topology.nodes_in(scope).collect();
    let clusters: Vec<&Cluster> = topology.clusters_in(scope).collect();
    let labels: Vec<String> = nodes.iter().map(|n| single_line(&n.label)).collect();
    let column = labels.iter().map(|l| display_width(l)).max().unwrap_or(0);
    let total = nodes.len() + clusters.len();

    for (i, (node, label)) in nodes.iter().zip(&labels).enumerate() {
        lines.push(format!(
            "{prefix}{}{}  {}",
            branch(i + 1 == total),
            pad_to(label, column),
            node.category
        ));
    }

    for (j, cluster) in clusters.iter().enumerate() {
        let last = nodes.len() + j + 1 == total;
        lines.push(format!(
            "{prefix}{}[{}]",
            branch(last),
            single_line(&cluster.name)
        ));
        let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
        write_scope(topology, Some(cluster.id), &child_prefix, lines);
    }
}

fn branch(last: bool) -> &'static str {
    if last { "└── " } else { "├── " }
}

fn edge_line(topology: &Topology, edge: &Edge) -> String {
    let label = |id: NodeId| {
        topology
            .node(id)
            .map_or_else(|| id.to_string(), |node| single_line(&node.label))
    };
    let from = label(edge.from);
    let to = label(edge.to);

    let stroke = match edge.attrs.style {
        Some(EdgeStyle::Dashed) => "╌╌",
        Some(EdgeStyle::Dotted) => "┄┄",
        _ => "──",
    };
    let arrow = match edge.direction {
        EdgeDirection::Forward => format!("{stroke}>"),
        EdgeDirection::Back => format!("<{stroke}"),
        EdgeDirection::Both => format!("<{stroke}>"),
        EdgeDirection::None => format!("{stroke}{}", &stroke[..stroke.len() / 2]),
    };

    let mut notes = Vec::new();
    if let Some(label) = &edge.attrs.label {
        notes.push(format!("\"{}\"", single_line(label)));
    }
    if let Some(color) = &edge.attrs.color {
        notes.push(color.clone());
    }

    let mut line = format!("{from} {arrow} {to}");
    if !notes.is_empty() {
        line.push_str(&format!("  [{}]", notes.join(", ")));
    }
    line
}
