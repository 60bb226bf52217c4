pub mod builder;
pub mod display_width;
pub mod dot;
pub mod error;
pub mod festival;
pub mod outline;
pub mod render;
pub mod topology;
pub mod topology_parser;

use std::path::{Path, PathBuf};

pub use builder::TopologyBuilder;
pub use error::{DiagramError, UsageError};
pub use render::{Format, Renderer};
pub use topology::{
    Category, Cluster, ClusterId, Direction, Edge, EdgeAttrs, EdgeDirection, EdgeStyle, Node,
    NodeId, Topology,
};

/// Lays out `topology` with Graphviz and writes it to `output_path`, in the format named
/// by the path's extension.
pub fn render(topology: &Topology, output_path: &Path) -> Result<PathBuf, DiagramError> {
    Renderer::new().render_to(topology, output_path)
}

/// DOT source for a `.topo` description.
pub fn render_dot(input: &str) -> Result<String, DiagramError> {
    let topology = topology_parser::parse_topology(input)?;
    Ok(dot::to_dot(&topology))
}

/// Text outline for a `.topo` description.
pub fn render_outline(input: &str) -> Result<String, DiagramError> {
    let topology = topology_parser::parse_topology(input)?;
    Ok(outline::render(&topology))
}
