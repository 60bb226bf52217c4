use std::fmt;
use std::str::FromStr;

/// Handle to a declared node. Only a [`crate::builder::TopologyBuilder`] hands these out,
/// and a handle is only valid for the builder that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) owner: u32,
    pub(crate) index: usize,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.index)
    }
}

/// Handle to a cluster, scoped to its builder like [`NodeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId {
    pub(crate) owner: u32,
    pub(crate) index: usize,
}

impl ClusterId {
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster_{}", self.index)
    }
}

/// Pictographic kind of a node. Decides the shape and colors it is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    GenericActor,
    GenericClient,
    Compute,
    Serverless,
    Database,
    ObjectStorage,
    Dns,
    NetworkGateway,
    LoadBalancer,
    MessageQueue,
    Monitoring,
    Identity,
    UserDirectory,
    CiCd,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::GenericActor,
        Category::GenericClient,
        Category::Compute,
        Category::Serverless,
        Category::Database,
        Category::ObjectStorage,
        Category::Dns,
        Category::NetworkGateway,
        Category::LoadBalancer,
        Category::MessageQueue,
        Category::Monitoring,
        Category::Identity,
        Category::UserDirectory,
        Category::CiCd,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::GenericActor => "generic-actor",
            Category::GenericClient => "generic-client",
            Category::Compute => "compute",
            Category::Serverless => "serverless",
            Category::Database => "database",
            Category::ObjectStorage => "object-storage",
            Category::Dns => "dns",
            Category::NetworkGateway => "network-gateway",
            Category::LoadBalancer => "load-balancer",
            Category::MessageQueue => "message-queue",
            Category::Monitoring => "monitoring",
            Category::Identity => "identity",
            Category::UserDirectory => "user-directory",
            Category::CiCd => "ci-cd",
        }
    }

    /// Graphviz shape standing in for the service icon.
    pub fn shape(self) -> &'static str {
        match self {
            Category::GenericActor => "ellipse",
            Category::GenericClient => "box3d",
            Category::Compute => "box",
            Category::Serverless => "component",
            Category::Database => "cylinder",
            Category::ObjectStorage => "folder",
            Category::Dns => "hexagon",
            Category::NetworkGateway => "cds",
            Category::LoadBalancer => "invtrapezium",
            Category::MessageQueue => "parallelogram",
            Category::Monitoring => "tab",
            Category::Identity => "octagon",
            Category::UserDirectory => "doubleoctagon",
            Category::CiCd => "rarrow",
        }
    }

    /// `(fillcolor, color)` pair, grouped the way the provider groups its icons.
    pub fn palette(self) -> (&'static str, &'static str) {
        match self {
            Category::GenericActor => ("#FFFFFF", "#232F3E"),
            Category::GenericClient => ("#F2F3F3", "#545B64"),
            Category::Compute | Category::Serverless => ("#FDEBD3", "#ED7100"),
            Category::Database => ("#F6E0F8", "#C925D1"),
            Category::ObjectStorage => ("#EAF3DC", "#7AA116"),
            Category::Dns | Category::NetworkGateway | Category::LoadBalancer => {
                ("#EFE6FF", "#8C4FFF")
            }
            Category::MessageQueue | Category::Monitoring => ("#FCE4EF", "#E7157B"),
            Category::Identity | Category::UserDirectory => ("#FBE2E5", "#DD344C"),
            Category::CiCd => ("#E3E6FA", "#3B48CC"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    TopBottom,
    BottomTop,
    #[default]
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn rankdir(self) -> &'static str {
        match self {
            Direction::TopBottom => "TB",
            Direction::BottomTop => "BT",
            Direction::LeftRight => "LR",
            Direction::RightLeft => "RL",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TB" | "TD" => Ok(Direction::TopBottom),
            "BT" => Ok(Direction::BottomTop),
            "LR" => Ok(Direction::LeftRight),
            "RL" => Ok(Direction::RightLeft),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeStyle {
    Solid,
    Dashed,
    Dotted,
}

impl EdgeStyle {
    pub fn name(self) -> &'static str {
        match self {
            EdgeStyle::Solid => "solid",
            EdgeStyle::Dashed => "dashed",
            EdgeStyle::Dotted => "dotted",
        }
    }
}

impl FromStr for EdgeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(EdgeStyle::Solid),
            "dashed" => Ok(EdgeStyle::Dashed),
            "dotted" => Ok(EdgeStyle::Dotted),
            other => Err(format!("unknown edge style: {other}")),
        }
    }
}

/// Which ends of an edge carry an arrowhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeDirection {
    #[default]
    Forward,
    Back,
    Both,
    None,
}

impl EdgeDirection {
    pub fn dot_dir(self) -> &'static str {
        match self {
            EdgeDirection::Forward => "forward",
            EdgeDirection::Back => "back",
            EdgeDirection::Both => "both",
            EdgeDirection::None => "none",
        }
    }
}

/// Optional decorations of an edge. Anything left unset falls back to the graph defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EdgeAttrs {
    pub style: Option<EdgeStyle>,
    pub color: Option<String>,
    pub label: Option<String>,
}

impl EdgeAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, style: EdgeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub category: Category,
    pub label: String,
    /// Innermost enclosing cluster.
    pub cluster: Option<ClusterId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: ClusterId,
    pub name: String,
    pub parent: Option<ClusterId>,
    pub depth: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub direction: EdgeDirection,
    pub attrs: EdgeAttrs,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// File stem used when the title has no usable characters.
pub const DEFAULT_FILE_STEM: &str = "diagram";

/// A finished, validated diagram: every edge endpoint and every cluster parent refers to
/// an entry of this topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub(crate) owner: u32,
    pub(crate) title: String,
    pub(crate) direction: Direction,
    pub(crate) nodes: Vec<Node>,
    pub(crate) clusters: Vec<Cluster>,
    pub(crate) edges: Vec<Edge>,
}

impl Topology {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Layout direction only; nodes, clusters and edges are fixed once built.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// The node behind `id`, or `None` for a handle issued by another builder.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|_| id.owner == self.owner)
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters
            .get(id.index)
            .filter(|_| id.owner == self.owner)
    }

    /// Nodes declared directly inside `scope` (`None` is the top level).
    pub fn nodes_in(&self, scope: Option<ClusterId>) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.cluster == scope)
    }

    /// Clusters opened directly inside `scope` (`None` is the top level).
    pub fn clusters_in(&self, scope: Option<ClusterId>) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(move |c| c.parent == scope)
    }

    /// Clusters enclosing `id`, outermost first. `None` for a foreign handle.
    pub fn cluster_path(&self, id: NodeId) -> Option<Vec<ClusterId>> {
        let mut path = Vec::new();
        let mut current = self.node(id)?.cluster;
        while let Some(cluster) = current {
            path.push(cluster);
            current = self.cluster(cluster).and_then(|c| c.parent);
        }
        path.reverse();
        Some(path)
    }

    /// Output file stem derived from the title: runs of whitespace and path separators
    /// become `_`, lower-cased. An empty title gives [`DEFAULT_FILE_STEM`].
    pub fn file_stem(&self) -> String {
        let stem = self
            .title
            .split(|c: char| c.is_whitespace() || matches!(c, '/' | '\\'))
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        if stem.is_empty() {
            DEFAULT_FILE_STEM.to_string()
        } else {
            stem
        }
    }
}
