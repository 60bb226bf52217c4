use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

use crate::error::UsageError;
use crate::topology::*;

static NEXT_OWNER: AtomicU32 = AtomicU32::new(0);

/// Collects nodes, cluster nesting and edges for one diagram.
///
/// Clusters are tracked on a stack: nodes and clusters declared between
/// [`enter_cluster`](Self::enter_cluster) and [`exit_cluster`](Self::exit_cluster) land
/// inside the innermost open cluster. [`cluster`](Self::cluster) wraps the pair around a
/// closure so the scope is always closed.
#[derive(Debug)]
pub struct TopologyBuilder {
    owner: u32,
    title: String,
    direction: Direction,
    nodes: Vec<Node>,
    clusters: Vec<Cluster>,
    edges: Vec<Edge>,
    open: Vec<ClusterId>,
}

impl TopologyBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            title: title.into(),
            direction: Direction::default(),
            nodes: Vec::new(),
            clusters: Vec::new(),
            edges: Vec::new(),
            open: Vec::new(),
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Number of clusters currently open.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn declare_node(&mut self, category: Category, label: impl Into<String>) -> NodeId {
        let id = NodeId {
            owner: self.owner,
            index: self.nodes.len(),
        };
        let label = label.into();
        debug!(%id, %category, label = %label, "declare node");
        self.nodes.push(Node {
            id,
            category,
            label,
            cluster: self.open.last().copied(),
        });
        id
    }

    pub fn enter_cluster(&mut self, name: impl Into<String>) -> ClusterId {
        let id = ClusterId {
            owner: self.owner,
            index: self.clusters.len(),
        };
        let name = name.into();
        debug!(%id, name = %name, depth = self.open.len(), "enter cluster");
        self.clusters.push(Cluster {
            id,
            name,
            parent: self.open.last().copied(),
            depth: self.open.len(),
        });
        self.open.push(id);
        id
    }

    pub fn exit_cluster(&mut self) -> Result<ClusterId, UsageError> {
        let id = self.open.pop().ok_or(UsageError::UnmatchedClusterExit)?;
        debug!(%id, "exit cluster");
        Ok(id)
    }

    /// Runs `body` inside a new cluster and closes it afterwards, whatever `body` returns.
    ///
    /// Fails if `body` closed the cluster itself or left one of its own clusters open.
    pub fn cluster<T>(
        &mut self,
        name: impl Into<String>,
        body: impl FnOnce(&mut Self) -> Result<T, UsageError>,
    ) -> Result<T, UsageError> {
        let outer = self.open.clone();
        let id = self.enter_cluster(name);
        let result = body(self);

        let position = self.open.iter().position(|&open| open == id);
        let left_open = position.and_then(|p| self.open.get(p + 1).copied());
        // Back to exactly the clusters the caller had open, even if `body` exited past them.
        self.open = outer;
        debug!(%id, "exit cluster");

        if position.is_none() {
            return result.and(Err(UsageError::UnmatchedClusterExit));
        }
        let value = result?;
        match left_open {
            Some(inner) => Err(UsageError::UnclosedCluster(
                self.clusters[inner.index].name.clone(),
            )),
            None => Ok(value),
        }
    }

    /// Records a forward edge `source -> target`. Self-edges are allowed.
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        attrs: EdgeAttrs,
    ) -> Result<(), UsageError> {
        self.link(source, target, EdgeDirection::Forward, attrs)
    }

    pub fn link(
        &mut self,
        source: NodeId,
        target: NodeId,
        direction: EdgeDirection,
        attrs: EdgeAttrs,
    ) -> Result<(), UsageError> {
        self.check(source)?;
        self.check(target)?;
        debug!(from = %source, to = %target, dir = direction.dot_dir(), "edge");
        self.edges.push(Edge {
            from: source,
            to: target,
            direction,
            attrs,
        });
        Ok(())
    }

    /// One edge from `source` to each target, in order.
    pub fn fan_out(
        &mut self,
        source: NodeId,
        targets: &[NodeId],
        attrs: EdgeAttrs,
    ) -> Result<(), UsageError> {
        self.check(source)?;
        self.check_all(targets)?;
        for &target in targets {
            self.link(source, target, EdgeDirection::Forward, attrs.clone())?;
        }
        Ok(())
    }

    /// One edge from each source to `target`, in order.
    pub fn fan_in(
        &mut self,
        sources: &[NodeId],
        target: NodeId,
        attrs: EdgeAttrs,
    ) -> Result<(), UsageError> {
        self.check_all(sources)?;
        self.check(target)?;
        for &source in sources {
            self.link(source, target, EdgeDirection::Forward, attrs.clone())?;
        }
        Ok(())
    }

    /// `a >> b >> c`: one forward edge per consecutive pair.
    pub fn chain(&mut self, nodes: &[NodeId], attrs: EdgeAttrs) -> Result<(), UsageError> {
        self.check_all(nodes)?;
        for pair in nodes.windows(2) {
            self.link(pair[0], pair[1], EdgeDirection::Forward, attrs.clone())?;
        }
        Ok(())
    }

    pub fn build(self) -> Result<Topology, UsageError> {
        if let Some(&id) = self.open.last() {
            return Err(UsageError::UnclosedCluster(self.clusters[id.index].name.clone()));
        }
        debug!(
            title = %self.title,
            nodes = self.nodes.len(),
            clusters = self.clusters.len(),
            edges = self.edges.len(),
            "topology built"
        );
        Ok(Topology {
            owner: self.owner,
            title: self.title,
            direction: self.direction,
            nodes: self.nodes,
            clusters: self.clusters,
            edges: self.edges,
        })
    }

    fn check(&self, id: NodeId) -> Result<(), UsageError> {
        if id.owner == self.owner && id.index < self.nodes.len() {
            Ok(())
        } else {
            Err(UsageError::UnknownNode(id))
        }
    }

    fn check_all(&self, ids: &[NodeId]) -> Result<(), UsageError> {
        ids.iter().try_for_each(|&id| self.check(id))
    }
}
