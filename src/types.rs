//! Core data types and structures for the pad assignment engine.
//!
//! This module defines the fundamental data structures shared by every
//! resolver: node, link and graph identifiers, pad assignments, the link
//! topology view the engine consumes, and the transient per-node usage state
//! built up during a single resolution call.

use crate::capacity::PadCapacityModel;
use crate::constants::FIRST_OVERFLOW_PAD;
use crate::error::PadError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Unique identifier for diagram nodes.
pub type NodeId = Uuid;

/// Unique identifier for directed links between nodes.
pub type LinkId = Uuid;

/// Unique identifier for a graph (the root diagram or an instance sub-graph).
pub type GraphId = Uuid;

/// Index of a single pad on a node's rendered boundary.
///
/// Non-negative values index a physical pad; negative values denote overflow
/// pads that exist only conceptually and are rendered later as node
/// extensions.
pub type PadIndex = i32;

/// The resolved pad pair for one link: where it departs its source node and
/// where it arrives on its target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadAssignment {
    /// Pad the link departs from on its source node
    pub launch: PadIndex,
    /// Pad the link arrives at on its target node
    pub landing: PadIndex,
}

impl PadAssignment {
    /// Creates an assignment from a launch/landing pair.
    pub fn new(launch: PadIndex, landing: PadIndex) -> Self {
        Self { launch, landing }
    }
}

/// A directed link between two nodes, carrying its current (possibly stale
/// or imported) pad assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier for this link
    pub id: LinkId,
    /// ID of the source node
    pub source: NodeId,
    /// ID of the target node
    pub target: NodeId,
    /// Pad the link currently launches from
    pub launch: PadIndex,
    /// Pad the link currently lands on
    pub landing: PadIndex,
}

impl Link {
    /// Creates a new link between two nodes with the given pad pair.
    ///
    /// # Arguments
    ///
    /// * `source` - The ID of the source node
    /// * `target` - The ID of the target node
    /// * `pads` - The launch/landing pair the link starts out with
    ///
    /// # Returns
    ///
    /// A new link with a unique ID.
    pub fn new(source: NodeId, target: NodeId, pads: PadAssignment) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            target,
            launch: pads.launch,
            landing: pads.landing,
        }
    }

    /// The link's current pad pair.
    pub fn pads(&self) -> PadAssignment {
        PadAssignment::new(self.launch, self.landing)
    }

    /// True when the link starts and ends on the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A node as the engine sees it: an identifier plus the pad capacity of its
/// node type. Everything else about a node (name, position, semantics) lives
/// with the external graph model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadNode {
    /// Unique identifier for this node
    pub id: NodeId,
    /// Pad limits of the node's type
    pub capacity: PadCapacityModel,
}

impl PadNode {
    /// Creates a new node with a unique ID and the given capacity.
    pub fn new(capacity: PadCapacityModel) -> Self {
        Self {
            id: Uuid::new_v4(),
            capacity,
        }
    }
}

/// One diagram graph: all nodes indexed by their ID plus the list of links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadGraph {
    /// Unique identifier for this graph
    pub id: GraphId,
    /// Map of all nodes in the graph, indexed by their ID
    pub nodes: HashMap<NodeId, PadNode>,
    /// List of all links between nodes
    pub links: Vec<Link>,
}

impl Default for PadGraph {
    /// Creates a new empty graph with no nodes or links.
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            nodes: HashMap::new(),
            links: Vec::new(),
        }
    }
}

impl PadGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the graph to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a graph from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Adds a node to the graph.
    ///
    /// # Returns
    ///
    /// The ID of the newly added node.
    pub fn add_node(&mut self, node: PadNode) -> NodeId {
        let id = node.id;
        self.nodes.insert(id, node);
        id
    }

    /// Adds a link between two existing nodes.
    ///
    /// # Arguments
    ///
    /// * `source` - The ID of the source node
    /// * `target` - The ID of the target node
    /// * `pads` - The launch/landing pair the link starts out with
    ///
    /// # Returns
    ///
    /// The ID of the new link, or an error if either endpoint doesn't exist.
    pub fn add_link(
        &mut self,
        source: NodeId,
        target: NodeId,
        pads: PadAssignment,
    ) -> Result<LinkId, PadError> {
        if !self.nodes.contains_key(&source) {
            return Err(PadError::UnknownSource);
        }
        if !self.nodes.contains_key(&target) {
            return Err(PadError::UnknownTarget);
        }

        let link = Link::new(source, target, pads);
        let id = link.id;
        self.links.push(link);
        Ok(id)
    }

    /// Removes a node and all links touching it.
    ///
    /// # Returns
    ///
    /// `true` if the node was found and removed, `false` otherwise.
    pub fn remove_node(&mut self, node_id: &NodeId) -> bool {
        let removed = self.nodes.remove(node_id).is_some();
        if removed {
            self.links
                .retain(|link| link.source != *node_id && link.target != *node_id);
        }
        removed
    }

    /// Looks up a link by ID.
    pub fn link(&self, link_id: &LinkId) -> Option<&Link> {
        self.links.iter().find(|l| l.id == *link_id)
    }

    /// Looks up a link by ID for mutation.
    pub fn link_mut(&mut self, link_id: &LinkId) -> Option<&mut Link> {
        self.links.iter_mut().find(|l| l.id == *link_id)
    }

    /// The pad capacity of a node, if the node exists.
    pub fn capacity(&self, node_id: &NodeId) -> Option<&PadCapacityModel> {
        self.nodes.get(node_id).map(|n| &n.capacity)
    }
}

/// A whole diagram model: the root graph plus its instance sub-graphs, all
/// scanned as one unit by the audit pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagramModel {
    /// All graphs in the model; by convention the root graph comes first
    pub graphs: Vec<PadGraph>,
}

impl DiagramModel {
    /// Creates a model holding just the given root graph.
    pub fn new(root: PadGraph) -> Self {
        Self { graphs: vec![root] }
    }

    /// Looks up a graph by ID.
    pub fn graph(&self, graph_id: &GraphId) -> Option<&PadGraph> {
        self.graphs.iter().find(|g| g.id == *graph_id)
    }

    /// Looks up a graph by ID for mutation.
    pub fn graph_mut(&mut self, graph_id: &GraphId) -> Option<&mut PadGraph> {
        self.graphs.iter_mut().find(|g| g.id == *graph_id)
    }
}

/// One candidate pad for one link, ranked and scored by the external
/// renderer that knows node and neighbor positions.
///
/// `rank` is the position within the link's own preference list (0 = most
/// preferred); `score` is the continuous desirability used to break ties
/// between competing links claiming the same pad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedPadChoice {
    /// Link this choice belongs to
    pub link: LinkId,
    /// The candidate pad
    pub pad: PadIndex,
    /// Position within the link's preference list, 0 = most preferred
    pub rank: u32,
    /// Continuous desirability, higher is better
    pub score: f64,
}

/// Pads already in use on a single node, gathered while resolving.
///
/// Built fresh per resolution call from the link topology and discarded when
/// the call returns; never persisted.
#[derive(Debug, Clone, Default)]
pub struct NodePadUsage {
    /// Launch pad shared by the node's outbound links, if any
    pub source_pad: Option<PadIndex>,
    /// Fixed landing pads currently occupied
    pub occupied_landings: BTreeSet<PadIndex>,
    /// Overflow pads currently occupied
    pub overflow_pads: BTreeSet<PadIndex>,
}

impl NodePadUsage {
    /// Gathers the pads used on `node` by the given links.
    ///
    /// With an index the scan touches only the node's own links; without one
    /// it walks the whole link list.
    pub fn for_node(node: NodeId, links: &[Link], index: Option<&LinkIndex>) -> Self {
        let mut usage = Self::default();
        match index {
            Some(idx) => {
                for &pos in idx.outbound(&node) {
                    usage.note_launch(links[pos].launch);
                }
                for &pos in idx.inbound(&node) {
                    usage.note_landing(links[pos].landing);
                }
            }
            None => {
                for link in links {
                    if link.source == node {
                        usage.note_launch(link.launch);
                    }
                    if link.target == node {
                        usage.note_landing(link.landing);
                    }
                }
            }
        }
        usage
    }

    /// Records a launch pad; the first non-negative one seen wins.
    pub fn note_launch(&mut self, pad: PadIndex) {
        if self.source_pad.is_none() && pad >= 0 {
            self.source_pad = Some(pad);
        }
    }

    /// Records an occupied landing pad, routing overflow indices to their
    /// own set.
    pub fn note_landing(&mut self, pad: PadIndex) {
        if PadCapacityModel::is_overflow(pad) {
            self.overflow_pads.insert(pad);
        } else {
            self.occupied_landings.insert(pad);
        }
    }

    /// The next unused overflow index: one below the lowest already in use.
    pub fn next_overflow_pad(&self) -> PadIndex {
        self.overflow_pads
            .iter()
            .next()
            .map(|lowest| lowest - 1)
            .unwrap_or(FIRST_OVERFLOW_PAD)
    }
}

/// Inverted topology index mapping each node to the positions of its
/// outbound and inbound links in the link list.
///
/// Optional everywhere it is accepted; it turns the per-link scans into
/// O(degree) lookups, which batch operations over large graphs rely on.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    outbound: HashMap<NodeId, Vec<usize>>,
    inbound: HashMap<NodeId, Vec<usize>>,
}

impl LinkIndex {
    /// Builds the index over a link list.
    pub fn build(links: &[Link]) -> Self {
        let mut index = Self::default();
        for (pos, link) in links.iter().enumerate() {
            index.note_link(pos, link);
        }
        index
    }

    /// Registers one more link at `pos`; used when a topology is extended
    /// incrementally during a batch rebuild.
    pub fn note_link(&mut self, pos: usize, link: &Link) {
        self.outbound.entry(link.source).or_default().push(pos);
        self.inbound.entry(link.target).or_default().push(pos);
    }

    /// Positions of the links launching from `node`.
    pub fn outbound(&self, node: &NodeId) -> &[usize] {
        self.outbound.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positions of the links landing on `node`.
    pub fn inbound(&self, node: &NodeId) -> &[usize] {
        self.inbound.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A single pending repair produced by the audit pass.
///
/// Fixups are returned rather than applied so the audit itself is
/// side-effect-free and can be dry-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadFixup {
    /// Graph the link lives in
    pub graph: GraphId,
    /// Link to repair
    pub link: LinkId,
    /// True to change the link's launch pad, false its landing pad
    pub is_launch_change: bool,
    /// The pad value to write
    pub new_pad: PadIndex,
}
