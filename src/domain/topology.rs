//! Story topology
//!
//! Builds the directed graph of a story: one node per scene (or per page),
//! one edge per distinct link between two nodes. Links that resolve to
//! nothing get a ghost node instead of an error, so a half-written story
//! still produces a graph. Uses petgraph for graph operations.
//!
//! Output ordering is a pure function of the input:
//! - real nodes in story order, then ghost nodes in first-seen order
//! - edges by descending distance between their endpoints, ties in
//!   discovery order

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

use super::link::LinkTarget;
use super::story::PublishedScene;
use super::validate::{TargetOwner, TargetUniverse};

/// Granularity of the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TopologyLevel {
    #[default]
    Scene,
    Page,
}

impl std::fmt::Display for TopologyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyLevel::Scene => write!(f, "scene"),
            TopologyLevel::Page => write!(f, "page"),
        }
    }
}

impl std::str::FromStr for TopologyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scene" | "scenes" => Ok(TopologyLevel::Scene),
            "page" | "pages" => Ok(TopologyLevel::Page),
            _ => Err(format!("Unknown topology level: {}", s)),
        }
    }
}

/// A scene, a page, or a ghost standing in for a missing target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyNode {
    pub id: String,
    pub title: String,
    pub anchor: Option<LinkTarget>,
    pub is_ghost: bool,

    /// First non-empty display text of a link to this ghost
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ghost_label: Option<String>,

    pub page_count: usize,
    pub is_opening: bool,
}

impl TopologyNode {
    fn ghost(target: &LinkTarget, label: Option<String>) -> Self {
        Self {
            id: format!("missing-{}", target),
            title: format!("Missing: {}", target),
            anchor: None,
            is_ghost: true,
            ghost_label: label,
            page_count: 0,
            is_opening: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyEdge {
    pub source_index: usize,
    pub target_index: usize,
    pub is_ghost: bool,
}

impl TopologyEdge {
    /// Distance between the endpoints in node order
    pub fn span(&self) -> usize {
        self.source_index.abs_diff(self.target_index)
    }
}

/// Plain node/edge lists, as handed to renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyView {
    pub level: TopologyLevel,
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}

/// Directed link graph of a story
#[derive(Debug)]
pub struct StoryTopology {
    level: TopologyLevel,

    /// Node weights; the edge weight is the ghost flag
    graph: DiGraph<TopologyNode, bool>,

    /// Edges in output order
    edges: Vec<TopologyEdge>,
}

enum PendingTarget {
    Real(usize),
    Ghost(LinkTarget),
}

/// Builds the topology of a story's scenes. Never fails.
pub fn build_topology(scenes: &[PublishedScene], level: TopologyLevel) -> StoryTopology {
    let universe = TargetUniverse::of(scenes);
    let mut graph = DiGraph::new();

    // Index of each scene's first node (scene level: one node per scene)
    let mut first_node = Vec::with_capacity(scenes.len());

    for scene in scenes {
        first_node.push(graph.node_count());

        match level {
            TopologyLevel::Scene => {
                graph.add_node(TopologyNode {
                    id: scene.id.to_string(),
                    title: scene.title.clone(),
                    anchor: scene.anchor().cloned(),
                    is_ghost: false,
                    ghost_label: None,
                    page_count: scene.pages.len(),
                    is_opening: scene.is_opening_scene,
                });
            }
            TopologyLevel::Page => {
                for (position, page) in scene.pages.iter().enumerate() {
                    graph.add_node(TopologyNode {
                        id: format!("{}#{}", scene.id, page.link),
                        title: page
                            .heading()
                            .filter(|heading| !heading.is_empty())
                            .map(str::to_string)
                            .unwrap_or_else(|| format!("Page {}", position + 1)),
                        anchor: Some(page.link.clone()),
                        is_ghost: false,
                        ghost_label: None,
                        page_count: 1,
                        is_opening: scene.is_opening_scene && position == 0,
                    });
                }
            }
        }
    }

    // None when the owner has no node, e.g. a page-level anchor of a scene
    // without pages
    let node_of = |owner: TargetOwner| -> Option<usize> {
        let first = *first_node.get(owner.scene)?;
        match level {
            TopologyLevel::Scene => Some(first),
            TopologyLevel::Page => {
                let page = owner.page.unwrap_or(0);
                (page < scenes[owner.scene].pages.len()).then_some(first + page)
            }
        }
    };

    let mut pending = Vec::new();
    let mut ghost_order: Vec<LinkTarget> = Vec::new();
    let mut ghost_labels: HashMap<LinkTarget, String> = HashMap::new();

    for (scene_index, scene) in scenes.iter().enumerate() {
        for (position, page) in scene.pages.iter().enumerate() {
            let Some(source) = node_of(TargetOwner {
                scene: scene_index,
                page: Some(position),
            }) else {
                continue;
            };

            for (text, target) in page.links() {
                match universe.resolve(target.as_str()).and_then(node_of) {
                    Some(index) => pending.push((source, PendingTarget::Real(index))),
                    None => {
                        if !ghost_order.contains(target) {
                            ghost_order.push(target.clone());
                        }
                        if !text.is_empty() && !ghost_labels.contains_key(target) {
                            ghost_labels.insert(target.clone(), text.to_string());
                        }
                        pending.push((source, PendingTarget::Ghost(target.clone())));
                    }
                }
            }
        }
    }

    let mut ghost_nodes = HashMap::new();
    for target in &ghost_order {
        let index = graph.add_node(TopologyNode::ghost(target, ghost_labels.remove(target)));
        ghost_nodes.insert(target.clone(), index.index());
    }

    let mut edges = Vec::new();
    for (source, target) in pending {
        let (target, is_ghost) = match target {
            PendingTarget::Real(index) => (Some(index), false),
            PendingTarget::Ghost(link) => (ghost_nodes.get(&link).copied(), true),
        };

        let Some(target) = target else { continue };
        if source == target {
            continue;
        }

        let (from, to) = (NodeIndex::new(source), NodeIndex::new(target));
        if graph.find_edge(from, to).is_some() {
            continue;
        }

        graph.add_edge(from, to, is_ghost);
        edges.push(TopologyEdge {
            source_index: source,
            target_index: target,
            is_ghost,
        });
    }

    // Stable, so equal spans keep discovery order
    edges.sort_by_key(|edge| Reverse(edge.span()));

    StoryTopology {
        level,
        graph,
        edges,
    }
}

impl StoryTopology {
    pub fn level(&self) -> TopologyLevel {
        self.level
    }

    /// Iterates nodes in index order
    pub fn nodes(&self) -> impl Iterator<Item = &TopologyNode> {
        self.graph.node_indices().map(|index| &self.graph[index])
    }

    pub fn node(&self, index: usize) -> Option<&TopologyNode> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// Edges, longest first
    pub fn edges(&self) -> &[TopologyEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Iterates ghost nodes in first-seen order
    pub fn ghosts(&self) -> impl Iterator<Item = &TopologyNode> {
        self.nodes().filter(|node| node.is_ghost)
    }

    /// Real nodes no path from an opening node reaches
    ///
    /// Empty when the story has no opening scene, since there is nowhere to
    /// start walking from.
    pub fn unreachable(&self) -> Vec<usize> {
        let starts: Vec<_> = self
            .graph
            .node_indices()
            .filter(|&index| self.graph[index].is_opening)
            .collect();

        if starts.is_empty() {
            return vec![];
        }

        let mut reached = vec![false; self.graph.node_count()];
        for start in starts {
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(index) = bfs.next(&self.graph) {
                reached[index.index()] = true;
            }
        }

        self.graph
            .node_indices()
            .filter(|&index| !reached[index.index()] && !self.graph[index].is_ghost)
            .map(|index| index.index())
            .collect()
    }

    /// Snapshot as plain lists
    pub fn view(&self) -> TopologyView {
        TopologyView {
            level: self.level,
            nodes: self.nodes().cloned().collect(),
            edges: self.edges.clone(),
        }
    }
}
