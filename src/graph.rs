// Relationship graph anchored at the analyzed channel.
//
// Three edge kinds: the target mentions someone, the target forwards content
// from another channel, the target links to another channel. Node ids are
// unique; repeated edges between the same pair aggregate their weight.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::message::ContentItem;
use crate::target::extract_linked_handles;

/// How many forward sources become nodes.
pub const TOP_FORWARD_SOURCES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Channel,
    Mention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Mentions,
    ForwardsFrom,
    LinksTo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub weight: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl RelationshipGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

/// Insertion-ordered graph with idempotent node insertion.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<GraphNode>,
    node_ids: HashSet<String>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<(String, String, EdgeKind), usize>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns false (and changes nothing) if the id exists.
    pub fn add_node(&mut self, id: &str, kind: NodeKind, label: &str) -> bool {
        if !self.node_ids.insert(id.to_string()) {
            return false;
        }
        self.nodes.push(GraphNode {
            id: id.to_string(),
            kind,
            label: label.to_string(),
        });
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_ids.contains(id)
    }

    /// Add an edge, or add `weight` to an existing edge of the same kind
    /// between the same pair. Self-loops and zero weights are ignored.
    pub fn add_edge(&mut self, source: &str, target: &str, kind: EdgeKind, weight: u32) {
        if weight == 0 || source == target {
            return;
        }
        let key = (source.to_string(), target.to_string(), kind);
        if let Some(&idx) = self.edge_index.get(&key) {
            self.edges[idx].weight += weight;
            return;
        }
        self.edge_index.insert(key, self.edges.len());
        self.edges.push(GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            weight,
        });
    }

    pub fn build(self) -> RelationshipGraph {
        RelationshipGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}

/// Identity of the analyzed channel.
#[derive(Debug, Clone)]
pub struct GraphAnchor {
    /// Normalized handle from the request.
    pub handle: String,
    /// Resolved username, when the source knows one.
    pub username: Option<String>,
    pub title: Option<String>,
    /// Upstream numeric id, used to drop self-forwards.
    pub channel_id: Option<i64>,
}

impl GraphAnchor {
    pub fn node_id(&self) -> String {
        format!("@{}", self.username.as_deref().unwrap_or(&self.handle))
    }

    fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.handle)
    }

    /// True if `name` (with or without `@`) refers to this channel.
    pub fn is_self(&self, name: &str) -> bool {
        let bare = name.trim_start_matches('@');
        bare.eq_ignore_ascii_case(&self.handle)
            || self
                .username
                .as_deref()
                .is_some_and(|u| bare.eq_ignore_ascii_case(u))
    }
}

/// Relations extracted from a batch of items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationInputs {
    pub mentions: BTreeSet<String>,
    /// (source channel id, forwarded item count), most frequent first.
    pub forward_sources: Vec<(String, u32)>,
    pub linked_handles: BTreeSet<String>,
}

impl RelationInputs {
    /// Collect relations from item entities, forward headers and links in
    /// message text plus the channel description.
    pub fn collect(items: &[ContentItem], description: &str) -> Self {
        let mentions = items
            .iter()
            .flat_map(|i| i.mentions.iter().cloned())
            .collect();

        let mut forward_counts: HashMap<&str, u32> = HashMap::new();
        for source in items.iter().filter_map(|i| i.forward_source_id.as_deref()) {
            *forward_counts.entry(source).or_insert(0) += 1;
        }
        let mut forward_sources: Vec<(String, u32)> = forward_counts
            .into_iter()
            .map(|(id, n)| (id.to_string(), n))
            .collect();
        forward_sources.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut linked_handles = extract_linked_handles(description);
        for item in items {
            linked_handles.extend(extract_linked_handles(&item.text));
            for link in &item.link_entities {
                linked_handles.extend(extract_linked_handles(link));
            }
        }

        Self {
            mentions,
            forward_sources,
            linked_handles,
        }
    }
}

/// Build the graph for one channel.
pub fn build_graph(anchor: &GraphAnchor, relations: &RelationInputs) -> RelationshipGraph {
    let mut graph = GraphBuilder::new();
    let center = anchor.node_id();
    graph.add_node(&center, NodeKind::Channel, anchor.label());

    for mention in &relations.mentions {
        if anchor.is_self(mention) {
            continue;
        }
        graph.add_node(mention, NodeKind::Mention, mention);
        graph.add_edge(&center, mention, EdgeKind::Mentions, 1);
    }

    let own_id = anchor.channel_id.map(|id| id.to_string());
    for (source, count) in relations
        .forward_sources
        .iter()
        .filter(|(id, _)| own_id.as_deref() != Some(id.as_str()))
        .take(TOP_FORWARD_SOURCES)
    {
        let node = format!("channel:{source}");
        graph.add_node(&node, NodeKind::Channel, &format!("Channel {source}"));
        graph.add_edge(&node, &center, EdgeKind::ForwardsFrom, *count);
    }

    for handle in &relations.linked_handles {
        if anchor.is_self(handle) {
            continue;
        }
        let node = format!("@{handle}");
        if !graph.contains(&node) {
            graph.add_node(&node, NodeKind::Channel, handle);
        }
        graph.add_edge(&center, &node, EdgeKind::LinksTo, 1);
    }

    graph.build()
}
