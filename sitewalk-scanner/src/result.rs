use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

/// Terminal result of a single fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The server answered with this HTTP status.
    Status(u16),
    /// The request never produced a status (timeout, DNS, refused connection, ...).
    Error(String),
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Status(200))
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, FetchOutcome::Status(code) if (300..400).contains(code))
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchOutcome::Status(code) => Some(*code),
            FetchOutcome::Error(_) => None,
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Status(code) => write!(f, "{}", code),
            FetchOutcome::Error(cause) => write!(f, "Error: {}", cause),
        }
    }
}

// Statuses serialize as JSON numbers, errors as "Error: <cause>" strings.
impl Serialize for FetchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FetchOutcome::Status(code) => serializer.serialize_u16(*code),
            FetchOutcome::Error(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for FetchOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u16),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Code(code) => FetchOutcome::Status(code),
            Raw::Text(text) => match text.strip_prefix("Error: ") {
                Some(cause) => FetchOutcome::Error(cause.to_string()),
                None => FetchOutcome::Error(text),
            },
        })
    }
}

/// One outcome per fetched URL, ordered by URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMap {
    entries: BTreeMap<String, FetchOutcome>,
}

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome for `url`. A URL is only ever recorded once; a second
    /// record is ignored and reported as `false`.
    pub fn record(&mut self, url: &str, outcome: FetchOutcome) -> bool {
        if self.entries.contains_key(url) {
            warn!("Ignoring second outcome for {}", url);
            return false;
        }
        self.entries.insert(url.to_string(), outcome);
        true
    }

    pub fn get(&self, url: &str) -> Option<&FetchOutcome> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FetchOutcome)> {
        self.entries.iter().map(|(url, outcome)| (url.as_str(), outcome))
    }
}

impl FromIterator<(String, FetchOutcome)> for StatusMap {
    fn from_iter<I: IntoIterator<Item = (String, FetchOutcome)>>(iter: I) -> Self {
        let mut map = StatusMap::new();
        for (url, outcome) in iter {
            map.record(&url, outcome);
        }
        map
    }
}

/// Directed page-to-page link graph. Nodes are URLs, an edge `a -> b` means
/// page `a` links to `b`. Each (source, target) pair is stored once.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, url: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(url) {
            return *idx;
        }
        let idx = self.graph.add_node(url.to_string());
        self.index.insert(url.to_string(), idx);
        idx
    }

    /// Adds `source -> target`, creating either node if needed.
    pub fn add_edge(&mut self, source: &str, target: &str) {
        let a = self.add_node(source);
        let b = self.add_node(target);
        self.graph.update_edge(a, b, ());
    }

    pub fn contains_node(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(a), Some(b)) => self.graph.contains_edge(*a, *b),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
            )
        })
    }

    /// Link targets of `url`, sorted. Unknown URLs have no successors.
    pub fn successors(&self, url: &str) -> Vec<&str> {
        let Some(idx) = self.index.get(url) else {
            return Vec::new();
        };
        let mut targets: Vec<&str> = self
            .graph
            .neighbors(*idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        targets.sort_unstable();
        targets
    }

    /// Adjacency list keyed by source URL; every node appears as a key.
    pub fn to_adjacency(&self) -> BTreeMap<String, Vec<String>> {
        self.graph
            .node_indices()
            .map(|idx| {
                let url = &self.graph[idx];
                let targets = self
                    .successors(url)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (url.clone(), targets)
            })
            .collect()
    }
}

/// Everything a crawl hands back to its caller.
#[derive(Debug, Clone)]
pub struct CrawlOutput {
    pub seed: String,
    pub status: StatusMap,
    pub graph: LinkGraph,
    pub rounds: usize,
}
