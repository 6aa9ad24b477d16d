use std::fmt::Debug;
use std::hash::Hash;
use std::io::prelude::*;

use bstr::io::BufReadExt;
use bstr::ByteSlice;
use fxhash::FxHashMap;
use gfa::gfa::Line;
use gfa::parser::GFAParser;
use tracing::debug;

use crate::error::{Error, Result};

/// Anything usable as a node identifier: totally ordered, hashable,
/// and cheap to copy between worker threads.
pub trait NodeId: Copy + Ord + Hash + Debug + Send + Sync {}

impl<T> NodeId for T where T: Copy + Ord + Hash + Debug + Send + Sync {}

pub type Edge<N> = (N, N);

/// An edge relation as it arrives from ingestion, plus the nodes that
/// were declared without any incident edge. Edges may be directed or
/// already undirected, and may contain duplicates and self-loops.
#[derive(Debug, Clone)]
pub struct Graph<N> {
    pub edges: Vec<Edge<N>>,
    pub isolated: Vec<N>,
}

impl<N> Default for Graph<N> {
    fn default() -> Self {
        Graph {
            edges: Vec::new(),
            isolated: Vec::new(),
        }
    }
}

impl<N: NodeId> Graph<N> {
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = Edge<N>>,
    {
        Graph {
            edges: edges.into_iter().collect(),
            isolated: Vec::new(),
        }
    }

    pub fn with_isolated<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = N>,
    {
        self.isolated.extend(nodes);
        self
    }

    pub fn symmetrized(&self) -> Vec<Edge<N>> {
        symmetrize(&self.edges)
    }
}

/// Closes an edge relation under reversal: every `(u, v)` yields both
/// `(u, v)` and `(v, u)`. Duplicates are kept, the grouped minimum
/// downstream is idempotent.
pub fn symmetrize<N: Copy>(edges: &[Edge<N>]) -> Vec<Edge<N>> {
    edges.iter().flat_map(|&(u, v)| [(u, v), (v, u)]).collect()
}

impl Graph<u64> {
    /// Parses a whitespace separated edge list. Each line holds either
    /// a pair of node ids, or a single id declaring an isolated node.
    /// Columns after the second are ignored, as are blank lines and
    /// lines starting with `#`.
    pub fn from_edge_list_reader<T: BufRead>(reader: T) -> Result<Graph<u64>> {
        let mut graph = Graph::default();

        for (ix, line) in reader.byte_lines().enumerate() {
            let line = line?;
            let line_no = ix + 1;
            let line = line.trim();

            if line.starts_with(b"#") {
                continue;
            }

            let mut fields = line.fields();
            match (fields.next(), fields.next()) {
                (Some(from), Some(to)) => {
                    let from = parse_id(from, line_no)?;
                    let to = parse_id(to, line_no)?;
                    graph.edges.push((from, to));
                }
                (Some(node), None) => graph.isolated.push(parse_id(node, line_no)?),
                // blank line
                (None, _) => (),
            }
        }

        debug!(
            edges = graph.edges.len(),
            isolated = graph.isolated.len(),
            "parsed edge list"
        );

        Ok(graph)
    }
}

fn parse_id(field: &[u8], line: usize) -> Result<u64> {
    field
        .to_str()
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            Error::parse(line, format!("invalid node id {:?}", field.as_bstr()))
        })
}

/// A graph over dense segment indices built from a GFA file, including
/// the map required to go from node index back to GFA segment name
pub struct NamedGraph {
    pub graph: Graph<usize>,
    pub inv_names: Vec<String>,
}

impl NamedGraph {
    /// Constructs the edge relation of the given GFA input stream,
    /// parsing it line-by-line and only keeping segments and links.
    /// Segment names are numbered in order of first appearance, so the
    /// component id of a component is its earliest-seen segment.
    pub fn from_gfa_reader<T: BufRead>(reader: T) -> Result<NamedGraph> {
        let parser: GFAParser<Vec<u8>, ()> = GFAParser::new();

        let mut name_map: FxHashMap<Vec<u8>, usize> = FxHashMap::default();
        let mut inv_names = Vec::new();

        let mut get_ix = |name: &[u8]| {
            if let Some(ix) = name_map.get(name) {
                *ix
            } else {
                let ix = name_map.len();
                name_map.insert(name.to_vec(), ix);
                inv_names.push(name.to_str_lossy().into_owned());
                ix
            }
        };

        let mut graph = Graph::default();

        for (ix, line) in reader.byte_lines().enumerate() {
            let line = line?;
            let line_no = ix + 1;

            if !(line.starts_with(b"S\t") || line.starts_with(b"L\t")) {
                continue;
            }

            match parser.parse_gfa_line(&line) {
                Ok(Line::Segment(segment)) => {
                    graph.isolated.push(get_ix(&segment.name[..]));
                }
                Ok(Line::Link(link)) => {
                    let from_ix = get_ix(&link.from_segment[..]);
                    let to_ix = get_ix(&link.to_segment[..]);
                    graph.edges.push((from_ix, to_ix));
                }
                Ok(_) => (),
                Err(err) => {
                    let message = format!("malformed GFA record: {:?}", err);
                    return Err(Error::parse(line_no, message));
                }
            }
        }

        debug!(
            segments = inv_names.len(),
            links = graph.edges.len(),
            "parsed GFA"
        );

        Ok(NamedGraph { graph, inv_names })
    }

    pub fn name(&self, ix: usize) -> &str {
        &self.inv_names[ix]
    }
}
