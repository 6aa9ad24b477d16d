use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::adjacency::Adjacency;
use crate::algorithm::{ComponentAssignment, LabelPropagation};
use crate::error::Result;
use crate::graph::{Graph, NamedGraph, NodeId};

/// Input format of the command-line tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// GFA for files ending in `.gfa`, an edge list otherwise.
    Auto,
    Gfa,
    Tsv,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Format::Auto),
            "gfa" => Ok(Format::Gfa),
            "tsv" | "edges" => Ok(Format::Tsv),
            other => Err(format!("unknown input format '{}'", other)),
        }
    }
}

impl Format {
    /// Replaces `Auto` with the format implied by `path`. Standard input
    /// is read as an edge list.
    pub fn resolve(self, path: Option<&Path>) -> Format {
        match self {
            Format::Auto => match path.and_then(Path::extension) {
                Some(ext) if ext == "gfa" => Format::Gfa,
                _ => Format::Tsv,
            },
            format => format,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Components with fewer members are left out of the listing.
    pub min_size: usize,
    pub json: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            min_size: 1,
            json: false,
        }
    }
}

/// Reads a graph in `format` from `reader`, runs `propagation` on it
/// and writes the report to `out`. `Auto` is read as an edge list;
/// resolve it against the input path first.
///
/// Returns whether the labels converged.
pub fn report_reader<R, W>(
    out: &mut W,
    reader: R,
    format: Format,
    propagation: &LabelPropagation,
    options: &ReportOptions,
) -> Result<bool>
where
    R: BufRead,
    W: Write,
{
    match format {
        Format::Gfa => {
            let named = NamedGraph::from_gfa_reader(reader)?;
            report(out, propagation, &named.graph, options, |ix| {
                named.name(ix).to_string()
            })
        }
        Format::Auto | Format::Tsv => {
            let graph = Graph::from_edge_list_reader(reader)?;
            report(out, propagation, &graph, options, |n: u64| n.to_string())
        }
    }
}

/// Runs the propagation over `graph` and writes the components to
/// `out`, using `name` to display node ids. Returns whether the labels
/// converged.
///
/// The text form is a header of `# key: value` lines followed by one
/// `component:` line per component with at least `min_size` members.
/// The header always counts every component.
pub fn report<N, F, W>(
    out: &mut W,
    propagation: &LabelPropagation,
    graph: &Graph<N>,
    options: &ReportOptions,
    name: F,
) -> Result<bool>
where
    N: NodeId,
    F: Fn(N) -> String,
    W: Write,
{
    let adjacency = Adjacency::from_graph(graph);
    info!(
        nodes = adjacency.num_nodes(),
        rows = adjacency.num_rows(),
        "built adjacency relation"
    );

    let outcome = propagation.run(&adjacency);
    let converged = outcome.is_converged();
    if !converged {
        warn!(
            iterations = outcome.iterations(),
            "labels did not converge, components may be split"
        );
    }

    if options.json {
        let record = ComponentAssignment {
            assignment: outcome
                .labels()
                .iter()
                .map(|(node, label)| (name(node), name(label)))
                .collect(),
            converged,
            iterations_used: outcome.iterations(),
        };
        serde_json::to_writer_pretty(&mut *out, &record)?;
        writeln!(out)?;
    } else {
        let mut components = outcome.labels().components();

        writeln!(out, "# nodes: {}", adjacency.num_nodes())?;
        writeln!(out, "# edges: {}", graph.edges.len())?;
        writeln!(out, "# of components: {}", components.len())?;
        writeln!(out, "# converged: {}", converged)?;
        writeln!(out, "# iterations: {}", outcome.iterations())?;

        components.retain_min_size(options.min_size);
        for (_id, members) in components.iter() {
            write!(out, "component:")?;
            for &member in members {
                write!(out, " {}", name(member))?;
            }
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(converged)
}
