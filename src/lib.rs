//! Connected components of large undirected graphs by bulk-synchronous
//! min-label propagation.
//!
//! Every node starts labelled with its own id. Each step replaces a
//! node's label with the minimum over itself and its neighbors, reading
//! only the previous generation, until two consecutive generations are
//! identical. At that point every node carries the smallest id of its
//! connected component. A component of diameter `D` settles within `D`
//! steps; the driver is bounded by a caller-supplied iteration cap and
//! reports whether the result is a certified fixed point.
//!
//! ```
//! use min_label_components::compute_connected_components;
//!
//! let edges = vec![(1u64, 2), (2, 3), (6, 7)];
//! let result = compute_connected_components(edges, vec![8], 10).unwrap();
//!
//! assert!(result.converged);
//! assert_eq!(result.assignment[&3], 1);
//! assert_eq!(result.assignment[&7], 6);
//! assert_eq!(result.assignment[&8], 8);
//! ```

pub mod adjacency;
pub mod algorithm;
pub mod error;
pub mod graph;
pub mod report;
pub mod state;

pub use adjacency::Adjacency;
pub use algorithm::{
    compute_connected_components, ComponentAssignment, LabelPropagation, Outcome, Strategy,
};
pub use error::{Error, Result};
pub use graph::{Graph, NamedGraph, NodeId};
pub use report::{report, report_reader, Format, ReportOptions};
pub use state::{Components, Labels};
