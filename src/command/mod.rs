//! Reversible edit commands.
//!
//! A command is built against the current graph (its constructor performs
//! every argument check and is the `PreValidated` state), then handed to
//! [`Session::execute`], which repeats those checks on the graph of the
//! moment before anything is touched. Execution runs inside an [`EditTx`]; any error rolls
//! the transaction back, success commits it and records it in the
//! [`History`].

pub mod history;
pub mod session;
pub mod state;
pub mod tx;

pub use history::{CommandTrace, CommittedCommand, History, TraceAction, TraceRecord};
pub use session::Session;
pub use state::CommandState;
pub use tx::{ChangeSet, CommandReport, EditTx, Tracked};

use crate::algs::associate::SetGeomAssociation;
use crate::algs::builder::{NewBlock, NewBlockGrid, NewFaceGrid};
use crate::algs::destroy::DestroyEntities;
use crate::algs::edge_split::SplitEdge;
use crate::algs::extrude::ExtrudeFaces;
use crate::algs::fuse::{Fuse2Blocks, Fuse2Vertices, Glue2Blocks};
use crate::algs::nb_edges::SetNbMeshingEdges;
use crate::algs::ogrid_blocks::SplitBlocksWithOgrid;
use crate::algs::ogrid_faces::SplitFacesWithOgrid;
use crate::algs::revolution::MakeBlocksByRevol;
use crate::algs::smoothing::SmoothVertices;
use crate::algs::snap::SnapVertices;
use crate::algs::split_blocks::SplitBlocks;
use crate::algs::split_faces::SplitFaces;
use crate::topo_error::TopoError;
use crate::topology::graph::TopoGraph;

/// Shared protocol of every edit command.
pub trait TopoCommand {
    /// Name used in the trace, e.g. `"SplitBlocks"`.
    fn name(&self) -> &'static str;

    /// Runs the construction checks again on `graph` just before
    /// execution. A command built earlier may name entities that an undo or
    /// another command destroyed since; derived data is refreshed.
    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError>;

    /// Mutates the graph through `tx`. An error rolls everything back.
    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError>;

    /// Entity names and parameters of this invocation.
    fn trace(&self, graph: &TopoGraph) -> CommandTrace;
}

macro_rules! commands {
    ($($variant:ident),* $(,)?) => {
        /// The closed set of edit commands.
        #[derive(Debug)]
        pub enum Command {
            $($variant($variant),)*
        }

        $(
            impl From<$variant> for Command {
                fn from(cmd: $variant) -> Self {
                    Command::$variant(cmd)
                }
            }
        )*

        impl TopoCommand for Command {
            fn name(&self) -> &'static str {
                match self {
                    $(Command::$variant(c) => c.name(),)*
                }
            }

            fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
                match self {
                    $(Command::$variant(c) => c.revalidate(graph),)*
                }
            }

            fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
                match self {
                    $(Command::$variant(c) => c.execute(tx),)*
                }
            }

            fn trace(&self, graph: &TopoGraph) -> CommandTrace {
                match self {
                    $(Command::$variant(c) => c.trace(graph),)*
                }
            }
        }
    };
}

commands!(
    SplitEdge,
    SplitBlocks,
    SplitFaces,
    SplitBlocksWithOgrid,
    SplitFacesWithOgrid,
    MakeBlocksByRevol,
    ExtrudeFaces,
    Fuse2Blocks,
    Fuse2Vertices,
    Glue2Blocks,
    SetNbMeshingEdges,
    SnapVertices,
    SmoothVertices,
    SetGeomAssociation,
    DestroyEntities,
    NewBlock,
    NewBlockGrid,
    NewFaceGrid,
);

/// Names of `ids` for a trace.
pub(crate) fn names<I: crate::topology::graph::TopoEntity>(
    graph: &TopoGraph,
    ids: &[I],
) -> Vec<String> {
    ids.iter().map(|&id| graph.name(id).to_owned()).collect()
}
