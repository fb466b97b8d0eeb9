//! # mesh-topo
//!
//! mesh-topo is the topology editing core of a multi-block structured mesher.
//! It stores a graph of vertices, coedges, edges, cofaces, faces and blocks,
//! and offers the editing operations a mesher needs on it: splitting blocks and
//! cofaces, o-grid splits, fusion and gluing, revolution of a 2-D topology
//! around the X axis, changes of discretization, vertex snapping and smoothing.
//!
//! ## Features
//! - Arena-backed entity graph with stable typed ids and an incidence index
//! - Every edit runs as a [`Command`](command::Command) inside a transaction
//!   that records prior entity states, so failures roll back and committed
//!   commands can be undone and redone
//! - Geometry through the [`GeomModel`](geometry::GeomModel) trait: an
//!   [`AnalyticModel`](geometry::analytic::AnalyticModel) ships with the crate,
//!   and real CAD kernels plug in behind the same seam
//! - A JSON trace of every committed command
//!
//! ## Usage
//!
//! ```
//! use mesh_topo::prelude::*;
//!
//! let mut session = Session::default();
//! session
//!     .execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [4, 4, 4]).unwrap())
//!     .unwrap();
//! let block = session.graph().live_blocks()[0];
//! let edge = session.graph().block_lines(block, 0).unwrap()[0][0].coedge;
//! let report = session.execute(SplitBlocks::new(session.graph(), &[block], edge, 0.5).unwrap()).unwrap();
//! assert_eq!(report.created_blocks().len(), 2);
//! session.undo().unwrap();
//! assert_eq!(session.graph().nb_blocks(), 1);
//! ```
//!
//! ## Invariant checks
//!
//! Every command validates the entities it touched before it commits, unless
//! [`TopoConfig::check_invariants`](config::TopoConfig) is off. Debug builds,
//! and release builds with the `check-invariants` or `strict-invariants`
//! feature, also sweep the whole graph after undo and redo. See
//! [`DebugInvariants`].

pub mod algs;
pub mod command;
pub mod config;
pub mod debug_invariants;
pub mod geometry;
pub mod topo_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use topo_error::TopoError;

/// A convenient prelude to import the most-used commands & types:
pub mod prelude {
    pub use crate::algs::{
        DestroyEntities, ExtrudeFaces, Fuse2Blocks, Fuse2Vertices, Glue2Blocks, LaplacianSmoother,
        MakeBlocksByRevol, NewBlock, NewBlockGrid, NewFaceGrid, SetGeomAssociation,
        SetNbMeshingEdges, SmoothVertices, Smoother, SnapVertices, SplitBlocks,
        SplitBlocksWithOgrid, SplitEdge, SplitFaces, SplitFacesWithOgrid,
    };
    pub use crate::command::{Command, CommandReport, CommandState, Session, TopoCommand};
    pub use crate::config::TopoConfig;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::analytic::{AnalyticModel, Shape};
    pub use crate::geometry::{GeomModel, GeomRef, NullModel, Point, Portion};
    pub use crate::topo_error::TopoError;
    pub use crate::topology::{
        AnyId, BlockId, CoEdgeId, CoFaceId, EdgeId, EntityKind, FaceId, TopoGraph, VertexId,
    };
}
