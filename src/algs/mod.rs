//! Topology edit algorithms and the commands built on them.

pub mod associate;
pub mod builder;
pub mod destroy;
pub mod edge_split;
pub(crate) mod edit;
pub mod extrude;
pub mod fuse;
pub mod nb_edges;
pub mod ogrid;
pub mod ogrid_blocks;
pub mod ogrid_faces;
pub mod revolution;
pub mod smoothing;
pub mod snap;
pub mod split_blocks;
pub mod split_faces;

pub use associate::SetGeomAssociation;
pub use builder::{NewBlock, NewBlockGrid, NewFaceGrid};
pub use destroy::DestroyEntities;
pub use edge_split::{SplitEdge, split_index};
pub use extrude::ExtrudeFaces;
pub use fuse::{Fuse2Blocks, Fuse2Vertices, Glue2Blocks};
pub use nb_edges::SetNbMeshingEdges;
pub use ogrid::{OgridFilter, OgridTag};
pub use ogrid_blocks::SplitBlocksWithOgrid;
pub use ogrid_faces::SplitFacesWithOgrid;
pub use revolution::MakeBlocksByRevol;
pub use smoothing::{LaplacianSmoother, SmoothVertices, Smoother, SmoothingInput};
pub use snap::SnapVertices;
pub use split_blocks::SplitBlocks;
pub use split_faces::SplitFaces;

use crate::topo_error::TopoError;
use crate::topology::graph::{TopoEntity, TopoGraph};
use crate::topology::id::{BlockId, CoFaceId, EntityKind};

/// Fails with a lookup error unless `id` is live.
pub(crate) fn require_live<I: TopoEntity>(graph: &TopoGraph, id: I) -> Result<(), TopoError> {
    if !graph.contains(id) {
        return Err(TopoError::NotFound { kind: I::KIND, name: format!("{id:?}") });
    }
    if !graph.is_live(id) {
        return Err(TopoError::IsDestroyed { kind: I::KIND, name: graph.name(id).to_owned() });
    }
    Ok(())
}

/// Live, structured and with eight distinct corners.
pub(crate) fn require_structured_block(graph: &TopoGraph, b: BlockId) -> Result<(), TopoError> {
    require_live(graph, b)?;
    let props = graph.block(b);
    if !props.structured {
        return Err(TopoError::NotStructured { kind: EntityKind::Block, name: graph.name(b).to_owned() });
    }
    if props.is_degenerate() {
        return Err(TopoError::Degenerate { kind: EntityKind::Block, name: graph.name(b).to_owned() });
    }
    Ok(())
}

/// Live structured quadrangle.
pub(crate) fn require_structured_coface(graph: &TopoGraph, cf: CoFaceId) -> Result<(), TopoError> {
    require_live(graph, cf)?;
    let props = graph.coface(cf);
    if !props.structured || props.nb_sides() != 4 {
        return Err(TopoError::NotStructured { kind: EntityKind::CoFace, name: graph.name(cf).to_owned() });
    }
    Ok(())
}

/// Checks `ratio` against `[0, 1]`, or `(0, 1)` when `open`.
pub(crate) fn require_ratio(ratio: f64, open: bool) -> Result<(), TopoError> {
    let ok = if open { ratio > 0.0 && ratio < 1.0 } else { (0.0..=1.0).contains(&ratio) };
    if ok {
        Ok(())
    } else {
        Err(TopoError::RatioOutOfRange { ratio, interval: if open { "(0, 1)" } else { "[0, 1]" } })
    }
}

/// Sorted, deduplicated copy of a selection; empty selections are rejected.
pub(crate) fn selection<I: Ord + Copy>(ids: &[I], what: &'static str) -> Result<Vec<I>, TopoError> {
    let mut out = ids.to_vec();
    out.sort_unstable();
    out.dedup();
    if out.is_empty() {
        return Err(TopoError::EmptySelection(what));
    }
    Ok(out)
}
