//! Projection of vertices on their associated geometry.

use crate::algs::{require_live, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::{TopoCommand, names};
use crate::geometry::kernel::GeomRef;
use crate::topo_error::TopoError;
use crate::topology::graph::TopoGraph;
use crate::topology::id::VertexId;
use log::{debug, trace};
use serde_json::json;

/// Moves vertices onto their geometric entity, or onto a given entity which
/// then becomes their association.
#[derive(Clone, Debug)]
pub struct SnapVertices {
    vertices: Vec<VertexId>,
    target: Option<GeomRef>,
}

impl SnapVertices {
    pub fn new(graph: &TopoGraph, vertices: &[VertexId]) -> Result<Self, TopoError> {
        let vertices = selection(vertices, "vertices to snap")?;
        for &v in &vertices {
            require_live(graph, v)?;
        }
        Ok(SnapVertices { vertices, target: None })
    }

    /// Every live vertex of the graph.
    pub fn all(graph: &TopoGraph) -> Result<Self, TopoError> {
        Self::new(graph, &graph.live_vertices())
    }

    /// Projects on `target` and associates the vertices with it.
    pub fn onto(graph: &TopoGraph, vertices: &[VertexId], target: GeomRef) -> Result<Self, TopoError> {
        Ok(SnapVertices { target: Some(target), ..Self::new(graph, vertices)? })
    }
}

impl TopoCommand for SnapVertices {
    fn name(&self) -> &'static str {
        "SnapVertices"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        for &v in &self.vertices {
            require_live(graph, v)?;
        }
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        let mut moved = 0;
        for &v in &self.vertices {
            let props = tx.graph().vertex(v);
            let Some(geom) = self.target.or(props.geom) else {
                trace!("vertex `{}` has no geometry", tx.graph().name(v));
                continue;
            };
            let p = tx.project(geom, props.coord, tx.graph().name(v))?;
            if p != props.coord || props.geom != Some(geom) {
                tx.update(v, |props| {
                    props.coord = p;
                    props.geom = Some(geom);
                });
                moved += 1;
            }
        }
        debug!("snapped {moved} of {} vertices", self.vertices.len());
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: names(graph, &self.vertices),
            parameters: json!({ "target": self.target }),
        }
    }
}
