//! Association of topological entities with the geometric model.

use crate::algs::destroy::any_name;
use crate::algs::{require_live, selection};
use crate::command::history::CommandTrace;
use crate::command::tx::EditTx;
use crate::command::TopoCommand;
use crate::geometry::kernel::{GeomKind, GeomRef};
use crate::topo_error::{TopoError, invalid_argument};
use crate::topology::graph::TopoGraph;
use crate::topology::id::{AnyId, CoEdgeId, CoFaceId, VertexId};
use log::{debug, trace};
use serde_json::json;

/// Sets or clears the geometric entity of blocks, cofaces, coedges and
/// vertices.
///
/// Associating a coface also associates its coedges that have no geometry
/// yet; associating a coedge does the same for its vertices, and moves a
/// vertex held by a surface onto a curve. Clearing touches the selection
/// only.
#[derive(Clone, Debug)]
pub struct SetGeomAssociation {
    targets: Vec<AnyId>,
    geom: Option<GeomRef>,
    move_vertices: bool,
}

fn require_associable(graph: &TopoGraph, id: AnyId) -> Result<(), TopoError> {
    match id {
        AnyId::Vertex(v) => require_live(graph, v),
        AnyId::CoEdge(ce) => require_live(graph, ce),
        AnyId::CoFace(cf) => require_live(graph, cf),
        AnyId::Block(b) => require_live(graph, b),
        AnyId::Edge(_) | AnyId::Face(_) => {
            Err(invalid_argument(format!("a {} carries no geometric association", id.kind())))
        }
    }
}

impl SetGeomAssociation {
    /// `move_vertices` projects the associated vertices on `geom`.
    pub fn new(
        graph: &TopoGraph,
        targets: &[AnyId],
        geom: Option<GeomRef>,
        move_vertices: bool,
    ) -> Result<Self, TopoError> {
        let targets = selection(targets, "entities to associate")?;
        for &id in &targets {
            require_associable(graph, id)?;
        }
        Ok(SetGeomAssociation { targets, geom, move_vertices })
    }

    fn vertex(&self, tx: &mut EditTx<'_>, v: VertexId) -> Result<(), TopoError> {
        let props = tx.graph().vertex(v);
        let mut coord = props.coord;
        if let (Some(g), true) = (self.geom, self.move_vertices) {
            coord = tx.project(g, coord, tx.graph().name(v))?;
        }
        let geom = self.geom;
        tx.update(v, |p| {
            p.coord = coord;
            p.geom = geom;
        });
        Ok(())
    }

    fn coedge(&self, tx: &mut EditTx<'_>, ce: CoEdgeId) -> Result<(), TopoError> {
        let geom = self.geom;
        tx.update(ce, |p| p.geom = geom);
        let Some(g) = geom else { return Ok(()) };
        let onto_curve = tx.geom().kind(g) == Some(GeomKind::Curve);
        let ends = tx.graph().coedge(ce).vertices;
        for v in ends {
            let held = tx.graph().vertex(v).geom;
            let on_surface = held.is_some_and(|h| tx.geom().kind(h) == Some(GeomKind::Surface));
            if held.is_none() || (onto_curve && on_surface) {
                trace!("vertex `{}` follows coedge `{}`", tx.graph().name(v), tx.graph().name(ce));
                self.vertex(tx, v)?;
            }
        }
        Ok(())
    }

    fn coface(&self, tx: &mut EditTx<'_>, cf: CoFaceId) -> Result<(), TopoError> {
        let geom = self.geom;
        tx.update(cf, |p| p.geom = geom);
        if geom.is_none() {
            return Ok(());
        }
        let coedges = tx.graph().coface_coedges(cf);
        for ce in coedges {
            if tx.graph().coedge(ce).geom.is_none() {
                self.coedge(tx, ce)?;
            }
        }
        Ok(())
    }
}

impl TopoCommand for SetGeomAssociation {
    fn name(&self) -> &'static str {
        "SetGeomAssociation"
    }

    fn revalidate(&mut self, graph: &TopoGraph) -> Result<(), TopoError> {
        for &id in &self.targets {
            require_associable(graph, id)?;
        }
        Ok(())
    }

    fn execute(&mut self, tx: &mut EditTx<'_>) -> Result<(), TopoError> {
        for &id in &self.targets {
            match id {
                AnyId::Vertex(v) => self.vertex(tx, v)?,
                AnyId::CoEdge(ce) => self.coedge(tx, ce)?,
                AnyId::CoFace(cf) => self.coface(tx, cf)?,
                AnyId::Block(b) => {
                    let geom = self.geom;
                    tx.update(b, |p| p.geom = geom);
                }
                AnyId::Edge(_) | AnyId::Face(_) => {
                    return Err(invalid_argument(format!("{} `{}` carries no geometry", id.kind(), any_name(tx.graph(), id))));
                }
            }
        }
        debug!("associated {} entities with {:?}", self.targets.len(), self.geom);
        Ok(())
    }

    fn trace(&self, graph: &TopoGraph) -> CommandTrace {
        CommandTrace {
            entities: self.targets.iter().map(|&id| any_name(graph, id)).collect(),
            parameters: json!({ "geom": self.geom, "move_vertices": self.move_vertices }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::builder::NewBlock;
    use crate::command::Session;
    use crate::config::TopoConfig;
    use crate::geometry::analytic::{AnalyticModel, Shape};
    use crate::geometry::point::Point;
    use crate::topo_error::ErrorCategory;

    fn session(model: AnalyticModel) -> Session {
        let mut s = Session::with_geometry(TopoConfig::default(), Box::new(model)).unwrap();
        s.execute(NewBlock::new(Point::ORIGIN, Point::new(1.0, 1.0, 1.0), [1, 1, 1]).unwrap()).unwrap();
        s
    }

    /// Coface of the cube lying in the plane `z = 0`.
    fn bottom(g: &TopoGraph) -> CoFaceId {
        g.live_cofaces()
            .into_iter()
            .find(|&cf| g.coface(cf).vertices.iter().all(|&v| g.vertex(v).coord.z == 0.0))
            .unwrap()
    }

    #[test]
    fn coface_association_reaches_its_vertices() {
        let mut model = AnalyticModel::new();
        let plane = model.add(Shape::Plane { origin: Point::new(0.0, 0.0, -0.5), normal: Point::new(0.0, 0.0, 1.0) });
        let mut s = session(model);
        let cf = bottom(s.graph());
        s.execute(SetGeomAssociation::new(s.graph(), &[cf.into()], Some(plane), true).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(g.coface(cf).geom, Some(plane));
        for ce in g.coface_coedges(cf) {
            assert_eq!(g.coedge(ce).geom, Some(plane));
        }
        for &v in &g.coface(cf).vertices {
            assert_eq!(g.vertex(v).geom, Some(plane));
            assert_eq!(g.vertex(v).coord.z, -0.5);
        }
        // the other cofaces are untouched
        let associated = g.live_cofaces().into_iter().filter(|&cf| g.coface(cf).geom.is_some()).count();
        assert_eq!(associated, 1);
    }

    #[test]
    fn curve_takes_vertices_from_a_surface() {
        let mut model = AnalyticModel::new();
        let plane = model.add(Shape::Plane { origin: Point::ORIGIN, normal: Point::new(0.0, 0.0, 1.0) });
        let line = model.add(Shape::Line { origin: Point::ORIGIN, direction: Point::new(1.0, 0.0, 0.0) });
        let mut s = session(model);
        let cf = bottom(s.graph());
        s.execute(SetGeomAssociation::new(s.graph(), &[cf.into()], Some(plane), false).unwrap()).unwrap();
        let g = s.graph();
        let ce = g
            .coface_coedges(cf)
            .into_iter()
            .find(|&ce| g.coedge(ce).vertices.iter().all(|&v| g.vertex(v).coord.y == 0.0))
            .unwrap();
        s.execute(SetGeomAssociation::new(s.graph(), &[ce.into()], Some(line), false).unwrap()).unwrap();
        let g = s.graph();
        for v in g.coedge(ce).vertices {
            assert_eq!(g.vertex(v).geom, Some(line));
        }
        // clearing leaves the vertices alone
        s.execute(SetGeomAssociation::new(s.graph(), &[ce.into()], None, false).unwrap()).unwrap();
        let g = s.graph();
        assert_eq!(g.coedge(ce).geom, None);
        assert!(g.coedge(ce).vertices.iter().all(|&v| g.vertex(v).geom == Some(line)));
        s.undo().unwrap();
        assert_eq!(s.graph().coedge(ce).geom, Some(line));
    }

    #[test]
    fn failed_projection_rolls_back() {
        let mut model = AnalyticModel::new();
        let broken = model.add(Shape::Broken("no convergence".into()));
        let mut s = session(model);
        let vertices: Vec<AnyId> = s.graph().live_vertices().into_iter().map(AnyId::from).collect();
        let before = s.graph().snapshot();
        let e = s.execute(SetGeomAssociation::new(s.graph(), &vertices, Some(broken), true).unwrap()).unwrap_err();
        assert_eq!(e.category(), ErrorCategory::Geometry);
        assert_eq!(s.graph().snapshot(), before);
        assert!(SetGeomAssociation::new(s.graph(), &[], Some(broken), false).unwrap_err().is_precondition());
    }
}
