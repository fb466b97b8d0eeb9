//! Structural invariants of the entity graph.
//!
//! [`TopoGraph::validate_entity`] checks one live entity against its
//! children; the command engine runs it over every entity a command touched
//! before committing. The [`DebugInvariants`] impl checks the whole graph,
//! including the consistency of the incidence index.

use crate::debug_invariants::DebugInvariants;
use crate::topo_error::TopoError;
use crate::topology::graph::{TopoEntity, TopoGraph};
use crate::topology::hexa;
use crate::topology::id::{
    AnyId, BlockId, CoEdgeId, CoFaceId, EdgeId, EntityId, FaceId, VertexId,
};
use itertools::Itertools;

fn defect(msg: String) -> TopoError {
    TopoError::Internal(msg)
}

impl TopoGraph {
    fn require_live<I: TopoEntity>(&self, owner: &str, id: I) -> Result<(), TopoError> {
        if !self.contains(id) {
            return Err(defect(format!("{owner} refers to purged {} {id:?}", I::KIND)));
        }
        if !self.is_live(id) {
            return Err(defect(format!(
                "{owner} refers to destroyed {} `{}`",
                I::KIND,
                self.name(id)
            )));
        }
        Ok(())
    }

    fn check_vertex(&self, v: VertexId) -> Result<(), TopoError> {
        let p = self.vertex(v).coord;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(defect(format!("vertex `{}` has coordinates {p}", self.name(v))));
        }
        Ok(())
    }

    fn check_coedge(&self, ce: CoEdgeId) -> Result<(), TopoError> {
        let name = self.name(ce);
        let props = self.coedge(ce);
        for v in props.vertices {
            self.require_live(name, v)?;
        }
        if props.vertices[0] == props.vertices[1] {
            return Err(defect(format!("coedge `{name}` joins a vertex to itself")));
        }
        if props.nb_edges() == 0 {
            return Err(defect(format!("coedge `{name}` has no segment")));
        }
        Ok(())
    }

    fn check_edge(&self, e: EdgeId) -> Result<(), TopoError> {
        let name = self.name(e);
        let props = self.edge(e);
        if props.coedges.is_empty() {
            return Err(defect(format!("edge `{name}` has no coedge")));
        }
        for &ce in &props.coedges {
            self.require_live(name, ce)?;
        }
        if props.vertices[0] == props.vertices[1] {
            return Err(defect(format!("edge `{name}` joins a vertex to itself")));
        }
        self.edge_walk(e, props.vertices[0])
            .map_err(|err| defect(format!("edge `{name}`: {err}")))?;
        Ok(())
    }

    fn check_coface(&self, cf: CoFaceId) -> Result<(), TopoError> {
        let name = self.name(cf);
        let props = self.coface(cf);
        let n = props.vertices.len();
        // 1) 3 or 4 sides, one edge per side
        if !(n == 3 || n == 4) || props.edges.len() != n {
            return Err(defect(format!(
                "coface `{name}` has {n} vertices and {} edges",
                props.edges.len()
            )));
        }
        if props.structured && n != 4 {
            return Err(defect(format!("structured coface `{name}` is not a quadrangle")));
        }
        // 2) edge k joins vertex k to vertex k+1
        for k in 0..n {
            let e = props.edges[k];
            self.require_live(name, e)?;
            let mut ends = self.edge(e).vertices;
            ends.sort_unstable();
            let mut expected = [props.vertices[k], props.vertices[(k + 1) % n]];
            expected.sort_unstable();
            if ends != expected {
                return Err(defect(format!(
                    "side {k} of coface `{name}` does not join its corners"
                )));
            }
        }
        // 3) opposite sides of a structured coface match
        if props.structured {
            for k in 0..2 {
                let (a, b) = (self.coface_side_length(cf, k), self.coface_side_length(cf, k + 2));
                if a != b {
                    return Err(defect(format!(
                        "structured coface `{name}` has {a} and {b} segments on opposite sides"
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_face(&self, f: FaceId) -> Result<(), TopoError> {
        let name = self.name(f);
        let props = self.face(f);
        if props.vertices.len() != 4 {
            return Err(defect(format!("face `{name}` has {} corners", props.vertices.len())));
        }
        for &cf in &props.cofaces {
            self.require_live(name, cf)?;
        }
        if props.cofaces.is_empty() && props.vertices.iter().unique().count() > 2 {
            return Err(defect(format!("face `{name}` has no coface but is not collapsed")));
        }
        Ok(())
    }

    fn check_block(&self, b: BlockId) -> Result<(), TopoError> {
        let name = self.name(b);
        let props = self.block(b);
        // 1) 8 corner slots and 6 faces
        if props.vertices.len() != 8 || props.faces.len() != 6 {
            return Err(defect(format!(
                "block `{name}` has {} vertices and {} faces",
                props.vertices.len(),
                props.faces.len()
            )));
        }
        for &v in &props.vertices {
            self.require_live(name, v)?;
        }
        for &f in &props.faces {
            self.require_live(name, f)?;
        }
        // 2) a structured block is a true hexahedron unless degenerate on purpose
        let distinct = props.nb_distinct_vertices();
        if props.structured && distinct < 4 {
            return Err(defect(format!("block `{name}` has only {distinct} distinct vertices")));
        }
        // corners only coincide along an edge line
        let crossed = (0..8)
            .tuple_combinations()
            .find(|&(c1, c2): &(usize, usize)| {
                props.vertices[c1] == props.vertices[c2] && (c1 ^ c2).count_ones() != 1
            });
        if let Some((c1, c2)) = crossed {
            return Err(defect(format!(
                "block `{name}` has corners {c1} and {c2} on the same vertex `{}`",
                self.name(props.vertices[c1])
            )));
        }
        // 3) each face carries the corners of its slot
        for (slot, &f) in props.faces.iter().enumerate() {
            let expected: Vec<VertexId> = hexa::FACE_CORNERS[slot]
                .iter()
                .map(|&c| props.vertices[c])
                .sorted()
                .collect();
            let found: Vec<VertexId> = self.face(f).vertices.iter().copied().sorted().collect();
            if expected != found {
                return Err(defect(format!(
                    "face `{}` in slot {slot} of block `{name}` has the wrong corners",
                    self.name(f)
                )));
            }
            if self.face(f).cofaces.is_empty() && !props.is_degenerate() {
                return Err(defect(format!(
                    "block `{name}` is not degenerate but its face `{}` is collapsed",
                    self.name(f)
                )));
            }
        }
        Ok(())
    }

    /// Checks one entity if it is stored and live; others are skipped.
    pub fn validate_entity(&self, id: AnyId) -> Result<(), TopoError> {
        fn live<I: TopoEntity>(g: &TopoGraph, id: I) -> bool {
            g.contains(id) && g.is_live(id)
        }
        match id {
            AnyId::Vertex(v) if live(self, v) => self.check_vertex(v),
            AnyId::CoEdge(ce) if live(self, ce) => self.check_coedge(ce),
            AnyId::Edge(e) if live(self, e) => self.check_edge(e),
            AnyId::CoFace(cf) if live(self, cf) => self.check_coface(cf),
            AnyId::Face(f) if live(self, f) => self.check_face(f),
            AnyId::Block(b) if live(self, b) => self.check_block(b),
            _ => Ok(()),
        }
    }

    /// Checks a set of entities, stopping at the first violation.
    pub fn validate_entities<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a AnyId>,
    ) -> Result<(), TopoError> {
        ids.into_iter().try_for_each(|&id| self.validate_entity(id))
    }

    fn all_live_ids(&self) -> Vec<AnyId> {
        fn add<I: TopoEntity>(g: &TopoGraph, out: &mut Vec<AnyId>) {
            out.extend(g.live::<I>().into_iter().map(EntityId::any));
        }
        let mut out = Vec::new();
        add::<VertexId>(self, &mut out);
        add::<CoEdgeId>(self, &mut out);
        add::<EdgeId>(self, &mut out);
        add::<CoFaceId>(self, &mut out);
        add::<FaceId>(self, &mut out);
        add::<BlockId>(self, &mut out);
        out
    }
}

impl DebugInvariants for TopoGraph {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "TopoGraph invalid");
    }

    fn validate_invariants(&self) -> Result<(), TopoError> {
        self.validate_entities(&self.all_live_ids())?;
        if !self.incidence_is_consistent() {
            return Err(defect("incidence index is out of date".into()));
        }
        Ok(())
    }
}
