//! A small analytic implementation of [`GeomModel`].
//!
//! Shapes are points, infinite lines, planes, cylinders around the X axis and
//! volumes (projection is the identity inside a volume). Sweep relations are
//! registered explicitly. Useful for scripting simple cases and for tests of
//! the projection paths.

use crate::geometry::kernel::{GeomFailure, GeomKind, GeomModel, GeomRef};
use crate::geometry::point::{Point, Vector};
use crate::geometry::rotation::Portion;
use hashbrown::HashMap;

/// Analytic shape backing a [`GeomRef`].
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Vertex(Point),
    Line { origin: Point, direction: Vector },
    Plane { origin: Point, normal: Vector },
    /// Cylinder of the given radius around the X axis.
    Cylinder { radius: f64 },
    Volume,
    /// Always fails to project; stands for a kernel error.
    Broken(String),
}

impl Shape {
    fn kind(&self) -> GeomKind {
        match self {
            Shape::Vertex(_) => GeomKind::Vertex,
            Shape::Line { .. } => GeomKind::Curve,
            Shape::Plane { .. } | Shape::Cylinder { .. } => GeomKind::Surface,
            Shape::Volume => GeomKind::Volume,
            Shape::Broken(_) => GeomKind::Curve,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnalyticModel {
    shapes: Vec<Shape>,
    swept: HashMap<GeomRef, GeomRef>,
}

impl AnalyticModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shape and returns its handle.
    pub fn add(&mut self, shape: Shape) -> GeomRef {
        self.shapes.push(shape);
        GeomRef(self.shapes.len() as u64)
    }

    /// Declares `to` as the entity swept by `from` around the X axis.
    pub fn set_swept(&mut self, from: GeomRef, to: GeomRef) {
        self.swept.insert(from, to);
    }

    pub fn shape(&self, entity: GeomRef) -> Option<&Shape> {
        let idx = usize::try_from(entity.0).ok()?.checked_sub(1)?;
        self.shapes.get(idx)
    }

    fn lookup(&self, entity: GeomRef) -> Result<&Shape, GeomFailure> {
        self.shape(entity).ok_or(GeomFailure::Unknown(entity.0))
    }
}

impl GeomModel for AnalyticModel {
    fn kind(&self, entity: GeomRef) -> Option<GeomKind> {
        self.shape(entity).map(Shape::kind)
    }

    fn project(&self, entity: GeomRef, p: Point) -> Result<Point, GeomFailure> {
        match self.lookup(entity)? {
            Shape::Vertex(q) => Ok(*q),
            Shape::Line { origin, direction } => {
                let d = direction.normalized().ok_or_else(|| {
                    GeomFailure::Kernel(format!("null direction for {entity}"))
                })?;
                Ok(*origin + d * (p - *origin).dot(d))
            }
            Shape::Plane { origin, normal } => {
                let n = normal
                    .normalized()
                    .ok_or_else(|| GeomFailure::Kernel(format!("null normal for {entity}")))?;
                Ok(p - n * (p - *origin).dot(n))
            }
            Shape::Cylinder { radius } => {
                let r = (p.y * p.y + p.z * p.z).sqrt();
                if r <= f64::EPSILON {
                    return Err(GeomFailure::Kernel(format!(
                        "point {p} lies on the axis of {entity}"
                    )));
                }
                Ok(Point::new(p.x, p.y * radius / r, p.z * radius / r))
            }
            Shape::Volume => Ok(p),
            Shape::Broken(msg) => Err(GeomFailure::Kernel(msg.clone())),
        }
    }

    fn normal(&self, entity: GeomRef, p: Point) -> Result<Vector, GeomFailure> {
        match self.lookup(entity)? {
            Shape::Plane { normal, .. } => normal
                .normalized()
                .ok_or_else(|| GeomFailure::Kernel(format!("null normal for {entity}"))),
            Shape::Cylinder { .. } => Point::new(0.0, p.y, p.z)
                .normalized()
                .ok_or_else(|| GeomFailure::Kernel(format!("no normal on the axis of {entity}"))),
            other => Err(GeomFailure::NotApplicable { kind: other.kind(), operation: "normal" }),
        }
    }

    fn swept(&self, entity: GeomRef, _portion: Portion) -> Option<GeomRef> {
        self.swept.get(&entity).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projections() {
        let mut m = AnalyticModel::new();
        let line = m.add(Shape::Line { origin: Point::ORIGIN, direction: Point::new(1.0, 0.0, 0.0) });
        let plane = m.add(Shape::Plane { origin: Point::ORIGIN, normal: Point::new(0.0, 0.0, 2.0) });
        let cyl = m.add(Shape::Cylinder { radius: 2.0 });

        let p = Point::new(0.5, 1.0, 1.0);
        assert!(m.project(line, p).unwrap().is_near(Point::new(0.5, 0.0, 0.0), 1e-12));
        assert!(m.project(plane, p).unwrap().is_near(Point::new(0.5, 1.0, 0.0), 1e-12));
        let q = m.project(cyl, Point::new(3.0, 1.0, 0.0)).unwrap();
        assert!(q.is_near(Point::new(3.0, 2.0, 0.0), 1e-12));
        assert_eq!(m.kind(cyl), Some(GeomKind::Surface));
    }

    #[test]
    fn unknown_and_broken_entities_fail() {
        let mut m = AnalyticModel::new();
        let broken = m.add(Shape::Broken("no intersection".into()));
        assert_eq!(
            m.project(GeomRef(99), Point::ORIGIN),
            Err(GeomFailure::Unknown(99))
        );
        assert!(matches!(m.project(broken, Point::ORIGIN), Err(GeomFailure::Kernel(_))));
        assert!(matches!(
            m.normal(broken, Point::ORIGIN),
            Err(GeomFailure::NotApplicable { .. })
        ));
    }
}
