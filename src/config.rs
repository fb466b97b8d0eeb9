//! Session configuration.
//!
//! All fields have defaults, so a JSON document only needs the keys it
//! overrides:
//!
//! ```
//! use mesh_topo::config::TopoConfig;
//! let cfg = TopoConfig::from_json_str(r#"{ "default_nb_edges": 4 }"#).unwrap();
//! assert_eq!(cfg.default_nb_edges, 4);
//! assert_eq!(cfg.names.block, "Bl");
//! ```

use crate::topo_error::TopoError;
use crate::topology::id::EntityKind;
use serde::{Deserialize, Serialize};

/// Name prefix of each entity kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamePrefixes {
    pub vertex: String,
    pub coedge: String,
    pub edge: String,
    pub coface: String,
    pub face: String,
    pub block: String,
}

impl Default for NamePrefixes {
    fn default() -> Self {
        NamePrefixes {
            vertex: "Som".into(),
            coedge: "Ar".into(),
            edge: "Ed".into(),
            coface: "Fa".into(),
            face: "F".into(),
            block: "Bl".into(),
        }
    }
}

impl NamePrefixes {
    pub fn for_kind(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Vertex => &self.vertex,
            EntityKind::CoEdge => &self.coedge,
            EntityKind::Edge => &self.edge,
            EntityKind::CoFace => &self.coface,
            EntityKind::Face => &self.face,
            EntityKind::Block => &self.block,
        }
    }
}

/// Options of a modeling session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopoConfig {
    /// Segment count of coedges created without an explicit count.
    pub default_nb_edges: u32,
    /// Distance under which two points coincide (glue, axis test).
    pub tolerance: f64,
    /// Maximum depth of the undo stack, unlimited when `None`.
    pub max_undo: Option<usize>,
    /// Check invariants of touched entities before each commit.
    pub check_invariants: bool,
    pub names: NamePrefixes,
}

impl Default for TopoConfig {
    fn default() -> Self {
        TopoConfig {
            default_nb_edges: 10,
            tolerance: 1e-6,
            max_undo: None,
            check_invariants: true,
            names: NamePrefixes::default(),
        }
    }
}

impl TopoConfig {
    /// Parses a (possibly partial) JSON document over the defaults.
    pub fn from_json_str(s: &str) -> Result<Self, TopoError> {
        let cfg: TopoConfig =
            serde_json::from_str(s).map_err(|e| TopoError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects values no session can work with.
    pub fn validate(&self) -> Result<(), TopoError> {
        if self.default_nb_edges == 0 {
            return Err(TopoError::Config("default_nb_edges must be at least 1".into()));
        }
        if !(self.tolerance > 0.0) {
            return Err(TopoError::Config(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_undo == Some(0) {
            return Err(TopoError::Config("max_undo must be at least 1".into()));
        }
        for kind in EntityKind::ALL {
            if self.names.for_kind(kind).is_empty() {
                return Err(TopoError::Config(format!("empty name prefix for {kind}")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topo_error::ErrorCategory;

    #[test]
    fn defaults() {
        let cfg = TopoConfig::default();
        assert_eq!(cfg.default_nb_edges, 10);
        assert_eq!(cfg.max_undo, None);
        assert!(cfg.check_invariants);
        assert_eq!(cfg.names.for_kind(EntityKind::Vertex), "Som");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides() {
        let cfg = TopoConfig::from_json_str(
            r#"{ "tolerance": 0.001, "names": { "block": "Blk" }, "max_undo": 5 }"#,
        )
        .unwrap();
        assert_eq!(cfg.tolerance, 0.001);
        assert_eq!(cfg.names.block, "Blk");
        assert_eq!(cfg.names.coedge, "Ar");
        assert_eq!(cfg.max_undo, Some(5));
    }

    #[test]
    fn bad_documents_are_config_errors() {
        let e = TopoConfig::from_json_str("{ not json").unwrap_err();
        assert_eq!(e.category(), ErrorCategory::Config);
        let e = TopoConfig::from_json_str(r#"{ "default_nb_edges": 0 }"#).unwrap_err();
        assert_eq!(e.category(), ErrorCategory::Config);
        let e = TopoConfig::from_json_str(r#"{ "names": { "face": "" } }"#).unwrap_err();
        assert!(matches!(e, TopoError::Config(_)));
    }
}
