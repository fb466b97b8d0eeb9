//! The modeling session: graph, history, configuration and geometry.

use crate::command::history::History;
use crate::command::state::CommandState;
use crate::command::tx::{CommandReport, EditTx};
use crate::command::{Command, TopoCommand};
use crate::config::TopoConfig;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::kernel::{GeomModel, NullModel};
use crate::topo_error::TopoError;
use crate::topology::graph::{TopoEntity, TopoGraph};
use crate::topology::id::{BlockId, CoEdgeId, CoFaceId, EdgeId, FaceId, VertexId};
use log::debug;

/// Owns everything a command needs. Commands run one at a time: `execute`
/// borrows the session mutably for the whole command.
pub struct Session {
    graph: TopoGraph,
    history: History,
    config: TopoConfig,
    geom: Box<dyn GeomModel>,
    last_state: Option<CommandState>,
}

impl Default for Session {
    fn default() -> Self {
        let config = TopoConfig::default();
        Session {
            graph: TopoGraph::new(&config.names),
            history: History::new(config.max_undo),
            config,
            geom: Box::new(NullModel),
            last_state: None,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("blocks", &self.graph.nb_blocks())
            .field("history", &self.history.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Session {
    pub fn new(config: TopoConfig) -> Result<Self, TopoError> {
        Self::with_geometry(config, Box::new(NullModel))
    }

    pub fn with_geometry(config: TopoConfig, geom: Box<dyn GeomModel>) -> Result<Self, TopoError> {
        config.validate()?;
        Ok(Session {
            graph: TopoGraph::new(&config.names),
            history: History::new(config.max_undo),
            config,
            geom,
            last_state: None,
        })
    }

    pub fn graph(&self) -> &TopoGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &TopoConfig {
        &self.config
    }

    pub fn geom(&self) -> &dyn GeomModel {
        self.geom.as_ref()
    }

    /// Final state of the last command handed to [`execute`](Self::execute).
    pub fn last_state(&self) -> Option<CommandState> {
        self.last_state
    }

    /// Runs a command to completion: commit on success, rollback on error.
    pub fn execute(&mut self, cmd: impl Into<Command>) -> Result<CommandReport, TopoError> {
        let mut cmd = cmd.into();
        let mut state = CommandState::PreValidated;
        state.advance(CommandState::Executing)?;
        let name = cmd.name();
        if let Err(e) = cmd.revalidate(&self.graph) {
            state.advance(CommandState::RolledBack)?;
            debug!("reject {name}: {e}");
            self.last_state = Some(state);
            return Err(e);
        }
        let trace = cmd.trace(&self.graph);
        debug!("execute {name} on {:?}", trace.entities);

        let mut tx = EditTx::new(&mut self.graph, self.geom.as_ref(), &self.config);
        let outcome = match cmd.execute(&mut tx) {
            Ok(()) => tx.commit(),
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        };
        match outcome {
            Ok((changes, report)) => {
                state.advance(CommandState::Committed)?;
                debug!(
                    "commit {name}: {} created, {} modified, {} destroyed",
                    report.created.len(),
                    report.modified.len(),
                    report.destroyed.len()
                );
                self.history.push(name, changes, report.clone(), trace);
                self.last_state = Some(state);
                Ok(report)
            }
            Err(e) => {
                state.advance(CommandState::RolledBack)?;
                debug!("rollback {name}: {e}");
                self.last_state = Some(state);
                Err(e)
            }
        }
    }

    pub fn undo(&mut self) -> Result<(), TopoError> {
        let mut cmd = self.history.take_undo()?;
        debug!("undo {} #{}", cmd.name, cmd.seq);
        cmd.changes.permute(&mut self.graph);
        self.graph.debug_assert_invariants();
        self.history.push_undone(cmd)
    }

    pub fn redo(&mut self) -> Result<(), TopoError> {
        let mut cmd = self.history.take_redo()?;
        debug!("redo {} #{}", cmd.name, cmd.seq);
        cmd.changes.permute(&mut self.graph);
        self.graph.debug_assert_invariants();
        self.history.push_redone(cmd)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn collect_kind<I: TopoEntity>(&mut self) -> usize {
        let dead: Vec<I> = self
            .graph
            .stored::<I>()
            .into_iter()
            .filter(|&id| !self.graph.is_live(id) && !self.history.references(id.any()))
            .collect();
        for &id in &dead {
            self.graph.purge(id);
        }
        dead.len()
    }

    /// Frees destroyed entities no command in the history can bring back.
    /// Their names become unknown to lookups. Returns the number purged.
    pub fn collect_garbage(&mut self) -> usize {
        let n = self.collect_kind::<BlockId>()
            + self.collect_kind::<FaceId>()
            + self.collect_kind::<CoFaceId>()
            + self.collect_kind::<EdgeId>()
            + self.collect_kind::<CoEdgeId>()
            + self.collect_kind::<VertexId>();
        debug!("garbage collection purged {n} entities");
        n
    }
}
