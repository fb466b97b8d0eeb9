//! Undo/redo stacks and the append-only trace of committed commands.

use crate::command::state::CommandState;
use crate::command::tx::{ChangeSet, CommandReport};
use crate::topo_error::TopoError;
use crate::topology::id::AnyId;
use serde::Serialize;
use std::collections::VecDeque;

/// Direction in which a command was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TraceAction {
    Do,
    Undo,
    Redo,
}

/// Entity names and parameters describing one command invocation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CommandTrace {
    pub entities: Vec<String>,
    pub parameters: serde_json::Value,
}

/// One line of the provenance trace.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceRecord {
    /// Sequence number of the command this record is about.
    pub seq: u64,
    pub action: TraceAction,
    pub command: String,
    pub entities: Vec<String>,
    pub parameters: serde_json::Value,
}

/// A command that went through commit, with what is needed to undo it.
#[derive(Clone, Debug)]
pub struct CommittedCommand {
    pub seq: u64,
    pub name: &'static str,
    pub state: CommandState,
    pub report: CommandReport,
    pub(crate) changes: ChangeSet,
    trace: CommandTrace,
}

#[derive(Clone, Debug, Default)]
pub struct History {
    undo: VecDeque<CommittedCommand>,
    redo: Vec<CommittedCommand>,
    trace: Vec<TraceRecord>,
    max_undo: Option<usize>,
    next_seq: u64,
}

impl History {
    pub fn new(max_undo: Option<usize>) -> Self {
        History { max_undo, ..Default::default() }
    }

    fn record(&mut self, seq: u64, action: TraceAction, name: &str, trace: &CommandTrace) {
        self.trace.push(TraceRecord {
            seq,
            action,
            command: name.to_owned(),
            entities: trace.entities.clone(),
            parameters: trace.parameters.clone(),
        });
    }

    /// Registers a committed command. The redo stack is discarded and the
    /// oldest undo entry dropped past `max_undo`.
    pub(crate) fn push(
        &mut self,
        name: &'static str,
        changes: ChangeSet,
        report: CommandReport,
        trace: CommandTrace,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.record(seq, TraceAction::Do, name, &trace);
        self.redo.clear();
        self.undo.push_back(CommittedCommand {
            seq,
            name,
            state: CommandState::Committed,
            report,
            changes,
            trace,
        });
        if let Some(max) = self.max_undo {
            while self.undo.len() > max {
                self.undo.pop_front();
            }
        }
        seq
    }

    pub(crate) fn take_undo(&mut self) -> Result<CommittedCommand, TopoError> {
        self.undo.pop_back().ok_or(TopoError::NothingToUndo)
    }

    pub(crate) fn take_redo(&mut self) -> Result<CommittedCommand, TopoError> {
        self.redo.pop().ok_or(TopoError::NothingToRedo)
    }

    pub(crate) fn push_undone(&mut self, mut cmd: CommittedCommand) -> Result<(), TopoError> {
        cmd.state.advance(CommandState::Undone)?;
        self.record(cmd.seq, TraceAction::Undo, cmd.name, &cmd.trace);
        self.redo.push(cmd);
        Ok(())
    }

    pub(crate) fn push_redone(&mut self, mut cmd: CommittedCommand) -> Result<(), TopoError> {
        cmd.state.advance(CommandState::Redone)?;
        self.record(cmd.seq, TraceAction::Redo, cmd.name, &cmd.trace);
        self.undo.push_back(cmd);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Commands that can be undone, oldest first.
    pub fn undo_stack(&self) -> impl Iterator<Item = &CommittedCommand> {
        self.undo.iter()
    }

    /// `true` when a command kept in either stack saved a state of `id`.
    pub fn references(&self, id: AnyId) -> bool {
        self.undo.iter().chain(self.redo.iter()).any(|c| c.changes.references(id))
    }

    /// Number of trace records.
    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.trace
    }

    /// The trace as a JSON array.
    pub fn to_json(&self) -> Result<String, TopoError> {
        serde_json::to_string_pretty(&self.trace).map_err(|e| TopoError::Internal(e.to_string()))
    }
}
