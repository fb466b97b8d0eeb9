use crate::topo_error::TopoError;
use serde::Serialize;
use std::fmt;

/// Lifecycle of a command.
///
/// `Created -> PreValidated -> Executing -> {Committed | RolledBack}`, then
/// `Committed -> Undone`, and `Undone <-> Redone` any number of times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CommandState {
    Created,
    PreValidated,
    Executing,
    Committed,
    RolledBack,
    Undone,
    Redone,
}

impl CommandState {
    pub fn can_become(self, next: CommandState) -> bool {
        use CommandState::*;
        matches!(
            (self, next),
            (Created, PreValidated)
                | (PreValidated, Executing)
                | (Executing, Committed)
                | (Executing, RolledBack)
                | (Committed, Undone)
                | (Redone, Undone)
                | (Undone, Redone)
        )
    }

    /// Moves to `next`, refusing transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: CommandState) -> Result<(), TopoError> {
        if !self.can_become(next) {
            return Err(TopoError::Internal(format!(
                "command cannot go from {self} to {next}"
            )));
        }
        *self = next;
        Ok(())
    }

    /// `true` when the command's effects are visible in the graph.
    pub fn is_applied(self) -> bool {
        matches!(self, CommandState::Committed | CommandState::Redone)
    }
}

impl fmt::Display for CommandState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut s = CommandState::Created;
        for next in [
            CommandState::PreValidated,
            CommandState::Executing,
            CommandState::Committed,
            CommandState::Undone,
            CommandState::Redone,
            CommandState::Undone,
        ] {
            s.advance(next).unwrap();
        }
        assert!(!s.is_applied());
    }

    #[test]
    fn rolled_back_is_final() {
        let mut s = CommandState::Executing;
        s.advance(CommandState::RolledBack).unwrap();
        assert!(s.advance(CommandState::Undone).is_err());
        assert!(s.advance(CommandState::Committed).is_err());
        assert_eq!(s, CommandState::RolledBack);
    }
}
