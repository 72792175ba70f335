//! The stack lifecycle machine.
//!
//! Phases move `Unset -> Creating -> Ready <-> Updating -> Deleting ->
//! Deleted`. `Failed` is reachable from any live phase (template
//! generation can fail before the first remote call, so `Unset` and
//! `Ready` feed it too, not just the in-flight phases). Terminal phases
//! accept nothing but a fresh `Creating` when the owning resource is
//! recreated.
//!
//! Transitions are driven exclusively by the reconciler reporting
//! outcomes of remote stack calls; nothing here talks to the provider.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::{ConditionStatus, StackStatus, StatusMeta};

/// Where a stack is in its remote lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackPhase {
    #[default]
    Unset,
    Creating,
    Ready,
    Updating,
    Deleting,
    Deleted,
    Failed,
}

impl StackPhase {
    /// Terminal phases accept no further mutation except a fresh create.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Deleted | Self::Failed)
    }

    /// Legal transitions of the lifecycle machine. Re-affirming the
    /// current phase is legal while the phase is live.
    pub fn can_transition(self, next: StackPhase) -> bool {
        use StackPhase::*;
        if self == next {
            return !self.is_terminal();
        }
        match (self, next) {
            (_, Failed) => !self.is_terminal(),
            (Unset, Creating) => true,
            (Creating, Ready | Deleting) => true,
            (Ready, Updating | Deleting) => true,
            (Updating, Ready | Deleting) => true,
            (Deleting, Deleted) => true,
            (Deleted | Failed, Creating) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("illegal phase transition {from:?} -> {to:?}")]
    InvalidTransition { from: StackPhase, to: StackPhase },

    #[error("stack id already recorded as {current}, refusing {offered}")]
    StackIdConflict { current: String, offered: String },

    #[error("stack id may only be re-affirmed on a live stack (phase {phase:?})")]
    StackIdPhase { phase: StackPhase },
}

impl StackStatus {
    pub fn phase(&self) -> StackPhase {
        self.status.phase
    }

    /// Record the remote stack identifier.
    ///
    /// Legal while no id is recorded yet, or when re-affirming the same
    /// id on a live stack. Changing an established id is a conflict.
    pub fn set_stack_id(&mut self, id: impl Into<String>) -> Result<(), LifecycleError> {
        let id = id.into();
        if self.stack_id.is_empty() {
            self.stack_id = id;
            return Ok(());
        }
        if self.stack_id != id {
            return Err(LifecycleError::StackIdConflict {
                current: self.stack_id.clone(),
                offered: id,
            });
        }
        match self.phase() {
            StackPhase::Creating | StackPhase::Ready | StackPhase::Updating => Ok(()),
            phase => Err(LifecycleError::StackIdPhase { phase }),
        }
    }

    /// Forget the remote identifier after the stack is gone, so a
    /// recreated resource starts from a fresh create.
    pub fn clear_stack_id(&mut self) {
        self.stack_id.clear();
    }

    /// Overwrite `status` and `status_meta` as one unit.
    ///
    /// Rejects illegal phase transitions and leaves the stored pair
    /// untouched on rejection, so observers never see a torn write.
    pub fn set_status(
        &mut self,
        status: ConditionStatus,
        meta: StatusMeta,
    ) -> Result<(), LifecycleError> {
        let from = self.phase();
        if !from.can_transition(status.phase) {
            return Err(LifecycleError::InvalidTransition {
                from,
                to: status.phase,
            });
        }
        self.status = status;
        self.status_meta = meta;
        Ok(())
    }
}
