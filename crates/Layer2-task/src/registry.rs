//! Task registry - fixed-size table of replica slots
//!
//! Slot `i` holds task `i`. A slot moves from `Active` to `Terminated` exactly
//! once and never back. Only the supervisor loop mutates the registry.

use crate::state::TaskState;
use crate::task::{Task, TaskOutcome};
use herd_foundation::{Error, Result};
use tracing::{debug, warn};

/// One registry position
#[derive(Debug)]
pub enum Slot {
    /// Task launched and not yet terminated
    Active(Task),
    /// Task finished; only its outcome remains
    Terminated(TaskOutcome),
}

impl Slot {
    pub fn is_active(&self) -> bool {
        matches!(self, Slot::Active(_))
    }

    pub fn state(&self) -> TaskState {
        match self {
            Slot::Active(task) => task.state().clone(),
            Slot::Terminated(outcome) => TaskState::Terminated(outcome.clone()),
        }
    }
}

/// Ordered registry of `capacity` slots
#[derive(Debug)]
pub struct Registry {
    slots: Vec<Slot>,
    capacity: usize,
}

impl Registry {
    /// Empty registry expecting `capacity` tasks
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append the next task. Tasks must be registered in index order.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.slots.len() >= self.capacity {
            return Err(Error::Internal(format!(
                "registry full ({} slots), cannot register task {}",
                self.capacity,
                task.index()
            )));
        }
        if task.index() != self.slots.len() {
            return Err(Error::Internal(format!(
                "task {} registered out of order (expected {})",
                task.index(),
                self.slots.len()
            )));
        }
        self.slots.push(Slot::Active(task));
        Ok(())
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn state(&self, index: usize) -> Option<TaskState> {
        self.slots.get(index).map(Slot::state)
    }

    /// Active task at `index`
    pub fn task_mut(&mut self, index: usize) -> Option<&mut Task> {
        match self.slots.get_mut(index) {
            Some(Slot::Active(task)) => Some(task),
            _ => None,
        }
    }

    /// All tasks still active, in index order
    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            Slot::Active(task) => Some(task),
            Slot::Terminated(_) => None,
        })
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_active()).count()
    }

    /// Every expected task was registered and has terminated
    pub fn is_finished(&self) -> bool {
        self.slots.len() == self.capacity && self.active_count() == 0
    }

    /// Record the terminal outcome of task `index`.
    ///
    /// Cancels the task's graceful timer as part of the transition. Returns the
    /// released task, or `None` when the slot is unknown, already terminated,
    /// or the outcome is illegal for the task's state.
    pub fn terminate(&mut self, index: usize, outcome: TaskOutcome) -> Option<Task> {
        let slot = match self.slots.get_mut(index) {
            Some(slot) => slot,
            None => {
                warn!("Terminal event for unknown task {}", index);
                return None;
            }
        };

        match slot {
            Slot::Active(task) if task.state().accepts(&outcome) => {}
            Slot::Active(task) => {
                warn!(
                    "Ignoring {} for task {} in state {}",
                    outcome.display_name(),
                    index,
                    task.state()
                );
                return None;
            }
            Slot::Terminated(_) => {
                debug!("Task {} already terminated, ignoring {}", index, outcome.display_name());
                return None;
            }
        }

        match std::mem::replace(slot, Slot::Terminated(outcome)) {
            Slot::Active(mut task) => {
                if task.cancel_timer() {
                    debug!("Cancelled graceful timer of task {}", index);
                }
                Some(task)
            }
            Slot::Terminated(_) => None,
        }
    }

    /// Outcomes in index order; `None` for tasks still active
    pub fn outcomes(&self) -> Vec<Option<TaskOutcome>> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Active(_) => None,
                Slot::Terminated(outcome) => Some(outcome.clone()),
            })
            .collect()
    }
}
