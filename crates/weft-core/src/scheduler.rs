//! Render-pass scheduling.
//!
//! The engine never renders inline from a dispatch; it hands a work closure
//! to a [`Scheduler`] and returns. Whatever dispatches between scheduling
//! and execution rides the same pass, which is where update batching comes
//! from.

use std::cell::RefCell;
use std::collections::VecDeque;

/// Deferred single-shot task execution.
///
/// Implementations must not run `work` inside `schedule`: the engine
/// schedules from inside event handlers and commit callbacks, and an inline
/// run would re-enter state that is still borrowed.
pub trait Scheduler {
    fn schedule(&self, work: Box<dyn FnOnce()>);
}

/// FIFO scheduler driven manually. Tasks run when [`QueueScheduler::drain`]
/// is called; tasks scheduled while draining run in the same drain.
#[derive(Default)]
pub struct QueueScheduler {
    queue: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.borrow().is_empty()
    }

    pub fn drain(&self) {
        loop {
            let task = self.queue.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, work: Box<dyn FnOnce()>) {
        self.queue.borrow_mut().push_back(work);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn drain_runs_tasks_scheduled_while_draining() {
        let scheduler = Rc::new(QueueScheduler::new());
        let ran = Rc::new(Cell::new(0));

        let inner_ran = Rc::clone(&ran);
        let inner_scheduler = Rc::clone(&scheduler);
        scheduler.schedule(Box::new(move || {
            inner_ran.set(inner_ran.get() + 1);
            let nested_ran = Rc::clone(&inner_ran);
            inner_scheduler.schedule(Box::new(move || {
                nested_ran.set(nested_ran.get() + 1);
            }));
        }));

        scheduler.drain();
        assert_eq!(ran.get(), 2);
        assert!(!scheduler.has_pending());
    }
}
