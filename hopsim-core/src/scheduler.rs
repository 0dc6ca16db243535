//! The discrete-event scheduler.
//!
//! The [`Scheduler`] owns the virtual clock and the queue of future
//! actions. There is exactly one logical thread of control: [`Scheduler::run`]
//! pops the earliest event, moves the clock to its fire time and executes
//! it. Actions are handed the simulated world and the scheduler itself so
//! they can enqueue follow-up events.
//!
//! Events due at the same instant run in the order they were scheduled,
//! which makes every run reproducible.
//!
//! ```
//! use hopsim_core::{
//!     scheduler::{ScheduleError, Scheduler},
//!     time::{SimDelay, SimTime},
//! };
//!
//! let mut scheduler: Scheduler<Vec<&str>, ScheduleError> = Scheduler::new();
//! let mut log = Vec::new();
//!
//! scheduler.schedule(SimDelay::from_secs(2), |log, _| {
//!     log.push("second");
//!     Ok(())
//! })?;
//! scheduler.schedule(SimDelay::from_secs(1), |log, scheduler| {
//!     log.push("first");
//!     scheduler.schedule(SimDelay::from_secs(5), |log, _| {
//!         log.push("too late");
//!         Ok(())
//!     })
//! })?;
//!
//! let summary = scheduler.run(&mut log, SimTime::from_secs(3))?;
//!
//! assert_eq!(log, ["first", "second"]);
//! assert_eq!(summary.executed, 2);
//! assert_eq!(summary.pending, 1);
//! assert_eq!(scheduler.now(), SimTime::from_secs(3));
//! # Ok::<(), ScheduleError>(())
//! ```
use crate::{
    time::{SimDelay, SimTime},
    time_queue::TimeQueue,
};
use thiserror::Error;

/// Misuse of the [`Scheduler`]. Both variants are fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Cannot schedule an event with a negative delay ({delay})")]
    InvalidDelay { delay: SimDelay },
    #[error("Cannot schedule an event at {at}, the clock is already at {now}")]
    CausalityViolation { now: SimTime, at: SimTime },
}

/// A deferred operation on the world `W`.
pub type Action<W, E> = Box<dyn FnOnce(&mut W, &mut Scheduler<W, E>) -> Result<(), E>>;

pub struct Scheduler<W, E = crate::SimError> {
    now: SimTime,

    queue: TimeQueue<Action<W, E>>,

    /// number of events executed since the creation of the scheduler
    executed: u64,
}

/// Outcome of a call to [`Scheduler::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// events executed during this run
    pub executed: u64,
    /// the clock at the end of the run
    pub end: SimTime,
    /// events left in the queue because they are due after the stop time
    pub pending: usize,
}

impl<W, E> Scheduler<W, E>
where
    E: From<ScheduleError>,
{
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            queue: TimeQueue::new(),
            executed: 0,
        }
    }

    /// the current virtual time
    #[inline]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// number of events waiting to be executed
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// total number of events executed so far
    #[inline]
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Schedule `action` to fire `delay` after the current time.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidDelay`] if `delay` is negative.
    pub fn schedule<F>(&mut self, delay: SimDelay, action: F) -> Result<(), ScheduleError>
    where
        F: FnOnce(&mut W, &mut Scheduler<W, E>) -> Result<(), E> + 'static,
    {
        if delay.is_negative() {
            return Err(ScheduleError::InvalidDelay { delay });
        }
        let at = self
            .now
            .checked_add(delay)
            .ok_or(ScheduleError::InvalidDelay { delay })?;

        self.push(at, Box::new(action));
        Ok(())
    }

    /// Schedule `action` to fire at the absolute time `at`.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::CausalityViolation`] if `at` is in the past.
    pub fn schedule_at<F>(&mut self, at: SimTime, action: F) -> Result<(), ScheduleError>
    where
        F: FnOnce(&mut W, &mut Scheduler<W, E>) -> Result<(), E> + 'static,
    {
        if at < self.now {
            return Err(ScheduleError::CausalityViolation { now: self.now, at });
        }

        self.push(at, Box::new(action));
        Ok(())
    }

    fn push(&mut self, at: SimTime, action: Action<W, E>) {
        tracing::trace!(now = %self.now, %at, "event scheduled");
        self.queue.push(at, action);
    }

    /// Execute events in time order until the queue is empty or the next
    /// event is due after `stop`. The clock then reads `stop`.
    ///
    /// The first action to fail aborts the run and its error is returned;
    /// the clock stays at the failing event's time.
    pub fn run(&mut self, world: &mut W, stop: SimTime) -> Result<RunSummary, E> {
        let mut executed = 0;

        while let Some((due, action)) = self.queue.pop_elapsed(stop) {
            debug_assert!(due >= self.now, "the queue never yields past events");
            self.now = due;

            action(world, self)?;

            executed += 1;
            self.executed += 1;
        }

        if self.now < stop {
            self.now = stop;
        }

        let summary = RunSummary {
            executed,
            end: self.now,
            pending: self.queue.len(),
        };
        tracing::debug!(
            executed = summary.executed,
            end = %summary.end,
            pending = summary.pending,
            "scheduler run completed"
        );
        Ok(summary)
    }
}

impl<W, E> Default for Scheduler<W, E>
where
    E: From<ScheduleError>,
{
    fn default() -> Self {
        Self::new()
    }
}
