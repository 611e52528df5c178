//! Event stream for solver operations.
//!
//! A solve driven through
//! [`ConjugateGradientSolver::solve_with`](crate::cg::ConjugateGradientSolver::solve_with)
//! emits [`SolverEvent`]s to an [`EventSink`]: what was requested, the
//! residual after every iteration, and how the solve ended.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Events emitted during a solver invocation.
///
/// Events are tagged with `#[serde(tag = "type")]` so they serialise as
/// `{ "type": "SolveRequested", ... }` for easy ingestion into event stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SolverEvent {
    /// Inputs validated; the loop is about to start.
    SolveRequested {
        /// System dimension `n`.
        dimension: usize,
        /// Iteration cap.
        max_iterations: usize,
        /// Residual-norm tolerance.
        tolerance: f64,
        /// `||b - A x0||`.
        initial_residual: f64,
    },

    /// One CG iteration completed.
    IterationCompleted {
        /// Iteration number (1-based: the count after this step).
        iteration: usize,
        /// Residual norm after the step.
        residual: f64,
        /// Step length used.
        alpha: f64,
        /// Direction-update weight used.
        beta: f64,
        /// Wall time elapsed since the solve began.
        elapsed: Duration,
    },

    /// The residual norm fell to or below the tolerance.
    SolveConverged {
        /// Total iterations executed.
        iterations: usize,
        /// Final residual norm.
        residual: f64,
        /// Total wall time.
        wall_time: Duration,
    },

    /// The iteration cap ended the loop before the tolerance was met.
    IterationLimitReached {
        /// Total iterations executed.
        iterations: usize,
        /// Final residual norm.
        residual: f64,
        /// Total wall time.
        wall_time: Duration,
    },

    /// A zero or non-finite denominator aborted the solve.
    Breakdown {
        /// Iteration at which the breakdown occurred.
        iteration: usize,
        /// Human-readable explanation.
        detail: String,
    },

    /// The budget stopped the solve.
    BudgetExhausted {
        /// Iterations completed.
        iterations: usize,
        /// Which limit was hit.
        limit: BudgetLimit,
        /// Wall time elapsed.
        elapsed: Duration,
    },
}

/// Which budget limit stopped a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetLimit {
    /// Wall-clock time limit.
    WallTime,
    /// Cancellation requested through a
    /// [`CancellationToken`](crate::budget::CancellationToken).
    Cancelled,
}

/// Receiver of solver events.
pub trait EventSink {
    /// Handle one event.
    fn emit(&mut self, event: SolverEvent);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    #[inline]
    fn emit(&mut self, _event: SolverEvent) {}
}

/// Collects events in memory, in emission order.
impl EventSink for Vec<SolverEvent> {
    fn emit(&mut self, event: SolverEvent) {
        self.push(event);
    }
}

/// Forwards events to `tracing` at `info` level (per-iteration events at
/// `trace`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: SolverEvent) {
        match &event {
            SolverEvent::IterationCompleted { iteration, residual, .. } => {
                tracing::trace!(iteration, residual, "cg iteration");
            }
            other => tracing::info!(event = ?other, "cg event"),
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    #[inline]
    fn emit(&mut self, event: SolverEvent) {
        (**self).emit(event)
    }
}
