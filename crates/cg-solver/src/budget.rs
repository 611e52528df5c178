//! Wall-clock limits and cooperative cancellation for a solve.
//!
//! [`BudgetEnforcer`] tracks elapsed time against a
//! [`ComputeBudget`](crate::types::ComputeBudget). The solver calls
//! [`check_iteration`](BudgetEnforcer::check_iteration) at the top of each
//! iteration, before any matrix-vector product, so a cancelled or expired
//! solve stops between whole iterations and never leaves a half-updated
//! iterate behind.
//!
//! Violations are reported as [`SolverError::BudgetExhausted`] with a
//! human-readable reason describing which limit was hit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::SolverError;
use crate::events::BudgetLimit;
use crate::types::ComputeBudget;

/// Shared flag used to request cancellation of a running solve.
///
/// Clones share the same flag, so one clone can be handed to the solve while
/// another is kept by the thread that decides to stop it.
///
/// ```
/// use cg_solver::budget::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, not-yet-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Enforces the wall-time and cancellation budget during a solve.
///
/// Create one at the start of a solve and call
/// [`check_iteration`](Self::check_iteration) once per iteration. The
/// enforcer is non-`Clone` so that each solve owns exactly one.
///
/// # Example
///
/// ```
/// use cg_solver::budget::BudgetEnforcer;
/// use cg_solver::types::ComputeBudget;
///
/// let budget = ComputeBudget::default();
/// let mut enforcer = BudgetEnforcer::new(&budget);
///
/// // At the top of each solver iteration:
/// enforcer.check_iteration().unwrap();
/// assert_eq!(enforcer.iterations_checked(), 1);
/// ```
#[derive(Debug)]
pub struct BudgetEnforcer {
    /// Monotonic clock snapshot taken when the enforcer was created.
    start_time: Instant,

    max_time: Option<Duration>,

    cancel: Option<CancellationToken>,

    /// Number of successful checks so far.
    iterations_checked: usize,
}

impl BudgetEnforcer {
    /// Create a new enforcer for `budget`.
    ///
    /// The wall-clock timer starts immediately.
    pub fn new(budget: &ComputeBudget) -> Self {
        Self {
            start_time: Instant::now(),
            max_time: budget.max_time,
            cancel: budget.cancel.clone(),
            iterations_checked: 0,
        }
    }

    /// Check whether the next iteration may run.
    ///
    /// Cancellation is checked before the clock, so a cancelled solve always
    /// reports [`BudgetLimit::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::BudgetExhausted`] if the solve was cancelled or
    /// the wall-clock limit has passed.
    pub fn check_iteration(&mut self) -> Result<(), SolverError> {
        if let Some(limit) = self.exceeded() {
            let elapsed = self.start_time.elapsed();
            let reason = match limit {
                BudgetLimit::Cancelled => "solve cancelled by caller".to_string(),
                BudgetLimit::WallTime => format!(
                    "wall-clock time limit reached ({:.2?} > {:.2?})",
                    elapsed,
                    self.max_time.unwrap_or_default(),
                ),
            };
            return Err(SolverError::BudgetExhausted {
                reason,
                limit,
                iterations: self.iterations_checked,
                elapsed,
            });
        }

        self.iterations_checked += 1;
        Ok(())
    }

    /// Which limit, if any, is currently exceeded.
    pub fn exceeded(&self) -> Option<BudgetLimit> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(BudgetLimit::Cancelled);
        }
        match self.max_time {
            Some(max) if self.start_time.elapsed() > max => Some(BudgetLimit::WallTime),
            _ => None,
        }
    }

    /// Wall-clock duration elapsed since the enforcer was created.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of iterations that passed the check.
    #[inline]
    pub fn iterations_checked(&self) -> usize {
        self.iterations_checked
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_budget_never_fires() {
        let mut enforcer = BudgetEnforcer::new(&ComputeBudget::unbounded());
        for _ in 0..1000 {
            enforcer.check_iteration().unwrap();
        }
        assert_eq!(enforcer.iterations_checked(), 1000);
        assert_eq!(enforcer.exceeded(), None);
    }

    #[test]
    fn wall_clock_limit_exceeded() {
        let budget = ComputeBudget::with_max_time(Duration::from_nanos(1));
        let mut enforcer = BudgetEnforcer::new(&budget);

        // Burn a tiny bit of time so Instant::now() moves forward
        std::thread::sleep(Duration::from_micros(10));

        let err = enforcer.check_iteration().unwrap_err();
        match err {
            SolverError::BudgetExhausted { ref reason, limit, iterations, .. } => {
                assert!(reason.contains("wall-clock"), "reason: {reason}");
                assert_eq!(limit, BudgetLimit::WallTime);
                assert_eq!(iterations, 0);
            }
            other => panic!("expected BudgetExhausted for time, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_stops_next_check() {
        let token = CancellationToken::new();
        let budget = ComputeBudget::unbounded().cancellable(token.clone());
        let mut enforcer = BudgetEnforcer::new(&budget);

        enforcer.check_iteration().unwrap();
        enforcer.check_iteration().unwrap();
        token.cancel();

        let err = enforcer.check_iteration().unwrap_err();
        match err {
            SolverError::BudgetExhausted { ref reason, limit, iterations, .. } => {
                assert!(reason.contains("cancelled"), "reason: {reason}");
                assert_eq!(limit, BudgetLimit::Cancelled);
                assert_eq!(iterations, 2);
            }
            other => panic!("expected BudgetExhausted for cancel, got {other:?}"),
        }
        assert_eq!(enforcer.exceeded(), Some(BudgetLimit::Cancelled));
    }

    #[test]
    fn cancellation_wins_over_time() {
        let token = CancellationToken::new();
        token.cancel();
        let budget = ComputeBudget::with_max_time(Duration::ZERO).cancellable(token);
        let enforcer = BudgetEnforcer::new(&budget);
        std::thread::sleep(Duration::from_micros(10));
        assert_eq!(enforcer.exceeded(), Some(BudgetLimit::Cancelled));
    }
}
