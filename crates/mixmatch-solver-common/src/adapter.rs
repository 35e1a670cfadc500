//! The seam between a matching request and whatever solves it.

use crate::error::{ExitCode, SolverResult};
use crate::exchange::{INPUTS_DIR, OUTPUTS_DIR};
use crate::problem::MatchProblem;
use crate::solution::MatchSolution;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Working directory of one optimizer run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveHandle {
    workdir: PathBuf,
    /// File name of the model copied into the working directory, if any.
    pub model_file: Option<String>,
}

impl SolveHandle {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            model_file: None,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn inputs_dir(&self) -> PathBuf {
        self.workdir.join(INPUTS_DIR)
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.workdir.join(OUTPUTS_DIR)
    }
}

/// What happened when the optimizer ran.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub exit_code: ExitCode,
    pub elapsed: Duration,
}

/// Optimizer backend.
///
/// `prepare` stages the problem in a working directory, `run` blocks until
/// the optimizer finishes and fails unless it exits cleanly, and `collect`
/// reads its results back. `collect`
/// returns `Ok(None)` when the run produced no solution; the working
/// directory is left in place for inspection.
pub trait SolverAdapter {
    fn name(&self) -> &str;

    fn prepare(&self, problem: &MatchProblem, workdir: &Path) -> SolverResult<SolveHandle>;

    fn run(&self, handle: &SolveHandle) -> SolverResult<RunOutcome>;

    fn collect(&self, handle: &SolveHandle) -> SolverResult<Option<MatchSolution>>;
}

/// Drive `adapter` through prepare, run and collect.
pub fn solve(
    adapter: &dyn SolverAdapter,
    problem: &MatchProblem,
    workdir: &Path,
) -> SolverResult<Option<MatchSolution>> {
    let handle = adapter.prepare(problem, workdir)?;
    let outcome = adapter.run(&handle)?;
    info!(
        solver = adapter.name(),
        exit_code = %outcome.exit_code,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "optimizer finished"
    );
    let solution = adapter.collect(&handle)?;
    if solution.is_none() {
        error!(
            solver = adapter.name(),
            workdir = %handle.workdir().display(),
            "optimizer produced no solution"
        );
    }
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the call order and returns a canned solution.
    struct Recording {
        calls: RefCell<Vec<&'static str>>,
        solution: Option<MatchSolution>,
    }

    impl SolverAdapter for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn prepare(&self, _problem: &MatchProblem, workdir: &Path) -> SolverResult<SolveHandle> {
            self.calls.borrow_mut().push("prepare");
            Ok(SolveHandle::new(workdir))
        }

        fn run(&self, _handle: &SolveHandle) -> SolverResult<RunOutcome> {
            self.calls.borrow_mut().push("run");
            Ok(RunOutcome {
                exit_code: ExitCode::Success,
                elapsed: Duration::from_millis(1),
            })
        }

        fn collect(&self, _handle: &SolveHandle) -> SolverResult<Option<MatchSolution>> {
            self.calls.borrow_mut().push("collect");
            Ok(self.solution.clone())
        }
    }

    #[test]
    fn solve_calls_in_order() {
        let adapter = Recording {
            calls: RefCell::new(Vec::new()),
            solution: Some(MatchSolution::default()),
        };
        let result = solve(&adapter, &MatchProblem::default(), Path::new("/tmp/run")).unwrap();
        assert!(result.is_some());
        assert_eq!(*adapter.calls.borrow(), vec!["prepare", "run", "collect"]);
    }

    #[test]
    fn handle_layout() {
        let handle = SolveHandle::new("/work");
        assert_eq!(handle.inputs_dir(), PathBuf::from("/work/inputs"));
        assert_eq!(handle.outputs_dir(), PathBuf::from("/work/outputs"));
    }
}
