//! Subprocess optimizer adapter.
//!
//! Stages the problem as CSV files, runs an external program (a modeling
//! system such as GAMS with a model file, or any executable that understands
//! the exchange layout) with the working directory as its current directory,
//! and reads the output files back.

use crate::adapter::{RunOutcome, SolveHandle, SolverAdapter};
use crate::error::{ExitCode, SolverError, SolverResult};
use crate::exchange::{read_outputs, write_inputs, SUCCESS_ARTIFACT};
use crate::problem::MatchProblem;
use crate::solution::MatchSolution;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use tracing::{debug, warn};

/// Captured stdout/stderr of the last run, relative to the working directory.
pub const SOLVER_LOG: &str = "solver.log";

/// Runs an external optimizer program.
#[derive(Debug, Clone)]
pub struct CommandAdapter {
    program: String,
    args: Vec<String>,
    model_file: Option<PathBuf>,
    search_dir: Option<PathBuf>,
}

impl CommandAdapter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            model_file: None,
            search_dir: None,
        }
    }

    /// Extra arguments passed after the model file.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Model copied into the working directory and passed as first argument.
    pub fn with_model_file(mut self, model_file: impl Into<PathBuf>) -> Self {
        self.model_file = Some(model_file.into());
        self
    }

    /// Directory searched for the program before `PATH`.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Find the optimizer binary.
    ///
    /// Search order:
    /// 1. `program` itself when it is a path to an existing file
    /// 2. the configured search directory
    /// 3. ~/.mixmatch/solvers/<program>
    /// 4. System PATH
    pub fn find_binary(&self) -> SolverResult<PathBuf> {
        let direct = Path::new(&self.program);
        if direct.components().count() > 1 && direct.is_file() {
            // The program runs from inside the working directory.
            return Ok(fs::canonicalize(direct)?);
        }

        let default_dir = dirs::home_dir().map(|home| home.join(".mixmatch").join("solvers"));
        for dir in self.search_dir.iter().chain(default_dir.iter()) {
            let candidate = dir.join(&self.program);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        if let Ok(path) = which::which(&self.program) {
            return Ok(path);
        }

        Err(SolverError::NotInstalled {
            program: self.program.clone(),
            hint: "Install it, put it on PATH, or set [solver] program in ~/.mixmatch/config.toml"
                .to_string(),
        })
    }
}

impl SolverAdapter for CommandAdapter {
    fn name(&self) -> &str {
        &self.program
    }

    fn prepare(&self, problem: &MatchProblem, workdir: &Path) -> SolverResult<SolveHandle> {
        fs::create_dir_all(workdir)?;
        let mut handle = SolveHandle::new(workdir);
        clear_outputs(&handle)?;
        write_inputs(problem, &handle.inputs_dir())?;
        fs::create_dir_all(handle.outputs_dir())?;

        if let Some(model) = &self.model_file {
            if !model.is_file() {
                return Err(SolverError::MissingModelFile(model.clone()));
            }
            let name = model
                .file_name()
                .ok_or_else(|| SolverError::MissingModelFile(model.clone()))?;
            fs::copy(model, workdir.join(name))?;
            handle.model_file = Some(name.to_string_lossy().into_owned());
        }
        debug!(workdir = %workdir.display(), "prepared optimizer working directory");
        Ok(handle)
    }

    fn run(&self, handle: &SolveHandle) -> SolverResult<RunOutcome> {
        let binary = self.find_binary()?;
        let start = Instant::now();

        let output = Command::new(&binary)
            .args(handle.model_file.iter())
            .args(&self.args)
            .current_dir(handle.workdir())
            .output()
            .map_err(|source| SolverError::ProcessStart {
                program: binary.display().to_string(),
                source,
            })?;

        let elapsed = start.elapsed();
        let mut log = output.stdout.clone();
        log.extend_from_slice(&output.stderr);
        fs::write(handle.workdir().join(SOLVER_LOG), &log)?;

        let exit_code = ExitCode::from_raw(output.status.code());
        if !exit_code.is_success() {
            warn!(%exit_code, log = SOLVER_LOG, "optimizer did not exit cleanly");
            return Err(SolverError::ProcessFailed {
                exit_code,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(RunOutcome { exit_code, elapsed })
    }

    fn collect(&self, handle: &SolveHandle) -> SolverResult<Option<MatchSolution>> {
        read_outputs(&handle.outputs_dir())
    }
}

/// Remove results left behind by an earlier run in the same directory.
fn clear_outputs(handle: &SolveHandle) -> SolverResult<()> {
    let outputs = handle.outputs_dir();
    if outputs.is_dir() {
        fs::remove_dir_all(&outputs)?;
    }
    let stray = handle.workdir().join(SUCCESS_ARTIFACT);
    if stray.is_file() {
        fs::remove_file(&stray)?;
    }
    Ok(())
}
