//! Errors raised by a matching request.

use crate::request::RequestState;
use mixmatch_core::CoreError;
use mixmatch_scenarios::ScenarioError;
use mixmatch_solver_common::SolverError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a desired mix cannot be reached from the current fleet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Infeasibility {
    /// More dispatchable capacity wanted than exists. Dispatchable capacity
    /// can be moved or converted but never built.
    #[error(
        "desired resource-independent capacity {desired_mw:.3} MW exceeds current {current_mw:.3} MW (types: {})",
        .gentypes.join(", ")
    )]
    ResourceIndependent {
        desired_mw: f64,
        current_mw: f64,
        gentypes: Vec<String>,
    },
    /// More capacity of a resource-dependent type wanted than exists, and the
    /// node inventory gives no per-node ceiling for it.
    #[error("{desired_mw:.3} MW of {gentype} wanted but only {current_mw:.3} MW exists and no per-node maximum is given")]
    NoMaximumCapacity {
        gentype: String,
        desired_mw: f64,
        current_mw: f64,
    },
    /// Desired capacity of a resource-dependent type exceeds the sum of the
    /// per-node ceilings.
    #[error("{desired_mw:.3} MW of {gentype} wanted but the node maximums only allow {maximum_mw:.3} MW")]
    ExceedsMaximum {
        gentype: String,
        desired_mw: f64,
        maximum_mw: f64,
    },
}

/// Errors that can occur while preprocessing or fulfilling a request.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Desired mix cannot be reached.
    #[error("Infeasible request: {0}")]
    InfeasibleRequest(Infeasibility),

    /// The optimizer ran but produced no solution.
    #[error("Optimization failed; examine the working directory {}", .workdir.display())]
    OptimizationFailed { workdir: PathBuf },

    /// The generation mix has no generation to scale against.
    #[error("Generation mix has no useable generation for types {gentypes:?}")]
    NoUseableGeneration { gentypes: Vec<String> },

    /// The desired mix lacks a required column.
    #[error("Desired mix has no '{0}' column")]
    MissingColumn(String),

    /// Operation called in the wrong lifecycle state.
    #[error("Cannot {operation} a request in state {state}")]
    InvalidState {
        operation: &'static str,
        state: RequestState,
    },

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// I/O errors (result export)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV errors (distance tables)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON errors (run manifest)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for matching operations.
pub type MatchResult<T> = Result<T, MatchError>;
