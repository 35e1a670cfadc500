//! Optimizer boundary for generation-mix matching.
//!
//! The capacity-placement model itself lives outside this workspace. This
//! crate fixes what crosses the boundary ([`MatchProblem`] in,
//! [`MatchSolution`] out), the [`SolverAdapter`] seam the request engine
//! depends on, and one concrete adapter that talks to an external program
//! through CSV files.
//!
//! ```text
//! MatchRequest ──prepare──> <workdir>/inputs/*.csv ──> optimizer (subprocess)
//!              <─collect─── <workdir>/outputs/*.csv <──
//! ```
//!
//! # Protocol Version
//!
//! The exchange layout is versioned; `inputs/manifest.json` records
//! [`PROTOCOL_VERSION`] so a model can refuse files it does not understand.

pub mod adapter;
pub mod error;
pub mod exchange;
pub mod problem;
pub mod solution;
pub mod subprocess;

pub use adapter::{solve, RunOutcome, SolveHandle, SolverAdapter};
pub use error::{ExitCode, SolverError, SolverResult};
pub use exchange::{outputs_present, read_outputs, write_inputs, SUCCESS_ARTIFACT};
pub use problem::{
    MatchProblem, NodeTypeValue, NodeValue, ProblemManifest, TypeDistance, TypeValue,
};
pub use solution::MatchSolution;
pub use subprocess::CommandAdapter;

/// Protocol version of the file exchange.
/// Increment when making breaking changes to the layout.
pub const PROTOCOL_VERSION: i32 = 1;
