//! Matching request lifecycle.
//!
//! ```text
//! Constructed ──preprocess──> Preprocessed ──fulfill──> Fulfilled
//! ```
//!
//! `preprocess` scales the desired mix to the target system's load and checks
//! that the current fleet can reach it. `fulfill` hands the problem to a
//! [`SolverAdapter`] and reconciles the solution into a result summary.

use crate::error::{MatchError, MatchResult};
use crate::feasibility::{check_feasibility, CURRENT_CAPACITY, DESIRED_CAPACITY};
use crate::gendists::{default_gendists, drop_default_gendists, filter_gendists};
use mixmatch_core::{
    is_resource_independent, partition_gentypes, round_to, Generator, NodeTable, TypeTable,
    CURTAILMENT,
};
use mixmatch_scenarios::ScenarioDataset;
use mixmatch_solver_common::{
    solve, MatchProblem, MatchSolution, NodeTypeValue, NodeValue, SolverAdapter, SolverError,
    TypeDistance, TypeValue,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CAPACITY_GW: &str = "Capacity (GW)";
pub const GENERATION_TWH: &str = "Generation (TWh)";
pub const CAPACITY_FRACTION: &str = "Capacity Fraction";
pub const GENERATION_FRACTION: &str = "Generation Fraction";

pub const KEPT: &str = "kept (MW)";
pub const SWAPPED_OUT: &str = "swapped out (MW)";
pub const SWAPPED_IN: &str = "swapped in (MW)";
pub const ADDED: &str = "added (MW)";
pub const REMOVED: &str = "removed (MW)";
pub const FINAL: &str = "final (MW)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Constructed,
    Preprocessed,
    Fulfilled,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestState::Constructed => write!(f, "constructed"),
            RequestState::Preprocessed => write!(f, "preprocessed"),
            RequestState::Fulfilled => write!(f, "fulfilled"),
        }
    }
}

/// How the desired mix was scaled to the target system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scaling {
    /// Annual load of the target system (TWh).
    pub system_load_twh: f64,
    /// Useable generation of the selected types in the mix (TWh).
    pub genmix_generation_twh: f64,
    pub scale_factor: f64,
}

/// Options for [`MatchRequest::fulfill`].
#[derive(Debug, Clone)]
pub struct FulfillOptions {
    /// Directory the optimizer runs in; kept after the run.
    pub workdir: PathBuf,
    /// Type distances; the default matrix when `None`.
    pub gendists: Option<Vec<TypeDistance>>,
    /// Decimal digits the desired capacities (MW) are rounded to.
    pub precision: i32,
}

impl FulfillOptions {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            gendists: None,
            precision: 0,
        }
    }
}

/// Request to re-shape a system's generator fleet to match a scenario mix.
#[derive(Debug, Clone)]
pub struct MatchRequest {
    nodes: NodeTable,
    generators: Vec<Generator>,
    gentypes: Vec<String>,
    exclusions: Vec<String>,
    original_desired_mix: TypeTable,
    state: RequestState,
    desired_mix: Option<TypeTable>,
    scaling: Option<Scaling>,
    summary: Option<TypeTable>,
    solution: Option<MatchSolution>,
    result_summary: Option<TypeTable>,
}

impl MatchRequest {
    /// `desired_mix` is a generation mix as returned by
    /// [`ScenarioDataset::get_genmix`]. The active generator types are the
    /// dataset's types minus `exclusions`.
    pub fn new(
        nodes: NodeTable,
        generators: Vec<Generator>,
        dataset: &ScenarioDataset,
        desired_mix: TypeTable,
        exclusions: Vec<String>,
    ) -> MatchResult<Self> {
        let gentypes = dataset.gentypes()?;
        Ok(Self::with_gentypes(
            nodes,
            generators,
            gentypes,
            desired_mix,
            exclusions,
        ))
    }

    /// Build a request against an explicit list of dataset generator types.
    pub fn with_gentypes(
        nodes: NodeTable,
        generators: Vec<Generator>,
        dataset_gentypes: Vec<String>,
        desired_mix: TypeTable,
        exclusions: Vec<String>,
    ) -> Self {
        let gentypes = dataset_gentypes
            .into_iter()
            .filter(|g| !exclusions.contains(g))
            .collect();
        Self {
            nodes,
            generators,
            gentypes,
            exclusions,
            original_desired_mix: desired_mix,
            state: RequestState::Constructed,
            desired_mix: None,
            scaling: None,
            summary: None,
            solution: None,
            result_summary: None,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Active generator types.
    pub fn gentypes(&self) -> &[String] {
        &self.gentypes
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn original_desired_mix(&self) -> &TypeTable {
        &self.original_desired_mix
    }

    /// Scaled, filtered mix (after `preprocess`).
    pub fn desired_mix(&self) -> Option<&TypeTable> {
        self.desired_mix.as_ref()
    }

    pub fn scaling(&self) -> Option<Scaling> {
        self.scaling
    }

    /// Current and desired MW per type (after `preprocess`).
    pub fn summary(&self) -> Option<&TypeTable> {
        self.summary.as_ref()
    }

    pub fn solution(&self) -> Option<&MatchSolution> {
        self.solution.as_ref()
    }

    /// Summary plus the optimizer's moves per type (after `fulfill`).
    pub fn result_summary(&self) -> Option<&TypeTable> {
        self.result_summary.as_ref()
    }

    /// Existing capacity (MW) per generator type.
    pub fn current_mix(&self) -> MatchResult<TypeTable> {
        let mix = TypeTable::pivot_sum(
            CURRENT_CAPACITY,
            self.generators
                .iter()
                .map(|g| (g.generator_type.as_str(), g.capacity_mw)),
        )?;
        Ok(mix)
    }

    /// Write the default distance matrix for the active types.
    pub fn drop_default_gendists(&self, path: &Path) -> MatchResult<()> {
        drop_default_gendists(path, &self.gentypes)
    }

    /// Scale the desired mix and check feasibility. Nothing is stored unless
    /// every step succeeds.
    pub fn preprocess(&mut self) -> MatchResult<()> {
        let mut mix = self.original_desired_mix.clone();
        mix.drop_column(CAPACITY_FRACTION);
        mix.drop_column(GENERATION_FRACTION);
        mix.retain_rows(|g| self.gentypes.iter().any(|t| t == g))?;

        let system_load_twh = self.nodes.total_annual_load_gwh() / 1000.0;
        let genmix_generation_twh =
            annual_useable_generation(&self.original_desired_mix, &self.gentypes)?;
        if !(genmix_generation_twh.is_finite() && genmix_generation_twh > 0.0) {
            return Err(MatchError::NoUseableGeneration {
                gentypes: self.gentypes.clone(),
            });
        }
        let scale_factor = system_load_twh / genmix_generation_twh;
        info!(
            system_load_twh,
            genmix_generation_twh,
            scale_factor,
            "scaling generation mix to system load"
        );
        mix.scale(scale_factor)?;

        let desired_gw = mix
            .column(CAPACITY_GW)
            .ok_or_else(|| MatchError::MissingColumn(CAPACITY_GW.to_string()))?;
        let desired = TypeTable::pivot_sum(
            DESIRED_CAPACITY,
            desired_gw.into_iter().map(|(g, gw)| (g, gw * 1000.0)),
        )?;
        let mut summary = self.current_mix()?.outer_merge(&desired)?;
        summary.fill_missing(0.0)?;
        info!("request summary:\n{summary}");

        check_feasibility(&summary, &self.nodes).map_err(MatchError::InfeasibleRequest)?;

        self.desired_mix = Some(mix);
        self.scaling = Some(Scaling {
            system_load_twh,
            genmix_generation_twh,
            scale_factor,
        });
        self.summary = Some(summary);
        self.state = RequestState::Preprocessed;
        Ok(())
    }

    /// Assemble the optimizer's sets and parameters.
    pub fn build_problem(
        &self,
        gendists: Option<&[TypeDistance]>,
        precision: i32,
    ) -> MatchResult<MatchProblem> {
        let summary = self.summary.as_ref().ok_or(MatchError::InvalidState {
            operation: "build the problem of",
            state: self.state,
        })?;
        let (indep_gentypes, dep_gentypes) = partition_gentypes(&self.gentypes);

        let desired_capacity = summary
            .column(DESIRED_CAPACITY)
            .unwrap_or_default()
            .into_iter()
            .map(|(g, mw)| TypeValue {
                g,
                value: round_to(mw, precision),
            })
            .collect();

        // multiple units of one type at a node are summed
        let mut by_node_type: BTreeMap<(&str, &str), f64> = BTreeMap::new();
        let mut by_node_indep: BTreeMap<&str, f64> = BTreeMap::new();
        for generator in &self.generators {
            *by_node_type
                .entry((generator.node_id.as_str(), generator.generator_type.as_str()))
                .or_insert(0.0) += generator.capacity_mw;
            if is_resource_independent(&generator.generator_type) {
                *by_node_indep
                    .entry(generator.node_id.as_str())
                    .or_insert(0.0) += generator.capacity_mw;
            }
        }
        let current_capacity = by_node_type
            .into_iter()
            .map(|((n, g), value)| NodeTypeValue {
                n: n.to_string(),
                g: g.to_string(),
                value,
            })
            .collect();
        let current_indep_capacity = by_node_indep
            .into_iter()
            .map(|(n, value)| NodeValue {
                n: n.to_string(),
                value,
            })
            .collect();

        let mut maximum_capacity = Vec::new();
        for gentype in dep_gentypes.iter().filter(|g| self.nodes.has_column(g)) {
            for node in self.nodes.nodes() {
                maximum_capacity.push(NodeTypeValue {
                    n: node.node_id.clone(),
                    g: gentype.clone(),
                    value: node.max_capacity.get(gentype).copied().unwrap_or(0.0),
                });
            }
        }

        let gendists = match gendists {
            Some(dists) => filter_gendists(dists, &self.gentypes),
            None => default_gendists(&self.gentypes),
        };

        let problem = MatchProblem {
            nodes: self.nodes.node_ids().map(str::to_string).collect(),
            gentypes: self.gentypes.clone(),
            indep_gentypes,
            dep_gentypes,
            desired_capacity,
            current_capacity,
            gendists,
            current_indep_capacity,
            maximum_capacity,
        };
        debug!(
            nodes = problem.num_nodes(),
            gentypes = problem.num_gentypes(),
            desired_mw = problem.desired_total(),
            "assembled matching problem"
        );
        Ok(problem)
    }

    /// Preprocess if needed, run the optimizer through `adapter` (blocking)
    /// and register its solution.
    pub fn fulfill(
        &mut self,
        adapter: &dyn SolverAdapter,
        options: &FulfillOptions,
    ) -> MatchResult<&TypeTable> {
        if self.state == RequestState::Constructed {
            self.preprocess()?;
        }
        let problem = self.build_problem(options.gendists.as_deref(), options.precision)?;
        let failed = || MatchError::OptimizationFailed {
            workdir: options.workdir.clone(),
        };
        let solution = match solve(adapter, &problem, &options.workdir) {
            Ok(solution) => solution.ok_or_else(failed)?,
            Err(err @ SolverError::ProcessFailed { .. }) => {
                warn!(error = %err, "optimizer run failed");
                return Err(failed());
            }
            Err(err) => return Err(err.into()),
        };
        self.register_results(solution)
    }

    /// Store an optimizer solution and compile the result summary.
    pub fn register_results(&mut self, solution: MatchSolution) -> MatchResult<&TypeTable> {
        let summary = self.summary.as_ref().ok_or(MatchError::InvalidState {
            operation: "register results for",
            state: self.state,
        })?;
        let result_summary = compile_result_summary(summary, &solution)?;
        info!(distance = solution.distance, "result summary:\n{result_summary}");
        self.solution = Some(solution);
        self.state = RequestState::Fulfilled;
        Ok(self.result_summary.insert(result_summary))
    }
}

/// Useable generation (TWh) of `gentypes` in an unfiltered mix, curtailment
/// included.
pub fn annual_useable_generation<S: AsRef<str>>(
    mix: &TypeTable,
    gentypes: &[S],
) -> MatchResult<f64> {
    let mut useable = mix.clone();
    useable.retain_rows(|g| g == CURTAILMENT || gentypes.iter().any(|t| t.as_ref() == g))?;
    useable
        .column_sum(GENERATION_TWH)
        .ok_or_else(|| MatchError::MissingColumn(GENERATION_TWH.to_string()))
}

/// Merge the optimizer's moves, summed per type, into the request summary.
/// Missing cells become 0 and a `TOTAL` row is appended.
pub fn compile_result_summary(
    summary: &TypeTable,
    solution: &MatchSolution,
) -> MatchResult<TypeTable> {
    fn by_type(column: &str, gens: &[Generator]) -> MatchResult<TypeTable> {
        let table = TypeTable::pivot_sum(
            column,
            gens.iter().map(|g| (g.generator_type.as_str(), g.capacity_mw)),
        )?;
        Ok(table)
    }
    let swaps = &solution.capacity_swapped;
    let pivots = [
        by_type(KEPT, &solution.capacity_kept)?,
        TypeTable::pivot_sum(
            SWAPPED_OUT,
            swaps.iter().map(|s| (s.from_type.as_str(), s.capacity_mw)),
        )?,
        TypeTable::pivot_sum(
            SWAPPED_IN,
            swaps.iter().map(|s| (s.to_type.as_str(), s.capacity_mw)),
        )?,
        by_type(ADDED, &solution.capacity_added)?,
        by_type(REMOVED, &solution.capacity_removed)?,
        by_type(FINAL, &solution.capacity)?,
    ];
    let mut result = summary.clone();
    for pivot in &pivots {
        result = result.outer_merge(pivot)?;
    }
    result.fill_missing(0.0)?;
    result.push_total()?;
    Ok(result)
}
