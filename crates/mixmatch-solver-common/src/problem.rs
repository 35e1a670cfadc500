//! Problem representation handed to the optimizer.
//!
//! The optimizer reassigns capacity among generator types and nodes so the
//! fleet matches a desired mix while moving as little capacity as possible,
//! weighted by type-to-type distances.

use serde::{Deserialize, Serialize};

/// Parameter indexed by generator type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeValue {
    pub g: String,
    pub value: f64,
}

/// Parameter indexed by node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeValue {
    pub n: String,
    pub value: f64,
}

/// Parameter indexed by (node, generator type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeValue {
    pub n: String,
    pub g: String,
    pub value: f64,
}

/// Cost of converting capacity of type `g` into type `gg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDistance {
    pub g: String,
    pub gg: String,
    pub value: f64,
}

/// Sets and parameters of one matching problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchProblem {
    // === Sets ===
    /// Node ids (`n`).
    pub nodes: Vec<String>,
    /// Active generator types (`g`).
    pub gentypes: Vec<String>,
    /// Resource-independent subset of `g` (`g_indep`).
    pub indep_gentypes: Vec<String>,
    /// Resource-dependent subset of `g` (`g_dep`).
    pub dep_gentypes: Vec<String>,

    // === Parameters ===
    /// Desired capacity (MW) per type, rounded to the requested precision.
    pub desired_capacity: Vec<TypeValue>,
    /// Existing capacity (MW) per node and type.
    pub current_capacity: Vec<NodeTypeValue>,
    /// Conversion distances between active types.
    pub gendists: Vec<TypeDistance>,
    /// Existing resource-independent capacity (MW) per node.
    pub current_indep_capacity: Vec<NodeValue>,
    /// Per-node ceiling (MW) for resource-dependent types.
    pub maximum_capacity: Vec<NodeTypeValue>,
}

impl MatchProblem {
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_gentypes(&self) -> usize {
        self.gentypes.len()
    }

    /// Total desired capacity (MW).
    pub fn desired_total(&self) -> f64 {
        self.desired_capacity.iter().map(|d| d.value).sum()
    }
}

/// Summary written next to the exchange files so a model can sanity-check
/// what it was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemManifest {
    pub protocol_version: i32,
    pub num_nodes: usize,
    pub num_gentypes: usize,
    pub num_indep_gentypes: usize,
    pub num_dep_gentypes: usize,
    pub desired_total_mw: f64,
}

impl From<&MatchProblem> for ProblemManifest {
    fn from(problem: &MatchProblem) -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            num_nodes: problem.num_nodes(),
            num_gentypes: problem.num_gentypes(),
            num_indep_gentypes: problem.indep_gentypes.len(),
            num_dep_gentypes: problem.dep_gentypes.len(),
            desired_total_mw: problem.desired_total(),
        }
    }
}
