//! Generator-type policy.
//!
//! Resource-independent (dispatchable) types can be sited at any node, so only
//! their aggregate capacity is constrained. Every other type is
//! resource-dependent and bounded per node by the node inventory.

use serde::{Deserialize, Serialize};

/// Dispatchable generator types that carry no siting constraint.
pub const RESOURCE_INDEPENDENT: [&str; 7] = [
    "Biopower",
    "Coal",
    "NG-CC",
    "NG-CT",
    "Nuclear",
    "Oil-Gas-Steam",
    "Storage",
];

/// Pseudo generator type holding curtailed energy in a generation mix.
pub const CURTAILMENT: &str = "Curtailment";

/// Siting class of a generator type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    /// Can be placed at any node.
    Independent,
    /// Bounded per node by resource availability.
    Dependent,
}

impl ResourceClass {
    pub fn of(gentype: &str) -> Self {
        if is_resource_independent(gentype) {
            ResourceClass::Independent
        } else {
            ResourceClass::Dependent
        }
    }
}

pub fn is_resource_independent(gentype: &str) -> bool {
    RESOURCE_INDEPENDENT.contains(&gentype)
}

/// Split `gentypes` into (resource-independent, resource-dependent), keeping order.
pub fn partition_gentypes<S: AsRef<str>>(gentypes: &[S]) -> (Vec<String>, Vec<String>) {
    let mut indep = Vec::new();
    let mut dep = Vec::new();
    for g in gentypes {
        let g = g.as_ref();
        match ResourceClass::of(g) {
            ResourceClass::Independent => indep.push(g.to_string()),
            ResourceClass::Dependent => dep.push(g.to_string()),
        }
    }
    (indep, dep)
}
