//! Feasibility of a request summary against the node inventory.

use crate::error::Infeasibility;
use mixmatch_core::{is_resource_independent, NodeTable, TypeTable, RESOURCE_INDEPENDENT};
use tracing::debug;

pub const CURRENT_CAPACITY: &str = "Current Capacity (MW)";
pub const DESIRED_CAPACITY: &str = "Desired Capacity (MW)";

/// Check a request summary (current and desired MW per type).
///
/// Resource-independent capacity can only be moved, so the aggregate desired
/// amount may not exceed the aggregate current amount. A resource-dependent
/// type may grow only when the node inventory bounds it and the sum of the
/// per-node ceilings covers the desired amount.
pub fn check_feasibility(summary: &TypeTable, nodes: &NodeTable) -> Result<(), Infeasibility> {
    let cell = |gentype: &str, column: &str| summary.get(gentype, column).unwrap_or(0.0);
    let gentypes = summary.row_labels();

    let (mut desired_indep, mut current_indep) = (0.0, 0.0);
    for gentype in gentypes.iter().map(String::as_str) {
        if !is_resource_independent(gentype) {
            continue;
        }
        desired_indep += cell(gentype, DESIRED_CAPACITY);
        current_indep += cell(gentype, CURRENT_CAPACITY);
    }
    debug!(
        desired_mw = desired_indep,
        current_mw = current_indep,
        "resource-independent totals"
    );
    if desired_indep > current_indep {
        return Err(Infeasibility::ResourceIndependent {
            desired_mw: desired_indep,
            current_mw: current_indep,
            gentypes: RESOURCE_INDEPENDENT.map(String::from).to_vec(),
        });
    }

    for gentype in gentypes.iter().map(String::as_str) {
        if is_resource_independent(gentype) {
            continue;
        }
        let desired = cell(gentype, DESIRED_CAPACITY);
        let current = cell(gentype, CURRENT_CAPACITY);
        if desired <= current {
            continue;
        }
        let Some(maximum) = nodes.column_sum(gentype) else {
            return Err(Infeasibility::NoMaximumCapacity {
                gentype: gentype.to_string(),
                desired_mw: desired,
                current_mw: current,
            });
        };
        debug!(gentype, desired_mw = desired, maximum_mw = maximum, "checked node maximums");
        if desired > maximum {
            return Err(Infeasibility::ExceedsMaximum {
                gentype: gentype.to_string(),
                desired_mw: desired,
                maximum_mw: maximum,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(rows: &[(&str, f64, f64)]) -> TypeTable {
        let mut table = TypeTable::new([CURRENT_CAPACITY, DESIRED_CAPACITY]).unwrap();
        for (gentype, current, desired) in rows {
            table.set(gentype, CURRENT_CAPACITY, *current).unwrap();
            table.set(gentype, DESIRED_CAPACITY, *desired).unwrap();
        }
        table
    }

    fn nodes(csv: &str) -> NodeTable {
        NodeTable::from_reader(csv.as_bytes(), None, "nodes").unwrap()
    }

    const WIND_NODES: &str = "\
node_id,latitude,longitude,peak load (MW),annual load (GWh),Wind
1,0,0,10,50,300
2,0,0,10,50,200
";

    #[test]
    fn independent_total_may_equal_current() {
        let s = summary(&[("Coal", 600.0, 400.0), ("NG-CC", 0.0, 200.0)]);
        assert_eq!(check_feasibility(&s, &nodes(WIND_NODES)), Ok(()));
    }

    #[test]
    fn independent_total_above_current_fails() {
        let s = summary(&[("Coal", 600.0, 401.0), ("NG-CC", 0.0, 200.0)]);
        let err = check_feasibility(&s, &nodes(WIND_NODES)).unwrap_err();
        assert!(matches!(
            err,
            Infeasibility::ResourceIndependent { desired_mw, current_mw, .. }
                if desired_mw == 601.0 && current_mw == 600.0
        ));
    }

    #[test]
    fn dependent_growth_needs_a_ceiling_column() {
        let s = summary(&[("Utility PV", 0.0, 10.0)]);
        let err = check_feasibility(&s, &nodes(WIND_NODES)).unwrap_err();
        assert!(matches!(err, Infeasibility::NoMaximumCapacity { .. }));
    }

    #[test]
    fn dependent_growth_within_ceiling_passes() {
        let s = summary(&[("Wind", 100.0, 500.0)]);
        assert_eq!(check_feasibility(&s, &nodes(WIND_NODES)), Ok(()));
    }

    #[test]
    fn dependent_growth_above_ceiling_fails() {
        let s = summary(&[("Wind", 100.0, 501.0)]);
        let err = check_feasibility(&s, &nodes(WIND_NODES)).unwrap_err();
        assert!(matches!(
            err,
            Infeasibility::ExceedsMaximum { maximum_mw, .. } if maximum_mw == 500.0
        ));
    }

    #[test]
    fn dependent_shrink_needs_no_ceiling() {
        let s = summary(&[("Utility PV", 50.0, 10.0)]);
        assert_eq!(check_feasibility(&s, &nodes(WIND_NODES)), Ok(()));
    }
}
