//! Solution returned by the optimizer.

use mixmatch_core::{Generator, SwappedGenerator};
use serde::{Deserialize, Serialize};

/// Final fleet and the moves that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSolution {
    /// Final capacity per node and type.
    pub capacity: Vec<Generator>,
    /// New capacity built.
    pub capacity_added: Vec<Generator>,
    /// Existing capacity left in place.
    pub capacity_kept: Vec<Generator>,
    /// Existing capacity converted from one type to another.
    pub capacity_swapped: Vec<SwappedGenerator>,
    /// Existing capacity retired.
    pub capacity_removed: Vec<Generator>,
    /// Objective value.
    pub distance: f64,
}

impl MatchSolution {
    /// Drop entries with no positive capacity.
    pub fn drop_zero_capacity(&mut self) {
        for table in [
            &mut self.capacity,
            &mut self.capacity_added,
            &mut self.capacity_kept,
            &mut self.capacity_removed,
        ] {
            table.retain(|g| g.capacity_mw > 0.0);
        }
        self.capacity_swapped.retain(|s| s.capacity_mw > 0.0);
    }

    /// Total final capacity (MW).
    pub fn final_total(&self) -> f64 {
        self.capacity.iter().map(|g| g.capacity_mw).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_zero_rows_everywhere() {
        let mut solution = MatchSolution {
            capacity: vec![Generator::new("1", "Coal", 10.0), Generator::new("2", "Coal", 0.0)],
            capacity_added: vec![Generator::new("1", "Wind", 0.0)],
            capacity_swapped: vec![SwappedGenerator {
                node_id: "1".into(),
                from_type: "Coal".into(),
                to_type: "NG-CC".into(),
                capacity_mw: 0.0,
            }],
            distance: 1.5,
            ..Default::default()
        };
        solution.drop_zero_capacity();
        assert_eq!(solution.capacity.len(), 1);
        assert!(solution.capacity_added.is_empty());
        assert!(solution.capacity_swapped.is_empty());
        assert_eq!(solution.final_total(), 10.0);
    }
}
