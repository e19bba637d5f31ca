use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::observatory::Conditions;

/// Survey lists exported from the scheduler, tier by tier.
///
/// Rewards are tabulated per basis function by the exporting simulation; this
/// type only evaluates the tables, it does not compute rewards itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler {
    pub survey_lists: Vec<Vec<Survey>>,
    #[serde(skip)]
    conditions: Option<Conditions>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyKind {
    Blob,
    Greedy,
    DeepDrilling,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub survey_name: String,
    pub kind: SurveyKind,
    #[serde(default)]
    pub basis_functions: Vec<BasisFunction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisFunction {
    pub name: String,
    #[serde(default = "unit_weight")]
    pub weight: f64,
    /// Step-wise reward table, sorted by MJD.
    #[serde(default)]
    pub samples: Vec<RewardSample>,
    #[serde(default)]
    pub footprint: Option<Footprint>,
}

fn unit_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RewardSample {
    pub mjd: f64,
    pub value: f64,
    #[serde(default = "feasible_default")]
    pub feasible: bool,
}

fn feasible_default() -> bool {
    true
}

impl BasisFunction {
    /// Value and feasibility in force at `mjd`: the latest sample at or
    /// before it, or the first sample when `mjd` precedes the table.
    pub fn sample_at(&self, mjd: f64) -> (f64, bool) {
        let idx = self.samples.partition_point(|s| s.mjd <= mjd);
        match self.samples.get(idx.saturating_sub(1)) {
            Some(s) => (s.value, s.feasible),
            None => (0.0, true),
        }
    }

    pub fn is_footprint(&self) -> bool {
        self.name.starts_with("Footprint")
    }
}

/// Per-band footprint maps over a common set of sky cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Footprint {
    /// Cell centres, degrees.
    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
    /// Band name → value per cell.
    pub footprints: BTreeMap<String, Vec<f64>>,
}

impl Footprint {
    /// Sum over bands; cells summing to zero become NaN (not drawn).
    pub fn summed(&self) -> Result<SkyFootprint> {
        let n = self.ra.len();
        if self.dec.len() != n {
            return Err(ProviderError::InvalidFootprint(format!(
                "{} RA values but {} Dec values",
                n,
                self.dec.len()
            )));
        }
        let mut values = vec![0.0; n];
        for (band, map) in &self.footprints {
            if map.len() != n {
                return Err(ProviderError::InvalidFootprint(format!(
                    "band {band} has {} cells, expected {n}",
                    map.len()
                )));
            }
            for (total, v) in values.iter_mut().zip(map) {
                *total += v;
            }
        }
        for v in values.iter_mut().filter(|v| **v == 0.0) {
            *v = f64::NAN;
        }
        Ok(SkyFootprint {
            ra: self.ra.clone(),
            dec: self.dec.clone(),
            values,
        })
    }
}

/// Band-summed footprint ready for drawing.
#[derive(Debug, Clone)]
pub struct SkyFootprint {
    pub ra: Vec<f64>,
    pub dec: Vec<f64>,
    pub values: Vec<f64>,
}

impl SkyFootprint {
    /// Cell-by-cell equality where NaN equals NaN.
    pub fn same_as(&self, other: &SkyFootprint) -> bool {
        fn same(a: &[f64], b: &[f64]) -> bool {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
        }
        same(&self.ra, &other.ra)
            && same(&self.dec, &other.dec)
            && same(&self.values, &other.values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One row of the reward decomposition: a basis function of a survey.
#[derive(Debug, Clone)]
pub struct BasisFunctionReward {
    pub list_index: usize,
    pub survey_index: usize,
    pub basis_function: String,
    pub feasible: bool,
    /// Running weighted sum up to and including this basis function.
    /// NaN once any basis function of the survey is infeasible.
    pub accum_reward: f64,
}

impl Scheduler {
    pub fn new(survey_lists: Vec<Vec<Survey>>) -> Self {
        Self {
            survey_lists,
            conditions: None,
        }
    }

    pub fn update_conditions(&mut self, conditions: Conditions) {
        self.conditions = Some(conditions);
    }

    pub fn conditions(&self) -> Option<&Conditions> {
        self.conditions.as_ref()
    }

    pub fn survey(&self, list_index: usize, survey_index: usize) -> Option<&Survey> {
        self.survey_lists.get(list_index)?.get(survey_index)
    }

    /// Per-basis-function reward decomposition for every survey at the
    /// time of `conditions`, in tier/survey/basis-function order.
    pub fn make_reward_df(&self, conditions: &Conditions) -> Vec<BasisFunctionReward> {
        let mut rows = Vec::new();
        for (list_index, tier) in self.survey_lists.iter().enumerate() {
            for (survey_index, survey) in tier.iter().enumerate() {
                let mut accum = 0.0;
                for bf in &survey.basis_functions {
                    let (value, feasible) = bf.sample_at(conditions.mjd);
                    accum = if feasible { accum + bf.weight * value } else { f64::NAN };
                    rows.push(BasisFunctionReward {
                        list_index,
                        survey_index,
                        basis_function: bf.name.clone(),
                        feasible,
                        accum_reward: accum,
                    });
                }
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn bf(samples: &[(f64, f64, bool)]) -> BasisFunction {
        BasisFunction {
            name: "M5_diff".to_string(),
            weight: 2.0,
            samples: samples
                .iter()
                .map(|&(mjd, value, feasible)| RewardSample { mjd, value, feasible })
                .collect(),
            footprint: None,
        }
    }

    #[test]
    fn sample_at_is_stepwise() {
        let f = bf(&[(1.0, 10.0, true), (2.0, 20.0, false)]);
        assert_eq!(f.sample_at(0.5), (10.0, true));
        assert_eq!(f.sample_at(1.0), (10.0, true));
        assert_eq!(f.sample_at(1.9), (10.0, true));
        assert_eq!(f.sample_at(2.5), (20.0, false));
        assert_eq!(bf(&[]).sample_at(1.0), (0.0, true));
    }

    #[test]
    fn infeasible_basis_function_poisons_accumulated_reward() {
        let snapshot = fixtures::snapshot();
        let scheduler = snapshot.scheduler();
        let conditions = scheduler.conditions().unwrap().clone();
        let rows = scheduler.make_reward_df(&conditions);

        // every basis function of every survey appears once
        let expected: usize = scheduler
            .survey_lists
            .iter()
            .flatten()
            .map(|s| s.basis_functions.len())
            .sum();
        assert_eq!(rows.len(), expected);

        for row in rows.iter().filter(|r| !r.feasible) {
            assert!(row.accum_reward.is_nan());
        }
    }

    #[test]
    fn summed_footprint_masks_empty_cells() {
        let fp = Footprint {
            ra: vec![0.0, 10.0, 20.0],
            dec: vec![-10.0, -20.0, -30.0],
            footprints: BTreeMap::from([
                ("g".to_string(), vec![1.0, 0.0, 0.0]),
                ("r".to_string(), vec![1.0, 2.0, 0.0]),
            ]),
        };
        let summed = fp.summed().unwrap();
        assert_eq!(summed.values[0], 2.0);
        assert_eq!(summed.values[1], 2.0);
        assert!(summed.values[2].is_nan());
        assert!(summed.same_as(&fp.summed().unwrap()));
    }

    #[test]
    fn summed_footprint_rejects_length_mismatch() {
        let fp = Footprint {
            ra: vec![0.0, 10.0],
            dec: vec![-10.0, -20.0],
            footprints: BTreeMap::from([("g".to_string(), vec![1.0])]),
        };
        assert!(matches!(fp.summed(), Err(ProviderError::InvalidFootprint(_))));
    }
}
