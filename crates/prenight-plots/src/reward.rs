use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use prenight_core::PlotName;
use prenight_provider::time::mjd_to_datetime;
use prenight_provider::{BasisFunctionReward, ProviderError, Scheduler};

use crate::builder::{NightContext, PlotBuilder, PoolKind};
use crate::error::{PlotError, Result};
use crate::figure::{Figure, PanelModel};
use crate::lines::{LinePlot, Series};
use crate::style::{categorical, Dash};

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;

/// Reward summary of one survey at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardRow {
    pub mjd: f64,
    pub time: DateTime<Utc>,
    pub tier: String,
    pub survey_name: String,
    /// Accumulated reward of the survey's last basis function.
    pub reward: f64,
    pub infeasible: bool,
    /// Comma-joined names of the infeasible basis functions.
    pub infeasible_bfs: String,
}

/// Collapse a per-basis-function decomposition into one row per
/// `(tier, survey_name)`, ordered by tier then survey name.
pub fn summarize_rewards(
    scheduler: &Scheduler,
    rows: &[BasisFunctionReward],
    mjd: f64,
    time: DateTime<Utc>,
) -> Vec<RewardRow> {
    let mut groups: BTreeMap<(String, String), Vec<&BasisFunctionReward>> = BTreeMap::new();
    for row in rows {
        let survey_name = scheduler
            .survey(row.list_index, row.survey_index)
            .map(|s| s.survey_name.clone())
            .unwrap_or_default();
        groups
            .entry((format!("tier {}", row.list_index), survey_name))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|((tier, survey_name), bfs)| {
            let infeasible: Vec<&str> = bfs
                .iter()
                .filter(|bf| !bf.feasible)
                .map(|bf| bf.basis_function.as_str())
                .collect();
            RewardRow {
                mjd,
                time,
                tier,
                survey_name,
                reward: bfs.last().map_or(f64::NAN, |bf| bf.accum_reward),
                infeasible: !infeasible.is_empty(),
                infeasible_bfs: infeasible.join(", "),
            }
        })
        .collect()
}

/// Survey rewards sampled across the night, `sun_n12_setting` to
/// `sun_n12_rising` inclusive.
#[instrument(skip(context), fields(night = %context.night))]
pub fn night_reward_table(context: &NightContext, cadence_minutes: u32) -> Result<Vec<RewardRow>> {
    let mut state = context.fork()?;
    let (start, end) = (state.start.sun_n12_setting, state.start.sun_n12_rising);
    let step = f64::from(cadence_minutes.max(1)) / 1440.0;
    let start_time = mjd_to_datetime(start).ok_or(ProviderError::NoEphemeris { mjd: start })?;

    let mut table = Vec::new();
    let mut i = 0u32;
    loop {
        let offset = chrono::Duration::minutes(i64::from(i) * i64::from(cadence_minutes.max(1)));
        let mjd = start + f64::from(i) * step;
        if mjd > end + 1e-9 {
            break;
        }
        let conditions = state.conditions_at(mjd)?;
        let rows = state.scheduler.make_reward_df(&conditions);
        table.extend(summarize_rewards(&state.scheduler, &rows, mjd, start_time + offset));
        i += 1;
    }
    debug!(samples = i, rows = table.len(), "reward table computed");
    Ok(table)
}

/// Group rows into one curve per survey name, coloured in name order and
/// dashed by tier.
pub fn reward_series(table: &[RewardRow]) -> Vec<Series> {
    let mut by_survey: BTreeMap<&str, Vec<&RewardRow>> = BTreeMap::new();
    for row in table {
        by_survey.entry(row.survey_name.as_str()).or_default().push(row);
    }
    by_survey
        .into_iter()
        .enumerate()
        .map(|(i, (name, mut rows))| {
            rows.sort_by(|a, b| a.mjd.total_cmp(&b.mjd));
            let tier = rows
                .first()
                .and_then(|r| r.tier.strip_prefix("tier "))
                .and_then(|t| t.parse().ok())
                .unwrap_or(0);
            Series {
                name: name.to_string(),
                colour: categorical(i),
                dash: Dash::for_tier(tier),
                points: rows.iter().map(|r| (r.mjd, r.reward)).collect(),
            }
        })
        .collect()
}

/// Reward curves of every survey through the night.
pub struct NightRewardBuilder {
    context: NightContext,
    cadence_minutes: u32,
}

impl NightRewardBuilder {
    pub fn new(context: NightContext, cadence_minutes: u32) -> Self {
        Self {
            context,
            cadence_minutes,
        }
    }
}

impl PlotBuilder for NightRewardBuilder {
    fn pool(&self) -> PoolKind {
        PoolKind::Exclusive
    }

    fn build(&self, name: &PlotName) -> Result<Figure> {
        let table = night_reward_table(&self.context, self.cadence_minutes)?;
        if table.is_empty() {
            return Err(PlotError::Empty("no survey rewards during the night".to_string()));
        }
        let plot = LinePlot {
            title: format!("Survey rewards, night of {}", self.context.night),
            y_label: "reward".to_string(),
            width: WIDTH,
            height: HEIGHT,
            series: reward_series(&table),
        };
        Figure::new(name.clone(), vec![PanelModel::Lines(plot)], None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use prenight_provider::fixtures;

    fn context() -> NightContext {
        NightContext::new(Arc::new(fixtures::snapshot()), fixtures::night())
    }

    #[test]
    fn table_covers_the_night_inclusively() {
        let table = night_reward_table(&context(), 10).unwrap();
        let first = table.first().unwrap();
        let last = table.last().unwrap();
        assert_eq!(first.mjd, fixtures::SUN_N12_SETTING);
        assert!(last.mjd <= fixtures::SUN_N12_RISING + 1e-9);
        assert!(fixtures::SUN_N12_RISING - last.mjd < 10.0 / 1440.0);

        // one row per survey per sample: 0.4 days at 10 minutes is 58 samples
        let samples: BTreeSet<_> = table.iter().map(|r| r.mjd.to_bits()).collect();
        assert_eq!(samples.len(), 58);
        assert_eq!(table.len(), 58 * 3);
        assert_eq!(first.time.format("%H:%M").to_string(), "23:31");
    }

    #[test]
    fn table_is_deterministic() {
        let a = night_reward_table(&context(), 30).unwrap();
        let b = night_reward_table(&context(), 30).unwrap();
        assert_eq!(a.len(), b.len());
        let surveys = |t: &[RewardRow]| {
            t.iter()
                .map(|r| r.survey_name.clone())
                .collect::<BTreeSet<_>>()
        };
        assert_eq!(surveys(&a), surveys(&b));
        assert_eq!(
            surveys(&a),
            BTreeSet::from(["DD:ELAISS1".to_string(), "blob_gr".to_string(), "greedy".to_string()])
        );
    }

    #[test]
    fn infeasible_surveys_name_their_basis_functions() {
        let table = night_reward_table(&context(), 10).unwrap();
        let ddf_start = table
            .iter()
            .find(|r| r.survey_name == "DD:ELAISS1")
            .unwrap();
        assert_eq!(ddf_start.tier, "tier 0");
        assert!(ddf_start.infeasible);
        assert_eq!(ddf_start.infeasible_bfs, "Time_in_twilight");
        assert!(ddf_start.reward.is_nan());

        // between 60221.1 and 60221.3 the field is observable
        let ddf_mid = table
            .iter()
            .find(|r| r.survey_name == "DD:ELAISS1" && r.mjd > 60_221.15)
            .unwrap();
        assert!(!ddf_mid.infeasible);
        assert_eq!(ddf_mid.reward, 5.0);

        let blob = table.iter().find(|r| r.survey_name == "blob_gr").unwrap();
        assert_eq!(blob.tier, "tier 1");
        assert!(!blob.infeasible);
        assert!((blob.reward - (0.3 * 1.0 + 3.0 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn series_follow_survey_names_and_tiers() {
        let table = night_reward_table(&context(), 60).unwrap();
        let series = reward_series(&table);
        let names: Vec<_> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["DD:ELAISS1", "blob_gr", "greedy"]);
        assert!(series.iter().all(|s| s.dash == Dash::Solid));
        assert_ne!(series[0].colour, series[1].colour);
        assert!(series[0].points.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn builds_on_the_exclusive_pool() {
        let builder = NightRewardBuilder::new(context(), 30);
        assert_eq!(builder.pool(), PoolKind::Exclusive);
        let figure = builder.build(&PlotName::night_reward()).unwrap();
        assert_eq!(figure.panels().len(), 1);
        assert!(figure.panels()[0].svg.contains("blob_gr"));
    }
}
