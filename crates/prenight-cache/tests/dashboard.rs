//! The three dashboard builders against the synthetic snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use prenight_cache::{FigureState, Orchestrator, PlotRegistry};
use prenight_core::PlotName;
use prenight_plots::style::BandStyles;
use prenight_plots::{FootprintBuilder, NightContext, NightRewardBuilder, VisitBuilder};
use prenight_provider::fixtures;

fn registry(visits_path: &str) -> PlotRegistry {
    let context = NightContext::new(Arc::new(fixtures::snapshot()), fixtures::night());
    let colours = BTreeMap::from([("r".to_string(), "#ff4000".to_string())]);
    let bands = BandStyles::from_hex(&colours).unwrap();

    let mut registry = PlotRegistry::new();
    registry
        .register(PlotName::night_reward(), Arc::new(NightRewardBuilder::new(context.clone(), 30)))
        .unwrap();
    registry
        .register(PlotName::footprint(), Arc::new(FootprintBuilder::new(context.clone())))
        .unwrap();
    registry
        .register(PlotName::visit(), Arc::new(VisitBuilder::new(context, visits_path, None, bands)))
        .unwrap();
    registry
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_dashboard_plot_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("baseline.db");
    fixtures::write_visit_db(&path, &fixtures::visits()).unwrap();

    let orch = Orchestrator::new(registry(&path.to_string_lossy()), 4);
    let results = orch.schedule_regeneration().wait().await;
    assert_eq!(results.len(), 3);

    for name in PlotName::dashboard() {
        let figure = orch.lookup(&name).unwrap_or_else(|| panic!("{name} missing"));
        assert_eq!(figure.name(), &name);
        assert!(!figure.panels().is_empty());
    }
    orch.shutdown().await;
}

#[tokio::test]
async fn missing_visit_database_fails_only_the_visit_plot() {
    let orch = Orchestrator::new(registry("/nonexistent/baseline.db"), 2);
    orch.schedule_regeneration().wait().await;

    assert!(orch.lookup(&PlotName::night_reward()).is_some());
    assert!(orch.lookup(&PlotName::footprint()).is_some());
    assert!(matches!(
        orch.state(&PlotName::visit()),
        Some(FigureState::Failed(_))
    ));
}
