//! KPI behaviour over data that went through the whole pipeline.

use std::sync::Arc;

use turbine_relay::config::AggregatorConfig;
use turbine_relay::kpi::{Kpi, KpiReport};
use turbine_relay::units::{Aggregator, CycleSummary, MemorySink};

mod common;

use common::{ingest_payload, Pipeline};

fn aggregator_config(source_id: Option<&str>) -> AggregatorConfig {
    AggregatorConfig {
        source_id: source_id.map(str::to_string),
        ..AggregatorConfig::default()
    }
}

fn find(reports: &[KpiReport], kpi: Kpi) -> KpiReport {
    reports
        .iter()
        .find(|r| r.kpi() == kpi)
        .cloned()
        .unwrap()
}

#[tokio::test]
async fn test_negative_power_zeroes_stored_export() {
    let pipeline = Pipeline::start();
    pipeline
        .send(ingest_payload(
            "T101",
            1,
            Some("2026-10-15 10:00:00.000"),
            Some(3.0),
            Some(-15.0),
            Some(40.0),
        ))
        .await;
    let store = pipeline.drain().await;

    let reading = &store.readings()[0];
    assert_eq!(reading.power, Some(-15.0));
    assert_eq!(reading.energy_export, 0.0);
}

#[tokio::test]
async fn test_kpis_over_relayed_readings() {
    let pipeline = Pipeline::start();
    let day1 = Some("2026-10-14 09:00:00.000");
    let day2 = Some("2026-10-15 09:00:00.000");

    // T101: mean wind over present values only
    pipeline.send(ingest_payload("T101", 1, day1, Some(4.0), Some(20.0), Some(60.0))).await;
    pipeline.send(ingest_payload("T101", 2, day2, Some(6.0), Some(30.0), Some(40.0))).await;
    pipeline.send(ingest_payload("T101", 3, day2, None, None, None)).await;
    // T102: efficiency excludes zero wind and absent power
    pipeline.send(ingest_payload("T102", 1, day2, Some(5.0), Some(10.0), Some(20.0))).await;
    pipeline.send(ingest_payload("T102", 2, day2, Some(4.0), Some(20.0), Some(30.0))).await;
    pipeline.send(ingest_payload("T102", 3, day2, Some(0.0), Some(30.0), Some(0.0))).await;
    pipeline.send(ingest_payload("T102", 4, day2, Some(3.0), None, Some(0.0))).await;
    let store = pipeline.drain().await;

    let sink = Arc::new(MemorySink::new());
    let aggregator = Aggregator::new(store.clone(), sink.clone(), &aggregator_config(None));
    assert_eq!(
        aggregator.run_cycle().await,
        CycleSummary { succeeded: 4, failed: 0 }
    );
    let reports = sink.reports();

    let KpiReport::MeanWindSpeed(wind) = find(&reports, Kpi::MeanWindSpeed) else {
        panic!("wrong report kind");
    };
    assert_eq!(wind[0].source_id, "T101");
    assert_eq!(wind[0].avg_wind_speed, 5.0);
    assert_eq!(wind[0].count, 2);

    let KpiReport::ProductionEfficiency(efficiency) = find(&reports, Kpi::ProductionEfficiency)
    else {
        panic!("wrong report kind");
    };
    let t102 = efficiency.iter().find(|e| e.source_id == "T102").unwrap();
    assert_eq!(t102.count, 2);
    assert_eq!(t102.avg_efficiency, 3.5);

    let KpiReport::DailyEnergy(daily) = find(&reports, Kpi::DailyEnergy) else {
        panic!("wrong report kind");
    };
    let order: Vec<_> = daily
        .iter()
        .map(|d| (d.date.to_string(), d.source_id.clone(), d.total_energy))
        .collect();
    assert_eq!(
        order,
        vec![
            ("2026-10-15".to_string(), "T101".to_string(), 40.0),
            ("2026-10-15".to_string(), "T102".to_string(), 50.0),
            ("2026-10-14".to_string(), "T101".to_string(), 60.0),
        ]
    );

    // grand total is the sum of per-source totals
    let KpiReport::TotalEnergy(total) = find(&reports, Kpi::TotalEnergy) else {
        panic!("wrong report kind");
    };
    assert_eq!(total.per_source[0].total_energy, 100.0);
    assert_eq!(total.per_source[1].total_energy, 50.0);
    assert_eq!(total.grand_total, 150.0);
}

#[tokio::test]
async fn test_kpis_are_idempotent_and_read_only() {
    let pipeline = Pipeline::start();
    for row in 0..4 {
        pipeline
            .send(ingest_payload("T103", row, Some("2026-10-15 12:00:00.000"), Some(7.0), Some(70.0), Some(3.0)))
            .await;
    }
    let store = pipeline.drain().await;
    let before = store.readings();

    let sink = Arc::new(MemorySink::new());
    let aggregator = Aggregator::new(store.clone(), sink.clone(), &aggregator_config(None));
    aggregator.run_cycle().await;
    aggregator.run_cycle().await;

    let reports = sink.reports();
    assert_eq!(reports.len(), 8);
    assert_eq!(reports[..4], reports[4..]);
    assert_eq!(store.readings(), before);
}

#[tokio::test]
async fn test_source_filter_applies_to_every_kpi() {
    let pipeline = Pipeline::start();
    pipeline.send(ingest_payload("T101", 1, Some("2026-10-15 08:00:00.000"), Some(5.0), Some(50.0), Some(10.0))).await;
    pipeline.send(ingest_payload("T102", 1, Some("2026-10-15 08:00:00.000"), Some(5.0), Some(50.0), Some(20.0))).await;
    let store = pipeline.drain().await;

    let sink = Arc::new(MemorySink::new());
    let aggregator = Aggregator::new(store, sink.clone(), &aggregator_config(Some("T102")));
    aggregator.run_cycle().await;

    for report in sink.reports() {
        assert_eq!(report.len(), 1, "{:?}", report.kpi());
        if let KpiReport::TotalEnergy(total) = report {
            assert_eq!(total.per_source[0].source_id, "T102");
            assert_eq!(total.grand_total, 20.0);
        }
    }
}

#[tokio::test]
async fn test_failed_kpi_does_not_block_others() {
    let pipeline = Pipeline::start();
    pipeline.send(ingest_payload("T101", 1, None, Some(5.0), Some(50.0), Some(10.0))).await;
    let store = pipeline.drain().await;
    store.set_kpi_failure(Kpi::MeanWindSpeed, true);
    store.set_kpi_failure(Kpi::DailyEnergy, true);

    let sink = Arc::new(MemorySink::new());
    let aggregator = Aggregator::new(store, sink.clone(), &aggregator_config(None));
    assert_eq!(
        aggregator.run_cycle().await,
        CycleSummary { succeeded: 2, failed: 2 }
    );

    let kpis: Vec<_> = sink.reports().iter().map(|r| r.kpi()).collect();
    assert_eq!(kpis, vec![Kpi::ProductionEfficiency, Kpi::TotalEnergy]);
}
