// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Archive Integration Tests
//!
//! Integration tests for online archiving:
//!
//! - Ring buffer capacity and ordering
//! - Historizing bindings and the `HA Configuration` component
//! - Suspending and resuming historization
//! - Install, uninstall and dispose through the history server
//! - Concurrent writers
//!
//! ## Test Categories
//!
//! - `test_ring_buffer_*`: Archive tests
//! - `test_binding_*`: Variable binding tests
//! - `test_server_*`: Server registry tests
//! - `test_archive_concurrent_*`: Concurrency tests

use std::sync::Arc;

use hda_archive::binding::{MAX_ONLINE_VALUES, START_OF_ARCHIVE, START_OF_ONLINE_ARCHIVE, STEPPED};
use hda_archive::{
    ArchiveConfig, HistoricalArchive, HistoryServer, HistoryServerConfig, RingBufferArchive,
};
use hda_core::{
    ArchiveError, AttributeId, DataValue, StatusCode, Variant, HA_CONFIGURATION,
};

use hda_tests::common::init_test_logging;
use hda_tests::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn ha_property(harness: &HistoryHarness, name: &str) -> Variant {
    harness
        .variable
        .component(HA_CONFIGURATION)
        .expect("HA Configuration component missing")
        .read_property(name)
        .unwrap_or_else(|| panic!("Property {} missing", name))
}

// =============================================================================
// Ring Buffer Tests
// =============================================================================

#[test]
fn test_ring_buffer_keeps_newest_values() {
    let archive = RingBufferArchive::new(ArchiveConfig::for_testing());

    for value in SeriesFixtures::values(12, 10) {
        archive.push(value).expect("Push failed");
    }

    assert_eq!(archive.len(), 10);
    archive.assert_timestamps(&[20, 30, 40, 50, 60, 70, 80, 90, 100, 110]);
    assert_eq!(archive.stats().values_evicted, 2);
    assert_eq!(archive.oldest_timestamp(), Some(TimeFixtures::at(20)));
    assert_eq!(archive.newest_timestamp(), Some(TimeFixtures::at(110)));
}

#[test]
fn test_ring_buffer_rejects_out_of_order() {
    let archive = RingBufferArchive::new(ArchiveConfig::unbounded());
    archive.push(DataValue::good(1.0, TimeFixtures::at(60))).unwrap();

    let result = archive.push(DataValue::good(2.0, TimeFixtures::at(30)));

    assert!(matches!(result, Err(ArchiveError::OutOfOrder { .. })));
    archive.assert_timestamps(&[60]);
    assert_eq!(archive.stats().values_rejected, 1);
}

#[test]
fn test_ring_buffer_slice_is_inclusive() {
    let archive = RingBufferArchive::new(ArchiveConfig::unbounded());
    for value in SeriesFixtures::values(6, 60) {
        archive.push(value).unwrap();
    }

    let slice = archive.slice(Some(TimeFixtures::at(60)), Some(TimeFixtures::at(180)));
    assert_eq!(offsets(&slice), vec![60, 120, 180]);

    let reversed = archive.slice(Some(TimeFixtures::at(180)), Some(TimeFixtures::at(60)));
    assert_eq!(offsets(&reversed), vec![60, 120, 180]);
}

// =============================================================================
// Binding Tests
// =============================================================================

#[test]
fn test_binding_records_value_changes() {
    init_test_logging();
    let harness = HistoryHarness::with_series(5, 60);

    assert!(harness.historized.is_historizing());
    harness.historized.archive().assert_timestamps(&[0, 60, 120, 180, 240]);
    harness.historized.archive().assert_ordered();
    assert_eq!(harness.historized.stats().values_recorded, 5);
}

#[test]
fn test_binding_capacity_evicts_oldest() {
    let harness = HistoryHarness::with_capacity(3);
    SeriesFixtures::write(&harness.variable, 5, 60);

    harness.historized.archive().assert_timestamps(&[120, 180, 240]);
    assert_eq!(harness.historized.stats().values_evicted, 2);
    assert_eq!(harness.historized.start_of_online_archive(), Some(TimeFixtures::at(120)));
}

#[test]
fn test_binding_out_of_order_write_is_dropped() {
    let harness = HistoryHarness::with_series(3, 60);

    SeriesFixtures::write_at(&harness.variable, 99.0, 30);

    harness.historized.archive().assert_timestamps(&[0, 60, 120]);
    assert_eq!(harness.historized.stats().values_rejected, 1);
    // The variable itself still takes the value.
    assert_eq!(
        harness.variable.value().map(|v| v.source_timestamp),
        Some(TimeFixtures::at(30))
    );
}

#[test]
fn test_binding_seeds_current_value() {
    let server = HistoryServer::new(HistoryServerConfig::for_testing());
    let variable = VariableFixtures::with_value(7, 21.5, 30);

    let historized = server.install(&variable, None).expect("Install failed");

    historized.archive().assert_timestamps(&[30]);
    assert_eq!(historized.archive().slice(None, None)[0].value.as_f64(), Some(21.5));
}

#[test]
fn test_binding_suspend_and_resume() {
    let harness = HistoryHarness::with_series(2, 60);

    let status = harness.variable.write_attribute(
        AttributeId::Historizing,
        DataValue::good(false, TimeFixtures::t0()),
    );
    assert_eq!(status, StatusCode::GOOD);
    assert!(!harness.historized.is_historizing());

    SeriesFixtures::write_at(&harness.variable, 10.0, 120);
    SeriesFixtures::write_at(&harness.variable, 11.0, 180);
    harness.historized.archive().assert_timestamps(&[0, 60]);
    assert_eq!(harness.historized.stats().values_skipped, 2);

    harness.historized.set_historizing(true);
    SeriesFixtures::write_at(&harness.variable, 12.0, 240);
    harness.historized.archive().assert_timestamps(&[0, 60, 240]);
}

#[test]
fn test_binding_historizing_attribute() {
    let harness = HistoryHarness::new();

    let read = harness.variable.read_attribute(AttributeId::Historizing);
    assert_eq!(read.value, Variant::Boolean(true));

    let status = harness.variable.write_attribute(
        AttributeId::Historizing,
        DataValue::good("yes", TimeFixtures::t0()),
    );
    assert_eq!(status, StatusCode::BAD_TYPE_MISMATCH);
    assert!(harness.historized.is_historizing());
}

#[test]
fn test_binding_ha_configuration_is_live() {
    let harness = HistoryHarness::with_capacity(3);

    assert_eq!(ha_property(&harness, MAX_ONLINE_VALUES), Variant::UInt32(3));
    assert_eq!(ha_property(&harness, START_OF_ONLINE_ARCHIVE), Variant::Empty);
    assert_eq!(ha_property(&harness, STEPPED), Variant::Boolean(false));

    SeriesFixtures::write(&harness.variable, 2, 60);
    assert_eq!(
        ha_property(&harness, START_OF_ONLINE_ARCHIVE),
        Variant::DateTime(TimeFixtures::at(0))
    );

    SeriesFixtures::write_at(&harness.variable, 5.0, 120);
    SeriesFixtures::write_at(&harness.variable, 6.0, 180);
    assert_eq!(
        ha_property(&harness, START_OF_ONLINE_ARCHIVE),
        Variant::DateTime(TimeFixtures::at(60))
    );
    assert_eq!(
        ha_property(&harness, START_OF_ARCHIVE),
        ha_property(&harness, START_OF_ONLINE_ARCHIVE)
    );
}

#[test]
fn test_binding_unbounded_capacity_property() {
    let harness = HistoryHarness::new();
    assert_eq!(ha_property(&harness, MAX_ONLINE_VALUES), Variant::UInt32(0));
}

// =============================================================================
// Server Registry Tests
// =============================================================================

#[test]
fn test_server_uninstall_detaches_binding() {
    let harness = HistoryHarness::with_series(3, 60);
    let node_id = VariableFixtures::temperature_id();

    harness.server.uninstall(&node_id).expect("Uninstall failed");

    assert!(harness.server.is_empty());
    assert!(harness.historized.is_disposed());
    assert!(!harness.variable.is_historizing());
    assert!(harness.historized.archive().is_empty());
    assert_eq!(harness.variable.listener_count(), 0);
    assert!(harness.variable.component(HA_CONFIGURATION).is_none());

    // Later writes reach nothing.
    SeriesFixtures::write_at(&harness.variable, 1.0, 600);
    assert!(harness.historized.archive().is_empty());
}

#[test]
fn test_server_reinstall_after_uninstall() {
    let harness = HistoryHarness::with_series(3, 60);
    let node_id = VariableFixtures::temperature_id();
    harness.server.uninstall(&node_id).unwrap();

    let historized = harness
        .server
        .install(&harness.variable, Some(ArchiveConfig::unbounded()))
        .expect("Reinstall failed");

    // Seeded from the variable's current value.
    historized.archive().assert_timestamps(&[120]);
    SeriesFixtures::write_at(&harness.variable, 9.0, 180);
    historized.archive().assert_timestamps(&[120, 180]);
}

#[test]
fn test_server_install_twice_fails() {
    let harness = HistoryHarness::new();

    let result = harness.server.install(&harness.variable, None);

    assert!(matches!(result, Err(ArchiveError::AlreadyInstalled { .. })));
    assert_eq!(harness.server.len(), 1);
    assert_eq!(harness.variable.listener_count(), 1);
}

#[test]
fn test_server_stats_accumulate() {
    let server = HistoryServer::new(HistoryServerConfig::for_testing());
    let variables = VariableFixtures::batch(3);
    for variable in &variables {
        server.install(variable, Some(ArchiveConfig::unbounded())).unwrap();
        SeriesFixtures::write(variable, 4, 60);
    }

    let stats = server.stats();
    assert_eq!(stats.historized_variables, 3);
    assert_eq!(stats.archive.values_recorded, 12);
    assert_eq!(stats.archive.current_values, 12);

    server.dispose();
    assert!(server.is_empty());
    assert!(variables.iter().all(|v| v.listener_count() == 0));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_archive_concurrent_writers() {
    let server = Arc::new(HistoryServer::new(HistoryServerConfig::for_testing()));
    let variables = Arc::new(VariableFixtures::batch(8));
    for variable in variables.iter() {
        server.install(variable, Some(ArchiveConfig::unbounded())).unwrap();
    }

    let helper = ConcurrentTestHelper::new(8);
    let writers = Arc::clone(&variables);
    helper
        .run_all_succeed(move |i| {
            let writers = Arc::clone(&writers);
            async move {
                SeriesFixtures::write(&writers[i], 50, 1);
            }
        })
        .await;

    for variable in variables.iter() {
        let historized = server.get(variable.node_id()).expect("Binding missing");
        assert_eq!(historized.archive().len(), 50);
        historized.archive().assert_ordered();
    }
    assert_eq!(server.stats().archive.values_recorded, 400);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_archive_concurrent_writers_one_variable() {
    let harness = HistoryHarness::with_capacity(100);
    let variable = Arc::clone(&harness.variable);

    let helper = ConcurrentTestHelper::new(4);
    helper
        .run_all_succeed(move |i| {
            let variable = Arc::clone(&variable);
            async move {
                for step in 0..50_i64 {
                    SeriesFixtures::write_at(&variable, i as f64, step * 4 + i as i64);
                }
            }
        })
        .await;

    // Interleaved writers may lose values to ordering, never corrupt order.
    let stats = harness.historized.stats();
    harness.historized.archive().assert_ordered();
    assert_eq!(stats.values_recorded + stats.values_rejected, 200);
    assert!(stats.values_recorded > 0);
    assert!(harness.historized.archive().len() <= 100);
}
