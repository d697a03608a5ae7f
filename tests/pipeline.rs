//! End-to-end pipeline scenarios.
//!
//! Drives raw elements through the config-built pipeline and checks the
//! resulting graph: vertex sharing between sequential odometry merges,
//! inertial integration-window closing, and fail-fast wiring errors.
//!
//! Run with: `cargo test --test pipeline`

use setu_slam::{
    build_pipeline, from_toml_str, DataBatch, Element, Graph, Sensor, SensorKind, SourceLocation,
    NANOSECONDS_PER_SECOND,
};

const MS: i64 = 1_000_000;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Scenario A: sequential scan-matcher odometry
// ============================================================================

const ODOMETRY_CONFIG: &str = r#"
    [[sensors]]
    name = "velodyne"
    kind = "lidar"

    [[handlers]]
    name = "scan_matcher"
    params = { type = "pose_odometry", translation_sigma = 0.05, rotation_sigma = 0.01 }

    [[analyzers]]
    name = "lidar_keyframe"
    params = { type = "handler_group", handlers = ["scan_matcher"] }

    [[edge_factories]]
    name = "lidar_odometry"
    time_margin_ns = 2
    params = { type = "pose_odometry" }

    [tables.sensor_handlers]
    velodyne = ["scan_matcher"]

    [tables.handler_analyzers]
    scan_matcher = "lidar_keyframe"

    [tables.handler_edge_factories]
    scan_matcher = "lidar_odometry"
"#;

fn scan_element(timestamp: i64, position: u64) -> Element {
    Element::new(
        timestamp,
        Sensor::new("velodyne", SensorKind::Lidar),
        // Registered relative transform: 1 m forward, no rotation.
        vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        SourceLocation::new("lidar.bin", position),
    )
}

#[test]
fn test_sequential_odometry_shares_middle_vertex() {
    init_logs();
    let config = from_toml_str(ODOMETRY_CONFIG).unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    // First scan: pairwise handler has nothing to register against.
    assert!(!builder.process_element(&scan_element(10, 0), &mut graph).unwrap());
    assert_eq!(graph.num_vertices(), 0);

    // Second scan: measurement [10..20] merges into one binary edge.
    assert!(builder.process_element(&scan_element(20, 1), &mut graph).unwrap());
    assert_eq!(graph.num_vertices(), 2);
    assert_eq!(graph.num_edges(), 1);

    // Third scan: measurement [20..30] must reuse the t=20 vertex.
    assert!(builder.process_element(&scan_element(30, 2), &mut graph).unwrap());
    assert_eq!(graph.num_vertices(), 3);
    assert_eq!(graph.num_edges(), 2);
    assert_eq!(graph.factors().len(), 2);

    // The shared vertex is incident to both edges.
    let shared = graph
        .vertex_storage()
        .iter()
        .find(|vertex| vertex.timestamp() == 20)
        .expect("keyframe at t=20");
    assert_eq!(graph.connected_edges(shared.index()).count(), 2);
}

#[test]
fn test_consumed_measurements_leave_the_storage() {
    let config = from_toml_str(ODOMETRY_CONFIG).unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    builder.process_element(&scan_element(10, 0), &mut graph).unwrap();
    builder.process_element(&scan_element(20, 1), &mut graph).unwrap();

    assert!(builder.distributor().storage().is_empty());
}

#[test]
fn test_batch_driven_candidate_creation() {
    let config = from_toml_str(ODOMETRY_CONFIG).unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    let mut batch: DataBatch = (0..3i64)
        .map(|i| scan_element(10 * (i + 1), i as u64))
        .collect();

    builder.create_candidate(&mut batch).unwrap();
    assert!(builder.candidate_factory().is_ready());
    builder.merge_candidate(&mut graph).unwrap();

    assert_eq!(graph.num_edges(), 1);
    // The third element is still queued for the next round.
    assert_eq!(batch.len(), 1);
}

// ============================================================================
// Scenario B: inertial integration window
// ============================================================================

const IMU_CONFIG: &str = r#"
    [[sensors]]
    name = "xsens"
    kind = "imu"

    [[handlers]]
    name = "imu_preprocessor"
    params = { type = "imu" }

    [[analyzers]]
    name = "imu_window"
    params = { type = "integration_window", target_ns = 1050000000, tolerance_ns = 10000000 }

    [[edge_factories]]
    name = "imu_odometry"
    time_margin_ns = 1000000
    params = { type = "imu_odometry" }

    [tables.sensor_handlers]
    xsens = ["imu_preprocessor"]

    [tables.handler_analyzers]
    imu_preprocessor = "imu_window"

    [tables.handler_edge_factories]
    imu_preprocessor = "imu_odometry"
"#;

fn imu_element(timestamp: i64, position: u64) -> Element {
    Element::new(
        timestamp,
        Sensor::new("xsens", SensorKind::Imu),
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 9.81],
        SourceLocation::new("imu.csv", position),
    )
}

#[test]
fn test_integration_window_closes_inside_tolerance() {
    init_logs();
    let config = from_toml_str(IMU_CONFIG).unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    // 10 ms cadence. Nothing merges while the span is below 1040 ms.
    let mut merged_at = None;
    for step in 0..=110i64 {
        let timestamp = step * 10 * MS;
        let merged = builder
            .process_element(&imu_element(timestamp, step as u64), &mut graph)
            .unwrap();
        if merged {
            merged_at = Some(timestamp);
            break;
        }
        if timestamp < 1_040 * MS {
            assert_eq!(graph.num_edges(), 0, "merged early at {} ns", timestamp);
        }
    }

    let merged_at = merged_at.expect("window must close");
    assert!(
        (1_040 * MS..=1_060 * MS).contains(&merged_at),
        "window closed at {} ns",
        merged_at
    );

    // One preintegrated multi-edge over two (pose, velocity, bias) triples.
    assert_eq!(graph.num_edges(), 1);
    assert_eq!(graph.num_vertices(), 6);
    assert_eq!(graph.factors().len(), 1);
}

#[test]
fn test_window_resets_after_emission() {
    let config = from_toml_str(IMU_CONFIG).unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    let mut merges = 0;
    for step in 0..220i64 {
        let timestamp = step * 10 * MS;
        if builder
            .process_element(&imu_element(timestamp, step as u64), &mut graph)
            .unwrap()
        {
            merges += 1;
        }
    }

    // Two full windows fit into 2.2 s of stream.
    assert_eq!(merges, 2);
    assert_eq!(graph.num_edges(), 2);
}

// ============================================================================
// Scenario C: wiring errors surface at distribution time
// ============================================================================

#[test]
fn test_unregistered_sensor_fails_at_distribution() {
    let config = from_toml_str(ODOMETRY_CONFIG).unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    let stray = Element::new(
        5,
        Sensor::new("thermometer", SensorKind::Gnss),
        vec![0.0; 6],
        SourceLocation::new("misc.csv", 0),
    );

    let err = builder.process_element(&stray, &mut graph).unwrap_err();
    assert!(matches!(err, setu_slam::Error::NotFound(_)));
    assert_eq!(graph.num_vertices(), 0);
}

// ============================================================================
// Merge idempotence
// ============================================================================

#[test]
fn test_merging_empty_candidate_changes_nothing() {
    let config = from_toml_str(ODOMETRY_CONFIG).unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    builder.merge_candidate(&mut graph).unwrap();

    assert_eq!(graph.num_vertices(), 0);
    assert_eq!(graph.num_edges(), 0);
    assert_eq!(graph.factors().len(), 0);
}

#[test]
fn test_second_timescale_stream() {
    // Same odometry pipeline at realistic nanosecond timestamps.
    let config = from_toml_str(
        &ODOMETRY_CONFIG.replace("time_margin_ns = 2", "time_margin_ns = 100000000"),
    )
    .unwrap();
    let mut builder = build_pipeline(&config).unwrap();
    let mut graph = Graph::new();

    for step in 0..10i64 {
        let timestamp = step * NANOSECONDS_PER_SECOND;
        builder
            .process_element(&scan_element(timestamp, step as u64), &mut graph)
            .unwrap();
    }

    // 9 odometry pairs over 10 scans, each keyframe shared.
    assert_eq!(graph.num_edges(), 9);
    assert_eq!(graph.num_vertices(), 10);
}
