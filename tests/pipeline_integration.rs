//! End-to-end pipeline tests: parse → classify → RSS → scale → band RMS.

use vibration_rss::config::AnalysisConfig;
use vibration_rss::data::classifier::AxisTagMode;
use vibration_rss::data::rss::CollisionPolicy;
use vibration_rss::data::sample::{mount_sweep, sdof_sweep, SdofParams};
use vibration_rss::error::AnalysisError;
use vibration_rss::measurement_types::{ColumnSchema, Table};
use vibration_rss::pipeline::{AnalysisPipeline, DataObserver};

const THREE_NODES: &str = "\
Frequency,Node_1_X,Node_1_Y,Node_1_Z,Node_2_X,Node_2_Y,Node_3_X,Node_3_Y,Node_3_Z
0,9,9,9,1,1,1,1,1
50,3,4,0,1,1,6,8,0
120,0,0,2,1,1,0,0,0
200,2,3,6,1,1,0,0,0
300,9,9,9,1,1,9,9,9
";

fn unscaled() -> AnalysisPipeline {
    AnalysisPipeline::new(AnalysisConfig::default().with_scale_factor(1.0))
}

#[test]
fn test_rss_and_band_rms_end_to_end() {
    let run = unscaled().run(THREE_NODES, "three.csv").unwrap();

    // Node_2 has no Z channel
    assert_eq!(run.rss_columns, ["RSS_1", "RSS_3"]);
    assert_eq!(run.groups.len(), 3);

    let at_50 = &run.derived.records()[1];
    assert_eq!(at_50.get("RSS_1"), Some(5.0));
    assert_eq!(at_50.get("RSS_3"), Some(10.0));

    // DC and 300 Hz rows fall outside every band
    assert_eq!(run.rms.get("RSS_1", "1-100Hz"), Some(5.0));
    assert_eq!(run.rms.get("RSS_1", "100-150Hz"), Some(2.0));
    assert_eq!(run.rms.get("RSS_1", "150-300Hz"), Some(7.0));
    assert_eq!(run.rms.get("RSS_3", "DNS_150_300"), Some(0.0));
    assert!(run.rms.get("Node_2_X", "1-100Hz").is_none());
}

#[test]
fn test_scaling_divides_before_aggregation() {
    let run = AnalysisPipeline::new(AnalysisConfig::default().with_scale_factor(10.0))
        .run(THREE_NODES, "three.csv")
        .unwrap();
    assert_eq!(run.scale.unit_label, "cn/*2");
    assert_eq!(run.rms.get("RSS_3", "1-100Hz"), Some(1.0));
    assert_eq!(run.scaled.records()[1].frequency, 50.0);
    assert_eq!(run.derived.records()[1].get("RSS_3"), Some(10.0));
}

#[test]
fn test_observer_receives_source_label_and_raw_schema() {
    struct KeepCopy {
        table: Option<Table>,
        columns: Option<ColumnSchema>,
        label: String,
    }

    impl DataObserver for KeepCopy {
        fn on_data_parsed(&mut self, table: &Table, columns: &ColumnSchema, source_label: &str) {
            self.table = Some(table.clone());
            self.columns = Some(columns.clone());
            self.label = source_label.to_string();
        }
    }

    let mut observer = KeepCopy {
        table: None,
        columns: None,
        label: String::new(),
    };
    let run = unscaled()
        .run_with_observer(THREE_NODES, "upload-7", &mut observer)
        .unwrap();

    assert_eq!(observer.label, "upload-7");
    assert_eq!(observer.table.as_ref(), Some(&run.table));
    assert_eq!(observer.columns.unwrap().len(), 8);
}

#[test]
fn test_strict_upper_mode_ignores_lowercase_tags() {
    let sample = mount_sweep(3).unwrap();
    let mut config = AnalysisConfig::default();
    config.classifier.axis_tag_mode = AxisTagMode::StrictUpper;

    let run = AnalysisPipeline::new(config)
        .run_table(sample.table, sample.columns, sample.source_label)
        .unwrap();
    assert!(run.rss_columns.is_empty());
    assert!(run.rms.is_empty());
}

#[test]
fn test_mount_sweep_yields_one_channel_per_node() {
    let sample = mount_sweep(11).unwrap();
    let run = AnalysisPipeline::default()
        .run_table(sample.table, sample.columns, sample.source_label)
        .unwrap();

    assert_eq!(run.rss_columns.len(), 12);
    assert_eq!(run.rss_columns[0], "RSS_8000001");
    assert_eq!(run.rss_columns[11], "RSS_8000016");
    assert_eq!(run.node_ids().len(), 12);
    for channel in run.rms.channels() {
        assert_eq!(channel.bands.len(), 3);
        assert!(channel.bands.iter().all(|b| b.rms.is_finite()));
    }
}

#[test]
fn test_sdof_sweep_runs() {
    let sample = sdof_sweep(&SdofParams::default(), 5).unwrap();
    let run = AnalysisPipeline::default()
        .run_table(sample.table, sample.columns, sample.source_label)
        .unwrap();
    assert_eq!(run.rss_columns, ["RSS_1", "RSS_2"]);
}

#[test]
fn test_collision_policy_from_config() {
    let raw = "f,A_1_X,A_1_Y,A_1_Z,B_1_X,B_1_Y,B_1_Z\n10,3,4,0,0,0,2\n";

    let run = unscaled().run(raw, "c.csv").unwrap();
    assert_eq!(run.rss_columns, ["RSS_1"]);
    assert_eq!(run.derived.records()[0].get("RSS_1"), Some(2.0));

    let mut config = AnalysisConfig::default();
    config.classifier.collision_policy = CollisionPolicy::Reject;
    let err = AnalysisPipeline::new(config).run(raw, "c.csv").unwrap_err();
    assert!(matches!(err, AnalysisError::RssCollision { .. }));
}

#[test]
fn test_fatal_errors_surface() {
    let pipeline = AnalysisPipeline::default();
    assert!(matches!(
        pipeline.run("only one line", "x"),
        Err(AnalysisError::Format(_))
    ));
    assert!(matches!(
        pipeline.run("f,a\nbad,1\n", "x"),
        Err(AnalysisError::EmptyResult)
    ));
}

#[test]
fn test_summary_counts_dropped_rows() {
    let raw = "f,Node_1_X,Node_1_Y,Node_1_Z\n10,1,1,1\n20,oops,1,1\n30,2,2,1\n";
    let summary = unscaled().run(raw, "s.csv").unwrap().summary();
    assert_eq!(summary.valid_rows, 2);
    assert_eq!(summary.dropped_rows, 1);
    assert_eq!(summary.rss_channels, 1);
}
