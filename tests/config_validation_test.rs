//! Configuration loading from files and environment, and semantic validation.

use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;
use vibration_rss::config::AnalysisConfig;
use vibration_rss::data::bands::BandDef;
use vibration_rss::data::classifier::AxisTagMode;
use vibration_rss::data::rss::CollisionPolicy;
use vibration_rss::error::AnalysisError;
use vibration_rss::logging::OutputFormat;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_load_full_file() {
    let file = write_config(
        r#"
        [application]
        name = "Bench rig"
        log_level = "debug"
        log_format = "json"

        [classifier]
        axis_tag_mode = "strict_upper"
        collision_policy = "reject"

        [scale]
        factor = 10000.0
        unit_label = "[d]={/*2}"

        [report]
        start_node = 8000001
        end_node = 8000016

        [[bands]]
        label = "low"
        low = 0.0
        high = 50.0
        low_inclusive = false

        [[bands]]
        label = "high"
        key = "DNS_50_500"
        low = 50.0
        high = 500.0

        [nodes.titles]
        8000001 = "Front"
        "#,
    );

    let config = AnalysisConfig::load_from(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.application.name, "Bench rig");
    assert_eq!(config.application.log_format, OutputFormat::Json);
    assert_eq!(config.classifier.axis_tag_mode, AxisTagMode::StrictUpper);
    assert_eq!(config.classifier.collision_policy, CollisionPolicy::Reject);
    assert_eq!(config.scale.factor, 10000.0);
    assert_eq!(config.report.end_node, 8000016);
    assert_eq!(config.bands.len(), 2);
    assert!(config.bands[1].low_inclusive);
    assert_eq!(config.bands[0].report_key(), "low");
    assert_eq!(config.bands[1].report_key(), "DNS_50_500");
    assert_eq!(config.nodes.titles_by_id().unwrap()[&8000001], "Front");
}

#[test]
#[serial]
fn test_missing_file_gives_defaults() {
    let config = AnalysisConfig::load_from("/no/such/dir/vibration_rss.toml").unwrap();
    assert_eq!(config, AnalysisConfig::default());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let file = write_config("[scale]\nfactor = 10.0\n");
    std::env::set_var("VIBRATION_RSS_SCALE__FACTOR", "1");
    std::env::set_var("VIBRATION_RSS_APPLICATION__LOG_LEVEL", "warn");
    let result = AnalysisConfig::load_from(file.path());
    std::env::remove_var("VIBRATION_RSS_SCALE__FACTOR");
    std::env::remove_var("VIBRATION_RSS_APPLICATION__LOG_LEVEL");

    let config = result.unwrap();
    assert_eq!(config.scale.factor, 1.0);
    assert_eq!(config.application.log_level, "warn");
}

#[test]
#[serial]
fn test_wrong_type_is_a_config_error() {
    let file = write_config("[scale]\nfactor = \"lots\"\n");
    let err = AnalysisConfig::load_from(file.path()).unwrap_err();
    assert!(matches!(err, AnalysisError::Config(_)));
}

#[test]
fn test_band_including_dc_rejected() {
    let mut config = AnalysisConfig::default();
    config.bands[0].low_inclusive = true;
    let err = config.validate().unwrap_err();
    assert!(matches!(err, AnalysisError::Configuration(_)));
    assert!(err.to_string().contains("DC"));
}

#[test]
fn test_band_list_checks() {
    let mut config = AnalysisConfig::default();
    config.bands.clear();
    assert!(config.validate().is_err());

    let mut config = AnalysisConfig::default();
    config.bands.push(BandDef::half_open("150-300Hz", 300.0, 400.0));
    assert!(config.validate().unwrap_err().to_string().contains("duplicate band label"));

    let mut config = AnalysisConfig::default();
    config.bands.push(BandDef::half_open("inf", 300.0, f64::INFINITY));
    assert!(config.validate().is_err());

    let mut config = AnalysisConfig::default();
    config.bands.push(BandDef::half_open("flat", 300.0, 300.0));
    assert!(config.validate().is_err());
}

#[test]
fn test_non_finite_scale_rejected() {
    for factor in [0.0, f64::NAN, f64::NEG_INFINITY] {
        let config = AnalysisConfig::default().with_scale_factor(factor);
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidScale(_))
        ));
    }
}

#[test]
fn test_blank_unit_label_rejected() {
    let mut config = AnalysisConfig::default();
    config.scale.unit_label = "  ".into();
    assert!(config.validate().is_err());
}
