#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use costprism_core::metric::MetricId;
use costprism_exporter::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
refresh:
  query_period_secs: 600
metrics:
  monthly_costs: true # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIGURATION");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("{}").expect("must parse");
    assert_eq!(cfg.refresh.query_period_secs, 1800);
    assert_eq!(cfg.refresh.initial_delay_secs, 5);
    assert!(cfg.definitions().iter().all(|d| !d.enabled));
}

#[test]
fn full_yaml_config() {
    let ok = r#"
server:
  listen: "127.0.0.1:9100"
  self_metrics: true
refresh:
  query_period_secs: 900
  initial_delay_secs: 0
  query_timeout_secs: 30
metrics:
  monthly_cost: true
  yesterday_daily_cost: true
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.listen_addr().unwrap().port(), 9100);
    assert!(cfg.server.self_metrics);
    assert_eq!(cfg.refresh.query_timeout().as_secs(), 30);
    let enabled: Vec<_> = cfg
        .definitions()
        .into_iter()
        .filter(|d| d.enabled)
        .map(|d| d.id)
        .collect();
    assert_eq!(enabled, vec![MetricId::MonthlyCost, MetricId::YesterdayDailyCost]);
}

#[test]
fn out_of_range_period_in_yaml_fails() {
    let err = config::load_from_str("refresh: { query_period_secs: 100000 }").expect_err("must fail");
    assert!(err.to_string().contains("query_period_secs"));
}

#[test]
fn env_overrides_yaml_file() {
    let path = std::env::temp_dir().join(format!("costprism-config-{}.yaml", std::process::id()));
    fs::write(
        &path,
        "refresh:\n  query_period_secs: 900\nmetrics:\n  monthly_cost: true\n",
    )
    .unwrap();

    let cfg = config::load_from_vars(vec![
        (config::CONFIG_PATH_ENV.to_string(), path.display().to_string()),
        ("QUERY_PERIOD".to_string(), "120".to_string()),
        ("METRIC_TODAY_DAILY_USAGE".to_string(), "1".to_string()),
    ])
    .unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(cfg.refresh.query_period_secs, 120);
    assert!(cfg.metrics.monthly_cost);
    assert!(cfg.metrics.today_daily_usage);
    assert!(!cfg.metrics.today_daily_cost);
}

#[test]
fn missing_config_file_is_fatal() {
    let err = config::load_from_vars(vec![(
        config::CONFIG_PATH_ENV.to_string(),
        "/definitely/not/here.yaml".to_string(),
    )])
    .expect_err("must fail");
    assert_eq!(err.code().as_str(), "CONFIGURATION");
}
