use std::fs;
use std::path::PathBuf;

use rdt_abstract::LinkConfig;
use rdt_core::VirtualTimer;
use rdt_simulator::{Transcript, scenario_runner};

fn scenario_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../scenarios")
}

#[tokio::test]
async fn bundled_scenarios_pass() {
    let mut ran = 0;
    for entry in fs::read_dir(scenario_dir()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_none_or(|ext| ext != "toml") || path.ends_with("link.toml") {
            continue;
        }
        let scenario = scenario_runner::load_scenario(&path).unwrap();
        scenario_runner::run_loaded(&scenario, VirtualTimer::new(), &mut Transcript::quiet())
            .await
            .unwrap_or_else(|err| panic!("{}: {err:#}", path.display()));
        ran += 1;
    }
    assert_eq!(ran, 6);
}

#[test]
fn bundled_link_config_is_valid() {
    let content = fs::read_to_string(scenario_dir().join("link.toml")).unwrap();
    let config: LinkConfig = toml::from_str(&content).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.timeout_ms, 2000);
    assert_eq!(config.seed, None);
}

#[tokio::test]
async fn trace_serializes_events() {
    let path = scenario_dir().join("flipped_ack.toml");
    let scenario = scenario_runner::load_scenario(&path).unwrap();
    let report =
        scenario_runner::run_loaded(&scenario, VirtualTimer::new(), &mut Transcript::quiet())
            .await
            .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["delivered_data"], serde_json::json!(["once", "twice"]));
    let kinds: Vec<&str> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"ack_corrupted"));
    assert!(kinds.contains(&"duplicate_detected"));
    assert!(kinds.contains(&"retransmitting"));
    assert_eq!(json["events"][0]["seq"], 0);
}
