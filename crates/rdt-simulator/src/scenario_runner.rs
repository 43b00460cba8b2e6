use anyhow::{Context, Result, bail};
use rdt_abstract::{FaultAction, LinkConfig, TestAssertion, TestScenario};
use rdt_core::{Link, RetransmitTimer, VirtualTimer};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::trace::SimulationReport;
use crate::transcript::Transcript;

pub fn load_scenario(path: &Path) -> Result<TestScenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    parse_scenario(&content)
}

pub fn parse_scenario(content: &str) -> Result<TestScenario> {
    toml::from_str(content).context("Failed to parse scenario file")
}

/// Default link configuration with the scenario's overrides applied.
pub fn scenario_config(scenario: &TestScenario) -> LinkConfig {
    let mut config = LinkConfig::default();
    scenario.config.apply_to(&mut config);
    config
}

/// Transfer `messages` in order over a freshly built link.
///
/// An invalid configuration is an error. A send that gives up (or refuses its
/// payload) ends the run early and is recorded in [`SimulationReport::failure`].
pub async fn simulate<T: RetransmitTimer>(
    config: &LinkConfig,
    faults: &[FaultAction],
    messages: &[String],
    timer: T,
    transcript: &mut Transcript,
) -> Result<SimulationReport> {
    let mut link = Link::from_config(config, faults.iter().copied(), timer)
        .context("Invalid link configuration")?;
    let mut report = SimulationReport::new(config.clone(), messages.to_vec());

    for message in messages {
        match link.transfer(transcript, message).await {
            Ok(receipt) => report.attempts.push(receipt.attempts),
            Err(err) => {
                warn!("Transfer of {message:?} failed: {err}");
                report.failure = Some(err.to_string());
                break;
            }
        }
    }

    report.absorb_stats(&link.stats());
    report.duration_ms = link.elapsed().as_millis() as u64;
    report.delivered_data = transcript.delivered_data.clone();
    report.events = transcript.events.clone();
    Ok(report)
}

/// Run a scenario file on simulated time and check its assertions.
pub async fn run_scenario(path: &str) -> Result<SimulationReport> {
    let scenario = load_scenario(Path::new(path))?;
    run_loaded(&scenario, VirtualTimer::new(), &mut Transcript::new()).await
}

pub async fn run_loaded<T: RetransmitTimer>(
    scenario: &TestScenario,
    timer: T,
    transcript: &mut Transcript,
) -> Result<SimulationReport> {
    let config = scenario_config(scenario);
    run_with_config(scenario, &config, timer, transcript).await
}

/// Like [`run_loaded`], but with the link configuration supplied by the caller.
pub async fn run_with_config<T: RetransmitTimer>(
    scenario: &TestScenario,
    config: &LinkConfig,
    timer: T,
    transcript: &mut Transcript,
) -> Result<SimulationReport> {
    info!("Running scenario '{}': {}", scenario.name, scenario.description);
    let report = simulate(
        config,
        &scenario.faults,
        &scenario.messages,
        timer,
        transcript,
    )
    .await?;
    check_assertions(&scenario.assertions, &report)
        .with_context(|| format!("Scenario '{}' failed", scenario.name))?;
    info!("Scenario '{}' passed", scenario.name);
    Ok(report)
}

pub fn check_assertions(assertions: &[TestAssertion], report: &SimulationReport) -> Result<()> {
    for assertion in assertions {
        match assertion {
            TestAssertion::DataDelivered { data } => {
                if !report.delivered_data.iter().any(|d| d == data) {
                    bail!("expected {data:?} to be delivered");
                }
            }
            TestAssertion::DeliveredInOrder => {
                if report.delivered_data != report.messages {
                    bail!(
                        "expected delivery of {:?}, got {:?}",
                        report.messages,
                        report.delivered_data
                    );
                }
            }
            TestAssertion::SegmentCount { min, max } => {
                check_range("segment count", report.segments_sent, *min, *max)?;
            }
            TestAssertion::RetransmissionCount { min, max } => {
                check_range("retransmission count", report.retransmissions, *min, *max)?;
            }
            TestAssertion::MaxDuration { ms } => {
                if report.duration_ms > *ms {
                    bail!("run took {} ms, limit {} ms", report.duration_ms, ms);
                }
            }
            TestAssertion::RetriesExhausted => {
                if report.failure.is_none() {
                    bail!("expected the sender to give up, but every message was acknowledged");
                }
            }
        }
    }
    Ok(())
}

fn check_range(what: &str, value: u32, min: u32, max: Option<u32>) -> Result<()> {
    if value < min {
        bail!("{what} {value} below minimum {min}");
    }
    if let Some(max) = max
        && value > max
    {
        bail!("{what} {value} above maximum {max}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOST_ACK: &str = r#"
        name = "lost ack"
        description = "the first ACK never arrives"
        messages = ["hello", "world"]

        [config]
        error_rate = 0.0
        ack_error_rate = 0.0
        loss_rate = 0.0
        timeout_ms = 500

        [[faults]]
        type = "drop_next_ack"
        ack = 0

        [[assertions]]
        type = "delivered_in_order"

        [[assertions]]
        type = "retransmission_count"
        min = 1
        max = 1

        [[assertions]]
        type = "max_duration"
        ms = 500
    "#;

    #[tokio::test]
    async fn lost_ack_scenario_passes() {
        let scenario = parse_scenario(LOST_ACK).unwrap();
        let report = run_loaded(&scenario, VirtualTimer::new(), &mut Transcript::quiet())
            .await
            .unwrap();

        assert!(report.completed());
        assert_eq!(report.attempts, vec![2, 1]);
        assert_eq!(report.acks_lost, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.duration_ms, 500);
    }

    #[tokio::test]
    async fn failing_assertion_is_reported() {
        let mut scenario = parse_scenario(LOST_ACK).unwrap();
        scenario.assertions = vec![TestAssertion::RetransmissionCount { min: 0, max: Some(0) }];

        let err = run_loaded(&scenario, VirtualTimer::new(), &mut Transcript::quiet())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("retransmission count 1 above maximum 0"));
    }

    #[tokio::test]
    async fn permanent_loss_gives_up() {
        let scenario = parse_scenario(
            r#"
            name = "black hole"
            messages = ["never"]

            [config]
            loss_rate = 1.0
            max_attempts = 10
            seed = 1

            [[assertions]]
            type = "retries_exhausted"
            "#,
        )
        .unwrap();

        let report = run_loaded(&scenario, VirtualTimer::new(), &mut Transcript::quiet())
            .await
            .unwrap();
        assert!(!report.completed());
        assert_eq!(report.segments_sent, 10);
        assert!(report.delivered_data.is_empty());
    }

    #[tokio::test]
    async fn invalid_rate_is_fatal() {
        let scenario = parse_scenario(
            r#"
            name = "broken"
            messages = ["x"]
            [config]
            error_rate = 1.5
            "#,
        )
        .unwrap();

        let err = run_loaded(&scenario, VirtualTimer::new(), &mut Transcript::quiet())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("error_rate must be within"));
    }

    #[tokio::test]
    async fn corrupted_segment_fault_is_recovered() {
        let scenario = parse_scenario(
            r#"
            name = "corrupt once"
            messages = ["a", "b"]

            [config]
            variant = "corruption_only"
            error_rate = 0.0
            ack_error_rate = 0.0

            [[faults]]
            type = "corrupt_next_segment"
            seq = 1

            [[assertions]]
            type = "delivered_in_order"

            [[assertions]]
            type = "segment_count"
            min = 3
            max = 3
            "#,
        )
        .unwrap();

        let mut transcript = Transcript::quiet();
        let report = run_loaded(&scenario, VirtualTimer::new(), &mut transcript)
            .await
            .unwrap();
        assert_eq!(report.corrupted_segments, 1);
        assert_eq!(report.duration_ms, 0);
        assert_eq!(
            transcript.count(|e| matches!(e, rdt_abstract::TransferEvent::SegmentCorrupted { .. })),
            1
        );
    }
}
