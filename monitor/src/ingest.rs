//! Health sample ingest.
//!
//! Probes pipe newline-delimited JSON samples into the monitor's stdin;
//! each line feeds the escalation counter. Malformed lines are dropped
//! with a loud log, never silently.

use std::sync::Arc;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, warn};

use warden_core::{EscalationCounter, HealthSample};

/// One ingest line: the entity id plus its health sample
#[derive(Debug, Deserialize)]
pub struct SampleLine {
    pub id: String,
    #[serde(flatten)]
    pub sample: HealthSample,
}

/// Read samples from stdin until EOF, feeding the counter.
pub async fn run_stdin_ingest(counter: Arc<EscalationCounter>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SampleLine>(&line) {
            Ok(sample_line) => {
                if let Err(e) = counter.evaluate(&sample_line.id, &sample_line.sample) {
                    warn!(entity = %sample_line.id, error = %e, "sample evaluation failed");
                }
            }
            Err(e) => {
                error!(error = %e, "dropping malformed health sample");
            }
        }
    }
    Ok(())
}
