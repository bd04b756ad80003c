//! Analysis Step Runner
//!
//! Uniform executor for the analyzer's sequential steps: records
//! wall-clock timing and status for every step, captures error messages
//! without aborting the run, and appends steps to the timeline in
//! execution order. A failed step simply yields `None` and the run
//! continues with partial data.

use serde::Serialize;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, warn};

use crate::models::errors::AppResult;
use crate::models::types::{AnalysisStep, AnalysisTimeline, StepStatus};

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Executes named steps against one timeline.
/// Each step transitions pending -> running -> {complete|error} exactly once.
pub struct StepRunner {
    steps: Vec<AnalysisStep>,
    started_at: i64,
    run_start: Instant,
}

impl StepRunner {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            started_at: now_millis(),
            run_start: Instant::now(),
        }
    }

    /// Run one step. On success the value is recorded as the step's data
    /// payload and returned; on failure the error message is captured,
    /// the step is marked `error`, and `None` is returned.
    pub async fn run<T, F>(&mut self, id: &str, name: &str, fut: F) -> Option<T>
    where
        T: Serialize,
        F: Future<Output = AppResult<T>>,
    {
        let mut step = AnalysisStep {
            id: id.to_string(),
            name: name.to_string(),
            status: StepStatus::Pending,
            started_at: now_millis(),
            ended_at: None,
            duration_ms: None,
            data: None,
            error: None,
        };

        step.status = StepStatus::Running;
        let step_start = Instant::now();
        debug!("▶️ Step {}: {}", id, name);

        match fut.await {
            Ok(value) => {
                step.status = StepStatus::Complete;
                step.ended_at = Some(now_millis());
                step.duration_ms = Some(step_start.elapsed().as_millis() as u64);
                step.data = serde_json::to_value(&value).ok();
                self.steps.push(step);
                Some(value)
            }
            Err(err) => {
                warn!("⚠️ Step {} failed: {}", id, err);
                step.status = StepStatus::Error;
                step.ended_at = Some(now_millis());
                step.duration_ms = Some(step_start.elapsed().as_millis() as u64);
                step.error = Some(err.to_string());
                self.steps.push(step);
                None
            }
        }
    }

    /// Stamp the aggregate duration and hand back the finished timeline
    pub fn finalize(self) -> AnalysisTimeline {
        AnalysisTimeline {
            steps: self.steps,
            started_at: self.started_at,
            ended_at: Some(now_millis()),
            total_duration_ms: Some(self.run_start.elapsed().as_millis() as u64),
        }
    }
}

impl Default for StepRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::AppError;

    #[tokio::test]
    async fn test_successful_step_records_data() {
        let mut runner = StepRunner::new();
        let value = runner
            .run("account_info", "Fetch account info", async { Ok(7u32) })
            .await;
        assert_eq!(value, Some(7));

        let timeline = runner.finalize();
        assert_eq!(timeline.steps.len(), 1);
        assert_eq!(timeline.steps[0].status, StepStatus::Complete);
        assert_eq!(timeline.steps[0].data, Some(serde_json::json!(7)));
        assert!(timeline.steps[0].error.is_none());
    }

    #[tokio::test]
    async fn test_failed_step_is_non_fatal() {
        let mut runner = StepRunner::new();

        let missing: Option<u32> = runner
            .run("holders", "Fetch holders", async {
                Err(AppError::rpc_timeout("slow upstream"))
            })
            .await;
        assert!(missing.is_none());

        // The run continues past the failure
        let next = runner.run("activity", "Fetch activity", async { Ok(1u32) }).await;
        assert_eq!(next, Some(1));

        let timeline = runner.finalize();
        assert_eq!(timeline.steps.len(), 2);
        assert_eq!(timeline.steps[0].status, StepStatus::Error);
        assert!(timeline.steps[0]
            .error
            .as_deref()
            .unwrap()
            .contains("slow upstream"));
        assert_eq!(timeline.steps[1].status, StepStatus::Complete);
    }

    #[tokio::test]
    async fn test_steps_keep_execution_order() {
        let mut runner = StepRunner::new();
        runner.run("a", "first", async { Ok(()) }).await;
        runner.run("b", "second", async { Ok(()) }).await;
        runner.run("c", "third", async { Ok(()) }).await;

        let timeline = runner.finalize();
        let ids: Vec<&str> = timeline.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(timeline.total_duration_ms.is_some());
    }
}
