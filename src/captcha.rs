use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::VerificationError;
use crate::retry::retry_with_backoff;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 10;

const TASK_TYPE: &str = "AntiTurnstileTaskProxyLess";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest<'a> {
    client_key: &'a str,
    task: TurnstileTask<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TurnstileTask<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(rename = "websiteURL")]
    website_url: &'a str,
    website_key: &'a str,
    metadata: TaskMetadata<'a>,
}

#[derive(Serialize)]
struct TaskMetadata<'a> {
    action: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    task_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    solution: Option<Solution>,
}

#[derive(Deserialize)]
struct Solution {
    #[serde(default)]
    token: Option<String>,
}

/// Solve a Cloudflare Turnstile challenge through the solver service.
///
/// Creates the solver task, then polls for the verdict every 2 seconds with a
/// 10-attempt cap. `ready` yields the proof token, `failed` is terminal, and
/// a still-pending result at the final attempt surfaces as `Timeout`.
pub async fn solve_turnstile(
    http: &reqwest::Client,
    solver_base: &str,
    client_key: &str,
    site_url: &str,
    site_key: &str,
    action: &str,
) -> Result<String, VerificationError> {
    let created: CreateTaskResponse = http
        .post(format!("{solver_base}/createTask"))
        .json(&CreateTaskRequest {
            client_key,
            task: TurnstileTask {
                kind: TASK_TYPE,
                website_url: site_url,
                website_key: site_key,
                metadata: TaskMetadata { action },
            },
        })
        .send()
        .await?
        .json()
        .await?;

    if created.error_id != 0 {
        return Err(VerificationError::CreationFailed(
            created
                .error_description
                .unwrap_or_else(|| format!("solver error {}", created.error_id)),
        ));
    }
    let task_id = created.task_id.ok_or_else(|| {
        VerificationError::CreationFailed("solver returned no task id".to_string())
    })?;

    info!(action, "waiting for turnstile verdict");
    let result_url = format!("{solver_base}/getTaskResult");
    let poll_request = serde_json::json!({ "clientKey": client_key, "taskId": task_id });

    // The first poll happens one interval after creation, matching the
    // solver's expected pacing; pending verdicts are retried on the same
    // interval until the budget runs out.
    tokio::time::sleep(POLL_INTERVAL).await;
    retry_with_backoff(
        MAX_POLLS,
        |_| POLL_INTERVAL,
        // A pending verdict is the only retryable state; it is reported as
        // Timeout once the final attempt still has no terminal answer.
        |e| matches!(e, VerificationError::Timeout),
        |attempt| {
            let url = result_url.as_str();
            let request = &poll_request;
            async move {
                let result: TaskResultResponse =
                    http.post(url).json(&request).send().await?.json().await?;
                match result.status.as_deref() {
                    Some("ready") => result
                        .solution
                        .and_then(|s| s.token)
                        .ok_or_else(|| {
                            VerificationError::SolveFailed(
                                "ready verdict carried no token".to_string(),
                            )
                        }),
                    Some("failed") => Err(VerificationError::SolveFailed(
                        result
                            .error_description
                            .unwrap_or_else(|| "unknown error".to_string()),
                    )),
                    other => {
                        debug!(attempt, status = ?other, "turnstile still pending");
                        Err(VerificationError::Timeout)
                    }
                }
            }
        },
    )
    .await
}
