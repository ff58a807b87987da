use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::TaskDefinition;
use crate::error::{AuthError, TaskError};

/// Marker the service puts in the response message when today's reward was
/// already collected.
const ALREADY_CLAIMED_MARKER: &str = "已领取";

const SUCCESS_CODE: i64 = 200;

/// The service wraps every body in `{code, message, result}` and signals
/// success with `code == 200`. The one exception is the task-reward claim,
/// which must be judged on the HTTP status alone; both conventions are kept
/// as-is per endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn reason(&self) -> String {
        self.message.clone().unwrap_or_else(|| "unknown error".to_string())
    }
}

/// JavaScript-style truthiness, which is how the service's `result` field is
/// interpreted by its own frontend.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub taker_points: Value,
    #[serde(default)]
    pub consecutive_sign_in_count: Value,
    #[serde(default)]
    pub reward_count: Value,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SignInOutcome {
    Claimed,
    /// Today's reward was collected earlier. Idempotent success, not an error.
    AlreadyClaimed,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NonceRequest<'a> {
    wallet_address: &'a str,
}

#[derive(Deserialize, Default)]
struct NonceResult {
    nonce: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    address: &'a str,
    invitation_code: &'a str,
    message: &'a str,
    signature: &'a str,
}

#[derive(Deserialize, Default)]
struct LoginResult {
    token: String,
}

/// Client for the campaign service, bound to one wallet's transport.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base: impl Into<String>) -> Self {
        Self { http, base: base.into() }
    }

    pub async fn generate_nonce(&self, address: &str) -> Result<String, AuthError> {
        let env: Envelope<NonceResult> = self
            .http
            .post(format!("{}/wallet/generateNonce", self.base))
            .json(&NonceRequest { wallet_address: address })
            .send()
            .await?
            .json()
            .await?;

        match (env.code, env.result) {
            (SUCCESS_CODE, Some(r)) => Ok(r.nonce),
            _ => Err(AuthError::NonceUnavailable),
        }
    }

    pub async fn login(
        &self,
        address: &str,
        invitation_code: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, AuthError> {
        let env: Envelope<LoginResult> = self
            .http
            .post(format!("{}/wallet/login", self.base))
            .json(&LoginRequest { address, invitation_code, message, signature })
            .send()
            .await?
            .json()
            .await?;

        match env.code {
            SUCCESS_CODE => match env.result {
                Some(r) => Ok(r.token),
                None => Err(AuthError::LoginRejected("empty login result".to_string())),
            },
            _ => Err(AuthError::LoginRejected(env.reason())),
        }
    }

    /// Informational only; callers log the result and move on.
    pub async fn user_info(&self, token: &str) -> Result<UserInfo> {
        let env: Envelope<UserInfo> = self
            .http
            .get(format!("{}/user/info", self.base))
            .bearer_auth(token)
            .send()
            .await?
            .json()
            .await?;

        match env.code {
            SUCCESS_CODE => env.result.ok_or_else(|| anyhow!("empty user info result")),
            _ => Err(anyhow!("user info request failed: {}", env.reason())),
        }
    }

    /// Submit the daily sign-in carrying the turnstile proof token.
    pub async fn sign_in(&self, token: &str, proof_token: &str) -> Result<SignInOutcome> {
        let env: Envelope<Value> = self
            .http
            .get(format!("{}/task/signIn?status=false", self.base))
            .bearer_auth(token)
            .header("Cf-Turnstile-Token", proof_token)
            .send()
            .await?
            .json()
            .await?;

        if env.code == SUCCESS_CODE && env.result.as_ref().is_some_and(truthy) {
            return Ok(SignInOutcome::Claimed);
        }
        if env
            .message
            .as_deref()
            .is_some_and(|m| m.contains(ALREADY_CLAIMED_MARKER))
        {
            return Ok(SignInOutcome::AlreadyClaimed);
        }
        Err(anyhow!("sign-in rejected: {}", env.reason()))
    }

    /// Informational only; a failure here counts against the owning task.
    pub async fn task_detail(
        &self,
        address: &str,
        task_id: u32,
        token: &str,
    ) -> Result<Value, TaskError> {
        let env: Envelope<Value> = self
            .http
            .get(format!(
                "{}/task/detail?walletAddress={address}&taskId={task_id}",
                self.base
            ))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|source| TaskError::Transport { task_id, source })?
            .json()
            .await
            .map_err(|source| TaskError::Transport { task_id, source })?;

        match env.code {
            SUCCESS_CODE => Ok(env.result.unwrap_or(Value::Null)),
            _ => Err(TaskError::DetailUnavailable { task_id, reason: env.reason() }),
        }
    }

    pub async fn check_task(&self, token: &str, task: &TaskDefinition) -> Result<(), TaskError> {
        let task_id = task.task_id;
        let env: Envelope<Value> = self
            .http
            .post(format!("{}/task/check", self.base))
            .bearer_auth(token)
            .json(task)
            .send()
            .await
            .map_err(|source| TaskError::Transport { task_id, source })?
            .json()
            .await
            .map_err(|source| TaskError::Transport { task_id, source })?;

        if env.code == SUCCESS_CODE && env.result.as_ref().is_some_and(truthy) {
            Ok(())
        } else {
            Err(TaskError::CheckFailed { task_id, reason: env.reason() })
        }
    }

    /// Unlike every other endpoint this one is judged purely on the HTTP
    /// status; the body is not consulted.
    pub async fn claim_task_reward(&self, token: &str, task_id: u32) -> Result<(), TaskError> {
        let response = self
            .http
            .post(format!("{}/task/claim-reward?taskId={task_id}", self.base))
            .bearer_auth(token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|source| TaskError::Transport { task_id, source })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TaskError::ClaimFailed { task_id, status: status.as_u16() })
        }
    }
}
