use thiserror::Error;

/// Login-stage failures. These abort the wallet's entire cycle; there is no
/// retry at this layer.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("nonce request rejected by the service")]
    NonceUnavailable,
    #[error("login rejected: {0}")]
    LoginRejected(String),
    #[error("transport failure during login: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Turnstile solver failures.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("solver refused to create a verification task: {0}")]
    CreationFailed(String),
    #[error("verification task reported as failed: {0}")]
    SolveFailed(String),
    #[error("verification polling exhausted its attempt budget")]
    Timeout,
    #[error("transport failure while solving: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Daily reward claim failure after the retry budget is spent.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("daily reward claim failed after retries: {0}")]
    ExhaustedRetries(String),
}

/// Per-task failures. Confined to their task id; sibling tasks still run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {task_id} detail fetch failed: {reason}")]
    DetailUnavailable { task_id: u32, reason: String },
    #[error("task {task_id} check failed: {reason}")]
    CheckFailed { task_id: u32, reason: String },
    #[error("task {task_id} reward claim returned HTTP {status}")]
    ClaimFailed { task_id: u32, status: u16 },
    #[error("task {task_id} transport failure: {source}")]
    Transport {
        task_id: u32,
        #[source]
        source: reqwest::Error,
    },
}

/// Anything that aborts a wallet's pipeline for the current cycle. Task
/// failures never appear here since they are isolated per task.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Claim(#[from] ClaimError),
}
