use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tokio::fs;
use tracing::warn;

use crate::terminal;
use crate::wallet::Wallet;

const API_KEY_FILE: &str = "api.txt";
const REFERRAL_FILE: &str = "refer.txt";
const PROXY_FILE: &str = "proxy.txt";
const KEYS_FILE: &str = "keys.txt";

const DEFAULT_REFERRAL_CODE: &str = "MPR4HWEW";
const DEFAULT_API_BASE: &str = "https://sowing-api.taker.xyz";
const DEFAULT_SOLVER_BASE: &str = "https://api.capsolver.com";
const DEFAULT_SITE_URL: &str = "https://sowing.taker.xyz";
const DEFAULT_SITE_KEY: &str = "0x4AAAAAABNqF8H4KF9TDs2O";

pub const CONCURRENCY: usize = 3;

/// One check the campaign expects for a task. Serializes directly as the
/// `/task/check` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub task_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_event_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_list: Option<Vec<String>>,
}

/// Everything the engine needs, loaded once and never mutated afterwards.
/// Threaded explicitly through the scheduler and pipelines; there is no
/// global state.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub referral_code: String,
    pub proxies: Vec<String>,
    pub wallets: Vec<Wallet>,
    pub tasks: Vec<TaskDefinition>,
    pub concurrency: usize,
    pub api_base: String,
    pub solver_base: String,
    pub site_url: String,
    pub site_key: String,
}

impl Settings {
    pub async fn load() -> Result<Self> {
        Self::load_from(Path::new(".")).await
    }

    /// Read the credential files from `dir`. A missing or empty API key and
    /// an empty wallet list are the only fatal outcomes; everything else
    /// degrades with a warning.
    pub async fn load_from(dir: &Path) -> Result<Self> {
        let api_key = load_api_key(dir).await?;
        let referral_code = load_referral_code(dir).await;
        let proxies = load_proxies(dir).await;
        let wallets = load_wallets(dir).await?;

        terminal::print_info(&format!("concurrency set to {CONCURRENCY}"));

        Ok(Self {
            api_key,
            referral_code,
            proxies,
            wallets,
            tasks: task_definitions(),
            concurrency: CONCURRENCY,
            api_base: DEFAULT_API_BASE.to_string(),
            solver_base: DEFAULT_SOLVER_BASE.to_string(),
            site_url: DEFAULT_SITE_URL.to_string(),
            site_key: DEFAULT_SITE_KEY.to_string(),
        })
    }

    /// Task ids in their fixed processing order, deduplicated from the
    /// definition list.
    pub fn task_ids(&self) -> Vec<u32> {
        ordered_task_ids(&self.tasks)
    }
}

/// The campaign's fixed task set: the task 6 quiz answers and the two
/// task 7 social events. Identical for every wallet and every cycle.
pub fn task_definitions() -> Vec<TaskDefinition> {
    fn quiz(event: u32, answer: &str) -> TaskDefinition {
        TaskDefinition {
            task_id: 6,
            task_event_id: Some(event),
            answer_list: Some(vec![answer.to_string()]),
        }
    }
    fn social(event: u32) -> TaskDefinition {
        TaskDefinition {
            task_id: 7,
            task_event_id: Some(event),
            answer_list: None,
        }
    }
    vec![quiz(1, "C"), quiz(2, "A"), quiz(3, "D"), social(15), social(16)]
}

pub fn ordered_task_ids(tasks: &[TaskDefinition]) -> Vec<u32> {
    let mut ids = Vec::new();
    for task in tasks {
        if !ids.contains(&task.task_id) {
            ids.push(task.task_id);
        }
    }
    ids
}

/// Non-empty lines with `#` comments stripped out.
fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

async fn load_api_key(dir: &Path) -> Result<String> {
    let raw = fs::read_to_string(dir.join(API_KEY_FILE))
        .await
        .with_context(|| format!("failed to read {API_KEY_FILE}"))?;
    let lines = parse_lines(&raw);
    let Some(key) = lines.first() else {
        bail!("no API key found in {API_KEY_FILE}");
    };
    let preview: String = key.chars().take(8).collect();
    terminal::print_success(&format!("loaded solver API key {preview}..."));
    Ok(key.clone())
}

async fn load_referral_code(dir: &Path) -> String {
    match fs::read_to_string(dir.join(REFERRAL_FILE)).await {
        Ok(raw) => match parse_lines(&raw).into_iter().next() {
            Some(code) => {
                terminal::print_success(&format!("loaded referral code {code}"));
                code
            }
            None => {
                terminal::print_warn(&format!(
                    "{REFERRAL_FILE} is empty, using default referral code {DEFAULT_REFERRAL_CODE}"
                ));
                DEFAULT_REFERRAL_CODE.to_string()
            }
        },
        Err(e) => {
            terminal::print_warn(&format!(
                "could not read {REFERRAL_FILE} ({e}), using default referral code {DEFAULT_REFERRAL_CODE}"
            ));
            DEFAULT_REFERRAL_CODE.to_string()
        }
    }
}

async fn load_proxies(dir: &Path) -> Vec<String> {
    match fs::read_to_string(dir.join(PROXY_FILE)).await {
        Ok(raw) => {
            let proxies = parse_lines(&raw);
            terminal::print_success(&format!("loaded {} proxies", proxies.len()));
            proxies
        }
        Err(e) => {
            terminal::print_warn(&format!("could not read {PROXY_FILE} ({e}), running direct"));
            Vec::new()
        }
    }
}

async fn load_wallets(dir: &Path) -> Result<Vec<Wallet>> {
    let raw = fs::read_to_string(dir.join(KEYS_FILE))
        .await
        .with_context(|| format!("failed to read {KEYS_FILE}"))?;

    let mut wallets = Vec::new();
    for line in parse_lines(&raw) {
        match Wallet::from_private_key(&line) {
            Ok(wallet) => wallets.push(wallet),
            Err(e) => {
                let preview: String = line.chars().take(10).collect();
                warn!("skipping invalid private key {preview}...: {e}");
            }
        }
    }
    if wallets.is_empty() {
        bail!("no valid private keys found in {KEYS_FILE}");
    }
    terminal::print_success(&format!("loaded {} wallets", wallets.len()));
    Ok(wallets)
}
