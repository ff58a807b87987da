
use std::collections::BTreeSet;

use e2e_harness::{Behavior, MockService, SignInMode, TestResult, test_settings};

use sowing_bot::captcha;
use sowing_bot::error::VerificationError;
use sowing_bot::logging::LogSink;
use sowing_bot::net;
use sowing_bot::scheduler::Engine;

fn engine_in(dir: &std::path::Path, settings: sowing_bot::config::Settings) -> Engine {
    Engine::with_sinks(
        settings,
        LogSink::new(dir.join("error_log.txt")),
        LogSink::new(dir.join("execution_log.txt")),
    )
}

async fn read_lines(path: std::path::PathBuf) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn seven_wallets_all_succeed_end_to_end() -> TestResult<()> {
    let mock = MockService::start(Behavior::default()).await?;
    let dir = tempfile::tempdir()?;
    let settings = test_settings(&mock.base_url, 7);
    let expected: BTreeSet<String> =
        settings.wallets.iter().map(|w| w.address.clone()).collect();

    let report = engine_in(dir.path(), settings).run_cycle(1).await;

    assert_eq!(report.outcomes.len(), 7);
    assert_eq!(report.succeeded(), 7);
    let seen: BTreeSet<String> = report.outcomes.iter().map(|o| o.address.clone()).collect();
    assert_eq!(seen, expected, "exactly one outcome per wallet");

    {
        let counters = mock.counters();
        assert_eq!(counters.login, 7);
        assert_eq!(counters.sign_in, 7);
        assert_eq!(counters.create_task, 7);
        assert_eq!(counters.polls, 7, "ready on the first poll");
        // 5 checks and 2 detail/claim pairs per wallet.
        assert_eq!(counters.checks.len(), 35);
        assert_eq!(counters.details.len(), 14);
        assert_eq!(counters.reward_claims.len(), 14);
    }

    let summary = read_lines(dir.path().join("execution_log.txt")).await;
    assert_eq!(summary.len(), 1, "one summary line per cycle");
    assert!(summary[0].contains("cycle 1"));
    assert!(summary[0].contains("7 wallets"));
    assert!(read_lines(dir.path().join("error_log.txt")).await.is_empty());

    mock.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn auth_failure_yields_one_outcome_and_skips_later_stages() -> TestResult<()> {
    let mock = MockService::start(Behavior {
        reject_login: true,
        ..Behavior::default()
    })
    .await?;
    let dir = tempfile::tempdir()?;

    let report = engine_in(dir.path(), test_settings(&mock.base_url, 2))
        .run_cycle(1)
        .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.succeeded(), 0);
    for outcome in &report.outcomes {
        let detail = outcome.error.as_deref().unwrap_or_default();
        assert!(detail.contains("login rejected"), "unexpected detail: {detail}");
    }

    {
        let counters = mock.counters();
        assert_eq!(counters.login, 2);
        // Nothing past authentication may run.
        assert_eq!(counters.sign_in, 0);
        assert_eq!(counters.create_task, 0);
        assert!(counters.checks.is_empty());
        assert!(counters.reward_claims.is_empty());
    }

    let errors = read_lines(dir.path().join("error_log.txt")).await;
    assert_eq!(errors.len(), 2, "one error line per failed wallet");

    mock.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn reward_claim_stops_after_exactly_two_attempts() -> TestResult<()> {
    let mock = MockService::start(Behavior {
        sign_in: SignInMode::Reject,
        ..Behavior::default()
    })
    .await?;
    let dir = tempfile::tempdir()?;

    let report = engine_in(dir.path(), test_settings(&mock.base_url, 1))
        .run_cycle(1)
        .await;

    assert_eq!(report.succeeded(), 0);
    let detail = report.outcomes[0].error.as_deref().unwrap_or_default();
    assert!(detail.contains("after retries"), "unexpected detail: {detail}");

    {
        let counters = mock.counters();
        assert_eq!(counters.sign_in, 2, "exactly two claim attempts");
        assert_eq!(counters.create_task, 2, "a fresh challenge per attempt");
        assert!(counters.checks.is_empty(), "tasks must not run after a claim failure");
    }

    mock.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn already_claimed_counts_as_success() -> TestResult<()> {
    let mock = MockService::start(Behavior {
        sign_in: SignInMode::AlreadyClaimed,
        ..Behavior::default()
    })
    .await?;
    let dir = tempfile::tempdir()?;

    let report = engine_in(dir.path(), test_settings(&mock.base_url, 1))
        .run_cycle(1)
        .await;

    assert_eq!(report.succeeded(), 1);

    {
        let counters = mock.counters();
        assert_eq!(counters.sign_in, 1, "no retry on the idempotent response");
        // The pipeline continued into the task stage.
        assert_eq!(counters.checks.len(), 5);
        let mut claimed = counters.reward_claims.clone();
        claimed.sort_unstable();
        assert_eq!(claimed, vec![6, 7]);
    }

    mock.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_task_six_leaves_task_seven_intact() -> TestResult<()> {
    let mock = MockService::start(Behavior {
        fail_task6_checks: true,
        ..Behavior::default()
    })
    .await?;
    let dir = tempfile::tempdir()?;

    let report = engine_in(dir.path(), test_settings(&mock.base_url, 1))
        .run_cycle(1)
        .await;

    // Task failures never fail the wallet.
    assert_eq!(report.succeeded(), 1);

    {
        let counters = mock.counters();
        assert_eq!(counters.details, vec![6, 7], "task 7 detail still fetched");
        // Task 6 stops at its first failing check; task 7 runs both of its checks.
        assert_eq!(
            counters.checks,
            vec![(6, Some(1)), (7, Some(15)), (7, Some(16))]
        );
        assert_eq!(counters.reward_claims, vec![7], "only task 7 claims its reward");
    }
    assert!(
        read_lines(dir.path().join("error_log.txt")).await.is_empty(),
        "task errors are not account failures"
    );

    mock.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn poller_returns_token_once_verdict_is_ready() -> TestResult<()> {
    let mock = MockService::start(Behavior {
        pending_polls: 2,
        ..Behavior::default()
    })
    .await?;

    let client = net::client_for(0, &[]);
    let token = captcha::solve_turnstile(
        &client,
        &mock.base_url,
        "TEST-SOLVER-KEY",
        "https://sowing.example",
        "test-site-key",
        "mining",
    )
    .await?;

    assert_eq!(token, "mock-proof-token");
    assert_eq!(mock.counters().polls, 3, "ready on the third poll");

    mock.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn poller_times_out_after_ten_pending_polls() -> TestResult<()> {
    let mock = MockService::start(Behavior {
        pending_polls: u32::MAX,
        ..Behavior::default()
    })
    .await?;

    let client = net::client_for(0, &[]);
    let result = captcha::solve_turnstile(
        &client,
        &mock.base_url,
        "TEST-SOLVER-KEY",
        "https://sowing.example",
        "test-site-key",
        "mining",
    )
    .await;

    assert!(matches!(result, Err(VerificationError::Timeout)));
    assert_eq!(mock.counters().polls, 10, "the attempt cap is fixed");

    mock.shutdown().await;
    Ok(())
}
