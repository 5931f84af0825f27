// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `atelier doctor` command implementation.
//!
//! Checks the admin setup, the database, the reports directory and Bot API
//! reachability, and prints one line per check.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use atelier_config::model::AtelierConfig;
use atelier_core::error::AtelierError;
use atelier_core::types::HealthStatus;
use atelier_core::PluginAdapter;
use atelier_telegram::TelegramGateway;

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run the `atelier doctor` command. `plain` disables colored output.
pub async fn run_doctor(config: &AtelierConfig, plain: bool) -> Result<(), AtelierError> {
    let use_color = !plain && std::io::stdout().is_terminal();

    let results = vec![
        check_admins(config),
        check_database(&config.storage.database_path).await,
        check_reports_dir(Path::new(&config.reports.directory)),
        check_telegram(config).await,
    ];

    println!();
    println!("  atelier doctor");
    println!("  {}", "-".repeat(50));

    let mut issues = 0;
    for result in &results {
        if result.status != CheckStatus::Pass {
            issues += 1;
        }
        println!("{}", render(result, use_color));
    }
    println!();

    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

fn render(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    let (symbol, message) = if use_color {
        use colored::Colorize;
        match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal().to_string()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow().to_string()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red().to_string()),
        }
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        (tag.to_string(), result.message.clone())
    };
    format!(
        "    {symbol} {:<20} {message} ({duration_ms}ms)",
        result.name
    )
}

/// New-order notices need somewhere to go.
fn check_admins(config: &AtelierConfig) -> CheckResult {
    let start = Instant::now();
    let admins = config.admin.admin_chats();
    match (admins.len(), config.admin.channel_id) {
        (0, None) => CheckResult::new(
            "Admins",
            CheckStatus::Warn,
            "no admin chat or channel configured; orders will go unnoticed",
            start,
        ),
        (0, Some(_)) => CheckResult::new(
            "Admins",
            CheckStatus::Warn,
            "channel only; nobody can run admin commands",
            start,
        ),
        (n, _) => CheckResult::new("Admins", CheckStatus::Pass, format!("{n} admin chat(s)"), start),
    }
}

/// Check database file exists and can be queried.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    if !Path::new(db_path).exists() {
        return CheckResult::new(
            "Database",
            CheckStatus::Warn,
            format!("not found: {db_path} (will be created on first run)"),
            start,
        );
    }

    let conn = match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => conn,
        Err(e) => {
            return CheckResult::new("Database", CheckStatus::Fail, format!("cannot open: {e}"), start);
        }
    };
    let count = conn
        .call(|conn| conn.query_row("SELECT COUNT(*) FROM orders", [], |r| r.get::<_, i64>(0)))
        .await;
    match count {
        Ok(n) => CheckResult::new("Database", CheckStatus::Pass, format!("connected ({n} orders)"), start),
        Err(e) => CheckResult::new("Database", CheckStatus::Fail, format!("query failed: {e}"), start),
    }
}

fn check_reports_dir(dir: &Path) -> CheckResult {
    let start = Instant::now();
    let marker = dir.join(".atelier-doctor");
    let result = std::fs::create_dir_all(dir)
        .and_then(|()| std::fs::write(&marker, b"ok"))
        .and_then(|()| std::fs::remove_file(&marker));
    match result {
        Ok(()) => CheckResult::new(
            "Reports directory",
            CheckStatus::Pass,
            format!("writable: {}", dir.display()),
            start,
        ),
        Err(e) => CheckResult::new(
            "Reports directory",
            CheckStatus::Fail,
            format!("{}: {e}", dir.display()),
            start,
        ),
    }
}

async fn check_telegram(config: &AtelierConfig) -> CheckResult {
    let start = Instant::now();
    let gateway = match TelegramGateway::new(&config.telegram) {
        Ok(gateway) => gateway,
        Err(e) => return CheckResult::new("Telegram", CheckStatus::Fail, e.to_string(), start),
    };
    let timeout = Duration::from_secs(config.bot.request_timeout_secs);
    match tokio::time::timeout(timeout, gateway.health_check()).await {
        Ok(Ok(HealthStatus::Healthy)) => {
            CheckResult::new("Telegram", CheckStatus::Pass, "bot reachable", start)
        }
        Ok(Ok(HealthStatus::Degraded(msg))) => {
            CheckResult::new("Telegram", CheckStatus::Warn, msg, start)
        }
        Ok(Ok(HealthStatus::Unhealthy(msg))) => {
            CheckResult::new("Telegram", CheckStatus::Fail, msg, start)
        }
        Ok(Err(e)) => CheckResult::new("Telegram", CheckStatus::Fail, e.to_string(), start),
        Err(_) => CheckResult::new(
            "Telegram",
            CheckStatus::Fail,
            format!("no answer within {}s", timeout.as_secs()),
            start,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_admins_is_a_warning() {
        let config = AtelierConfig::default();
        assert_eq!(check_admins(&config).status, CheckStatus::Warn);

        let mut config = AtelierConfig::default();
        config.admin.chat_id = Some(9);
        assert_eq!(check_admins(&config).status, CheckStatus::Pass);
    }

    #[tokio::test]
    async fn missing_database_is_a_warning() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let result = check_database(&path.to_string_lossy()).await;
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[tokio::test]
    async fn migrated_database_passes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.db").to_string_lossy().to_string();
        let mut config = AtelierConfig::default();
        config.storage.database_path = path.clone();
        let storage = atelier_storage::SqliteStorage::new(config.storage.clone());
        storage.initialize().await.unwrap();
        storage.close().await.unwrap();

        let result = check_database(&path).await;
        assert_eq!(result.status, CheckStatus::Pass, "{}", result.message);
        assert!(result.message.contains("0 orders"));
    }

    #[test]
    fn reports_dir_is_created_and_writable() {
        let dir = tempfile::TempDir::new().unwrap();
        let reports = dir.path().join("nested/reports");
        assert_eq!(check_reports_dir(&reports).status, CheckStatus::Pass);
        assert!(reports.is_dir());
        assert!(!reports.join(".atelier-doctor").exists());
    }

    #[tokio::test]
    async fn missing_token_fails_telegram_check() {
        let result = check_telegram(&AtelierConfig::default()).await;
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(result.message.contains("bot_token"));
    }

    #[test]
    fn plain_rendering_uses_tags() {
        let result = CheckResult {
            name: "Database".into(),
            status: CheckStatus::Fail,
            message: "boom".into(),
            duration: Duration::from_millis(3),
        };
        let line = render(&result, false);
        assert!(line.contains("[FAIL]"));
        assert!(line.contains("boom (3ms)"));
    }
}
