use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// ログファイル名
pub const LOG_FILE_NAME: &str = "anomaly-client.log";

/// ログ設定
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// ログレベル (trace, debug, info, warn, error)
    pub level: String,
    /// ファイル出力先（None ならコンソールのみ）
    pub log_dir: Option<PathBuf>,
    /// ファイルローテーション設定
    pub rotation: LogRotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    /// 日次ローテーション
    Daily,
    /// 時間毎ローテーション
    Hourly,
    /// ローテーションなし
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LogConfig {
    /// 設定ファイルの [logging] セクションから作成
    pub fn from_config(config: &crate::config::LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            log_dir: config.directory.clone(),
            rotation: parse_rotation(&config.rotation),
        }
    }

    /// -v / -vv で詳細度を上げる
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        match verbose {
            0 => {}
            1 => self.level = "debug".to_string(),
            _ => self.level = "trace".to_string(),
        }
        self
    }

    /// カスタムログディレクトリを設定
    pub fn with_log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// RUST_LOG が設定されていればそちらを優先
    pub fn env_filter(&self) -> Result<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level)
                .map_err(|e| anyhow!("invalid log level {:?}: {}", self.level, e)),
        }
    }
}

fn parse_rotation(value: &str) -> LogRotation {
    match value.to_lowercase().as_str() {
        "hourly" => LogRotation::Hourly,
        "never" | "none" => LogRotation::Never,
        _ => LogRotation::Daily,
    }
}

/// ログディレクトリを確保
fn ensure_log_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// ロギングを初期化する
///
/// ファイル出力時は返されたガードを保持している間だけ書き込まれる。
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = config.env_filter()?;

    let Some(log_dir) = &config.log_dir else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow!("failed to initialise logging: {}", e))?;
        return Ok(None);
    };

    ensure_log_dir(log_dir)?;
    let file_appender = match config.rotation {
        LogRotation::Daily => rolling::daily(log_dir, LOG_FILE_NAME),
        LogRotation::Hourly => rolling::hourly(log_dir, LOG_FILE_NAME),
        LogRotation::Never => rolling::never(log_dir, LOG_FILE_NAME),
    };
    let (non_blocking, guard) = non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr.and(non_blocking))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {}", e))?;

    Ok(Some(guard))
}
