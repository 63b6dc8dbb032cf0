//! エラー型定義 (cw-schedule)

use thiserror::Error;

/// cw-schedule のエラー型
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("ルールパースエラー ({name}): {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Job execution error: {0}")]
    JobExecution(String),

    #[error("Cron error: {0}")]
    CronError(#[from] cron::error::Error),
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, ScheduleError>;
