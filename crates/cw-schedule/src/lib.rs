//! スケジュール実行モジュール
//!
//! cron 形式で指定した時刻にジョブを自動実行する機能を提供します。

mod config;
mod error;
mod runner;
mod scheduler;

pub use config::{JobSpec, JobsConfig};
pub use error::{Result, ScheduleError};
pub use runner::{CommandRunner, JobRunner, RunOutcome};
pub use scheduler::{Scheduler, SchedulerHandle, next_occurrence, parse_rule};
