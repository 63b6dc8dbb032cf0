//! cw-core: cronwork Core Library
//!
//! デーモン設定とエラー型のコア機能を提供します。

pub mod config;
pub mod error;

pub use config::{Config, RunnerConfig, SchedulerConfig};
pub use error::{Error, Result};
