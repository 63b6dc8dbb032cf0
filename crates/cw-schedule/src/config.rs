//! ジョブ設定
//!
//! TOML 形式の設定ファイルからジョブを読み込みます。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScheduleError};
use crate::scheduler::parse_rule;

/// ジョブ全体の設定
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JobsConfig {
    /// ジョブのリスト
    pub jobs: Vec<JobSpec>,
}

/// 個別のジョブ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// ジョブ名
    pub name: String,

    /// cron 形式のルール (例: "0 9 * * *" = 毎日9時)
    pub rule: String,

    /// 実行するコマンド
    pub command: String,

    /// 有効/無効
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl JobsConfig {
    /// TOML ファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: JobsConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む
    pub fn load_default() -> Result<Self> {
        let paths = ["jobs.toml", "config/jobs.toml", ".cronwork/jobs.toml"];

        for path in &paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // 設定ファイルがない場合は空の設定を返す
        Ok(Self::default())
    }

    /// 有効なジョブのみを返す
    pub fn enabled_jobs(&self) -> Vec<&JobSpec> {
        self.jobs.iter().filter(|j| j.enabled).collect()
    }

    /// 全ジョブのルールを事前検証する
    ///
    /// 不正なルールは最初の発火時ではなく起動時に失敗させます。
    pub fn validate(&self) -> Result<()> {
        for job in &self.jobs {
            parse_rule(&job.rule).map_err(|e| ScheduleError::InvalidRule {
                name: job.name.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }
}
