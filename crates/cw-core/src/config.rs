//! Configuration management
//!
//! 設定は以下の優先順位で読み込まれます:
//! 1. 環境変数
//! 2. cronwork.toml 設定ファイル
//! 3. デフォルト値
//!
//! 設定ファイル内では `${VAR_NAME}` 形式で環境変数を展開できます。

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for cronwork
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// スケジューラー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// スケジューラーが有効かどうか
    pub enabled: bool,

    /// ジョブ設定ファイルパス
    pub config_path: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            config_path: None,
        }
    }
}

/// ランナー設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// コマンドを実行するシェル
    #[serde(default = "default_shell")]
    pub shell: String,

    /// コマンドのタイムアウト (ミリ秒、最大 600000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: default_shell(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_timeout_ms() -> u64 {
    120_000
}

impl Config {
    /// 設定ファイルから環境変数を展開する
    ///
    /// `${VAR_NAME}` 形式の文字列を環境変数の値に置換します。
    /// 環境変数が存在しない場合は空文字列になります。
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // '{' を消費

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // '}' を消費
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                // 環境変数を展開（存在しない場合は空文字列）
                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// TOML 設定ファイルから設定を読み込む
    ///
    /// # 引数
    /// * `path` - TOML ファイルのパス
    ///
    /// # 環境変数展開
    /// 設定ファイル内の `${VAR_NAME}` は環境変数の値に置換されます。
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        // TOML ファイルを読み込む
        let toml_content = std::fs::read_to_string(path)?;

        // 環境変数を展開
        let expanded_content = Self::expand_env_vars(&toml_content);

        // TOML をパース
        let toml_config: TomlConfig = toml::from_str(&expanded_content)?;

        // TOML 構造から Config に変換
        let mut cfg = Self::from_toml_config(toml_config);

        // 既存の環境変数で上書き（環境変数が優先）
        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// デフォルトパスから設定を読み込む
    ///
    /// 以下の順序で設定ファイルを探します:
    /// 1. `./cronwork.toml`
    /// 2. 見つからない場合は環境変数のみ
    pub fn load() -> crate::Result<Self> {
        // カレントディレクトリの cronwork.toml を試す
        if Path::new("cronwork.toml").exists() {
            return Self::from_toml_file("cronwork.toml");
        }

        // ファイルがない場合は環境変数から読み込み
        Self::from_env()
    }

    /// TOML 構造から Config を構築
    fn from_toml_config(toml: TomlConfig) -> Self {
        // Scheduler 設定
        let scheduler = toml.scheduler.unwrap_or_default();
        let scheduler_config = SchedulerConfig {
            enabled: scheduler.enabled.unwrap_or(true),
            config_path: scheduler.config_path,
        };

        // Runner 設定
        let runner = toml.runner.unwrap_or_default();
        let runner_config = RunnerConfig {
            shell: runner.shell.unwrap_or_else(default_shell),
            timeout_ms: runner.timeout_ms.unwrap_or_else(default_timeout_ms),
        };

        Config {
            scheduler: scheduler_config,
            runner: runner_config,
        }
    }

    /// 環境変数で設定を上書きする
    fn apply_env_overrides(&mut self) {
        // Scheduler 設定の上書き
        if let Ok(enabled) = std::env::var("SCHEDULE_ENABLED") {
            self.scheduler.enabled = enabled.to_lowercase() != "false";
        }
        if let Ok(path) = std::env::var("SCHEDULE_CONFIG_PATH") {
            self.scheduler.config_path = Some(path);
        }

        // Runner 設定の上書き
        if let Ok(shell) = std::env::var("RUNNER_SHELL") {
            if !shell.is_empty() {
                self.runner.shell = shell;
            }
        }
        if let Ok(timeout) = std::env::var("RUNNER_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.runner.timeout_ms = t;
            }
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut cfg = Config::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }
}

// ============================================================================
// TOML 構造体定義（ファイル解析用）
// ============================================================================

/// TOML ファイル用のトップレベル構造
#[derive(Debug, Deserialize)]
struct TomlConfig {
    /// スケジューラー設定
    scheduler: Option<TomlSchedulerConfig>,
    /// ランナー設定
    runner: Option<TomlRunnerConfig>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlSchedulerConfig {
    /// 有効/無効
    enabled: Option<bool>,
    /// ジョブ設定ファイルパス
    config_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct TomlRunnerConfig {
    /// シェル
    #[serde(default)]
    shell: Option<String>,
    /// タイムアウト (ミリ秒)
    #[serde(default)]
    timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_config_default() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_runner_config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.shell, "bash");
        assert_eq!(config.timeout_ms, 120_000);
    }

    #[test]
    fn test_expand_env_vars() {
        // テスト用環境変数を設定
        unsafe {
            std::env::set_var("CRONWORK_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${CRONWORK_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        // 存在しない環境変数
        let result = Config::expand_env_vars("prefix_${NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("CRONWORK_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("no_vars_here");
        assert_eq!(result, "no_vars_here");
    }

    #[test]
    fn test_expand_env_vars_empty_name() {
        let result = Config::expand_env_vars("${}_content");
        assert_eq!(result, "_content");
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[scheduler]
enabled = true
config_path = "/path/to/jobs.toml"

[runner]
shell = "sh"
timeout_ms = 30000
"#;

        let toml_config: TomlConfig = toml::from_str(toml_content).unwrap();

        // Scheduler 設定の検証
        let scheduler = toml_config.scheduler.unwrap();
        assert_eq!(scheduler.enabled, Some(true));
        assert_eq!(scheduler.config_path, Some("/path/to/jobs.toml".to_string()));

        // Runner 設定の検証
        let runner = toml_config.runner.unwrap();
        assert_eq!(runner.shell, Some("sh".to_string()));
        assert_eq!(runner.timeout_ms, Some(30000));
    }

    #[test]
    fn test_env_overrides_beat_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cronwork.toml");
        std::fs::write(
            &path,
            r#"
[runner]
shell = "zsh"
timeout_ms = 30000
"#,
        )
        .unwrap();

        // 環境変数が TOML の値より優先される
        unsafe {
            std::env::set_var("RUNNER_SHELL", "sh");
            std::env::set_var("RUNNER_TIMEOUT_MS", "5000");
        }

        let config = Config::from_toml_file(&path).unwrap();
        assert_eq!(config.runner.shell, "sh");
        assert_eq!(config.runner.timeout_ms, 5000);

        unsafe {
            std::env::remove_var("RUNNER_SHELL");
            std::env::remove_var("RUNNER_TIMEOUT_MS");
        }
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = Config::from_toml_file("/nonexistent/cronwork.toml").unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cronwork.toml");
        std::fs::write(&path, "not toml [").unwrap();

        let err = Config::from_toml_file(&path).unwrap_err();
        assert!(matches!(err, crate::Error::TomlParse(_)));
    }

    #[test]
    fn test_from_toml_config_defaults() {
        let toml_config: TomlConfig = toml::from_str("").unwrap();
        let config = Config::from_toml_config(toml_config);

        assert!(config.scheduler.enabled);
        assert!(config.scheduler.config_path.is_none());
        assert_eq!(config.runner.shell, "bash");
        assert_eq!(config.runner.timeout_ms, 120_000);
    }
}
