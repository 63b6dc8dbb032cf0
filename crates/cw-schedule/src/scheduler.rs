//! スケジューラー
//!
//! cron ルールに基づいてジョブを実行します。

use crate::config::{JobSpec, JobsConfig};
use crate::error::Result;
use crate::runner::JobRunner;
use chrono::{DateTime, Utc};
use cron::Schedule as CronSchedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// スケジューラーのハンドル
pub struct SchedulerHandle {
    /// スケジューラータスクの終了送信
    shutdown_tx: broadcast::Sender<()>,
    /// 実行中のタスクハンドル
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// スケジューラーを停止
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

/// スケジューラー
pub struct Scheduler {
    config: JobsConfig,
    runner: Arc<dyn JobRunner>,
}

impl Scheduler {
    /// 新しいスケジューラーを作成
    pub fn new(config: JobsConfig, runner: Arc<dyn JobRunner>) -> Self {
        Self { config, runner }
    }

    /// スケジューラーを開始
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let shutdown_tx_clone = shutdown_tx.clone();

        let handle = tokio::spawn(async move {
            info!("スケジューラーを開始しました ({} ジョブ)", self.config.jobs.len());

            // 各ジョブを別々のタスクで実行
            let mut job_handles = Vec::new();

            for job in self.config.enabled_jobs() {
                let job = job.clone();
                let runner = Arc::clone(&self.runner);
                let mut rx = shutdown_rx.resubscribe();

                let handle = tokio::spawn(async move {
                    run_job(job, runner, &mut rx).await;
                });

                job_handles.push(handle);
            }

            // 全ジョブが終了するまで待機
            for handle in job_handles {
                let _ = handle.await;
            }

            info!("スケジューラーを停止しました");
        });

        SchedulerHandle {
            shutdown_tx: shutdown_tx_clone,
            handle,
        }
    }
}

/// 個別のジョブを実行
async fn run_job(job: JobSpec, runner: Arc<dyn JobRunner>, shutdown_rx: &mut broadcast::Receiver<()>) {
    // cron ルールをパース
    let schedule = match parse_rule(&job.rule) {
        Ok(s) => s,
        Err(e) => {
            error!(job = %job.name, "ルールパースエラー: {}", e);
            return;
        }
    };

    info!(job = %job.name, rule = %job.rule, "ジョブを登録しました");

    loop {
        // 次の実行時刻を取得
        let now = Utc::now();
        let next = match schedule.upcoming(Utc).next() {
            Some(t) => t,
            None => {
                warn!(job = %job.name, "次の実行時刻を取得できません");
                break;
            }
        };

        let delay = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(
            job = %job.name,
            next = %next.format("%Y-%m-%d %H:%M:%S"),
            "次回実行まで待機中"
        );

        // 実行時刻まで待機（シャットダウン確認付き）
        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                // 実行時刻になった
                info!(job = %job.name, "Running job command per schedule");

                match runner.run(&job).await {
                    Ok(outcome) if outcome.success() => {
                        info!(job = %job.name, "ジョブ完了: {}", truncate(&outcome.stdout, 100));
                    }
                    Ok(outcome) => {
                        error!(job = %job.name, "ジョブ失敗: {}", truncate(&outcome.render(), 400));
                    }
                    Err(e) => {
                        error!(job = %job.name, "ジョブ実行エラー: {}", e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!(job = %job.name, "シャットダウン要求を受信");
                break;
            }
        }
    }
}

/// cron ルールをパース
///
/// node-schedule 互換の 5 フィールド形式 ("分 時 日 月 曜日") は
/// 秒フィールド "0" を先頭に補って cron クレートの形式に正規化します。
/// 6/7 フィールド形式はそのまま渡します。
pub fn parse_rule(rule: &str) -> Result<CronSchedule> {
    let field_count = rule.split_whitespace().count();
    let normalized = if field_count == 5 {
        format!("0 {}", rule)
    } else {
        rule.to_string()
    };

    let schedule = CronSchedule::from_str(&normalized)?;
    Ok(schedule)
}

/// ルールの次回発火時刻を返す
pub fn next_occurrence(rule: &str) -> Result<Option<DateTime<Utc>>> {
    let schedule = parse_rule(rule)?;
    Ok(schedule.upcoming(Utc).next())
}

/// 文字列を切り詰め
///
/// コマンド出力は任意のバイト列になり得るため、文字境界まで戻ってから切ります。
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
