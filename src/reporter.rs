use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use futures::lock::Mutex;
use log::{debug, error, info};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::api::{ApiRequest, ApiVersion};
use crate::app_config::KoreanbotsConfig;
use crate::host::BotHost;
use crate::transport::ApiTransport;

/// 更新間隔の既定値
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// レポーターの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterOptions {
    /// falseの場合は定期更新タスクを起動しない
    pub run_update: bool,
    /// 使用するAPIのバージョン
    pub api_version: ApiVersion,
    /// ベースURLの上書き (Noneならバージョンに対応するURL)
    pub base_url: Option<String>,
    /// 更新間隔
    pub interval: Duration,
}

impl Default for ReporterOptions {
    fn default() -> Self {
        Self {
            run_update: true,
            api_version: ApiVersion::V2,
            base_url: None,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl From<&KoreanbotsConfig> for ReporterOptions {
    fn from(config: &KoreanbotsConfig) -> Self {
        Self {
            run_update: config.run_update,
            api_version: config.api_version,
            base_url: config.base_url.clone(),
            interval: Duration::from_secs(config.interval_sec),
        }
    }
}

/// update() の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// サーバー数に変化がないので送信しなかった
    Unchanged,
    /// 送信に成功した
    Posted(u64),
    /// レート制限中だった
    RateLimited,
    /// APIがエラーを返した
    Rejected { code: u16, message: String },
}

/// 定期更新タスクの終了理由
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// Botが終了した
    Closed,
    /// 起動時のサーバー数取得に失敗したので更新を中止した
    BootstrapFailed { code: u16, message: String },
    /// タスクを起動していない
    Suppressed,
    /// タスクが中断された
    Aborted,
}

/// レポーターの状態
struct ReporterState {
    base_url: String,
    api_version: ApiVersion,
    auth_token: String,
    /// APIが最後に受け付けたサーバー数
    last_reported_count: Mutex<u64>,
}

struct Inner {
    host: Arc<dyn BotHost>,
    transport: Arc<dyn ApiTransport>,
    state: ReporterState,
    interval: Duration,
}

/// KoreanBotsにサーバー数を送信するクラス
pub struct StatsReporter {
    inner: Arc<Inner>,
    /// 定期更新タスク
    task: Option<JoinHandle<Result<LoopExit>>>,
}

impl StatsReporter {
    /// コンストラクタ
    ///
    /// `run_update` が有効なら、定期更新タスクを `runtime` 上で起動する
    pub fn new(
        runtime: &Handle,
        host: Arc<dyn BotHost>,
        transport: Arc<dyn ApiTransport>,
        token: impl Into<String>,
        options: ReporterOptions,
    ) -> Self {
        let base_url = options
            .base_url
            .unwrap_or_else(|| options.api_version.base_url().to_string());
        let inner = Arc::new(Inner {
            host,
            transport,
            state: ReporterState {
                base_url,
                api_version: options.api_version,
                auth_token: token.into(),
                last_reported_count: Mutex::new(0),
            },
            interval: options.interval,
        });

        let task = options
            .run_update
            .then(|| runtime.spawn(Inner::run(inner.clone())));

        Self { inner, task }
    }

    /// 現在のサーバー数を送信する (前回と同じなら何もしない)
    pub async fn update(&self) -> Result<UpdateOutcome> {
        self.inner.update().await
    }

    /// APIが最後に受け付けたサーバー数
    pub async fn last_reported_count(&self) -> u64 {
        *self.inner.state.last_reported_count.lock().await
    }

    /// 定期更新タスクが動いているかどうか
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map_or(false, |task| !task.is_finished())
    }

    /// 定期更新タスクを中断する
    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// 定期更新タスクを中断して終了理由を返す
    ///
    /// すでに終了していた場合はその結果を返す
    pub async fn shutdown(&mut self) -> Result<LoopExit> {
        self.abort();
        self.join().await
    }

    /// 定期更新タスクの終了を待つ
    pub async fn join(&mut self) -> Result<LoopExit> {
        let task = match self.task.take() {
            Some(task) => task,
            None => return Ok(LoopExit::Suppressed),
        };
        match task.await {
            Ok(result) => result,
            Err(why) if why.is_cancelled() => Ok(LoopExit::Aborted),
            Err(why) => Err(anyhow!(why)).context("定期更新タスクが異常終了"),
        }
    }
}

impl Inner {
    async fn update(&self) -> Result<UpdateOutcome> {
        debug!("サーバー数を送信します");
        let servers = self.host.guild_count();
        if *self.state.last_reported_count.lock().await == servers {
            debug!("サーバー数に変化がないため送信を中止しました");
            return Ok(UpdateOutcome::Unchanged);
        }

        let request = ApiRequest::post_stats(
            self.state.api_version,
            &self.state.base_url,
            self.host.bot_id(),
            &self.state.auth_token,
            servers,
        );
        let response = self
            .transport
            .send(&request)
            .await
            .context("サーバー数の送信に失敗")?;

        match response.code {
            200 => {
                *self.state.last_reported_count.lock().await = servers;
                info!("サーバー数の送信に成功しました: {}", servers);
                Ok(UpdateOutcome::Posted(servers))
            }
            429 => {
                debug!(
                    "レート制限中のため送信をスキップしました: {}",
                    response.message_or_empty()
                );
                Ok(UpdateOutcome::RateLimited)
            }
            code => {
                error!(
                    "サーバー数の送信に失敗しました (code: {}): {}",
                    code,
                    response.message_or_empty()
                );
                Ok(UpdateOutcome::Rejected {
                    code,
                    message: response.message_or_empty().to_string(),
                })
            }
        }
    }

    /// 定期更新タスク
    async fn run(self: Arc<Self>) -> Result<LoopExit> {
        // Botの準備完了を待つ
        self.host.wait_ready().await;

        // 前回送信したサーバー数を取得
        match self.state.api_version {
            ApiVersion::V1 => {
                info!("V1 APIを使用するため、現在のサーバー数の取得をスキップします");
            }
            ApiVersion::V2 => {
                let request = ApiRequest::get_bot(&self.state.base_url, self.host.bot_id());
                let response = self
                    .transport
                    .send(&request)
                    .await
                    .context("KoreanBotsからのサーバー数の取得に失敗")?;
                if response.code != 200 {
                    error!(
                        "KoreanBotsからのサーバー数の取得に失敗したため、定期更新を中止します (code: {}): {}",
                        response.code,
                        response.message_or_empty()
                    );
                    return Ok(LoopExit::BootstrapFailed {
                        code: response.code,
                        message: response.message_or_empty().to_string(),
                    });
                }
                let servers = response
                    .data
                    .map(|data| data.servers)
                    .context("KoreanBotsのレスポンスにサーバー数がありません")?;
                *self.state.last_reported_count.lock().await = servers;
                debug!("KoreanBotsからサーバー数を取得しました: {}", servers);
            }
        }

        // Botが終了するまで一定間隔で送信
        while !self.host.is_closed() {
            self.update().await?;
            sleep(self.interval).await;
        }
        debug!("Botが終了したため定期更新を終了します");

        Ok(LoopExit::Closed)
    }
}
