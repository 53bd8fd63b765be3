use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::async_trait;
use serenity::cache::Cache;
use tokio::sync::watch;

/// レポーターが必要とするBot側の機能
#[async_trait]
pub trait BotHost: Send + Sync {
    /// Botの準備が完了するまで待つ
    async fn wait_ready(&self);
    /// Botが終了しているかどうか
    fn is_closed(&self) -> bool;
    /// 参加しているサーバー数
    fn guild_count(&self) -> u64;
    /// BotのユーザーID
    fn bot_id(&self) -> u64;
}

/// 準備完了フラグを待つ
///
/// 送信側が破棄された場合は準備完了にならないので、そのまま待ち続ける
pub async fn wait_for_flag(flag: &watch::Receiver<bool>) {
    let mut flag = flag.clone();
    while !*flag.borrow() {
        if flag.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}

/// serenityのキャッシュを使った実装
pub struct SerenityHost {
    /// serenityのキャッシュ
    cache: Arc<Cache>,
    /// 準備完了フラグ (イベントハンドラーが立てる)
    ready: watch::Receiver<bool>,
    /// 終了フラグ
    closed: AtomicBool,
}

impl SerenityHost {
    /// コンストラクタ
    pub fn new(cache: Arc<Cache>, ready: watch::Receiver<bool>) -> Self {
        Self {
            cache,
            ready,
            closed: AtomicBool::new(false),
        }
    }

    /// クライアントが停止したことを記録する
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BotHost for SerenityHost {
    async fn wait_ready(&self) {
        wait_for_flag(&self.ready).await;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn guild_count(&self) -> u64 {
        // 障害中で unavailable になっているサーバーも数える
        self.cache.guilds().len() as u64
    }

    fn bot_id(&self) -> u64 {
        self.cache.current_user_id().0
    }
}
