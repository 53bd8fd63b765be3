use log::{debug, info, warn};
use serenity::async_trait;
use serenity::model::gateway::Ready;
use serenity::model::guild::{Guild, UnavailableGuild};
use serenity::model::id::GuildId;
use serenity::prelude::*;
use tokio::sync::watch;

/// イベント受信リスナー
pub struct Handler {
    /// 準備完了フラグ
    ready: watch::Sender<bool>,
}

impl Handler {
    /// コンストラクタ
    pub fn new(ready: watch::Sender<bool>) -> Self {
        Self { ready }
    }

    /// ゲートウェイに接続した
    ///
    /// この時点ではサーバーの情報はまだ届いていないので、レポーターには通知しない
    fn on_ready(&self, user_name: &str) {
        info!("Bot準備完了: {}", user_name);
    }

    /// 全サーバーの情報がキャッシュに揃った
    fn on_cache_ready(&self, guilds: usize) {
        info!("キャッシュ準備完了 (サーバー数: {})", guilds);

        // レポーターに通知
        if self.ready.send(true).is_err() {
            warn!("準備完了を通知する相手がいません");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// 準備完了時に呼ばれる
    async fn ready(&self, _ctx: Context, data_about_bot: Ready) {
        self.on_ready(&data_about_bot.user.name);
    }

    /// READYで通知された全サーバーを受信し終えた時に呼ばれる
    async fn cache_ready(&self, _ctx: Context, guilds: Vec<GuildId>) {
        self.on_cache_ready(guilds.len());
    }

    /// サーバーに参加した時に呼ばれる
    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: bool) {
        if is_new {
            debug!(
                "サーバーに参加しました: {} (サーバー数: {})",
                guild.id,
                ctx.cache.guilds().len()
            );
        }
    }

    /// サーバーから退出した時に呼ばれる
    async fn guild_delete(&self, ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        debug!(
            "サーバーから退出しました: {} (サーバー数: {})",
            incomplete.id,
            ctx.cache.guilds().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_ready_does_not_signal() {
        let (tx, rx) = watch::channel(false);
        let handler = Handler::new(tx);

        handler.on_ready("bot");
        assert!(!*rx.borrow());
    }

    #[test]
    fn cache_ready_signals() {
        let (tx, rx) = watch::channel(false);
        let handler = Handler::new(tx);

        handler.on_ready("bot");
        handler.on_cache_ready(3);
        assert!(*rx.borrow());
    }
}
