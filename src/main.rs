use std::sync::Arc;

use anyhow::{Context as _, Result};
use log::{error, info, warn};
use serenity::prelude::*;
use tokio::runtime::Handle;
use tokio::sync::watch;

use koreanbots_reporter::app_config::AppConfig;
use koreanbots_reporter::event_handler::Handler;
use koreanbots_reporter::{
    LoopExit, ReporterOptions, ReqwestTransport, SerenityHost, StatsReporter,
};

#[tokio::main]
async fn main() -> Result<()> {
    // ログ設定を読み込む
    log4rs::init_file("log4rs.yml", Default::default()).context("ログ設定の読み込みに失敗")?;

    // 設定を読み込む
    let app_config = AppConfig::load_config()?;

    // クライアントを作成
    let (ready_tx, ready_rx) = watch::channel(false);
    let handler = Handler::new(ready_tx);
    let mut client = Client::builder(&app_config.discord.token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await
        .context("クライアントの作成に失敗")?;

    // レポーターを起動
    let host = Arc::new(SerenityHost::new(
        client.cache_and_http.cache.clone(),
        ready_rx,
    ));
    let mut reporter = StatsReporter::new(
        &Handle::current(),
        host.clone(),
        Arc::new(ReqwestTransport::new()),
        app_config.koreanbots.token.clone(),
        ReporterOptions::from(&app_config.koreanbots),
    );

    // Ctrl+Cで終了
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(why) = tokio::signal::ctrl_c().await {
            error!("Ctrl+Cの待ち受けに失敗: {:?}", why);
            return;
        }
        shard_manager.lock().await.shutdown_all().await;
    });

    // start listening for events by starting a single shard
    if let Err(why) = client.start().await {
        error!("クライアントの実行中にエラーが発生: {:?}", why);
    }

    // レポーターを停止
    host.close();
    match reporter.shutdown().await {
        Ok(LoopExit::BootstrapFailed { code, message }) => {
            warn!("定期更新は起動時に中止されていました (code: {}): {}", code, message)
        }
        Ok(exit) => info!("定期更新を停止しました: {:?}", exit),
        Err(why) => error!("定期更新タスクが異常終了していました: {:?}", why),
    }
    info!("終了しました");

    Ok(())
}
