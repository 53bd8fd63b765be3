use anyhow::{Context as _, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, FileFormat};

use crate::api::ApiVersion;

/// Discordの設定
#[derive(Debug, Default, serde::Deserialize, PartialEq, Clone)]
pub struct DiscordConfig {
    /// Botのトークン
    pub token: String,
}

/// KoreanBotsの設定
#[derive(Debug, serde::Deserialize, PartialEq, Clone)]
pub struct KoreanbotsConfig {
    /// KoreanBotsのトークン
    pub token: String,
    /// 使用するAPIのバージョン ("v1" または "v2")
    #[serde(default)]
    pub api_version: ApiVersion,
    /// 定期更新タスクを起動するかどうか
    #[serde(default = "default_run_update")]
    pub run_update: bool,
    /// 更新間隔の秒数
    #[serde(default = "default_interval_sec")]
    pub interval_sec: u64,
    /// ベースURLの上書き
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_run_update() -> bool {
    true
}

fn default_interval_sec() -> u64 {
    60
}

/// アプリケーションの設定
#[derive(Debug, serde::Deserialize, PartialEq, Clone)]
pub struct AppConfig {
    /// Discordの設定
    pub discord: DiscordConfig,
    /// KoreanBotsの設定
    pub koreanbots: KoreanbotsConfig,
}

impl AppConfig {
    /// 設定を読み込む
    pub fn load_config() -> Result<AppConfig> {
        // 設定ファイルを読み込む
        let config = Self::with_env(
            // ファイルが無くても環境変数だけで動かせるようにする
            Config::builder().add_source(config::File::with_name("config.toml").required(false)),
        )
        .build()
        .context("設定の読み込みに失敗")?;
        Self::parse(config)
    }

    /// 文字列から設定を読み込む
    pub fn from_toml(toml: &str) -> Result<AppConfig> {
        let config = Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .context("設定の読み込みに失敗")?;
        Self::parse(config)
    }

    // 環境変数を追加
    // Eg.. `APP_KOREANBOTS__TOKEN=xxx ./target/app` would set the `koreanbots.token` key
    fn with_env(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(config::Environment::with_prefix("APP").separator("__"))
    }

    // 設定をパース
    fn parse(config: Config) -> Result<AppConfig> {
        let app_config = config
            .try_deserialize::<AppConfig>()
            .context("設定ファイルのパースに失敗")?;
        Ok(app_config)
    }
}
