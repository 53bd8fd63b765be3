use serde::{Deserialize, Serialize};

/// V1 APIのエンドポイント
pub const BASE_URL_V1: &str = "https://api.koreanbots.dev/v1/bots/servers";
/// V2 APIのベースURL (末尾にBotのIDを付ける)
pub const BASE_URL_V2: &str = "https://api.koreanbots.dev/v2/bots/";

/// KoreanBots APIのバージョン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// 旧API (現在のサーバー数を取得できない)
    V1,
    /// 現行API
    #[default]
    V2,
}

impl ApiVersion {
    /// バージョンに対応するベースURL
    pub fn base_url(self) -> &'static str {
        match self {
            ApiVersion::V1 => BASE_URL_V1,
            ApiVersion::V2 => BASE_URL_V2,
        }
    }

    /// 認証トークンを載せるヘッダー名
    pub fn auth_header(self) -> &'static str {
        match self {
            ApiVersion::V1 => "token",
            ApiVersion::V2 => "Authorization",
        }
    }
}

/// HTTPメソッド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// サーバー数送信のリクエストボディ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsBody {
    /// サーバー数
    pub servers: u64,
}

/// APIリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<StatsBody>,
}

impl ApiRequest {
    /// サーバー数を送信するリクエストを組み立てる
    pub fn post_stats(
        version: ApiVersion,
        base_url: &str,
        bot_id: u64,
        token: &str,
        servers: u64,
    ) -> ApiRequest {
        let url = match version {
            ApiVersion::V1 => base_url.to_string(),
            ApiVersion::V2 => format!("{}{}/stats", base_url, bot_id),
        };
        ApiRequest {
            method: Method::Post,
            url,
            headers: vec![
                (version.auth_header().to_string(), token.to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(StatsBody { servers }),
        }
    }

    /// Botの情報を取得するリクエストを組み立てる (V2のみ)
    pub fn get_bot(base_url: &str, bot_id: u64) -> ApiRequest {
        ApiRequest {
            method: Method::Get,
            url: format!("{}{}", base_url, bot_id),
            headers: Vec::new(),
            body: None,
        }
    }

    /// ヘッダーの値を取得する
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Bot情報
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotData {
    /// 登録されているサーバー数
    pub servers: u64,
}

/// APIレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiResponse {
    /// 結果コード (HTTPステータスとは別にボディに入っている)
    pub code: u16,
    /// エラーメッセージ
    #[serde(default)]
    pub message: Option<String>,
    /// Bot情報 (GETのみ)
    #[serde(default)]
    pub data: Option<BotData>,
}

impl ApiResponse {
    /// ログ用のメッセージ
    pub fn message_or_empty(&self) -> &str {
        self.message.as_deref().unwrap_or("")
    }
}
