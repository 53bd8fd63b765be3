use anyhow::{Context as _, Result};
use serenity::async_trait;

use crate::api::{ApiRequest, ApiResponse, Method};

/// APIリクエストの送信先
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// リクエストを送信し、レスポンスのJSONをパースして返す
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// reqwestによる送信
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// コンストラクタ
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のクライアントを使う
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApiTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        // APIリクエストを構築
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            let body = serde_json::to_vec(body).context("リクエストボディの変換に失敗")?;
            builder = builder.body(body);
        }

        // APIリクエストを実行
        let response = builder
            .send()
            .await
            .with_context(|| format!("APIリクエストに失敗: {}", request.url))?;
        // 結果はステータスではなくボディのcodeで判断するので、ステータスは見ない
        let response = response
            .json::<ApiResponse>()
            .await
            .with_context(|| format!("APIレスポンスのパースに失敗: {}", request.url))?;
        Ok(response)
    }
}
