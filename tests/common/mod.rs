#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use log::{Level, LevelFilter, Log, Metadata, Record};

use anyhow::{anyhow, Result};
use serenity::async_trait;
use tokio::sync::watch;

use koreanbots_reporter::api::{ApiRequest, ApiResponse, BotData, Method};
use koreanbots_reporter::host::wait_for_flag;
use koreanbots_reporter::{ApiTransport, BotHost};

pub const BOT_ID: u64 = 1234;

/// テスト用のBot
pub struct FakeHost {
    guilds: AtomicU64,
    closed: AtomicBool,
    ready_tx: watch::Sender<bool>,
    ready_rx: watch::Receiver<bool>,
}

impl FakeHost {
    pub fn new(guilds: u64) -> Arc<Self> {
        let (ready_tx, ready_rx) = watch::channel(false);
        Arc::new(Self {
            guilds: AtomicU64::new(guilds),
            closed: AtomicBool::new(false),
            ready_tx,
            ready_rx,
        })
    }

    pub fn set_ready(&self) {
        self.ready_tx.send(true).unwrap();
    }

    pub fn set_guilds(&self, guilds: u64) {
        self.guilds.store(guilds, Ordering::SeqCst);
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl BotHost for FakeHost {
    async fn wait_ready(&self) {
        wait_for_flag(&self.ready_rx).await;
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn guild_count(&self) -> u64 {
        self.guilds.load(Ordering::SeqCst)
    }

    fn bot_id(&self) -> u64 {
        BOT_ID
    }
}

/// 送信したリクエストを記録し、用意したレスポンスを返す
#[derive(Default)]
pub struct FakeTransport {
    requests: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: Result<ApiResponse>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_code(&self, code: u16, message: Option<&str>) {
        self.push(Ok(response(code, message)));
    }

    pub fn push_bot(&self, servers: u64) {
        self.push(Ok(ApiResponse {
            code: 200,
            message: None,
            data: Some(BotData { servers }),
        }));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.method == method)
            .count()
    }
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no response queued for {}", request.url)))
    }
}

pub fn response(code: u16, message: Option<&str>) -> ApiResponse {
    ApiResponse {
        code,
        message: message.map(str::to_string),
        data: None,
    }
}

/// 起動済みのタスクを先に進める
///
/// 時間を止めたテストで使う。タスクが次のタイマーで止まるまで動いてから戻ってくる
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

thread_local! {
    /// このスレッドで出力されたログ
    static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

/// ログを記録するロガー
///
/// `#[tokio::test]` はテストごとのスレッドで動くので、スレッド単位で記録すれば他のテストと混ざらない
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with("koreanbots_reporter")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            RECORDS.with(|records| {
                records
                    .borrow_mut()
                    .push((record.level(), record.args().to_string()))
            });
        }
    }

    fn flush(&self) {}
}

/// ロガーを登録し、このスレッドの記録を空にする
pub fn init_logger() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_boxed_logger(Box::new(CaptureLogger)).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

/// 指定したレベルで、すべての文字列を含むログがあるかどうか
pub fn logged(level: Level, needles: &[&str]) -> bool {
    RECORDS.with(|records| {
        records.borrow().iter().any(|(record_level, message)| {
            *record_level == level && needles.iter().all(|needle| message.contains(needle))
        })
    })
}
