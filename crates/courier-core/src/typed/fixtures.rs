//! テスト用のメッセージと handler

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::behavior::{ErasedNext, Next, OpenBehavior, OpenRequest, PipelineBehavior};
use super::handler::{NotificationHandler, RequestHandler};
use super::message::{Notification, Request};
use crate::domain::erased::Response;
use crate::domain::errors::BoxError;

/// 実行順を記録する共有ログ
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("boom: {0}")]
pub struct Boom(pub &'static str);

// ---- requests ----

pub struct Greet {
    pub name: String,
}

impl Request for Greet {
    type Response = String;
}

pub struct GreetHandler;

#[async_trait]
impl RequestHandler<Greet> for GreetHandler {
    async fn handle(&self, request: &Greet, _cancel: &CancellationToken) -> Result<String, BoxError> {
        Ok(format!("Hello, {}", request.name))
    }
}

/// 固定の文字列を返す handler（pipeline の順序確認用）
pub struct Fixed(pub &'static str);

#[async_trait]
impl RequestHandler<Greet> for Fixed {
    async fn handle(&self, _request: &Greet, _cancel: &CancellationToken) -> Result<String, BoxError> {
        Ok(self.0.to_string())
    }
}

/// handler が登録されない request
pub struct Unhandled;

impl Request for Unhandled {
    type Response = u32;
}

/// 入力をそのまま返す
pub struct Echo(pub u64);

impl Request for Echo {
    type Response = u64;
}

pub struct EchoHandler;

#[async_trait]
impl RequestHandler<Echo> for EchoHandler {
    async fn handle(&self, request: &Echo, _cancel: &CancellationToken) -> Result<u64, BoxError> {
        tokio::task::yield_now().await;
        Ok(request.0)
    }
}

/// 生成回数を数える handler
pub struct Counted;

impl Request for Counted {
    type Response = usize;
}

pub struct CountedHandler {
    created: Arc<AtomicUsize>,
}

impl CountedHandler {
    pub fn new(created: Arc<AtomicUsize>) -> Self {
        created.fetch_add(1, Ordering::SeqCst);
        Self { created }
    }
}

#[async_trait]
impl RequestHandler<Counted> for CountedHandler {
    async fn handle(&self, _request: &Counted, _cancel: &CancellationToken) -> Result<usize, BoxError> {
        Ok(self.created.load(Ordering::SeqCst))
    }
}

/// 結果を返さない command
pub struct Reset;

impl Request for Reset {
    type Response = ();
}

pub struct ResetHandler(pub Journal);

#[async_trait]
impl RequestHandler<Reset> for ResetHandler {
    async fn handle(&self, _request: &Reset, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.0.push("reset");
        Ok(())
    }
}

/// 常に失敗する handler
pub struct Explode;

impl Request for Explode {
    type Response = ();
}

pub struct ExplodeHandler;

#[async_trait]
impl RequestHandler<Explode> for ExplodeHandler {
    async fn handle(&self, _request: &Explode, _cancel: &CancellationToken) -> Result<(), BoxError> {
        Err(Boom("handler").into())
    }
}

/// cancel されるまで待つ handler
pub struct Wait;

impl Request for Wait {
    type Response = &'static str;
}

pub struct WaitHandler;

#[async_trait]
impl RequestHandler<Wait> for WaitHandler {
    async fn handle(&self, _request: &Wait, cancel: &CancellationToken) -> Result<&'static str, BoxError> {
        cancel.cancelled().await;
        Ok("cancelled")
    }
}

// ---- notifications ----

pub struct Shipped {
    pub order: u32,
}

impl Notification for Shipped {}

pub struct Recorder {
    name: &'static str,
    journal: Journal,
}

impl Recorder {
    pub fn new(name: &'static str, journal: Journal) -> Self {
        Self { name, journal }
    }
}

#[async_trait]
impl NotificationHandler<Shipped> for Recorder {
    async fn handle(&self, notification: &Shipped, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.journal.push(format!("{}:{}", self.name, notification.order));
        Ok(())
    }
}

/// start と end の間で実行を譲る listener
pub struct SlowRecorder {
    name: &'static str,
    journal: Journal,
}

impl SlowRecorder {
    pub fn new(name: &'static str, journal: Journal) -> Self {
        Self { name, journal }
    }
}

#[async_trait]
impl NotificationHandler<Shipped> for SlowRecorder {
    async fn handle(&self, _notification: &Shipped, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.journal.push(format!("{}:start", self.name));
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        self.journal.push(format!("{}:end", self.name));
        Ok(())
    }
}

/// 記録した後に失敗する listener
pub struct Faulty {
    name: &'static str,
    journal: Journal,
}

impl Faulty {
    pub fn new(name: &'static str, journal: Journal) -> Self {
        Self { name, journal }
    }
}

#[async_trait]
impl NotificationHandler<Shipped> for Faulty {
    async fn handle(&self, _notification: &Shipped, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.journal.push(self.name);
        Err(Boom(self.name).into())
    }
}

// ---- behaviors ----

/// 前後に prefix を付ける behavior（"1" + inner + "1"）
pub struct Wrap(pub &'static str);

#[async_trait]
impl PipelineBehavior<Greet> for Wrap {
    async fn handle(&self, _request: &Greet, _cancel: &CancellationToken, next: Next<String>) -> Result<String, BoxError> {
        let inner = next.run().await?;
        Ok(format!("{}{}{}", self.0, inner, self.0))
    }
}

/// next を呼ばずに固定値を返す behavior
pub struct ShortCircuit(pub &'static str);

#[async_trait]
impl PipelineBehavior<Greet> for ShortCircuit {
    async fn handle(&self, _request: &Greet, _cancel: &CancellationToken, _next: Next<String>) -> Result<String, BoxError> {
        Ok(self.0.to_string())
    }
}

/// 全 request の前後を記録する open behavior
pub struct Tracer {
    name: &'static str,
    journal: Journal,
}

impl Tracer {
    pub fn new(name: &'static str, journal: Journal) -> Self {
        Self { name, journal }
    }
}

#[async_trait]
impl OpenBehavior for Tracer {
    async fn handle(
        &self,
        request: &OpenRequest,
        _cancel: &CancellationToken,
        next: ErasedNext,
    ) -> Result<Response, BoxError> {
        let short = request.key().request.short_name();
        match request.downcast_ref::<Greet>() {
            Some(greet) => self.journal.push(format!("{}:before:{}:{}", self.name, short, greet.name)),
            None => self.journal.push(format!("{}:before:{}", self.name, short)),
        }
        let response = next.run().await;
        self.journal.push(format!("{}:after:{}", self.name, short));
        response
    }
}
