//! Invoker - 型消去された handler 呼び出し戦略
//!
//! # 学習ポイント
//! - 単相化された関数ポインタ (`fn() -> Invoker`) で具体型を運ぶ
//! - 「外側は型消去、内側は具体型」: downcast は境界で一度だけ
//! - handler の解決は呼び出しのたびに行う（Invoker は handler を保持しない）

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::erased::{BoxFuture, Payload, Response, downcast_instance, downcast_payload};
use crate::domain::errors::{BoxError, MediatorError};
use crate::domain::identity::{Capability, HandlerKey, MessageType};
use crate::ports::{Invoker, Resolver};
use crate::typed::handler::RequestHandler;
use crate::typed::message::{Notification, Request, handler_key};

/// request 型 `R` の Invoker を構築する
///
/// 生成された Invoker は何度呼んでもよく、呼び出し間で状態を共有しません。
pub fn build_invoker<R: Request>() -> Invoker {
    Arc::new(
        |resolver: Arc<dyn Resolver>,
         payload: Payload,
         cancel: CancellationToken|
         -> BoxFuture<'static, Result<Response, BoxError>> { Box::pin(invoke::<R>(resolver, payload, cancel)) },
    )
}

async fn invoke<R: Request>(
    resolver: Arc<dyn Resolver>,
    payload: Payload,
    cancel: CancellationToken,
) -> Result<Response, BoxError> {
    let key = handler_key::<R>();
    let instance = resolver
        .resolve_one(&Capability::handler(key))
        .ok_or(MediatorError::HandlerNotFound { request: key.request })?;
    let handler = downcast_instance::<Arc<dyn RequestHandler<R>>>(instance.as_ref())?;
    let request = downcast_payload::<R>(payload)?;

    let response = handler.handle(&request, &cancel).await?;
    Ok(Box::new(response))
}

/// ErasedRequest は型消去された request
///
/// 具体型を知る Invoker の構築関数を一緒に運ぶので、
/// 受け取った側は `R` を知らなくても dispatch できます。
pub struct ErasedRequest {
    key: HandlerKey,
    payload: Payload,
    build: fn() -> Invoker,
}

impl ErasedRequest {
    pub fn new<R: Request>(request: R) -> Self {
        Self {
            key: handler_key::<R>(),
            payload: Arc::new(request),
            build: build_invoker::<R>,
        }
    }

    pub fn key(&self) -> HandlerKey {
        self.key
    }

    pub(crate) fn into_parts(self) -> (Payload, fn() -> Invoker) {
        (self.payload, self.build)
    }
}

/// ErasedNotification は型消去された notification
pub struct ErasedNotification {
    notification: MessageType,
    payload: Payload,
}

impl ErasedNotification {
    pub fn new<N: Notification>(notification: N) -> Self {
        Self {
            notification: MessageType::of::<N>(),
            payload: Arc::new(notification),
        }
    }

    pub fn notification_type(&self) -> MessageType {
        self.notification
    }

    pub(crate) fn into_payload(self) -> Payload {
        self.payload
    }
}
