//! Handler traits - request handler と notification listener の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (RequestHandler<R>, NotificationHandler<N>)
//! - Object-safe trait (DynListener)
//! - Type erasure パターン (TypedListener<N, L> → DynListener)
//!
//! request handler は `Arc<dyn RequestHandler<R>>` のまま registry に格納し、
//! Invoker（`app::invoker`）が具体型を知った状態で呼び出します。
//! listener は publish 側が型を知らなくても呼べるように DynListener に変換します。

use std::marker::PhantomData;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::message::{Notification, Request};
use crate::domain::erased::{Payload, downcast_payload};
use crate::domain::errors::BoxError;
use crate::domain::identity::MessageType;

/// RequestHandler は request を処理して response を返す
///
/// # 使用例
/// ```ignore
/// struct GetBalanceHandler {
///     accounts: Arc<Accounts>,
/// }
///
/// #[async_trait]
/// impl RequestHandler<GetBalance> for GetBalanceHandler {
///     async fn handle(&self, request: &GetBalance, _cancel: &CancellationToken) -> Result<u64, BoxError> {
///         Ok(self.accounts.balance(request.account)?)
///     }
/// }
/// ```
///
/// request 型ごとに登録できる handler は 1 つだけです。
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    async fn handle(&self, request: &R, cancel: &CancellationToken) -> Result<R::Response, BoxError>;
}

/// NotificationHandler は notification に反応して副作用を起こす
///
/// 同じ notification 型に複数登録でき、登録順に 1 つずつ呼ばれます。
#[async_trait]
pub trait NotificationHandler<N: Notification>: Send + Sync {
    async fn handle(&self, notification: &N, cancel: &CancellationToken) -> Result<(), BoxError>;
}

/// DynListener は object-safe な NotificationHandler の抽象化
#[async_trait]
pub trait DynListener: Send + Sync {
    async fn handle_dyn(&self, notification: Payload, cancel: CancellationToken) -> Result<(), BoxError>;
    fn notification_type(&self) -> MessageType;
}

pub struct TypedListener<N: Notification, L: NotificationHandler<N>> {
    listener: L,
    _marker: PhantomData<N>,
}

impl<N: Notification, L: NotificationHandler<N>> TypedListener<N, L> {
    pub fn new(listener: L) -> Self {
        Self {
            listener,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<N: Notification, L: NotificationHandler<N>> DynListener for TypedListener<N, L> {
    async fn handle_dyn(&self, notification: Payload, cancel: CancellationToken) -> Result<(), BoxError> {
        let notification = downcast_payload::<N>(notification)?;
        self.listener.handle(&notification, &cancel).await
    }

    fn notification_type(&self) -> MessageType {
        MessageType::of::<N>()
    }
}
