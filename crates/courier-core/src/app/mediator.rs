//! Mediator - send / execute / publish の dispatch core
//!
//! # 学習ポイント
//! - 呼び出しごとの状態を持たない（共有されるのは cache だけ）
//! - `Arc<dyn Trait>` で resolver と cache を差し替え可能にする
//! - エラーは包まず、そのまま呼び出し元へ返す
//!
//! # send のフロー
//! 1. request が無ければ InvalidArgument（解決処理より前）
//! 2. (request 型, response 型) のキーを作る
//! 3. InvokerCache から Invoker を取得（初回だけ構築）
//! 4. PipelineComposer で behavior を合成
//! 5. 合成した pipeline を 1 回だけ実行
//!
//! # publish のフロー
//! listener を登録順に 1 つずつ await し、最初の失敗で残りを打ち切ります。

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::builder::MediatorBuilder;
use super::invoker::{ErasedNotification, ErasedRequest};
use super::pipeline::{Operation, PipelineComposer};
use crate::domain::erased::{BoxFuture, Payload, Response, downcast_instance, downcast_response};
use crate::domain::errors::{BoxError, MediatorError};
use crate::domain::identity::Capability;
use crate::impls::ConcurrentInvokerCache;
use crate::ports::{InvokerCache, Resolver};
use crate::typed::handler::DynListener;
use crate::typed::message::{Command, Notification, Request};

/// Mediator は request を handler に、notification を listener に届ける
///
/// clone は安価で、clone 同士は cache を共有します。
#[derive(Clone)]
pub struct Mediator {
    resolver: Arc<dyn Resolver>,
    invokers: Arc<dyn InvokerCache>,
    composer: Arc<PipelineComposer>,
}

impl Mediator {
    /// デフォルトの `ConcurrentInvokerCache` で Mediator を作る
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self::with_parts(resolver, Arc::new(ConcurrentInvokerCache::new()))
    }

    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    pub(crate) fn with_parts(resolver: Arc<dyn Resolver>, invokers: Arc<dyn InvokerCache>) -> Self {
        Self {
            resolver,
            invokers,
            composer: Arc::new(PipelineComposer::new()),
        }
    }

    pub fn invoker_cache(&self) -> &Arc<dyn InvokerCache> {
        &self.invokers
    }

    /// request を唯一の handler に送り、response を返す
    pub async fn send<R: Request>(&self, request: R, cancel: &CancellationToken) -> Result<R::Response, MediatorError> {
        let response = self.send_erased(Some(ErasedRequest::new(request)), cancel).await?;
        downcast_response::<R::Response>(response)
    }

    /// 結果を返さない request を送る
    pub async fn execute<C: Command>(&self, command: C, cancel: &CancellationToken) -> Result<(), MediatorError> {
        self.send(command, cancel).await
    }

    /// notification を登録済みの全 listener に配信する
    pub async fn publish<N: Notification>(&self, notification: N, cancel: &CancellationToken) -> Result<(), MediatorError> {
        self.publish_erased(Some(ErasedNotification::new(notification)), cancel)
            .await
    }

    /// 型消去された request を送る
    ///
    /// # Errors
    /// - `None` は InvalidArgument（resolver には触れない）
    /// - handler が無ければ HandlerNotFound
    /// - handler / behavior のエラーは Downstream
    pub async fn send_erased(
        &self,
        request: Option<ErasedRequest>,
        cancel: &CancellationToken,
    ) -> Result<Response, MediatorError> {
        let request = request.ok_or(MediatorError::InvalidArgument("request"))?;
        let key = request.key();
        let (payload, build) = request.into_parts();

        let invoker = self.invokers.get_or_build(key, &build);
        let resolver = Arc::clone(&self.resolver);
        let base: Operation = Arc::new(
            move |payload: Payload, cancel: CancellationToken| -> BoxFuture<'static, Result<Response, BoxError>> {
                invoker(Arc::clone(&resolver), payload, cancel)
            },
        );

        let pipeline = self.composer.compose(self.resolver.as_ref(), key, base)?;
        pipeline(payload, cancel.clone())
            .await
            .map_err(MediatorError::from_boxed)
    }

    /// 型消去された notification を配信する
    ///
    /// listener が 0 個なら何もせずに成功します。
    pub async fn publish_erased(
        &self,
        notification: Option<ErasedNotification>,
        cancel: &CancellationToken,
    ) -> Result<(), MediatorError> {
        let notification = notification.ok_or(MediatorError::InvalidArgument("notification"))?;
        let notification_type = notification.notification_type();
        let payload = notification.into_payload();

        let listeners = self.resolver.resolve_many(&Capability::listener(notification_type));
        debug!(notification = %notification_type, listeners = listeners.len(), "publishing");

        for instance in listeners {
            let listener = downcast_instance::<Arc<dyn DynListener>>(instance.as_ref())?;
            listener
                .handle_dyn(Arc::clone(&payload), cancel.clone())
                .await
                .map_err(MediatorError::from_boxed)?;
        }
        Ok(())
    }
}

/// Sender は request を送る能力
///
/// 具体的な Mediator ではなくこの trait に依存させると、テストで差し替えられます。
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send<R: Request>(&self, request: R, cancel: &CancellationToken) -> Result<R::Response, MediatorError>;

    async fn execute<C: Command>(&self, command: C, cancel: &CancellationToken) -> Result<(), MediatorError>;
}

/// Publisher は notification を配信する能力
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish<N: Notification>(&self, notification: N, cancel: &CancellationToken) -> Result<(), MediatorError>;
}

#[async_trait]
impl Sender for Mediator {
    async fn send<R: Request>(&self, request: R, cancel: &CancellationToken) -> Result<R::Response, MediatorError> {
        Mediator::send(self, request, cancel).await
    }

    async fn execute<C: Command>(&self, command: C, cancel: &CancellationToken) -> Result<(), MediatorError> {
        Mediator::execute(self, command, cancel).await
    }
}

#[async_trait]
impl Publisher for Mediator {
    async fn publish<N: Notification>(&self, notification: N, cancel: &CancellationToken) -> Result<(), MediatorError> {
        Mediator::publish(self, notification, cancel).await
    }
}
