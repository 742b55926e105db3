//! Pipeline behavior - handler の実行を包む interceptor
//!
//! # 学習ポイント
//! - Continuation-passing: behavior は「request + 続き (`Next`)」を受け取る
//! - 継承ではなく関数合成で decorator を組み立てる（合成は `app::pipeline`）
//! - TypedBehavior<R, B> → DynBehavior の type erasure（TypedListener と同じ形）
//!
//! # 2 種類の behavior
//! - `PipelineBehavior<R>`: 特定の request 型にだけ適用される
//! - `OpenBehavior`: 全ての request 型に適用される（ログ・計測など）
//!
//! `Next::run` を呼ばなければ以降の behavior と handler は実行されません（short-circuit）。
//! 2 回呼ぶと下流（handler を含む）がもう一度実行されます。core はこれを禁止しません。

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::message::Request;
use crate::domain::erased::{BoxFuture, Payload, Response, downcast_payload, downcast_response};
use crate::domain::errors::BoxError;
use crate::domain::identity::HandlerKey;

type Continuation<T> = dyn Fn() -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync;

/// Next は pipeline の「続き」
///
/// clone は安価で、何度でも `run` できます。
pub struct Next<T> {
    inner: Arc<Continuation<T>>,
}

/// 型消去された Next（OpenBehavior と pipeline 合成で使う）
pub type ErasedNext = Next<Response>;

impl<T: Send + 'static> Next<T> {
    pub fn new<F>(continuation: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, BoxError>> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(continuation),
        }
    }

    /// 下流の behavior と handler を実行する
    pub async fn run(&self) -> Result<T, BoxError> {
        (self.inner)().await
    }

    pub(crate) fn call(&self) -> BoxFuture<'static, Result<T, BoxError>> {
        (self.inner)()
    }
}

impl<T> Clone for Next<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ErasedNext {
    /// erased response を `T` に戻す Next に変換する
    pub fn typed<T: Send + 'static>(self) -> Next<T> {
        Next::new(move || Box::pin(run_typed::<T>(self.call())))
    }
}

async fn run_typed<T: Send + 'static>(
    erased: BoxFuture<'static, Result<Response, BoxError>>,
) -> Result<T, BoxError> {
    let response = erased.await?;
    Ok(downcast_response::<T>(response)?)
}

/// PipelineBehavior は特定の request 型の handler 実行を包む
///
/// # 使用例
/// ```ignore
/// struct RejectEmptyTitle;
///
/// #[async_trait]
/// impl PipelineBehavior<AddItem> for RejectEmptyTitle {
///     async fn handle(&self, request: &AddItem, _cancel: &CancellationToken, next: Next<ItemId>) -> Result<ItemId, BoxError> {
///         if request.title.trim().is_empty() {
///             return Err(ValidationError::EmptyTitle.into());
///         }
///         next.run().await
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync {
    async fn handle(
        &self,
        request: &R,
        cancel: &CancellationToken,
        next: Next<R::Response>,
    ) -> Result<R::Response, BoxError>;
}

/// OpenRequest は OpenBehavior に渡される型消去された request
pub struct OpenRequest {
    key: HandlerKey,
    payload: Payload,
}

impl OpenRequest {
    pub fn key(&self) -> HandlerKey {
        self.key
    }

    /// 具体型が分かる場合は参照を取り出せる
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

/// OpenBehavior は全ての request 型に適用される behavior
///
/// response は型消去されたまま受け渡します。
#[async_trait]
pub trait OpenBehavior: Send + Sync {
    async fn handle(
        &self,
        request: &OpenRequest,
        cancel: &CancellationToken,
        next: ErasedNext,
    ) -> Result<Response, BoxError>;
}

/// DynBehavior は registry に格納される object-safe な behavior
#[async_trait]
pub trait DynBehavior: Send + Sync {
    async fn handle_dyn(
        &self,
        key: HandlerKey,
        request: Payload,
        cancel: CancellationToken,
        next: ErasedNext,
    ) -> Result<Response, BoxError>;
}

pub struct TypedBehavior<R: Request, B: PipelineBehavior<R>> {
    behavior: B,
    _marker: PhantomData<R>,
}

impl<R: Request, B: PipelineBehavior<R>> TypedBehavior<R, B> {
    pub fn new(behavior: B) -> Self {
        Self {
            behavior,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Request, B: PipelineBehavior<R>> DynBehavior for TypedBehavior<R, B> {
    async fn handle_dyn(
        &self,
        _key: HandlerKey,
        request: Payload,
        cancel: CancellationToken,
        next: ErasedNext,
    ) -> Result<Response, BoxError> {
        let request = downcast_payload::<R>(request)?;
        let response = self
            .behavior
            .handle(&request, &cancel, next.typed::<R::Response>())
            .await?;
        Ok(Box::new(response))
    }
}

pub struct OpenBehaviorAdapter<B: OpenBehavior> {
    behavior: B,
}

impl<B: OpenBehavior> OpenBehaviorAdapter<B> {
    pub fn new(behavior: B) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl<B: OpenBehavior> DynBehavior for OpenBehaviorAdapter<B> {
    async fn handle_dyn(
        &self,
        key: HandlerKey,
        request: Payload,
        cancel: CancellationToken,
        next: ErasedNext,
    ) -> Result<Response, BoxError> {
        let request = OpenRequest { key, payload: request };
        self.behavior.handle(&request, &cancel, next).await
    }
}
