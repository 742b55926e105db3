//! InvokerCache port - 型消去された呼び出し戦略のメモ化
//!
//! # 実装
//! - `impls::ConcurrentInvokerCache`（DashMap、デフォルト）

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::resolver::Resolver;
use crate::domain::erased::{BoxFuture, Payload, Response};
use crate::domain::errors::BoxError;
use crate::domain::identity::HandlerKey;

/// Invoker は handler を解決して呼び出す戦略
///
/// 具体的な request / response 型を内部で知っており、境界で一度だけ downcast します。
/// 特定の handler インスタンスや request は保持しません（resolver は呼び出しごとに渡す）。
pub type Invoker = Arc<
    dyn Fn(Arc<dyn Resolver>, Payload, CancellationToken) -> BoxFuture<'static, Result<Response, BoxError>>
        + Send
        + Sync,
>;

/// InvokerCache は HandlerKey ごとに Invoker を 1 度だけ構築して保持する
///
/// # 契約
/// - 未登録のキーに対して同時に呼ばれても `build` が実行されるのは 1 回だけ
/// - 競合した呼び出し元は全員、勝者が構築した Invoker を受け取る
/// - 一度入ったエントリは破棄も無効化もしない
pub trait InvokerCache: Send + Sync {
    fn get_or_build(&self, key: HandlerKey, build: &dyn Fn() -> Invoker) -> Invoker;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
