//! Message traits - Request / Command / Notification の定義
//!
//! # 学習ポイント
//! - Associated Types (`type Response`) で request と response 型を静的に対応付ける
//! - Blanket impl による marker trait (`Command`)
//! - Trait bounds (Send + Sync + 'static) は `Arc<dyn Any>` に格納するため

use crate::domain::identity::{HandlerKey, MessageType};

/// Request はちょうど 1 つの handler に届くメッセージ
///
/// # 使用例
/// ```ignore
/// struct GetBalance {
///     account: AccountId,
/// }
///
/// impl Request for GetBalance {
///     type Response = u64;
/// }
/// ```
///
/// 結果を返さない request は `type Response = ();` とします（`Command` 参照）。
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// Command は結果を返さない request
///
/// `Response = ()` の request には自動で実装されます。
pub trait Command: Request<Response = ()> {}

impl<T: Request<Response = ()>> Command for T {}

/// Notification は 0 個以上の listener に配信されるメッセージ
pub trait Notification: Send + Sync + 'static {}

/// request 型 `R` の (request, response) キー
pub fn handler_key<R: Request>() -> HandlerKey {
    HandlerKey::of::<R, R::Response>()
}

pub fn notification_type<N: Notification>() -> MessageType {
    MessageType::of::<N>()
}
