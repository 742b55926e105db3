//! Typed - 型付きメッセージ API
//!
//! このモジュールは request と handler の対応付けを型で保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Request` / `Notification` trait, `RequestHandler<R>`, `PipelineBehavior<R>` - 型安全
//! - **内部（Dyn）**: `DynListener` / `DynBehavior` trait - object-safe, type erasure

pub mod message;
pub mod handler;
pub mod behavior;
pub mod registry;

#[cfg(test)]
pub(crate) mod fixtures;

// 主要な trait/型 を再エクスポート
pub use self::message::{Command, Notification, Request, handler_key, notification_type};
pub use self::handler::{DynListener, NotificationHandler, RequestHandler, TypedListener};
pub use self::behavior::{
    DynBehavior, ErasedNext, Next, OpenBehavior, OpenBehaviorAdapter, OpenRequest, PipelineBehavior,
    TypedBehavior,
};
pub use self::registry::{Registry, RegistryBuilder, RegistryError};
