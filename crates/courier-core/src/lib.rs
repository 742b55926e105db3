//! courier-core
//!
//! In-process mediator: typed request dispatch, notification fan-out and pipeline behaviors.
//!
//! # モジュール構成
//! - **domain**: 型識別子（MessageType, HandlerKey, Capability）、型消去された値、エラー
//! - **ports**: 抽象化レイヤー（Resolver, InvokerCache）
//! - **typed**: 型付きメッセージ API（Request, RequestHandler, PipelineBehavior, Registry）
//! - **app**: dispatch core（Mediator, MediatorBuilder, PipelineComposer）
//! - **impls**: 実装（ConcurrentInvokerCache）

pub mod domain;
pub mod ports;
pub mod typed;
pub mod app;
pub mod impls;

pub use tokio_util::sync::CancellationToken;

pub use crate::app::{ErasedNotification, ErasedRequest, Mediator, MediatorBuilder, Publisher, Sender};
pub use crate::domain::{BoxError, Capability, HandlerKey, MediatorError, MessageType};
pub use crate::impls::ConcurrentInvokerCache;
pub use crate::ports::{InvokerCache, Resolver};
pub use crate::typed::{
    Command, Next, Notification, NotificationHandler, OpenBehavior, OpenRequest, PipelineBehavior, Registry,
    RegistryBuilder, RegistryError, Request, RequestHandler,
};
