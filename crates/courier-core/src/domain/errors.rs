//! Errors - dispatch 時のエラー型
//!
//! # エラーの流れ
//! - handler / behavior / listener は `BoxError` を返す
//! - core が pipeline 内部で発生させたエラー（HandlerNotFound など）も
//!   `BoxError` に包まれて behavior を通過する
//! - 呼び出し元に返す直前に `MediatorError::from_boxed` で元に戻す
//!
//! 登録時のエラー（DuplicateHandler など）は `typed::registry::RegistryError` を参照。

use super::identity::MessageType;

/// handler / behavior / listener が返すエラー
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// MediatorError は send / publish の呼び出し元に返るエラー
#[derive(Debug, thiserror::Error)]
pub enum MediatorError {
    /// request / notification が渡されなかった（解決処理の前に検出）
    #[error("{0} cannot be absent")]
    InvalidArgument(&'static str),

    #[error("No handler found for type {request}.")]
    HandlerNotFound { request: MessageType },

    /// 型消去された値を期待した具体型に戻せなかった
    #[error("erased value is not a {expected}")]
    TypeMismatch { expected: &'static str },

    /// handler / behavior / listener が返したエラーをそのまま保持する
    #[error(transparent)]
    Downstream(BoxError),
}

impl MediatorError {
    /// pipeline を通過してきた `BoxError` を呼び出し元向けの型に戻す
    ///
    /// core 自身のエラーは元の variant に、それ以外は `Downstream` になる。
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<MediatorError>() {
            Ok(own) => *own,
            Err(other) => Self::Downstream(other),
        }
    }

    /// handler などが返した元のエラーを参照する
    pub fn downstream(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Downstream(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// 元のエラーを具体型で取り出す
    pub fn downstream_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.downstream().and_then(|err| err.downcast_ref::<E>())
    }

    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, Self::HandlerNotFound { .. })
    }
}
