//! Erased - 型消去された値
//!
//! pipeline の外側では具体型を知らずに値を運び、
//! 内側（Invoker / Typed adapter）で一度だけ downcast します。

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::errors::MediatorError;

/// 型消去された request / notification
///
/// 全ての behavior と handler が同じインスタンスを共有するので `Arc` で持つ。
pub type Payload = Arc<dyn Any + Send + Sync>;

/// 型消去された response
pub type Response = Box<dyn Any + Send>;

/// Boxed future for erased pipeline steps.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Payload を具体型に戻す（境界で一度だけ行う）
pub fn downcast_payload<T: Send + Sync + 'static>(payload: Payload) -> Result<Arc<T>, MediatorError> {
    payload.downcast::<T>().map_err(|_| MediatorError::TypeMismatch {
        expected: std::any::type_name::<T>(),
    })
}

pub fn downcast_response<T: Send + 'static>(response: Response) -> Result<T, MediatorError> {
    response
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| MediatorError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

/// Resolver が返したインスタンスを具体型（多くは `Arc<dyn Trait>`）として取り出す
pub fn downcast_instance<T: Clone + 'static>(instance: &(dyn Any + Send + Sync)) -> Result<T, MediatorError> {
    instance
        .downcast_ref::<T>()
        .cloned()
        .ok_or(MediatorError::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_any() {
        let payload: Payload = Arc::new(42_u32);
        let value = downcast_payload::<u32>(payload).unwrap();
        assert_eq!(*value, 42);
    }

    #[test]
    fn wrong_payload_type_is_reported() {
        let payload: Payload = Arc::new("text");
        let err = downcast_payload::<u32>(payload).unwrap_err();
        assert!(matches!(err, MediatorError::TypeMismatch { expected: "u32" }));
    }

    #[test]
    fn response_is_unboxed_by_value() {
        let response: Response = Box::new(String::from("done"));
        assert_eq!(downcast_response::<String>(response).unwrap(), "done");
    }

    #[test]
    fn instance_is_cloned_out_of_any() {
        let shared: Arc<String> = Arc::new("handler".to_string());
        let instance: Arc<dyn Any + Send + Sync> = Arc::new(shared.clone());

        let resolved = downcast_instance::<Arc<String>>(instance.as_ref()).unwrap();
        assert!(Arc::ptr_eq(&resolved, &shared));
    }
}
