//! PipelineComposer - behavior を handler の周りに合成する
//!
//! # 学習ポイント
//! - 継承ではなく関数合成（fold）で decorator chain を作る
//! - 登録順の逆から包むので、最初に登録した behavior が一番外側になる
//! - behavior の capability は DashMap にキャッシュする
//!
//! ```text
//! [B1, B2] + handler
//!   → B1(B2(handler))
//!   → B1:before, B2:before, handler, B2:after, B1:after
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::domain::erased::{BoxFuture, Payload, Response, downcast_instance};
use crate::domain::errors::{BoxError, MediatorError};
use crate::domain::identity::{Capability, HandlerKey};
use crate::ports::Resolver;
use crate::typed::behavior::{DynBehavior, Next};

/// Operation は pipeline の 1 段（合成後の全体も同じ形）
pub type Operation =
    Arc<dyn Fn(Payload, CancellationToken) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync>;

pub struct PipelineComposer {
    behavior_types: DashMap<HandlerKey, Capability>,
}

impl PipelineComposer {
    pub fn new() -> Self {
        Self {
            behavior_types: DashMap::new(),
        }
    }

    fn behavior_capability(&self, key: HandlerKey) -> Capability {
        if let Some(existing) = self.behavior_types.get(&key) {
            return *existing.value();
        }
        *self
            .behavior_types
            .entry(key)
            .or_insert_with(|| Capability::behavior(key))
            .value()
    }

    /// `base` を `key` に登録された behavior で包む
    ///
    /// behavior のインスタンスは呼び出しのたびに resolver から取得します。
    pub fn compose(
        &self,
        resolver: &dyn Resolver,
        key: HandlerKey,
        base: Operation,
    ) -> Result<Operation, MediatorError> {
        let capability = self.behavior_capability(key);
        let behaviors = resolver
            .resolve_many(&capability)
            .iter()
            .map(|instance| downcast_instance::<Arc<dyn DynBehavior>>(instance.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        trace!(key = %key, behaviors = behaviors.len(), "composing pipeline");

        Ok(behaviors
            .into_iter()
            .rev()
            .fold(base, |inner, behavior| wrap(key, behavior, inner)))
    }

    pub fn cached_keys(&self) -> usize {
        self.behavior_types.len()
    }
}

impl Default for PipelineComposer {
    fn default() -> Self {
        Self::new()
    }
}

fn wrap(key: HandlerKey, behavior: Arc<dyn DynBehavior>, inner: Operation) -> Operation {
    Arc::new(
        move |payload: Payload, cancel: CancellationToken| -> BoxFuture<'static, Result<Response, BoxError>> {
            let next = {
                let inner = Arc::clone(&inner);
                let payload = Arc::clone(&payload);
                let cancel = cancel.clone();
                Next::new(move || inner(Arc::clone(&payload), cancel.clone()))
            };
            let behavior = Arc::clone(&behavior);
            Box::pin(async move { behavior.handle_dyn(key, payload, cancel, next).await })
        },
    )
}
