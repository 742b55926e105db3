//! MediatorBuilder - Mediator の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 省略可能な部品にはデフォルト実装を使う

use std::sync::Arc;

use super::mediator::Mediator;
use crate::impls::ConcurrentInvokerCache;
use crate::ports::{InvokerCache, Resolver};

/// MediatorBuilder は Mediator を構築
///
/// # 使用例
/// ```ignore
/// let cache: Arc<dyn InvokerCache> = Arc::new(ConcurrentInvokerCache::new());
/// let mediator = Mediator::builder()
///     .resolver(Arc::new(registry))
///     .invoker_cache(cache.clone())
///     .build()?;
/// ```
///
/// # デフォルト
/// - invoker_cache を指定しなければ Mediator ごとに ConcurrentInvokerCache を作る
pub struct MediatorBuilder {
    resolver: Option<Arc<dyn Resolver>>,
    invoker_cache: Option<Arc<dyn InvokerCache>>,
}

/// BuildError は Mediator 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing resolver. Call MediatorBuilder::resolver() before build().")]
    MissingResolver,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self {
            resolver: None,
            invoker_cache: None,
        }
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// 複数の Mediator で同じ cache を共有する場合に指定
    pub fn invoker_cache(mut self, cache: Arc<dyn InvokerCache>) -> Self {
        self.invoker_cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Mediator, BuildError> {
        let resolver = self.resolver.ok_or(BuildError::MissingResolver)?;
        let invokers = self
            .invoker_cache
            .unwrap_or_else(|| Arc::new(ConcurrentInvokerCache::new()));
        Ok(Mediator::with_parts(resolver, invokers))
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
