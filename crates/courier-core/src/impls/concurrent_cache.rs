//! ConcurrentInvokerCache - DashMap による Invoker キャッシュ
//!
//! # 学習ポイント
//! - DashMap の shard 単位ロック
//! - entry API による「1 回だけ構築」(last-write-wins ではない)
//! - 読み取りは shard の read lock のみで、構築後は競合しない

use dashmap::DashMap;
use tracing::debug;

use crate::domain::identity::HandlerKey;
use crate::ports::{Invoker, InvokerCache};

/// ConcurrentInvokerCache はデフォルトの InvokerCache
///
/// # 実装詳細
/// - 既存エントリは `get` で取得（read lock）
/// - 未登録なら `entry` で shard の write lock を取り、その中で `build` を実行
/// - 同じキーで競合した呼び出しは write lock を待ち、Occupied を見て勝者の値を返す
///
/// `build` は lock を保持したまま実行されるので、同じキャッシュを触ってはいけません。
pub struct ConcurrentInvokerCache {
    invokers: DashMap<HandlerKey, Invoker>,
}

impl ConcurrentInvokerCache {
    pub fn new() -> Self {
        Self {
            invokers: DashMap::new(),
        }
    }

    pub fn contains(&self, key: &HandlerKey) -> bool {
        self.invokers.contains_key(key)
    }
}

impl Default for ConcurrentInvokerCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InvokerCache for ConcurrentInvokerCache {
    fn get_or_build(&self, key: HandlerKey, build: &dyn Fn() -> Invoker) -> Invoker {
        if let Some(existing) = self.invokers.get(&key) {
            return existing.value().clone();
        }

        self.invokers
            .entry(key)
            .or_insert_with(|| {
                debug!(key = %key, "building invoker");
                build()
            })
            .value()
            .clone()
    }

    fn len(&self) -> usize {
        self.invokers.len()
    }
}
