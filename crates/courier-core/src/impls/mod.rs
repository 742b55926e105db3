//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **ConcurrentInvokerCache**: DashMap ベースのデフォルト InvokerCache
//!
//! Resolver のデフォルト実装は `typed::registry::Registry` です。

pub mod concurrent_cache;

pub use self::concurrent_cache::ConcurrentInvokerCache;
