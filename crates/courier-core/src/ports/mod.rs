//! Ports - 抽象化レイヤー
//!
//! dispatch core が外部の協力者に求めるインターフェースを定義します。
//! 実装を差し替えることで、DI コンテナや独自のキャッシュと組み合わせられます。

pub mod invoker_cache;
pub mod resolver;

pub use self::invoker_cache::{Invoker, InvokerCache};
pub use self::resolver::{Instance, Resolver};
