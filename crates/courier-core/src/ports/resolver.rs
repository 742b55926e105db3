//! Resolver port - handler / listener / behavior インスタンスの解決
//!
//! dispatch core は registry を読むだけで、書き込むことはありません。
//! 登録時の検証（handler の重複禁止など）は実装側の責務です。

use std::any::Any;
use std::sync::Arc;

use crate::domain::identity::Capability;

/// 解決されたインスタンス
///
/// 中身の具体型は capability ごとに決まっています。
/// - `Handler(key)`: `Arc<dyn RequestHandler<R>>`
/// - `Listener(ty)`: `Arc<dyn DynListener>`
/// - `Behavior(key)`: `Arc<dyn DynBehavior>`
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Resolver は capability からインスタンスを解決する
///
/// # 契約
/// - `resolve_one`: 0 個か 1 個。request handler の解決に使う
/// - `resolve_many`: 登録順を保ったまま返す。呼び出しごとに順序が変わってはならない
///
/// インスタンスの寿命（毎回生成するか共有するか）は実装が決めます。
pub trait Resolver: Send + Sync {
    fn resolve_one(&self, capability: &Capability) -> Option<Instance>;

    fn resolve_many(&self, capability: &Capability) -> Vec<Instance>;
}
