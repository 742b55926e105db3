//! Identity - 実行時の型識別子
//!
//! # 学習ポイント
//! - `TypeId` による型の同一性判定（名前ではなく型そのもので比較）
//! - `type_name` は診断用にのみ使う
//! - Eq / Hash を手で実装して、比較対象を `TypeId` に限定する

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// MessageType は具体的なメッセージ型を一意に表す
///
/// 同名の型が別モジュールにあっても `TypeId` が異なれば別物として扱います。
#[derive(Clone, Copy)]
pub struct MessageType {
    id: TypeId,
    name: &'static str,
}

impl MessageType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完全修飾名（例: `my_app::orders::PlaceOrder`）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// モジュールパスを除いた短い名前
    pub fn short_name(&self) -> &'static str {
        // タプル・配列は要素ごとに短縮できないのでそのまま
        if self.name.starts_with(['(', '[']) {
            return self.name;
        }
        // ジェネリクス引数の中の `::` は無視する
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }
}

impl PartialEq for MessageType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MessageType {}

impl Hash for MessageType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// HandlerKey は (request 型, response 型) の組
///
/// Invoker cache・behavior cache・registry のキーとして共通で使います。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    pub request: MessageType,
    pub response: MessageType,
}

impl HandlerKey {
    pub fn new(request: MessageType, response: MessageType) -> Self {
        Self { request, response }
    }

    pub fn of<Req: 'static, Resp: 'static>() -> Self {
        Self::new(MessageType::of::<Req>(), MessageType::of::<Resp>())
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.request, self.response)
    }
}

/// Capability は registry に問い合わせる「能力」の記述子
///
/// - `Handler`: request を処理する唯一の handler
/// - `Listener`: notification を受け取る 0 個以上の listener
/// - `Behavior`: handler を包む 0 個以上の pipeline behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Handler(HandlerKey),
    Listener(MessageType),
    Behavior(HandlerKey),
}

impl Capability {
    pub fn handler(key: HandlerKey) -> Self {
        Self::Handler(key)
    }

    pub fn listener(notification: MessageType) -> Self {
        Self::Listener(notification)
    }

    pub fn behavior(key: HandlerKey) -> Self {
        Self::Behavior(key)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(key) => write!(f, "RequestHandler<{key}>"),
            Self::Listener(notification) => write!(f, "NotificationHandler<{notification}>"),
            Self::Behavior(key) => write!(f, "PipelineBehavior<{key}>"),
        }
    }
}
