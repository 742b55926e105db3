//! Registry - handler / listener / behavior の登録と解決
//!
//! # 学習ポイント
//! - 登録フェーズ（RegistryBuilder, mutable）と実行フェーズ（Registry, immutable）の分離
//! - HashMap での型消去された factory の管理
//! - 起動時検証（Fail-fast 設計）
//!
//! # 寿命
//! - `register_*(instance)`: 1 つのインスタンスを共有する
//! - `register_*_factory(|| ...)`: 解決のたびに新しいインスタンスを作る

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::behavior::{DynBehavior, OpenBehavior, OpenBehaviorAdapter, PipelineBehavior, TypedBehavior};
use super::handler::{DynListener, NotificationHandler, RequestHandler, TypedListener};
use super::message::{Notification, Request, handler_key, notification_type};
use crate::domain::identity::{Capability, HandlerKey, MessageType};
use crate::ports::{Instance, Resolver};

type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// RegistryError は登録時のエラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Multiple handlers were found for request type {0}. Only one RequestHandler is allowed per request.")]
    DuplicateHandler(HandlerKey),

    #[error("Missing handlers: {0:?}. These requests were expected but not registered.")]
    MissingHandlers(Vec<String>),
}

/// behavior の登録エントリ
///
/// `scope` が None のものは全ての request に適用される（OpenBehavior）。
struct BehaviorEntry {
    scope: Option<HandlerKey>,
    factory: Factory,
}

impl BehaviorEntry {
    fn applies_to(&self, key: &HandlerKey) -> bool {
        self.scope.is_none_or(|scope| scope == *key)
    }
}

fn shared<T: Send + Sync + 'static>(value: T) -> Factory {
    let instance: Instance = Arc::new(value);
    Arc::new(move || Arc::clone(&instance))
}

/// RegistryBuilder は登録フェーズ
///
/// # 使用例
/// ```ignore
/// let registry = Registry::builder()
///     .register_handler::<GetBalance, _>(GetBalanceHandler::new(accounts))?
///     .register_listener::<Deposited, _>(AuditTrail)
///     .register_behavior::<GetBalance, _>(RequireAccount)
///     .expect_request::<GetBalance>()
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - 同じ request 型に 2 つ目の handler を登録すると DuplicateHandler
/// - expect_request() した request に handler が無ければ build() が MissingHandlers
pub struct RegistryBuilder {
    handlers: HashMap<HandlerKey, Factory>,
    listeners: HashMap<MessageType, Vec<Factory>>,
    behaviors: Vec<BehaviorEntry>,
    expected: Vec<HandlerKey>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            listeners: HashMap::new(),
            behaviors: Vec::new(),
            expected: Vec::new(),
        }
    }

    fn insert_handler(mut self, key: HandlerKey, factory: Factory) -> Result<Self, RegistryError> {
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::DuplicateHandler(key));
        }
        self.handlers.insert(key, factory);
        Ok(self)
    }

    /// Handler を登録（インスタンスを共有）
    pub fn register_handler<R, H>(self, handler: H) -> Result<Self, RegistryError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
    {
        let handler: Arc<dyn RequestHandler<R>> = Arc::new(handler);
        self.insert_handler(handler_key::<R>(), shared(handler))
    }

    /// Handler を登録（解決のたびに `make` で生成）
    pub fn register_handler_factory<R, H, F>(self, make: F) -> Result<Self, RegistryError>
    where
        R: Request,
        H: RequestHandler<R> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || {
            let handler: Arc<dyn RequestHandler<R>> = Arc::new(make());
            Arc::new(handler) as Instance
        });
        self.insert_handler(handler_key::<R>(), factory)
    }

    pub fn register_listener<N, L>(mut self, listener: L) -> Self
    where
        N: Notification,
        L: NotificationHandler<N> + 'static,
    {
        let listener: Arc<dyn DynListener> = Arc::new(TypedListener::<N, L>::new(listener));
        self.listeners
            .entry(notification_type::<N>())
            .or_default()
            .push(shared(listener));
        self
    }

    pub fn register_listener_factory<N, L, F>(mut self, make: F) -> Self
    where
        N: Notification,
        L: NotificationHandler<N> + 'static,
        F: Fn() -> L + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || {
            let listener: Arc<dyn DynListener> = Arc::new(TypedListener::<N, L>::new(make()));
            Arc::new(listener) as Instance
        });
        self.listeners
            .entry(notification_type::<N>())
            .or_default()
            .push(factory);
        self
    }

    /// request 型 `R` 専用の behavior を登録
    ///
    /// 先に登録したものほど外側で実行されます。
    pub fn register_behavior<R, B>(mut self, behavior: B) -> Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
    {
        let behavior: Arc<dyn DynBehavior> = Arc::new(TypedBehavior::<R, B>::new(behavior));
        self.behaviors.push(BehaviorEntry {
            scope: Some(handler_key::<R>()),
            factory: shared(behavior),
        });
        self
    }

    pub fn register_behavior_factory<R, B, F>(mut self, make: F) -> Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
        F: Fn() -> B + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move || {
            let behavior: Arc<dyn DynBehavior> = Arc::new(TypedBehavior::<R, B>::new(make()));
            Arc::new(behavior) as Instance
        });
        self.behaviors.push(BehaviorEntry {
            scope: Some(handler_key::<R>()),
            factory,
        });
        self
    }

    /// 全ての request 型に適用される behavior を登録
    ///
    /// 型付き behavior と同じ登録順の中に並びます。
    pub fn register_open_behavior<B: OpenBehavior + 'static>(mut self, behavior: B) -> Self {
        let behavior: Arc<dyn DynBehavior> = Arc::new(OpenBehaviorAdapter::new(behavior));
        self.behaviors.push(BehaviorEntry {
            scope: None,
            factory: shared(behavior),
        });
        self
    }

    /// build() 時に handler の存在を確認する request 型を追加
    pub fn expect_request<R: Request>(mut self) -> Self {
        self.expected.push(handler_key::<R>());
        self
    }

    /// RegistryBuilder を不変の Registry に変換
    ///
    /// # 検証
    /// - expect_request() した request 型に handler が無ければ MissingHandlers
    pub fn build(self) -> Result<Registry, RegistryError> {
        let missing: Vec<String> = self
            .expected
            .iter()
            .filter(|key| !self.handlers.contains_key(key))
            .map(|key| key.request.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RegistryError::MissingHandlers(missing));
        }

        debug!(
            handlers = self.handlers.len(),
            notification_types = self.listeners.len(),
            behaviors = self.behaviors.len(),
            "registry built"
        );

        Ok(Registry {
            handlers: self.handlers,
            listeners: self.listeners,
            behaviors: self.behaviors,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry は配線後の不変スナップショット
///
/// `Resolver` を実装しており、dispatch core からは読み取り専用で使われます。
pub struct Registry {
    handlers: HashMap<HandlerKey, Factory>,
    listeners: HashMap<MessageType, Vec<Factory>>,
    behaviors: Vec<BehaviorEntry>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn registered_requests(&self) -> Vec<HandlerKey> {
        self.handlers.keys().copied().collect()
    }

    pub fn contains_handler<R: Request>(&self) -> bool {
        self.handlers.contains_key(&handler_key::<R>())
    }

    pub fn listener_count<N: Notification>(&self) -> usize {
        self.listeners
            .get(&notification_type::<N>())
            .map_or(0, Vec::len)
    }

    /// `R` に適用される behavior の数（OpenBehavior を含む）
    pub fn behavior_count<R: Request>(&self) -> usize {
        let key = handler_key::<R>();
        self.behaviors.iter().filter(|entry| entry.applies_to(&key)).count()
    }
}

impl Resolver for Registry {
    /// request handler だけを解決する（listener / behavior は `resolve_many`）
    fn resolve_one(&self, capability: &Capability) -> Option<Instance> {
        match capability {
            Capability::Handler(key) => self.handlers.get(key).map(|make| make()),
            Capability::Listener(_) | Capability::Behavior(_) => None,
        }
    }

    fn resolve_many(&self, capability: &Capability) -> Vec<Instance> {
        match capability {
            Capability::Handler(key) => self.handlers.get(key).map(|make| make()).into_iter().collect(),
            Capability::Listener(ty) => self
                .listeners
                .get(ty)
                .map(|factories| factories.iter().map(|make| make()).collect())
                .unwrap_or_default(),
            Capability::Behavior(key) => self
                .behaviors
                .iter()
                .filter(|entry| entry.applies_to(key))
                .map(|entry| (entry.factory)())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::erased::downcast_instance;
    use crate::typed::fixtures::{
        Counted, CountedHandler, Greet, GreetHandler, Journal, Recorder, Shipped, Tracer, Unhandled,
        Wrap,
    };

    #[test]
    fn test_register_and_resolve() {
        let registry = Registry::builder()
            .register_handler::<Greet, _>(GreetHandler)
            .unwrap()
            .build()
            .unwrap();

        let instance = registry
            .resolve_one(&Capability::handler(handler_key::<Greet>()))
            .unwrap();
        assert!(downcast_instance::<Arc<dyn RequestHandler<Greet>>>(instance.as_ref()).is_ok());
        assert_eq!(registry.registered_requests(), vec![handler_key::<Greet>()]);
        assert!(registry.contains_handler::<Greet>());
        assert!(!registry.contains_handler::<Unhandled>());
    }

    #[test]
    fn test_double_registration() {
        let result = Registry::builder()
            .register_handler::<Greet, _>(GreetHandler)
            .unwrap()
            .register_handler::<Greet, _>(GreetHandler);

        match result {
            Err(RegistryError::DuplicateHandler(key)) => assert_eq!(key, handler_key::<Greet>()),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("second handler must be rejected"),
        }
    }

    #[test]
    fn test_double_registration_via_factory() {
        let result = Registry::builder()
            .register_handler::<Greet, _>(GreetHandler)
            .unwrap()
            .register_handler_factory::<Greet, _, _>(|| GreetHandler);

        assert!(matches!(result, Err(RegistryError::DuplicateHandler(_))));
    }

    #[test]
    fn test_multiple_listeners_are_allowed() {
        let journal = Journal::default();
        let registry = Registry::builder()
            .register_listener::<Shipped, _>(Recorder::new("a", journal.clone()))
            .register_listener::<Shipped, _>(Recorder::new("b", journal.clone()))
            .build()
            .unwrap();

        assert_eq!(registry.listener_count::<Shipped>(), 2);
        assert_eq!(
            registry
                .resolve_many(&Capability::listener(MessageType::of::<Shipped>()))
                .len(),
            2
        );
        assert!(
            registry
                .resolve_one(&Capability::listener(MessageType::of::<Shipped>()))
                .is_none()
        );
    }

    #[test]
    fn test_missing_expected_handler() {
        let result = Registry::builder()
            .register_handler::<Greet, _>(GreetHandler)
            .unwrap()
            .expect_request::<Greet>()
            .expect_request::<Unhandled>()
            .build();

        assert!(matches!(
            result,
            Err(RegistryError::MissingHandlers(missing)) if missing == vec!["Unhandled".to_string()]
        ));
    }

    #[test]
    fn test_behaviors_keep_registration_order_and_scope() {
        let journal = Journal::default();
        let registry = Registry::builder()
            .register_behavior::<Greet, _>(Wrap("1"))
            .register_open_behavior(Tracer::new("open", journal))
            .register_behavior::<Greet, _>(Wrap("2"))
            .build()
            .unwrap();

        assert_eq!(registry.behavior_count::<Greet>(), 3);
        assert_eq!(registry.behavior_count::<Unhandled>(), 1);

        let first = registry.resolve_many(&Capability::behavior(handler_key::<Greet>()));
        let second = registry.resolve_many(&Capability::behavior(handler_key::<Greet>()));
        let same_order = first
            .iter()
            .zip(second.iter())
            .all(|(a, b)| Arc::ptr_eq(a, b));
        assert!(same_order);
    }

    #[test]
    fn test_singleton_and_factory_lifetimes() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let registry = Registry::builder()
            .register_handler_factory::<Counted, _, _>(move || CountedHandler::new(counter.clone()))
            .unwrap()
            .register_handler::<Greet, _>(GreetHandler)
            .unwrap()
            .build()
            .unwrap();

        let counted = Capability::handler(handler_key::<Counted>());
        registry.resolve_one(&counted);
        registry.resolve_one(&counted);
        assert_eq!(created.load(Ordering::SeqCst), 2);

        let greet = Capability::handler(handler_key::<Greet>());
        let a = registry.resolve_one(&greet).unwrap();
        let b = registry.resolve_one(&greet).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_listener_and_behavior_factories_create_per_resolution() {
        let journal = Journal::default();
        let listener_journal = journal.clone();
        let registry = Registry::builder()
            .register_listener_factory::<Shipped, _, _>(move || Recorder::new("fresh", listener_journal.clone()))
            .register_behavior_factory::<Greet, _, _>(|| Wrap("f"))
            .build()
            .unwrap();

        let listener = Capability::listener(MessageType::of::<Shipped>());
        let first = registry.resolve_many(&listener);
        let second = registry.resolve_many(&listener);
        assert!(!Arc::ptr_eq(&first[0], &second[0]));
        assert!(downcast_instance::<Arc<dyn DynListener>>(first[0].as_ref()).is_ok());

        let behavior = Capability::behavior(handler_key::<Greet>());
        let first = registry.resolve_many(&behavior);
        let second = registry.resolve_many(&behavior);
        assert!(!Arc::ptr_eq(&first[0], &second[0]));
        assert!(downcast_instance::<Arc<dyn DynBehavior>>(first[0].as_ref()).is_ok());
    }
}
