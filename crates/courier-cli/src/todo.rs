//! To-do ドメイン - courier-core の使い方を示す最小の例
//!
//! - `AddItem` → `ItemId`（request / response）
//! - `ListItems` → `Vec<Item>`（query）
//! - `ClearItems`（command）
//! - `ItemAdded`（notification, listener 2 つ）
//! - `RejectEmptyTitle`（AddItem 専用の behavior）
//! - `Timing`（全 request に適用される open behavior）

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_core::domain::Response;
use courier_core::typed::ErasedNext;
use courier_core::{
    BoxError, CancellationToken, Next, Notification, NotificationHandler, OpenBehavior, OpenRequest,
    PipelineBehavior, Request, RequestHandler,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

pub type ItemId = Ulid;

#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("title must not be empty")]
    EmptyTitle,
}

/// Store は item を保持する
#[derive(Default)]
pub struct Store {
    items: RwLock<Vec<Item>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}

// ---- messages ----

pub struct AddItem {
    pub title: String,
}

impl Request for AddItem {
    type Response = ItemId;
}

pub struct ListItems;

impl Request for ListItems {
    type Response = Vec<Item>;
}

pub struct ClearItems;

impl Request for ClearItems {
    type Response = ();
}

pub struct ItemAdded {
    pub id: ItemId,
    pub title: String,
}

impl Notification for ItemAdded {}

// ---- handlers ----

pub struct AddItemHandler {
    store: Arc<Store>,
}

impl AddItemHandler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<AddItem> for AddItemHandler {
    async fn handle(&self, request: &AddItem, _cancel: &CancellationToken) -> Result<ItemId, BoxError> {
        let item = Item {
            id: Ulid::new(),
            title: request.title.trim().to_string(),
            created_at: Utc::now(),
        };
        let id = item.id;
        self.store.items.write().await.push(item);
        Ok(id)
    }
}

pub struct ListItemsHandler {
    store: Arc<Store>,
}

impl ListItemsHandler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<ListItems> for ListItemsHandler {
    async fn handle(&self, _request: &ListItems, _cancel: &CancellationToken) -> Result<Vec<Item>, BoxError> {
        Ok(self.store.items.read().await.clone())
    }
}

pub struct ClearItemsHandler {
    store: Arc<Store>,
}

impl ClearItemsHandler {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RequestHandler<ClearItems> for ClearItemsHandler {
    async fn handle(&self, _request: &ClearItems, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.store.items.write().await.clear();
        Ok(())
    }
}

// ---- listeners ----

/// 追加された item をログに出す
pub struct AuditLog;

#[async_trait]
impl NotificationHandler<ItemAdded> for AuditLog {
    async fn handle(&self, notification: &ItemAdded, _cancel: &CancellationToken) -> Result<(), BoxError> {
        info!(id = %notification.id, title = %notification.title, "item added");
        Ok(())
    }
}

/// 追加された item の数を数える
pub struct AddedCounter {
    added: Arc<AtomicUsize>,
}

impl AddedCounter {
    pub fn new(added: Arc<AtomicUsize>) -> Self {
        Self { added }
    }
}

#[async_trait]
impl NotificationHandler<ItemAdded> for AddedCounter {
    async fn handle(&self, _notification: &ItemAdded, _cancel: &CancellationToken) -> Result<(), BoxError> {
        self.added.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

// ---- behaviors ----

pub struct RejectEmptyTitle;

#[async_trait]
impl PipelineBehavior<AddItem> for RejectEmptyTitle {
    async fn handle(
        &self,
        request: &AddItem,
        _cancel: &CancellationToken,
        next: Next<ItemId>,
    ) -> Result<ItemId, BoxError> {
        if request.title.trim().is_empty() {
            return Err(TodoError::EmptyTitle.into());
        }
        next.run().await
    }
}

/// 全 request の所要時間を記録する
pub struct Timing;

fn elapsed_micros(elapsed: std::time::Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[async_trait]
impl OpenBehavior for Timing {
    async fn handle(
        &self,
        request: &OpenRequest,
        _cancel: &CancellationToken,
        next: ErasedNext,
    ) -> Result<Response, BoxError> {
        let started = std::time::Instant::now();
        let result = next.run().await;
        debug!(
            request = %request.key().request,
            elapsed_us = elapsed_micros(started.elapsed()),
            ok = result.is_ok(),
            "handled"
        );
        result
    }
}
