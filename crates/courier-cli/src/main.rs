//! courier-cli - to-do ドメインで Mediator を動かすデモ
//!
//! ```text
//! courier-cli [scenario.json]
//! RUST_LOG=debug courier-cli   # behavior のタイミングログも表示
//! ```

mod scenario;
mod todo;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use courier_core::{CancellationToken, Mediator, Registry, RegistryError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::scenario::{Scenario, ScenarioError};
use crate::todo::{
    AddItem, AddItemHandler, AddedCounter, AuditLog, ClearItems, ClearItemsHandler, ItemAdded, ListItems,
    ListItemsHandler, RejectEmptyTitle, Store, Timing,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

/// handler / listener / behavior を配線して Mediator を作る
fn wire(store: Arc<Store>, added: Arc<AtomicUsize>) -> Result<Mediator, RegistryError> {
    let registry = Registry::builder()
        .register_handler::<AddItem, _>(AddItemHandler::new(store.clone()))?
        .register_handler::<ListItems, _>(ListItemsHandler::new(store.clone()))?
        .register_handler::<ClearItems, _>(ClearItemsHandler::new(store))?
        .register_listener::<ItemAdded, _>(AuditLog)
        .register_listener::<ItemAdded, _>(AddedCounter::new(added))
        .register_open_behavior(Timing)
        .register_behavior::<AddItem, _>(RejectEmptyTitle)
        .expect_request::<AddItem>()
        .expect_request::<ListItems>()
        .expect_request::<ClearItems>()
        .build()?;
    Ok(Mediator::new(Arc::new(registry)))
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let scenario = match std::env::args().nth(1) {
        Some(path) => Scenario::load(&path).map_err(|e| {
            error!(path = %path, error = %e, "Failed to load scenario");
            e
        })?,
        None => Scenario::builtin(),
    };

    let added = Arc::new(AtomicUsize::new(0));
    let mediator = wire(Arc::new(Store::new()), added.clone())?;
    info!(steps = scenario.steps.len(), "Running scenario");

    let reports = scenario::run(&mediator, scenario, &CancellationToken::new()).await;
    println!("{}", serde_json::to_string_pretty(&reports)?);

    info!(added = added.load(Ordering::Relaxed), "Scenario finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_scenario_rejects_blank_title() {
        let added = Arc::new(AtomicUsize::new(0));
        let mediator = wire(Arc::new(Store::new()), added.clone()).unwrap();

        let reports = scenario::run(&mediator, Scenario::builtin(), &CancellationToken::new()).await;

        let ops: Vec<_> = reports.iter().map(|r| r.op).collect();
        assert_eq!(ops, vec!["add", "add", "add", "list", "clear", "list"]);
        assert_eq!(reports[1].error.as_deref(), Some("title must not be empty"));
        assert_eq!(
            reports[3].result.as_ref().and_then(|v| v.as_array()).map(Vec::len),
            Some(2)
        );
        assert_eq!(reports[5].result, Some(serde_json::json!([])));
        assert_eq!(added.load(Ordering::Relaxed), 2);
    }
}
