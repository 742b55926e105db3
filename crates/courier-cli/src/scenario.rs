//! Scenario - 実行する操作の列（JSON で指定可能）
//!
//! ```json
//! { "steps": [ { "op": "add", "title": "milk" }, { "op": "list" }, { "op": "clear" } ] }
//! ```

use std::path::Path;

use courier_core::{CancellationToken, Mediator, MediatorError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::todo::{AddItem, ClearItems, ItemAdded, ListItems};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// StepError は 1 step の失敗
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Dispatch(#[from] MediatorError),

    #[error("failed to render result: {0}")]
    Render(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Add { title: String },
    List,
    Clear,
}

#[derive(Debug, Deserialize)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// 組み込みのシナリオ（空タイトルの拒否を含む）
    pub fn builtin() -> Self {
        Self {
            steps: vec![
                Step::Add { title: "buy milk".into() },
                Step::Add { title: "   ".into() },
                Step::Add { title: "write report".into() },
                Step::List,
                Step::Clear,
                Step::List,
            ],
        }
    }
}

/// 1 step の実行結果
#[derive(Debug, Serialize)]
pub struct StepReport {
    pub op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    fn from_result(op: &'static str, result: Result<serde_json::Value, StepError>) -> Self {
        match result {
            Ok(value) => Self {
                op,
                result: Some(value),
                error: None,
            },
            Err(err) => {
                warn!(op, error = %err, "step failed");
                Self {
                    op,
                    result: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

pub async fn run(mediator: &Mediator, scenario: Scenario, cancel: &CancellationToken) -> Vec<StepReport> {
    let mut reports = Vec::with_capacity(scenario.steps.len());
    for step in scenario.steps {
        let report = match step {
            Step::Add { title } => StepReport::from_result("add", add(mediator, title, cancel).await),
            Step::List => StepReport::from_result("list", list(mediator, cancel).await),
            Step::Clear => StepReport::from_result(
                "clear",
                mediator
                    .execute(ClearItems, cancel)
                    .await
                    .map(|()| serde_json::Value::Null)
                    .map_err(StepError::from),
            ),
        };
        reports.push(report);
    }
    reports
}

async fn add(mediator: &Mediator, title: String, cancel: &CancellationToken) -> Result<serde_json::Value, StepError> {
    let id = mediator
        .send(AddItem { title: title.clone() }, cancel)
        .await?;
    mediator.publish(ItemAdded { id, title }, cancel).await?;
    Ok(serde_json::json!({ "id": id.to_string() }))
}

async fn list(mediator: &Mediator, cancel: &CancellationToken) -> Result<serde_json::Value, StepError> {
    let items = mediator.send(ListItems, cancel).await?;
    Ok(serde_json::to_value(items)?)
}
