//! JSON-line query protocol for the engine binary.
//!
//! One request per line, one response per line:
//!
//! ```text
//! {"op":"regions_at","position":{"world":"world","x":1,"y":64,"z":1}}
//! {"ok":[{"id":"spawn","name":"Spawn","priority":10}]}
//! ```

use regionward_domain::{Position, RegionFlagKey, RegionId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::App;
use crate::flags::{resolve_flag_resolutions, Actor, FlagAction, FlagContext};
use crate::use_cases::movement::TransitionRequest;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Query {
    RegionsAt {
        position: Position,
    },
    Evaluate {
        region: RegionId,
        flag: RegionFlagKey,
        #[serde(default)]
        action: Option<FlagAction>,
        #[serde(default)]
        actor: Option<Actor>,
        #[serde(default)]
        location: Option<Position>,
    },
    Transition {
        from: Position,
        to: Position,
        #[serde(default)]
        action: Option<FlagAction>,
        #[serde(default)]
        actor: Option<Actor>,
    },
    Inspect {
        region: RegionId,
    },
    Reload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(Value),
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Malformed query: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Region not found: {0}")]
    RegionNotFound(RegionId),

    #[error("{0}")]
    Failed(String),
}

/// Handles one input line and renders the response line.
pub async fn handle_line(app: &App, line: &str) -> String {
    let response = match execute(app, line).await {
        Ok(value) => Response::Ok(value),
        Err(e) => {
            tracing::debug!(error = %e, "Query failed");
            Response::Error(e.to_string())
        }
    };
    serde_json::to_string(&response)
        .unwrap_or_else(|e| format!(r#"{{"error":"failed to render response: {e}"}}"#))
}

async fn execute(app: &App, line: &str) -> Result<Value, QueryError> {
    let query: Query = serde_json::from_str(line)?;
    let regions = &app.repositories.regions;

    match query {
        Query::RegionsAt { position } => Ok(Value::Array(
            regions
                .regions_at(&position)
                .iter()
                .map(|region| {
                    json!({
                        "id": region.id,
                        "name": region.display_name(),
                        "priority": region.priority,
                    })
                })
                .collect(),
        )),
        Query::Evaluate {
            region,
            flag,
            action,
            actor,
            location,
        } => {
            let model = regions
                .find_by_id(&region)
                .ok_or(QueryError::RegionNotFound(region))?;
            let mut context = FlagContext::new(model, action.unwrap_or_else(query_action));
            context.actor = actor;
            context.location = location;
            let verdict = app
                .flags
                .evaluation
                .evaluate(&context, flag)
                .map_err(|e| QueryError::Failed(e.to_string()))?;
            Ok(serde_json::to_value(verdict)?)
        }
        Query::Transition {
            from,
            to,
            action,
            actor,
        } => {
            let request = TransitionRequest {
                actor,
                from,
                to,
                action: action.unwrap_or_else(query_action),
            };
            let decision = app
                .use_cases
                .enforce_transition
                .execute(&request)
                .map_err(|e| QueryError::Failed(e.to_string()))?;
            Ok(serde_json::to_value(decision)?)
        }
        Query::Inspect { region } => {
            let model = regions
                .find_by_id(&region)
                .ok_or(QueryError::RegionNotFound(region))?;
            let lines: Vec<String> = resolve_flag_resolutions(&app.flags.evaluation, &model)
                .iter()
                .map(|resolution| resolution.summary())
                .collect();
            Ok(json!({ "region": model.id, "flags": lines }))
        }
        Query::Reload => {
            let count = app
                .reload()
                .await
                .map_err(|e| QueryError::Failed(e.to_string()))?;
            Ok(json!({ "regions": count }))
        }
    }
}

fn query_action() -> FlagAction {
    FlagAction::new("regionward:query").unwrap_or_else(|_| FlagAction::unknown())
}
