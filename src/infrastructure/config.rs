use crate::domain::models::{MorningBlockDefault, SchedulerPolicy};
use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const SCHEDULE_JSON: &str = "schedule.json";

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub app: serde_json::Value,
    pub schedule: serde_json::Value,
}

fn default_files() -> HashMap<&'static str, serde_json::Value> {
    let policy = SchedulerPolicy::default();
    let morning_blocks = policy
        .default_blocks
        .iter()
        .map(|block| {
            serde_json::json!({
                "id": block.id,
                "title": block.title,
                "durationMinutes": block.duration_minutes,
            })
        })
        .collect::<Vec<_>>();

    HashMap::from([
        (
            APP_JSON,
            serde_json::json!({
                "schema": 1,
                "appName": "MorningPlan",
                "timezone": "UTC"
            }),
        ),
        (
            SCHEDULE_JSON,
            serde_json::json!({
                "schema": 1,
                "defaultWakeTime": policy.default_wake_time,
                "morningEndTime": policy.morning_end_time,
                "morningBlocks": morning_blocks
            }),
        ),
    ])
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    for (name, value) in default_files() {
        let path = config_dir.join(name);
        if !path.exists() {
            let formatted = serde_json::to_string_pretty(&value)?;
            fs::write(path, format!("{formatted}\n"))?;
        }
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_configs(config_dir: &Path) -> Result<ConfigBundle, InfraError> {
    Ok(ConfigBundle {
        app: read_config(&config_dir.join(APP_JSON))?,
        schedule: read_config(&config_dir.join(SCHEDULE_JSON))?,
    })
}

pub fn read_app_name(config_dir: &Path) -> Result<String, InfraError> {
    let app = read_config(&config_dir.join(APP_JSON))?;
    let name = app
        .get("appName")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("MorningPlan");
    Ok(name.to_string())
}

/// Resolves the scheduler policy from `schedule.json`, falling back to the
/// built-in baseline for any missing or empty field.
pub fn load_scheduler_policy(config_dir: &Path) -> Result<SchedulerPolicy, InfraError> {
    let schedule = read_config(&config_dir.join(SCHEDULE_JSON))?;
    let defaults = SchedulerPolicy::default();

    let default_wake_time =
        read_string_field(&schedule, "defaultWakeTime").unwrap_or(defaults.default_wake_time);
    let morning_end_time =
        read_string_field(&schedule, "morningEndTime").unwrap_or(defaults.morning_end_time);

    let mut default_blocks = Vec::new();
    if let Some(entries) = schedule
        .get("morningBlocks")
        .and_then(serde_json::Value::as_array)
    {
        for entry in entries {
            let Some(id) = read_string_field(entry, "id") else {
                continue;
            };
            let Some(title) = read_string_field(entry, "title") else {
                continue;
            };
            let Some(duration_minutes) = entry
                .get("durationMinutes")
                .and_then(serde_json::Value::as_u64)
                .and_then(|value| u32::try_from(value).ok())
            else {
                continue;
            };
            default_blocks.push(MorningBlockDefault {
                id,
                title,
                duration_minutes,
            });
        }
    }
    if default_blocks.is_empty() {
        default_blocks = defaults.default_blocks;
    }

    let policy = SchedulerPolicy {
        default_wake_time,
        morning_end_time,
        default_blocks,
    };
    policy.validate().map_err(InfraError::InvalidConfig)?;
    Ok(policy)
}

fn read_string_field(value: &serde_json::Value, field_name: &str) -> Option<String> {
    value
        .get(field_name)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(ToOwned::to_owned)
}
