use serde::{Deserialize, Serialize};

use crate::domain::time::parse_hhmm;

/// A named, time-bounded activity segment within a day's schedule.
///
/// Blocks whose `id` is in the policy's morning block set are eligible for
/// proportional rescaling; `adjusted` marks blocks the scheduler has rescaled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleBlock {
    pub id: String,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub adjusted: bool,
}

impl ScheduleBlock {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "block.id")?;
        validate_non_empty(&self.title, "block.title")?;
        validate_hhmm(&self.start_time, "block.start_time")?;
        validate_hhmm(&self.end_time, "block.end_time")?;
        Ok(())
    }
}

/// The resolved output of a morning recalculation: the wake and end boundaries
/// plus the contiguously packed, rescaled blocks covering that window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MorningScheduleConfig {
    pub wake_time: String,
    pub morning_end_time: String,
    pub blocks: Vec<ScheduleBlock>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WakeComparisonKind {
    Late,
    Early,
    #[serde(rename = "ontime")]
    OnTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WakeComparison {
    pub kind: WakeComparisonKind,
    pub minutes: u32,
    pub message: String,
}

/// Nominal definition of one morning block: the identifier, display title, and
/// baseline duration that proportional scaling is computed against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MorningBlockDefault {
    pub id: String,
    pub title: String,
    pub duration_minutes: u32,
}

impl MorningBlockDefault {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "morning_block.id")?;
        validate_non_empty(&self.title, "morning_block.title")?;
        if self.duration_minutes == 0 {
            return Err("morning_block.duration_minutes must be > 0".to_string());
        }
        Ok(())
    }
}

/// Scheduler configuration: the default wake time, the fixed morning-end time,
/// and the closed set of morning blocks with their baseline durations.
///
/// Passed explicitly into the scheduler functions so tests can substitute
/// alternate baselines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulerPolicy {
    pub default_wake_time: String,
    pub morning_end_time: String,
    pub default_blocks: Vec<MorningBlockDefault>,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            default_wake_time: "05:00".to_string(),
            morning_end_time: "09:00".to_string(),
            default_blocks: vec![
                morning_block("activation", "Wake & Activation", 20),
                morning_block("language-study", "Language Study", 25),
                morning_block("reading", "Morning Reading", 20),
                morning_block("gym", "Gym", 90),
                morning_block("grooming", "Shower & Grooming", 30),
                morning_block("breakfast", "Breakfast", 25),
                morning_block("commute", "Commute", 30),
            ],
        }
    }
}

impl SchedulerPolicy {
    /// Sum of the baseline durations; 240 in the default configuration.
    pub fn baseline_total_minutes(&self) -> u32 {
        self.default_blocks
            .iter()
            .map(|block| block.duration_minutes)
            .sum()
    }

    pub fn is_morning_block(&self, id: &str) -> bool {
        self.default_blocks.iter().any(|block| block.id == id)
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_hhmm(&self.default_wake_time, "policy.default_wake_time")?;
        validate_hhmm(&self.morning_end_time, "policy.morning_end_time")?;
        if self.default_blocks.is_empty() {
            return Err("policy.default_blocks must not be empty".to_string());
        }
        for block in &self.default_blocks {
            block.validate()?;
        }
        for (index, block) in self.default_blocks.iter().enumerate() {
            if self.default_blocks[..index]
                .iter()
                .any(|earlier| earlier.id == block.id)
            {
                return Err(format!(
                    "policy.default_blocks has duplicate id {:?}",
                    block.id
                ));
            }
        }
        Ok(())
    }
}

fn morning_block(id: &str, title: &str, duration_minutes: u32) -> MorningBlockDefault {
    MorningBlockDefault {
        id: id.to_string(),
        title: title.to_string(),
        duration_minutes,
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    parse_hhmm(value).map_err(|_| format!("{field_name} must be HH:MM"))?;
    Ok(())
}
