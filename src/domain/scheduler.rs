//! Adaptive morning-routine scheduling.
//!
//! Given a wake time and a fixed morning-end time, the calculator
//! proportionally compresses or expands the morning block sequence so it still
//! packs contiguously between the two boundaries, preserving relative order.

use crate::domain::ScheduleError;
use crate::domain::models::{
    MorningScheduleConfig, ScheduleBlock, SchedulerPolicy, WakeComparison, WakeComparisonKind,
};
use crate::domain::time::{format_hhmm, parse_hhmm};

/// Recomputes the morning schedule for the window `[wake_time, morning_end_time)`.
///
/// Each morning block's duration is scaled by `available / baseline` and
/// rounded half-up independently, then the blocks are packed back-to-back from
/// the wake time. Rounding drift is not redistributed, so the last block's end
/// may land a minute or two off the morning-end time.
///
/// Morning blocks are taken from `existing_blocks` (matched by id, caller
/// order and durations preserved); when none are present the policy's default
/// block set is used instead, so the result is never empty.
pub fn calculate_morning_schedule(
    wake_time: &str,
    morning_end_time: &str,
    existing_blocks: &[ScheduleBlock],
    policy: &SchedulerPolicy,
) -> Result<MorningScheduleConfig, ScheduleError> {
    let wake_minutes = parse_hhmm(wake_time)?;
    let end_minutes = parse_hhmm(morning_end_time)?;
    if end_minutes <= wake_minutes {
        return Err(ScheduleError::InvalidWindow {
            wake: wake_time.to_string(),
            end: morning_end_time.to_string(),
        });
    }

    let available_minutes = end_minutes - wake_minutes;
    // An unvalidated policy could carry a zero baseline; avoid dividing by it.
    let baseline_minutes = policy.baseline_total_minutes().max(1);
    let factor = f64::from(available_minutes) / f64::from(baseline_minutes);

    let mut selected: Vec<(&str, &str, u32)> = existing_blocks
        .iter()
        .filter(|block| policy.is_morning_block(&block.id))
        .map(|block| (block.id.as_str(), block.title.as_str(), block.duration_minutes))
        .collect();
    if selected.is_empty() {
        selected = policy
            .default_blocks
            .iter()
            .map(|block| (block.id.as_str(), block.title.as_str(), block.duration_minutes))
            .collect();
    }

    let mut current_time = i64::from(wake_minutes);
    let mut blocks = Vec::with_capacity(selected.len());
    for (id, title, duration_minutes) in selected {
        // Half-up rounding per block; a duration of 0 is accepted for very
        // small factors.
        let adjusted_duration = (f64::from(duration_minutes) * factor).round() as u32;
        let start_time = format_hhmm(current_time);
        current_time += i64::from(adjusted_duration);
        blocks.push(ScheduleBlock {
            id: id.to_string(),
            title: title.to_string(),
            start_time,
            end_time: format_hhmm(current_time),
            duration_minutes: adjusted_duration,
            adjusted: true,
        });
    }

    Ok(MorningScheduleConfig {
        wake_time: wake_time.to_string(),
        morning_end_time: morning_end_time.to_string(),
        blocks,
    })
}

/// Merges a recalculated morning schedule back into the full day's block list.
///
/// The result has the same length and order as `all_blocks`: morning-id blocks
/// are replaced by their id-matched adjusted counterpart, morning-id blocks
/// without a match and all non-morning blocks pass through unchanged.
pub fn apply_morning_adjustment(
    all_blocks: &[ScheduleBlock],
    config: &MorningScheduleConfig,
    policy: &SchedulerPolicy,
) -> Vec<ScheduleBlock> {
    all_blocks
        .iter()
        .map(|block| {
            if !policy.is_morning_block(&block.id) {
                return block.clone();
            }
            config
                .blocks
                .iter()
                .find(|adjusted| adjusted.id == block.id)
                .cloned()
                .unwrap_or_else(|| block.clone())
        })
        .collect()
}

/// Classifies a candidate wake time against the policy's default wake time.
/// Stateless; safe to re-evaluate on every picker change.
pub fn compare_wake_time(
    wake_time: &str,
    policy: &SchedulerPolicy,
) -> Result<WakeComparison, ScheduleError> {
    let wake_minutes = i64::from(parse_hhmm(wake_time)?);
    let default_minutes = i64::from(parse_hhmm(&policy.default_wake_time)?);
    let difference = wake_minutes - default_minutes;

    let comparison = if difference > 0 {
        let unit = minute_unit(difference);
        WakeComparison {
            kind: WakeComparisonKind::Late,
            minutes: difference as u32,
            message: format!(
                "Waking at {wake_time} leaves you {difference} fewer {unit} than planned."
            ),
        }
    } else if difference < 0 {
        let minutes = difference.unsigned_abs() as u32;
        let unit = minute_unit(i64::from(minutes));
        WakeComparison {
            kind: WakeComparisonKind::Early,
            minutes,
            message: format!(
                "Waking at {wake_time} gives you {minutes} more {unit} than planned."
            ),
        }
    } else {
        WakeComparison {
            kind: WakeComparisonKind::OnTime,
            minutes: 0,
            message: "Right on schedule.".to_string(),
        }
    };
    Ok(comparison)
}

fn minute_unit(count: i64) -> &'static str {
    if count == 1 { "minute" } else { "minutes" }
}
