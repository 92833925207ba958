use crate::application::bootstrap::bootstrap_workspace;
use crate::domain::models::{
    MorningScheduleConfig, ScheduleBlock, SchedulerPolicy, WakeComparison,
};
use crate::domain::scheduler::{
    apply_morning_adjustment, calculate_morning_schedule, compare_wake_time,
};
use crate::domain::time::{format_hhmm, parse_hhmm};
use crate::infrastructure::config::{load_scheduler_policy, read_app_name};
use crate::infrastructure::error::InfraError;
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    runtime: Mutex<RuntimeState>,
    log_guard: Mutex<()>,
}

impl AppState {
    pub fn new(workspace_root: PathBuf) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let policy = load_scheduler_policy(&bootstrap.config_dir)?;
        let day_blocks = default_day_blocks(&policy)?;

        let state = Self {
            config_dir: bootstrap.config_dir,
            logs_dir: bootstrap.logs_dir,
            runtime: Mutex::new(RuntimeState {
                day_blocks: day_blocks.clone(),
                nominal_blocks: day_blocks,
                morning_config: None,
            }),
            log_guard: Mutex::new(()),
        };

        let app_name = read_app_name(state.config_dir())?;
        state.log_info("bootstrap", &format!("{app_name} workspace initialized"));
        Ok(state)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

/// `day_blocks` is the displayed list (possibly carrying scaled durations);
/// `nominal_blocks` keeps the unscaled durations every recalculation starts
/// from, so repeated commits never compound the scaling.
#[derive(Debug, Default)]
struct RuntimeState {
    day_blocks: Vec<ScheduleBlock>,
    nominal_blocks: Vec<ScheduleBlock>,
    morning_config: Option<MorningScheduleConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WakePreviewResponse {
    pub config: MorningScheduleConfig,
    pub comparison: WakeComparison,
}

/// Recalculates the morning schedule for the given wake time and commits it:
/// the adjusted blocks are merged into the day's block list and the resulting
/// config is stored as the active one.
///
/// Scaling always starts from the nominal durations, never from a previously
/// committed schedule, so identical calls commit identical schedules.
pub fn set_wake_time_impl(
    state: &AppState,
    wake_time: String,
    morning_end: Option<String>,
) -> Result<MorningScheduleConfig, InfraError> {
    let wake_time = wake_time.trim().to_string();
    let policy = load_scheduler_policy(state.config_dir())?;
    let morning_end_time = resolve_morning_end(morning_end, &policy);

    let mut runtime = lock_runtime(state)?;
    let config = calculate_morning_schedule(
        &wake_time,
        &morning_end_time,
        &runtime.nominal_blocks,
        &policy,
    )?;
    runtime.day_blocks = apply_morning_adjustment(&runtime.nominal_blocks, &config, &policy);
    runtime.morning_config = Some(config.clone());
    drop(runtime);

    state.log_info(
        "set_wake_time",
        &format!(
            "rescheduled {} morning blocks for wake {} end {}",
            config.blocks.len(),
            config.wake_time,
            config.morning_end_time
        ),
    );
    Ok(config)
}

/// Same recalculation as [`set_wake_time_impl`] but without committing, plus
/// the wake-time comparison. Intended for per-keystroke preview calls.
pub fn preview_wake_time_impl(
    state: &AppState,
    wake_time: String,
    morning_end: Option<String>,
) -> Result<WakePreviewResponse, InfraError> {
    let wake_time = wake_time.trim().to_string();
    let policy = load_scheduler_policy(state.config_dir())?;
    let morning_end_time = resolve_morning_end(morning_end, &policy);

    let nominal_blocks = lock_runtime(state)?.nominal_blocks.clone();
    let config =
        calculate_morning_schedule(&wake_time, &morning_end_time, &nominal_blocks, &policy)?;
    let comparison = compare_wake_time(&wake_time, &policy)?;
    Ok(WakePreviewResponse { config, comparison })
}

pub fn get_wake_comparison_impl(
    state: &AppState,
    wake_time: String,
) -> Result<WakeComparison, InfraError> {
    let policy = load_scheduler_policy(state.config_dir())?;
    Ok(compare_wake_time(wake_time.trim(), &policy)?)
}

pub fn list_day_blocks_impl(state: &AppState) -> Result<Vec<ScheduleBlock>, InfraError> {
    Ok(lock_runtime(state)?.day_blocks.clone())
}

pub fn get_morning_config_impl(
    state: &AppState,
) -> Result<Option<MorningScheduleConfig>, InfraError> {
    Ok(lock_runtime(state)?.morning_config.clone())
}

/// Replaces the day's block list; the supplied durations become the nominal
/// values future recalculations scale from. Any previously committed morning
/// config is discarded since it was computed against the old list.
pub fn set_day_blocks_impl(
    state: &AppState,
    blocks: Vec<ScheduleBlock>,
) -> Result<Vec<ScheduleBlock>, InfraError> {
    for block in &blocks {
        block.validate().map_err(InfraError::InvalidConfig)?;
    }
    for (index, block) in blocks.iter().enumerate() {
        if blocks[..index].iter().any(|earlier| earlier.id == block.id) {
            return Err(InfraError::InvalidConfig(format!(
                "duplicate block id {:?}",
                block.id
            )));
        }
    }

    let mut runtime = lock_runtime(state)?;
    runtime.nominal_blocks = blocks.clone();
    runtime.day_blocks = blocks;
    runtime.morning_config = None;
    Ok(runtime.day_blocks.clone())
}

/// Restores the policy's default morning blocks at their nominal durations.
pub fn reset_day_impl(state: &AppState) -> Result<Vec<ScheduleBlock>, InfraError> {
    let policy = load_scheduler_policy(state.config_dir())?;
    let day_blocks = default_day_blocks(&policy)?;

    let mut runtime = lock_runtime(state)?;
    runtime.nominal_blocks = day_blocks.clone();
    runtime.day_blocks = day_blocks;
    runtime.morning_config = None;
    let blocks = runtime.day_blocks.clone();
    drop(runtime);

    state.log_info("reset_day", &format!("restored {} default blocks", blocks.len()));
    Ok(blocks)
}

fn resolve_morning_end(morning_end: Option<String>, policy: &SchedulerPolicy) -> String {
    morning_end
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| policy.morning_end_time.clone())
}

fn default_day_blocks(policy: &SchedulerPolicy) -> Result<Vec<ScheduleBlock>, InfraError> {
    let mut current_time = i64::from(parse_hhmm(&policy.default_wake_time)?);
    let mut blocks = Vec::with_capacity(policy.default_blocks.len());
    for default in &policy.default_blocks {
        let start_time = format_hhmm(current_time);
        current_time += i64::from(default.duration_minutes);
        blocks.push(ScheduleBlock {
            id: default.id.clone(),
            title: default.title.clone(),
            start_time,
            end_time: format_hhmm(current_time),
            duration_minutes: default.duration_minutes,
            adjusted: false,
        });
    }
    Ok(blocks)
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|_| InfraError::InvalidConfig("runtime state lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScheduleError;
    use crate::domain::models::WakeComparisonKind;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "morningplan-command-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }

        fn app_state(&self) -> AppState {
            AppState::new(self.path.clone()).expect("initialize app state")
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn evening_block() -> ScheduleBlock {
        ScheduleBlock {
            id: "evening-review".to_string(),
            title: "Evening Review".to_string(),
            start_time: "21:00".to_string(),
            end_time: "21:30".to_string(),
            duration_minutes: 30,
            adjusted: false,
        }
    }

    #[test]
    fn bootstrap_seeds_default_day_and_writes_configs() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        assert!(workspace.path.join("config").join("schedule.json").exists());
        assert!(workspace.path.join("logs").exists());

        let blocks = list_day_blocks_impl(&state).expect("list blocks");
        assert_eq!(blocks.len(), 7);
        assert_eq!(blocks[0].start_time, "05:00");
        assert_eq!(blocks.last().expect("blocks").end_time, "09:00");
        assert!(blocks.iter().all(|block| !block.adjusted));

        let log = fs::read_to_string(workspace.path.join("logs").join("commands.log"))
            .expect("read command log");
        assert!(log.contains("MorningPlan workspace initialized"));
    }

    #[test]
    fn set_wake_time_commits_the_adjusted_schedule() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let config =
            set_wake_time_impl(&state, "06:00".to_string(), None).expect("set wake time");
        assert_eq!(config.morning_end_time, "09:00");

        let blocks = list_day_blocks_impl(&state).expect("list blocks");
        let gym = blocks.iter().find(|block| block.id == "gym").expect("gym");
        assert_eq!(gym.duration_minutes, 68);
        assert!(gym.adjusted);

        let stored = get_morning_config_impl(&state).expect("get config");
        assert_eq!(stored, Some(config));
    }

    #[test]
    fn recommitting_the_same_wake_time_is_idempotent() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let first = set_wake_time_impl(&state, "06:00".to_string(), None).expect("first commit");
        let second =
            set_wake_time_impl(&state, "06:00".to_string(), None).expect("second commit");
        assert_eq!(first, second);

        let blocks = list_day_blocks_impl(&state).expect("list blocks");
        let gym = blocks.iter().find(|block| block.id == "gym").expect("gym");
        assert_eq!(gym.duration_minutes, 68);
    }

    #[test]
    fn recommitting_the_default_wake_time_restores_nominal_durations() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        set_wake_time_impl(&state, "06:00".to_string(), None).expect("late commit");
        set_wake_time_impl(&state, "05:00".to_string(), None).expect("default commit");

        let blocks = list_day_blocks_impl(&state).expect("list blocks");
        let gym = blocks.iter().find(|block| block.id == "gym").expect("gym");
        assert_eq!(gym.duration_minutes, 90);
        assert_eq!(blocks.last().expect("blocks").end_time, "09:00");
    }

    #[test]
    fn commits_scale_from_user_supplied_nominal_durations() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let mut blocks = list_day_blocks_impl(&state).expect("list blocks");
        blocks
            .iter_mut()
            .find(|block| block.id == "gym")
            .expect("gym")
            .duration_minutes = 60;
        set_day_blocks_impl(&state, blocks).expect("set day blocks");

        set_wake_time_impl(&state, "06:00".to_string(), None).expect("late commit");
        set_wake_time_impl(&state, "05:00".to_string(), None).expect("default commit");

        let blocks = list_day_blocks_impl(&state).expect("list blocks");
        let gym = blocks.iter().find(|block| block.id == "gym").expect("gym");
        assert_eq!(gym.duration_minutes, 60);
    }

    #[test]
    fn set_wake_time_leaves_non_morning_blocks_untouched() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let mut blocks = list_day_blocks_impl(&state).expect("list blocks");
        blocks.push(evening_block());
        set_day_blocks_impl(&state, blocks).expect("set day blocks");

        set_wake_time_impl(&state, "06:30".to_string(), None).expect("set wake time");
        let blocks = list_day_blocks_impl(&state).expect("list blocks");
        assert_eq!(blocks.last().expect("blocks"), &evening_block());
    }

    #[test]
    fn set_wake_time_rejects_inverted_window() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let result = set_wake_time_impl(&state, "10:00".to_string(), Some("09:00".to_string()));
        match result {
            Err(InfraError::Schedule(ScheduleError::InvalidWindow { .. })) => {}
            other => panic!("expected invalid window error, got {other:?}"),
        }
    }

    #[test]
    fn preview_does_not_commit() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let preview = preview_wake_time_impl(&state, "06:00".to_string(), None)
            .expect("preview wake time");
        assert_eq!(preview.comparison.kind, WakeComparisonKind::Late);
        assert_eq!(preview.comparison.minutes, 60);
        assert_eq!(
            preview
                .config
                .blocks
                .iter()
                .find(|block| block.id == "gym")
                .expect("gym")
                .duration_minutes,
            68
        );

        let blocks = list_day_blocks_impl(&state).expect("list blocks");
        let gym = blocks.iter().find(|block| block.id == "gym").expect("gym");
        assert_eq!(gym.duration_minutes, 90);
        assert!(get_morning_config_impl(&state).expect("get config").is_none());
    }

    #[test]
    fn wake_comparison_on_the_default_is_ontime() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        let comparison =
            get_wake_comparison_impl(&state, "05:00".to_string()).expect("comparison");
        assert_eq!(comparison.kind, WakeComparisonKind::OnTime);
        assert_eq!(comparison.minutes, 0);
    }

    #[test]
    fn set_day_blocks_rejects_invalid_blocks() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let mut bad_time = evening_block();
        bad_time.start_time = "9pm".to_string();
        assert!(set_day_blocks_impl(&state, vec![bad_time]).is_err());

        let duplicated = vec![evening_block(), evening_block()];
        assert!(set_day_blocks_impl(&state, duplicated).is_err());
    }

    #[test]
    fn reset_day_restores_nominal_durations() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        set_wake_time_impl(&state, "07:00".to_string(), None).expect("set wake time");
        let restored = reset_day_impl(&state).expect("reset day");

        assert_eq!(restored.len(), 7);
        let gym = restored.iter().find(|block| block.id == "gym").expect("gym");
        assert_eq!(gym.duration_minutes, 90);
        assert!(!gym.adjusted);
        assert!(get_morning_config_impl(&state).expect("get config").is_none());
    }

    #[test]
    fn command_error_logs_and_returns_the_message() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();

        let error = InfraError::InvalidConfig("bad input".to_string());
        let message = state.command_error("set_wake_time", &error);
        assert_eq!(message, "Invalid config: bad input");

        let log = fs::read_to_string(workspace.path.join("logs").join("commands.log"))
            .expect("read command log");
        assert!(log.contains("\"level\":\"error\""));
        assert!(log.contains("set_wake_time"));
    }
}
