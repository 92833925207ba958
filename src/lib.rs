//! Scheduling core for a personal daily planner.
//!
//! The domain layer holds the adaptive morning-routine scheduler and its time
//! arithmetic; the application layer wraps it in stateful commands over a
//! workspace directory (JSON config plus a command log). The UI shell that
//! consumes these commands lives outside this crate.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::bootstrap::{BootstrapResult, bootstrap_workspace};
pub use application::commands::{
    AppState, WakePreviewResponse, get_morning_config_impl, get_wake_comparison_impl,
    list_day_blocks_impl, preview_wake_time_impl, reset_day_impl, set_day_blocks_impl,
    set_wake_time_impl,
};
pub use domain::ScheduleError;
pub use domain::models::{
    MorningBlockDefault, MorningScheduleConfig, ScheduleBlock, SchedulerPolicy, WakeComparison,
    WakeComparisonKind,
};
pub use domain::scheduler::{
    apply_morning_adjustment, calculate_morning_schedule, compare_wake_time,
};
pub use domain::time::{format_clock, format_hhmm, parse_hhmm};
pub use infrastructure::config::{ensure_default_configs, load_scheduler_policy};
pub use infrastructure::error::InfraError;
