pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod logging;
pub mod planning;
pub mod runtime_paths;
pub mod tasks;

pub type Result<T> = std::result::Result<T, error::PlannerError>;

/// Build identifier baked in by `build.rs`.
pub const GIT_SHA: &str = env!("TASKPLANNER_GIT_SHA");
