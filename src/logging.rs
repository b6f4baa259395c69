use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TASKPLANNER_LOG";

pub fn default_filter(component: &str) -> String {
    format!("info,taskplanner=debug,tower_http=info,{component}=debug")
}

pub fn init_tracing(component: &str) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_filter(component)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_names_component() {
        let filter = default_filter("taskplannerd");
        assert!(filter.starts_with("info,"));
        assert!(filter.ends_with("taskplannerd=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }

    #[test]
    fn init_is_idempotent() {
        init_tracing("taskplanner_tests");
        init_tracing("taskplanner_tests");
    }
}
