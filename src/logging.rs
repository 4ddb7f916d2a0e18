use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "CAMPUSFLOW_LOG";

/// Pick the filter directive: `$CAMPUSFLOW_LOG`, then `-v` count, then the
/// config file's `log.level`, then "warn".
pub fn filter_directive(env_value: Option<&str>, verbosity: u8, config_level: Option<&str>) -> String {
    if let Some(v) = env_value.map(str::trim).filter(|v| !v.is_empty()) {
        return v.to_string();
    }
    match verbosity {
        0 => config_level
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or("warn")
            .to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the stderr subscriber. Stdout stays clean for command output.
pub fn init_logging(verbosity: u8, config_level: Option<&str>) {
    let env_value = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(env_value.as_deref(), verbosity, config_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
