use std::time::Duration;

use trustchain_core::config::EngineConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Trust engine tunables, validated at startup.
    pub engine: EngineConfig,
    /// Scoring model service endpoint; neutral scoring when unset.
    pub scoring_url: Option<String>,
    /// Hard timeout for scoring calls (default: `5` seconds).
    pub scoring_timeout: Duration,
    /// DKG gateway base URL; no-op ledger when unset.
    pub ledger_url: Option<String>,
    /// Hard timeout for ledger calls (default: `10` seconds).
    pub ledger_timeout: Duration,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `3000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                    |
    /// | `SCORING_URL`            | unset (neutral scores)  |
    /// | `SCORING_TIMEOUT_SECS`   | `5`                     |
    /// | `LEDGER_URL`             | unset (no-op ledger)    |
    /// | `LEDGER_TIMEOUT_SECS`    | `10`                    |
    ///
    /// Engine tunables (see [`engine_from_env`]):
    /// `TRUST_HALF_LIFE_DAYS`, `TRUST_FLAG_PENALTY`, `TRUST_VALID_THRESHOLD`,
    /// `TRUST_WARNING_THRESHOLD`, `SIGNAL_WEIGHT_VALIDATION`,
    /// `SIGNAL_WEIGHT_ANOMALY`, `SIGNAL_WEIGHT_FRAUD`, `SIGNAL_FLOOR`,
    /// `FLAG_WINDOW_DAYS`, `MAX_FLAGS_IN_WINDOW`, `SKEW_TOLERANCE_SECS`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let engine = engine_from_env();
        engine
            .validate()
            .expect("Engine configuration is invalid");

        let scoring_timeout_secs: u64 = std::env::var("SCORING_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("SCORING_TIMEOUT_SECS must be a valid u64");

        let ledger_timeout_secs: u64 = std::env::var("LEDGER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("LEDGER_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            engine,
            scoring_url: std::env::var("SCORING_URL").ok(),
            scoring_timeout: Duration::from_secs(scoring_timeout_secs),
            ledger_url: std::env::var("LEDGER_URL").ok(),
            ledger_timeout: Duration::from_secs(ledger_timeout_secs),
        }
    }
}

/// Build the engine configuration from environment overrides on top of the
/// defaults. Validation happens in [`ServerConfig::from_env`] so a bad
/// override fails fast at startup.
pub fn engine_from_env() -> EngineConfig {
    let mut engine = EngineConfig::default();

    if let Some(v) = parse_env_f64("TRUST_HALF_LIFE_DAYS") {
        engine.trust.half_life_days = v;
    }
    if let Some(v) = parse_env_f64("TRUST_FLAG_PENALTY") {
        engine.trust.flag_penalty = v;
    }
    if let Some(v) = parse_env_f64("TRUST_VALID_THRESHOLD") {
        engine.trust.valid_threshold = v;
    }
    if let Some(v) = parse_env_f64("TRUST_WARNING_THRESHOLD") {
        engine.trust.warning_threshold = v;
    }
    if let Some(v) = parse_env_f64("TRUST_INITIAL") {
        engine.trust.initial_trust = v;
    }
    if let Some(v) = parse_env_f64("SIGNAL_WEIGHT_VALIDATION") {
        engine.weights.validation = v;
    }
    if let Some(v) = parse_env_f64("SIGNAL_WEIGHT_ANOMALY") {
        engine.weights.anomaly = v;
    }
    if let Some(v) = parse_env_f64("SIGNAL_WEIGHT_FRAUD") {
        engine.weights.fraud = v;
    }
    if let Some(v) = parse_env_f64("SIGNAL_FLOOR") {
        engine.resolver.signal_floor = v;
    }
    if let Some(v) = parse_env_i64("FLAG_WINDOW_DAYS") {
        engine.resolver.flag_window_days = v;
    }
    if let Some(v) = parse_env_i64("MAX_FLAGS_IN_WINDOW") {
        engine.resolver.max_flags_in_window = v as usize;
    }
    if let Some(v) = parse_env_i64("SKEW_TOLERANCE_SECS") {
        engine.skew_tolerance_secs = v;
    }

    engine
}

fn parse_env_f64(name: &str) -> Option<f64> {
    std::env::var(name)
        .ok()
        .map(|v| v.parse().unwrap_or_else(|_| panic!("{name} must be a valid number")))
}

fn parse_env_i64(name: &str) -> Option<i64> {
    std::env::var(name)
        .ok()
        .map(|v| v.parse().unwrap_or_else(|_| panic!("{name} must be a valid integer")))
}
