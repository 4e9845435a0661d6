use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::matching::{
    RedFlagConfig, ScoringConfig, ScoringWeights, SkillSynonymTable, SynonymTableError,
};
use crate::workflows::pipeline::{HealthConfig, HealthWeights};
use crate::workflows::retry::RetryPolicy;
use crate::workflows::scheduling::SchedulingConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the service and its decision engines.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let engine = EngineSettings::from_env()?;
        engine.validate()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Every tunable of the scoring, health, and scheduling engines.
///
/// Values come from the environment with documented defaults; `validate` must pass before any
/// engine is built from them.
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub scoring: ScoringConfig,
    pub red_flags: RedFlagConfig,
    pub health: HealthConfig,
    pub scheduling: SchedulingConfig,
    pub retry: RetryPolicy,
    pub synonyms_path: Option<PathBuf>,
}

impl EngineSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let scoring = ScoringConfig {
            weights: ScoringWeights {
                skill: env_or("FITSCORE_WEIGHT_SKILL", defaults.scoring.weights.skill)?,
                experience: env_or(
                    "FITSCORE_WEIGHT_EXPERIENCE",
                    defaults.scoring.weights.experience,
                )?,
                domain: env_or("FITSCORE_WEIGHT_DOMAIN", defaults.scoring.weights.domain)?,
                quality: env_or("FITSCORE_WEIGHT_QUALITY", defaults.scoring.weights.quality)?,
            },
            nice_to_have_bonus: env_or(
                "FITSCORE_NICE_TO_HAVE_BONUS",
                defaults.scoring.nice_to_have_bonus,
            )?,
            overqualified_floor: env_or(
                "FITSCORE_OVERQUALIFIED_FLOOR",
                defaults.scoring.overqualified_floor,
            )?,
            overqualified_span_years: env_or(
                "FITSCORE_OVERQUALIFIED_SPAN_YEARS",
                defaults.scoring.overqualified_span_years,
            )?,
            quality_stability_share: env_or(
                "FITSCORE_QUALITY_STABILITY_SHARE",
                defaults.scoring.quality_stability_share,
            )?,
            flag_penalty: env_or("FITSCORE_FLAG_PENALTY", defaults.scoring.flag_penalty)?,
        };

        let red_flags = RedFlagConfig {
            short_tenure_months: env_or(
                "REDFLAG_SHORT_TENURE_MONTHS",
                defaults.red_flags.short_tenure_months,
            )?,
            job_hop_max_roles: env_or(
                "REDFLAG_JOB_HOP_MAX_ROLES",
                defaults.red_flags.job_hop_max_roles,
            )?,
            job_hop_window_years: env_or(
                "REDFLAG_JOB_HOP_WINDOW_YEARS",
                defaults.red_flags.job_hop_window_years,
            )?,
            gap_months: env_or("REDFLAG_GAP_MONTHS", defaults.red_flags.gap_months)?,
        };

        let health_defaults = &defaults.health;
        let health = HealthConfig {
            qualification_threshold: env_or(
                "HEALTH_QUALIFICATION_THRESHOLD",
                health_defaults.qualification_threshold,
            )?,
            qualified_target: env_or("HEALTH_QUALIFIED_TARGET", health_defaults.qualified_target)?,
            new_application_target: env_or(
                "HEALTH_NEW_APPLICATION_TARGET",
                health_defaults.new_application_target,
            )?,
            reply_rate_target: env_or(
                "HEALTH_REPLY_RATE_TARGET",
                health_defaults.reply_rate_target,
            )?,
            weights: HealthWeights {
                qualified: env_or("HEALTH_WEIGHT_QUALIFIED", health_defaults.weights.qualified)?,
                new_applications: env_or(
                    "HEALTH_WEIGHT_NEW_APPLICATIONS",
                    health_defaults.weights.new_applications,
                )?,
                reply_rate: env_or(
                    "HEALTH_WEIGHT_REPLY_RATE",
                    health_defaults.weights.reply_rate,
                )?,
            },
            low_water: env_or("HEALTH_LOW_WATER", health_defaults.low_water)?,
            high_water: env_or("HEALTH_HIGH_WATER", health_defaults.high_water)?,
            debounce: Duration::from_secs(env_or(
                "HEALTH_DEBOUNCE_SECS",
                health_defaults.debounce.as_secs(),
            )?),
            sweep_interval: Duration::from_secs(env_or(
                "HEALTH_SWEEP_SECS",
                health_defaults.sweep_interval.as_secs(),
            )?),
            new_application_window: env_span(
                "HEALTH_NEW_APPLICATION_WINDOW_HOURS",
                health_defaults.new_application_window.num_hours(),
                chrono::Duration::try_hours,
            )?,
            reply_window: env_span(
                "HEALTH_REPLY_WINDOW_DAYS",
                health_defaults.reply_window.num_days(),
                chrono::Duration::try_days,
            )?,
        };

        let scheduling = SchedulingConfig {
            slot_count: env_or("SCHEDULING_SLOT_COUNT", defaults.scheduling.slot_count)?,
            max_slot_count: env_or(
                "SCHEDULING_MAX_SLOT_COUNT",
                defaults.scheduling.max_slot_count,
            )?,
            slot_duration: env_span(
                "SCHEDULING_SLOT_MINUTES",
                defaults.scheduling.slot_duration.num_minutes(),
                chrono::Duration::try_minutes,
            )?,
            proposal_ttl: env_span(
                "SCHEDULING_PROPOSAL_TTL_HOURS",
                defaults.scheduling.proposal_ttl.num_hours(),
                chrono::Duration::try_hours,
            )?,
            horizon_days: env_or("SCHEDULING_HORIZON_DAYS", defaults.scheduling.horizon_days)?,
        };

        let retry = RetryPolicy {
            max_attempts: env_or("COLLABORATOR_RETRY_ATTEMPTS", defaults.retry.max_attempts)?,
            base_delay: Duration::from_millis(env_or(
                "COLLABORATOR_RETRY_BASE_MS",
                millis(defaults.retry.base_delay),
            )?),
            timeout: Duration::from_millis(env_or(
                "COLLABORATOR_TIMEOUT_MS",
                millis(defaults.retry.timeout),
            )?),
        };

        let synonyms_path = env::var("SKILL_SYNONYMS_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            scoring,
            red_flags,
            health,
            scheduling,
            retry,
            synonyms_path,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.validate()?;
        self.red_flags.validate()?;
        self.health.validate()?;
        self.scheduling.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    /// Built-in synonym table, extended by the configured CSV file when present.
    pub fn load_synonyms(&self) -> Result<SkillSynonymTable, ConfigError> {
        match &self.synonyms_path {
            Some(path) => SkillSynonymTable::from_path(path).map_err(|source| {
                ConfigError::Synonyms {
                    path: path.clone(),
                    source,
                }
            }),
            None => Ok(SkillSynonymTable::with_defaults()),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Whole-unit span such as `try_hours`; values chrono cannot represent are a config error.
fn env_span(
    key: &'static str,
    default: i64,
    span: fn(i64) -> Option<chrono::Duration>,
) -> Result<chrono::Duration, ConfigError> {
    let value = env_or(key, default)?;
    span(value).ok_or_else(|| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

pub(crate) fn ensure_unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!("must be within [0, 1], got {value}"),
        ))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidValue {
        key: &'static str,
        value: String,
    },
    Invalid {
        field: &'static str,
        reason: String,
    },
    WeightsDoNotSumToOne {
        section: &'static str,
        sum: f64,
    },
    Synonyms {
        path: PathBuf,
        source: SynonymTableError,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an unparseable value '{value}'")
            }
            ConfigError::Invalid { field, reason } => write!(f, "{field} {reason}"),
            ConfigError::WeightsDoNotSumToOne { section, sum } => {
                write!(f, "{section} weights must sum to 1.0, got {sum:.4}")
            }
            ConfigError::Synonyms { path, .. } => {
                write!(f, "unable to load skill synonyms from {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Synonyms { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::Invalid { .. }
            | ConfigError::WeightsDoNotSumToOne { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const ENGINE_KEYS: &[&str] = &[
        "FITSCORE_WEIGHT_SKILL",
        "FITSCORE_WEIGHT_EXPERIENCE",
        "FITSCORE_WEIGHT_DOMAIN",
        "FITSCORE_WEIGHT_QUALITY",
        "HEALTH_LOW_WATER",
        "HEALTH_HIGH_WATER",
        "SCHEDULING_SLOT_COUNT",
        "SCHEDULING_SLOT_MINUTES",
        "SCHEDULING_HORIZON_DAYS",
        "HEALTH_REPLY_WINDOW_DAYS",
        "SKILL_SYNONYMS_PATH",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        for key in ENGINE_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine.scoring.weights.skill, 0.5);
        assert_eq!(config.engine.scheduling.slot_count, 3);
        assert_eq!(config.engine.health.debounce, Duration::from_secs(300));
        assert!(config.engine.synonyms_path.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FITSCORE_WEIGHT_SKILL", "0.5");
        env::set_var("FITSCORE_WEIGHT_EXPERIENCE", "0.2");
        env::set_var("FITSCORE_WEIGHT_DOMAIN", "0.1");
        env::set_var("FITSCORE_WEIGHT_QUALITY", "0.1");

        let error = AppConfig::load().expect_err("weights summing to 0.9 are fatal");
        reset_env();

        match error {
            ConfigError::WeightsDoNotSumToOne { section, sum } => {
                assert_eq!(section, "scoring");
                assert!((sum - 0.9).abs() < 1e-9);
            }
            other => panic!("expected weight error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCHEDULING_SLOT_COUNT", "three");

        let error = AppConfig::load().expect_err("non-numeric slot count is fatal");
        reset_env();

        assert!(matches!(
            error,
            ConfigError::InvalidValue {
                key: "SCHEDULING_SLOT_COUNT",
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_durations_are_config_errors() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        let cases = [
            ("SCHEDULING_SLOT_MINUTES", "9223372036854775807"),
            ("HEALTH_REPLY_WINDOW_DAYS", "-9223372036854775808"),
        ];

        for (key, value) in cases {
            reset_env();
            env::set_var(key, value);
            let error = EngineSettings::from_env().expect_err("unrepresentable span is fatal");
            reset_env();

            match error {
                ConfigError::InvalidValue { key: reported, .. } => assert_eq!(reported, key),
                other => panic!("expected invalid value for {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn look_back_and_horizon_beyond_a_year_fail_validation() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        let cases = [
            ("SCHEDULING_HORIZON_DAYS", "4294967295", "horizon_days"),
            ("HEALTH_REPLY_WINDOW_DAYS", "100000", "reply_window"),
        ];

        for (key, value, field) in cases {
            reset_env();
            env::set_var(key, value);
            let error = AppConfig::load().expect_err("unbounded window is fatal");
            reset_env();

            assert!(error.to_string().contains(field), "{error}");
        }
    }

    #[test]
    fn rejects_inverted_water_marks() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("HEALTH_LOW_WATER", "0.9");
        env::set_var("HEALTH_HIGH_WATER", "0.8");

        let error = AppConfig::load().expect_err("low water above high water is fatal");
        reset_env();

        assert!(error.to_string().contains("low_water"));
    }

    #[test]
    fn missing_synonym_file_is_reported() {
        let settings = EngineSettings {
            synonyms_path: Some(PathBuf::from("/definitely/not/here.csv")),
            ..EngineSettings::default()
        };
        let error = settings.load_synonyms().expect_err("missing file fails");
        assert!(matches!(error, ConfigError::Synonyms { .. }));
    }
}
