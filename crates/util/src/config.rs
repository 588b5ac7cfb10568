use std::{env, fmt, net::SocketAddr};

use super::{database_url, server_bind_address};

const DEFAULT_RATING_MIN: f64 = 1.0;
const DEFAULT_RATING_MAX: f64 = 5.0;

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// How strictly submitted reviews are checked before they are stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReviewValidation {
    /// Reviews are stored as submitted.
    Lenient,
    /// Every review field is required and the rating must fall in `min..=max`.
    Strict { rating_min: f64, rating_max: f64 },
}

impl ReviewValidation {
    fn from_env() -> Result<Self, ConfigError> {
        let mode = env::var("REVIEW_VALIDATION").unwrap_or_else(|_| "lenient".to_string());
        match mode.as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => {
                let rating_min = rating_bound("REVIEW_RATING_MIN", DEFAULT_RATING_MIN)?;
                let rating_max = rating_bound("REVIEW_RATING_MAX", DEFAULT_RATING_MAX)?;
                if rating_min > rating_max {
                    return Err(ConfigError::InvertedRatingRange {
                        min: rating_min,
                        max: rating_max,
                    });
                }
                Ok(Self::Strict {
                    rating_min,
                    rating_max,
                })
            }
            other => Err(ConfigError::InvalidReviewValidation(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict { .. } => "strict",
        }
    }
}

fn rating_bound(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ConfigError::InvalidRatingBound { name, value: raw }),
        },
        Err(_) => Ok(default),
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub database_url: String,
    pub review_validation: ReviewValidation,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address()?;
        let review_validation = ReviewValidation::from_env()?;

        Ok(Self {
            bind_addr,
            environment,
            database_url: database_url(),
            review_validation,
        })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    InvalidPort(String),
    InvalidReviewValidation(String),
    InvalidRatingBound { name: &'static str, value: String },
    InvertedRatingRange { min: f64, max: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::InvalidPort(value) => write!(f, "PORT must be a number in 0..=65535 (got {value})"),
            Self::InvalidReviewValidation(value) => write!(
                f,
                "REVIEW_VALIDATION must be 'lenient' or 'strict' (got {value})"
            ),
            Self::InvalidRatingBound { name, value } => {
                write!(f, "{name} must be a finite number (got {value})")
            }
            Self::InvertedRatingRange { min, max } => write!(
                f,
                "REVIEW_RATING_MIN ({min}) must not exceed REVIEW_RATING_MAX ({max})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
