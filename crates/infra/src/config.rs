use chrono_tz::Tz;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the application to run on
    pub port: usize,
    /// Postgres connection string. The events are only kept in memory when absent.
    pub database_url: Option<String>,
    /// Timezone used for calendar arithmetic when rolling recurring events forward
    pub timezone: Tz,
    /// Seconds between periodic refreshes of overdue events. Zero disables it.
    pub refresh_interval_secs: u64,
    /// Number of sample events to seed on startup. Only used with the in memory store.
    pub sample_events: usize,
    /// Seed for the sample events, random when absent
    pub sample_seed: Option<u64>,
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default.",
                    name, value
                );
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    pub fn new() -> Self {
        let port = parse_env("PORT", 5000);

        let database_url = std::env::var("DATABASE_URL").ok();
        if database_url.is_none() {
            info!("Did not find DATABASE_URL environment variable. Events will only be kept in memory.");
        }

        let timezone = match std::env::var("COUNTDOWN_TIMEZONE") {
            Ok(tz) => match tz.parse::<Tz>() {
                Ok(tz) => tz,
                Err(_) => {
                    warn!(
                        "The given COUNTDOWN_TIMEZONE: {} is not valid, falling back to UTC.",
                        tz
                    );
                    Tz::UTC
                }
            },
            Err(_) => Tz::UTC,
        };

        let sample_seed = std::env::var("SAMPLE_SEED")
            .ok()
            .and_then(|seed| seed.parse::<u64>().ok());

        Self {
            port,
            database_url,
            timezone,
            refresh_interval_secs: parse_env("REFRESH_INTERVAL_SECS", 60),
            sample_events: parse_env("SAMPLE_EVENTS", 0),
            sample_seed,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
