use std::{env, path::PathBuf, str::FromStr, time::Duration};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POINTS_PATH: &str = "data/points.txt";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ACCURACY: u32 = 3000;
pub const DEFAULT_LAST_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub points_path: PathBuf,
    /// Takes precedence over `points_path` when set.
    pub points_url: Option<String>,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub default_accuracy: u32,
    pub default_last_days: u32,
    /// UDP ingest is disabled unless a port is configured.
    pub udp_port: Option<u16>,
    /// Require a SHA1 digest on every UDP packet.
    pub signed: bool,
    pub packet_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            points_path: PathBuf::from(DEFAULT_POINTS_PATH),
            points_url: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            default_accuracy: DEFAULT_ACCURACY,
            default_last_days: DEFAULT_LAST_DAYS,
            udp_port: None,
            signed: false,
            packet_secret: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let seconds = |key: &str, fallback: Duration| {
            parse_positive::<u64>(lookup(key).as_deref())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        Self {
            port: lookup("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            points_path: lookup("POINTS_PATH")
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.points_path),
            points_url: lookup("POINTS_URL").filter(|value| !value.is_empty()),
            poll_interval: seconds("POLL_INTERVAL_SECS", defaults.poll_interval),
            fetch_timeout: seconds("FETCH_TIMEOUT_SECS", defaults.fetch_timeout),
            default_accuracy: parse_positive(lookup("DEFAULT_ACCURACY").as_deref())
                .unwrap_or(defaults.default_accuracy),
            default_last_days: parse_positive(lookup("DEFAULT_LAST_DAYS").as_deref())
                .unwrap_or(defaults.default_last_days),
            udp_port: lookup("UDP_PORT").and_then(|value| value.parse::<u16>().ok()),
            signed: parse_flag(lookup("SIGNED").as_deref()),
            packet_secret: lookup("GPS2UDP_SECRET").filter(|value| !value.is_empty()),
        }
    }
}

/// Parses a strictly positive number, `None` for anything else.
pub fn parse_positive<T>(value: Option<&str>) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    value
        .and_then(|value| value.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

/// `1`, `true`, `yes` and `on` in any case; everything else is off.
pub fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| {
        matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

/// Form-field semantics: unparseable input takes `default`, anything below
/// 1 is raised to 1.
pub fn positive_or(value: Option<&str>, default: u32) -> u32 {
    match value.and_then(|value| value.trim().parse::<i64>().ok()) {
        Some(value) => value.clamp(1, i64::from(u32::MAX)) as u32,
        None => default,
    }
}
