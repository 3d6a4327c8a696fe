use crate::error::{config_error, env_error, ReportResult};
use chrono::NaiveDate;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Default timezone used to interpret report dates
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";

/// Default Google Calendar API endpoint
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Main configuration structure for the report generator
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// Where the OAuth token is stored
    pub token_path: PathBuf,
    /// Timezone for interpreting report dates
    pub timezone: String,
    /// Directory the chart images are written to
    pub reports_dir: PathBuf,
    /// Explicit proxy for calendar API traffic
    pub proxy: Option<String>,
    /// Calendar API base URL
    pub api_base: String,
    /// TrueType/OpenType font used for chart text
    pub chart_font: Option<PathBuf>,
    /// How many calendars may be fetched at once
    pub max_concurrent_requests: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment and .env file
    pub fn load() -> ReportResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;

        let token_path = env::var("GOOGLE_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("token.json"));

        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from(DEFAULT_TIMEZONE));

        let reports_dir = env::var("REPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("reports"));

        let proxy = env::var("CALENDAR_PROXY").ok().filter(|p| !p.trim().is_empty());

        let api_base = env::var("CALENDAR_API_BASE").unwrap_or_else(|_| String::from(DEFAULT_API_BASE));

        let chart_font = env::var("CHART_FONT").ok().map(PathBuf::from);

        // Parse numeric values
        let max_concurrent_requests = match env::var("MAX_CONCURRENT_REQUESTS") {
            Ok(value) => value
                .parse::<usize>()
                .map_err(|_| config_error("Invalid MAX_CONCURRENT_REQUESTS format"))?,
            Err(_) => 1,
        };

        let request_timeout_secs = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| config_error("Invalid REQUEST_TIMEOUT_SECS format"))?,
            Err(_) => 30,
        };

        // Validated by the caller once command line overrides are applied
        Ok(Config {
            google_client_id,
            google_client_secret,
            token_path,
            timezone,
            reports_dir,
            proxy,
            api_base,
            chart_font,
            max_concurrent_requests,
            request_timeout_secs,
        })
    }

    /// Apply command line values over the environment ones
    pub fn with_overrides(mut self, timezone: Option<String>, max_concurrent_requests: Option<usize>) -> Self {
        if let Some(timezone) = timezone {
            self.timezone = timezone;
        }
        if let Some(max_concurrent_requests) = max_concurrent_requests {
            self.max_concurrent_requests = max_concurrent_requests;
        }
        self
    }

    /// Reject values that would only fail later in the run
    pub fn validate(&self) -> ReportResult<()> {
        self.tz()?;
        if self.max_concurrent_requests == 0 {
            return Err(config_error("MAX_CONCURRENT_REQUESTS must be at least 1"));
        }
        Ok(())
    }

    /// Parse the configured timezone
    pub fn tz(&self) -> ReportResult<Tz> {
        parse_timezone(&self.timezone)
    }
}

/// Parse an IANA timezone name
pub fn parse_timezone(name: &str) -> ReportResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| config_error(&format!("Unknown timezone: {}", name)))
}

/// One report run: which days to cover and how to ask for them.
///
/// Dates left as `None` are prompted for when `interactive` is set, and
/// otherwise default to today in `timezone`.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub timezone: Tz,
    pub interactive: bool,
}
