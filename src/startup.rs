use crate::components::google_calendar::{build_http_client, CalendarSource, GoogleCalendarClient, TokenManager};
use crate::components::report::{self, PieChart, Reporter};
use crate::config::{Config, ReportRequest};
use crate::error::{other_error, Error, ReportResult};
use crate::utils::time::{parse_date_input, today_in, DateRange};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper_util=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Work out the report's date range, asking `prompt` for missing dates when interactive
pub fn resolve_range_with<P>(request: &ReportRequest, today: NaiveDate, mut prompt: P) -> ReportResult<DateRange>
where
    P: FnMut(&str) -> ReportResult<String>,
{
    let mut pick = |given: Option<NaiveDate>, message: &str| -> ReportResult<NaiveDate> {
        match given {
            Some(date) => Ok(date),
            None if request.interactive => parse_date_input(&prompt(message)?, today),
            None => Ok(today),
        }
    };

    let start = pick(
        request.start_date,
        "Enter the start date (YYYY-MM-DD), default to today:",
    )?;
    let end = pick(
        request.end_date,
        "Enter the end date (YYYY-MM-DD), default to today (inclusive):",
    )?;

    DateRange::new(start, end, request.timezone)
}

/// Work out the report's date range, prompting on the terminal when interactive
pub fn resolve_range(request: &ReportRequest) -> ReportResult<DateRange> {
    let today = today_in(request.timezone);
    resolve_range_with(request, today, |message| {
        inquire::Text::new(message)
            .prompt()
            .map_err(|e| other_error(&format!("Failed to read input: {}", e)))
    })
}

/// List calendars, sum their events and save the chart
pub async fn run_pipeline<S>(
    source: &S,
    range: &DateRange,
    reporter: &Reporter,
    concurrency: usize,
) -> ReportResult<(PieChart, PathBuf)>
where
    S: CalendarSource + ?Sized,
{
    let time_min = range.time_min()?;
    let time_max = range.time_max()?;
    info!("Querying events from {} until {}", time_min.to_rfc3339(), time_max.to_rfc3339());

    println!("======== retrieving calendar data ========");
    let calendars = source.list_calendars().await?;

    println!("======== calculating time spent ========");
    let time_spent = report::aggregate(source, &calendars, &time_min, &time_max, concurrency).await?;

    println!("======== plotting graph ========");
    let chart = report::render(&time_spent, &calendars, &range.title())?;
    let path = reporter.publish(&chart)?;

    Ok((chart, path))
}

/// Authenticate, build the client and run the whole report
pub async fn run_report(config: &Config, range: &DateRange, open: bool) -> ReportResult<PathBuf> {
    let http = build_http_client(config)?;

    let token = TokenManager::new(config, http.clone()).get_token().await?;
    let client = GoogleCalendarClient::new(http, &config.api_base, &token.access_token)?;

    let mut reporter = Reporter::new(&config.reports_dir);
    if let Some(font) = &config.chart_font {
        reporter = reporter.with_font_file(font)?;
    }

    let (chart, path) = run_pipeline(&client, range, &reporter, config.max_concurrent_requests).await?;
    println!(
        "Saved {} ({:.1} hours across {} calendars)",
        path.display(),
        chart.total_hours(),
        chart.slices.len()
    );

    if open {
        report::show(&path);
    }

    Ok(path)
}

/// Map the report outcome to the process exit status.
///
/// Calendar API failures are reported on stderr and exit with status 1. Any
/// other error is returned for miette to render.
pub fn exit_code(result: ReportResult<PathBuf>) -> miette::Result<ExitCode> {
    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(Error::Api(message)) => {
            eprintln!("An error occurred: {}", message);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}
