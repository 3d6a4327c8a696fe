use clap::Parser;
use std::process::ExitCode;
use time_spent::config::{parse_timezone, ReportRequest};
use time_spent::startup;
use time_spent::utils::time::parse_date;
use tracing::info;

#[derive(Parser)]
#[command(name = "time-spent")]
#[command(about = "Chart how your time was split across your Google calendars")]
struct Cli {
    /// First day of the report (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    start: Option<String>,

    /// Last day of the report, inclusive (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    end: Option<String>,

    /// Timezone the dates are interpreted in (e.g. 'Asia/Shanghai')
    #[arg(long)]
    timezone: Option<String>,

    /// Prompt for any date not given on the command line
    #[arg(short, long)]
    interactive: bool,

    /// Open the chart once it has been saved
    #[arg(long)]
    open: bool,

    /// How many calendars to fetch at once
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> miette::Result<ExitCode> {
    // Initialize logging
    startup::init_logging()?;

    let cli = Cli::parse();

    // Load configuration
    let config = startup::load_config()?.with_overrides(cli.timezone, cli.concurrency);
    config.validate()?;

    // Dates are checked before anything touches the network
    let request = ReportRequest {
        start_date: cli.start.as_deref().map(parse_date).transpose()?,
        end_date: cli.end.as_deref().map(parse_date).transpose()?,
        timezone: parse_timezone(&config.timezone)?,
        interactive: cli.interactive,
    };
    let range = startup::resolve_range(&request)?;
    info!("Reporting {}", range.title());

    startup::exit_code(startup::run_report(&config, &range, cli.open).await)
}
