use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::info;

use funneltrace_client::HttpAdminApi;
use funneltrace_core::admin::{DateRange, EventsParams, SessionsParams};
use funneltrace_core::config::ApiConfig;
use funneltrace_engine::views::{dashboard, events, sessions, trace};

const USAGE: &str = "\
funneltrace <command> [options]

Commands:
  dashboard                 Aggregate funnel/revenue statistics for a range
  sessions                  Enriched sessions table rows
  events                    Enriched events table rows
  trace <event-id>          Cross-entity timeline for one session

Options:
  --from <ts>               Range start (RFC 3339 or YYYY-MM-DD)
  --to <ts>                 Range end (RFC 3339 or YYYY-MM-DD)
  --limit <n>               Page size (list commands)
  --offset <n>              Page offset (list commands)
  --utm-source <s>          Filter sessions by utm_source
  --event-type <s>          Filter events by type

Environment:
  FUNNELTRACE_API_URL            Backend base URL (required)
  FUNNELTRACE_API_TOKEN          Bearer token (optional)
  FUNNELTRACE_HTTP_TIMEOUT_MS    Request timeout (default 15000)
";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean JSON for piping into jq.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("funneltrace_engine=info".parse()?)
                .add_directive("funneltrace_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprint!("{USAGE}");
        std::process::exit(2);
    };

    let config = ApiConfig::from_env().map_err(|e| anyhow!(e))?;
    let api = HttpAdminApi::new(&config)?;
    let options = &args[1..];
    let range = parse_range(options)?;

    match command {
        "dashboard" => {
            info!("aggregating dashboard statistics");
            print_json(&dashboard::load_dashboard_stats(&api, &range).await?)
        }
        "sessions" => {
            let params = SessionsParams {
                range,
                utm_source: flag_value(options, "--utm-source").map(str::to_string),
                limit: parse_flag(options, "--limit")?,
                offset: parse_flag(options, "--offset")?,
            };
            print_json(&sessions::load_sessions_view(&api, &params).await?)
        }
        "events" => {
            let params = EventsParams {
                range,
                event_type: flag_value(options, "--event-type").map(str::to_string),
                limit: parse_flag(options, "--limit")?,
                offset: parse_flag(options, "--offset")?,
            };
            print_json(&events::load_events_view(&api, &params).await?)
        }
        "trace" => {
            let event_id = options
                .first()
                .filter(|arg| !arg.starts_with("--"))
                .ok_or_else(|| anyhow!("usage: funneltrace trace <event-id>"))?;
            print_json(&trace::load_session_trace(&api, event_id).await?)
        }
        other => {
            eprintln!("unknown command: {other}");
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == name)
        .and_then(|index| args.get(index + 1))
        .map(String::as_str)
}

fn parse_flag(args: &[String], name: &str) -> Result<Option<u32>> {
    flag_value(args, name)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|_| anyhow!("{name} expects a non-negative integer, got {raw}"))
        })
        .transpose()
}

fn parse_range(args: &[String]) -> Result<DateRange> {
    Ok(DateRange {
        from: flag_value(args, "--from").map(parse_bound).transpose()?,
        to: flag_value(args, "--to").map(parse_bound).transpose()?,
    })
}

fn parse_bound(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid timestamp {raw}; expected RFC 3339 or YYYY-MM-DD"))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}
