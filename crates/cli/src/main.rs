use anyhow::Context;
use clap::{Parser, Subcommand};
use divisas_core::domain::DateKey;
use divisas_core::session::{LoadStatus, Session};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod draw;

#[derive(Debug, Parser)]
#[command(name = "divisas")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the currencies known to the provider, alphabetically.
    Currencies,

    /// Load one currency's rates over an inclusive date range and draw them.
    Chart {
        #[arg(long)]
        currency: Option<String>,

        /// Range start (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Range end (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Print the chart description as JSON instead of drawing it.
        #[arg(long)]
        json: bool,

        /// Bar width in columns.
        #[arg(long, default_value_t = draw::DEFAULT_WIDTH)]
        width: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = divisas_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let res = run(args, &settings).await;
    if let Err(err) = &res {
        sentry_anyhow::capture_anyhow(err);
    }
    res
}

async fn run(args: Args, settings: &divisas_core::config::Settings) -> anyhow::Result<()> {
    let gateway = divisas_core::gateway::connect(settings).await?;
    let mut session = Session::new(gateway);

    match args.command {
        Command::Currencies => {
            let names = session.currencies().await;
            if names.is_empty() {
                println!("{}", divisas_core::render::NO_DATA_TEXT);
            }
            for name in names {
                println!("{name}");
            }
        }
        Command::Chart {
            currency,
            start,
            end,
            json,
            width,
        } => {
            let selection = session.selection_mut();
            if let Some(currency) = currency {
                selection.set_currency(currency);
            }
            if let Some(start) = start.as_deref() {
                selection.set_start_date(DateKey::parse(start).context("invalid --start")?);
            }
            if let Some(end) = end.as_deref() {
                selection.set_end_date(DateKey::parse(end).context("invalid --end")?);
            }

            let status = session.load().await;
            match status {
                LoadStatus::Skipped { missing } => {
                    tracing::warn!(%missing, "selection incomplete; nothing loaded")
                }
                LoadStatus::Failed => tracing::warn!(
                    diagnostic = session.last_diagnostic().unwrap_or_default(),
                    "load failed; showing empty chart"
                ),
                LoadStatus::Loaded { observations } => {
                    tracing::debug!(observations, "load complete")
                }
            }

            if json {
                println!("{}", serde_json::to_string_pretty(session.chart())?);
            } else {
                print!("{}", draw::draw_chart(session.chart(), width));
            }
        }
    }

    Ok(())
}

fn init_sentry(settings: &divisas_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
