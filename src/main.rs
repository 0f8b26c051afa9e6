use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rollcall::config::RollcallConfig;
use rollcall::simulate::SimulationOptions;
use rollcall::{export, storage};

#[derive(Parser)]
#[command(
    name = "rollcall",
    about = "Face-verified attendance for video meetings",
    version,
    long_about = None
)]
struct Cli {
    /// Config file (defaults to $ROLLCALL_CONFIG, then /etc/rollcall/rollcall.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon (API server + meeting registry)
    Serve {
        /// Bind address, overrides the config file
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run a loopback meeting with the auto-trigger and simulated camera
    Simulate {
        /// How long to run, in seconds
        #[arg(long, default_value = "60")]
        seconds: u64,

        /// Meeting id (random when omitted)
        #[arg(long)]
        meeting: Option<String>,

        /// Participant display name; repeat for more
        #[arg(long = "participant")]
        participants: Vec<String>,

        /// Auto-trigger interval in seconds
        #[arg(long)]
        interval: Option<u64>,

        /// Seed for the verifier and meeting id
        #[arg(long)]
        seed: Option<u64>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Show stored attendance records
    Records {
        /// Meeting id; lists stored meetings when omitted
        #[arg(long)]
        meeting: Option<String>,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Write the stored log of a meeting as CSV
    Export {
        /// Meeting id
        #[arg(long)]
        meeting: String,

        /// Output directory
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Print a fresh meeting id
    NewMeetingId,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Commands::NewMeetingId = cli.command {
        println!("{}", rollcall::meeting::generate_meeting_id(&mut rand::thread_rng()));
        return Ok(());
    }

    let mut config = RollcallConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            tracing::info!(bind = %config.server.bind, "Starting Rollcall daemon");
            rollcall::serve(config).await?;
        }
        Commands::Simulate {
            seconds,
            meeting,
            participants,
            interval,
            seed,
            json,
        } => {
            let pool = storage::open_pool(&config.storage.db_path)?;
            let mut opts = SimulationOptions {
                meeting_id: meeting,
                duration: Duration::from_secs(seconds),
                interval_secs: interval,
                seed,
                ..Default::default()
            };
            if !participants.is_empty() {
                opts.participants = participants;
            }
            tracing::info!(seconds, "Running simulated meeting");
            let report = rollcall::simulate::run(Arc::new(config), pool, opts).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\nRollcall Simulation: meeting {}", report.meeting_id);
                println!(
                    "Sessions: {}  Verified: {}  Failed: {}  Replaced: {}",
                    report.sessions_opened, report.verified, report.failed, report.replaced
                );
                print_records(&report.records);
            }
        }
        Commands::Records { meeting, json } => {
            let pool = storage::open_pool(&config.storage.db_path)?;
            match meeting {
                Some(id) => {
                    let log = storage::load_log(&pool, &id)?;
                    if json {
                        println!("{}", log.to_json()?);
                    } else if log.is_empty() {
                        println!("No attendance recorded for meeting {}.", id);
                    } else {
                        print_records(log.records());
                    }
                }
                None => {
                    let meetings = storage::list_meetings(&pool)?;
                    if json {
                        let list: Vec<_> = meetings
                            .iter()
                            .map(|(id, n)| serde_json::json!({ "meeting_id": id, "records": n }))
                            .collect();
                        println!("{}", serde_json::to_string_pretty(&list)?);
                    } else if meetings.is_empty() {
                        println!("No meetings found.");
                    } else {
                        println!("{:<12} | Records", "Meeting");
                        println!("{:-<12}-|-{:-<7}", "", "");
                        for (id, n) in meetings {
                            println!("{:<12} | {}", id, n);
                        }
                    }
                }
            }
        }
        Commands::Export { meeting, output } => {
            let pool = storage::open_pool(&config.storage.db_path)?;
            let log = storage::load_log(&pool, &meeting)?;
            let now = chrono::Utc::now();
            let rows = export::build_rows(log.records(), &[], &meeting, now);
            let csv = export::render_csv(&rows);
            let path = export::write_export(&output, &meeting, now.date_naive(), &csv)?;
            println!("Exported {} rows to {}", rows.len(), path.display());
        }
        Commands::NewMeetingId => {}
    }

    Ok(())
}

fn print_records(records: &[rollcall::attendance::AttendanceRecord]) {
    if records.is_empty() {
        println!("No attendance recorded.");
        return;
    }
    println!("{:<20} | {:<8} | {:<19} | Verified", "Name", "Roll", "Time");
    println!("{:-<20}-|-{:-<8}-|-{:-<19}-|-{:-<8}", "", "", "", "");
    for r in records {
        println!(
            "{:<20} | {:<8} | {:<19} | {}",
            r.name,
            r.roll,
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.verified
        );
    }
}
