//! Interface errors and discards report
//!
//! Takes two counter snapshots per switch, a fixed interval apart, and
//! prints every port whose error or discard counters moved. Unreachable
//! switches are skipped. Failures are written to a run log in the output
//! directory when the run finishes or is interrupted.
//!
//! # Prerequisites
//!
//! - Arista EOS switches with `management api http-commands` enabled
//! - `TACACS_USERNAME` and `TACACS_PASSWORD` set in the environment
//!
//! # Usage
//!
//! ```bash
//! cargo run --example errors_and_discards -- --switches switches.txt
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eosapi::counters::{CounterKind, Snapshot, diff};
use eosapi::{Credentials, RunLog, Session, SessionBuilder};

struct Host {
    session: Session,
    hostname: String,
    first: Vec<Snapshot>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let credentials = Credentials::from_env("TACACS")?;
    let switches = read_switches(&args.switches)?;

    println!("=== Interface errors and discards ===\n");
    println!("{} switches, {}s interval\n", switches.len(), args.interval);

    let mut log = RunLog::new("errors_and_discards");

    tokio::select! {
        result = run(&switches, &credentials, &args, &mut log) => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted, writing run log");
        }
    }

    if let Some(path) = log.finish(&args.output)? {
        println!("Failures logged to {}", path.display());
    }
    Ok(())
}

async fn run(
    switches: &[String],
    credentials: &Credentials,
    args: &Args,
    log: &mut RunLog,
) -> Result<(), eosapi::Error> {
    let mut hosts = Vec::new();

    for switch in switches {
        let session = SessionBuilder::new(switch)
            .credentials(credentials.clone())
            .timeout(Duration::from_secs(args.timeout))
            .open()?;
        match first_pass(session, log).await {
            Ok(Some(host)) => hosts.push(host),
            Ok(None) => println!("{switch}: no counters, skipping"),
            Err(e) => println!("{switch}: {e}"),
        }
    }

    tokio::time::sleep(Duration::from_secs(args.interval)).await;

    for host in hosts {
        for before in &host.first {
            let after = match host.session.poll_counters(before.kind(), log).await {
                Ok(Some(after)) => after,
                Ok(None) => continue,
                Err(e) => {
                    println!("{}: {e}", host.hostname);
                    break;
                }
            };
            match diff(before, &after) {
                Ok(delta) => {
                    for alert in delta.alerts() {
                        println!("{}: {alert}", host.hostname);
                    }
                }
                Err(e) => println!("{}: {e}", host.hostname),
            }
        }
    }

    Ok(())
}

async fn first_pass(session: Session, log: &mut RunLog) -> Result<Option<Host>, eosapi::Error> {
    let hostname = session
        .hostname(log)
        .await?
        .unwrap_or_else(|| session.host().to_string());

    let mut first = Vec::new();
    for kind in [CounterKind::Errors, CounterKind::Discards] {
        if let Some(snapshot) = session.poll_counters(kind, log).await? {
            first.push(snapshot);
        }
    }

    if first.is_empty() {
        return Ok(None);
    }
    Ok(Some(Host {
        session,
        hostname,
        first,
    }))
}

fn read_switches(path: &Path) -> std::io::Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

struct Args {
    switches: PathBuf,
    output: PathBuf,
    interval: u64,
    timeout: u64,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut switches = PathBuf::from("switches.txt");
        let mut output = PathBuf::from(".");
        let mut interval = 20u64;
        let mut timeout = 180u64;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--switches" | "-s" => {
                    i += 1;
                    if i < args.len() {
                        switches = PathBuf::from(&args[i]);
                    }
                }
                "--output" | "-o" => {
                    i += 1;
                    if i < args.len() {
                        output = PathBuf::from(&args[i]);
                    }
                }
                "--interval" | "-i" => {
                    i += 1;
                    if i < args.len() {
                        interval = args[i].parse().unwrap_or(20);
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(180);
                    }
                }
                "--help" | "-h" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            switches,
            output,
            interval,
            timeout,
        }
    }

    fn print_help() {
        println!(
            r#"eosapi errors and discards report

Compares interface error and discard counters across an interval.

USAGE:
    cargo run --example errors_and_discards -- [OPTIONS]

OPTIONS:
    -s, --switches <PATH>    File with one switch per line [default: switches.txt]
    -o, --output <DIR>       Directory for the run log [default: .]
    -i, --interval <SECS>    Time between snapshots [default: 20]
    -t, --timeout <SECS>     Request timeout [default: 180]
    -h, --help               Print this help message

ENVIRONMENT:
    TACACS_USERNAME, TACACS_PASSWORD    eAPI credentials
    RUST_LOG                            Log filter [default: info]
"#
        );
    }
}
