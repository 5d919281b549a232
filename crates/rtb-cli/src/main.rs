//! `rtb` command-line entry point

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rtb_cli::commands;
use rtb_cli::simulator::{run_simulator, SimulatorConfig};
use rtb_model::FieldType;
use rtb_session::SessionConfig;
use std::path::PathBuf;
use std::time::Duration;

fn cli() -> Command {
    Command::new("rtb")
        .version(rtb_cli::VERSION)
        .about("Report template builder engine")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON (filter with RUST_LOG, default info)"),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a template JSON file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Template document"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("operators")
                .about("Print the filter operator table")
                .arg(
                    Arg::new("type")
                        .long("type")
                        .value_parser(|s: &str| s.parse::<FieldType>())
                        .help("Only operators supporting this field type"),
                ),
        )
        .subcommand(
            Command::new("prebuilt")
                .about("List prebuilt templates")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("simulate")
                .about("Run an editing session against the in-memory repository")
                .arg(
                    Arg::new("edits")
                        .long("edits")
                        .default_value("10")
                        .value_parser(value_parser!(u32))
                        .help("Number of edits"),
                )
                .arg(
                    Arg::new("interval-ms")
                        .long("interval-ms")
                        .default_value("200")
                        .value_parser(value_parser!(u64))
                        .help("Pause between edits"),
                )
                .arg(
                    Arg::new("debounce-ms")
                        .long("debounce-ms")
                        .value_parser(value_parser!(u64))
                        .help("Autosave debounce window (overrides --config)"),
                )
                .arg(
                    Arg::new("save-latency-ms")
                        .long("save-latency-ms")
                        .default_value("300")
                        .value_parser(value_parser!(u64))
                        .help("Simulated repository latency"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("Session configuration TOML"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn validate(args: &ArgMatches) -> Result<bool> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        anyhow::bail!("missing template file");
    };
    let result = commands::validate_file(path)?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", commands::render_validation(&path.display().to_string(), &result));
    }
    Ok(result.is_valid)
}

fn operators(args: &ArgMatches) {
    let rows = commands::operator_rows(args.get_one::<FieldType>("type").copied());
    print!("{}", commands::render_operators(&rows));
}

fn prebuilt(args: &ArgMatches) -> Result<()> {
    let rows = commands::prebuilt_rows();
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print!("{}", commands::render_prebuilt(&rows));
    }
    Ok(())
}

async fn simulate(args: &ArgMatches) -> Result<bool> {
    let mut session = match args.get_one::<PathBuf>("config") {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(&debounce) = args.get_one::<u64>("debounce-ms") {
        session = session.with_debounce_ms(debounce);
    }

    let config = SimulatorConfig {
        edits: args.get_one::<u32>("edits").copied().unwrap_or(10),
        interval: Duration::from_millis(
            args.get_one::<u64>("interval-ms").copied().unwrap_or(200),
        ),
        save_latency: Duration::from_millis(
            args.get_one::<u64>("save-latency-ms").copied().unwrap_or(300),
        ),
        session,
    };

    let report = run_simulator(config).await.context("simulation failed")?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.generate_text());
    }
    Ok(report.passed())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    rtb_cli::logging::init(matches.get_flag("log-json"));

    let ok = match matches.subcommand() {
        Some(("validate", args)) => validate(args)?,
        Some(("operators", args)) => {
            operators(args);
            true
        }
        Some(("prebuilt", args)) => {
            prebuilt(args)?;
            true
        }
        Some(("simulate", args)) => simulate(args).await?,
        _ => true,
    };

    std::process::exit(i32::from(!ok));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn field_type_argument_is_parsed() {
        let matches = cli()
            .try_get_matches_from(["rtb", "operators", "--type", "date"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<FieldType>("type"), Some(&FieldType::Date));

        assert!(cli()
            .try_get_matches_from(["rtb", "operators", "--type", "money"])
            .is_err());
    }
}
