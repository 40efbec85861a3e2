use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use cervirisk_cli::check::check_artifacts;
use cervirisk_cli::serving::{run_server, DEFAULT_HOST};
use cervirisk_cli::training::input::{TrainConfig, DEFAULT_DATA_FILE};
use cervirisk_cli::training::trainer;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("CERVIRISK_LOG", "error,cervirisk=info"))
        .init();

    let matches = Command::new("cervirisk")
        .version(clap::crate_version!())
        .about("Cervical cancer risk: train a random forest and serve predictions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train the risk model and write its artifacts")
                .arg(
                    Arg::new("config")
                        .help("Path to a JSON training configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("data")
                        .short('d')
                        .long("data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(format!(
                            "Path to the survey CSV. Overrides the configuration file \
                             (default: {}).",
                            DEFAULT_DATA_FILE
                        ))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Directory the artifacts are written to (default: current directory).")
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("profile")
                        .short('p')
                        .long("profile")
                        .help("Training preset. Keys set in the configuration file still apply.")
                        .value_parser(["baseline", "tuned"]),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("serve")
                .about("Serve the login page, the risk form and POST /predict (port from $PORT, default 5001)")
                .arg(
                    Arg::new("artifacts")
                        .short('a')
                        .long("artifacts")
                        .help("Directory holding the training artifacts")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("host")
                        .long("host")
                        .help("Interface to listen on")
                        .default_value(DEFAULT_HOST)
                        .value_parser(clap::builder::NonEmptyStringValueParser::new()),
                ),
        )
        .subcommand(
            Command::new("check-artifacts")
                .about("Verify that the feature schema and median table load")
                .arg(
                    Arg::new("artifacts")
                        .short('a')
                        .long("artifacts")
                        .help("Directory holding the training artifacts")
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("serve", sub_m)) => handle_serve(sub_m),
        Some(("check-artifacts", sub_m)) => handle_check(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path: Option<&PathBuf> = matches.get_one("config");
    match config_path {
        Some(path) => log::info!("[cervirisk::train] Training from config: {:?}", path),
        None => log::info!("[cervirisk::train] No config provided; using profile defaults."),
    }

    let outcome = TrainConfig::from_arguments(config_path, matches)
        .and_then(|params| trainer::run_training(&params));
    match outcome {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_serve(matches: &ArgMatches) -> Result<()> {
    let artifacts: &PathBuf = matches
        .get_one("artifacts")
        .expect("artifacts has a default value");
    let host: &String = matches.get_one("host").expect("host has a default value");

    match run_server(artifacts, host) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Server failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_check(matches: &ArgMatches) -> Result<()> {
    let artifacts: &PathBuf = matches
        .get_one("artifacts")
        .expect("artifacts has a default value");

    match check_artifacts(artifacts) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Error loading necessary files: {:#}", e);
            std::process::exit(1)
        }
    }
}
