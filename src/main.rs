use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use log::{error, info};
use structured_logger::json::new_writer;
use structured_logger::Builder;

use osm_to_gbxml::config::{create_output_dir, load_user_config, UserConfig};
use osm_to_gbxml::errors::{Error, ErrorKind, Result};
use osm_to_gbxml::etl::parse_osm::ParseOsmEtl;
use osm_to_gbxml::etl::write_gbxml::{self, WriteGbXmlEtl};
use osm_to_gbxml::etl::Etl;

const DEFAULT_CONFIG_PATH: &str = "config.json";

enum Command {
    Convert(PathBuf),
    Query(PathBuf),
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let first = args.next();
    let second = args.next();
    let default_config = || PathBuf::from(DEFAULT_CONFIG_PATH);
    match (first.as_deref(), second) {
        (Some("query"), config) => Ok(Command::Query(config.map(PathBuf::from).unwrap_or_else(default_config))),
        (Some(config), None) => Ok(Command::Convert(PathBuf::from(config))),
        (None, _) => Ok(Command::Convert(default_config())),
        (Some(other), Some(_)) => Err(Error::invalid_input(format!(
            "Unknown command {:?}. Usage: osm_to_gbxml [query] [config.json]",
            other
        ))),
    }
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn convert(config: &UserConfig) -> Result<()> {
    let output_dir = create_output_dir(config)?;
    let mut parse_etl = ParseOsmEtl::new(config)?;
    let mut gbxml_etl = WriteGbXmlEtl::new(config);

    if !config.use_cache {
        parse_etl.clean(&output_dir)?;
        gbxml_etl.clean(&output_dir)?;
    }

    parse_etl.process(&output_dir)?;
    gbxml_etl.process(&output_dir)?;

    let output_path = output_dir.join(write_gbxml::OUTPUT_FILE_NAME);
    match gbxml_etl.space_count() {
        Some(0) => info!(input = config.data_path.as_str(); "No buildings found in the selected area"),
        Some(spaces) => info!(
            spaces = spaces,
            output = output_path.display().to_string().as_str();
            "Conversion complete"
        ),
        None => info!(output = output_path.display().to_string().as_str(); "Output already up to date"),
    }
    Ok(())
}

fn query(config: &UserConfig) -> Result<()> {
    let bbox = config
        .bounding_box
        .ok_or_else(|| Error::invalid_input("The query command needs a bounding_box in the config"))?;
    println!("{}", bbox.overpass_query()?);
    Ok(())
}

fn run(command: Command) -> Result<()> {
    let config_path = match &command {
        Command::Convert(path) | Command::Query(path) => path.as_path(),
    };
    let config = load_config(config_path)?;
    setup_logging(&config.log_level);
    config.validate()?;

    match command {
        Command::Convert(_) => convert(&config),
        Command::Query(_) => query(&config),
    }
}

fn load_config(path: &Path) -> Result<UserConfig> {
    load_user_config(path).map_err(|err| Error::new(
        err.kind,
        format!("Could not load config {}: {}", path.display(), err.message),
    ))
}

fn main() -> ExitCode {
    let result = parse_args(env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.kind == ErrorKind::Document {
                error!(err = err.message.as_str(); "Input is not a valid OSM document");
            }
            eprintln!("{}", err);
            ExitCode::FAILURE
        },
    }
}
