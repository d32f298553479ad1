use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use log::{debug, error, LevelFilter};
use std::path::{Path, PathBuf};
use std::process;

use slidescrub::utils::logger::Logger;
use slidescrub::utils::progress::ProgressTracker;
use slidescrub::{dispatch, RedactConfig, RedactMode};

fn build_cli() -> ClapCommand {
    ClapCommand::new("slidescrub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Remove label images from whole-slide images, in place")
        .long_about(
            "Remove label images from whole-slide images, in place.\n\n\
             Supports Aperio SVS, Hamamatsu NDPI, Ventana TIFF and 3DHistech MRXS slides.\n\
             Files are modified in place and never change size. This cannot be undone:\n\
             work on copies.",
        )
        .arg(
            Arg::new("files")
                .help("Slide files to redact")
                .value_name("FILE")
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Show debugging information")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("zero-only")
                .long("zero-only")
                .help("Zero the label pixels but keep its directory linked")
                .action(ArgAction::SetTrue)
                .conflicts_with("unlink-only"),
        )
        .arg(
            Arg::new("unlink-only")
                .long("unlink-only")
                .help("Unlink the label directory but leave its pixels in place")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("macro")
                .long("macro")
                .help("Also remove the macro image where the format has one")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML file with a [redact] table")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Also write log output to this file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn init_logging(matches: &ArgMatches) -> Result<(), String> {
    let level = if matches.get_flag("debug") { LevelFilter::Debug } else { LevelFilter::Info };

    match matches.get_one::<PathBuf>("log-file") {
        Some(path) => Logger::init_global_logger(path, level)
            .map_err(|e| format!("Error initializing logger: {}", e)),
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_default_env()
                .format_timestamp(None)
                .init();
            Ok(())
        },
    }
}

/// Builds the run configuration: file values first, then flags
fn load_config(matches: &ArgMatches) -> Result<RedactConfig, String> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RedactConfig::from_file(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?,
        None => RedactConfig::default(),
    };

    if matches.get_flag("zero-only") {
        config.mode = RedactMode::ZeroOnly;
    }
    if matches.get_flag("unlink-only") {
        config.mode = RedactMode::UnlinkOnly;
    }
    if matches.get_flag("macro") {
        config.include_macro = true;
    }

    Ok(config)
}

fn main() {
    let matches = build_cli().get_matches();

    if let Err(e) = init_logging(&matches) {
        eprintln!("{}", e);
        process::exit(1);
    }

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    debug!("Configuration: mode {}, include macro {}", config.mode, config.include_macro);

    let paths: Vec<PathBuf> = matches.get_many::<PathBuf>("files")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let progress = if paths.len() > 1 && !matches.get_flag("debug") {
        ProgressTracker::new(paths.len() as u64, "Redacting slides")
    } else {
        ProgressTracker::hidden()
    };

    // Per-file outcomes are logged by the dispatcher
    let summary = dispatch::process_all_with(&paths, &config, |path: &Path, _| {
        progress.set_message(&path.display().to_string());
        progress.increment(1);
    });
    progress.finish();

    if !summary.is_clean() {
        process::exit(1);
    }
}
