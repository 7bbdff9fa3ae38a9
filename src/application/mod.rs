// Released under MIT License.
// Copyright (c) 2024-2025 Ladislav Bartos

//! This module contains the implementation of the `rhovn` binary.

use clap::Parser;
use colored::Colorize;
use rhovn::{errors::ApplicationError, input::Analysis, RHOVN_VERSION};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "Fit the azimuthal modulation of the jet background density and correct jets and random cones for it."
)]
pub struct Args {
    #[arg(
        help = "Config yaml file",
        long_help = "Configuration yaml file specifying the analysis settings and the events file."
    )]
    pub config: String,

    #[arg(
        short = 's',
        long = "silent",
        help = "Print only errors",
        long_help = "Do not print anything except for errors. Overrides the 'silent' option of the config file."
    )]
    pub silent: bool,

    #[arg(
        long = "overwrite",
        help = "Overwrite the output file",
        long_help = "Do not back up an existing output file; overwrite it instead."
    )]
    pub overwrite: bool,
}

fn init_logging(silent: bool) {
    if silent {
        colog::basic_builder()
            .filter(None, log::LevelFilter::Error)
            .init();
    } else {
        colog::init();
    }
}

pub(crate) fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let mut analysis = match Analysis::from_file(&args.config) {
        Ok(x) => x,
        Err(e) => {
            init_logging(args.silent);
            log::error!("{}", e);
            return Err(Box::new(ApplicationError::CouldNotReadConfig(args.config)));
        }
    };

    if args.silent {
        analysis.set_silent(true);
    }
    if args.overwrite {
        analysis.set_overwrite(true);
    }

    init_logging(analysis.silent());
    if !analysis.silent() {
        let header = format!(">>> RHOVN v{} <<<", RHOVN_VERSION).bold();
        println!("\n{}\n", header);
        log::info!("Read config file '{}'.", args.config);
    }

    let result = analysis.run().map(|_| ());

    match &result {
        Ok(_) if !analysis.silent() => {
            let prefix = format!(
                "{}{}{}",
                "[".to_string().blue().bold(),
                "✔".to_string().bright_green().bold(),
                "]".to_string().blue().bold()
            );
            let message = "ANALYSIS COMPLETED".to_string().bright_green().bold();
            println!("{} {}", prefix, message);
        }
        Ok(_) => (),
        Err(e) => {
            log::error!("{}", e);

            if !analysis.silent() {
                let prefix = format!(
                    "{}{}{}",
                    "[".to_string().blue().bold(),
                    "✖".to_string().red().bold(),
                    "]".to_string().blue().bold()
                );
                let message = "ANALYSIS FAILED".to_string().red().bold();
                println!("{} {}", prefix, message);
            }
        }
    }

    result
}
