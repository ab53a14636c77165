// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

mod cli;

use std::{collections::BTreeSet, path::PathBuf, str::FromStr};

use clap::{crate_name, ArgMatches};
use cli_utils::{logging, BoxResult};
use digcoll_validator::{
    enumerator::{self, FindError},
    model::identifier::{Identifier, IdentifierChunk},
    report::{self, Format, Mode, Outcome},
    settings::{self, Overrides, Settings},
    storage::Storage,
    validators::aggregate::Validator,
};
use futures::{stream, StreamExt};
use tracing::instrument;
use tracing_subscriber::filter::LevelFilter;

#[allow(clippy::print_stdout)]
fn print_version_and_exit(quiet: bool) {
    if !quiet {
        print!("{} ", clap::crate_name!());
    }
    println!("{}", digcoll_validator::VERSION);
    std::process::exit(0);
}

fn chunks(sub_args: &ArgMatches) -> Vec<IdentifierChunk> {
    sub_args
        .get_many::<IdentifierChunk>(cli::A_P_CHUNKS)
        .map(|chunks| chunks.cloned().collect())
        .unwrap_or_default()
}

/// All identifiers at or below any of `chunks`, sorted and unique.
async fn expand(
    storage: &dyn Storage,
    chunks: &[IdentifierChunk],
) -> Result<Vec<Identifier>, FindError> {
    let mut identifiers = BTreeSet::new();
    for chunk in chunks {
        identifiers.extend(enumerator::recursive_ls(storage, chunk).await?);
    }
    Ok(identifiers.into_iter().collect())
}

#[allow(clippy::print_stdout)]
async fn ls(settings: &Settings, chunks: &[IdentifierChunk]) -> BoxResult<()> {
    for identifier in expand(settings.storage.as_ref(), chunks).await? {
        println!("{identifier}");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn mtime(settings: &Settings, chunks: &[IdentifierChunk]) -> BoxResult<()> {
    let storage = settings.storage.as_ref();
    for identifier in expand(storage, chunks).await? {
        let modified = enumerator::newest_modification_time(storage, &identifier).await?;
        println!("{}", report::mtime_line(&identifier, modified));
    }
    Ok(())
}

/// Prints the outcomes in identifier order,
/// and returns whether all identifiers are valid.
#[allow(clippy::print_stdout)]
async fn validate(
    settings: &Settings,
    chunks: &[IdentifierChunk],
    mode: Mode,
    format: Format,
) -> BoxResult<bool> {
    let validator = Validator::from_settings(settings)?;
    let identifiers = expand(settings.storage.as_ref(), chunks).await?;
    tracing::info!(
        "Validating {} identifiers, {} at a time ...",
        identifiers.len(),
        settings.parallelism
    );
    let validator = &validator;
    let mut outcomes = stream::iter(identifiers)
        .map(|identifier| async move {
            let problems = validator.validate(&identifier).await?;
            Ok::<_, digcoll_validator::validators::Error>(Outcome {
                identifier,
                problems,
            })
        })
        .buffered(settings.parallelism);

    let mut all_valid = true;
    while let Some(outcome) = outcomes.next().await {
        let outcome = outcome?;
        if outcome.is_valid() {
            tracing::info!("{} is valid.", outcome.identifier);
        } else {
            tracing::info!(
                "{} has {} problems.",
                outcome.identifier,
                outcome.problems.len()
            );
            all_valid = false;
        }
        for line in report::lines(&outcome, mode, format)? {
            println!("{line}");
        }
    }
    Ok(all_valid)
}

#[tokio::main]
#[instrument]
async fn main() -> BoxResult<()> {
    let log_reload_handle = logging::setup(crate_name!())?;
    let args = cli::args_matcher().get_matches();

    let quiet = args.get_flag(cli::A_L_QUIET);
    let version = args.get_flag(cli::A_L_VERSION);
    if version {
        print_version_and_exit(quiet);
    }

    let verbose = args.get_flag(cli::A_L_VERBOSE);

    let log_level = if verbose {
        LevelFilter::TRACE
    } else if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    logging::set_log_level_tracing(&log_reload_handle, log_level)?;

    let Some((sub_command, sub_args)) = args.subcommand() else {
        return Err("No sub-command given".into());
    };
    let overrides = Overrides {
        config_file: args.get_one::<PathBuf>(cli::A_L_CONFIG).cloned(),
        local_root: args.get_one::<PathBuf>(cli::A_L_LOCAL_ROOT).cloned(),
        webdav: args.get_one::<String>(cli::A_L_WEBDAV).cloned(),
        no_ocr_check: sub_command == cli::SC_VALIDATE && sub_args.get_flag(cli::A_L_NO_OCR_CHECK),
    };
    let run_settings = settings::load(&overrides)?;
    tracing::debug!(
        "Reading from {} storage at '{}'",
        run_settings.storage.info().name,
        run_settings.storage.root()
    );
    let chunks = chunks(sub_args);

    match sub_command {
        cli::SC_LS => ls(&run_settings, &chunks).await?,
        cli::SC_MTIME => mtime(&run_settings, &chunks).await?,
        cli::SC_VALIDATE => {
            let mode = if sub_args.get_flag(cli::A_L_LIST_VALID) {
                Mode::ListValid
            } else {
                Mode::ShowErrors
            };
            let format = sub_args
                .get_one::<String>(cli::A_L_FORMAT)
                .map(|format| Format::from_str(format))
                .transpose()?
                .unwrap_or_default();
            if !validate(&run_settings, &chunks, mode, format).await? {
                std::process::exit(1);
            }
        }
        other => return Err(format!("Unknown sub-command '{other}'").into()),
    }

    Ok(())
}
