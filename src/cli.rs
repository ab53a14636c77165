// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use clap::{
    builder::PossibleValuesParser, command, value_parser, Arg, ArgAction, ArgGroup, Command,
    ValueHint,
};
use const_format::formatcp;
use digcoll_validator::{
    model::identifier::IdentifierChunk,
    report::Format,
    settings::{CONFIG_FILE_BASE_NAME, ENV_PREFIX},
};
use strum::VariantNames;

pub const SC_LS: &str = "ls";
pub const SC_VALIDATE: &str = "validate";
pub const SC_MTIME: &str = "mtime";

pub const A_L_VERSION: &str = "version";
pub const A_S_VERSION: char = 'V';
pub const A_L_QUIET: &str = "quiet";
pub const A_S_QUIET: char = 'q';
pub const A_L_VERBOSE: &str = "verbose";
pub const A_S_VERBOSE: char = 'v';
pub const A_L_CONFIG: &str = "config";
pub const A_S_CONFIG: char = 'c';
pub const A_L_LOCAL_ROOT: &str = "local-root";
pub const A_S_LOCAL_ROOT: char = 'l';
pub const A_L_WEBDAV: &str = "webdav";
pub const A_S_WEBDAV: char = 'w';
pub const A_L_LIST_VALID: &str = "list-valid";
pub const A_L_SHOW_ERRORS: &str = "show-errors";
pub const A_L_FORMAT: &str = "format";
pub const A_S_FORMAT: char = 'f';
pub const A_L_NO_OCR_CHECK: &str = "no-ocr-check";
pub const A_P_CHUNKS: &str = "IDENTIFIER_CHUNK";

const G_STORAGE: &str = "storage";
const G_MODE: &str = "mode";

const ABOUT_CONFIG: &str = formatcp!(
    "Settings are read from './{CONFIG_FILE_BASE_NAME}.{{yml,toml,json}}' (if present), \
the file given with --{A_L_CONFIG}, and environment variables like \
'{ENV_PREFIX}_STORAGE__CONFIG__ROOT', in increasing order of precedence."
);

fn arg_version() -> Arg {
    Arg::new(A_L_VERSION)
        .help(formatcp!(
            "Print version information and exit. \
May be combined with -{A_S_QUIET},--{A_L_QUIET}, \
to really only output the version string."
        ))
        .action(ArgAction::SetTrue)
        .short(A_S_VERSION)
        .long(A_L_VERSION)
}

fn arg_quiet() -> Arg {
    Arg::new(A_L_QUIET)
        .help("Minimize or suppress output to stderr")
        .long_help("Minimize or suppress output to stderr; stdout is never suppressed.")
        .action(ArgAction::SetTrue)
        .short(A_S_QUIET)
        .long(A_L_QUIET)
        .global(true)
        .conflicts_with(A_L_VERBOSE)
}

fn arg_verbose() -> Arg {
    Arg::new(A_L_VERBOSE)
        .help("More verbose log output")
        .long_help("More verbose log output; useful for debugging.")
        .action(ArgAction::SetTrue)
        .short(A_S_VERBOSE)
        .long(A_L_VERBOSE)
        .global(true)
}

fn arg_config() -> Arg {
    Arg::new(A_L_CONFIG)
        .help("A settings file (YAML, TOML or JSON)")
        .long_help(ABOUT_CONFIG)
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .value_name("FILE")
        .value_hint(ValueHint::FilePath)
        .short(A_S_CONFIG)
        .long(A_L_CONFIG)
        .global(true)
}

fn arg_local_root() -> Arg {
    Arg::new(A_L_LOCAL_ROOT)
        .help("Read the collections from this local directory")
        .long_help(
            "Read the collections from this local directory, \
e.g. '/data/digital_collections/IIIF/IIIF_Files'.",
        )
        .num_args(1)
        .value_parser(value_parser!(PathBuf))
        .value_name("DIR")
        .value_hint(ValueHint::DirPath)
        .short(A_S_LOCAL_ROOT)
        .long(A_L_LOCAL_ROOT)
        .global(true)
}

fn arg_webdav() -> Arg {
    Arg::new(A_L_WEBDAV)
        .help("Read the collections from this WebDAV base URL")
        .long_help(
            "Read the collections from this WebDAV (e.g. OwnCloud) base URL. \
Credentials are taken from the settings.",
        )
        .num_args(1)
        .value_name("URL")
        .value_hint(ValueHint::Url)
        .short(A_S_WEBDAV)
        .long(A_L_WEBDAV)
        .global(true)
}

fn arg_chunks() -> Arg {
    Arg::new(A_P_CHUNKS)
        .help("Identifiers or identifier chunks, e.g. 'mvol-0004-1930'")
        .num_args(1..)
        .value_parser(IdentifierChunk::parse)
        .action(ArgAction::Append)
        .required(true)
}

fn arg_list_valid() -> Arg {
    Arg::new(A_L_LIST_VALID)
        .help("Print the valid identifiers, one per line")
        .action(ArgAction::SetTrue)
        .long(A_L_LIST_VALID)
}

fn arg_show_errors() -> Arg {
    Arg::new(A_L_SHOW_ERRORS)
        .help("Print one line per problem found")
        .action(ArgAction::SetTrue)
        .long(A_L_SHOW_ERRORS)
}

fn arg_format() -> Arg {
    Arg::new(A_L_FORMAT)
        .help("The output format")
        .long_help(
            "The output format; 'json' prints one object per identifier, \
with the fields 'identifier', 'valid' and 'errors'.",
        )
        .num_args(1)
        .value_parser(PossibleValuesParser::new(Format::VARIANTS.iter().copied()))
        .default_value("text")
        .short(A_S_FORMAT)
        .long(A_L_FORMAT)
}

fn arg_no_ocr_check() -> Arg {
    Arg::new(A_L_NO_OCR_CHECK)
        .help("Skip the final OCR status check of mvol issues")
        .action(ArgAction::SetTrue)
        .long(A_L_NO_OCR_CHECK)
}

fn subcommand_ls() -> Command {
    Command::new(SC_LS)
        .about("List all identifiers at or below the given chunks")
        .arg(arg_chunks())
}

fn subcommand_validate() -> Command {
    Command::new(SC_VALIDATE)
        .about("Validate all identifiers at or below the given chunks")
        .long_about(
            "Validate all identifiers at or below the given chunks. \
Exits with 1 if any of them is invalid.",
        )
        .arg(arg_list_valid())
        .arg(arg_show_errors())
        .group(
            ArgGroup::new(G_MODE)
                .args([A_L_LIST_VALID, A_L_SHOW_ERRORS])
                .required(true),
        )
        .arg(arg_format())
        .arg(arg_no_ocr_check())
        .arg(arg_chunks())
}

fn subcommand_mtime() -> Command {
    Command::new(SC_MTIME)
        .about("Print the newest modification time of each identifier")
        .arg(arg_chunks())
}

#[must_use]
pub fn args_matcher() -> Command {
    command!()
        .about("Validates the items of the digital collections")
        .long_about(formatcp!(
            "Validates the items of the digital collections, \
stored on a local file-system or a WebDAV server.\n\n{ABOUT_CONFIG}"
        ))
        .disable_version_flag(true)
        .bin_name(clap::crate_name!())
        .arg(arg_version())
        .arg(arg_quiet())
        .arg(arg_verbose())
        .arg(arg_config())
        .arg(arg_local_root())
        .arg(arg_webdav())
        .group(ArgGroup::new(G_STORAGE).args([A_L_LOCAL_ROOT, A_L_WEBDAV]))
        .subcommand(subcommand_ls())
        .subcommand(subcommand_validate())
        .subcommand(subcommand_mtime())
        .arg_required_else_help(true)
}
