// Entry point: wires the `condense` and `srs` subcommands to the two
// pipeline flows. See spec §6 for the CLI surface and §7 for the
// error taxonomy this prints.

#[macro_use]
extern crate error_chain;

use clap::{App, AppSettings, Arg, SubCommand};

mod cli;
mod encoding;
mod error;
mod ffmpeg;
mod ffprobe;
mod media_ext;
mod path_helpers;
mod pipeline_condense;
mod pipeline_srs;
mod scratch;
mod subtitle_extraction;

pub use error::{Error, ErrorKind, Result};

const PKG_VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
const PKG_NAME: Option<&'static str> = option_env!("CARGO_PKG_NAME");
const PKG_DESCRIPTION: Option<&'static str> = option_env!("CARGO_PKG_DESCRIPTION");

/// Prints an info line, matching the teacher's `pinfo`/`pwarning`/
/// `perror` convention for untagged progress output.
pub fn pinfo<'a, T: Into<std::borrow::Cow<'a, str>>>(s: T) {
    println!("II: {}", s.into());
}

pub fn pwarning<'a, T: Into<std::borrow::Cow<'a, str>>>(s: T) {
    eprintln!("WW: {}", s.into());
}

pub fn perror<'a, T: Into<std::borrow::Cow<'a, str>>>(s: T) {
    eprintln!("EE: {}", s.into());
}

fn build_app<'a, 'b>() -> App<'a, 'b> {
    let condense = SubCommand::with_name("condense")
        .about("Produce a condensed audio/video file containing only the subtitled spans")
        .args(&cli::input_stream_args())
        .args(&cli::overwrite_and_tool_args())
        .args(&cli::padding_args())
        .args(&cli::subtitle_mod_args())
        .arg(
            Arg::with_name("output-path")
                .short("o")
                .long("output-path")
                .value_name("PATH")
                .help("Output media path; defaults to the input with extension replaced by .condensed.mp3"),
        )
        .arg(
            Arg::with_name("output-subs-path")
                .long("output-subs-path")
                .alias("output-subtitles-path")
                .value_name("PATH")
                .help("Output path for the re-timed subtitles; defaults to the output path with extension .ass"),
        );

    let srs = SubCommand::with_name("srs")
        .about("Export one flashcard row per surviving subtitle event, with per-event media")
        .args(&cli::input_stream_args())
        .args(&cli::overwrite_and_tool_args())
        .args(&cli::subtitle_mod_args())
        .arg(
            Arg::with_name("columns")
                .short("c")
                .long("columns")
                .value_name("LIST")
                .help("Comma-separated column names; see --help-columns"),
        )
        .arg(
            Arg::with_name("help-columns")
                .long("help-columns")
                .help("Print the recognized column reference and exit"),
        )
        .arg(
            Arg::with_name("disallowed-chars")
                .long("disallowed-chars")
                .value_name("CHARS")
                .default_value("[]<>:\"/?*^\\|")
                .help("Characters replaced with '_' in generated media file names"),
        )
        .arg(
            Arg::with_name("output-path")
                .short("o")
                .long("output-path")
                .value_name("PATH")
                .help("Output spreadsheet path; defaults to the input with extension replaced by .srs_export.tsv"),
        )
        .arg(
            Arg::with_name("output-delimiter")
                .long("output-delimiter")
                .value_name("tab|pipe|semicolon|colon|comma|space|CHAR")
                .help("Field delimiter; defaults to comma/tab inferred from the output extension"),
        )
        .arg(
            Arg::with_name("media")
                .short("m")
                .long("media")
                .value_name("DIR")
                .help("Directory to write per-event media into; defaults to the output path's directory"),
        );

    App::new(PKG_NAME.unwrap_or("condense"))
        .version(PKG_VERSION.unwrap_or("unknown"))
        .about(PKG_DESCRIPTION.unwrap_or("Condense subtitled media and export SRS flashcard rows"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(condense)
        .subcommand(srs)
}

fn run() -> Result<()> {
    let app = build_app();
    let matches = app.get_matches();

    match matches.subcommand() {
        ("condense", Some(sub_matches)) => pipeline_condense::run(sub_matches),
        ("srs", Some(sub_matches)) => {
            if sub_matches.is_present("help-columns") {
                pipeline_srs::print_help_columns();
                std::process::exit(1);
            }
            pipeline_srs::run(sub_matches)
        }
        _ => unreachable!("clap enforces a subcommand via SubcommandRequiredElseHelp"),
    }
}

fn main() {
    let primary_result = run();

    if let Err(e) = &primary_result {
        perror(format!("error: {}", e));
        for cause in e.iter().skip(1) {
            perror(format!("caused by: {}", cause));
        }
    }

    std::process::exit(if primary_result.is_ok() { 0 } else { 1 });
}
