// Shared argument groups used by both subcommands: the three-input
// (video/audio/subs) resolution scheme, padding, and the overwrite
// check. Grounded on the original tool's own "common" argument
// modules, which both `condense` and `srs` pull in the same way.

use std::path::{Path, PathBuf};

use clap::{Arg, ArgMatches};

use condense_core::TimeRanges;

use crate::error::*;

// clap 2.x only allows single-character short flags, so the original
// tool's multi-character short forms (`-iv`, `-ias`, `-ps`, ...) survive
// here only as their long forms; `-i` is the one short flag clap can
// actually represent.
pub fn input_stream_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("input-path")
            .short("i")
            .long("input-path")
            .value_name("PATH")
            .help("Audio/video file with embedded subtitles to use for any input not given its own path"),
        Arg::with_name("input-video-path")
            .long("input-video-path")
            .value_name("PATH")
            .help("Path to the file containing the video to use"),
        Arg::with_name("input-audio-path")
            .long("input-audio-path")
            .value_name("PATH")
            .help("Path to the file containing the audio to use"),
        Arg::with_name("input-subs-path")
            .long("input-subs-path")
            .alias("input-subtitles-path")
            .value_name("PATH")
            .help("Path to the file containing the subtitles to use"),
        Arg::with_name("input-subs-encoding")
            .long("input-subs-encoding")
            .alias("input-subtitles-encoding")
            .value_name("ENCODING")
            .default_value("utf-8")
            .help("Charset encoding of the subtitles file"),
        Arg::with_name("input-video-stream")
            .long("input-video-stream")
            .value_name("INDEX")
            .help("Stream position (0-based, in the full probed stream list) to use from the video input; must be a video stream"),
        Arg::with_name("input-audio-stream")
            .long("input-audio-stream")
            .value_name("INDEX")
            .help("Stream position (0-based, in the full probed stream list) to use from the audio input; must be an audio stream"),
        Arg::with_name("input-subs-stream")
            .long("input-subs-stream")
            .value_name("INDEX")
            .help("Stream position (0-based, in the full probed stream list) to use from the subs input; must be a subtitle stream"),
    ]
}

pub fn overwrite_and_tool_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("overwrite")
            .short("w")
            .long("overwrite")
            .help("Allow overwriting output paths"),
        Arg::with_name("scratch-path")
            .long("scratch-path")
            .value_name("DIR")
            .help("Directory for temporary files; if not given, a fresh one is created and removed after the run"),
        Arg::with_name("ffmpeg-cmd")
            .long("ffmpeg-cmd")
            .alias("ffmpeg-command")
            .value_name("CMD")
            .default_value("ffmpeg"),
        Arg::with_name("ffprobe-cmd")
            .long("ffprobe-cmd")
            .alias("ffprobe-command")
            .value_name("CMD")
            .default_value("ffprobe"),
    ]
}

pub fn padding_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("padding")
            .short("p")
            .long("padding")
            .value_name("SECONDS")
            .help("Add this many seconds to the start and end of each subtitle; mutually exclusive with --padding-start/--padding-end")
            .conflicts_with_all(&["padding-start", "padding-end"]),
        Arg::with_name("padding-start")
            .long("padding-start")
            .value_name("SECONDS")
            .help("Add this many seconds to the start of each subtitle"),
        Arg::with_name("padding-end")
            .long("padding-end")
            .value_name("SECONDS")
            .help("Add this many seconds to the end of each subtitle"),
    ]
}

/// The three (possibly-shared) input paths plus their stream indices,
/// resolved from the raw `-i`/`-iv`/`-ia`/`-is` argument set: any
/// unset specific path falls back to `--input-path`.
pub struct InputStreams {
    pub default_input_path: Option<PathBuf>,
    pub video_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    pub subs_path: Option<PathBuf>,
    pub subs_encoding: String,
    pub video_stream_index: Option<usize>,
    pub audio_stream_index: Option<usize>,
    pub subs_stream_index: Option<usize>,
}

impl InputStreams {
    pub fn discard_video(&mut self) {
        self.video_path = None;
        self.video_stream_index = None;
    }
}

fn opt_path(matches: &ArgMatches, name: &str) -> Option<PathBuf> {
    matches.value_of(name).map(PathBuf::from)
}

fn opt_index(matches: &ArgMatches, name: &str) -> Result<Option<usize>> {
    match matches.value_of(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ErrorKind::Usage(format!("--{} must be a non-negative integer, got {:?}", name, raw)).into()),
    }
}

pub fn resolve_input_streams(matches: &ArgMatches) -> Result<InputStreams> {
    let default_input_path = opt_path(matches, "input-path");

    let video_path = opt_path(matches, "input-video-path").or_else(|| default_input_path.clone());
    let audio_path = opt_path(matches, "input-audio-path").or_else(|| default_input_path.clone());
    let subs_path = opt_path(matches, "input-subs-path").or_else(|| default_input_path.clone());

    Ok(InputStreams {
        default_input_path,
        video_path,
        audio_path,
        subs_path,
        subs_encoding: matches.value_of("input-subs-encoding").unwrap_or("utf-8").to_string(),
        video_stream_index: opt_index(matches, "input-video-stream")?,
        audio_stream_index: opt_index(matches, "input-audio-stream")?,
        subs_stream_index: opt_index(matches, "input-subs-stream")?,
    })
}

/// `--padding` is mutually exclusive with `--padding-start`/`-end` at
/// the clap level; this just resolves the floating-point seconds into
/// hundredths for the 100-UPS padder.
pub fn resolve_padding(matches: &ArgMatches) -> Result<(u64, u64)> {
    let parse_secs = |name: &str| -> Result<Option<f64>> {
        match matches.value_of(name) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ErrorKind::Usage(format!("--{} must be a number, got {:?}", name, raw)).into()),
        }
    };

    let padding = parse_secs("padding")?;
    let padding_start = parse_secs("padding-start")?;
    let padding_end = parse_secs("padding-end")?;

    let (start, end) = if let Some(p) = padding {
        (p, p)
    } else {
        (padding_start.unwrap_or(0.0), padding_end.unwrap_or(0.0))
    };

    if start < 0.0 || end < 0.0 {
        return Err(ErrorKind::Usage("padding values must not be negative".into()).into());
    }

    Ok(((start * 100.0).round() as u64, (end * 100.0).round() as u64))
}

pub fn apply_padding(ranges: &mut TimeRanges, matches: &ArgMatches) -> Result<()> {
    let (start, end) = resolve_padding(matches)?;
    ranges.pad(start, end, 100).chain_err(|| "could not apply padding")?;
    Ok(())
}

/// Fail before any subprocess is spawned if any of `paths` already
/// exists and the user has not passed `--overwrite`.
pub fn check_overwrite(paths: &[&Path], overwrite: bool) -> Result<()> {
    if overwrite {
        return Ok(());
    }

    let existing: Vec<String> = paths
        .iter()
        .filter(|p| p.exists())
        .map(|p| p.display().to_string())
        .collect();

    if existing.is_empty() {
        return Ok(());
    }

    Err(ErrorKind::Usage(format!(
        "output path(s) already exist: {}; pass --overwrite (-w) to replace them",
        existing.join(", ")
    ))
    .into())
}

pub fn subtitle_mod_args<'a, 'b>() -> Vec<Arg<'a, 'b>> {
    vec![
        Arg::with_name("keep-blank-subs")
            .long("keep-blank-subs")
            .alias("keep-blank-subtitles")
            .help("Do not automatically remove subtitles whose text is empty or all whitespace"),
        Arg::with_name("remove-subs-containing")
            .long("remove-subs-containing")
            .alias("remove-subtitles-containing")
            .value_name("STRING")
            .multiple(true)
            .number_of_values(1)
            .help("Remove subtitles whose text contains STRING (case sensitive); may be given multiple times"),
        Arg::with_name("keep-subs-containing")
            .long("keep-subs-containing")
            .alias("keep-subtitles-containing")
            .value_name("STRING")
            .multiple(true)
            .number_of_values(1)
            .help("Keep only subtitles whose text contains STRING (case sensitive); may be given multiple times"),
    ]
}

/// Drop blank events (unless `--keep-blank-subs`), then apply every
/// `--remove-subs-containing`/`--keep-subs-containing` filter in the
/// order they were given.
pub fn apply_subtitle_mods(subs: &mut condense_core::Subtitles, matches: &ArgMatches) {
    if !matches.is_present("keep-blank-subs") {
        subs.retain_events(|e| !e.plain_text.trim().is_empty());
    }

    if let Some(values) = matches.values_of("remove-subs-containing") {
        for needle in values {
            let needle = needle.to_string();
            subs.retain_events(|e| !e.plain_text.contains(&needle));
        }
    }

    if let Some(values) = matches.values_of("keep-subs-containing") {
        for needle in values {
            let needle = needle.to_string();
            subs.retain_events(|e| e.plain_text.contains(&needle));
        }
    }
}
