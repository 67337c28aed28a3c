// The `condense` flow: produce a media file containing only the spans
// with visible subtitles, plus a re-timed copy of those subtitles.
// See spec §4.6.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ArgMatches;

use condense_core::filtergraph::{FilterGraphWriter, StreamKind};
use condense_core::TimeRanges;

use crate::cli::{self, InputStreams};
use crate::error::*;
use crate::ffmpeg;
use crate::ffprobe::Prober;
use crate::media_ext;
use crate::path_helpers::{ext_of, swap_ext};
use crate::scratch::ScratchGuard;
use crate::subtitle_extraction::optionally_extract_subtitles;

pub fn run(matches: &ArgMatches) -> Result<()> {
    let mut inputs = cli::resolve_input_streams(matches)?;

    let output_path = match matches.value_of("output-path") {
        Some(p) => PathBuf::from(p),
        None => match &inputs.default_input_path {
            Some(p) => swap_ext(p, ".condensed.mp3"),
            None => {
                return Err(ErrorKind::Usage(
                    "missing --output-path (-o) or --input-path (-i)".into(),
                )
                .into())
            }
        },
    };

    let output_subs_path = match matches.value_of("output-subs-path") {
        Some(p) => PathBuf::from(p),
        None => swap_ext(&output_path, ".ass"),
    };

    if media_ext::is_audio_extension(&ext_of(&output_path)) {
        inputs.discard_video();
    }

    if inputs.video_path.is_none() && inputs.audio_path.is_none() {
        return Err(ErrorKind::Selection("no video or audio input specified".into()).into());
    }
    let subs_path = inputs
        .subs_path
        .clone()
        .ok_or_else(|| ErrorKind::Selection("no subtitles input specified".into()))?;

    let overwrite = matches.is_present("overwrite");
    cli::check_overwrite(&[output_path.as_path(), output_subs_path.as_path()], overwrite)?;

    let ffmpeg_cmd = matches.value_of("ffmpeg-cmd").unwrap_or("ffmpeg").to_string();
    let ffprobe_cmd = matches.value_of("ffprobe-cmd").unwrap_or("ffprobe").to_string();
    let prober = Prober::new(ffprobe_cmd);

    let scratch = match matches.value_of("scratch-path") {
        Some(p) => ScratchGuard::user_supplied(PathBuf::from(p))?,
        None => ScratchGuard::temporary()?,
    };

    let result = run_inner(
        matches,
        &inputs,
        &subs_path,
        &output_path,
        &output_subs_path,
        &ffmpeg_cmd,
        &prober,
        scratch.path(),
    );

    match (result, scratch.close()) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), _) => Err(e),
        (Ok(()), Err(e)) => Err(ErrorKind::Cleanup(vec![e.to_string()]).into()),
    }
}

struct SelectedStream {
    file_index: u32,
    stream_index: u32,
    units_per_second: u64,
}

fn select_stream(
    prober: &Prober,
    path: Option<&Path>,
    desired_index: Option<usize>,
    kind: StreamKind,
) -> Result<Option<SelectedStream>> {
    let path = match path {
        Some(p) => p,
        None => return Ok(None),
    };

    let probe = prober.probe(path)?;
    let kind_name = match kind {
        StreamKind::Audio => "audio",
        StreamKind::Video => "video",
    };
    let stream = probe.first_matching(desired_index, Some(kind_name));

    match stream {
        Some(s) => Ok(Some(SelectedStream {
            file_index: 0,
            stream_index: s.index,
            units_per_second: s.units_per_second()?,
        })),
        None => Ok(None),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_inner(
    matches: &ArgMatches,
    inputs: &InputStreams,
    subs_path: &Path,
    output_path: &Path,
    output_subs_path: &Path,
    ffmpeg_cmd: &str,
    prober: &Prober,
    scratch_path: &Path,
) -> Result<()> {
    let mut audio_sel = select_stream(prober, inputs.audio_path.as_deref(), inputs.audio_stream_index, StreamKind::Audio)?;
    let mut video_sel = select_stream(prober, inputs.video_path.as_deref(), inputs.video_stream_index, StreamKind::Video)?;

    if audio_sel.is_none() && video_sel.is_none() {
        return Err(ErrorKind::Selection("no audio or video stream found".into()).into());
    }

    let extraction_path = scratch_path.join("subtitles-extracted.ass");
    let resolved_subs_path = optionally_extract_subtitles(
        prober,
        ffmpeg_cmd,
        subs_path,
        inputs.subs_stream_index,
        &extraction_path,
    )?;

    let subs_text =
        crate::encoding::read_to_string_with_encoding(&resolved_subs_path, &inputs.subs_encoding)?;
    let mut subs = condense_core::ass::parse(subs_text.as_bytes())?;

    crate::cli::apply_subtitle_mods(&mut subs, matches);

    let mut subs_ranges = subs.to_time_ranges();
    cli::apply_padding(&mut subs_ranges, matches)?;

    if subs_ranges.is_empty() {
        return Err(ErrorKind::Selection(
            "no subtitle events survived filtering; nothing to condense".into(),
        )
        .into());
    }

    let retime_path = scratch_path.join("subtitles-retimed.ass");
    {
        let out_file = fs::File::create(&retime_path)?;
        let mut writer = std::io::BufWriter::new(out_file);
        condense_core::ass::rewrite(subs_text.as_bytes(), &mut writer, &mut subs_ranges)?;
    }

    // Gather distinct input file paths in first-seen order; ffmpeg
    // indexes `-i` occurrences positionally.
    let mut input_files: Vec<PathBuf> = Vec::new();
    let mut index_of = |path: &Path| -> u32 {
        if let Some(pos) = input_files.iter().position(|p| p == path) {
            pos as u32
        } else {
            input_files.push(path.to_path_buf());
            (input_files.len() - 1) as u32
        }
    };

    if let (Some(sel), Some(path)) = (audio_sel.as_mut(), inputs.audio_path.as_deref()) {
        sel.file_index = index_of(path);
    }
    if let (Some(sel), Some(path)) = (video_sel.as_mut(), inputs.video_path.as_deref()) {
        sel.file_index = index_of(path);
    }

    let mut filter_text = Vec::new();
    let mut output_audio_label = None;
    let mut output_video_label = None;

    {
        let mut writer = FilterGraphWriter::new(&mut filter_text);

        if let Some(sel) = &audio_sel {
            let ranges = subs_ranges.with_units_per_second(sel.units_per_second)?;
            output_audio_label =
                Some(writer.write_audio_trim(&ranges, sel.file_index, sel.stream_index)?);
        }

        if let Some(sel) = &video_sel {
            let ranges = subs_ranges.with_units_per_second(sel.units_per_second)?;
            output_video_label =
                Some(writer.write_video_trim(&ranges, sel.file_index, sel.stream_index)?);
        }
    }

    let filter_path = scratch_path.join("trim-complex-filter.txt");
    fs::write(&filter_path, &filter_text)?;

    let mut outputs = Vec::new();
    if let Some(label) = &output_audio_label {
        outputs.push(ffmpeg::OutputMapping {
            label: label.clone(),
        });
    }
    if let Some(label) = &output_video_label {
        outputs.push(ffmpeg::OutputMapping {
            label: label.clone(),
        });
    }

    let input_refs: Vec<&Path> = input_files.iter().map(|p| p.as_path()).collect();

    ffmpeg::apply_complex_filter(
        ffmpeg_cmd,
        &input_refs,
        &filter_path,
        &outputs,
        output_path,
        matches.is_present("overwrite"),
    )?;

    if ext_of(&retime_path).eq_ignore_ascii_case(&ext_of(output_subs_path)) {
        fs::rename(&retime_path, output_subs_path).or_else(|_| {
            fs::copy(&retime_path, output_subs_path).map(|_| ())
        })?;
    } else {
        ffmpeg::demux_stream(ffmpeg_cmd, &retime_path, 0, output_subs_path, true)?;
    }

    Ok(())
}
