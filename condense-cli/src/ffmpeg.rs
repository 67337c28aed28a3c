// Subprocess wrappers around `ffmpeg`: demuxing a single stream,
// applying a complex filter graph, and the narrower per-event jobs the
// SRS export flow needs (a screenshot, an audio clip, a video clip).

use std::path::Path;
use std::process::Command;

use crate::error::*;

fn run(tool: &'static str, cmd: &mut Command) -> Result<()> {
    let output = cmd
        .output()
        .map_err(|e| ErrorKind::ExternalTool(tool, None, format!("could not spawn {}: {}", tool, e)))?;

    if !output.status.success() {
        return Err(ErrorKind::ExternalTool(
            tool,
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        )
        .into());
    }

    Ok(())
}

/// Extract a single stream from `input_path` into `output_path`, with
/// the output format inferred from its extension.
pub fn demux_stream(
    ffmpeg_cmd: &str,
    input_path: &Path,
    stream_index: u32,
    output_path: &Path,
    overwrite: bool,
) -> Result<()> {
    let mut cmd = Command::new(ffmpeg_cmd);
    cmd.arg(if overwrite { "-y" } else { "-n" })
        .arg("-i")
        .arg(input_path)
        .arg("-map")
        .arg(format!("0:{}", stream_index))
        .arg(output_path);

    run("ffmpeg", &mut cmd)
}

/// One output stream of an `apply_complex_filter` invocation: the
/// filter-graph label to map from the given input index.
pub struct OutputMapping {
    pub label: String,
}

/// Run ffmpeg with a `-filter_complex_script` against one or more
/// inputs, mapping each of `outputs` to the single `output_path`. The
/// graph is read from `filter_script_path` rather than passed inline,
/// since an event-heavy trim/concat graph can easily exceed the
/// platform's argv size limit.
pub fn apply_complex_filter(
    ffmpeg_cmd: &str,
    input_paths: &[&Path],
    filter_script_path: &Path,
    outputs: &[OutputMapping],
    output_path: &Path,
    overwrite: bool,
) -> Result<()> {
    if input_paths.is_empty() {
        return Err(ErrorKind::Usage("no input files given to ffmpeg".into()).into());
    }
    if outputs.is_empty() {
        return Err(ErrorKind::Usage("no output streams mapped for ffmpeg".into()).into());
    }

    let mut cmd = Command::new(ffmpeg_cmd);
    cmd.arg(if overwrite { "-y" } else { "-n" })
        .arg("-filter_complex_script")
        .arg(filter_script_path);

    for input in input_paths {
        cmd.arg("-i").arg(input);
    }

    for out in outputs {
        cmd.arg("-map").arg(format!("[{}]", out.label));
    }

    cmd.arg(output_path);

    run("ffmpeg", &mut cmd)
}

/// Extract a single still frame at `timestamp_secs` into `output_path`.
pub fn screenshot(
    ffmpeg_cmd: &str,
    input_path: &Path,
    video_stream_index: u32,
    timestamp_secs: f64,
    output_path: &Path,
    overwrite: bool,
) -> Result<()> {
    let mut cmd = Command::new(ffmpeg_cmd);
    cmd.arg(if overwrite { "-y" } else { "-n" })
        .arg("-ss")
        .arg(format!("{}", timestamp_secs))
        .arg("-i")
        .arg(input_path)
        .arg("-map")
        .arg(format!("0:{}", video_stream_index))
        .arg("-frames:v")
        .arg("1")
        .arg(output_path);

    run("ffmpeg", &mut cmd)
}

/// Extract a time-bounded clip of a single stream via `-ss`/`-to`
/// stream copy, used for the SRS `audioclip`/`videoclip` columns.
pub fn clip(
    ffmpeg_cmd: &str,
    input_path: &Path,
    stream_index: u32,
    start_secs: f64,
    end_secs: f64,
    output_path: &Path,
    overwrite: bool,
) -> Result<()> {
    let mut cmd = Command::new(ffmpeg_cmd);
    cmd.arg(if overwrite { "-y" } else { "-n" })
        .arg("-ss")
        .arg(format!("{}", start_secs))
        .arg("-to")
        .arg(format!("{}", end_secs))
        .arg("-i")
        .arg(input_path)
        .arg("-map")
        .arg(format!("0:{}", stream_index))
        .arg("-c")
        .arg("copy")
        .arg(output_path);

    run("ffmpeg", &mut cmd)
}
