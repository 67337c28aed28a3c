// Resolve a user-supplied subtitles input into a standalone ASS file:
// parse it directly if it is already one, otherwise demux the chosen
// subtitle stream out of whatever container it lives in.

use std::path::{Path, PathBuf};

use condense_core::subtitles::is_supported_extension;

use crate::error::*;
use crate::ffmpeg;
use crate::ffprobe::Prober;
use crate::path_helpers::ext_of;

pub fn optionally_extract_subtitles(
    prober: &Prober,
    ffmpeg_cmd: &str,
    subs_path: &Path,
    subs_index: Option<usize>,
    extraction_path: &Path,
) -> Result<PathBuf> {
    if is_supported_extension(&ext_of(subs_path)) {
        return Ok(subs_path.to_path_buf());
    }

    let probe = prober.probe(subs_path)?;
    let stream = probe
        .first_matching(subs_index, Some("subtitle"))
        .ok_or_else(|| {
            ErrorKind::Selection(format!(
                "no subtitle stream found in {:?} (or no stream at the requested index)",
                subs_path
            ))
        })?;

    ffmpeg::demux_stream(ffmpeg_cmd, subs_path, stream.index, extraction_path, true)?;

    Ok(extraction_path.to_path_buf())
}
