//! Pure data types for `ffprobe -show_streams -print_format json`
//! output. Invoking `ffprobe` and reading its stdout is `condense-cli`'s
//! job; this module only knows how to interpret the bytes once they
//! exist. See spec §4.5.

use serde::Deserialize;

use crate::error::{ErrorKind, Result};

/// One entry of ffprobe's `streams` array. Only the fields the pipeline
/// actually reads are modeled; everything else in the JSON object is
/// ignored by `serde`.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamDescriptor {
    pub index: u32,
    pub codec_type: String,
    #[serde(default)]
    pub codec_name: Option<String>,
    pub time_base: String,
}

impl StreamDescriptor {
    /// `time_base` is an `"num/den"` rational, e.g. `"1/1000"`. The
    /// pipeline only ever needs its reciprocal: how many integer units
    /// make up one second. Truncating integer division matches the
    /// common case where `num == 1`; non-unit numerators round down,
    /// same as the original tool.
    pub fn units_per_second(&self) -> Result<u64> {
        let mut parts = self.time_base.splitn(2, '/');
        let num: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ErrorKind::BadTimeBase(self.time_base.clone()))?;
        let den: i64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ErrorKind::BadTimeBase(self.time_base.clone()))?;

        if num == 0 {
            return Err(ErrorKind::BadTimeBase(self.time_base.clone()).into());
        }

        Ok((den / num) as u64)
    }

    pub fn is_audio(&self) -> bool {
        self.codec_type == "audio"
    }

    pub fn is_video(&self) -> bool {
        self.codec_type == "video"
    }

    pub fn is_subtitle(&self) -> bool {
        self.codec_type == "subtitle"
    }
}

/// The top-level shape of ffprobe's `-show_streams` JSON output.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeResult {
    pub streams: Vec<StreamDescriptor>,
}

impl ProbeResult {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ErrorKind::BadTimeBase(format!("could not parse probe JSON: {}", e)).into())
    }

    /// The first stream whose `codec_type` equals `kind` (if given). If
    /// `index` is given it is treated as a position in the `streams`
    /// array itself, not as the stream's own `index` field, and the
    /// `kind` filter still applies to that single stream — so passing
    /// an index whose stream does not match `kind` returns `None`
    /// rather than falling back to a search. See spec §4.5, §9(a).
    pub fn first_matching(&self, index: Option<usize>, kind: Option<&str>) -> Option<&StreamDescriptor> {
        match index {
            Some(i) => {
                let stream = self.streams.get(i)?;
                match kind {
                    Some(k) if stream.codec_type != k => None,
                    _ => Some(stream),
                }
            }
            None => self
                .streams
                .iter()
                .find(|s| kind.map_or(true, |k| s.codec_type == k)),
        }
    }

    pub fn audio_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.is_audio())
    }

    pub fn video_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.is_video())
    }

    pub fn subtitle_streams(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(|s| s.is_subtitle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "h264", "time_base": "1/1000"},
            {"index": 1, "codec_type": "audio", "codec_name": "aac", "time_base": "1/48000"},
            {"index": 2, "codec_type": "subtitle", "codec_name": "ass", "time_base": "1/100"}
        ]
    }"#;

    #[test]
    fn parses_streams_and_classifies_by_codec_type() {
        let probe = ProbeResult::parse(SAMPLE).unwrap();
        assert_eq!(probe.streams.len(), 3);
        assert_eq!(probe.audio_streams().count(), 1);
        assert_eq!(probe.video_streams().count(), 1);
        assert_eq!(probe.subtitle_streams().count(), 1);
    }

    #[test]
    fn units_per_second_is_time_base_reciprocal() {
        let probe = ProbeResult::parse(SAMPLE).unwrap();
        let audio = probe.first_matching(None, Some("audio")).unwrap();
        assert_eq!(audio.units_per_second().unwrap(), 48000);
    }

    #[test]
    fn first_matching_with_no_index_finds_first_of_kind() {
        let probe = ProbeResult::parse(SAMPLE).unwrap();
        let video = probe.first_matching(None, Some("video")).unwrap();
        assert_eq!(video.index, 0);
    }

    #[test]
    fn first_matching_treats_index_as_array_position_not_declared_index() {
        // Stream at array position 1 has codec_type "audio" and its own
        // declared `index` field of 1 here, but the two need not agree
        // in general: `index` in `first_matching` addresses the array,
        // not the `index` JSON field.
        let json = r#"{
            "streams": [
                {"index": 5, "codec_type": "video", "time_base": "1/1000"},
                {"index": 6, "codec_type": "audio", "time_base": "1/44100"}
            ]
        }"#;
        let probe = ProbeResult::parse(json).unwrap();
        let second = probe.first_matching(Some(1), Some("audio")).unwrap();
        assert_eq!(second.index, 6);
        assert_eq!(second.units_per_second().unwrap(), 44100);
    }

    #[test]
    fn first_matching_with_index_returns_none_if_kind_does_not_match() {
        let probe = ProbeResult::parse(SAMPLE).unwrap();
        // Array position 0 is the video stream, not audio.
        assert!(probe.first_matching(Some(0), Some("audio")).is_none());
    }

    #[test]
    fn first_matching_with_out_of_range_index_is_none() {
        let probe = ProbeResult::parse(SAMPLE).unwrap();
        assert!(probe.first_matching(Some(99), None).is_none());
    }

    #[test]
    fn zero_numerator_time_base_is_rejected() {
        let probe = StreamDescriptor {
            index: 0,
            codec_type: "audio".into(),
            codec_name: None,
            time_base: "0/1".into(),
        };
        assert!(probe.units_per_second().is_err());
    }
}
