//! Deterministic synthesis of an ffmpeg complex-filter graph that trims
//! and concatenates a stream down to a set of [`TimeRanges`]. See
//! spec §4.4.
//!
//! The writer owns nothing about ffmpeg's process lifecycle; it only
//! emits filter-graph text onto an `impl Write`. Invoking ffmpeg with
//! that text is `condense-cli`'s job.

use std::io::Write;

use crate::error::{ErrorKind, Result};
use crate::time_ranges::TimeRanges;

/// The two ffmpeg stream kinds this writer knows how to trim. Each
/// gets its own `trim`/`atrim` filter, its own label prefix, and its
/// own pair of independent counters (segment labels, concat labels),
/// since a single filter-graph may trim both an audio and a video
/// stream from the same input without colliding label names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Audio,
    Video,
}

/// Writes one or more trim-and-concat filter chains to an underlying
/// `impl Write`. Every call to
/// [`write_audio_trim`](FilterGraphWriter::write_audio_trim) /
/// [`write_video_trim`](FilterGraphWriter::write_video_trim) draws
/// from that kind's own segment/concat counters, so multiple streams
/// can be trimmed into the same `-filter_complex` script without label
/// collisions.
pub struct FilterGraphWriter<W: Write> {
    writer: W,
    segment_counters: [u32; 2],
    concat_counters: [u32; 2],
}

impl<W: Write> FilterGraphWriter<W> {
    pub fn new(writer: W) -> Self {
        FilterGraphWriter {
            writer,
            segment_counters: [0, 0],
            concat_counters: [0, 0],
        }
    }

    fn kind_idx(kind: StreamKind) -> usize {
        match kind {
            StreamKind::Audio => 0,
            StreamKind::Video => 1,
        }
    }

    fn next_segment_label(&mut self, kind: StreamKind) -> String {
        let idx = Self::kind_idx(kind);
        let n = self.segment_counters[idx];
        self.segment_counters[idx] += 1;
        match kind {
            StreamKind::Audio => format!("a{}", n),
            StreamKind::Video => format!("v{}", n),
        }
    }

    fn next_concat_label(&mut self, kind: StreamKind) -> String {
        let idx = Self::kind_idx(kind);
        let n = self.concat_counters[idx];
        self.concat_counters[idx] += 1;
        match kind {
            StreamKind::Audio => format!("ca{}", n),
            StreamKind::Video => format!("cv{}", n),
        }
    }

    /// Emit `atrim`/`trim`+`setpts` filters for every interval in
    /// `ranges`, each reading `[file_index:stream_index]` and writing
    /// to a freshly allocated segment label. After every pair of
    /// pending segment labels, a `concat` statement joins the two
    /// most recent into one, so the writer only ever holds a single
    /// pending label per kind. Returns the final pending label —
    /// the output of the whole chain.
    ///
    /// `ranges` must not be empty: an empty range set is a
    /// programming error on the caller's part (the caller must filter
    /// before calling), and is reported as `ErrorKind::Invalid`.
    fn write_trim(
        &mut self,
        kind: StreamKind,
        ranges: &TimeRanges,
        file_index: u32,
        stream_index: u32,
    ) -> Result<String> {
        if ranges.is_empty() {
            return Err(ErrorKind::Invalid("no time ranges to trim".into()).into());
        }

        let mut pending: Vec<String> = Vec::new();

        for interval in ranges.iter() {
            let label = self.next_segment_label(kind);

            match kind {
                StreamKind::Audio => write!(
                    self.writer,
                    "[{file}:{stream}]atrim=start_pts={start}:end_pts={end},asetpts=PTS-STARTPTS[{label}];",
                    file = file_index,
                    stream = stream_index,
                    start = interval.start,
                    end = interval.end,
                    label = label,
                )?,
                StreamKind::Video => write!(
                    self.writer,
                    "[{file}:{stream}]trim=start_pts={start}:end_pts={end},setpts=PTS-STARTPTS[{label}];",
                    file = file_index,
                    stream = stream_index,
                    start = interval.start,
                    end = interval.end,
                    label = label,
                )?,
            }

            pending.push(label);

            if pending.len() >= 2 {
                let second = pending.pop().unwrap();
                let first = pending.pop().unwrap();
                let concat_label = self.next_concat_label(kind);

                match kind {
                    StreamKind::Audio => write!(
                        self.writer,
                        "[{first}][{second}]concat=v=0:a=1[{out}];",
                        first = first,
                        second = second,
                        out = concat_label,
                    )?,
                    StreamKind::Video => write!(
                        self.writer,
                        "[{first}][{second}]concat[{out}];",
                        first = first,
                        second = second,
                        out = concat_label,
                    )?,
                }

                pending.push(concat_label);
            }
        }

        Ok(pending.pop().expect("at least one segment was written"))
    }

    pub fn write_audio_trim(
        &mut self,
        ranges: &TimeRanges,
        file_index: u32,
        stream_index: u32,
    ) -> Result<String> {
        self.write_trim(StreamKind::Audio, ranges, file_index, stream_index)
    }

    pub fn write_video_trim(
        &mut self,
        ranges: &TimeRanges,
        file_index: u32,
        stream_index: u32,
    ) -> Result<String> {
        self.write_trim(StreamKind::Video, ranges, file_index, stream_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ranges_are_a_programming_error() {
        let ranges = TimeRanges::empty(1000);
        let mut buf = Vec::new();
        let mut fw = FilterGraphWriter::new(&mut buf);
        assert!(fw.write_audio_trim(&ranges, 0, 0).is_err());
    }

    #[test]
    fn single_range_produces_one_trim_and_no_concat() {
        let ranges = TimeRanges::from_unsorted(vec![(0, 1000)], 1000);
        let mut buf = Vec::new();
        let mut fw = FilterGraphWriter::new(&mut buf);
        let label = fw.write_audio_trim(&ranges, 0, 1).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(label, "a0");
        assert_eq!(
            text,
            "[0:1]atrim=start_pts=0:end_pts=1000,asetpts=PTS-STARTPTS[a0];"
        );
    }

    #[test]
    fn multiple_ranges_pairwise_concat() {
        let ranges = TimeRanges::from_unsorted(vec![(0, 500), (1000, 1500), (2000, 2500)], 1000);
        let mut buf = Vec::new();
        let mut fw = FilterGraphWriter::new(&mut buf);
        let label = fw.write_video_trim(&ranges, 2, 0).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("[2:0]trim=start_pts=0:end_pts=500,setpts=PTS-STARTPTS[v0];"));
        assert!(text.contains("[2:0]trim=start_pts=1000:end_pts=1500,setpts=PTS-STARTPTS[v1];"));
        assert!(text.contains("[v0][v1]concat[cv0];"));
        assert!(text.contains("[2:0]trim=start_pts=2000:end_pts=2500,setpts=PTS-STARTPTS[v2];"));
        assert!(text.contains("[cv0][v2]concat[cv1];"));
        assert_eq!(label, "cv1");
    }

    #[test]
    fn audio_concat_carries_v0_a1_flags() {
        let ranges = TimeRanges::from_unsorted(vec![(0, 10), (20, 30)], 1000);
        let mut buf = Vec::new();
        let mut fw = FilterGraphWriter::new(&mut buf);
        fw.write_audio_trim(&ranges, 0, 0).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("concat=v=0:a=1[ca0];"));
    }

    #[test]
    fn audio_and_video_counters_are_independent() {
        let ranges = TimeRanges::from_unsorted(vec![(0, 500)], 1000);
        let mut buf = Vec::new();
        let mut fw = FilterGraphWriter::new(&mut buf);
        let a = fw.write_audio_trim(&ranges, 0, 0).unwrap();
        let v = fw.write_video_trim(&ranges, 0, 1).unwrap();
        let a2 = fw.write_audio_trim(&ranges, 0, 0).unwrap();

        assert_eq!(a, "a0");
        assert_eq!(v, "v0");
        assert_eq!(a2, "a1");
    }
}
