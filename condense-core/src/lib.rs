//! Pure algorithms behind condensing subtitled media: time-range
//! algebra, subtitle retiming, the ASS codec, filter-graph synthesis
//! and probe-JSON decoding. No filesystem access, no subprocesses, no
//! CLI — see `condense-cli` for the binary that wires these up to
//! ffmpeg/ffprobe.

#[macro_use]
extern crate error_chain;

pub mod ass;
pub mod error;
pub mod filtergraph;
pub mod probe;
pub mod retimer;
pub mod subtitles;
pub mod time_ranges;

pub use ass::{escape_to_plain_text, parse_time, unparse_time, SubtitleEvent, Subtitles};
pub use error::{Error, ErrorKind, Result};
pub use filtergraph::{FilterGraphWriter, StreamKind};
pub use probe::{ProbeResult, StreamDescriptor};
pub use retimer::retime;
pub use time_ranges::{Interval, TimeRanges};
