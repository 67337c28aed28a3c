//! Streaming parser and rewriter for Advanced SubStation Alpha (ASS)
//! dialogue events. Preservation-first: every line that is not a
//! recognized dialogue line is copied to the output verbatim, including
//! its trailing newline. See spec §4.3.

use std::io::{BufRead, Write};

use crate::error::{ErrorKind, Result};
use crate::retimer::retime;
use crate::time_ranges::TimeRanges;

/// One dialogue event as it appeared in (or was derived from) an ASS
/// file. Immutable after parse; the retimer produces a *new* event (or
/// drops it) rather than mutating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEvent {
    pub start: u64,
    pub end: u64,
    pub raw_text: String,
    pub plain_text: String,
}

/// A parsed set of dialogue events together with the units-per-second
/// their timestamps are expressed in. For the ASS dialect this is
/// always 100 (hundredths of a second).
#[derive(Debug, Clone)]
pub struct Subtitles {
    pub events: Vec<SubtitleEvent>,
    pub event_units_per_second: u64,
}

impl Subtitles {
    /// Remove events that do not match `predicate`, in place.
    pub fn retain_events<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&SubtitleEvent) -> bool,
    {
        self.events.retain(|e| predicate(e));
    }

    /// Build the `TimeRanges` covering every surviving event, at
    /// `event_units_per_second`.
    pub fn to_time_ranges(&self) -> TimeRanges {
        TimeRanges::from_unsorted(
            self.events.iter().map(|e| (e.start, e.end)),
            self.event_units_per_second,
        )
    }
}

/// Parse `H:MM:SS.CC` (hundredths) into the canonical hundredths-of-a-
/// second integer. Strict: exactly three colon-parts, exactly two
/// dot-parts in the seconds segment, all non-negative.
pub fn parse_time(field: &str) -> Result<u64> {
    let parts: Vec<&str> = field.split(':').collect();
    if parts.len() != 3 {
        return Err(ErrorKind::Malformed(format!(
            "invalid time field, expected 3 colon-separated parts but got {:?}",
            field
        ))
        .into());
    }

    let hours: i64 = parts[0].parse().map_err(|_| {
        ErrorKind::Malformed(format!("invalid hours in time field {:?}", field))
    })?;
    let mins: i64 = parts[1].parse().map_err(|_| {
        ErrorKind::Malformed(format!("invalid minutes in time field {:?}", field))
    })?;

    let sec_parts: Vec<&str> = parts[2].split('.').collect();
    if sec_parts.len() != 2 {
        return Err(ErrorKind::Malformed(format!(
            "invalid seconds.hundredths, expected 2 dot-separated parts but got {:?}",
            parts[2]
        ))
        .into());
    }

    let seconds: i64 = sec_parts[0].parse().map_err(|_| {
        ErrorKind::Malformed(format!("invalid seconds in time field {:?}", field))
    })?;
    let hundredths: i64 = sec_parts[1].parse().map_err(|_| {
        ErrorKind::Malformed(format!("invalid hundredths in time field {:?}", field))
    })?;

    if hours < 0 || mins < 0 || seconds < 0 || hundredths < 0 {
        return Err(ErrorKind::Malformed(format!(
            "negative value in time field {:?}",
            field
        ))
        .into());
    }

    Ok((hundredths + seconds * 100 + mins * 100 * 60 + hours * 100 * 60 * 60) as u64)
}

/// Inverse of [`parse_time`].
pub fn unparse_time(hundredths: u64) -> String {
    let h = hundredths / (100 * 60 * 60);
    let m = (hundredths / (100 * 60)) % 60;
    let s = (hundredths / 100) % 60;
    let c = hundredths % 100;

    format!("{}:{:02}:{:02}.{:02}", h, m, s, c)
}

/// Decode the ASS override escapes `\n` and `\N` (each a two-character
/// sequence) into a line feed. Every other character, including a lone
/// trailing backslash, is copied as-is. Styling overrides (curly-brace
/// runs) are left untouched.
pub fn escape_to_plain_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            let next = chars[i + 1];
            if next == 'n' || next == 'N' {
                out.push('\n');
                i += 2;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

#[derive(PartialEq, Eq)]
enum State {
    SeekEvents,
    ReadFormat,
    ReadEvents,
}

struct Format {
    start_idx: usize,
    end_idx: usize,
    text_idx: usize,
    len: usize,
}

fn parse_format_line(line: &str) -> Result<Format> {
    let rest = line
        .strip_prefix("Format:")
        .ok_or_else(|| ErrorKind::Malformed(format!("expected a Format line, got: {}", line)))?;

    let fields: Vec<String> = rest.split(',').map(|f| f.trim().to_string()).collect();

    let end_idx = fields.iter().position(|f| f == "End").ok_or_else(|| {
        ErrorKind::Malformed("malformed Format line, does not contain \"End\"".to_string())
    })?;
    let start_idx = fields.iter().position(|f| f == "Start").ok_or_else(|| {
        ErrorKind::Malformed("malformed Format line, does not contain \"Start\"".to_string())
    })?;
    let text_idx = fields.iter().position(|f| f == "Text").ok_or_else(|| {
        ErrorKind::Malformed("malformed Format line, does not contain \"Text\"".to_string())
    })?;

    if text_idx != fields.len() - 1 {
        return Err(
            ErrorKind::Malformed("malformed Format line, \"Text\" must be the last field".into())
                .into(),
        );
    }

    Ok(Format {
        start_idx,
        end_idx,
        text_idx,
        len: fields.len(),
    })
}

fn split_dialogue<'a>(line: &'a str, limit: usize) -> Vec<&'a str> {
    if limit <= 1 {
        return vec![line];
    }

    let mut parts = Vec::with_capacity(limit);
    let mut rest = line;

    for _ in 0..limit - 1 {
        match rest.find(',') {
            Some(pos) => {
                parts.push(&rest[..pos]);
                rest = &rest[pos + 1..];
            }
            None => break,
        }
    }
    parts.push(rest);

    parts
}

/// Parse an ASS document, scanning for `[Events]`/`Format:`/`Dialogue:`
/// lines. Event UPS is always 100 for this dialect.
pub fn parse(reader: impl BufRead) -> Result<Subtitles> {
    let mut state = State::SeekEvents;
    let mut format: Option<Format> = None;
    let mut events = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();

        match state {
            State::SeekEvents => {
                if line == "[Events]" {
                    state = State::ReadFormat;
                }
            }
            State::ReadFormat => {
                if line.is_empty() {
                    continue;
                }
                format = Some(parse_format_line(line)?);
                state = State::ReadEvents;
            }
            State::ReadEvents => {
                let fmt = format.as_ref().expect("format parsed before entering ReadEvents");

                if line.is_empty() {
                    state = State::SeekEvents;
                    continue;
                }

                let body = match line.strip_prefix("Dialogue:") {
                    Some(b) => b.trim_start(),
                    None => continue,
                };

                let fields = split_dialogue(body, fmt.len);
                if fields.len() != fmt.len {
                    return Err(ErrorKind::Malformed(format!(
                        "malformed event, expected {} fields but got {}",
                        fmt.len,
                        fields.len()
                    ))
                    .into());
                }

                let raw_text = fields[fmt.text_idx].to_string();
                let event = SubtitleEvent {
                    start: parse_time(fields[fmt.start_idx])?,
                    end: parse_time(fields[fmt.end_idx])?,
                    plain_text: escape_to_plain_text(&raw_text),
                    raw_text,
                };

                events.push(event);
            }
        }
    }

    Ok(Subtitles {
        events,
        event_units_per_second: 100,
    })
}

/// Stream `reader` to `writer`, retiming every `Dialogue:` event
/// through `ranges` (rescaled to 100 UPS by the caller — see spec
/// §4.3) and dropping any event `retime` rejects. Every other line is
/// copied verbatim. Pre-`Dialogue:` whitespace is normalized to a
/// single space after `Dialogue:`.
pub fn rewrite(reader: impl BufRead, mut writer: impl Write, ranges: &mut TimeRanges) -> Result<()> {
    let mut state = State::SeekEvents;
    let mut format: Option<Format> = None;

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end();

        match state {
            State::SeekEvents => {
                if line == "[Events]" {
                    state = State::ReadFormat;
                }
                writeln!(writer, "{}", line)?;
            }
            State::ReadFormat => {
                if line.is_empty() {
                    writeln!(writer, "{}", line)?;
                    continue;
                }
                format = Some(parse_format_line(line)?);
                state = State::ReadEvents;
                writeln!(writer, "{}", line)?;
            }
            State::ReadEvents => {
                let fmt = format.as_ref().expect("format parsed before entering ReadEvents");

                if line.is_empty() {
                    state = State::SeekEvents;
                    writeln!(writer, "{}", line)?;
                    continue;
                }

                let body = match line.strip_prefix("Dialogue:") {
                    Some(b) => b.trim_start(),
                    None => {
                        writeln!(writer, "{}", line)?;
                        continue;
                    }
                };

                let fields = split_dialogue(body, fmt.len);
                if fields.len() != fmt.len {
                    return Err(ErrorKind::Malformed(format!(
                        "malformed event, expected {} fields but got {}",
                        fmt.len,
                        fields.len()
                    ))
                    .into());
                }

                let start = parse_time(fields[fmt.start_idx])?;
                let end = parse_time(fields[fmt.end_idx])?;

                let new_range = retime(start, end, ranges);

                let (new_start, new_end) = match new_range {
                    Some(r) => r,
                    None => continue,
                };

                let mut out_fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
                out_fields[fmt.start_idx] = unparse_time(new_start);
                out_fields[fmt.end_idx] = unparse_time(new_end);

                write!(writer, "Dialogue: ")?;
                writeln!(writer, "{}", out_fields.join(","))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn time_roundtrips() {
        for raw in &["0:00:00.00", "1:02:03.45", "12:00:00.00", "0:00:59.99"] {
            let parsed = parse_time(raw).unwrap();
            assert_eq!(unparse_time(parsed), *raw);
        }
    }

    #[test]
    fn escapes_decode_n_and_big_n() {
        assert_eq!(escape_to_plain_text(r"line one\nline two\Nline three"), "line one\nline two\nline three");
    }

    #[test]
    fn escapes_preserve_lone_backslash_and_other_overrides() {
        assert_eq!(escape_to_plain_text(r"{\i1}hello\"), "{\\i1}hello\\");
    }

    const SAMPLE: &str = "[Script Info]\n\
Title: demo\n\
\n\
[Events]\n\
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n\
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,0,0,0,,Hello, world\n\
Dialogue: 0,0:00:10.00,0:00:12.00,Default,,0,0,0,,Second line\n\
\n";

    #[test]
    fn parse_extracts_events_and_preserves_commas_in_text() {
        let subs = parse(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(subs.event_units_per_second, 100);
        assert_eq!(subs.events.len(), 2);
        assert_eq!(subs.events[0].start, 0);
        assert_eq!(subs.events[0].end, 500);
        assert_eq!(subs.events[0].raw_text, "Hello, world");
        assert_eq!(subs.events[1].raw_text, "Second line");
    }

    #[test]
    fn rewrite_drops_events_outside_ranges_and_preserves_other_lines() {
        let subs = parse(Cursor::new(SAMPLE)).unwrap();
        let mut ranges = subs.to_time_ranges();

        let mut out = Vec::new();
        rewrite(Cursor::new(SAMPLE), &mut out, &mut ranges).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("[Script Info]"));
        assert!(out.contains("Format: Layer"));
        assert!(out.contains("Hello, world"));
        assert!(out.contains("Second line"));
    }

    #[test]
    fn rewrite_is_identity_under_identity_ranges_modulo_whitespace() {
        let subs = parse(Cursor::new(SAMPLE)).unwrap();
        let mut ranges = subs.to_time_ranges();

        let mut out = Vec::new();
        rewrite(Cursor::new(SAMPLE), &mut out, &mut ranges).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Dialogue: 0,0:00:00.00,0:00:05.00,Default,,0,0,0,,Hello, world"));
    }

    #[test]
    fn malformed_format_line_without_text_last_is_rejected() {
        let bad = "[Events]\nFormat: Start, End, Text, Extra\nDialogue: 0:00:00.00,0:00:01.00,hi,x\n";
        assert!(parse(Cursor::new(bad)).is_err());
    }

    #[test]
    fn blank_line_between_events_header_and_format_is_skipped() {
        let with_blank = "[Events]\n\nFormat: Start, End, Text\nDialogue: 0:00:00.00,0:00:01.00,hi\n";
        let subs = parse(Cursor::new(with_blank)).unwrap();
        assert_eq!(subs.events.len(), 1);
        assert_eq!(subs.events[0].raw_text, "hi");
    }

    #[test]
    fn rewrite_skips_blank_line_between_events_header_and_format() {
        let with_blank = "[Events]\n\nFormat: Start, End, Text\nDialogue: 0:00:00.00,0:00:01.00,hi\n";
        let mut ranges = TimeRanges::from_unsorted(vec![(0u64, 100u64)], 100);

        let mut out = Vec::new();
        rewrite(Cursor::new(with_blank), &mut out, &mut ranges).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Format: Start, End, Text"));
        assert!(out.contains("Dialogue: 0:00:00.00,0:00:01.00,hi"));
    }
}
