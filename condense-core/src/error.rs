// Error taxonomy for the core algorithms: time-range algebra, retiming,
// the ASS codec, filter-graph synthesis and probe-JSON decoding.
//
// Everything here is pure/data-only (no filesystem, no subprocesses) so
// there is exactly one kind of failure the core reports: the input it
// was given does not satisfy an invariant the caller was required to
// uphold (a negative pad, a non-finite rescale factor, a malformed ASS
// `Format:`/`Dialogue:` line, a malformed probe `time_base`).

error_chain! {
    foreign_links {
        Io(::std::io::Error);
    }

    errors {
        /// A non-finite rescale factor, a negative pad, or a negative
        /// constructor value was passed to `TimeRanges`.
        Invalid(reason: String) {
            description("invalid time-range operation")
            display("invalid time-range operation: {}", reason)
        }

        /// A dialogue/format/events section in an ASS file did not
        /// parse according to the documented grammar.
        Malformed(reason: String) {
            description("malformed subtitle data")
            display("malformed subtitle data: {}", reason)
        }

        /// A probe result's `time_base` was missing, non-numeric, or
        /// had a zero numerator.
        BadTimeBase(raw: String) {
            description("malformed time_base")
            display("malformed time_base: {:?}", raw)
        }
    }
}
