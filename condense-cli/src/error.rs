// Error taxonomy for the binary: everything the core crate cannot see
// because it touches the filesystem, a subprocess or the command line.
// See spec §7 for the six categories this maps onto.

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Csv(::csv::Error);
        Json(::serde_json::Error);
    }

    links {
        Core(condense_core::Error, condense_core::ErrorKind);
    }

    errors {
        /// Bad CLI arguments: missing/contradictory flags, unparsable
        /// numbers, an unknown column name.
        Usage(reason: String) {
            description("usage error")
            display("usage error: {}", reason)
        }

        /// The user pointed the tool at something that does not exist
        /// or is not a stream it can use (no subtitle track at the
        /// requested array position, an input with no audio stream).
        Selection(reason: String) {
            description("selection error")
            display("could not select a stream: {}", reason)
        }

        /// `ffmpeg`/`ffprobe` ran but exited non-zero, or could not be
        /// spawned at all.
        ExternalTool(tool: &'static str, status: Option<i32>, stderr: String) {
            description("external tool failed")
            display(
                "{} failed (exit {}): {}",
                tool,
                status.map(|s| s.to_string()).unwrap_or_else(|| "signal".to_string()),
                stderr
            )
        }

        /// One or more scratch resources could not be cleaned up. Only
        /// ever reported after the primary result, never instead of it.
        Cleanup(failures: Vec<String>) {
            description("cleanup error")
            display("failed to clean up {} resource(s): {}", failures.len(), failures.join("; "))
        }
    }
}
