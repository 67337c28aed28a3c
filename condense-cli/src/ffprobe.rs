// Wraps `ffprobe` invocation and memoizes results by input path for
// the lifetime of one pipeline run, since both subcommands probe the
// same handful of inputs repeatedly (once for stream selection, again
// for units-per-second lookups).

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use condense_core::probe::ProbeResult;

use crate::error::*;

pub struct Prober {
    ffprobe_cmd: String,
    cache: RefCell<HashMap<PathBuf, ProbeResult>>,
}

impl Prober {
    pub fn new(ffprobe_cmd: String) -> Self {
        Prober {
            ffprobe_cmd,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Probe `path` with `-show_streams -print_format json`, parsing
    /// and caching the result. Subsequent calls for the same path
    /// reuse the cached `ProbeResult` without spawning ffprobe again.
    pub fn probe(&self, path: &Path) -> Result<ProbeResult> {
        if let Some(cached) = self.cache.borrow().get(path) {
            return Ok(cached.clone());
        }

        let output = Command::new(&self.ffprobe_cmd)
            .arg("-v")
            .arg("quiet")
            .arg("-print_format")
            .arg("json")
            .arg("-show_streams")
            .arg("--")
            .arg(path)
            .output()
            .map_err(|e| {
                ErrorKind::ExternalTool("ffprobe", None, format!("could not spawn ffprobe: {}", e))
            })?;

        if !output.status.success() {
            return Err(ErrorKind::ExternalTool(
                "ffprobe",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let result = ProbeResult::parse(&stdout)?;

        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), result.clone());

        Ok(result)
    }
}
