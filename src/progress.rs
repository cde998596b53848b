use std::io::{self, Write};
use std::time::Instant;

/// Tagged progress log on stderr. Tags follow the pipeline stages
/// (BATCH/API/PARSE/VALIDATE/DEDUPE/ADDED/SAVE/...), timestamps are elapsed
/// run time.
pub struct ConsoleProgress {
    enabled: bool,
    t0: Instant,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            t0: Instant::now(),
        }
    }

    pub fn log(&self, tag: &str, msg: impl AsRef<str>) {
        if !self.enabled {
            return;
        }
        let ts = fmt_elapsed(self.t0.elapsed().as_secs_f64());
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{ts}] [{tag}] {}", msg.as_ref());
    }

    pub fn rule(&self, tag: &str) {
        self.log(tag, "────────────────────────────────────────");
    }
}

fn fmt_elapsed(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
