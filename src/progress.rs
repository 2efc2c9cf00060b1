//! Progress reporting utilities using indicatif.
//!
//! [`Progress`] implements [`ProgressCallback`] and draws one indicator per
//! phase on stderr: a spinner while walking, then bars for hashing and
//! linking.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Phase name used while walking the directory tree.
pub const PHASE_WALKING: &str = "walking";
/// Phase name used while hashing class representatives.
pub const PHASE_HASHING: &str = "hashing";
/// Phase name used while creating links.
pub const PHASE_LINKING: &str = "linking";

/// Progress callback for deduplication phases.
///
/// Implement this trait to receive progress updates during a run.
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase (e.g., "walking", "hashing")
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Current item number (1-based)
    /// * `path` - Path being processed
    fn on_progress(&self, current: usize, path: &str);

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    hashing: Mutex<Option<ProgressBar>>,
    linking: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            hashing: Mutex::new(None),
            linking: Mutex::new(None),
            quiet,
        }
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn bar_style(colour: &str) -> ProgressStyle {
        let template = format!(
            "[{{elapsed_precise}}] [{{bar:40.{colour}/blue}}] {{pos}}/{{len}} ({{percent}}%) {{msg}} (ETA: {{eta}})"
        );
        ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
    }

    fn slot(&self, phase: &str) -> Option<&Mutex<Option<ProgressBar>>> {
        match phase {
            PHASE_WALKING => Some(&self.walking),
            PHASE_HASHING => Some(&self.hashing),
            PHASE_LINKING => Some(&self.linking),
            _ => None,
        }
    }

    /// Run `f` on the bar of the most recently started phase still running.
    fn with_active(&self, f: impl FnOnce(&ProgressBar)) {
        for slot in [&self.linking, &self.hashing, &self.walking] {
            if let Ok(guard) = slot.lock() {
                if let Some(ref pb) = *guard {
                    f(pb);
                    return;
                }
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }
        let Some(slot) = self.slot(phase) else {
            return;
        };

        let pb = if phase == PHASE_WALKING {
            let pb = self.multi.add(ProgressBar::new_spinner());
            pb.set_style(Self::walking_style());
            pb.set_message("Walking directory");
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        } else {
            let colour = if phase == PHASE_HASHING { "cyan" } else { "green" };
            let pb = self.multi.add(ProgressBar::new(total as u64));
            pb.set_style(Self::bar_style(colour));
            pb.set_message(if phase == PHASE_HASHING {
                "Hashing"
            } else {
                "Linking"
            });
            pb
        };

        if let Ok(mut guard) = slot.lock() {
            *guard = Some(pb);
        }
    }

    fn on_progress(&self, current: usize, path: &str) {
        if self.quiet {
            return;
        }
        let message = truncate_path(path, 30);
        self.with_active(|pb| {
            pb.set_position(current as u64);
            pb.set_message(message);
        });
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }
        let Some(slot) = self.slot(phase) else {
            return;
        };
        if let Some(pb) = slot.lock().ok().and_then(|mut guard| guard.take()) {
            pb.finish_and_clear();
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_active(|pb| pb.set_message(message.to_string()));
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let count = file_name.chars().count();
    if count >= max_len {
        let tail: String = file_name.chars().skip(count + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
