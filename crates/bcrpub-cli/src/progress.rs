//! Download progress reporting.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a download progress bar, hidden when `enabled` is false.
pub fn download_bar(name: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message(name.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Feed a `(downloaded, total)` update into the bar.
pub fn update(pb: &ProgressBar, downloaded: u64, total: u64) {
    if total > 0 && pb.length() != Some(total) {
        pb.set_length(total);
    }
    pb.set_position(downloaded);
}
