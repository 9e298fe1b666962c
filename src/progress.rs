//! Progress indicators for knifepool.

use indicatif::{ProgressBar, ProgressStyle};

/// Bar tracking completed hosts; hidden when `quiet`.
pub fn bar(len: u64, prefix: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template(
        "{prefix:.cyan.bold} [{bar:30.cyan/blue}] {pos}/{len} {msg} ({elapsed})",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▓░");

    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_bar_is_hidden() {
        assert!(bar(10, "Bootstrapping", true).is_hidden());
    }

    #[test]
    fn test_bar_tracks_length() {
        let pb = bar(7, "Bootstrapping", false);
        assert_eq!(pb.length(), Some(7));
        pb.inc(2);
        assert_eq!(pb.position(), 2);
        pb.finish_and_clear();
    }
}
