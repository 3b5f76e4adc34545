use indicatif::{ProgressBar, ProgressStyle};

use crate::progress::Progress;

/// Terminal bar mirroring a [`Progress`] while a transfer is in flight.
pub struct Bar {
    bar: ProgressBar,
    progress: Progress,
}

impl Bar {
    pub fn attach(progress: &Progress, description: &str) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos:>3}%").map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("●○ "));

        bar.set_style(style);
        bar.set_message(description.to_owned());

        let sink = bar.clone();
        progress.observe(move |percent| sink.set_position(u64::from(percent)));

        Self { bar, progress: progress.clone() }
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }

    pub fn abandon(&self) {
        self.bar.abandon();
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        self.progress.clear_observer();
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
