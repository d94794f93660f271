//! Spinner-backed progress for the image workflow.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use steelconnection::ImageProgress;

pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed}]") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProgress for Spinner {
    fn message(&mut self, text: &str) {
        self.bar.set_message(text.to_owned());
    }

    fn tick(&mut self) {
        self.bar.tick();
    }

    fn finish(&mut self, text: &str) {
        self.bar.finish_with_message(text.to_owned());
    }
}
