//! Terminal output — spinners and colored verdicts.
//!
//! Uses `indicatif` for progress spinners and `console` for styling.
//! [`DispatchProgress`] tracks a dispatch run visually in the terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::DispatchError;
use crate::resolver::DispatchOutcome;

/// Visual progress indicator for a dispatch run.
pub struct DispatchProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl DispatchProgress {
    /// Start the spinner with a label for the operation in flight.
    pub fn start(label: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(label.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Update the spinner message to the current step.
    #[allow(dead_code)]
    pub fn step(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    /// Print a warning line above the spinner.
    #[allow(dead_code)]
    pub fn warn(&self, message: &str) {
        self.pb
            .println(format!("  {} {message}", self.yellow.apply_to("!")));
    }

    /// Finish the spinner and print what the dispatch changed.
    pub fn finish(&self, outcome: &DispatchOutcome) {
        self.pb.finish_and_clear();
        match &outcome.manifest {
            Some(manifest) => println!(
                "  {} Manifest {} scheduled with {} job(s)",
                self.green.apply_to("✓"),
                manifest.manifest_number,
                outcome.assigned.len()
            ),
            None if outcome.assigned.is_empty() => {
                println!("  {} Nothing selected", self.yellow.apply_to("·"))
            }
            None => println!(
                "  {} Job {} assigned directly",
                self.green.apply_to("✓"),
                outcome.assigned[0]
            ),
        }
        for entity in &outcome.changed {
            println!("    changed {entity}");
        }
    }

    /// Finish the spinner and print the failure.
    pub fn fail(&self, err: &DispatchError) {
        self.pb.finish_and_clear();
        println!("  {} Dispatch failed: {err}", self.red.apply_to("✗"));
    }
}
