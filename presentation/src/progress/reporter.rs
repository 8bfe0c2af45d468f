//! Progress reporting for MOA runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use moa_application::ProgressNotifier;
use moa_domain::{AgentId, Phase};
use std::sync::Mutex;

/// Reports progress with one indicatif bar per phase of each round
pub struct ProgressReporter {
    multi: MultiProgress,
    phase_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            phase_bar: Mutex::new(None),
        }
    }

    fn phase_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn phase_label(phase: Phase, round: usize) -> String {
        format!("Round {} {}", round, phase.display_name())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_phase_start(&self, phase: Phase, round: usize, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::phase_style());
        pb.set_prefix(Self::phase_label(phase, round));
        pb.set_message("Starting...");

        if let Ok(mut slot) = self.phase_bar.lock()
            && let Some(previous) = slot.replace(pb)
        {
            previous.finish_and_clear();
        }
    }

    fn on_agent_complete(&self, _phase: Phase, agent: &AgentId, success: bool) {
        if let Ok(slot) = self.phase_bar.lock()
            && let Some(pb) = slot.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), agent.label)
            } else {
                format!("{} {}", "x".red(), agent.label)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_phase_complete(&self, phase: Phase, round: usize) {
        if let Ok(mut slot) = self.phase_bar.lock()
            && let Some(pb) = slot.take()
        {
            let label = Self::phase_label(phase, round);
            pb.finish_with_message(format!("{} complete!", label.green()));
        }
    }
}

/// Simple line-based progress on stderr (no bars)
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_phase_start(&self, phase: Phase, round: usize, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            ProgressReporter::phase_label(phase, round).bold(),
            total_tasks
        );
    }

    fn on_agent_complete(&self, _phase: Phase, agent: &AgentId, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), agent.label);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), agent.label);
        }
    }

    fn on_phase_complete(&self, _phase: Phase, _round: usize) {}
}
