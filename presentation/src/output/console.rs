//! Console output formatter for MOA runs

use colored::Colorize;
use moa_domain::{GenerationResult, MoaRun, OutputFormat};

/// Formats MOA results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Render a run in the requested format
    pub fn render(run: &MoaRun, format: OutputFormat) -> String {
        match format {
            OutputFormat::Text => Self::format_text(run),
            OutputFormat::Full => Self::format_full(run),
            OutputFormat::Json => Self::format_json(run),
        }
    }

    /// Only the final answer
    pub fn format_text(run: &MoaRun) -> String {
        let mut output = run.final_text.trim_end().to_string();
        output.push('\n');
        output
    }

    /// Every round, every aggregation, and the final answer
    pub fn format_full(run: &MoaRun) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Mixture-of-Agents Results"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Question:".cyan().bold(), run.input));

        for round in &run.rounds {
            output.push_str(&Self::section_header(&format!(
                "Round {}: {} of {} agents answered",
                round.round,
                round.success_count(),
                round.len()
            )));

            for outcome in round.outcomes() {
                match &outcome.result {
                    GenerationResult::Success(generation) => {
                        output.push_str(&format!(
                            "\n{}\n{}\n",
                            format!("── {} ──", outcome.agent.label).yellow().bold(),
                            generation.text.trim_end()
                        ));
                    }
                    GenerationResult::Failure(failure) => {
                        output.push_str(&format!(
                            "\n{}\n{}: {} ({} attempts)\n",
                            format!("── {} ──", outcome.agent.label).red().bold(),
                            failure.kind,
                            failure.message,
                            failure.attempts
                        ));
                    }
                }
            }

            if let Some(aggregation) = run.aggregations.iter().find(|a| a.round == round.round) {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("Aggregator: {}", aggregation.aggregator.label)
                        .green()
                        .bold(),
                    aggregation.generation.text.trim_end()
                ));
            }
        }

        output.push_str(&Self::section_header("Final Answer"));
        output.push_str(&format!("\n{}\n", run.final_text.trim_end()));
        output.push_str(&format!(
            "\n{} {}\n",
            "Backend attempts:".dimmed(),
            run.total_attempts()
        ));
        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(run: &MoaRun) -> String {
        serde_json::to_string_pretty(run).unwrap_or_else(|_| "{}".to_string())
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}
