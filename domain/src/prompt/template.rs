//! Prompt templates for the aggregation step

/// Templates for the aggregator's synthesis prompt
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the aggregator when none is configured
    pub fn aggregation_system() -> &'static str {
        r#"You have been provided with a set of responses from various models to the latest user query.
Your task is to synthesize these responses into a single, high-quality response.
Critically evaluate the information provided in these responses, recognizing that some of it may be biased or incorrect.
Do not simply replicate the given answers; offer a refined, accurate, and comprehensive reply.
Ensure your response is well-structured, coherent, and adheres to the highest standards of accuracy and reliability."#
    }

    /// User prompt for the aggregator
    ///
    /// `responses` are `(agent label, text)` pairs of the agents that
    /// succeeded. When `round_input` differs from `original_input` it is a
    /// draft from the previous aggregation and is included for reference.
    pub fn aggregation_prompt(
        original_input: &str,
        round_input: &str,
        responses: &[(String, String)],
        failed: usize,
    ) -> String {
        let mut prompt = format!("Original query:\n{}\n", original_input);

        if round_input != original_input {
            prompt.push_str(&format!(
                "\nPrevious synthesized draft:\n{}\n",
                round_input
            ));
        }

        prompt.push_str("\nResponses from models:\n");
        for (i, (agent, content)) in responses.iter().enumerate() {
            prompt.push_str(&format!("\n{}. [{}]\n{}\n", i + 1, agent, content));
        }

        if failed > 0 {
            let total = responses.len() + failed;
            prompt.push_str(&format!(
                "\nNote: {} of {} models failed to respond; only the responses above are available.\n",
                failed, total
            ));
        }

        prompt.push_str("\nProvide a single synthesized response to the original query.");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses() -> Vec<(String, String)> {
        vec![
            ("openai/gpt-4o".to_string(), "Rust is a systems language.".to_string()),
            ("anthropic/claude".to_string(), "Rust focuses on safety.".to_string()),
        ]
    }

    #[test]
    fn test_aggregation_prompt_lists_responses_in_order() {
        let prompt = PromptTemplate::aggregation_prompt("What is Rust?", "What is Rust?", &responses(), 0);
        assert!(prompt.contains("What is Rust?"));
        let first = prompt.find("openai/gpt-4o").unwrap();
        let second = prompt.find("anthropic/claude").unwrap();
        assert!(first < second);
        assert!(!prompt.contains("failed to respond"));
        assert!(!prompt.contains("Previous synthesized draft"));
    }

    #[test]
    fn test_aggregation_prompt_mentions_failures() {
        let prompt = PromptTemplate::aggregation_prompt("q", "q", &responses(), 1);
        assert!(prompt.contains("1 of 3 models failed"));
    }

    #[test]
    fn test_aggregation_prompt_includes_previous_draft() {
        let prompt = PromptTemplate::aggregation_prompt("q", "draft v1", &responses(), 0);
        assert!(prompt.contains("Previous synthesized draft:\ndraft v1"));
    }
}
