//! Prompt templates sent to the judge.

pub fn relevance_prompt(abstract_text: &str, topic: &str) -> String {
    format!(
        r#"You are an expert AI researcher. Analyze whether this research paper is SPECIFICALLY about: {topic}.

IMPORTANT: Only papers that are DIRECTLY about this topic should get high scores. Papers that merely mention it in passing, in related work, or in an unrelated sense should get low scores.

Abstract: {abstract_text}

Please provide a structured analysis in the following JSON format:
{{
    "relevant": true/false,
    "confidence": "High/Medium/Low",
    "relevance_score": 0-10,
    "analysis": "Brief explanation of why it is or isn't about the topic",
    "keywords": ["key", "words", "found"]
}}

Be STRICT in your evaluation. Only give scores 8+ for papers that are clearly and primarily about the topic."#
    )
}

pub fn summary_prompt(title: &str, abstract_text: &str) -> String {
    format!(
        r#"Write ONE very short sentence summarizing this paper in 150 characters or less.

REQUIREMENTS:
- ONE simple sentence ending with period
- Maximum 150 characters total
- Very concise - just the key method and main contribution
- No unnecessary details

EXAMPLES:
"Uses multi-agent RL for task allocation."
"Proposes BERT variant for sentiment analysis."
"Introduces GNN for protein folding prediction."

Title: {title}
Abstract: {abstract_text}

Short summary (<=150 chars):"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_prompt_mentions_topic_and_schema() {
        let prompt = relevance_prompt("We build agents.", "LLM Agents");
        assert!(prompt.contains("SPECIFICALLY about: LLM Agents"));
        assert!(prompt.contains("Abstract: We build agents."));
        assert!(prompt.contains("\"relevance_score\": 0-10"));
    }

    #[test]
    fn test_summary_prompt_includes_title() {
        let prompt = summary_prompt("AgentBench", "Benchmarks.");
        assert!(prompt.contains("Title: AgentBench"));
    }
}
