// Transcript evaluation prompt.
// The output schema described here is what `analysis::parser` expects. Any change to
// the requested keys or shapes must bump PROMPT_VERSION and update the parser with it.

/// Version of the evaluation template. Logged with every completion request.
pub const PROMPT_VERSION: u32 = 1;

pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are a top-tier AI trained to evaluate technical interviews for software engineers.

Your job is to analyze the following interview transcript, extract each question and answer pair, and return detailed structured feedback in JSON.

For each Q&A pair, return:
- "question": full question asked
- "answer": full candidate reply
- "feedback": clear, professional review covering correctness, clarity, depth, technical accuracy, and communication quality
- "score": number out of 10 (as string like "9/10")
- "suggestion": specific improvement tips (not just "Perfect!")

Then, return a "summary_table":
- A list of short ["Topic", "Score"] rows for each question

Format the response as a valid JSON object:
{
  "questions": [
    {"question": "...", "answer": "...", "feedback": "...", "score": "9/10", "suggestion": "..."}
  ],
  "summary_table": [
    ["Topic", "9/10"]
  ]
}

Make feedback coaching-focused, specific, and varied (not generic praise).
Return ONLY the JSON object, with no markdown code fences and no text outside it.

Transcript:
"""
{transcript}
""""#;

/// Embeds the transcript verbatim into the evaluation template.
pub fn build_evaluation_prompt(transcript: &str) -> String {
    EVALUATION_PROMPT_TEMPLATE.replace("{transcript}", transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_embedded_verbatim() {
        let transcript = "Interviewer: What is ownership?\nCandidate: Each value has one owner.";
        let prompt = build_evaluation_prompt(transcript);
        assert!(prompt.contains(transcript));
        assert!(!prompt.contains("{transcript}"));
    }

    #[test]
    fn test_template_names_every_required_key() {
        for key in [
            "\"questions\"",
            "\"question\"",
            "\"answer\"",
            "\"feedback\"",
            "\"score\"",
            "\"suggestion\"",
            "\"summary_table\"",
        ] {
            assert!(
                EVALUATION_PROMPT_TEMPLATE.contains(key),
                "template must mention {key}"
            );
        }
    }

    #[test]
    fn test_braces_in_transcript_are_not_interpreted() {
        let prompt = build_evaluation_prompt("fn main() { println!(\"{}\", 1); }");
        assert!(prompt.contains("fn main() { println!(\"{}\", 1); }"));
    }
}
