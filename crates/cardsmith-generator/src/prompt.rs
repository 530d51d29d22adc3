//! Prompt construction for flashcard generation

/// Builds the flashcard prompt for one chunk of study material
pub struct PromptBuilder<'a> {
    text: &'a str,
    num_cards: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(text: &'a str, num_cards: usize) -> Self {
        Self { text, num_cards }
    }

    /// Build the complete generation prompt
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(
            ROLE.len() + REQUIREMENTS.len() + self.text.len() + 256,
        );

        // 1. Role and task
        prompt.push_str(ROLE);
        prompt.push('\n');
        prompt.push_str(&format!(
            "Create up to {} high-quality flashcards from the text below.\n",
            self.num_cards
        ));
        prompt.push_str(GUIDANCE);
        prompt.push_str("\n\n");

        // 2. Output contract
        prompt.push_str(REQUIREMENTS);
        prompt.push_str("\n\n");

        // 3. The material itself, verbatim
        prompt.push_str("Text to process:\n");
        prompt.push_str(self.text);
        prompt.push_str("\n\n");

        // 4. Cue for the JSON answer
        prompt.push_str(OUTPUT_CUE);

        prompt
    }
}

/// Build the prompt for `chunk_text` asking for up to `num_cards` cards
///
/// # Examples
///
/// ```
/// use cardsmith_generator::build_prompt;
///
/// let prompt = build_prompt("Water boils at 100 degrees Celsius at sea level.", 3);
/// assert!(prompt.contains("up to 3"));
/// assert!(prompt.contains("Water boils at 100 degrees Celsius at sea level."));
/// assert!(prompt.ends_with("JSON flashcards:"));
/// ```
pub fn build_prompt(chunk_text: &str, num_cards: usize) -> String {
    PromptBuilder::new(chunk_text, num_cards).build()
}

const ROLE: &str =
    "You are a helpful study assistant and an expert at creating educational flashcards.";

const GUIDANCE: &str = "Each flashcard should test understanding of an important concept, definition or relationship.
Make questions clear and specific; make answers concise but complete.";

const REQUIREMENTS: &str = r#"Requirements:
- Return ONLY a JSON array of objects
- Each object must have exactly two fields: "question" and "answer"
- Questions should be clear and test important concepts
- Answers should be accurate and concise
- No additional text, explanations, or commentary outside the JSON
- Valid JSON format only: [{"question": "...", "answer": "..."}, ...]"#;

const OUTPUT_CUE: &str = "JSON flashcards:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_card_count_and_text() {
        let text = "Photosynthesis converts light into chemical energy.";
        let prompt = build_prompt(text, 8);

        assert!(prompt.contains("up to 8 high-quality flashcards"));
        assert!(prompt.contains(&format!("Text to process:\n{}\n\n", text)));
    }

    #[test]
    fn test_prompt_demands_json_contract() {
        let prompt = build_prompt("anything", 1);
        assert!(prompt.contains("ONLY a JSON array"));
        assert!(prompt.contains(r#""question" and "answer""#));
        assert!(prompt.ends_with(OUTPUT_CUE));
    }

    #[test]
    fn test_text_is_embedded_verbatim() {
        let text = "  Line one\n\n{\"not\": \"json\"}  \n";
        let prompt = build_prompt(text, 2);
        assert!(prompt.contains(text));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt("same", 4), build_prompt("same", 4));
        assert_ne!(build_prompt("same", 4), build_prompt("same", 5));
    }
}
