//! Prompt assembly for extraction requests.

use crate::graph::GraphSnapshot;

const EXTRACTION_PROMPT: &str = include_str!("prompts/extraction.txt");
const PORTRAIT_PROMPT: &str = include_str!("prompts/portraits.txt");
const REFINE_PROMPT: &str = include_str!("prompts/refine.txt");

/// What goes into one extraction prompt.
#[derive(Debug, Clone)]
pub struct PromptPlan<'a> {
    /// The full text under analysis.
    pub text: &'a str,
    /// Previous snapshot to refine, if any.
    pub draft: Option<&'a GraphSnapshot>,
    /// Sentence cap on per-character descriptions.
    pub description_sentences: Option<u32>,
    /// Whether to ask for portrait prompts.
    pub portraits: bool,
    /// How many copies of the text to send. Repeating the text gives the
    /// model more passes over it within a single request; values below 1
    /// are treated as 1.
    pub copies: u32,
}

impl<'a> PromptPlan<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            draft: None,
            description_sentences: None,
            portraits: false,
            copies: 1,
        }
    }
}

/// An assembled prompt: system instruction plus user content.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Assemble the system instruction and user content for one request.
pub fn build(plan: &PromptPlan<'_>) -> Result<Prompt, serde_json::Error> {
    let mut system = EXTRACTION_PROMPT.trim_end().to_string();

    if let Some(limit) = plan.description_sentences {
        let plural = if limit == 1 { "" } else { "s" };
        push_section(
            &mut system,
            &format!(
                "For every character, also provide a description of their appearance, \
                 personality, and role in the story. Keep each description to at most \
                 {limit} sentence{plural}."
            ),
        );
    }

    if plan.portraits {
        push_section(&mut system, PORTRAIT_PROMPT);
    }

    if let Some(draft) = plan.draft {
        let draft_json = serde_json::to_string(draft)?;
        push_section(
            &mut system,
            &format!(
                "Preliminary analysis from a previous pass:\n{draft_json}\n\n{}",
                REFINE_PROMPT.trim_end()
            ),
        );
    }

    let copies = plan.copies.max(1) as usize;
    let user = vec![plan.text; copies].join("\n\n");

    Ok(Prompt { system, user })
}

fn push_section(system: &mut String, section: &str) {
    system.push_str("\n\n");
    system.push_str(section.trim_end());
}
