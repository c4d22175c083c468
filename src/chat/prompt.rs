//! System prompt construction for Usha.
//!
//! Output depends only on the element passed in, so equal inputs always give
//! byte-identical prompts.

use crate::catalog::ElementRecord;

/// Name of the assistant persona.
pub const ASSISTANT_NAME: &str = "Usha";

const PERSONA: &str = "You are Usha, a helpful AI assistant with deep expertise in chemistry, \
equivalent to a Nobel laureate.";

const FORMATTING_RULES: &str = "Formatting:
- Keep short answers to a few sentences.
- For longer answers, organise the content under clear headings and subheadings.
- Prefer bullet points over long paragraphs when listing properties or steps.";

/// Build the behavioural instructions sent with every request.
#[must_use]
pub fn build_system_prompt(element: Option<&ElementRecord>) -> String {
    match element {
        Some(element) => element_prompt(element),
        None => general_prompt(),
    }
}

fn element_prompt(element: &ElementRecord) -> String {
    let name = &element.name;
    format!(
        "{PERSONA}

The user is asking about the element {name} ({symbol}). Here is what you know about it:
- Atomic Number: {number}
- Atomic Mass: {mass}
- Electron Configuration: {configuration}
- Group: {group}
- Period: {period}
- Classification: {classification}
- Block: {block}

When responding:
1. Always acknowledge {name} at the beginning of your response.
2. Stay focused on {name}; relate broader questions back to this element.
3. If the question is general or unclear, give a brief overview of the element's key properties and significance.
4. Explain the chemistry behind your answer clearly and accurately.

{FORMATTING_RULES}",
        symbol = element.symbol,
        number = element.atomic_number,
        mass = element.atomic_mass,
        configuration = element.electron_configuration,
        group = element.group_label(),
        period = element.period,
        classification = element.classification,
        block = element.block,
    )
}

fn general_prompt() -> String {
    format!(
        "{PERSONA}

When responding to general chemistry questions:
1. Provide clear, accurate and detailed explanations suitable for a chemistry student.
2. Break down complex concepts into understandable parts.
3. Use examples and analogies where helpful.
4. If a question is unclear, ask for clarification.

{FORMATTING_RULES}"
    )
}
