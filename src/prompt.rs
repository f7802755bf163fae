//! Prompt rendering for the polishing model.

use crate::dto::Draft;

/// Renders the instruction prompt for a draft. Subject and body are embedded verbatim.
pub fn build_prompt(draft: &Draft) -> String {
    format!(
        "You are an AI Email Enhancer. Your task is to rewrite a draft email to be professional, clear, and well-structured.

1. **Polish the Subject and Body:** Rewrite the draft subject and body to significantly improve professionalism, clarity, grammar, and tone.
2. **Apply Style:** The polished email MUST adhere to the **{tone}** tone/style.
3. **Analyze:** Determine the **Tone** (e.g., Professional, Formal, Friendly, Urgent, Casual) and **Readability** (e.g., High, Medium, Low) of the *polished* version.
4. **Output Format:** Return a JSON object ONLY with the following keys: \"polishedSubject\", \"polishedBody\", \"tone\", and \"readability\". Do not include any other text, markdown formatting (like ```json), or explanation outside of the JSON block.

DRAFT EMAIL:
Subject: {subject}
Body:
{body}

JSON Output:
",
        tone = draft.tone,
        subject = draft.subject,
        body = draft.body,
    )
}
