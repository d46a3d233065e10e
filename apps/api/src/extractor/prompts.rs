// Prompt templates for the four extraction modes.
// Placeholders in `{braces}` are replaced before sending; literal JSON examples
// use the same braces, so only the named placeholders are ever substituted.

/// System instruction for the info-collection conversation.
pub const INFO_COLLECTION_SYSTEM: &str = "\
You are a friendly AI hiring assistant. Conversationally collect the following information \
from the candidate, one item at a time: full name, email address, phone number, \
years of experience, desired position, current location.

Validate as you go: full_name and location must be non-empty, the phone number should be \
10 digits, the email address must be well formed, and experience must be a number >= 0. \
Ask a short follow-up question whenever something is missing or invalid.

Once ALL information is collected and valid, reply ONLY with a JSON object of this shape:
{\"full_name\": \"string\", \"email\": \"string\", \"phone\": \"string\", \"experience\": number, \
\"position\": \"string\", \"location\": \"string\", \"message\": \"short closing sentence\"}";

/// Stack validation prompt. Replace `{position}` and `{input_text}` before sending.
pub const STACK_VALIDATION_PROMPT: &str = r#"The candidate is applying for the role: '{position}'.
They entered the following tech stack input: '{input_text}'.

Your tasks:
1. From the input, extract only valid technical stack names (programming languages, frameworks, tools).
2. Ignore non-technical terms (e.g. 'swimming', 'singing').
3. Remove any stack that is not relevant to the role.
4. Correct spelling and formatting (e.g. 'pythn' -> 'Python').
5. Return an empty list if no valid stacks are found.

Return a JSON object with this EXACT schema:
{"stacks": ["string"], "message": "brief message explaining which stacks were kept or removed"}"#;

/// Question generation prompt. Replace `{stack_name}` before sending.
pub const QUESTION_GENERATION_PROMPT: &str = r#"Generate 3 technical interview questions about '{stack_name}'.
Each question must come with a helpful hint that does not reveal the answer.

Return a JSON array with EXACTLY 3 objects of this shape:
[{"question": "string", "hint": "string"}]"#;

/// Evaluation prompt. Replace `{stack_name}` and `{qa_text}` before sending.
pub const EVALUATION_PROMPT: &str = r#"You are a technical interviewer for the stack '{stack_name}'.
Evaluate each answer below and assign a star rating from 0 to 3.
If an answer is unsatisfactory or gibberish, give it 0 stars.
Give brief feedback for each answer.

Here are the question/answer pairs:
{qa_text}

Return a JSON array with one object per question, in the same order:
[{"question": "the original question", "stars": 0, "feedback": "string"}]"#;

/// Substitutes `{name}` placeholders in one left-to-right pass. Substituted
/// values are never rescanned, so a value that itself contains `{name}` text
/// is inserted literally. Unknown braces are kept as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let matched = values.iter().find(|(name, _)| {
            tail.strip_prefix(*name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match matched {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
