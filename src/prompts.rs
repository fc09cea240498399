//! Prompt templates sent to the model.
//!
//! Static instructions are `const` strings; prompts that depend on runtime
//! values are built by the `build_*` functions below.
//!
//! ## Prompt Types
//!
//! - **Language prompt**: pins the output language for a request
//! - **Project profile**: project name plus free-form key/value parameters
//! - **Compression prompt**: summarize a group of chunks to a target length
//! - **Part prompt**: write documentation for one chunk
//! - **Ordering prompt**: sort anchor titles semantically
//! - **Intro prompts**: navigation tree, project overview, custom sections

use std::collections::BTreeMap;

/// Instruction for writing documentation for one fragment of the code mix.
pub const PART_DOC_PROMPT: &str = r#"Role: Senior technical writer documenting one fragment of a larger codebase.

Grounding:
- Use only the provided fragment and the explicit global context.
- Never invent the origin of a function, the purpose of a variable, or a data source. If something is missing, omit it or write "Information not present in the provided fragment."
- Do not rely on general knowledge of external libraries unless their usage is visible in the fragment.

Layout:
- Scannable hierarchical Markdown.
- Inputs, outputs and parameters go in a table with columns Entity, Type, Role, Notes.
- Backticks for code symbols, bold for key terms, blockquotes for critical assumptions or warnings.
- Precede every heading with an HTML anchor: <a name="unique-id"></a> followed by the heading line.

Content (roughly 700-1000 characters):
- The exact responsibility of this fragment within the system.
- How it interacts with other parts, as far as the fragment shows.
- A step-by-step walk through its classes, functions and logic.
- Its data contract: inputs, outputs and side effects.

Headings must name the concrete functionality. Never use generic headings such as "Overview", "Introduction", "Background", "Technical Details", "Summary" or "Core".

Tone: professional, technical, laconic. Document only this fragment; do not restate the global system description."#;

/// Preamble of the project profile prompt.
pub const PROJECT_PROFILE_PROMPT: &str = r#"Act as a project knowledge base. Below is a structured project profile: the project name followed by key: value parameters (global idea, audience, tech stack and similar). Treat these parameters as the foundational context for every request about this project and match tone and suggestions to them.

Project data:
"#;

/// Instruction for sorting anchor titles.
pub const ORDER_PROMPT: &str = r#"Sort the following titles semantically, grouping related topics together.
Return ONLY a comma-separated list of the sorted titles, copied exactly as given.
Do not add any introductory text, explanations or closing remarks.
Titles:
"#;

/// Instruction for turning anchor links into a navigation tree.
pub const LINKS_INTRO_PROMPT: &str = r###"Role: technical solutions architect building the navigation for generated documentation.

Task: turn the provided Markdown anchor links into an executive navigation tree.

Rules:
- Copy every (#anchor) exactly. Do not clean, fix or translate anchors; only the link text may be derived from the anchor's meaning.
- Organize items into a two-level tree grouped by functional domain, using nested bullet points, without changing their order.
- Process the list immediately. Do not explain your reasoning or ask for confirmation.
- If the input does not follow the [Text](#anchor) format, treat whatever is given as titles and still produce the tree.
- Start the response directly with the tree heading "## Executive Navigation Tree"."###;

/// Instruction for writing the project overview from the global summary.
pub const INTRO_TEXT_PROMPT: &str = r#"Act as a professional technical writer. You will receive a general description of a codebase and how it works. Write a project overview with these sections:

1. **Project Title**: a concise, clear name.
2. **Project Goal**: what the software achieves and which problem it solves.
3. **Core Logic & Principles**: how the code works, the reasoning behind it, and the main technologies or algorithms.
4. **Key Features**: a bulleted list of the main functionality.
5. **Dependencies**: libraries or tools required to run the project.

Take all information from the following data:
"#;

/// Preamble for custom descriptions grounded in a code chunk.
pub const CUSTOM_ANALYST_PROMPT: &str = "Act as a precise technical analyst. You will be given code or documentation. Describe or extract information based ONLY on the provided context.";

/// Preamble for custom descriptions written without code context.
pub const CUSTOM_REWRITE_ANALYST_PROMPT: &str = "Act as a precise technical analyst. Describe and rewrite the following text.";

/// Marker a model returns when a chunk holds nothing relevant.
pub const NO_INFO_MARKER: &str = "!noinfo";

/// Alternative phrasing of [`NO_INFO_MARKER`] models tend to produce.
pub const NO_INFO_PHRASE: &str = "No information found";

const ANCHOR_RULES: &str = r#"Every response must start with exactly one <a name="CONTENT_DESCRIPTION"></a> tag, where CONTENT_DESCRIPTION is a short hyphenated summary of the information provided (for example "user-authentication-logic"). It must not contain file names, paths, file extensions, protocols or generic terms such as "config", "settings", "run" or "docs". The tag appears only once, at the very beginning; never repeat it or add other links."#;

/// Rules for custom descriptions grounded in a code chunk.
pub fn custom_description_rules() -> String {
    format!(
        "Strict rules:\n\
         1. Use ONLY the provided context.\n\
         2. If the requested information is not in the context, answer just {}.\n\
         3. Do not use external knowledge or invent logic that is not in the text.\n\
         4. No introductory or closing remarks.\n\
         5. {}",
        NO_INFO_MARKER, ANCHOR_RULES
    )
}

/// Rules for custom descriptions written without code context.
pub fn custom_rewrite_rules() -> String {
    format!("Do not change any links in the prompt. {}", ANCHOR_RULES)
}

/// Pin the language of the answer.
pub fn build_language_prompt(language: &str) -> String {
    format!("For the following task use language {}", language)
}

/// Render the project profile: preamble, name, then one `key: value` line per entry.
pub fn build_project_profile(name: &str, info: &BTreeMap<String, String>) -> String {
    let mut prompt = String::from(PROJECT_PROFILE_PROMPT);
    prompt.push_str(&format!("Project Name: {}\n", name));
    for (key, value) in info {
        prompt.push_str(&format!("{}: {}\n", key, value));
    }
    prompt
}

/// Summarization instruction for a group totalling `input_chars` chars,
/// targeting `input_chars / branching_factor` chars of output.
pub fn build_compress_prompt(input_chars: usize, branching_factor: usize) -> String {
    let target = input_chars / branching_factor.max(1);
    format!(
        "You will receive a large code snippet (up to ~{input_chars} characters).\n\
         Analyze its logic and summarize it with a strict usage example.\n\n\
         1. **Analysis**: extract the architecture, main types and logic flow.\n\
         2. **Summary**: no more than ~{target} characters, focused on structure and data flow.\n\
         3. **Usage example**: show exactly how the code is called, using the real names of \
         types, functions and arguments found in the source. Include required initialization \
         and dependencies, respect required call order, and never invent higher-level methods \
         that do not exist."
    )
}

/// Context message carrying the tail of the previously generated fragment.
pub fn build_previous_part_prompt(previous: &str) -> String {
    format!(
        "This is the end of the documentation you wrote for the previous part; continue consistently from it:\n{}",
        previous
    )
}

/// Ordering request listing the anchor titles.
pub fn build_order_prompt(titles: &[&str]) -> String {
    format!("{}{}", ORDER_PROMPT, titles.join(", "))
}
