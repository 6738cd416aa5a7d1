use crate::context::{AttachedFile, ChatContext};

/// Workspace names listed in the prompt before it is cut off.
const WORKSPACE_FILES_SHOWN: usize = 20;

const PREAMBLE: &str = "You are an AI coding assistant integrated into the editor via Groq API. You help developers with:

1. **Code Generation**: Creating new code based on requirements
2. **Code Analysis**: Explaining and reviewing existing code
3. **Debugging**: Helping identify and fix issues
4. **Refactoring**: Improving code structure and efficiency
5. **Documentation**: Writing comments and documentation

## Current Context:
";

const GUIDELINES: &str = "
## Guidelines:
- Provide clear, concise, and actionable responses
- Use proper markdown formatting for code blocks
- Specify the programming language in code blocks
- When generating code, follow best practices and conventions
- Explain your reasoning when making suggestions
- Ask clarifying questions if requirements are unclear
- Consider the workspace context when making recommendations

Be helpful, accurate, and focused on practical solutions.";

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

/// Build the system-role instruction for a request.
///
/// Attachments are only counted here; their contents go into the user turn.
pub fn build_system_prompt(context: &ChatContext, attached_files: &[AttachedFile]) -> String {
    let mut prompt = String::from(PREAMBLE);

    if let Some(file) = present(&context.current_file) {
        prompt.push_str(&format!("- Currently viewing: {file}\n"));
    }

    if let Some(lang) = present(&context.language) {
        prompt.push_str(&format!("- Programming language: {lang}\n"));
    }

    if let Some(code) = present(&context.selected_code) {
        prompt.push_str(&format!("- Selected code snippet:\n```\n{code}\n```\n"));
    }

    if !context.workspace_files.is_empty() {
        let shown = context
            .workspace_files
            .iter()
            .take(WORKSPACE_FILES_SHOWN)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let more = if context.workspace_files.len() > WORKSPACE_FILES_SHOWN {
            " and more..."
        } else {
            ""
        };
        prompt.push_str(&format!("- Workspace files: {shown}{more}\n"));
    }

    if !attached_files.is_empty() {
        prompt.push_str(&format!(
            "\n## Attached Files:\nThe user has attached {} file(s) for reference. Use this context to provide more accurate assistance.\n",
            attached_files.len()
        ));
    }

    prompt.push_str(GUIDELINES);
    prompt
}
