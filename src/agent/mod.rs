//! Code-generation agent: prompt assembly and fenced-block extraction.
//!
//! Each call is a fresh single-turn request built only from the current
//! query, dataset path, and column descriptor. No conversation state.

use crate::config::Config;
use crate::error::Result;
use crate::llm::{ChatMessage, LlmClient, Role};

const SYSTEM_PROMPT: &str = "You are a polite and expert Data Science Assistant.
You are given a dataset file path (usually '/home/user/dataset.csv') and a user question.
Your goal is to write PYTHON CODE to analyze the data and answer the question.

RULES:
1. Use `pandas` for data manipulation.
2. Use `plotly` for visualization (if asked for charts).
3. When using plotly, show the figure using `fig.show()`.
4. Print the final textual answer to stdout using `print()`.
5. The dataset is located at: {file_path}
6. Do NOT guess column names. Use the provided column info.
7. Wrap your entire code in a markdown block: ```python ... ```
8. Keep code simple and self-contained.
";

#[derive(Debug)]
pub struct AgentClient {
    llm: LlmClient,
    model: String,
}

impl AgentClient {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let llm = LlmClient::from_config(cfg)?;
        if !llm.has_credential() {
            tracing::warn!("OPENROUTER_API_KEY not set; code generation will be unavailable");
        }
        let model = cfg
            .get("LLM_MODEL")
            .unwrap_or_else(|| "google/gemini-2.0-flash-exp".to_string());
        Ok(Self { llm, model })
    }

    /// Generates analysis code for a query. `Ok(None)` means the model
    /// replied but no code could be extracted; the caller must treat that as
    /// "no code generated", not as an error.
    pub async fn generate_code(
        &self,
        query: &str,
        dataset_path: &str,
        columns: &str,
    ) -> Result<Option<String>> {
        let system = SYSTEM_PROMPT.replace("{file_path}", dataset_path);
        let user = format!(
            "Dataset Columns: {columns}\nUser Question: {query}\n\nWrite the Python code to solve this."
        );

        let messages = vec![
            ChatMessage::new(Role::System, system),
            ChatMessage::new(Role::User, user),
        ];
        let content = self.llm.complete(&self.model, messages).await?;
        Ok(extract_code(&content))
    }
}

/// Extracts code from a model reply. Ordered fallbacks, first match wins:
/// a ```python fence, then any fence, then the raw text if it carries a
/// strong code signal. `None` means no code was found.
pub fn extract_code(text: &str) -> Option<String> {
    if let Some(code) = fenced_block(text, "```python") {
        return Some(code);
    }
    if let Some(code) = fenced_block(text, "```") {
        return Some(code);
    }
    if text.contains("import pandas") || text.contains("print(") {
        return Some(text.trim().to_string());
    }
    None
}

fn fenced_block(text: &str, open: &str) -> Option<String> {
    let start = text.find(open)? + open.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    let code = rest[..end].trim();
    if code.is_empty() {
        return None;
    }
    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_python_fence() {
        let text = "Here you go:\n```python\nprint(1)\n```\nDone.";
        assert_eq!(extract_code(text).as_deref(), Some("print(1)"));
    }

    #[test]
    fn falls_back_to_plain_fence() {
        let text = "```\nimport pandas as pd\ndf = pd.read_csv('x')\n```";
        assert_eq!(
            extract_code(text).as_deref(),
            Some("import pandas as pd\ndf = pd.read_csv('x')")
        );
    }

    #[test]
    fn python_fence_wins_over_later_plain_fence() {
        let text = "```\nnot this\n```\n```python\nprint('this')\n```";
        // First-match-wins applies per rule, not per position: the tagged
        // fence rule runs before the generic one.
        assert_eq!(extract_code(text).as_deref(), Some("print('this')"));
    }

    #[test]
    fn raw_text_with_code_signal() {
        let text = "import pandas as pd\nprint(pd.__version__)";
        assert_eq!(extract_code(text).as_deref(), Some(text));
    }

    #[test]
    fn prose_without_code_yields_none() {
        let text = "I cannot answer that question from the dataset.";
        assert_eq!(extract_code(text), None);
    }

    #[test]
    fn unterminated_fence_falls_through_to_signal_check() {
        let text = "```python\nprint(1)";
        assert_eq!(extract_code(text).as_deref(), Some("```python\nprint(1)"));
    }
}
