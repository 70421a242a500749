//! Prompt templates for tubeq.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex"))
}

/// Answer returned when the context holds nothing pertinent.
pub const NO_RELEVANT_DATA: &str = "No relevant data found.";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for grounded question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: format!(
                "You are an AI assistant that strictly answers questions based only on the provided context. \
                 If the provided context does not contain relevant information to answer the user's query, \
                 respond strictly with: '{}' \
                 Do not make assumptions, provide external knowledge, or infer beyond the given context.",
                NO_RELEVANT_DATA
            ),
            user: "Context: {{context}}\n\nUser Query: {{query}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in a single pass over the template, so text
    /// inside a substituted value is never expanded. Unknown placeholders are
    /// left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts_mention_sentinel() {
        let prompts = Prompts::default();
        assert!(prompts.answer.system.contains(NO_RELEVANT_DATA));
        assert!(prompts.answer.user.contains("{{context}}"));
        assert!(prompts.answer.user.contains("{{query}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_values_are_not_expanded() {
        let prompts = Prompts::default();
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "Q?".to_string());
        vars.insert(
            "context".to_string(),
            "templates use {{query}} and {{context}} syntax".to_string(),
        );

        for _ in 0..20 {
            let rendered = prompts.render_with_custom(&prompts.answer.user, &vars);
            assert_eq!(
                rendered,
                "Context: templates use {{query}} and {{context}} syntax\n\nUser Query: Q?"
            );
        }
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        let rendered = Prompts::render("Hi {{name}}, {{missing}}", &HashMap::from([(
            "name".to_string(),
            "Ana".to_string(),
        )]));
        assert_eq!(rendered, "Hi Ana, {{missing}}");
    }

    #[test]
    fn test_custom_prompt_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "system = \"Be brief. Audience: {{audience}}\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("audience".to_string(), "students".to_string());
        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();

        assert!(prompts.answer.system.starts_with("Be brief."));
        // Fields missing from the file keep their defaults.
        assert!(prompts.answer.user.contains("{{query}}"));
        assert_eq!(
            prompts.render_with_custom(&prompts.answer.system, &HashMap::new()),
            "Be brief. Audience: students"
        );
    }
}
