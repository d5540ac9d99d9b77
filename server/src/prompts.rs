//! Prompt templates served through `prompts/list` and `prompts/get`.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{Result, ServerError};

/// Declared argument of a prompt.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PromptArgument {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Substituted when an optional argument is absent or empty.
    #[serde(skip)]
    fallback: &'static str,
}

/// A named markdown template with `{{argument}}` placeholders.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Prompt {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: &'static [PromptArgument],
    #[serde(skip)]
    template: &'static str,
}

pub const PROMPTS: &[Prompt] = &[
    Prompt {
        name: "sqlite_query_assistant",
        description: "Help write and optimize SQLite queries",
        arguments: &[
            PromptArgument {
                name: "task_description",
                description: "Description of what you want to accomplish",
                required: true,
                fallback: "",
            },
            PromptArgument {
                name: "table_info",
                description: "Information about available tables",
                required: false,
                fallback: "No table information provided. Use get_schema tool to explore database structure.",
            },
        ],
        template: include_str!("../content/query-assistant.md"),
    },
    Prompt {
        name: "database_design_helper",
        description: "Help design database schema and relationships",
        arguments: &[
            PromptArgument {
                name: "requirements",
                description: "Description of data requirements",
                required: true,
                fallback: "",
            },
            PromptArgument {
                name: "existing_schema",
                description: "Current schema if modifying existing database",
                required: false,
                fallback: "Starting with a new database design.",
            },
        ],
        template: include_str!("../content/design-helper.md"),
    },
];

/// Looks up a prompt by name.
pub fn find(name: &str) -> Result<&'static Prompt> {
    PROMPTS
        .iter()
        .find(|prompt| prompt.name == name)
        .ok_or_else(|| ServerError::UnknownPrompt(name.to_string()))
}

impl Prompt {
    /// Fills the template from `arguments`.
    ///
    /// Non-string argument values are rendered as JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::MissingArgument`] when a required argument is
    /// absent or empty.
    pub fn render(&self, arguments: &Map<String, Value>) -> Result<String> {
        let mut text = self.template.to_string();
        for argument in self.arguments {
            let supplied = arguments
                .get(argument.name)
                .map(|value| match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .filter(|value| !value.trim().is_empty());
            let value = match supplied {
                Some(value) => value,
                None if argument.required => {
                    return Err(ServerError::MissingArgument {
                        prompt: self.name.to_string(),
                        argument: argument.name.to_string(),
                    });
                }
                None => argument.fallback.to_string(),
            };
            text = text.replace(&format!("{{{{{}}}}}", argument.name), &value);
        }
        Ok(text)
    }

    /// Body of a `prompts/get` result.
    pub fn get(&self, arguments: &Map<String, Value>) -> Result<Value> {
        let text = self.render(arguments)?;
        Ok(json!({
            "description": self.description,
            "messages": [{
                "role": "user",
                "content": {"type": "text", "text": text}
            }]
        }))
    }
}
