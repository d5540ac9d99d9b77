//! Static markdown documents served through `resources/list` and
//! `resources/read`.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{Result, ServerError};

const MARKDOWN: &str = "text/markdown";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Resource {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "mimeType")]
    pub mime_type: &'static str,
    #[serde(skip)]
    text: &'static str,
}

pub const RESOURCES: &[Resource] = &[
    Resource {
        uri: "sqlite://docs/quick-reference",
        name: "SQLite Quick Reference",
        description: "Common SQLite commands and syntax",
        mime_type: MARKDOWN,
        text: include_str!("../content/quick-reference.md"),
    },
    Resource {
        uri: "sqlite://examples/common-queries",
        name: "Common Query Examples",
        description: "Frequently used SQLite query patterns",
        mime_type: MARKDOWN,
        text: include_str!("../content/common-queries.md"),
    },
    Resource {
        uri: "sqlite://docs/best-practices",
        name: "SQLite Best Practices",
        description: "Performance and design recommendations for SQLite",
        mime_type: MARKDOWN,
        text: include_str!("../content/best-practices.md"),
    },
];

pub fn find(uri: &str) -> Result<&'static Resource> {
    RESOURCES
        .iter()
        .find(|resource| resource.uri == uri)
        .ok_or_else(|| ServerError::UnknownResource(uri.to_string()))
}

impl Resource {
    pub fn text(&self) -> &'static str {
        self.text
    }

    /// Body of a `resources/read` result.
    pub fn read(&self) -> Value {
        json!({
            "contents": [{
                "uri": self.uri,
                "mimeType": self.mime_type,
                "text": self.text
            }]
        })
    }
}
