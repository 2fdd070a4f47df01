//! Types shared by content generators

use listwell_types::Category;
use serde::{Deserialize, Serialize};

/// Content generation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ContentError {
    #[error("Generator not available: {generator}")]
    Unavailable { generator: String },

    #[error("Request rejected: {message}")]
    Rejected { message: String },

    #[error("Invalid output: {message}")]
    InvalidOutput { message: String },
}

pub type Result<T> = std::result::Result<T, ContentError>;

/// Longest title a listing may carry
pub const MAX_TITLE_CHARS: usize = 120;

/// What to generate content for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    /// Category the listing will be filed under, if already chosen
    pub category: Option<Category>,
}

impl ContentRequest {
    pub fn for_category(category: Category) -> Self {
        Self {
            category: Some(category),
        }
    }
}

/// Title, summary and tags for a new listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl GeneratedContent {
    /// Reject empty or oversized output before it reaches the store
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ContentError::InvalidOutput {
                message: "empty title".to_string(),
            });
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ContentError::InvalidOutput {
                message: format!("title longer than {} characters", MAX_TITLE_CHARS),
            });
        }
        if self.summary.trim().is_empty() {
            return Err(ContentError::InvalidOutput {
                message: "empty summary".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(title: &str, summary: &str) -> GeneratedContent {
        GeneratedContent {
            title: title.to_string(),
            summary: summary.to_string(),
            tags: vec![],
        }
    }

    #[test]
    fn test_validate_accepts_normal_content() {
        assert!(content("Logo redesign", "Fresh mark for a bakery").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(content("   ", "summary").validate().is_err());
        assert!(content("title", "").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_long_titles() {
        let long = "x".repeat(MAX_TITLE_CHARS + 1);
        assert!(matches!(
            content(&long, "summary").validate(),
            Err(ContentError::InvalidOutput { .. })
        ));
    }
}
