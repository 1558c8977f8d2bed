//! Declarative input validation.
//!
//! Each action's schema is a set of per-field constraint descriptions
//! (required-ness, length bounds, patterns) with the violation messages kept
//! as data beside the constraint. Validation never performs I/O and never
//! collapses failures: the result is a field-name → ordered message list
//! mapping, because the UI surfaces errors per field.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum question title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum question content length on the creation/edit path.
pub const MAX_QUESTION_CONTENT_LEN: usize = 200;
/// Maximum tag name length.
pub const MAX_TAG_LEN: usize = 15;
/// Maximum number of tags per question.
pub const MAX_TAGS: usize = 3;

/// Identity providers accepted by the OAuth sign-in path.
pub const OAUTH_PROVIDERS: &[&str] = &["github", "google"];

/// Field-keyed validation failures. Message order follows rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a field's violation list.
    pub fn push(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for one field, if any.
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }

    /// Number of fields with at least one violation.
    pub fn field_count(&self) -> usize {
        self.0.len()
    }

    /// `Ok(())` when no violations were recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, messages.join(" "))?;
            first = false;
        }
        Ok(())
    }
}

/// Constraint description for a single string field.
///
/// Messages live beside their constraint so the schema stays data, not
/// control flow. Length bounds count characters, not bytes.
pub struct StringRules {
    field: &'static str,
    required: Option<&'static str>,
    min: Option<(usize, &'static str)>,
    max: Option<(usize, &'static str)>,
    patterns: Vec<(Regex, &'static str)>,
}

impl StringRules {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            required: None,
            min: None,
            max: None,
            patterns: Vec::new(),
        }
    }

    pub fn required(mut self, message: &'static str) -> Self {
        self.required = Some(message);
        self
    }

    pub fn min_len(mut self, min: usize, message: &'static str) -> Self {
        self.min = Some((min, message));
        self
    }

    pub fn max_len(mut self, max: usize, message: &'static str) -> Self {
        self.max = Some((max, message));
        self
    }

    /// Require the value to match `pattern`. Panics on an invalid pattern,
    /// which is acceptable only because schemas are static literals.
    pub fn pattern(mut self, pattern: &'static str, message: &'static str) -> Self {
        let re = Regex::new(pattern).expect("static schema pattern must compile");
        self.patterns.push((re, message));
        self
    }

    /// Evaluate every constraint against `value`, recording violations.
    ///
    /// An empty value reports only the required/min violation; length and
    /// pattern checks are skipped to avoid piling messages on a blank field.
    pub fn check(&self, value: &str, errors: &mut FieldErrors) {
        if value.trim().is_empty() {
            if let Some(message) = self.required {
                errors.push(self.field, message);
            } else if let Some((min, message)) = self.min {
                if min > 0 {
                    errors.push(self.field, message);
                }
            }
            return;
        }

        let len = value.chars().count();
        if let Some((min, message)) = self.min {
            if len < min {
                errors.push(self.field, message);
            }
        }
        if let Some((max, message)) = self.max {
            if len > max {
                errors.push(self.field, message);
            }
        }
        for (re, message) in &self.patterns {
            if !re.is_match(value) {
                errors.push(self.field, message);
            }
        }
    }
}

// =============================================================================
// FIELD SCHEMAS
// =============================================================================

static TITLE: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("title")
        .required("Title is required.")
        .max_len(MAX_TITLE_LEN, "Title cannot exceed 100 characters.")
});

static QUESTION_CONTENT: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("content")
        .required("Content is required.")
        .max_len(
            MAX_QUESTION_CONTENT_LEN,
            "Content cannot exceed 200 characters.",
        )
});

static TAG_ITEM: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("tags")
        .required("Tag is required.")
        .max_len(MAX_TAG_LEN, "Tag cannot exceed 15 characters.")
});

static ANSWER_CONTENT: Lazy<StringRules> =
    Lazy::new(|| StringRules::new("content").required("Content is required."));

static USERNAME: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("username")
        .min_len(3, "Username must be at least 3 characters long.")
        .max_len(30, "Username cannot exceed 30 characters.")
        .pattern(
            r"^[a-zA-Z0-9_]+$",
            "Username can only contain letters, numbers, and underscores.",
        )
});

static DISPLAY_NAME: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("name")
        .required("Name is required.")
        .max_len(50, "Name cannot exceed 50 characters.")
        .pattern(
            r"^[a-zA-Z\s]+$",
            "Name can only contain letters and spaces.",
        )
});

static EMAIL: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("email")
        .required("Email is required.")
        .pattern(
            r"^[^\s@]+@[^\s@]+\.[^\s@]+$",
            "Please provide a valid email address.",
        )
});

static PASSWORD: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("password")
        .min_len(6, "Password must be at least 6 characters long.")
        .max_len(100, "Password cannot exceed 100 characters.")
        .pattern(
            r"[A-Z]",
            "Password must contain at least one uppercase letter.",
        )
        .pattern(
            r"[a-z]",
            "Password must contain at least one lowercase letter.",
        )
        .pattern(r"[0-9]", "Password must contain at least one number.")
        .pattern(
            r"[^a-zA-Z0-9]",
            "Password must contain at least one special character.",
        )
});

static SIGN_IN_PASSWORD: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("password")
        .min_len(6, "Password must be at least 6 characters long.")
        .max_len(100, "Password cannot exceed 100 characters.")
});

static PROVIDER_ACCOUNT_ID: Lazy<StringRules> = Lazy::new(|| {
    StringRules::new("providerAccountId").required("Provider Account ID is required.")
});

fn check_tag_list(tags: &[String], errors: &mut FieldErrors) {
    if tags.is_empty() {
        errors.push("tags", "Tags are required.");
        return;
    }
    if tags.len() > MAX_TAGS {
        errors.push("tags", "Tags cannot exceed 3 tags.");
    }
    for tag in tags {
        TAG_ITEM.check(tag, errors);
    }
}

// =============================================================================
// SCHEMA TRAIT + PER-ACTION IMPLEMENTATIONS
// =============================================================================

/// Typed parameters that know their own schema.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

use crate::models::{
    AskQuestionParams, CreateAnswerParams, EditQuestionParams, PaginatedSearchParams,
    SignInParams, SignInWithOAuthParams, SignUpParams,
};

impl Validate for AskQuestionParams {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        TITLE.check(&self.title, &mut errors);
        QUESTION_CONTENT.check(&self.content, &mut errors);
        check_tag_list(&self.tags, &mut errors);
        errors.into_result()
    }
}

impl Validate for EditQuestionParams {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        TITLE.check(&self.title, &mut errors);
        QUESTION_CONTENT.check(&self.content, &mut errors);
        check_tag_list(&self.tags, &mut errors);
        errors.into_result()
    }
}

impl Validate for CreateAnswerParams {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        ANSWER_CONTENT.check(&self.content, &mut errors);
        errors.into_result()
    }
}

impl Validate for SignUpParams {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        USERNAME.check(&self.username, &mut errors);
        DISPLAY_NAME.check(&self.name, &mut errors);
        EMAIL.check(&self.email, &mut errors);
        PASSWORD.check(&self.password, &mut errors);
        errors.into_result()
    }
}

impl Validate for SignInParams {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        EMAIL.check(&self.email, &mut errors);
        SIGN_IN_PASSWORD.check(&self.password, &mut errors);
        errors.into_result()
    }
}

impl Validate for SignInWithOAuthParams {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if !OAUTH_PROVIDERS.contains(&self.provider.as_str()) {
            errors.push("provider", "Provider must be one of: github, google.");
        }
        PROVIDER_ACCOUNT_ID.check(&self.provider_account_id, &mut errors);
        if self.user.name.trim().is_empty() {
            errors.push("user.name", "Name is required.");
        }
        if self.user.username.trim().is_empty() {
            errors.push("user.username", "Username is required.");
        }
        EMAIL.check(&self.user.email, &mut errors);
        errors.into_result()
    }
}

impl Validate for PaginatedSearchParams {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.page == Some(0) {
            errors.push("page", "Page must be at least 1.");
        }
        match self.page_size {
            Some(0) => errors.push("pageSize", "Page size must be at least 1."),
            Some(n) if n > crate::models::MAX_PAGE_SIZE => {
                errors.push("pageSize", "Page size cannot exceed 100.")
            }
            _ => {}
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(title: &str, content: &str, tags: &[&str]) -> AskQuestionParams {
        AskQuestionParams {
            title: title.to_string(),
            content: content.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_question_passes() {
        let params = ask("How do I borrow twice?", "Borrow checker says no.", &["rust"]);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_empty_title_reports_title_field_only() {
        let params = ask("", "content", &["rust"]);
        let errors = params.validate().unwrap_err();
        assert_eq!(
            errors.get("title"),
            Some(&vec!["Title is required.".to_string()])
        );
        assert!(errors.get("content").is_none());
    }

    #[test]
    fn test_title_over_100_chars() {
        let params = ask(&"x".repeat(101), "content", &["rust"]);
        let errors = params.validate().unwrap_err();
        assert_eq!(
            errors.get("title"),
            Some(&vec!["Title cannot exceed 100 characters.".to_string()])
        );
    }

    #[test]
    fn test_title_at_100_chars_is_valid() {
        let params = ask(&"x".repeat(100), "content", &["rust"]);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_content_over_200_chars() {
        let params = ask("title", &"y".repeat(201), &["rust"]);
        assert!(params.validate().unwrap_err().get("content").is_some());
    }

    #[test]
    fn test_no_tags_rejected() {
        let params = ask("title", "content", &[]);
        let errors = params.validate().unwrap_err();
        assert_eq!(
            errors.get("tags"),
            Some(&vec!["Tags are required.".to_string()])
        );
    }

    #[test]
    fn test_four_tags_rejected() {
        let params = ask("title", "content", &["a", "b", "c", "d"]);
        let errors = params.validate().unwrap_err();
        assert_eq!(
            errors.get("tags"),
            Some(&vec!["Tags cannot exceed 3 tags.".to_string()])
        );
    }

    #[test]
    fn test_tag_over_15_chars() {
        let params = ask("title", "content", &["averylongtagname!"]);
        let errors = params.validate().unwrap_err();
        assert_eq!(
            errors.get("tags"),
            Some(&vec!["Tag cannot exceed 15 characters.".to_string()])
        );
    }

    #[test]
    fn test_multiple_fields_preserved_independently() {
        let params = ask("", "", &[]);
        let errors = params.validate().unwrap_err();
        assert_eq!(errors.field_count(), 3);
    }

    #[test]
    fn test_password_collects_every_violated_class() {
        let params = SignUpParams {
            username: "dev_one".to_string(),
            name: "Dev One".to_string(),
            email: "dev@example.com".to_string(),
            password: "abcdefg".to_string(),
        };
        let errors = params.validate().unwrap_err();
        let messages = errors.get("password").unwrap();
        // uppercase, number, special — in rule order
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("uppercase"));
        assert!(messages[1].contains("number"));
        assert!(messages[2].contains("special"));
    }

    #[test]
    fn test_username_pattern() {
        let params = SignUpParams {
            username: "dev one".to_string(),
            name: "Dev One".to_string(),
            email: "dev@example.com".to_string(),
            password: "Str0ng!pass".to_string(),
        };
        let errors = params.validate().unwrap_err();
        assert!(errors.get("username").unwrap()[0].contains("letters, numbers"));
    }

    #[test]
    fn test_invalid_email() {
        let params = SignInParams {
            email: "not-an-email".to_string(),
            password: "abcdef".to_string(),
        };
        let errors = params.validate().unwrap_err();
        assert_eq!(
            errors.get("email"),
            Some(&vec!["Please provide a valid email address.".to_string()])
        );
    }

    #[test]
    fn test_oauth_provider_enum() {
        let params = SignInWithOAuthParams {
            provider: "gitlab".to_string(),
            provider_account_id: "123".to_string(),
            user: crate::models::OAuthUserProfile {
                name: "Dev".to_string(),
                username: "dev".to_string(),
                email: "dev@example.com".to_string(),
                image: None,
            },
        };
        let errors = params.validate().unwrap_err();
        assert!(errors.get("provider").is_some());
    }

    #[test]
    fn test_paginated_params_bounds() {
        let params = PaginatedSearchParams {
            page: Some(0),
            page_size: Some(101),
            ..Default::default()
        };
        let errors = params.validate().unwrap_err();
        assert!(errors.get("page").is_some());
        assert!(errors.get("pageSize").is_some());
    }

    #[test]
    fn test_field_errors_display_joins_fields() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title is required.");
        errors.push("tags", "Tags are required.");
        let rendered = errors.to_string();
        assert!(rendered.contains("title: Title is required."));
        assert!(rendered.contains("tags: Tags are required."));
    }

    #[test]
    fn test_field_errors_serialize_as_map() {
        let mut errors = FieldErrors::new();
        errors.push("title", "Title is required.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["title"][0], "Title is required.");
    }
}
