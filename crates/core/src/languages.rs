//! Configured content languages. The first language is the default one:
//! translatable details require a value only in that language.

use serde::Serialize;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Languages {
    codes: Vec<String>,
}

impl Languages {
    /// Build from language codes. Codes are lowercased and de-duplicated,
    /// keeping first occurrence order.
    pub fn new<I, S>(codes: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for code in codes {
            let code = code.as_ref().trim().to_ascii_lowercase();
            if code.is_empty() {
                continue;
            }
            if !code.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
                return Err(CoreError::Validation(format!(
                    "Invalid language code: {code}"
                )));
            }
            if !out.contains(&code) {
                out.push(code);
            }
        }
        if out.is_empty() {
            return Err(CoreError::Validation(
                "At least one language must be configured".to_string(),
            ));
        }
        Ok(Self { codes: out })
    }

    /// Parse a comma-separated list such as `"en,pt"`.
    pub fn parse_list(list: &str) -> Result<Self, CoreError> {
        Self::new(list.split(','))
    }

    pub fn default_language(&self) -> &str {
        &self.codes[0]
    }

    pub fn is_default(&self, code: &str) -> bool {
        self.default_language() == code
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }
}
