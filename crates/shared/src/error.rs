use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the collaborator on non-success responses.
///
/// `detail` is usually a string; request validation failures carry a list of
/// `{ loc, msg, type }` objects instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    /// Flattens `detail` into one line of text, if there is any.
    pub fn detail_text(&self) -> Option<String> {
        let text = match self.detail.as_ref()? {
            Value::Null => return None,
            Value::String(s) => s.trim().to_string(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item.get("msg").and_then(Value::as_str) {
                    Some(msg) => msg.to_string(),
                    None => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_returned_verbatim() {
        let err: ApiError =
            serde_json::from_str(r#"{"detail":"WebDriver not available"}"#).expect("parse");
        assert_eq!(err.detail_text().as_deref(), Some("WebDriver not available"));
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let err: ApiError = serde_json::from_str(
            r#"{"detail":[{"loc":["body","url"],"msg":"field required","type":"missing"},{"msg":"bad score"}]}"#,
        )
        .expect("parse");
        assert_eq!(
            err.detail_text().as_deref(),
            Some("field required; bad score")
        );
    }

    #[test]
    fn missing_or_blank_detail_is_none() {
        let err: ApiError = serde_json::from_str("{}").expect("parse");
        assert!(err.detail_text().is_none());
        assert!(ApiError::new("  ").detail_text().is_none());
    }
}
