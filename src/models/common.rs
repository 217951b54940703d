//! Common types shared across Table API models.
//!
//! This module defines the response envelope, error body and reference
//! field types used by every table the client reads.

use serde::{Deserialize, Serialize};

/// Envelope wrapping every successful Table API response.
///
/// ServiceNow returns `{"result": [...]}` for list queries; an absent
/// `result` key is treated as an empty list.
#[derive(Debug, Clone, Deserialize)]
pub struct TableResponse<T> {
    /// Rows returned by the query.
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

impl<T> TableResponse<T> {
    /// Unwraps the envelope into its rows.
    pub fn into_rows(self) -> Vec<T> {
        self.result
    }
}

/// Error body returned by ServiceNow on failed requests.
#[derive(Debug, Clone, Deserialize)]
pub struct TableErrorResponse {
    /// The error block.
    pub error: TableErrorDetail,

    /// Usually "failure".
    #[serde(default)]
    pub status: Option<String>,
}

/// Message and detail of a Table API error.
#[derive(Debug, Clone, Deserialize)]
pub struct TableErrorDetail {
    /// Short error message.
    #[serde(default)]
    pub message: Option<String>,

    /// Longer explanation, when ServiceNow provides one.
    #[serde(default)]
    pub detail: Option<String>,
}

impl TableErrorDetail {
    /// Joins message and detail into one line.
    pub fn summary(&self) -> String {
        match (self.message.as_deref(), self.detail.as_deref()) {
            (Some(m), Some(d)) if !d.is_empty() => format!("{}: {}", m, d),
            (Some(m), _) => m.to_string(),
            (None, Some(d)) => d.to_string(),
            (None, None) => "Unknown error".to_string(),
        }
    }
}

/// A reference field pointing at another record.
///
/// Without `sysparm_display_value` the Table API renders references as
/// `{"link": "...", "value": "<sys_id>"}`; some tables and proxies flatten
/// them to the bare sys_id string. Both shapes are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    /// Object form with the API link to the referenced record.
    Link {
        /// sys_id of the referenced record.
        value: String,
        /// REST link to the referenced record.
        #[serde(default)]
        link: Option<String>,
    },
    /// Bare sys_id.
    Plain(String),
}

impl Reference {
    /// Returns the referenced sys_id, or `None` for an empty reference.
    pub fn sys_id(&self) -> Option<&str> {
        let value = match self {
            Reference::Link { value, .. } => value.as_str(),
            Reference::Plain(value) => value.as_str(),
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Reads a ServiceNow boolean, which arrives as `"true"`/`"false"` strings
/// or as JSON booleans depending on the endpoint.
pub fn flag(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::String(s) => match s.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_response_missing_result() {
        let response: TableResponse<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(response.into_rows().is_empty());
    }

    #[test]
    fn test_error_summary() {
        let body = r#"{"error":{"message":"Invalid table","detail":"cmdb_nope"},"status":"failure"}"#;
        let err: TableErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(err.error.summary(), "Invalid table: cmdb_nope");
    }

    #[test]
    fn test_reference_object_form() {
        let r: Reference = serde_json::from_str(
            r#"{"link":"https://acme.service-now.com/api/now/table/sys_user_role/abc","value":"abc"}"#,
        )
        .unwrap();
        assert_eq!(r.sys_id(), Some("abc"));
    }

    #[test]
    fn test_reference_plain_and_empty() {
        let r: Reference = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(r.sys_id(), Some("abc"));
        let empty: Reference = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(empty.sys_id(), None);
    }

    #[test]
    fn test_flag() {
        assert_eq!(flag(&serde_json::json!("true")), Some(true));
        assert_eq!(flag(&serde_json::json!(false)), Some(false));
        assert_eq!(flag(&serde_json::json!("maybe")), None);
    }
}
