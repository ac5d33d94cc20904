//! Authenticated user identity.

use serde::Deserialize;
use serde_json::Value;

/// The subset of `/api/v2/users/me.json` the harvester relies on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentUser {
    /// Numeric actor id used to build role-scoped search queries.
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl CurrentUser {
    /// Extracts the user from a `{"user": {...}}` envelope.
    ///
    /// Returns `None` unless `user.id` is present and numeric.
    pub fn from_envelope(body: &Value) -> Option<Self> {
        let user = body.get("user")?;
        serde_json::from_value(user.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_envelope() {
        let body = json!({"user": {"id": 361089721035u64, "name": "Agent", "email": "a@b.com"}});
        let user = CurrentUser::from_envelope(&body).unwrap();
        assert_eq!(user.id, 361089721035);
        assert_eq!(user.name.as_deref(), Some("Agent"));
    }

    #[test]
    fn test_from_envelope_requires_numeric_id() {
        assert!(CurrentUser::from_envelope(&json!({"user": {"id": "abc"}})).is_none());
        assert!(CurrentUser::from_envelope(&json!({"user": {}})).is_none());
        assert!(CurrentUser::from_envelope(&json!({"users": []})).is_none());
        assert!(CurrentUser::from_envelope(&json!([1])).is_none());
    }
}
