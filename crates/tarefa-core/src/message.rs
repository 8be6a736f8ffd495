use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Reserved message key naming the handler a message is dispatched to.
pub const JOB_KEY: &str = "job";

/// Unit of work flowing through the queue. A flat string-to-string map with
/// one reserved key, [`JOB_KEY`], naming the registered handler. Every other
/// key is payload owned by the producer/handler pair — the runner never
/// interprets them. Messages are read-only once received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: HashMap<String, String>,
}

impl Message {
    /// Create a message addressed to the named job handler.
    pub fn job(name: impl Into<String>) -> Self {
        let mut fields = HashMap::new();
        fields.insert(JOB_KEY.to_string(), name.into());
        Self { fields }
    }

    /// Add a payload field, replacing any earlier value under the same key.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// The handler name under the reserved key, if present.
    pub fn job_name(&self) -> Option<&str> {
        self.get(JOB_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_constructor_sets_reserved_key() {
        let msg = Message::job("welcome-email");
        assert_eq!(msg.job_name(), Some("welcome-email"));
        assert_eq!(msg.get(JOB_KEY), Some("welcome-email"));
        assert_eq!(msg.get("foo"), None);
    }

    #[test]
    fn with_adds_payload_fields() {
        let msg = Message::job("test").with("foo", "bar").with("baz", "qux");
        assert_eq!(msg.get("foo"), Some("bar"));
        assert_eq!(msg.get("baz"), Some("qux"));
        assert_eq!(msg.job_name(), Some("test"));
    }

    #[test]
    fn with_replaces_existing_value() {
        let msg = Message::job("test").with("foo", "old").with("foo", "new");
        assert_eq!(msg.get("foo"), Some("new"));
    }

    #[test]
    fn empty_message_has_no_job_name() {
        let msg = Message::default();
        assert_eq!(msg.job_name(), None);
        assert_eq!(msg.get(JOB_KEY), None);
    }
}
