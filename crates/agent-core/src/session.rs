//! Session Context
//!
//! Who the agent is talking to. Authentication and session storage live
//! outside this crate; the agent only reads the identity it is handed.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub user_id: String,

    #[serde(default)]
    pub user_name: Option<String>,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: Some(user_name.into()),
        }
    }

    pub fn anonymous(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: None,
        }
    }

    /// Line injected into the system prompt
    pub fn prompt_line(&self) -> String {
        match self.user_name.as_deref().filter(|name| !name.trim().is_empty()) {
            Some(name) => format!("You are assisting {} (user id: {}).", name, self.user_id),
            None => format!("You are assisting user {}.", self.user_id),
        }
    }
}
