//! Documents, calendar and email

use agent_core::{ParameterSchema, ToolSchema};
use serde_json::json;

use crate::backend::Endpoint;

pub fn definitions() -> Vec<(ToolSchema, Endpoint)> {
    vec![
        (
            ToolSchema::new("createDocument", "Create a new document in the user's workspace.")
                .param(ParameterSchema::required("title", "string", "Document title"))
                .param(ParameterSchema::required("content", "string", "Document body (Markdown)"))
                .category("documents")
                .side_effects(),
            Endpoint::post("/documents"),
        ),
        (
            ToolSchema::new("getDocument", "Read a document from the user's workspace.")
                .param(ParameterSchema::required("documentId", "string", "Document identifier"))
                .category("documents"),
            Endpoint::get("/documents/{documentId}"),
        ),
        (
            ToolSchema::new("listCalendarEvents", "List events on the user's calendar in a time range.")
                .param(ParameterSchema::optional("timeMin", "string", "Range start, RFC 3339"))
                .param(ParameterSchema::optional("timeMax", "string", "Range end, RFC 3339"))
                .param(
                    ParameterSchema::optional("maxResults", "integer", "Maximum number of events")
                        .with_default(json!(10)),
                )
                .category("calendar"),
            Endpoint::get("/calendar/events"),
        ),
        (
            ToolSchema::new("createCalendarEvent", "Add an event to the user's calendar.")
                .param(ParameterSchema::required("summary", "string", "Event title"))
                .param(ParameterSchema::required("start", "string", "Start time, RFC 3339"))
                .param(ParameterSchema::required("end", "string", "End time, RFC 3339"))
                .param(ParameterSchema::optional("description", "string", "Event details"))
                .param(ParameterSchema::optional("attendees", "array", "Attendee email addresses"))
                .category("calendar")
                .side_effects(),
            Endpoint::post("/calendar/events"),
        ),
        (
            ToolSchema::new("listEmails", "List recent emails in the user's inbox.")
                .param(ParameterSchema::optional("query", "string", "Search filter, e.g. from:alice"))
                .param(
                    ParameterSchema::optional("maxResults", "integer", "Maximum number of emails")
                        .with_default(json!(10)),
                )
                .category("email"),
            Endpoint::get("/emails"),
        ),
        (
            ToolSchema::new("sendEmail", "Send an email on the user's behalf. Confirm with the user first.")
                .param(ParameterSchema::required("to", "string", "Recipient address"))
                .param(ParameterSchema::required("subject", "string", "Subject line"))
                .param(ParameterSchema::required("body", "string", "Plain-text body"))
                .category("email")
                .side_effects(),
            Endpoint::post("/emails/send"),
        ),
    ]
}
