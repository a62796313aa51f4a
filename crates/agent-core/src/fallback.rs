//! Fallback Formatter
//!
//! Renders a raw tool result as readable text when the model never produced
//! a final answer. Dispatches on the tool name; a result whose shape does
//! not match its tool gets the generic JSON digest instead.

use serde_json::Value;

use crate::metadata::resource_names_from;

/// Returned when nothing readable can be produced
pub const FORMAT_FAILURE: &str =
    "I found some information but couldn't format it properly. Please try asking again.";

const SEARCH_LIMIT: usize = 3;
const CONTENT_LIMIT: usize = 500;
const MULTI_CONTENT_LIMIT: usize = 300;
const PREVIEW_ELEMENTS: usize = 3;

/// Format `result` of `tool_name` for the user. Never fails.
pub fn format(tool_name: &str, result: &Value) -> String {
    let formatted = match tool_name {
        "googleSearch" => format_search(result),
        "extractWebContent" | "getDocument" => format_content(result),
        "extractMultipleWebContents" => format_multi_content(result),
        "aggregateData" | "queryModel" => format_aggregation(result),
        "listModels" => format_listing(result),
        "getModelSchema" => pretty(result),
        "listCalendarEvents" => format_events(result),
        "listEmails" => format_emails(result),
        "createDocument" | "createCalendarEvent" | "sendEmail" => format_acknowledgement(tool_name, result),
        _ => None,
    };

    let readable = formatted
        .filter(|text| !text.trim().is_empty())
        .or_else(|| format_generic(result));

    match readable {
        Some(text) if !text.trim().is_empty() => text,
        _ => FORMAT_FAILURE.into(),
    }
}

/// Truncate to `max` characters, marking the cut
pub fn truncate(text: &str, max: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn format_generic(result: &Value) -> Option<String> {
    let raw = serde_json::to_string(result).ok()?;
    Some(truncate(&raw, CONTENT_LIMIT))
}

fn pretty(value: &Value) -> Option<String> {
    serde_json::to_string_pretty(value).ok()
}

/// First array found under `keys`, or the value itself if it is an array
fn array_under<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    value
        .as_array()
        .or_else(|| keys.iter().find_map(|key| value.get(*key).and_then(Value::as_array)))
}

fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|key| value.get(*key).and_then(Value::as_str))
}

fn format_search(result: &Value) -> Option<String> {
    let entries = array_under(result, &["results", "items", "organic"])?;
    if entries.is_empty() {
        return Some("I searched but didn't find any results.".into());
    }

    let mut out = String::from("Here's what I found:\n");
    for (i, entry) in entries.iter().take(SEARCH_LIMIT).enumerate() {
        let title = str_field(entry, &["title"]).unwrap_or("Untitled");
        let snippet = str_field(entry, &["snippet", "description"]).unwrap_or("");
        out.push_str(&format!("\n{}. **{}**\n{}\n", i + 1, title, snippet));
    }
    Some(out)
}

fn format_content(result: &Value) -> Option<String> {
    let text = str_field(result, &["content", "text", "mainText", "markdown", "body"])?;
    let source = str_field(result, &["title", "url"]);

    Some(match source {
        Some(source) => format!("Here's the content from {}:\n\n{}", source, truncate(text, CONTENT_LIMIT)),
        None => truncate(text, CONTENT_LIMIT),
    })
}

fn format_multi_content(result: &Value) -> Option<String> {
    let sources = array_under(result, &["results", "contents", "documents"])?;

    let sections: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let header = str_field(source, &["url", "title"])
                .map_or_else(|| format!("Source {}", i + 1), str::to_string);
            let body = str_field(source, &["content", "text", "mainText"])
                .or_else(|| str_field(source, &["error"]))
                .unwrap_or("(no content)");
            format!("### {}\n{}", header, truncate(body, MULTI_CONTENT_LIMIT))
        })
        .collect();

    (!sections.is_empty()).then(|| sections.join("\n\n"))
}

fn format_aggregation(result: &Value) -> Option<String> {
    let rows = array_under(result, &["results", "data", "documents"])?;
    let preview = Value::Array(rows.iter().take(PREVIEW_ELEMENTS).cloned().collect());

    let mut out = format!("Found {} result{}", rows.len(), if rows.len() == 1 { "" } else { "s" });
    if !rows.is_empty() {
        let label = if rows.len() > PREVIEW_ELEMENTS { " (showing the first 3)" } else { "" };
        out.push_str(&format!("{}:\n```json\n{}\n```", label, pretty(&preview)?));
    } else {
        out.push('.');
    }
    Some(out)
}

fn format_listing(result: &Value) -> Option<String> {
    let names = resource_names_from(result);
    if names.is_empty() {
        return None;
    }
    Some(format!("Available data models: {}", names.join(", ")))
}

fn format_events(result: &Value) -> Option<String> {
    let events = array_under(result, &["events", "items"])?;
    if events.is_empty() {
        return Some("You have no events in that time range.".into());
    }

    let lines: Vec<String> = events
        .iter()
        .map(|event| {
            let summary = str_field(event, &["summary", "title"]).unwrap_or("(untitled event)");
            let start = event
                .get("start")
                .and_then(|s| s.as_str().or_else(|| str_field(s, &["dateTime", "date"])));
            match start {
                Some(start) => format!("- {} ({})", summary, start),
                None => format!("- {}", summary),
            }
        })
        .collect();
    Some(format!("Your events:\n{}", lines.join("\n")))
}

fn format_emails(result: &Value) -> Option<String> {
    let messages = array_under(result, &["messages", "emails"])?;
    if messages.is_empty() {
        return Some("No matching emails found.".into());
    }

    let lines: Vec<String> = messages
        .iter()
        .map(|message| {
            let from = str_field(message, &["from", "sender"]).unwrap_or("unknown sender");
            let subject = str_field(message, &["subject"]).unwrap_or("(no subject)");
            format!("- {}: {}", from, subject)
        })
        .collect();
    Some(format!("Recent emails:\n{}", lines.join("\n")))
}

fn format_acknowledgement(tool_name: &str, result: &Value) -> Option<String> {
    let link = str_field(result, &["url", "link", "htmlLink"]);
    let text = match tool_name {
        "createDocument" => {
            let title = str_field(result, &["title", "name"]).unwrap_or("Untitled");
            format!("Created the document \"{}\".", title)
        }
        "createCalendarEvent" => {
            let summary = str_field(result, &["summary", "title"]).unwrap_or("event");
            format!("Added \"{}\" to your calendar.", summary)
        }
        _ => {
            let to = str_field(result, &["to"]).map_or_else(String::new, |to| format!(" to {}", to));
            format!("Your email was sent{}.", to)
        }
    };

    Some(match link {
        Some(link) => format!("{} {}", text, link),
        None => text,
    })
}
