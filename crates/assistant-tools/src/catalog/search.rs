//! Web search and page extraction

use agent_core::{ParameterSchema, ToolSchema};
use serde_json::json;

use crate::backend::Endpoint;

pub fn definitions() -> Vec<(ToolSchema, Endpoint)> {
    vec![
        (
            ToolSchema::new(
                "googleSearch",
                "Search the web for current information. Returns a list of results with title, link and snippet.",
            )
            .param(ParameterSchema::required("query", "string", "Search query"))
            .param(
                ParameterSchema::optional("num", "integer", "Number of results to return (1-10)")
                    .with_default(json!(5)),
            )
            .category("search"),
            Endpoint::get("/search"),
        ),
        (
            ToolSchema::new(
                "extractWebContent",
                "Fetch a web page and return its title and main text content.",
            )
            .param(ParameterSchema::required("url", "string", "Absolute URL of the page"))
            .category("search"),
            Endpoint::post("/extract"),
        ),
        (
            ToolSchema::new(
                "extractMultipleWebContents",
                "Fetch several web pages at once. Returns one entry per URL with its content or an error.",
            )
            .param(ParameterSchema::required("urls", "array", "Absolute URLs to fetch"))
            .category("search"),
            Endpoint::post("/extract/batch"),
        ),
    ]
}
