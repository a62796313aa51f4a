//! Data store introspection and queries
//!
//! `listModels` and `getModelSchema` double as the metadata cache's
//! introspection tools.

use agent_core::{ParameterSchema, ToolSchema};
use serde_json::json;

use crate::backend::Endpoint;

fn model_name() -> ParameterSchema {
    ParameterSchema::required("modelName", "string", "Name of the data model, as returned by listModels")
}

pub fn definitions() -> Vec<(ToolSchema, Endpoint)> {
    vec![
        (
            ToolSchema::new("listModels", "List the data models available in the data store.")
                .category("datastore"),
            Endpoint::get("/datastore/models"),
        ),
        (
            ToolSchema::new("getModelSchema", "Get the field schema of one data model.")
                .param(model_name())
                .category("datastore"),
            Endpoint::get("/datastore/models/{modelName}/schema"),
        ),
        (
            ToolSchema::new(
                "queryModel",
                "Find documents in a data model matching a filter. Returns the matching documents.",
            )
            .param(model_name())
            .param(ParameterSchema::optional("filter", "object", "Query filter, e.g. {\"status\": \"open\"}"))
            .param(ParameterSchema::optional("sort", "object", "Sort specification, e.g. {\"createdAt\": -1}"))
            .param(
                ParameterSchema::optional("limit", "integer", "Maximum number of documents")
                    .with_default(json!(20)),
            )
            .category("datastore"),
            Endpoint::post("/datastore/models/{modelName}/query"),
        ),
        (
            ToolSchema::new(
                "aggregateData",
                "Run an aggregation pipeline over a data model (grouping, counting, sums, averages).",
            )
            .param(model_name())
            .param(
                ParameterSchema::required("pipeline", "array", "Aggregation pipeline stages")
                    .with_items(json!({"type": "object"})),
            )
            .category("datastore"),
            Endpoint::post("/datastore/models/{modelName}/aggregate"),
        ),
    ]
}
