//! Record types mirroring the remote registry's wire format.
//!
//! Everything here deserializes straight from the registry's JSON responses
//! (camelCase on the wire) and compares structurally, so tests and callers
//! can assert on whole values rather than picking fields apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of a dataset within the remote registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Private,
    Internal,
    Public,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            AccessLevel::Private => "private",
            AccessLevel::Internal => "internal",
            AccessLevel::Public => "public",
        };
        write!(f, "{s}")
    }
}

/// Engine backing a query service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Virtuoso,
    Jena,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ServiceType::Virtuoso => "virtuoso",
            ServiceType::Jena => "jena",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub access_level: AccessLevel,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_graphs_update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub graph_count: u64,
    #[serde(default)]
    pub statements: u64,
    #[serde(default)]
    pub service_count: u64,
    #[serde(default)]
    pub asset_count: u64,
}

/// A named graph inside a dataset. The `id` is the registry's opaque handle;
/// `graph_name` is the IRI queries see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub id: String,
    pub graph_name: String,
    #[serde(default)]
    pub uploaded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub number_of_statements: u64,
}

/// A SPARQL query service bound to a dataset. `status` stays a plain string
/// ("starting", "running", ...) since the remote vocabulary is open-ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SparqlService {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub version: Option<String>,
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub number_of_loaded_statements: u64,
    #[serde(default)]
    pub number_of_graphs: u64,
    #[serde(default)]
    pub number_of_loaded_graphs: u64,
    #[serde(default)]
    pub number_of_graph_errors: u64,
    #[serde(default)]
    pub out_of_sync: bool,
    pub endpoint: String,
    #[serde(default)]
    pub status: String,
}

/// An upload job tracked by the registry. Status runs
/// created -> started -> running -> finished | error; `graph_names` is
/// populated once the job finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: String,
    #[serde(default)]
    pub status: String,
    pub job_url: String,
    #[serde(default)]
    pub graph_names: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Optional overrides for a paginated query: a specific Accept header
/// and/or a specific service instead of the auto-selected first one.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub accept: Option<String>,
    pub service: Option<SparqlService>,
}
