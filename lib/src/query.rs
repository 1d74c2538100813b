//! Paginated SPARQL execution against a dataset's query services.
//!
//! Two callers share the pagination protocol: [`QueryClient`] runs an ad hoc
//! query and hands back the raw page bodies, while [`QueryExporter`] drains a
//! query against a fixed endpoint and reassembles the pages into a single
//! document (the full-dataset export path).

use crate::admin::AdminClient;
use crate::errors::{NotFoundError, TransportError};
use crate::models::{QueryOptions, SparqlService};
use crate::pagination::{fetch_all_pages, reassemble, DEFAULT_PAGE_SIZE};
use crate::transport::Transport;
use anyhow::Result;
use log::debug;
use reqwest::header::ACCEPT;
use serde_json::json;

/// Accept negotiated when the caller does not override it.
pub const DEFAULT_QUERY_ACCEPT: &str = "application/trig, text/csv";

#[derive(Debug, Clone)]
pub struct QueryClient {
    transport: Transport,
    admin: AdminClient,
    page_size: usize,
}

impl QueryClient {
    pub fn new(transport: Transport, admin: AdminClient) -> Self {
        Self {
            transport,
            admin,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Executes `query` page-by-page against the resolved service and
    /// returns the ordered, unconcatenated page bodies. The target service
    /// comes from `options` when set, otherwise the first service listed for
    /// the dataset; an empty listing fails before any query request is made.
    pub fn execute_query(
        &self,
        query: &str,
        options: Option<&QueryOptions>,
    ) -> Result<Vec<String>> {
        let service = self.resolve_service(options)?;
        let accept = options
            .and_then(|o| o.accept.as_deref())
            .unwrap_or(DEFAULT_QUERY_ACCEPT);
        debug!("querying {} with Accept {accept}", service.endpoint);

        fetch_all_pages(query, self.page_size, |page_query| {
            let resp = self
                .transport
                .authorize(self.transport.http().post(&service.endpoint))
                .header(ACCEPT, accept)
                .json(&json!({ "query": page_query }))
                .send()?;
            let status = resp.status();
            let body = resp.text()?;
            if !status.is_success() {
                return Err(TransportError::new(&service.endpoint, status, body).into());
            }
            Ok(body)
        })
    }

    fn resolve_service(&self, options: Option<&QueryOptions>) -> Result<SparqlService> {
        if let Some(service) = options.and_then(|o| o.service.clone()) {
            return Ok(service);
        }
        let services = self.admin.list_services()?;
        services
            .into_iter()
            .next()
            .ok_or_else(|| NotFoundError::new("No services found for dataset").into())
    }
}

/// Drains a query against one endpoint and reassembles the pages into a
/// single document, negotiating exactly one Accept value. Queries are posted
/// form-encoded, the way the export endpoint expects them.
#[derive(Debug, Clone)]
pub struct QueryExporter {
    transport: Transport,
    endpoint: String,
    accept: String,
    page_size: usize,
}

impl QueryExporter {
    pub fn new(transport: Transport, endpoint: impl Into<String>, accept: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            accept: accept.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Fetches every page of `query` and returns one reassembled document:
    /// JSON and JSON-LD pages are merged into a single array, other formats
    /// concatenated. An immediately-empty result yields the empty document.
    pub fn export(&self, query: &str) -> Result<String> {
        let pages = fetch_all_pages(query, self.page_size, |page_query| {
            let resp = self
                .transport
                .authorize(self.transport.http().post(&self.endpoint))
                .header(ACCEPT, &self.accept)
                .form(&[("query", page_query)])
                .send()?;
            let status = resp.status();
            let body = resp.text()?;
            if !status.is_success() {
                return Err(TransportError::new(&self.endpoint, status, body).into());
            }
            Ok(body)
        })?;
        debug!("export collected {} pages", pages.len());
        Ok(reassemble(&pages, &self.accept))
    }
}
