//! Administration client for the remote registry: CRUD over the datasets,
//! graphs, and query services of one (organization, dataset) pair.
//!
//! Name-based graph operations resolve identity against a fresh listing at
//! call time; nothing is cached across calls. Under concurrent external
//! mutation this is optimistic and unlocked — callers are expected to
//! serialize mutating workflows per dataset.

use crate::config::PollPolicy;
use crate::errors::{NotFoundError, TimeoutError};
use crate::models::{AccessLevel, Dataset, Graph, ServiceType, SparqlService};
use crate::transport::Transport;
use anyhow::Result;
use log::{debug, info};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct AdminClient {
    transport: Transport,
    org: String,
    dataset: String,
    poll: PollPolicy,
}

impl AdminClient {
    pub fn new(transport: Transport, org: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            transport,
            org: org.into(),
            dataset: dataset.into(),
            poll: PollPolicy::service_sync(),
        }
    }

    /// Replaces the service-sync polling budget (12 attempts x 5s by
    /// default).
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    fn graph_path(&self) -> String {
        format!("datasets/{}/{}/graphs/", self.org, self.dataset)
    }

    fn service_path(&self) -> String {
        format!("datasets/{}/{}/services/", self.org, self.dataset)
    }

    /// Lists the dataset's graphs in the order the registry returns them;
    /// that order is not guaranteed stable across calls.
    pub fn list_graphs(&self) -> Result<Vec<Graph>> {
        let url = self.transport.join(&self.graph_path())?;
        self.transport.get_json(&url)
    }

    /// Renames a graph identified by value. No existence check is performed
    /// on `new_name`; collision semantics are the caller's concern.
    pub fn rename_graph(&self, graph: &Graph, new_name: &str) -> Result<Graph> {
        debug!("renaming graph {} -> {}", graph.graph_name, new_name);
        let url = self
            .transport
            .join(&format!("{}{}", self.graph_path(), graph.id))?;
        self.transport
            .patch_json(&url, &json!({ "graphName": new_name }))
    }

    /// Convenience form: resolves `old_name` against a fresh listing by
    /// exact match. If the listing holds duplicate names the first match
    /// wins. No write request is issued when the name is absent.
    pub fn rename_graph_by_name(&self, old_name: &str, new_name: &str) -> Result<Graph> {
        let graph = self.find_graph(old_name)?;
        self.rename_graph(&graph, new_name)
    }

    pub fn delete_graph(&self, graph: &Graph) -> Result<()> {
        debug!("deleting graph {}", graph.graph_name);
        let url = self
            .transport
            .join(&format!("{}{}", self.graph_path(), graph.id))?;
        self.transport.delete(&url)
    }

    /// Deletes by name with the same resolution rules as
    /// [`rename_graph_by_name`](Self::rename_graph_by_name); deleting an
    /// absent name is an error, not a silent success.
    pub fn delete_graph_by_name(&self, name: &str) -> Result<()> {
        let graph = self.find_graph(name)?;
        self.delete_graph(&graph)
    }

    fn find_graph(&self, name: &str) -> Result<Graph> {
        let graphs = self.list_graphs()?;
        graphs
            .into_iter()
            .find(|g| g.graph_name == name)
            .ok_or_else(|| NotFoundError::new(format!("Graph not found: {name}")).into())
    }

    pub fn list_datasets(&self) -> Result<Vec<Dataset>> {
        let url = self.transport.join(&format!("datasets/{}", self.org))?;
        self.transport.get_json(&url)
    }

    /// Returns the configured dataset when the organization's listing
    /// already contains it, otherwise creates it with the given access
    /// level. Check-then-act: concurrent callers may still race to create.
    pub fn create_dataset_if_not_exists(&self, access_level: AccessLevel) -> Result<Dataset> {
        let datasets = self.list_datasets()?;
        if let Some(existing) = datasets.into_iter().find(|d| d.name == self.dataset) {
            return Ok(existing);
        }
        self.create_dataset(access_level)
    }

    fn create_dataset(&self, access_level: AccessLevel) -> Result<Dataset> {
        info!("creating dataset {}/{}", self.org, self.dataset);
        let url = self.transport.join(&format!("datasets/{}", self.org))?;
        self.transport.post_json(
            &url,
            &json!({
                "name": self.dataset,
                "accessLevel": access_level.to_string(),
                "displayName": self.dataset,
            }),
        )
    }

    pub fn list_services(&self) -> Result<Vec<SparqlService>> {
        let url = self.transport.join(&self.service_path())?;
        self.transport.get_json(&url)
    }

    pub fn get_service(&self, name: &str) -> Result<SparqlService> {
        let url = self
            .transport
            .join(&format!("{}{}", self.service_path(), name))?;
        self.transport.get_json(&url)
    }

    pub fn create_service(&self, name: &str, service_type: ServiceType) -> Result<SparqlService> {
        info!("creating {service_type} service {name}");
        let url = self.transport.join(&self.service_path())?;
        self.transport.post_json(
            &url,
            &json!({
                "name": name,
                "type": service_type.to_string(),
            }),
        )
    }

    /// Asks the registry to resynchronize the service with the dataset's
    /// current graphs.
    pub fn update_service(&self, name: &str) -> Result<SparqlService> {
        info!("requesting resync of service {name}");
        let url = self
            .transport
            .join(&format!("{}{}", self.service_path(), name))?;
        self.transport.post_json(&url, &json!({ "sync": true }))
    }

    pub fn delete_service(&self, name: &str) -> Result<()> {
        let url = self
            .transport
            .join(&format!("{}{}", self.service_path(), name))?;
        self.transport.delete(&url)
    }

    /// Creates the service, then polls until its status is "running".
    pub fn create_service_and_wait(
        &self,
        name: &str,
        service_type: ServiceType,
    ) -> Result<SparqlService> {
        self.create_service(name, service_type)?;
        self.wait_for_running(name)
    }

    /// Requests a resync, then polls until the status is "running".
    pub fn update_service_and_wait(&self, name: &str) -> Result<SparqlService> {
        self.update_service(name)?;
        self.wait_for_running(name)
    }

    fn wait_for_running(&self, name: &str) -> Result<SparqlService> {
        let mut remaining = self.poll.max_attempts;
        let mut service = self.get_service(name)?;
        while service.status != "running" {
            if remaining == 0 {
                return Err(
                    TimeoutError::new("Service did not update within timeout").into(),
                );
            }
            std::thread::sleep(self.poll.interval);
            info!("waiting for service {name} to be running");
            service = self.get_service(name)?;
            remaining -= 1;
        }
        Ok(service)
    }
}
