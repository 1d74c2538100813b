//! Graph replacement orchestration: make a dataset's graphs reflect a new
//! payload and bring its query service back in sync.
//!
//! The workflow is ordered but deliberately not atomic. Old graphs are
//! deleted before the upload, a failure partway leaves the dataset in a
//! mixed state, and no rollback is attempted; callers that need retries
//! re-run the whole call. At most one upload job is in flight per call, and
//! workflows for the same dataset must be serialized by the caller.

use crate::admin::AdminClient;
use crate::config::RegistryConfig;
use crate::errors::ValidationError;
use crate::models::{AccessLevel, Job, ServiceType, SparqlService};
use crate::transport::Transport;
use crate::upload::UploadClient;
use anyhow::Result;
use log::{info, warn};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::GraphName;
use serde::Serialize;
use std::collections::HashSet;

/// Extracts the named-graph IRIs a payload declares, in first-seen order,
/// with a single trailing slash stripped. Content that declares no graphs at
/// all is rejected before any remote call happens.
pub fn graph_names_from_content(content: &str, format: RdfFormat) -> Result<Vec<String>> {
    let parser = RdfParser::from_format(format);
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for quad in parser.for_reader(content.as_bytes()) {
        let quad = quad?;
        if let GraphName::NamedNode(node) = &quad.graph_name {
            let name = node.as_str();
            let name = name.strip_suffix('/').unwrap_or(name).to_string();
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    if names.is_empty() {
        return Err(
            ValidationError::new("The content provided does not contain any graphs").into(),
        );
    }
    Ok(names)
}

/// What a completed replacement did, for logging and CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaceReport {
    pub dataset: String,
    /// Existing graphs that were deleted because the payload redeclares them.
    pub deleted: Vec<String>,
    /// (produced, intended) rename pairs, in upload order.
    pub renamed: Vec<(String, String)>,
    pub service: SparqlService,
}

#[derive(Debug, Clone)]
pub struct GraphReplacer {
    config: RegistryConfig,
    transport: Transport,
}

impl GraphReplacer {
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let transport = Transport::new(config.base_url.clone(), config.token.clone())?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Replaces the graphs declared by `content` under the dataset mapped to
    /// `profile` and resynchronizes its query service.
    ///
    /// Produced graphs are paired positionally with the declared names
    /// (first produced to first declared, and so on); the upload protocol
    /// reports no explicit mapping, so graph order is assumed to survive the
    /// upload.
    pub fn replace_graphs(
        &self,
        profile: &str,
        content: &str,
        content_type: &str,
    ) -> Result<ReplaceReport> {
        let mapping = self.config.resolve(profile)?;
        let format = RdfFormat::from_media_type(content_type).ok_or_else(|| {
            ValidationError::new(format!("Unsupported content type '{content_type}'"))
        })?;
        let intended = graph_names_from_content(content, format)?;
        info!(
            "replacing {} graph(s) under {}/{}",
            intended.len(),
            self.config.org,
            mapping.dataset
        );

        let admin = AdminClient::new(
            self.transport.clone(),
            &self.config.org,
            &mapping.dataset,
        )
        .with_poll_policy(self.config.service_poll);
        admin.create_dataset_if_not_exists(AccessLevel::Internal)?;

        let deleted = self.delete_conflicting_graphs(&admin, &intended)?;
        let job = self.upload_content(&mapping.dataset, content, format, &intended)?;
        let renamed = self.rename_produced_graphs(&admin, &job, &intended)?;
        let service = self.sync_service(&admin, &mapping.service)?;

        Ok(ReplaceReport {
            dataset: mapping.dataset.clone(),
            deleted,
            renamed,
            service,
        })
    }

    /// Deletes every existing graph the payload redeclares. Not
    /// transactional: a failure here leaves earlier deletions in place.
    fn delete_conflicting_graphs(
        &self,
        admin: &AdminClient,
        intended: &[String],
    ) -> Result<Vec<String>> {
        let intended_set: HashSet<&str> = intended.iter().map(String::as_str).collect();
        let existing = admin.list_graphs()?;
        let mut deleted = Vec::new();
        for graph in &existing {
            if intended_set.contains(graph.graph_name.as_str()) {
                admin.delete_graph_by_name(&graph.graph_name)?;
                deleted.push(graph.graph_name.clone());
            }
        }
        Ok(deleted)
    }

    fn upload_content(
        &self,
        dataset: &str,
        content: &str,
        format: RdfFormat,
        intended: &[String],
    ) -> Result<Job> {
        let upload = UploadClient::new(self.transport.clone());
        let job = upload.create_job(&self.config.org, dataset)?;
        let file_name = format!("{}.{}", intended[0], format.file_extension());
        upload.upload_string(&job, content, &file_name)?;
        upload.start_job_and_wait(&job, &self.config.job_poll)
    }

    fn rename_produced_graphs(
        &self,
        admin: &AdminClient,
        job: &Job,
        intended: &[String],
    ) -> Result<Vec<(String, String)>> {
        if job.graph_names.len() != intended.len() {
            warn!(
                "job produced {} graph(s) but the payload declared {}",
                job.graph_names.len(),
                intended.len()
            );
        }
        let mut renamed = Vec::new();
        for (produced, target) in job.graph_names.iter().zip(intended) {
            admin.rename_graph_by_name(produced, target)?;
            renamed.push((produced.clone(), target.clone()));
        }
        Ok(renamed)
    }

    /// Brings the target service in line with the dataset: a resync when it
    /// already exists, a fresh create otherwise, in both cases waiting until
    /// it reports "running".
    fn sync_service(&self, admin: &AdminClient, service: &str) -> Result<SparqlService> {
        let services = admin.list_services()?;
        if services.iter().any(|s| s.name == service) {
            admin.update_service_and_wait(service)
        } else {
            admin.create_service_and_wait(service, ServiceType::Virtuoso)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIG_TWO_GRAPHS: &str = r#"
        @prefix ex: <http://example.org/> .
        <http://data.example/graphs/alpha/> { ex:s ex:p ex:o . }
        <http://data.example/graphs/beta> { ex:s2 ex:p2 ex:o2 . }
    "#;

    #[test]
    fn test_graph_names_in_first_seen_order() {
        let names = graph_names_from_content(TRIG_TWO_GRAPHS, RdfFormat::TriG).unwrap();
        assert_eq!(
            names,
            vec![
                "http://data.example/graphs/alpha",
                "http://data.example/graphs/beta"
            ]
        );
    }

    #[test]
    fn test_trailing_slash_stripped_once() {
        let content = r#"<http://g.example//> { <http://s> <http://p> <http://o> . }"#;
        let names = graph_names_from_content(content, RdfFormat::TriG).unwrap();
        assert_eq!(names, vec!["http://g.example/"]);
    }

    #[test]
    fn test_content_without_graphs_is_rejected() {
        let content = "<http://s> <http://p> <http://o> .";
        let err = graph_names_from_content(content, RdfFormat::TriG).unwrap_err();
        let validation = err.downcast_ref::<ValidationError>().unwrap();
        assert_eq!(
            validation.message,
            "The content provided does not contain any graphs"
        );
    }

    #[test]
    fn test_malformed_content_propagates_parse_error() {
        let content = "this is not rdf {";
        assert!(graph_names_from_content(content, RdfFormat::TriG).is_err());
    }

    #[test]
    fn test_duplicate_graph_blocks_reported_once() {
        let content = r#"
            <http://g.example/a> { <http://s> <http://p> <http://o> . }
            <http://g.example/b> { <http://s> <http://p> <http://o> . }
            <http://g.example/a> { <http://s2> <http://p2> <http://o2> . }
        "#;
        let names = graph_names_from_content(content, RdfFormat::TriG).unwrap();
        assert_eq!(names, vec!["http://g.example/a", "http://g.example/b"]);
    }
}
