//! Client library for publishing linked-data graphs to a remote triple
//! store.
//!
//! The pieces compose bottom-up: [`transport::Transport`] carries the HTTP
//! contract, [`admin::AdminClient`] administers datasets/graphs/services,
//! [`upload::UploadClient`] drives the resumable upload job lifecycle,
//! [`pagination`] + [`query`] fetch query results page-by-page, and
//! [`replace::GraphReplacer`] orchestrates the whole "replace these graphs
//! and make them queryable" workflow. All operations are synchronous and
//! blocking; polling loops are bounded by retry count, not elapsed time.

pub mod admin;
pub mod config;
pub mod errors;
pub mod models;
pub mod pagination;
pub mod query;
pub mod replace;
pub mod transport;
pub mod tus;
pub mod upload;

pub use admin::AdminClient;
pub use config::{DatasetMapping, PollPolicy, RegistryConfig};
pub use errors::{NotFoundError, TimeoutError, TransportError, ValidationError};
pub use models::{AccessLevel, Dataset, Graph, Job, QueryOptions, ServiceType, SparqlService};
pub use query::{QueryClient, QueryExporter};
pub use replace::{GraphReplacer, ReplaceReport};
pub use transport::Transport;
pub use upload::UploadClient;

/// Initializes logging for the ldsync library.
///
/// Checks for the `LDSYNC_LOG` environment variable and, when set, copies it
/// into `RUST_LOG` so it takes precedence. The logger itself (e.g.
/// `env_logger::init()`) must be initialized after calling this.
pub fn init_logging() {
    if let Ok(log_level) = std::env::var("LDSYNC_LOG") {
        std::env::set_var("RUST_LOG", log_level);
    }
}
