use anyhow::Result;
use clap::{Parser, Subcommand};
use ldsync::config::RegistryConfig;
use ldsync::models::QueryOptions;
use ldsync::{AdminClient, GraphReplacer, QueryClient, QueryExporter, ServiceType, Transport};
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ldsync")]
#[command(about = "Publish linked-data graphs to a remote triple store")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to the registry configuration file
    #[clap(long, short, default_value = "ldsync.json", global = true)]
    config: PathBuf,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the organization's datasets
    Datasets,
    /// List the graphs of a dataset
    Graphs {
        /// Dataset name
        dataset: String,
    },
    /// List the query services of a dataset
    Services {
        /// Dataset name
        dataset: String,
    },
    /// Rename a graph, resolving the old name against the current listing
    RenameGraph {
        dataset: String,
        old_name: String,
        new_name: String,
    },
    /// Delete a graph by name
    DeleteGraph {
        dataset: String,
        name: String,
    },
    /// Delete a query service by name
    DeleteService {
        dataset: String,
        name: String,
    },
    /// Create a query service and wait until it is running
    CreateService {
        dataset: String,
        name: String,
    },
    /// Execute a paginated query and print each page to stdout
    Query {
        dataset: String,
        /// File holding the SPARQL query
        query_file: PathBuf,
        /// Accept header override
        #[clap(long)]
        accept: Option<String>,
    },
    /// Drain a query against an endpoint and print the reassembled document
    Export {
        /// SPARQL endpoint URL
        endpoint: String,
        /// File holding the SPARQL query
        query_file: PathBuf,
        /// Negotiated result format
        #[clap(long, default_value = "application/ld+json")]
        accept: String,
        /// Write the document here instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace the graphs declared by a payload and resync the query service
    Replace {
        /// Logical profile identifier configured in the registry file
        profile: String,
        /// File holding the payload
        file: PathBuf,
        /// Media type of the payload
        #[clap(long, default_value = "application/trig")]
        content_type: String,
    },
}

fn admin_for(config: &RegistryConfig, dataset: &str) -> Result<AdminClient> {
    let transport = Transport::new(config.base_url.clone(), config.token.clone())?;
    Ok(AdminClient::new(transport, &config.org, dataset).with_poll_policy(config.service_poll))
}

fn main() -> Result<()> {
    let cmd = Cli::parse();

    ldsync::init_logging();
    let log_level = if cmd.verbose { "info" } else { "warn" };
    let log_level = if cmd.debug { "debug" } else { log_level };
    std::env::set_var("RUST_LOG", log_level);
    env_logger::init();

    let config = RegistryConfig::from_file(&cmd.config)?;

    match cmd.command {
        Commands::Datasets => {
            let admin = admin_for(&config, "")?;
            for dataset in admin.list_datasets()? {
                println!(
                    "{} ({}, {} graphs, {} statements)",
                    dataset.name, dataset.access_level, dataset.graph_count, dataset.statements
                );
            }
        }
        Commands::Graphs { dataset } => {
            let admin = admin_for(&config, &dataset)?;
            for graph in admin.list_graphs()? {
                println!("{} ({} statements)", graph.graph_name, graph.number_of_statements);
            }
        }
        Commands::Services { dataset } => {
            let admin = admin_for(&config, &dataset)?;
            for service in admin.list_services()? {
                println!(
                    "{} [{}] {} ({})",
                    service.name, service.service_type, service.endpoint, service.status
                );
            }
        }
        Commands::RenameGraph {
            dataset,
            old_name,
            new_name,
        } => {
            let admin = admin_for(&config, &dataset)?;
            let graph = admin.rename_graph_by_name(&old_name, &new_name)?;
            println!("renamed to {}", graph.graph_name);
        }
        Commands::DeleteGraph { dataset, name } => {
            let admin = admin_for(&config, &dataset)?;
            admin.delete_graph_by_name(&name)?;
            println!("deleted {name}");
        }
        Commands::DeleteService { dataset, name } => {
            let admin = admin_for(&config, &dataset)?;
            admin.delete_service(&name)?;
            println!("deleted {name}");
        }
        Commands::CreateService { dataset, name } => {
            let admin = admin_for(&config, &dataset)?;
            let service = admin.create_service_and_wait(&name, ServiceType::Virtuoso)?;
            println!("{} running at {}", service.name, service.endpoint);
        }
        Commands::Query {
            dataset,
            query_file,
            accept,
        } => {
            let query = fs::read_to_string(&query_file)?;
            let transport = Transport::new(config.base_url.clone(), config.token.clone())?;
            let admin = admin_for(&config, &dataset)?;
            let client = QueryClient::new(transport, admin);
            let options = QueryOptions {
                accept,
                service: None,
            };
            let pages = client.execute_query(&query, Some(&options))?;
            info!("received {} page(s)", pages.len());
            for page in pages {
                println!("{page}");
            }
        }
        Commands::Export {
            endpoint,
            query_file,
            accept,
            output,
        } => {
            let query = fs::read_to_string(&query_file)?;
            let transport = Transport::new(config.base_url.clone(), config.token.clone())?;
            let exporter = QueryExporter::new(transport, endpoint, accept);
            let document = exporter.export(&query)?;
            match output {
                Some(path) => fs::write(path, document)?,
                None => println!("{document}"),
            }
        }
        Commands::Replace {
            profile,
            file,
            content_type,
        } => {
            let content = fs::read_to_string(&file)?;
            let replacer = GraphReplacer::new(config)?;
            let report = replacer.replace_graphs(&profile, &content, &content_type)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
