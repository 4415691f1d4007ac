//! Catalog daemon - product service with a transactional outbox relay.

mod app;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use catalog_config_and_utils::{init_logging, Config, Paths};

/// Catalog daemon command-line interface.
#[derive(Parser)]
#[command(name = "catalogd")]
#[command(about = "Product catalog service with transactional outbox")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, databases, logs). Defaults to ~/.catalog
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay and retention sweeper until Ctrl-C
    Serve,
    /// Run a single relay pass and print its report
    Relay,
    /// Delete processed outbox records past the retention window
    Sweep {
        /// Override the configured retention window
        #[arg(long)]
        older_than_days: Option<u32>,
    },
    /// Manage products
    #[command(subcommand)]
    Product(ProductCommand),
    /// Inspect the outbox
    #[command(subcommand)]
    Outbox(OutboxCommand),
}

#[derive(Subcommand)]
enum ProductCommand {
    /// Create a product
    Create(CreateArgs),
    /// Show a product
    Get { id: String },
    /// Update fields of a product
    Update(UpdateArgs),
    /// Delete a product
    Delete { id: String },
}

#[derive(Subcommand)]
enum OutboxCommand {
    /// List unprocessed outbox records, oldest first
    Pending {
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    sku: String,
    /// Decimal price, e.g. 12.50
    #[arg(long)]
    price: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    /// Repeatable
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Repeatable key=value
    #[arg(long = "spec")]
    specs: Vec<String>,
    #[arg(long)]
    created_by: Option<String>,
}

#[derive(Args)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    brand: Option<String>,
    /// Replaces all tags when given. Repeatable
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Replaces all specifications when given. Repeatable key=value
    #[arg(long = "spec")]
    specs: Vec<String>,
    /// Reject the update if the stored version differs
    #[arg(long)]
    expected_version: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let log_level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&log_level);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => app::run_server(config, paths).await?,
        Commands::Relay => app::run_relay_once(config, paths).await?,
        Commands::Sweep { older_than_days } => {
            app::run_sweep(config, paths, older_than_days).await?
        }
        Commands::Product(cmd) => {
            let state = app::CatalogState::open(config, paths).await?;
            let result = match cmd {
                ProductCommand::Create(args) => match app::create_request(args.into()) {
                    Ok(request) => app::print_json(&state.service.create(request).await),
                    Err(e) => app::print_json::<()>(&Err(e)),
                },
                ProductCommand::Get { id } => app::print_json(&state.service.read(&id).await),
                ProductCommand::Update(args) => {
                    let id = args.id.clone();
                    match app::update_request(args.into()) {
                        Ok(request) => {
                            app::print_json(&state.service.update(&id, request).await)
                        }
                        Err(e) => app::print_json::<()>(&Err(e)),
                    }
                }
                ProductCommand::Delete { id } => {
                    app::print_json(&state.service.delete(&id).await)
                }
            };
            state.close().await;
            if let Err(code) = result {
                std::process::exit(code);
            }
        }
        Commands::Outbox(OutboxCommand::Pending { limit }) => {
            app::list_pending(config, paths, limit).await?
        }
    }

    Ok(())
}

impl From<CreateArgs> for app::ProductFields {
    fn from(args: CreateArgs) -> Self {
        app::ProductFields {
            name: Some(args.name),
            sku: Some(args.sku),
            price: Some(args.price),
            description: args.description,
            category: args.category,
            brand: args.brand,
            tags: args.tags,
            specs: args.specs,
            created_by: args.created_by,
            expected_version: None,
        }
    }
}

impl From<UpdateArgs> for app::ProductFields {
    fn from(args: UpdateArgs) -> Self {
        app::ProductFields {
            name: args.name,
            sku: args.sku,
            price: args.price,
            description: args.description,
            category: args.category,
            brand: args.brand,
            tags: args.tags,
            specs: args.specs,
            created_by: None,
            expected_version: args.expected_version,
        }
    }
}
