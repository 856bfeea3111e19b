use anyhow::{Context, Result};
use clap::Parser;
use meup_client::{
    Api, ApiVersion, Client, ClientConfig, Credentials, IdType, ResultPager,
};
use serde_json::Value;
use std::path::PathBuf;

/// meup - command line client for the marketplace seller API
///
/// Credentials are read from MEUP_CLIENT_ID / MEUP_CLIENT_SECRET when not
/// given as flags. Results are printed as JSON.
///
/// Examples:
///   meup orders list --all          # Every order awaiting preparation
///   meup products show 2059         # Product by SKU
///   meup --cache brands list        # Conditional requests against the cache
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OAuth client id
    #[arg(
        long = "client-id",
        env = "MEUP_CLIENT_ID",
        hide_env_values = true,
        global = true
    )]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(
        long = "client-secret",
        env = "MEUP_CLIENT_SECRET",
        hide_env_values = true,
        global = true
    )]
    client_secret: Option<String>,

    /// API base URL (defaults to https://api.florianajir.com)
    #[arg(long = "base-url", env = "MEUP_BASE_URL", value_name = "URL", global = true)]
    base_url: Option<String>,

    /// API version: latest or 1.0
    #[arg(long = "api-version", value_name = "VERSION", default_value = "latest", global = true)]
    api_version: String,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<u64>,

    /// Cache GET responses (in DIR, or the user cache directory)
    #[arg(
        long,
        env = "MEUP_CACHE_DIR",
        value_name = "DIR",
        num_args = 0..=1,
        global = true
    )]
    cache: Option<Option<PathBuf>>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Orders awaiting preparation
    #[command(subcommand)]
    Orders(OrderCommand),
    /// Product catalog and stock
    #[command(subcommand)]
    Products(ProductCommand),
    /// Brands and their products
    #[command(subcommand)]
    Brands(BrandCommand),
    /// After-sales reasons
    Reasons,
    /// Supported API groups and versions
    Apis,
}

#[derive(clap::Subcommand, Debug)]
enum OrderCommand {
    /// List orders
    List {
        /// Follow pagination and print every item
        #[arg(long)]
        all: bool,
        /// Query parameter, repeatable
        #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
    /// Show one order
    Show { id: String },
    /// Generate the parcel label of an order
    Label { id: String },
    /// Mark an order as shipped
    Expediate { id: String },
}

#[derive(clap::Subcommand, Debug)]
enum ProductCommand {
    /// Show one product
    Show {
        identifier: String,
        #[arg(long, value_enum, default_value_t = IdKind::Sku)]
        by: IdKind,
    },
    /// Remove units from the stock
    Destock {
        identifier: String,
        quantity: i64,
        #[arg(long, value_enum, default_value_t = IdKind::Sku)]
        by: IdKind,
    },
    /// Set the stock
    SetQuantity {
        identifier: String,
        quantity: i64,
        #[arg(long, value_enum, default_value_t = IdKind::Sku)]
        by: IdKind,
    },
    /// Set the stock alert threshold
    SetWarning {
        identifier: String,
        quantity: i64,
        #[arg(long, value_enum, default_value_t = IdKind::Sku)]
        by: IdKind,
    },
}

#[derive(clap::Subcommand, Debug)]
enum BrandCommand {
    /// List brands
    List {
        /// Follow pagination and print every item
        #[arg(long)]
        all: bool,
    },
    /// Products of a brand
    Products { brand_id: String },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum IdKind {
    Sku,
    Ean,
    Reference,
}

impl From<IdKind> for IdType {
    fn from(kind: IdKind) -> Self {
        match kind {
            IdKind::Sku => IdType::Sku,
            IdKind::Ean => IdType::Ean,
            IdKind::Reference => IdType::Reference,
        }
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid KEY=VALUE: no `=` found in `{}`", s)),
    }
}

impl Cli {
    fn config(&self) -> Result<ClientConfig> {
        let version: ApiVersion = self
            .api_version
            .parse()
            .with_context(|| format!("Unsupported API version {}", self.api_version))?;

        let mut config = ClientConfig::new().with_api_version(version);
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        match &self.cache {
            Some(Some(dir)) => config = config.with_cache_dir(dir.clone()),
            Some(None) => {
                let dir = dirs::cache_dir()
                    .context("Could not determine the user cache directory")?
                    .join("meup");
                config = config.with_cache_dir(dir);
            }
            None => {}
        }
        Ok(config)
    }

    fn client(&self) -> Result<Client> {
        let credentials = Credentials::new(
            self.client_id.clone().unwrap_or_default(),
            self.client_secret.clone().unwrap_or_default(),
        )
        .context("Set --client-id/--client-secret or MEUP_CLIENT_ID/MEUP_CLIENT_SECRET")?;

        Client::with_config(credentials, self.config()?).context("Failed to build API client")
    }
}

fn api_summary() -> Value {
    serde_json::json!({
        "apis": Client::api_list().iter().map(Api::as_str).collect::<Vec<_>>(),
        "versions": Client::supported_api_versions()
            .iter()
            .map(ApiVersion::as_str)
            .collect::<Vec<_>>(),
    })
}

async fn run(cli: Cli) -> Result<Value> {
    // Listing APIs needs no credentials.
    let client = match cli.command {
        Commands::Apis => return Ok(api_summary()),
        _ => cli.client()?,
    };

    let value = match cli.command {
        Commands::Orders(command) => match command {
            OrderCommand::List { all, params } => {
                let params: Vec<(&str, &str)> = params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                if all {
                    let mut pager = ResultPager::new(&client);
                    Value::Array(pager.fetch_all(client.orders().all(&params)).await?)
                } else {
                    client.orders().all(&params).await?
                }
            }
            OrderCommand::Show { id } => client
                .orders()
                .find(&id)
                .await
                .with_context(|| format!("Failed to fetch order {}", id))?,
            OrderCommand::Label { id } => client.orders().parcel_label(&id).await?,
            OrderCommand::Expediate { id } => client
                .orders()
                .expediate(&id)
                .await
                .with_context(|| format!("Failed to expediate order {}", id))?,
        },
        Commands::Products(command) => {
            let products = client.products();
            match command {
                ProductCommand::Show { identifier, by } => products
                    .find(by.into(), &identifier)
                    .await
                    .with_context(|| format!("Failed to fetch product {}", identifier))?,
                ProductCommand::Destock {
                    identifier,
                    quantity,
                    by,
                } => products.destock(by.into(), &identifier, quantity).await?,
                ProductCommand::SetQuantity {
                    identifier,
                    quantity,
                    by,
                } => {
                    products
                        .update_quantity(by.into(), &identifier, quantity)
                        .await?
                }
                ProductCommand::SetWarning {
                    identifier,
                    quantity,
                    by,
                } => {
                    products
                        .update_warning_quantity(by.into(), &identifier, quantity)
                        .await?
                }
            }
        }
        Commands::Brands(command) => match command {
            BrandCommand::List { all } => {
                if all {
                    let mut pager = ResultPager::new(&client);
                    Value::Array(pager.fetch_all(client.brands().all()).await?)
                } else {
                    client.brands().all().await?
                }
            }
            BrandCommand::Products { brand_id } => client.brands().products(&brand_id).await?,
        },
        Commands::Reasons => client.reasons().all().await?,
        Commands::Apis => api_summary(),
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let value = run(cli).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
