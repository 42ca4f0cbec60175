//! exposer - serve a plain function as a JSON-over-HTTP endpoint

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exposer::{
    expose, expose_post, Config, DecodeMode, Exposed, ListenerState, Method, MethodSet,
};

#[derive(Parser)]
#[command(name = "exposer")]
#[command(about = "Serve a plain function as a JSON-over-HTTP endpoint")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./exposer.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expose an echo function until ctrl-c
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host name or address to bind
        #[arg(long)]
        hostname: Option<String>,

        /// Route of the endpoint
        #[arg(long)]
        route: Option<String>,

        /// Method to answer, repeatable (default: server.methods from config)
        #[arg(short, long = "method")]
        methods: Vec<Method>,

        /// Decode the request body once instead of twice
        #[arg(long)]
        single_decode: bool,
    },

    /// Expose an order summary function and call it once over HTTP
    Demo {
        /// Port to listen on (default: server.port from config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Order {
    id: u64,
    customer: String,
    quantity: u32,
    price: f64,
}

#[derive(Debug, Serialize)]
struct OrderSummary {
    id: u64,
    customer: String,
    total: f64,
}

fn summarize(order: Order) -> OrderSummary {
    OrderSummary {
        id: order.id,
        customer: order.customer,
        total: order.price * f64::from(order.quantity),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment
    let _ = dotenvy::dotenv();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Initialize logging
    let default_filter = if cli.verbose {
        "exposer=debug,tower_http=debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve {
            port,
            hostname,
            route,
            methods,
            single_decode,
        } => {
            let mut options = config.expose_options().shutdown_on_ctrl_c(false);
            if let Some(port) = port {
                options = options.port(port);
            }
            if let Some(hostname) = hostname {
                options = options.hostname(hostname);
            }
            if let Some(route) = route {
                options = options.route(route);
            }
            if single_decode {
                options = options.decode(DecodeMode::Single);
            }

            let methods = if methods.is_empty() {
                config.methods()
            } else {
                methods.into_iter().collect::<MethodSet>()
            };

            let exposed = expose(|payload: Value| payload, methods, options)?;
            let addr = exposed.listener().wait_listening().await?;
            tracing::info!(%addr, "Echo endpoint ready, press ctrl-c to stop");

            tokio::signal::ctrl_c().await?;
            exposed.listener().stop();

            if let ListenerState::Failed { reason } = exposed.listener().stopped().await {
                anyhow::bail!("listener failed: {}", reason);
            }
        }

        Commands::Demo { port } => {
            let mut options = config.expose_options();
            if let Some(port) = port {
                options = options.port(port);
            }
            let decode = options.decode;

            let exposed = expose_post(summarize, options)?;
            let outcome = run_demo(&exposed, decode).await;

            exposed.listener().stop();
            exposed.listener().stopped().await;
            outcome?;
        }
    }

    Ok(())
}

/// Send the sample order to the exposed summary function and print the reply
async fn run_demo(exposed: &Exposed, decode: DecodeMode) -> anyhow::Result<()> {
    exposed.listener().wait_listening().await?;
    let url = exposed
        .listener()
        .url()
        .context("listener stopped before the request")?;

    let order = Order {
        id: 78912,
        customer: "Jason Sweet".into(),
        quantity: 1,
        price: 18.00,
    };
    println!("{:?}", order);

    // Literal decoding expects the order as a JSON-encoded string
    let body = match decode {
        DecodeMode::Literal => Value::String(serde_json::to_string(&order)?),
        DecodeMode::Single => serde_json::to_value(&order)?,
    };

    let response = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    let text = response.text().await?;
    let json = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
    println!("Status Code: {}, Response: {}", status.as_u16(), json);

    Ok(())
}
