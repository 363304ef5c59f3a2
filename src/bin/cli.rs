//! CLI tool for operating a running remote service.
//!
//! # Examples
//!
//! List the requests awaiting a decision:
//! ```sh
//! remote-cli pending --rpc-url http://localhost:9119
//! ```
//!
//! Approve one of them:
//! ```sh
//! remote-cli respond 3 --rpc-url http://localhost:9119
//! ```

use clap::{Parser, Subcommand};
use eyre::{Context, Result};
use jsonrpsee::http_client::HttpClientBuilder;
use remote::{
    rpc::RemoteApiClient,
    types::{Message, RequestId},
};
use serde_json::Value;

/// Main CLI structure.
#[derive(Debug, Parser)]
#[command(name = "remote-cli")]
#[command(about = "Remote CLI - Operate the dialog queue of a remote service", long_about = None)]
struct Cli {
    /// RPC URL of the remote service.
    #[arg(long, short, global = true, default_value = "http://localhost:9119")]
    rpc_url: String,
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Commands available in the CLI.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Check the health of the service
    Health,
    /// List the queued requests
    Pending,
    /// Approve a queued request
    Respond {
        /// Id of the request
        #[arg(value_parser = parse_request_id)]
        id: RequestId,
    },
    /// Reject a queued request
    Reject {
        /// Id of the request
        #[arg(value_parser = parse_request_id)]
        id: RequestId,
    },
    /// Send a request as the in-process requester
    Request {
        /// The method to request
        method: String,
        /// Parameters as JSON
        #[arg(value_parser = parse_json)]
        params: Option<Value>,
    },
    /// Deliver a message received from the relay
    Deliver {
        /// The message as JSON
        #[arg(value_parser = parse_json)]
        message: Value,
    },
}

impl Cli {
    async fn run(self) -> Result<()> {
        let client = HttpClientBuilder::default().build(&self.rpc_url)?;

        match self.command {
            Commands::Health => print(&client.health().await?),
            Commands::Pending => {
                let pending = client.pending_requests().await?;
                if pending.is_empty() {
                    println!("No pending requests.");
                    return Ok(());
                }
                for queued in pending {
                    println!(
                        "{}\t{}\t{:?}\t{}",
                        queued.id(),
                        queued.request.method(),
                        queued.status,
                        queued.request.origin()
                    );
                }
                Ok(())
            }
            Commands::Respond { id } => print(&client.respond(id).await?),
            Commands::Reject { id } => {
                client.reject(id.clone()).await?;
                println!("Rejected request {id}.");
                Ok(())
            }
            Commands::Request { method, params } => {
                print(&client.send_request(method, params).await?)
            }
            Commands::Deliver { message } => {
                let message: Message =
                    serde_json::from_value(message).wrap_err("not a messenger message")?;
                client.deliver(message).await?;
                Ok(())
            }
        }
    }
}

fn print<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses a request id, numeric if possible.
fn parse_request_id(arg: &str) -> Result<RequestId, std::convert::Infallible> {
    Ok(arg.parse::<u64>().map(RequestId::from).unwrap_or_else(|_| RequestId::from(arg)))
}

/// Parses a JSON argument.
fn parse_json(arg: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(arg)
}

#[tokio::main]
async fn main() {
    if let Err(err) = Cli::parse().run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
