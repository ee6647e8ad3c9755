//! # TinyRPC CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Start a server with the built-in functions
//! tinyrpc serve -p 3000
//!
//! # Resolve a function
//! tinyrpc find 127.0.0.1 3000 double
//!
//! # Call a function (outputs one JSON line)
//! tinyrpc call 127.0.0.1 3000 double -i 21
//! tinyrpc call 127.0.0.1 3000 reverse -d hello
//! ```

use anyhow::Result;
use argh::FromArgs;
use std::time::Duration;
use tinyrpc_cli::{builtins, CallOutput};
use tinyrpc_client::RpcClient;
use tinyrpc_common::RpcPayload;
use tinyrpc_server::{RpcServer, ServerConfig};

/// Main CLI structure parsed from command-line arguments.
#[derive(FromArgs)]
/// TinyRPC - a minimal RPC server and client
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

/// Available CLI subcommands.
///
/// - **Serve**: Run a server exposing the built-in functions
/// - **Find**: Resolve a function name on a server
/// - **Call**: Resolve and invoke a function (unix-friendly JSON output)
#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Find(FindArgs),
    Call(CallArgs),
}

/// Arguments for starting a server.
///
/// # Example
///
/// ```bash
/// tinyrpc serve -p 3000 --io-timeout-ms 5000 --max-connections 64
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start a TinyRPC server with the built-in functions
struct ServeArgs {
    /// port to listen on
    ///
    /// The server binds the IPv6 wildcard address (dual-stack) and falls
    /// back to 0.0.0.0 when IPv6 is unavailable. Use 0 for an ephemeral port.
    #[argh(option, short = 'p', default = "3000")]
    port: u16,

    /// per-connection read/write timeout in milliseconds
    ///
    /// Defaults to 30000ms. Must be between 1 and 3600000 (1 hour).
    #[argh(option, long = "io-timeout-ms", default = "30000")]
    io_timeout_ms: u64,

    /// maximum number of connections served at once
    ///
    /// Connections beyond the limit are closed immediately.
    #[argh(option, long = "max-connections", default = "tinyrpc_server::config::DEFAULT_MAX_CONNECTIONS")]
    max_connections: usize,
}

/// Arguments for resolving a function.
#[derive(FromArgs)]
#[argh(subcommand, name = "find")]
/// resolve a function on a TinyRPC server
struct FindArgs {
    /// IPv4 or IPv6 address of the server
    #[argh(positional)]
    address: String,

    /// port of the server
    #[argh(positional)]
    port: u16,

    /// name of the function
    #[argh(positional)]
    name: String,
}

/// Arguments for making a single call.
///
/// # Output Format
///
/// Outputs one JSON object to stdout. Errors are reported to stderr with
/// a non-zero exit code.
///
/// ```bash
/// tinyrpc call 127.0.0.1 3000 length -d hello | jq '.integer'
/// ```
#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// call a function on a TinyRPC server
struct CallArgs {
    /// IPv4 or IPv6 address of the server
    #[argh(positional)]
    address: String,

    /// port of the server
    #[argh(positional)]
    port: u16,

    /// name of the function
    #[argh(positional)]
    name: String,

    /// integer argument
    #[argh(option, short = 'i', default = "0")]
    integer: i64,

    /// byte argument, taken as UTF-8 text
    #[argh(option, short = 'd', default = "String::new()")]
    data: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // find and call keep stdout clean for piping
    if matches!(cli.command, Commands::Serve(_)) {
        // Set default log level to INFO, but allow RUST_LOG env var to override
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Find(args) => run_find(args).await,
        Commands::Call(args) => run_call(args).await,
    }
}

/// Executes the `serve` subcommand.
///
/// Runs until Ctrl-C, then stops accepting and returns.
async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::new()
        .with_io_timeout(Some(Duration::from_millis(args.io_timeout_ms)))
        .with_max_connections(args.max_connections);

    let server = RpcServer::init(args.port).await?.with_config(config)?;
    builtins::register_builtins(server.registry())?;

    tracing::info!("Serving on {}", server.local_addr()?);
    tracing::info!("Functions: {}", server.registry().names().join(", "));

    let handle = server.handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
        handle.stop();
    });

    server.serve_all().await?;
    Ok(())
}

/// Executes the `find` subcommand, printing the resolved name.
async fn run_find(args: FindArgs) -> Result<()> {
    let client = RpcClient::new(&args.address, args.port)?;
    let handle = client.find(&args.name).await?;
    println!("{}", handle.name());
    client.close();
    Ok(())
}

/// Executes the `call` subcommand.
///
/// Resolves the function, invokes it once and prints the result as a
/// single JSON line.
async fn run_call(args: CallArgs) -> Result<()> {
    let client = RpcClient::new(&args.address, args.port)?;
    let handle = client.find(&args.name).await?;

    let payload = RpcPayload::new(args.integer, args.data.into_bytes());
    let result = client.call(&handle, &payload).await?;

    println!("{}", serde_json::to_string(&CallOutput::from(&result))?);
    client.close();
    Ok(())
}
