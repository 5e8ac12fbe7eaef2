//! AdScout - Creative Discovery Engine
//!
//! AdScout indexes ad creatives across formats and networks and exposes a
//! filtering, pagination, and recommendation API over them.

use clap::{Parser, Subcommand};
use tracing::info;

use adscout_core::Result;
use adscout_serve::ServerBuilder;

#[derive(Parser)]
#[command(name = "adscout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AdScout Creative Discovery Engine")]
#[command(long_about = r#"
AdScout serves a discovery API over a catalog of ad creatives: keyword and
attribute filtering with strict or lenient input handling, stable pagination,
filter option catalogs with live counts, and similar-creative
recommendations.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format (json, pretty, compact)
    #[arg(short, long, default_value = "compact", global = true)]
    output: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the AdScout API server
    Serve {
        /// Server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Server port
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Disable CORS headers
        #[arg(long)]
        no_cors: bool,

        /// Start with an empty store instead of demo data
        #[arg(long)]
        no_demo_data: bool,
    },

    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    adscout_core::init_logging_with_config(level, &cli.output)?;

    run(cli).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            no_cors,
            no_demo_data,
        }) => {
            info!("Booting AdScout v{}", env!("CARGO_PKG_VERSION"));
            let server = ServerBuilder::new()
                .host(host)
                .port(port)
                .cors(!no_cors)
                .seed_demo(!no_demo_data)
                .build()
                .await?;
            server.start().await
        }
        Some(Commands::Version) | None => {
            println!("{}", adscout_core::version_info());
            Ok(())
        }
    }
}
