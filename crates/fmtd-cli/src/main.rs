//! # fmtd CLI Entry Point
//!
//! Main binary for the fmtd distributed formatting service.
//!
//! ## Usage
//!
//! ```bash
//! # Start a worker that registers itself in etcd and serves transform jobs
//! fmtd worker -b 0.0.0.0:54321 --advertise 10.0.0.5 --etcd-host localhost
//!
//! # Format a file through whichever worker the directory turns up
//! fmtd submit main.rs --etcd-host localhost
//!
//! # Or feed stdin (outputs the raw JSON result, pipeable to jq)
//! cat main.rs | fmtd submit
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use argh::FromArgs;

use fmtd_directory::{Directory, EtcdDirectory};

/// Top-level CLI, dispatching to one of the subcommands.
#[derive(FromArgs)]
/// fmtd - distributed source formatting service
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Worker(WorkerArgs),
    Submit(SubmitArgs),
}

/// Arguments for running a worker.
///
/// A worker binds a TCP server for transform jobs, registers its advertised
/// address in the directory under a random name, and keeps refreshing that
/// registration until the process dies.
#[derive(FromArgs)]
#[argh(subcommand, name = "worker")]
/// start a fmtd worker
struct WorkerArgs {
    /// address to bind the job server to (port 0 picks a free port)
    #[argh(option, short = 'b', default = "\"0.0.0.0:54321\".into()")]
    bind: String,

    /// host name other machines use to reach this worker
    #[argh(option, default = "\"localhost\".into()")]
    advertise: String,

    /// etcd host name
    #[argh(option, long = "etcd-host", default = "\"localhost\".into()")]
    etcd_host: String,

    /// etcd port
    #[argh(option, long = "etcd-port", default = "4001")]
    etcd_port: u16,

    /// directory namespace the worker registers under
    #[argh(option, default = "fmtd_directory::DEFAULT_NAMESPACE.into()")]
    namespace: String,

    /// announcement period in seconds (also the default lease)
    #[argh(option, default = "20")]
    period: u64,

    /// entry lease in seconds; defaults to the announcement period
    #[argh(option)]
    lease: Option<u64>,

    /// formatter binary to run per job
    #[argh(option, default = "\"rustfmt\".into()")]
    engine: String,

    /// extra argument for the formatter (repeatable)
    #[argh(option, long = "engine-arg")]
    engine_args: Vec<String>,
}

/// Arguments for submitting one file for formatting.
#[derive(FromArgs)]
#[argh(subcommand, name = "submit")]
/// submit text to be formatted by a worker
struct SubmitArgs {
    /// file to submit; reads stdin when omitted
    #[argh(positional)]
    file: Option<String>,

    /// etcd host name
    #[argh(option, long = "etcd-host", default = "\"localhost\".into()")]
    etcd_host: String,

    /// etcd port
    #[argh(option, long = "etcd-port", default = "4001")]
    etcd_port: u16,

    /// directory namespace to discover workers under
    #[argh(option, default = "fmtd_directory::DEFAULT_NAMESPACE.into()")]
    namespace: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    // Keep submit output clean for unix tool usage (piping to jq, etc.).
    if !matches!(cli.command, Commands::Submit(_)) {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    match cli.command {
        Commands::Worker(args) => run_worker(args).await,
        Commands::Submit(args) => run_submit(args).await,
    }
}

async fn run_worker(args: WorkerArgs) -> Result<()> {
    tracing::info!("starting fmtd worker");
    tracing::info!("binding to: {}", args.bind);

    let server = fmtd_common::transport::JobServer::bind(&args.bind).await?;
    let local_addr = server.local_addr()?;
    let advertised = format!("{}:{}", args.advertise, local_addr.port());
    tracing::info!("listening on {}, advertising {}", local_addr, advertised);

    let directory: Arc<dyn Directory> =
        Arc::new(EtcdDirectory::new(&args.etcd_host, args.etcd_port));

    let period = Duration::from_secs(args.period);
    let lease = Duration::from_secs(args.lease.unwrap_or(args.period));
    let config = fmtd_worker::RegistrationConfig::new(&args.namespace, advertised, period)
        .with_lease(lease);
    let agent = fmtd_worker::RegistrationAgent::new(directory, config).await?;
    tracing::info!("registered as {}", agent.name());

    // Runs for process lifetime; a lost refresh self-heals on the next tick.
    let _announcer = agent.spawn();

    let engine = fmtd_worker::FormatEngine::new(&args.engine).with_args(args.engine_args);
    tracing::info!("formatting with: {}", args.engine);

    let worker = Arc::new(fmtd_worker::Worker::new(engine));
    server
        .run_with_handler(move |request| {
            let worker = worker.clone();
            async move { worker.handle(request).await }
        })
        .await?;

    Ok(())
}

async fn run_submit(args: SubmitArgs) -> Result<()> {
    let body = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path, e))?,
        None => {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let directory: Arc<dyn Directory> =
        Arc::new(EtcdDirectory::new(&args.etcd_host, args.etcd_port));
    let dispatcher = fmtd_dispatch::Dispatcher::new(directory, args.namespace);

    let result = dispatcher.handle_submission(&body).await;
    println!("{}", serde_json::to_string(&result)?);

    Ok(())
}
