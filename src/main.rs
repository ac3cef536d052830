use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};

use kubemcp_helm::HelmClient;
use kubemcp_k8s::{ConnectionEnv, KubeClient};

mod server;

use server::KubemcpServer;

/// Kubemcp - An MCP server exposing Kubernetes and Helm operations as tools
#[derive(Parser, Debug)]
#[command(name = "kubemcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transport to serve on
    #[arg(long, env = "SERVER_MODE", value_enum, default_value_t = Mode::Stdio)]
    mode: Mode,

    /// Port for the HTTP transport
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    port: u16,

    /// Path to a kubeconfig file (defaults to $KUBECONFIG or ~/.kube/config)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Expose only non-mutating tools
    #[arg(long)]
    read_only: bool,

    /// Disable the Kubernetes tool group
    #[arg(long)]
    no_k8s: bool,

    /// Disable the Helm tool group
    #[arg(long)]
    no_helm: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Stdio,
    StreamableHttp,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Log to stderr; stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run_server(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_server(args: Args) -> Result<()> {
    if args.no_k8s && args.no_helm {
        anyhow::bail!("--no-k8s and --no-helm cannot both be set: no tools would be left");
    }

    let k8s = if args.no_k8s {
        None
    } else {
        let env = ConnectionEnv::from_process();
        let client = KubeClient::connect(&env, args.kubeconfig.as_deref()).await?;
        Some(Arc::new(client))
    };

    let helm = if args.no_helm {
        None
    } else {
        Some(Arc::new(HelmClient::new(args.kubeconfig.clone())))
    };

    let server = KubemcpServer::new(k8s, helm, args.read_only);

    match args.mode {
        Mode::Stdio => {
            tracing::info!("serving on stdio");
            let service = server.serve(stdio()).await?;
            service.waiting().await?;
        }
        Mode::StreamableHttp => {
            let service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );
            let router = axum::Router::new().nest_service("/mcp", service);
            let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
            tracing::info!(port = args.port, "serving streamable HTTP at /mcp");
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
    }

    Ok(())
}
