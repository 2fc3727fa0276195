//! Demo server: the order API behind the request-logging interceptor.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracklog_core::DEFAULT_TRACKING_HEADER;
use tracklog_server::interceptor::DEFAULT_API_KEY_PARAM;
use tracklog_server::{
    init_tracing, LogFormat, NetworkConfig, NetworkModule, RequestLogConfig, TracingSink,
};

#[derive(Debug, Parser)]
#[command(name = "demo-server", version, about = "Order API with request logging")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "TRACKLOG_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on; 0 picks a free port.
    #[arg(long, env = "TRACKLOG_PORT", default_value_t = 8080)]
    port: u16,

    /// Log output format.
    #[arg(long, env = "TRACKLOG_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Header carrying the tracking id.
    #[arg(long, env = "TRACKLOG_TRACKING_HEADER", default_value = DEFAULT_TRACKING_HEADER)]
    tracking_header: String,

    /// Query parameter recorded as the API key.
    #[arg(long, env = "TRACKLOG_API_KEY_PARAM", default_value = DEFAULT_API_KEY_PARAM)]
    api_key_param: String,

    /// Additional header to mask; repeatable.
    #[arg(long = "mask-header", env = "TRACKLOG_MASK_HEADERS", value_delimiter = ',')]
    mask_headers: Vec<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "TRACKLOG_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format)?;

    let config = NetworkConfig {
        host: args.host,
        port: args.port,
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        request_log: RequestLogConfig {
            tracking_header: args.tracking_header,
            api_key_param: args.api_key_param,
            masked_headers: args.mask_headers,
            ..RequestLogConfig::default()
        },
    };

    let mut module = NetworkModule::new(config, Arc::new(TracingSink));
    let port = module.start().await?;
    info!(port, "demo server listening");

    module
        .serve(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "unable to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await
}
