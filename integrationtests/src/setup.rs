use std::net::SocketAddr;

use pixgateway::{
    config::{ApiToken, FrontendConfig, UpstreamConfig},
    forwarder::PixForwarder,
    server,
};
use url::Url;

pub const API_TOKEN: &str = "47524|itests-token";

/// Starts the gateway on an ephemeral local port and returns its address.
pub async fn start_gateway(upstream_url: Url, api_token: Option<&str>) -> anyhow::Result<SocketAddr> {
    let forwarder = PixForwarder::builder()
        .with_api_token(api_token.and_then(ApiToken::new))
        .with_upstream(Some(UpstreamConfig {
            timeout_secs: 5,
            ..UpstreamConfig::new(upstream_url)
        }))
        .with_frontend(Some(FrontendConfig {
            dist_dir: "itests-no-dist".into(),
            public_dir: "itests-no-public".into(),
        }))
        .build()?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = server::serve(listener, forwarder).await {
            eprintln!("gateway stopped: {err}");
        }
    });
    Ok(addr)
}
