use pixgateway::{config::GatewayConfig, forwarder::PixForwarder, server::run_server};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let forwarder = PixForwarder::builder()
        .with_config(GatewayConfig::read_config_with_defaults())
        .build()?;

    run_server(forwarder).await
}
