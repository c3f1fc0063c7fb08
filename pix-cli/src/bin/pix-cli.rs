use std::path::PathBuf;

use clap::Parser;
use console::{style, Term};
use pix_core::primitives::PostPixRequest;
use pixcli::cli::{render_qr, save_charge_files};
use pixgateway::{
    config::{ApiToken, ChargeConfig, UpstreamConfig},
    error::PixGatewayError,
    forwarder::PixForwarder,
};
use serde_json::Value;

#[derive(Parser)]
#[command(version, about = "Creates a PIX charge and saves its QR code")]
struct Opts {
    /// amount in centavos, the configured default is used when omitted
    #[clap(long)]
    value: Option<u64>,

    #[clap(long)]
    webhook_url: Option<String>,

    /// directory for pix_copia_e_cola.txt and pix.png
    #[clap(long, default_value = ".")]
    out_dir: PathBuf,

    #[clap(long)]
    no_files: bool,

    #[clap(long, env = "PIX_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    #[clap(flatten)]
    upstream: UpstreamConfig,

    #[clap(flatten)]
    charge: ChargeConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Opts::parse();
    let term = Term::stdout();

    let forwarder = PixForwarder::builder()
        .with_api_token(cli.api_token.and_then(ApiToken::new))
        .with_upstream(Some(cli.upstream))
        .with_charge(Some(cli.charge))
        .build()?;

    let request = PostPixRequest {
        value: cli.value.map(Value::from),
        webhook_url: cli.webhook_url.map(Value::from),
        split_rules: None,
    };

    let charge = match forwarder.create_pix_charge(request).await {
        Ok(charge) => charge,
        Err(PixGatewayError::Upstream { status, body, .. }) => {
            let err_term = Term::stderr();
            err_term.write_line(&format!(
                "{} {}",
                style(format!("Erro ao gerar PIX ({status}):")).red(),
                String::from_utf8_lossy(&body)
            ))?;
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    term.write_line(&serde_json::to_string_pretty(&charge)?)?;

    match charge.qr_code {
        Some(ref code) => {
            term.write_line(&format!("\nPIX copia e cola:\n{}\n", style(code).cyan()))?;
            term.write_line(&render_qr(code)?)?;
        }
        None => term.write_line(&style("A resposta não contém qr_code.").yellow().to_string())?,
    }

    if !cli.no_files {
        let saved = save_charge_files(&charge, &cli.out_dir)?;
        for path in saved.code.iter().chain(saved.image.iter()) {
            term.write_line(&format!("Salvo: {}", style(path.display()).green()))?;
        }
    }

    Ok(())
}
