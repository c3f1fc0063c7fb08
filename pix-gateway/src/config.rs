use std::{
    env, fmt,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use clap::{ArgAction, Parser, ValueEnum};
use pix_core::{
    amount::Amount,
    error::PixCoreError,
    primitives::{PixChargeDefaults, DEFAULT_VALUE_CENTAVOS, DEFAULT_WEBHOOK_URL},
};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.pushinpay.com.br";
pub const DEFAULT_UPSTREAM_PATH: &str = "/api/pix/cashIn";

#[derive(Parser, Debug)]
#[command(version, about = "Forwards PIX charge requests to the payment provider")]
pub struct Opts {
    #[clap(long, env = "PIX_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
    #[clap(flatten)]
    pub server: ServerConfig,
    #[clap(flatten)]
    pub upstream: UpstreamConfig,
    #[clap(flatten)]
    pub charge: ChargeConfig,
    #[clap(flatten)]
    pub frontend: FrontendConfig,
    #[clap(flatten)]
    pub tracing: TracingConfig,
}

/// Bearer credential for the provider. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Returns `None` for blank tokens so the gateway fails closed instead of sending an empty credential.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(****)")
    }
}

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub api_token: Option<ApiToken>,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub charge: ChargeConfig,
    pub frontend: FrontendConfig,
    pub tracing: TracingConfig,
}

impl From<Opts> for GatewayConfig {
    fn from(opts: Opts) -> Self {
        Self {
            api_token: opts.api_token.and_then(ApiToken::new),
            server: opts.server,
            upstream: opts.upstream,
            charge: opts.charge,
            frontend: opts.frontend,
            tracing: opts.tracing,
        }
    }
}

impl GatewayConfig {
    pub fn read_config_with_defaults() -> Self {
        Opts::parse().into()
    }

    pub const fn has_token(&self) -> bool {
        self.api_token.is_some()
    }
}

#[derive(Debug, Clone, Parser)]
pub struct ServerConfig {
    #[clap(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED), env = "PIX_HOST")]
    pub host: IpAddr,
    #[clap(long, default_value_t = 3000, env = "PORT")]
    pub port: u16,
}

impl ServerConfig {
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Parser)]
pub struct UpstreamConfig {
    #[clap(long = "upstream-url", default_value = DEFAULT_UPSTREAM_URL, env = "PIX_UPSTREAM_URL")]
    pub url: Url,
    #[clap(long = "upstream-path", default_value = DEFAULT_UPSTREAM_PATH, env = "PIX_UPSTREAM_PATH")]
    pub path: String,
    #[clap(
        long = "upstream-timeout-secs",
        default_value_t = 20,
        value_parser = clap::value_parser!(u64).range(1..=60),
        env = "PIX_UPSTREAM_TIMEOUT_SECS"
    )]
    pub timeout_secs: u64,
    #[clap(
        long = "upstream-force-ipv4",
        default_value_t = true,
        action = ArgAction::Set,
        env = "PIX_UPSTREAM_FORCE_IPV4"
    )]
    pub force_ipv4: bool,
}

impl UpstreamConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ..Default::default()
        }
    }

    pub fn endpoint(&self) -> Result<Url, url::ParseError> {
        self.url.join(&self.path)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_UPSTREAM_URL).expect("invalid default upstream url"),
            path: DEFAULT_UPSTREAM_PATH.to_owned(),
            timeout_secs: 20,
            force_ipv4: true,
        }
    }
}

#[derive(Debug, Clone, Parser)]
pub struct ChargeConfig {
    #[clap(
        long,
        default_value_t = DEFAULT_VALUE_CENTAVOS,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "PIX_DEFAULT_VALUE"
    )]
    pub default_value: u64,
    #[clap(long, default_value = DEFAULT_WEBHOOK_URL, env = "PIX_DEFAULT_WEBHOOK_URL")]
    pub default_webhook_url: String,
}

impl ChargeConfig {
    pub fn defaults(&self) -> Result<PixChargeDefaults, PixCoreError> {
        Ok(PixChargeDefaults {
            value: Amount::new(self.default_value)?,
            webhook_url: self.default_webhook_url.clone(),
        })
    }
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            default_value: DEFAULT_VALUE_CENTAVOS,
            default_webhook_url: DEFAULT_WEBHOOK_URL.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Parser)]
pub struct FrontendConfig {
    /// build output of the front end, served when present
    #[clap(long, default_value = "dist", env = "PIX_FRONTEND_DIST_DIR")]
    pub dist_dir: PathBuf,
    #[clap(long, default_value = "public", env = "PIX_FRONTEND_PUBLIC_DIR")]
    pub public_dir: PathBuf,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dist_dir: "dist".into(),
            public_dir: "public".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Parser)]
pub struct TracingConfig {
    #[clap(long, value_enum, default_value_t = LogFormat::Text, env = "PIX_LOG_FORMAT")]
    pub log_format: LogFormat,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct BuildParams {
    pub commit_hash: Option<String>,
    pub build_time: Option<String>,
    pub cargo_pkg_version: Option<String>,
}

impl BuildParams {
    pub fn from_env() -> Self {
        Self {
            commit_hash: env::var("COMMITHASH").ok(),
            build_time: env::var("BUILDTIME").ok(),
            cargo_pkg_version: Some(env!("CARGO_PKG_VERSION").to_owned()),
        }
    }

    pub fn full_version(&self) -> String {
        format!(
            "{}-{}",
            self.cargo_pkg_version.as_deref().unwrap_or("unknown"),
            self.commit_hash.as_deref().unwrap_or("unknown")
        )
    }
}
