//! IPv4-first name resolution for the provider connection.
//!
//! The provider host is looked up restricted to IPv4 addresses first. When that lookup fails or
//! comes back empty, resolution falls back to the default dual-stack lookup instead of failing
//! the request. The resolver plugs into `reqwest` through [`reqwest::dns::Resolve`], so the
//! request URL keeps the hostname and TLS SNI and the `Host` header stay untouched.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use async_trait::async_trait;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig, ResolverOpts},
    system_conf::read_system_conf,
    TokioAsyncResolver,
};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use tracing::{debug, warn};

#[cfg(test)]
use mockall::automock;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>>;
    async fn lookup_any(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// IPv4 lookups send A queries only, through a stub resolver using the system name servers.
/// The dual-stack lookup goes through the operating system resolver.
#[derive(Clone)]
pub struct SystemLookup {
    ipv4: TokioAsyncResolver,
}

impl SystemLookup {
    pub fn new() -> Self {
        let (config, mut opts) = read_system_conf().unwrap_or_else(|err| {
            warn!("cannot read system resolver config: {}, using defaults", err);
            (ResolverConfig::default(), ResolverOpts::default())
        });
        opts.ip_strategy = LookupIpStrategy::Ipv4Only;
        Self {
            ipv4: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

impl Default for SystemLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup_ipv4(&self, host: &str) -> io::Result<Vec<Ipv4Addr>> {
        let lookup = self
            .ipv4
            .lookup_ip(host)
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        Ok(lookup
            .iter()
            .filter_map(|ip| match ip {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect())
    }

    async fn lookup_any(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        Ok(tokio::net::lookup_host((host, 0))
            .await?
            .map(|addr| addr.ip())
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// the host resolved to IPv4 addresses
    Ipv4(Vec<Ipv4Addr>),
    /// IPv4 lookup failed, addresses come from the default lookup
    Fallback(Vec<IpAddr>),
}

impl Resolution {
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn into_addrs(self) -> Vec<IpAddr> {
        match self {
            Self::Ipv4(addrs) => addrs.into_iter().map(IpAddr::V4).collect(),
            Self::Fallback(addrs) => addrs,
        }
    }
}

pub async fn resolve_host(lookup: &dyn HostLookup, host: &str) -> io::Result<Resolution> {
    match lookup.lookup_ipv4(host).await {
        Ok(addrs) if !addrs.is_empty() => {
            debug!("resolved {} to ipv4 {:?}", host, addrs);
            return Ok(Resolution::Ipv4(addrs));
        }
        Ok(_) => warn!("no ipv4 address for {}, using default resolution", host),
        Err(err) => warn!("ipv4 lookup for {} failed: {}, using default resolution", host, err),
    }

    let addrs = lookup.lookup_any(host).await?;
    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no address found for {host}"),
        ));
    }
    Ok(Resolution::Fallback(addrs))
}

#[derive(Clone)]
pub struct Ipv4FirstResolver {
    lookup: Arc<dyn HostLookup>,
}

impl Ipv4FirstResolver {
    pub fn new(lookup: Arc<dyn HostLookup>) -> Self {
        Self { lookup }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemLookup::new()))
    }
}

impl Resolve for Ipv4FirstResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let lookup = Arc::clone(&self.lookup);
        Box::pin(async move {
            let resolution = resolve_host(lookup.as_ref(), name.as_str()).await?;
            // port 0 is replaced by the connector with the port of the request url
            let addrs: Addrs = Box::new(
                resolution
                    .into_addrs()
                    .into_iter()
                    .map(|ip| SocketAddr::new(ip, 0)),
            );
            Ok::<_, BoxError>(addrs)
        })
    }
}
