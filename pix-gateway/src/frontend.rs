use std::{
    fmt,
    path::{Path, PathBuf},
};

use tower_http::services::{ServeDir, ServeFile};

use crate::config::FrontendConfig;

const INDEX_HTML: &str = "index.html";

/// Front end directory picked once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendAssets {
    /// bundled build output
    Dist(PathBuf),
    /// unbundled sources, used when no build exists
    Public(PathBuf),
    None,
}

impl FrontendAssets {
    pub fn detect(config: &FrontendConfig) -> Self {
        if has_index(&config.dist_dir) {
            Self::Dist(config.dist_dir.clone())
        } else if has_index(&config.public_dir) {
            Self::Public(config.public_dir.clone())
        } else {
            Self::None
        }
    }

    pub fn root(&self) -> Option<&Path> {
        match self {
            Self::Dist(root) | Self::Public(root) => Some(root),
            Self::None => None,
        }
    }

    /// Static file service where unknown paths fall back to `index.html`.
    pub fn service(&self) -> Option<ServeDir<ServeFile>> {
        self.root()
            .map(|root| ServeDir::new(root).fallback(ServeFile::new(root.join(INDEX_HTML))))
    }
}

impl fmt::Display for FrontendAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dist(root) => write!(f, "dist ({})", root.display()),
            Self::Public(root) => write!(f, "public ({})", root.display()),
            Self::None => write!(f, "none"),
        }
    }
}

fn has_index(dir: &Path) -> bool {
    dir.join(INDEX_HTML).is_file()
}
