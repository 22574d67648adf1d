//! CLI for the tgzfetch offline-package mirroring tool.

mod run;

use anyhow::Result;
use clap::Parser;
use tgzfetch_core::config;
use tgzfetch_core::registry::Registry;

/// Top-level CLI: positional package specifiers plus registry/auth flags.
#[derive(Debug, Parser)]
#[command(name = "tgzfetch")]
#[command(about = "Mirror npm package tarballs into ./tgz for offline installation", long_about = None)]
pub struct Cli {
    /// Package specifiers (`name@version`, repeatable), or `package.json`
    /// to walk the manifest's dependencies. With no specifiers, all
    /// dependencies from ./package-lock.json are downloaded.
    pub pkgs: Vec<String>,

    /// Download from the npm registry (default).
    #[arg(short = 'n', long)]
    pub npm: bool,

    /// Download from the cnpm registry.
    #[arg(short = 'c', long)]
    pub cnpm: bool,

    /// Download from the yarn registry.
    #[arg(short = 'y', long)]
    pub yarn: bool,

    /// Download from the taobao mirror registry.
    #[arg(short = 't', long)]
    pub taobao: bool,

    /// Login token, required when downloading from a private registry that
    /// needs authentication (sent as a Basic credential).
    #[arg(short = 'k', long, value_name = "TOKEN")]
    pub token: Option<String>,
}

impl Cli {
    /// Selected registry. Flag precedence: cnpm, yarn, taobao, then npm.
    pub fn registry(&self) -> Registry {
        if self.cnpm {
            Registry::Cnpm
        } else if self.yarn {
            Registry::Yarn
        } else if self.taobao {
            Registry::Taobao
        } else {
            Registry::Npm
        }
    }
}

pub async fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg);
    run::run(cli, cfg).await
}

#[cfg(test)]
mod tests;
