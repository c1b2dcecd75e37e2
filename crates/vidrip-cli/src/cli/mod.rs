//! CLI for vidrip.

mod commands;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::collections::HashMap;
use std::path::PathBuf;
use vidrip_core::config::{self, VidripConfig};
use vidrip_core::model::ContainerType;

use commands::{
    run_checksum, run_completions, run_extract, run_fetch, run_probe, run_resolve, FetchArgs,
};

/// Top-level CLI for vidrip.
#[derive(Debug, Parser)]
#[command(name = "vidrip")]
#[command(about = "vidrip: resolve video renditions and rebuild segmented archives", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/vidrip/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Extra request header, e.g. "Cookie: session=abc". Repeatable.
    #[arg(long = "header", short = 'H', global = true, value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the renditions available for a video.
    Resolve {
        /// Video identifier.
        id: String,
        /// Observed asset URL, used if the manifest is unavailable. Repeatable.
        #[arg(long = "hint", value_name = "URL")]
        hints: Vec<String>,
    },

    /// Download one rendition and save it (archives are reassembled).
    Fetch {
        /// Video identifier.
        id: String,
        #[arg(long = "hint", value_name = "URL")]
        hints: Vec<String>,
        /// Title used for the output file name (defaults to the identifier).
        #[arg(long)]
        title: Option<String>,
        /// Rendition label, e.g. 720p. Defaults to the best video rendition.
        #[arg(long)]
        label: Option<String>,
        /// Container: tar, mp4 or audio.
        #[arg(long, value_parser = parse_container)]
        container: Option<ContainerType>,
        /// Output directory (default: current directory).
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,
        /// Replace an existing output file.
        #[arg(long)]
        overwrite: bool,
    },

    /// Probe candidate URLs derived from hint URLs, without the manifest.
    Probe {
        /// Observed asset or image URLs.
        #[arg(required = true, value_name = "URL")]
        hints: Vec<String>,
    },

    /// Rebuild a local tar archive into a single stream file.
    Extract {
        /// Path to the archive.
        archive: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "video")]
        label: String,
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,
        #[arg(long)]
        overwrite: bool,
    },

    /// Compute SHA-256 of a file (e.g. after a fetch).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },

    /// Print shell completions to stdout.
    Completions {
        shell: Shell,
    },
}

fn parse_container(s: &str) -> Result<ContainerType, String> {
    s.parse()
}

/// `"Name: value"` pairs into a header map.
pub(crate) fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for h in raw {
        let Some((name, value)) = h.split_once(':') else {
            bail!("header {:?} is not in \"Name: value\" form", h);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("header {:?} has an empty name", h);
        }
        out.insert(name.to_string(), value.trim().to_string());
    }
    Ok(out)
}

fn load_config(path: Option<&PathBuf>) -> Result<VidripConfig> {
    match path {
        Some(p) => config::load_from(p),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell);
            return Ok(());
        }
        let cfg = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config: {:?}", cfg);
        let headers = parse_headers(&cli.headers)?;

        match cli.command {
            CliCommand::Resolve { id, hints } => run_resolve(cfg, headers, &id, hints).await?,
            CliCommand::Fetch {
                id,
                hints,
                title,
                label,
                container,
                out,
                overwrite,
            } => {
                let out_dir = match out {
                    Some(d) => d,
                    None => std::env::current_dir()?,
                };
                let args = FetchArgs {
                    id,
                    hints,
                    title,
                    label,
                    container,
                    out_dir,
                    overwrite,
                };
                run_fetch(cfg, headers, args).await?;
            }
            CliCommand::Probe { hints } => run_probe(cfg, headers, hints).await?,
            CliCommand::Extract {
                archive,
                title,
                label,
                out,
                overwrite,
            } => {
                let out_dir = match out {
                    Some(d) => d,
                    None => std::env::current_dir()?,
                };
                run_extract(&cfg, &archive, title, &label, &out_dir, overwrite).await?;
            }
            CliCommand::Checksum { path } => run_checksum(&path).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
