//! # uniq-ip - count distinct IPv4 addresses in a large file
//!
//! Reads a text file with one dotted-quad address per line and prints how
//! many distinct addresses it contains. The file may be far larger than
//! memory: addresses are sorted in bounded chunks on disk, merged, and
//! counted in one pass.
//!
//! ## Configuration
//!
//! Every flag can also be set from the environment:
//!
//! ```text
//! -f, --file       UNIQ_IP_FILE       input file                 (required)
//! -c, --chunk      UNIQ_IP_CHUNK_MB   run budget in MiB          (default: 1024)
//! -t, --temp-dir   UNIQ_IP_TEMP_DIR   parent of the workspace    (default: system temp)
//!     --policy     UNIQ_IP_POLICY     permissive | strict        (default: permissive)
//!     --strict     UNIQ_IP_STRICT     same as --policy strict    (default: off)
//!     --keep-temp  UNIQ_IP_KEEP_TEMP  keep run files afterwards  (default: off)
//! ```
//!
//! Log verbosity follows `RUST_LOG`; logs go to stderr so stdout carries only
//! the result.
//!
//! ## Example
//!
//! ```text
//! $ uniq-ip -f ips.txt -c 256
//! Unique IP addresses: 1000000000
//! Elapsed: 812.4s
//! ```

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use codec::ParsePolicy;
use config::{CountConfig, DEFAULT_CHUNK_MB};
use engine::Pipeline;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "uniq-ip")]
#[command(about = "Count distinct IPv4 addresses in a file larger than memory")]
struct Args {
    /// Input file, one address per line
    #[arg(short, long, env = "UNIQ_IP_FILE")]
    file: PathBuf,

    /// Bytes of keys held in memory per sorted run, in MiB
    #[arg(short, long, default_value_t = DEFAULT_CHUNK_MB, env = "UNIQ_IP_CHUNK_MB")]
    chunk: u64,

    /// Directory in which the temporary workspace is created
    #[arg(short, long, env = "UNIQ_IP_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// How address lines are parsed: permissive or strict
    #[arg(long, default_value_t = ParsePolicy::Permissive, env = "UNIQ_IP_POLICY")]
    policy: ParsePolicy,

    /// Only accept four decimal octets in 0..=255; overrides --policy
    #[arg(long, env = "UNIQ_IP_STRICT", value_parser = FalseyValueParser::new())]
    strict: bool,

    /// Leave run files and the merged stream on disk
    #[arg(long, env = "UNIQ_IP_KEEP_TEMP", value_parser = FalseyValueParser::new())]
    keep_temp: bool,
}

impl Args {
    fn into_config(self) -> Result<CountConfig> {
        let mut cfg = CountConfig::new(&self.file)
            .with_chunk_mb(self.chunk)
            .context("invalid --chunk")?
            .keep_workspace(self.keep_temp)
            .with_policy(if self.strict { ParsePolicy::Strict } else { self.policy });
        if let Some(dir) = self.temp_dir {
            cfg = cfg.with_temp_root(dir);
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("uniq_ip=info,engine=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let pipeline = Pipeline::new(args.into_config()?)?;
    info!(config = ?pipeline, "starting");

    let report = pipeline.run()?;

    println!("Unique IP addresses: {}", report.unique);
    println!("Elapsed: {:.1?}", report.elapsed);
    if let Some(dir) = &report.workspace {
        info!(path = %dir.display(), "workspace kept");
    }
    Ok(())
}
