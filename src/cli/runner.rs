//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::collections;
use crate::config::{load_params_file, parse_param_arg};
use crate::error::Result;
use crate::http::HttpClientConfig;
use crate::types::Params;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    client_config: HttpClientConfig,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            client_config: HttpClientConfig::default(),
        }
    }

    /// Use a specific client configuration for `read`
    pub fn with_client_config(mut self, config: HttpClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Run the CLI command against stdout, cancelling on Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                on_signal.cancel();
            }
        });

        let mut out = std::io::stdout();
        self.run_with(&mut out, cancel).await
    }

    /// Run the CLI command, writing output to `out`
    pub async fn run_with<W: Write + Send>(
        &self,
        out: &mut W,
        cancel: CancellationToken,
    ) -> Result<()> {
        match &self.cli.command {
            Commands::List => self.list(out),
            Commands::Describe { collection } => self.describe(out, collection),
            Commands::Read {
                collection,
                config,
                params,
                max_entries,
            } => {
                let params = collect_params(config.as_deref(), params)?;
                self.read(out, collection, &params, *max_entries, cancel)
                    .await
            }
        }
    }

    fn list<W: Write>(&self, out: &mut W) -> Result<()> {
        for collection in collections::all() {
            self.emit(
                out,
                &json!({
                    "name": collection.name(),
                    "description": collection.description(),
                }),
            )?;
        }
        Ok(())
    }

    fn describe<W: Write>(&self, out: &mut W, name: &str) -> Result<()> {
        let collection = collections::find(name)?;
        self.emit(
            out,
            &json!({
                "name": collection.name(),
                "description": collection.description(),
                "parameters": collection.declaration().describe(),
            }),
        )
    }

    async fn read<W: Write + Send>(
        &self,
        out: &mut W,
        name: &str,
        params: &Params,
        max_entries: Option<usize>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let collection = collections::find(name)?;
        let started = Instant::now();
        let mut pipeline =
            collections::open(collection, params, self.client_config.clone(), cancel).await?;

        let mut emitted = 0usize;
        while max_entries.map_or(true, |max| emitted < max) {
            match pipeline.next_entry().await {
                Ok(Some(entry)) => {
                    self.emit(out, &entry)?;
                    emitted += 1;
                }
                Ok(None) => break,
                Err(e) if e.is_cancelled() => {
                    warn!(collection = name, emitted, "Read cancelled");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        out.flush()?;

        let stats = pipeline.stats();
        info!(
            collection = name,
            emitted,
            pages = stats.pages_fetched,
            detail_requests = stats.detail_requests,
            skipped = stats.entries_skipped,
            throttled = stats.throttled_retries,
            boundary = stats.stopped_at_boundary,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Read finished"
        );
        Ok(())
    }

    fn emit<W: Write, T: Serialize + ?Sized>(&self, out: &mut W, value: &T) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => serde_json::to_writer(&mut *out, value)?,
            OutputFormat::Pretty => serde_json::to_writer_pretty(&mut *out, value)?,
        }
        writeln!(out)?;
        Ok(())
    }
}

/// Merge the parameter file with `key=value` arguments; arguments win
pub fn collect_params(config: Option<&Path>, args: &[String]) -> Result<Params> {
    let mut params = match config {
        Some(path) => load_params_file(path)?,
        None => Params::new(),
    };
    for arg in args {
        let (key, value) = parse_param_arg(arg)?;
        params.insert(key, value);
    }
    Ok(params)
}
