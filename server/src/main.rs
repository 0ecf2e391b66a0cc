//! # Wii Fit sync server
//!
//! Decodes a Wii Fit save once, then answers sync requests from one client
//! at a time until interrupted.

mod config;
mod logging;

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use wiifit_sync::{
    SaveData,
    avec::{
        self, FsStorage, Respond, SAVE_PATHS, TracingObserver, load,
        net::{TcpListener, serve_forever},
    },
};

use crate::{config::ServerConfig, logging::LogFormat};

#[derive(Parser)]
#[command(name = "wiifit-sync", version)]
#[command(about = "Serve Wii Fit body-test history to a sync client")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Address to listen on
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, global = true)]
    port: Option<u16>,

    /// Directory to search for the save, as if it were the NAND root
    #[arg(long, global = true)]
    nand_root: Option<PathBuf>,

    /// Read this save file instead of searching
    #[arg(long, global = true)]
    save: Option<PathBuf>,

    /// Milliseconds to wait for a request
    #[arg(long, global = true)]
    request_timeout_ms: Option<u64>,

    /// Milliseconds to wait for an acknowledgement
    #[arg(long, global = true)]
    ack_timeout_ms: Option<u64>,

    /// Milliseconds a client may stop reading before its session is dropped
    #[arg(long, global = true)]
    send_timeout_ms: Option<u64>,

    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Decode the save, then serve sync sessions (default)
    Serve,
    /// Decode the save and print the sync response
    Dump,
    /// Report which search paths hold a file
    Probe,
}

impl Args {
    fn apply(&self, config: &mut ServerConfig) {
        if let Some(bind) = &self.bind {
            config.bind.clone_from(bind);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(root) = &self.nand_root {
            config.nand_root.clone_from(root);
        }
        if let Some(save) = &self.save {
            config.save = Some(save.clone());
        }
        if let Some(ms) = self.request_timeout_ms {
            config.session.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.ack_timeout_ms {
            config.session.ack_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.send_timeout_ms {
            config.session.send_timeout = Duration::from_millis(ms);
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env();
    args.apply(&mut config);

    logging::init(config.log_format)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await,
        Command::Dump => dump(&config),
        Command::Probe => probe(&config),
    }
}

async fn serve(config: &ServerConfig) -> Result<()> {
    info!("{}", config.summary());

    // Storage is released before the network comes up.
    let save = load_save(config);

    match &save {
        Ok(save) => info!(profiles = save.profiles.len(), "save loaded"),
        Err(e) => warn!(
            error = %e,
            code = e.code(),
            reason = load::describe(e.code()),
            "save not loaded, sync requests will receive an error"
        ),
    }

    let mut listener = TcpListener::bind(&config.bind, config.port)
        .with_context(|| format!("Failed to listen on {}:{}", config.bind, config.port))?;

    let address = listener.local_addr().context("Failed to read listen address")?;
    info!(%address, "listening");

    tokio::select! {
        () = serve_forever(&mut listener, &save, &config.session) => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("shutting down");
        }
    }

    Ok(())
}

fn dump(config: &ServerConfig) -> Result<()> {
    let save = load_save(config);

    let mut out = vec![0; config.session.response_capacity];
    let len = save.respond(&mut out);

    let mut stdout = io::stdout().lock();
    stdout.write_all(&out[..len])?;
    stdout.write_all(b"\n")?;

    Ok(())
}

fn probe(config: &ServerConfig) -> Result<()> {
    let mut storage = FsStorage::new(&config.nand_root)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "searching {}", storage.root().display())?;

    for p in avec::probe(&mut storage, &SAVE_PATHS) {
        match p.result {
            Ok(()) => writeln!(stdout, "found    {}", p.path)?,
            Err(kind) => writeln!(stdout, "missing  {} ({kind})", p.path)?,
        }
    }

    Ok(())
}

/// Read and decode the configured save, closing storage before returning.
fn load_save(config: &ServerConfig) -> Result<SaveData, load::Error> {
    let mut observer = TracingObserver;

    match &config.save {
        Some(path) => {
            let (dir, name) = split_save_path(path)?;
            let mut storage = FsStorage::new(dir)?;
            avec::load(&mut storage, &[name.as_str()], &mut observer)
        }
        None => {
            let mut storage = FsStorage::new(&config.nand_root)?;
            avec::load(&mut storage, &SAVE_PATHS, &mut observer)
        }
    }
}

/// Split an explicit save path into a storage root and a path within it.
fn split_save_path(path: &Path) -> Result<(PathBuf, String), load::Error> {
    let Some(name) = path.file_name() else {
        return Err(load::Error::NotFound {
            tried: 1,
            last: Some(path.display().to_string()),
        });
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, name.to_string_lossy().into_owned()))
}
