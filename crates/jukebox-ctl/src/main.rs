//! jukebox-ctl — command-line client for jukeboxd.

use std::path::PathBuf;

use anyhow::{Context, Result};

use jukebox_core::catalog;
use jukebox_core::client::Client;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

// ── Subcommand handlers ───────────────────────────────────────────────────────

async fn connect(addr: &str) -> Result<Client<OwnedReadHalf, OwnedWriteHalf>> {
    Client::connect(addr)
        .await
        .with_context(|| format!("failed to connect to jukeboxd at {addr}; is it running?"))
}

async fn cmd_list(addr: &str) -> Result<()> {
    let mut client = connect(addr).await?;
    let lines = client.list_catalog().await.context("catalog request failed")?;
    client.close().await.ok();

    println!("═══════════════════════════════════════");
    println!("  Catalog ({})", lines.len());
    println!("═══════════════════════════════════════");
    if lines.is_empty() {
        println!("  No songs available.");
    }
    for line in &lines {
        println!("  {line}");
    }

    Ok(())
}

async fn cmd_download(addr: &str, artist: &str, song: &str, out: Option<&str>) -> Result<()> {
    let mut client = connect(addr).await?;
    let download = client
        .download(artist, song)
        .await
        .context("download request failed")?;
    client.close().await.ok();

    if !download.header.found {
        eprintln!("Not found: \"{song}\" by {artist}");
        std::process::exit(1);
    }

    let path = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(catalog::file_name(artist, song)));
    let bytes = download.bytes();
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("┌─ \"{song}\" by {artist}");
    println!("│  bytes  : {}", bytes.len());
    println!("│  chunks : {}", download.chunks.len());
    println!("└─ saved  : {}", path.display());

    Ok(())
}

fn print_usage() {
    println!("Usage: jukebox-ctl [--addr <host:port>] <command>");
    println!();
    println!("Commands:");
    println!("  list                              List the songs the server offers");
    println!("  download <artist> <song> [out]    Download one song");
    println!();
    println!("Options:");
    println!("  --addr <host:port>   Server address (default: {DEFAULT_ADDR})");
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut addr = DEFAULT_ADDR.to_string();
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--addr" {
            i += 1;
            addr = args.get(i).context("--addr requires a value")?.clone();
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["list"] | []                      => cmd_list(&addr).await,
        ["download", artist, song]         => cmd_download(&addr, artist, song, None).await,
        ["download", artist, song, out]    => cmd_download(&addr, artist, song, Some(*out)).await,
        ["help"] | ["--help"] | ["-h"]     => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
