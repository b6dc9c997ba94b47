//! # corpus-qa CLI (`cqa`)
//!
//! Interactive question answering over a personal document corpus. `cqa`
//! starts an interactive session; each command runs to completion before
//! the next is accepted.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `load <path-or-url>` | Ingest a `.pdf` or `.txt` file, or a web page |
//! | `list` | Show loaded sources |
//! | `search <query>` | Answer a question using the loaded corpus |
//! | `exit` | Close the session and remove the working directory |
//!
//! The working directory holding the index is reset on startup and removed
//! on clean exit; pass `--keep-data` to persist the corpus across runs.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use corpus_qa::answer::{self, Answer};
use corpus_qa::config;
use corpus_qa::embedding;
use corpus_qa::ingest;
use corpus_qa::llm;
use corpus_qa::registry;
use corpus_qa::session::Session;

/// corpus-qa — retrieval-augmented question answering over your documents.
#[derive(Parser)]
#[command(
    name = "cqa",
    about = "Ask questions about your own PDFs, notes, and web pages",
    version
)]
struct Cli {
    /// Path to configuration file (TOML). Missing file uses defaults.
    #[arg(long, default_value = "./cqa.toml")]
    config: PathBuf,

    /// Keep the working directory across sessions instead of starting from
    /// an empty corpus. The response cache is still cleared on startup.
    #[arg(long)]
    keep_data: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    let embedder = embedding::create_embedder(&cfg.embedding)?;
    let llm = llm::create_llm(&cfg.llm)?;

    let session = Session::open(cfg, embedder, llm, cli.keep_data).await?;

    println!("corpus-qa — load documents, then ask questions.");
    println!("commands: load <path-or-url> | list | search <query> | exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("cqa> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // EOF behaves like exit
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        // Every command failure is reported and the loop continues; only
        // `exit` leaves the session.
        match command {
            "load" if !rest.is_empty() => {
                if let Err(e) = run_load(&session, rest).await {
                    eprintln!("error: {:#}", e);
                }
            }
            "load" => eprintln!("usage: load <path-or-url>"),
            "list" => {
                if let Err(e) = run_list(&session).await {
                    eprintln!("error: {:#}", e);
                }
            }
            "search" if !rest.is_empty() => {
                if let Err(e) = run_search(&session, rest).await {
                    eprintln!("error: {:#}", e);
                }
            }
            "search" => eprintln!("usage: search <query>"),
            "exit" | "quit" => break,
            _ => eprintln!("unknown command: {} (load | list | search | exit)", command),
        }
    }

    session.close().await?;
    println!("bye");
    Ok(())
}

async fn run_load(session: &Session, input: &str) -> Result<()> {
    let outcome = ingest::run_load(session, input).await?;
    println!("loaded {} ({})", outcome.source_id, outcome.kind.as_str());
    println!("  passages: {}", outcome.passages);
    println!("  embedded: {}", outcome.embedded);
    if outcome.cache_cleared > 0 {
        println!("  cache entries cleared: {}", outcome.cache_cleared);
    }
    Ok(())
}

async fn run_list(session: &Session) -> Result<()> {
    let records = registry::list(&session.pool).await?;
    if records.is_empty() {
        println!("no documents loaded");
        return Ok(());
    }
    for record in records {
        println!(
            "{}  {}",
            record.loaded_at.format("%Y-%m-%d %H:%M:%S"),
            record.source_id
        );
    }
    Ok(())
}

async fn run_search(session: &Session, query: &str) -> Result<()> {
    let result = answer::run_query(session, query).await?;
    print_answer(&result);
    Ok(())
}

fn print_answer(result: &Answer) {
    if let Some(retrieval) = &result.retrieval {
        if retrieval.ranked.is_empty() {
            println!("no matching passages; answering from model knowledge");
        } else {
            println!("top matches:");
            for (i, s) in retrieval.ranked.iter().enumerate() {
                println!(
                    "{}. [{:.3}] {} {} (page {}, para {})",
                    i + 1,
                    s.distance,
                    s.collection.label(),
                    s.passage.source_id,
                    s.passage.page,
                    s.passage.paragraph_index
                );
                println!("    \"{}\"", s.passage.text.replace('\n', " "));
            }
        }
    }

    println!();
    if let Some(distance) = result.cache_distance {
        println!("(cached answer, query distance {:.3})", distance);
    }
    println!("{}", result.response);
}
