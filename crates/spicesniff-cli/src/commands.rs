use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use spicesniff_sdk::{BatchId, BatchRecord, SpiceSniff};
use spicesniff_server::SpiceSniffServer;

use crate::cli::*;
use crate::config::AppConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Command::Serve(ServeArgs { bind: Some(bind) }) = &cli.command {
        config.server.bind_addr = *bind;
    }
    let sdk = config.build_sdk()?;

    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime.block_on(async move {
        match cli.command {
            Command::Serve(_) => cmd_serve(config, sdk).await,
            Command::Submit(args) => cmd_submit(&sdk, args, cli.format).await,
            Command::Fetch(args) => cmd_fetch(&sdk, args, cli.format).await,
            Command::List => cmd_list(&sdk, cli.format).await,
            Command::Status => cmd_status(&sdk, cli.format).await,
        }
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_record(record: &BatchRecord) {
    println!("{}  {}", record.batch_id.to_string().yellow().bold(), record.spice_kind.green());
    println!("  CID:      {}", record.content_id.to_string().cyan());
    println!("  Anchored: {}", record.anchored_at.to_rfc3339());
    if let Some(tx) = &record.transaction_ref {
        println!("  Tx:       {}", tx.dimmed());
    }
    if let Some(block) = record.block_ref {
        println!("  Block:    {block}");
    }
}

async fn cmd_serve(config: AppConfig, sdk: SpiceSniff) -> anyhow::Result<()> {
    println!(
        "{} SpiceSniff server on {} (origins: {})",
        "▶".green().bold(),
        config.server.bind_addr.to_string().bold(),
        config.server.allow_origin
    );
    SpiceSniffServer::new(config.server, sdk).serve().await?;
    Ok(())
}

async fn cmd_submit(sdk: &SpiceSniff, args: SubmitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading document {}", args.file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("document {} is not valid JSON", args.file.display()))?;
    let batch_id = BatchId::from_input(&args.batch)?;

    let receipt = sdk.submit_batch(&batch_id, &args.spice, &document).await?;
    match format {
        OutputFormat::Json => print_json(&receipt),
        OutputFormat::Text => {
            println!("{} Batch {} anchored", "✓".green().bold(), batch_id.to_string().yellow());
            println!("  CID:   {}", receipt.content_id.to_string().cyan());
            println!("  Tx:    {}", receipt.transaction_ref.dimmed());
            println!("  Block: {}", receipt.block_ref);
            Ok(())
        }
    }
}

async fn cmd_fetch(sdk: &SpiceSniff, args: FetchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let batch_id = BatchId::new(args.batch)?;
    let fetched = sdk.fetch_batch(&batch_id).await?;
    match format {
        OutputFormat::Json => print_json(&fetched),
        OutputFormat::Text => {
            print_record(&fetched.record);
            println!("{}", serde_json::to_string_pretty(&fetched.document)?);
            Ok(())
        }
    }
}

async fn cmd_list(sdk: &SpiceSniff, format: OutputFormat) -> anyhow::Result<()> {
    let records = sdk.list_batches().await?;
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No batches anchored.");
            }
            for record in &records {
                print_record(record);
            }
            Ok(())
        }
    }
}

async fn cmd_status(sdk: &SpiceSniff, format: OutputFormat) -> anyhow::Result<()> {
    let status = sdk.status().await;
    match format {
        OutputFormat::Json => print_json(&status),
        OutputFormat::Text => {
            let mark = |ok: bool| if ok { "✓ reachable".green() } else { "✗ unreachable".red() };
            println!("Content store: {}", mark(status.store));
            println!("Ledger:        {}", mark(status.ledger));
            Ok(())
        }
    }
}
