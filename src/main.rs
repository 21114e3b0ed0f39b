use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use std::process::ExitCode;

use mashup_creator::cli::{Cli, USAGE};
use mashup_creator::delivery::LocalDelivery;
use mashup_creator::{utils, Config, MashupError, MashupPipeline, RunParams};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    utils::init_tracing("mashup_creator=info");

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(_) => {
            println!("Error: Incorrect number of parameters");
            println!("\n{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<MashupError>() {
                Some(MashupError::InvalidInput(errors)) => {
                    println!("Error: Invalid inputs detected:");
                    for error in errors {
                        println!("  - {}", error);
                    }
                    println!("\n{}", USAGE);
                }
                _ => eprintln!("\n{} {:#}", style("Error:").red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let params = RunParams::parse(&cli.singer, &cli.videos, &cli.duration, &cli.output)?;
    let config = Config::load()?;

    // Check for required external dependencies (non-fatal)
    let missing_deps = utils::check_dependencies(&config.tools).await;
    if !missing_deps.is_empty() {
        eprintln!("⚠️  Dependency check warnings:");
        for dep in missing_deps {
            eprintln!("   • {}", dep);
        }
        eprintln!("   (Continuing anyway - tools may be available)");
    }

    let rule = "=".repeat(60);
    println!("{}", rule);
    println!("{}", style("MASHUP CREATOR").bold());
    println!("{}", rule);
    println!("Singer: {}", params.artist);
    println!("Videos to download: {}", params.count);
    println!("Audio duration: {} seconds", params.clip_seconds);
    println!("Output file: {}", params.output);
    println!("{}", rule);

    let pipeline = MashupPipeline::from_config(&config).with_progress(true);
    let report = pipeline.run(&params, &LocalDelivery).await?;

    if report.fetched < report.requested as usize {
        println!(
            "{} Only {} videos were downloaded (requested {})",
            style("Warning:").yellow().bold(),
            report.fetched,
            report.requested
        );
    }
    for skip in &report.skipped {
        println!("  skipped [{}] {}: {}", skip.stage, skip.label, skip.reason);
    }

    let size = fs_err::metadata(&params.output)
        .map(|meta| utils::format_file_size(meta.len()))
        .unwrap_or_else(|_| "unknown size".to_string());

    println!("\n{}", rule);
    println!("{}", style("MASHUP COMPLETED SUCCESSFULLY!").green().bold());
    println!("{}", rule);
    println!("Mashup saved to: {} ({})", params.output, size);
    println!(
        "Clips merged: {} ({} total)",
        report.trimmed,
        utils::format_duration(report.total_seconds)
    );
    if !report.cleaned_up {
        println!("Could not clean up temporary files");
    }

    Ok(())
}
