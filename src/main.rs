use anyhow::Result;
use clap::Parser;
use sentinel_overlap::catalog::SentinelHub;
use sentinel_overlap::cli::Cli;
use sentinel_overlap::report::OverlapReport;
use sentinel_overlap::find_sentinel_overlaps;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let request = args.request()?;
    let catalog = SentinelHub::new(args.catalog_config()?)?;

    let result = find_sentinel_overlaps(&catalog, &request).await?;

    let report = OverlapReport {
        location: request.location,
        window: request.window,
        criteria: request.criteria,
        matches: result.matches,
    };
    report.print();

    if let Some(path) = args.output {
        report.write(&path)?;
        log::info!("Wrote {} matches to {}", report.matches.len(), path.display());
    }

    Ok(())
}
