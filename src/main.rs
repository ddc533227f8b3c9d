use clap::Parser;
use opifex::config::ReportFormat;
use opifex::domain::model::BuildReport;
use opifex::utils::{logger, validation::Validate};
use opifex::{BuildEngine, CliConfig, OpifexError, TomlConfig};

fn fail(e: &OpifexError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.severity().exit_code());
}

fn print_report(report: &BuildReport, format: ReportFormat) -> Result<(), OpifexError> {
    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        ReportFormat::Text => {
            for log in &report.logs {
                let mark = if log.succeeded() { "✅" } else { "❌" };
                println!("{} [{}] {}", mark, log.stage, log.command);
            }
            for artifact in &report.artifacts {
                println!("📁 {}", artifact.display());
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = CliConfig::parse();

    logger::init_cli_logger(args.verbose, args.log_format);

    tracing::info!("🚀 Starting opifex");
    tracing::info!("📁 Loading build file from: {}", args.config.display());

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        fail(&e);
    }

    let toolchain = match config.into_toolchain() {
        Ok(toolchain) => toolchain,
        Err(e) => fail(&e),
    };
    let engine = BuildEngine::new(toolchain);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be executed");
        match engine.dry_run(config.sources()) {
            Ok(lines) => lines.iter().for_each(|line| println!("{}", line)),
            Err(e) => fail(&e),
        }
        return;
    }

    let report = match engine.run(config.sources()).await {
        Ok(report) => report,
        Err(e) => fail(&e),
    };

    if let Err(e) = print_report(&report, args.report) {
        fail(&e);
    }

    if let Some(failed) = report.failed_step() {
        tracing::error!("❌ {} stage failed with status {}", failed.stage, failed.status);
        eprint!("{}", failed.stderr);
        std::process::exit(1);
    }

    tracing::info!("✅ Build completed successfully!");
}
