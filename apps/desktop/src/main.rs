use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use migrator_client::{
    selection::{file_extension, infer_source_format},
    ControllerEvent, DirectorySink, HttpConversionService, MigrationController, SelectedFile,
    SelectionOrigin,
};
use migrator_shared::domain::{Format, MigrationFormats};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, ClientSettings};

#[derive(Parser, Debug)]
#[command(name = "migrator", about = "Submit data files to a format conversion service")]
struct Cli {
    /// Settings file; defaults to ./migrator.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Skip the progress reveal after the server answers.
    #[arg(long)]
    no_animation: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a file for conversion and optionally save the artifacts.
    Migrate {
        file: PathBuf,
        /// Overrides the format inferred from the file extension.
        #[arg(long)]
        source: Option<Format>,
        #[arg(long)]
        target: Option<Format>,
        /// Save the generated migration report.
        #[arg(long)]
        report: bool,
        /// Fetch and save the converted file.
        #[arg(long)]
        download: bool,
        /// Treat the file as dropped rather than browsed to.
        #[arg(long)]
        dropped: bool,
    },
    /// Show the source format a file name implies.
    Infer { file: PathBuf },
    /// List supported formats and their saved extensions.
    Formats,
}

struct MigrateArgs {
    file: PathBuf,
    source: Option<Format>,
    target: Option<Format>,
    report: bool,
    download: bool,
    dropped: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Formats => {
            for format in Format::ALL {
                println!("{format}\t.{}", format.file_extension());
            }
        }
        Command::Infer { file } => println!("{}", describe_inference(&file)),
        Command::Migrate {
            file,
            source,
            target,
            report,
            download,
            dropped,
        } => {
            let mut settings = load_settings(cli.config.as_deref())?;
            if let Some(server_url) = cli.server_url {
                settings.server_url = server_url;
            }
            if let Some(output_dir) = cli.output_dir {
                settings.output_dir = output_dir;
            }
            if cli.no_animation {
                settings.animate_progress = false;
            }
            run_migrate(
                settings,
                MigrateArgs {
                    file,
                    source,
                    target,
                    report,
                    download,
                    dropped,
                },
            )
            .await?;
        }
    }

    Ok(())
}

fn describe_inference(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match infer_source_format(&name) {
        Some(format) => format!("{}: {format}", path.display()),
        None => format!(
            "{}: unknown (extension `{}` is not recognized)",
            path.display(),
            file_extension(&name)
        ),
    }
}

async fn join_printer(printer: JoinHandle<()>) -> Result<()> {
    printer.await.context("event printer stopped abnormally")
}

fn render_event(event: &ControllerEvent) {
    match event {
        ControllerEvent::SelectionChanged {
            file_name,
            inferred_source_format,
        } => match inferred_source_format {
            Some(format) => println!("Selected {file_name} (detected {format})"),
            None => println!("Selected {file_name}"),
        },
        ControllerEvent::SubmitStarted { file_name, formats } => {
            println!("Migrating {file_name}: {} -> {}", formats.source, formats.target)
        }
        ControllerEvent::Progress(value) => {
            let bar = "#".repeat(usize::from(*value / 10));
            println!("[{bar:<10}] {value:>3}%")
        }
        ControllerEvent::Completed(result) => println!("{}", result.summary()),
        ControllerEvent::Notification(message) => eprintln!("{message}"),
        ControllerEvent::ReportSaved(path) => println!("Report saved to {}", path.display()),
        ControllerEvent::MigratedFileSaved(path) => {
            println!("Migrated file saved to {}", path.display())
        }
    }
}

async fn run_migrate(settings: ClientSettings, args: MigrateArgs) -> Result<()> {
    info!(
        server_url = %settings.server_url,
        output_dir = %settings.output_dir.display(),
        animate_progress = settings.animate_progress,
        "settings loaded"
    );
    let service = HttpConversionService::new(&settings.server_url)?;
    let controller = MigrationController::new_with_dependencies(
        Arc::new(service),
        Arc::new(DirectorySink::new(&settings.output_dir)),
        settings.progress_animation(),
        MigrationFormats::default(),
    );

    let mut events = controller.subscribe_events();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => render_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "progress output lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let file = SelectedFile::from_path(&args.file).await?;
    let origin = if args.dropped {
        SelectionOrigin::Drop
    } else {
        SelectionOrigin::Browse
    };
    controller.select_file(file, origin).await;
    if let Some(source) = args.source {
        controller.set_source_format(source).await;
    }
    if let Some(target) = args.target {
        controller.set_target_format(target).await;
    }

    let outcome = async {
        controller
            .submit()
            .await
            .with_context(|| format!("migration of {} failed", args.file.display()))?;
        if args.report {
            controller
                .download_report()
                .await
                .context("failed to save migration report")?;
        }
        if args.download {
            controller
                .download_migrated_file()
                .await
                .context("failed to download migrated file")?;
        }
        anyhow::Ok(())
    }
    .await;

    drop(controller);
    let printed = join_printer(printer).await;
    outcome?;
    printed
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
