use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use eframe::NativeOptions;
use orlib_module_db::{stock_problems, DescriptorFile, ModuleRegistry};
use orlib_module_host::LaunchController;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod launcher;
mod notifications;
mod startup;

use app::DashboardApp;
use config::DashboardConfig;
use startup::{build_controller, descriptor_source, load_registry};

#[derive(Debug, Parser)]
#[command(name = "orlib", author, version, about = "Operational Research Problems Library dashboard")]
struct Cli {
    /// Problem descriptor file to load instead of the configured one
    #[arg(long, value_name = "FILE")]
    modules: Option<PathBuf>,

    /// Dashboard configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the problem table and exit
    #[arg(long, default_value_t = false)]
    list: bool,

    /// Resolve every launchable problem without opening windows, then exit
    #[arg(long, default_value_t = false)]
    check: bool,

    /// Write the stock problem table to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_default: Option<PathBuf>,

    /// Log filter, e.g. `info` or `orlib_module_host=debug`
    #[arg(long, value_name = "FILTER")]
    log_filter: Option<String>,
}

fn init_tracing(filter: Option<&str>) -> anyhow::Result<()> {
    let filter = match filter {
        Some(filter) => {
            EnvFilter::try_new(filter).with_context(|| format!("invalid log filter {filter:?}"))?
        }
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
    Ok(())
}

fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<DashboardConfig> {
    match explicit {
        Some(path) if !path.exists() => bail!("config file {} does not exist", path.display()),
        Some(path) => DashboardConfig::load(path),
        None => DashboardConfig::load(&DashboardConfig::default_path()?),
    }
}

fn print_problems(registry: &ModuleRegistry) {
    for descriptor in registry.iter() {
        println!(
            "{:<8} {:<12} {:<40} {}",
            descriptor.id,
            descriptor.status.label(),
            descriptor.title,
            descriptor.module_location
        );
    }
}

fn check_modules(controller: &LaunchController) -> anyhow::Result<()> {
    let mut failed = 0;
    for descriptor in controller.registry().iter().filter(|d| d.is_selectable()) {
        // Resolving loads libraries, running their initialisers unguarded.
        match controller.resolver().resolve(descriptor) {
            Ok(entry) => println!("ok      {:<8} {}", descriptor.id, entry.symbol()),
            Err(err) => {
                failed += 1;
                println!("failed  {:<8} {err}", descriptor.id);
            }
        }
    }
    if failed > 0 {
        bail!("{failed} problem module(s) failed to resolve");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = load_config(args.config.as_ref())?;
    init_tracing(args.log_filter.as_deref().or(config.log_filter.as_deref()))?;

    if let Some(path) = &args.write_default {
        DescriptorFile::save(path, &stock_problems())
            .with_context(|| format!("write descriptor file {}", path.display()))?;
        println!("Stock problem table written to {}", path.display());
        return Ok(());
    }

    let explicit = args.modules.as_deref().or(config.modules_file.as_deref());
    let source = descriptor_source(explicit)?;
    let registry = load_registry(&source)?;

    if args.list {
        print_problems(&registry);
        return Ok(());
    }

    let controller = build_controller(registry, &config);
    if args.check {
        return check_modules(&controller);
    }

    info!(problems = controller.registry().len(), "starting dashboard");
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.window_title.clone())
            .with_inner_size([760.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        &config.window_title,
        options,
        Box::new(move |_cc| Box::new(DashboardApp::new(controller))),
    )
    .map_err(|err| anyhow!(err.to_string()))
}
