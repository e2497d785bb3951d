mod change;
mod config;
mod dashboard;
mod display;
mod fetcher;
mod network;
mod preflight;
mod render;
mod state;
mod summary;

use change::FileChangeRecord;
use chrono::Local;
use clap::Parser;
use config::{Config, ConfigError};
use dashboard::{CycleOutcome, Dashboard};
use display::{DisplayDevice, FileDisplay};
use fetcher::StatusFetcher;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "/etc/pihole-dashboard.yaml";

#[derive(Parser, Debug)]
#[command(name = "pihole-dashboard")]
#[command(version)]
struct Cli {
    /// Path to the YAML config (default /etc/pihole-dashboard.yaml).
    #[arg(long)]
    config: Option<String>,
    /// Print an example config and exit.
    #[arg(long)]
    print_default_config: bool,
    /// Redraw even if the data has not changed.
    #[arg(long)]
    force: bool,
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return ExitCode::SUCCESS;
    }

    let cfg = match load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "не удалось загрузить конфигурацию");
            return ExitCode::FAILURE;
        }
    };

    if cfg.require_root {
        if let Err(err) = preflight::ensure_privileges() {
            error!(error = %err, "проверка прав не пройдена");
            return ExitCode::FAILURE;
        }
    }

    let mut display = FileDisplay::new(&cfg.display);
    if let Err(err) = display.initialize() {
        error!(error = %err, "не удалось инициализировать дисплей");
        return ExitCode::FAILURE;
    }

    let fetcher = match StatusFetcher::new(&cfg.api_path, Duration::from_millis(cfg.timeout_ms)) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            error!(error = %err, "не удалось создать HTTP-клиент");
            return ExitCode::FAILURE;
        }
    };

    info!(
        primary = %fetcher.url_for(&cfg.primary),
        secondary = %fetcher.url_for(&cfg.secondary),
        interface = %cfg.interface,
        force = cli.force,
        "запуск pihole-dashboard"
    );

    let record = FileChangeRecord::new(&cfg.state_file);
    let mut dashboard = Dashboard::new(fetcher, record, display, &cfg);
    let network = network::local_ipv4(&cfg.interface);

    match dashboard.poll(network, Local::now().time(), cli.force) {
        Ok(CycleOutcome::Rendered) | Ok(CycleOutcome::Unchanged) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "цикл обновления завершился ошибкой");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(explicit: Option<&str>) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return Config::load_from_file(path);
    }
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        return Config::load_from_file(DEFAULT_CONFIG_PATH);
    }
    warn!(
        path = DEFAULT_CONFIG_PATH,
        "файл конфигурации не найден, используются значения по умолчанию"
    );
    let cfg = Config::default();
    cfg.validate()?;
    Ok(cfg)
}
