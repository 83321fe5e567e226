pub mod data;
pub mod engine;
pub mod errors;
pub mod models;
pub mod ui;

#[cfg(test)]
mod test_util;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use data::loader::{load_bars, load_windows, DataSources};
use engine::navigator::ChartNavigator;
use errors::AppError;
use models::bar::BarTable;
use models::config::{
    resolve_config_path, AppConfig, Layout, PaneSource, DEFAULT_LOG_PATH, LOG_ENV_VAR,
};
use ui::binding::{run_event_loop, BindingOptions, ChartBinding, DualChartBinding};
use ui::input::KeyEvents;
use ui::tui::{stdout_screen, TerminalSession, TuiSurface};

/// Navigators ready to be bound to surfaces.
///
/// All data is loaded and validated before a `Session` exists, so nothing is
/// drawn when the inputs are broken.
#[derive(Debug)]
pub struct Session {
    pub left: ChartNavigator,
    /// Present for the dual layout only.
    pub right: Option<ChartNavigator>,
}

/// Load the window index and bar files named by `config`.
pub fn load_session(config: &AppConfig) -> Result<Session, AppError> {
    let sources = DataSources::from_config(&config.general);
    let windows: Arc<[_]> = load_windows(&sources.index, config.display.window_days)?.into();
    let daily = Arc::new(load_bars(&sources.daily_bars)?);
    let daily_bars = daily.len();
    let indicators: Arc<[_]> = config.indicators.clone().into();

    let left = ChartNavigator::daily(windows.clone(), daily.clone(), indicators.clone())?;
    let right = match config.display.layout {
        Layout::Single => None,
        Layout::Dual => Some(match config.display.right_pane {
            PaneSource::Daily => ChartNavigator::daily(windows, daily, indicators)?,
            PaneSource::Minute => {
                let minute: Arc<BarTable> = Arc::new(load_bars(&sources.minute_bars)?);
                ChartNavigator::minute(windows, minute, indicators)?
            }
        }),
    };

    info!(
        "Session ready: {} windows, {} daily bars, layout {:?}",
        left.len(),
        daily_bars,
        config.display.layout
    );
    Ok(Session { left, right })
}

/// Logs go to a file so they do not draw over the chart.
fn init_tracing() -> anyhow::Result<()> {
    let path = std::env::var_os(LOG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Binary entry point: configuration, data, then the terminal charts driven
/// by the keyboard.
pub fn run() -> anyhow::Result<()> {
    init_tracing()?;
    info!("Starting chartnav");

    let config_path = resolve_config_path();
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;
    let session = load_session(&config).context("failed to load chart data")?;

    let options = BindingOptions {
        screenshot_dir: config.display.screenshot_dir.clone(),
        ..Default::default()
    };
    let _terminal = TerminalSession::enter()?;
    let screen = stdout_screen()?;
    let mut events = KeyEvents::new();

    match session.right {
        None => {
            let surface = TuiSurface::attach(&screen, "chart");
            let mut binding = ChartBinding::new(surface, session.left, options)?;
            run_event_loop(&mut binding, &mut events)?;
        }
        Some(right) => {
            let left_surface = TuiSurface::attach(&screen, "left");
            let right_surface = TuiSurface::attach(&screen, "right");
            let left = ChartBinding::new(
                left_surface,
                session.left,
                BindingOptions {
                    pane_label: Some("left".into()),
                    ..options.clone()
                },
            )?;
            let right = ChartBinding::new(
                right_surface,
                right,
                BindingOptions {
                    pane_label: Some("right".into()),
                    ..options
                },
            )?;
            let mut layout = DualChartBinding::new(left, right);
            run_event_loop(&mut layout, &mut events)?;
        }
    }

    info!("chartnav finished");
    Ok(())
}
