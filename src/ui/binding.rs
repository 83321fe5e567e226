use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::keymap::{Hotkey, KeyCommand, Keymap};
use super::surface::{line_points, ChartSurface, LegendOptions, LineId, VertAlign, Watermark};
use crate::engine::navigator::{ChartNavigator, ChartView};
use crate::errors::AppError;

/// Side of a dual layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Left,
    Right,
}

impl Pane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pane::Left => "left",
            Pane::Right => "right",
        }
    }
}

/// Input delivered by the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Key(Hotkey),
    TimeframeSelected { pane: Pane, label: String },
    /// The display was resized and must be drawn again.
    Redraw,
    Quit,
}

/// Source of UI events, polled by [`run_event_loop`].
pub trait EventSource {
    /// Next event, or `None` once the display is closed.
    fn next_event(&mut self) -> Result<Option<UiEvent>, AppError>;
}

/// A set of bound charts that reacts to UI events.
pub trait ChartLayout {
    fn handle(&mut self, event: &UiEvent) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct BindingOptions {
    pub keymap: Keymap,
    pub legend: LegendOptions,
    pub screenshot_dir: PathBuf,
    /// Added to screenshot names so panes of a dual layout do not collide.
    pub pane_label: Option<String>,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            keymap: Keymap::default(),
            legend: LegendOptions::default(),
            screenshot_dir: PathBuf::from("screenshots"),
            pane_label: None,
        }
    }
}

/// One navigator bound to one chart surface.
///
/// Indicator overlays are created once in [`ChartBinding::new`]; navigation
/// only replaces series data.
pub struct ChartBinding<S: ChartSurface> {
    surface: S,
    navigator: ChartNavigator,
    lines: Vec<(String, LineId)>,
    options: BindingOptions,
}

impl<S: ChartSurface> ChartBinding<S> {
    /// Render the first window and create the indicator overlays.
    pub fn new(
        surface: S,
        navigator: ChartNavigator,
        options: BindingOptions,
    ) -> Result<Self, AppError> {
        let view = navigator.current();
        let mut binding = ChartBinding {
            surface,
            navigator,
            lines: Vec::new(),
            options,
        };
        binding.create_overlays(&view)?;
        binding.render(&view)?;
        info!(
            "Chart ready: {} windows, {} overlays",
            binding.navigator.len(),
            binding.lines.len()
        );
        Ok(binding)
    }

    pub fn navigator(&self) -> &ChartNavigator {
        &self.navigator
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn keymap(&self) -> &Keymap {
        &self.options.keymap
    }

    pub fn advance(&mut self) -> Result<(), AppError> {
        let view = self.navigator.next();
        self.render(&view)
    }

    pub fn retreat(&mut self) -> Result<(), AppError> {
        let view = self.navigator.previous();
        self.render(&view)
    }

    /// Render the current window again without moving.
    pub fn redraw(&mut self) -> Result<(), AppError> {
        let view = self.navigator.current();
        self.render(&view)
    }

    /// Switch the display timeframe. A rejected label leaves the chart as is.
    pub fn change_timeframe(&mut self, label: &str) -> Result<(), AppError> {
        self.navigator.set_timeframe(label)?;
        info!("Timeframe changed to {}", self.navigator.timeframe());
        let view = self.navigator.current();
        self.render(&view)
    }

    /// Save a screenshot as `<dir>/<symbol>_<date>[_<pane>]_screenshot.<ext>`.
    pub fn save_screenshot(&mut self) -> Result<PathBuf, AppError> {
        let shot = self.surface.screenshot()?;
        let metadata = self.navigator.metadata();
        let pane = self
            .options
            .pane_label
            .as_ref()
            .map(|p| format!("_{}", p))
            .unwrap_or_default();
        let filename = format!(
            "{}_{}{}_screenshot.{}",
            sanitize(&metadata.symbol),
            metadata.date_label(),
            pane,
            shot.extension
        );
        let path = self.options.screenshot_dir.join(filename);
        write_file(&path, &shot.bytes)?;
        info!("Screenshot saved to {}", path.display());
        Ok(path)
    }

    pub fn apply(&mut self, command: KeyCommand) -> Result<(), AppError> {
        match command {
            KeyCommand::Advance => self.advance(),
            KeyCommand::Retreat => self.retreat(),
            KeyCommand::Screenshot => self.save_screenshot().map(|_| ()),
        }
    }

    fn create_overlays(&mut self, view: &ChartView) -> Result<(), AppError> {
        for series in &view.indicators {
            let line = self.surface.create_line(&series.name)?;
            self.lines.push((series.name.clone(), line));
        }
        Ok(())
    }

    /// Push the view into the existing series. Never creates overlays.
    fn render(&mut self, view: &ChartView) -> Result<(), AppError> {
        self.surface.set_bars(&view.bars)?;
        for (name, line) in &self.lines {
            if let Some(series) = view.indicators.iter().find(|s| &s.name == name) {
                self.surface
                    .set_line(*line, &line_points(&view.bars, &series.values))?;
            }
        }
        let watermark = Watermark::new(view.metadata.watermark_text()).vert_align(VertAlign::Top);
        self.surface.set_watermark(&watermark)?;
        self.surface.set_legend(&self.options.legend)?;
        self.surface.refresh()?;
        debug!(
            "Rendered {} [{}] with {} bars",
            view.metadata.symbol,
            view.metadata.index,
            view.row_count()
        );
        Ok(())
    }
}

impl<S: ChartSurface> ChartLayout for ChartBinding<S> {
    fn handle(&mut self, event: &UiEvent) -> Result<(), AppError> {
        match event {
            UiEvent::Key(hotkey) => match self.options.keymap.resolve(hotkey) {
                Some(command) => self.apply(command),
                None => {
                    debug!("Unbound key {:?}", hotkey);
                    Ok(())
                }
            },
            // A single chart owns every timeframe selector
            UiEvent::TimeframeSelected { label, .. } => self.change_timeframe(label),
            UiEvent::Redraw => self.redraw(),
            UiEvent::Quit => Ok(()),
        }
    }
}

/// Two charts side by side. Keyboard commands drive both in lockstep;
/// timeframe selection targets one pane.
pub struct DualChartBinding<S: ChartSurface> {
    left: ChartBinding<S>,
    right: ChartBinding<S>,
}

impl<S: ChartSurface> DualChartBinding<S> {
    pub fn new(left: ChartBinding<S>, right: ChartBinding<S>) -> Self {
        DualChartBinding { left, right }
    }

    pub fn left(&self) -> &ChartBinding<S> {
        &self.left
    }

    pub fn right(&self) -> &ChartBinding<S> {
        &self.right
    }

    pub fn pane_mut(&mut self, pane: Pane) -> &mut ChartBinding<S> {
        match pane {
            Pane::Left => &mut self.left,
            Pane::Right => &mut self.right,
        }
    }

    /// Apply `command` to both panes, then report the first failure.
    pub fn apply(&mut self, command: KeyCommand) -> Result<(), AppError> {
        let left = self.left.apply(command);
        let right = self.right.apply(command);
        left.and(right)
    }
}

impl<S: ChartSurface> ChartLayout for DualChartBinding<S> {
    fn handle(&mut self, event: &UiEvent) -> Result<(), AppError> {
        match event {
            UiEvent::Key(hotkey) => match self.left.keymap().resolve(hotkey) {
                Some(command) => self.apply(command),
                None => {
                    debug!("Unbound key {:?}", hotkey);
                    Ok(())
                }
            },
            UiEvent::TimeframeSelected { pane, label } => {
                debug!("Timeframe {} requested on {} pane", label, pane.as_str());
                self.pane_mut(*pane).change_timeframe(label)
            }
            UiEvent::Redraw => {
                let left = self.left.redraw();
                let right = self.right.redraw();
                left.and(right)
            }
            UiEvent::Quit => Ok(()),
        }
    }
}

/// Dispatch events until the source closes or asks to quit. Recoverable
/// errors are logged and the loop continues.
pub fn run_event_loop<L, E>(layout: &mut L, events: &mut E) -> Result<(), AppError>
where
    L: ChartLayout + ?Sized,
    E: EventSource + ?Sized,
{
    while let Some(event) = events.next_event()? {
        if event == UiEvent::Quit {
            info!("Quit requested");
            break;
        }
        if let Err(err) = layout.handle(&event) {
            if !err.is_recoverable() {
                return Err(err);
            }
            warn!("[{}] {}", err.code(), err);
        }
    }
    Ok(())
}

fn sanitize(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::FileWrite(format!("{}: {}", dir.display(), e)))?;
    }
    fs::write(path, bytes).map_err(|e| AppError::FileWrite(format!("{}: {}", path.display(), e)))
}
