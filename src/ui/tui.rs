//! Terminal chart surface drawn with ratatui.
//!
//! One [`Screen`] owns the terminal and lays its panes out side by side.
//! Each pane is driven through its own [`TuiSurface`].

use std::cell::RefCell;
use std::io::{self, Stdout};
use std::rc::Rc;

use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use ratatui::{Frame, Terminal};

use super::surface::{
    ChartSurface, HorzAlign, LegendOptions, LineId, LinePoint, Screenshot, VertAlign, Watermark,
};
use crate::errors::AppError;
use crate::models::bar::Bar;

const LINE_COLORS: [Color; 4] = [Color::Yellow, Color::Cyan, Color::Magenta, Color::Blue];

pub type SharedScreen<B> = Rc<RefCell<Screen<B>>>;

/// Raw mode and the alternate screen, restored on drop.
pub struct TerminalSession {
    _private: (),
}

impl TerminalSession {
    pub fn enter() -> Result<Self, AppError> {
        enable_raw_mode().map_err(display_error)?;
        let session = TerminalSession { _private: () };
        execute!(io::stdout(), EnterAlternateScreen).map_err(display_error)?;
        Ok(session)
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    }
}

#[derive(Debug, Default)]
struct PaneState {
    label: String,
    bars: Vec<Bar>,
    lines: Vec<(String, Vec<LinePoint>)>,
    watermark: Option<Watermark>,
    legend: LegendOptions,
}

pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    panes: Vec<PaneState>,
    areas: Vec<Rect>,
    last_frame: Option<Buffer>,
}

impl<B: Backend> Screen<B> {
    pub fn new(backend: B) -> Result<SharedScreen<B>, AppError> {
        let terminal = Terminal::new(backend).map_err(display_error)?;
        Ok(Rc::new(RefCell::new(Screen {
            terminal,
            panes: Vec::new(),
            areas: Vec::new(),
            last_frame: None,
        })))
    }

    /// Redraw every pane from its current state.
    fn draw(&mut self) -> Result<(), AppError> {
        let panes = &self.panes;
        if panes.is_empty() {
            return Ok(());
        }
        let mut areas = Vec::new();
        let frame = self
            .terminal
            .draw(|f| {
                areas = pane_areas(f.area(), panes.len());
                for (pane, area) in panes.iter().zip(&areas) {
                    render_pane(f, pane, *area);
                }
            })
            .map_err(display_error)?;
        self.last_frame = Some(frame.buffer.clone());
        self.areas = areas;
        Ok(())
    }

    /// Text of one pane as last drawn, trailing blanks trimmed.
    fn pane_text(&self, slot: usize) -> Option<String> {
        let buffer = self.last_frame.as_ref()?;
        let area = *self.areas.get(slot)?;
        let mut text = String::new();
        for y in area.top()..area.bottom() {
            let row: String = (area.left()..area.right())
                .filter_map(|x| buffer.cell((x, y)).map(|c| c.symbol()))
                .collect();
            text.push_str(row.trim_end());
            text.push('\n');
        }
        Some(text)
    }
}

/// Screen on the process's stdout.
pub fn stdout_screen() -> Result<SharedScreen<CrosstermBackend<Stdout>>, AppError> {
    Screen::new(CrosstermBackend::new(io::stdout()))
}

/// One pane of a [`Screen`].
pub struct TuiSurface<B: Backend> {
    screen: SharedScreen<B>,
    slot: usize,
}

impl<B: Backend> TuiSurface<B> {
    /// Add a pane to `screen`. Attach every pane before the first draw.
    pub fn attach(screen: &SharedScreen<B>, label: impl Into<String>) -> Self {
        let mut inner = screen.borrow_mut();
        inner.panes.push(PaneState {
            label: label.into(),
            ..Default::default()
        });
        TuiSurface {
            screen: Rc::clone(screen),
            slot: inner.panes.len() - 1,
        }
    }

    fn with_pane<T>(&self, f: impl FnOnce(&mut PaneState) -> T) -> Result<T, AppError> {
        let mut screen = self.screen.borrow_mut();
        let pane = screen
            .panes
            .get_mut(self.slot)
            .ok_or_else(|| AppError::Surface(format!("unknown pane {}", self.slot)))?;
        Ok(f(pane))
    }
}

impl<B: Backend> ChartSurface for TuiSurface<B> {
    fn set_bars(&mut self, bars: &[Bar]) -> Result<(), AppError> {
        self.with_pane(|p| p.bars = bars.to_vec())
    }

    fn create_line(&mut self, name: &str) -> Result<LineId, AppError> {
        self.with_pane(|p| {
            p.lines.push((name.to_string(), Vec::new()));
            LineId(p.lines.len() - 1)
        })
    }

    fn set_line(&mut self, line: LineId, points: &[LinePoint]) -> Result<(), AppError> {
        self.with_pane(|p| match p.lines.get_mut(line.0) {
            Some(slot) => {
                slot.1 = points.to_vec();
                Ok(())
            }
            None => Err(AppError::Surface(format!("unknown line {}", line.0))),
        })?
    }

    fn set_watermark(&mut self, watermark: &Watermark) -> Result<(), AppError> {
        self.with_pane(|p| p.watermark = Some(watermark.clone()))
    }

    fn set_legend(&mut self, legend: &LegendOptions) -> Result<(), AppError> {
        self.with_pane(|p| p.legend = legend.clone())
    }

    /// The pane's cells as plain text.
    fn screenshot(&mut self) -> Result<Screenshot, AppError> {
        let mut screen = self.screen.borrow_mut();
        if screen.last_frame.is_none() {
            screen.draw()?;
        }
        let text = screen
            .pane_text(self.slot)
            .ok_or_else(|| AppError::Surface(format!("pane {} was never drawn", self.slot)))?;
        Ok(Screenshot {
            bytes: text.into_bytes(),
            extension: "txt",
        })
    }

    fn refresh(&mut self) -> Result<(), AppError> {
        self.screen.borrow_mut().draw()
    }
}

fn display_error(err: io::Error) -> AppError {
    AppError::Surface(err.to_string())
}

fn pane_areas(area: Rect, count: usize) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, count as u32); count])
        .split(area)
        .to_vec()
}

fn render_pane(f: &mut Frame<'_>, pane: &PaneState, area: Rect) {
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let mut centered = None;
    if let Some(wm) = &pane.watermark {
        let title = Line::from(Span::styled(format!(" {} ", wm.text), watermark_style(wm)))
            .alignment(alignment(wm.horz_align));
        match wm.vert_align {
            VertAlign::Top => block = block.title_top(title),
            VertAlign::Bottom => block = block.title_bottom(title),
            VertAlign::Center => centered = Some(title),
        }
    }
    let inner = block.inner(area);
    f.render_widget(block, area);

    let (chart_area, legend_area) = if pane.legend.visible && inner.height > 1 {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        (rows[0], Some(rows[1]))
    } else {
        (inner, None)
    };

    // Behind the candles
    if let Some(title) = centered {
        let row = Rect {
            y: chart_area.y + chart_area.height / 2,
            height: chart_area.height.min(1),
            ..chart_area
        };
        f.render_widget(Paragraph::new(title), row);
    }
    f.render_widget(
        CandleChart {
            bars: &pane.bars,
            lines: &pane.lines,
        },
        chart_area,
    );
    if let Some(legend_area) = legend_area {
        f.render_widget(Paragraph::new(legend_line(pane)), legend_area);
    }
}

fn watermark_style(wm: &Watermark) -> Style {
    Style::default()
        .fg(parse_color(&wm.color).unwrap_or(Color::DarkGray))
        .add_modifier(Modifier::BOLD)
}

fn alignment(align: HorzAlign) -> Alignment {
    match align {
        HorzAlign::Left => Alignment::Left,
        HorzAlign::Center => Alignment::Center,
        HorzAlign::Right => Alignment::Right,
    }
}

/// `#rrggbb`, `rgb(r, g, b)` or `rgba(r, g, b, a)`. Alpha is ignored.
fn parse_color(spec: &str) -> Option<Color> {
    let spec = spec.trim();
    if let Some(hex) = spec.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let v = u32::from_str_radix(hex, 16).ok()?;
        return Some(Color::Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8));
    }
    let body = spec
        .strip_prefix("rgba(")
        .or_else(|| spec.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let mut parts = body.split(',').map(|p| p.trim().parse::<u8>());
    let r = parts.next()?.ok()?;
    let g = parts.next()?.ok()?;
    let b = parts.next()?.ok()?;
    Some(Color::Rgb(r, g, b))
}

fn legend_line(pane: &PaneState) -> Line<'static> {
    let legend = &pane.legend;
    let mut spans = vec![Span::styled(
        format!("{} ", pane.label),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let (true, Some(last)) = (legend.ohlc, pane.bars.last()) {
        spans.push(Span::raw(format!(
            "O {:.2} H {:.2} L {:.2} C {:.2} V {}",
            last.open, last.high, last.low, last.close, last.volume
        )));
        if let (true, Some(first)) = (legend.percent, pane.bars.first()) {
            if first.open != 0.0 {
                let change = (last.close / first.open - 1.0) * 100.0;
                spans.push(Span::raw(format!(" ({:+.2}%)", change)));
            }
        }
    }
    if legend.lines {
        for (n, (name, points)) in pane.lines.iter().enumerate() {
            if let Some(p) = points.last() {
                spans.push(Span::styled(
                    format!("  {} {:.2}", name, p.value),
                    Style::default().fg(LINE_COLORS[n % LINE_COLORS.len()]),
                ));
            }
        }
    }
    Line::from(spans)
}

/// Candlesticks, one column per bar, with line overlays on top. Shows the
/// most recent bars when they do not all fit.
struct CandleChart<'a> {
    bars: &'a [Bar],
    lines: &'a [(String, Vec<LinePoint>)],
}

struct PriceScale {
    lo: f64,
    hi: f64,
    top: u16,
    height: u16,
}

impl PriceScale {
    fn row(&self, price: f64) -> u16 {
        let ratio = ((price - self.lo) / (self.hi - self.lo)).clamp(0.0, 1.0);
        let from_bottom = (ratio * f64::from(self.height - 1)).round() as u16;
        self.top + (self.height - 1 - from_bottom)
    }
}

impl Widget for CandleChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.bars.is_empty() || area.width == 0 || area.height == 0 {
            return;
        }
        let start = self.bars.len().saturating_sub(area.width as usize);
        let visible = &self.bars[start..];
        let first_time = visible[0].timestamp;

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for b in visible {
            lo = lo.min(b.low);
            hi = hi.max(b.high);
        }
        for (_, points) in self.lines {
            for p in points.iter().filter(|p| p.time >= first_time) {
                lo = lo.min(p.value);
                hi = hi.max(p.value);
            }
        }
        let pad = ((hi - lo) * 0.05).max(1e-6);
        let scale = PriceScale {
            lo: lo - pad,
            hi: hi + pad,
            top: area.top(),
            height: area.height,
        };

        for (i, bar) in visible.iter().enumerate() {
            let x = area.left() + i as u16;
            let color = if bar.close >= bar.open {
                Color::Green
            } else {
                Color::Red
            };
            let body_top = scale.row(bar.open.max(bar.close));
            let body_bottom = scale.row(bar.open.min(bar.close));
            paint_column(buf, x, scale.row(bar.high), scale.row(bar.low), "│", color);
            paint_column(buf, x, body_top, body_bottom, "█", color);
        }

        for (n, (_, points)) in self.lines.iter().enumerate() {
            let color = LINE_COLORS[n % LINE_COLORS.len()];
            for p in points {
                let Ok(idx) = self.bars.binary_search_by_key(&p.time, |b| b.timestamp) else {
                    continue;
                };
                if idx < start {
                    continue;
                }
                let x = area.left() + (idx - start) as u16;
                if let Some(cell) = buf.cell_mut((x, scale.row(p.value))) {
                    cell.set_symbol("•").set_fg(color);
                }
            }
        }
    }
}

fn paint_column(buf: &mut Buffer, x: u16, top: u16, bottom: u16, symbol: &str, color: Color) {
    for y in top..=bottom {
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_symbol(symbol).set_fg(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::backend::TestBackend;

    use super::*;
    use crate::engine::navigator::{ChartNavigator, Resolution};
    use crate::models::config::DisplayTimeframe;
    use crate::models::indicator::{IndicatorKind, IndicatorSpec};
    use crate::test_util::{bar, january_table, windows};
    use crate::ui::binding::{BindingOptions, ChartBinding};

    fn navigator(resolution: Resolution) -> ChartNavigator {
        let table = january_table(&[("AAA", 100.0)]);
        ChartNavigator::new(
            windows(&["AAA"]).into(),
            Arc::new(table),
            vec![IndicatorSpec::new(IndicatorKind::SMA, 3)].into(),
            resolution,
        )
        .unwrap()
    }

    fn text(surface: &mut TuiSurface<TestBackend>) -> String {
        String::from_utf8(surface.screenshot().unwrap().bytes).unwrap()
    }

    #[test]
    fn test_single_pane_renders_chart() {
        let screen = Screen::new(TestBackend::new(80, 20)).unwrap();
        let surface = TuiSurface::attach(&screen, "chart");
        let mut binding =
            ChartBinding::new(surface, navigator(Resolution::Daily), BindingOptions::default())
                .unwrap();
        binding.advance().unwrap();

        let shot = binding.surface().screen.borrow().pane_text(0).unwrap();
        let first_line = shot.lines().next().unwrap();
        assert!(first_line.contains(" AAA 1D 2023-01-15 "));
        assert!(shot.contains('█'));
        assert!(shot.contains('•'));
        assert!(shot.contains("chart O 119.50 H 121.00 L 119.00 C 120.00 V 1000"));
        assert!(shot.contains("SMA_3 119.00"));
    }

    #[test]
    fn test_dual_panes_render_side_by_side() {
        let screen = Screen::new(TestBackend::new(120, 16)).unwrap();
        let left = TuiSurface::attach(&screen, "left");
        let right = TuiSurface::attach(&screen, "right");
        let minute = Resolution::Minute {
            timeframe: DisplayTimeframe::M1,
        };
        let options = BindingOptions::default();
        let _left = ChartBinding::new(left, navigator(Resolution::Daily), options.clone())
            .unwrap();
        let mut right = ChartBinding::new(right, navigator(minute), options).unwrap();
        right.change_timeframe("4H").unwrap();

        let left_text = screen.borrow().pane_text(0).unwrap();
        let right_text = screen.borrow().pane_text(1).unwrap();
        assert!(left_text.contains("AAA 1D 2023-01-15"));
        assert!(!left_text.contains("4H"));
        assert!(right_text.contains("AAA 4H 2023-01-15"));
        assert!(right_text.contains("right O"));
    }

    #[test]
    fn test_centered_watermark_and_hidden_legend() {
        let screen = Screen::new(TestBackend::new(40, 9)).unwrap();
        let mut surface = TuiSurface::attach(&screen, "chart");
        surface.set_bars(&[bar("2023-01-01", 10.0)]).unwrap();
        surface
            .set_watermark(&Watermark::new("MID").vert_align(VertAlign::Center))
            .unwrap();
        surface
            .set_legend(&LegendOptions {
                visible: false,
                ..Default::default()
            })
            .unwrap();
        surface.refresh().unwrap();

        let shot = text(&mut surface);
        let lines: Vec<&str> = shot.lines().collect();
        assert!(!lines[0].contains("MID"));
        assert!(lines[4].contains("MID"));
        assert!(!shot.contains("chart O"));
    }

    #[test]
    fn test_unknown_line_is_an_error() {
        let screen = Screen::new(TestBackend::new(20, 5)).unwrap();
        let mut surface = TuiSurface::attach(&screen, "chart");
        assert!(matches!(
            surface.set_line(LineId(7), &[]),
            Err(AppError::Surface(_))
        ));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(
            parse_color("rgba(180, 180, 200, 0.5)"),
            Some(Color::Rgb(180, 180, 200))
        );
        assert_eq!(parse_color("rgb(1,2,3)"), Some(Color::Rgb(1, 2, 3)));
        assert_eq!(parse_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color("teal"), None);
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
    }
}
