//! Keyboard input read from the terminal with crossterm.
//!
//! Keys map to [`UiEvent`]s:
//!
//! - `Shift+1` / `Shift+2` / `Shift+S` and other modified keys become hotkeys
//!   resolved by the chart's keymap
//! - plain `1`..`6` pick the timeframe `1D`, `4H`, `1H`, `15M`, `5M`, `1M`
//! - `Tab` switches the pane the timeframe keys target
//! - `q`, `Esc` and `Ctrl+C` quit

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use super::binding::{EventSource, Pane, UiEvent};
use super::keymap::{Hotkey, Modifier};
use crate::errors::AppError;
use crate::models::config::DisplayTimeframe;

/// Characters a US layout produces for Shift plus a digit.
const SHIFTED_DIGITS: [(char, char); 10] = [
    ('!', '1'),
    ('@', '2'),
    ('#', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
];

/// Blocking [`EventSource`] over terminal key and resize events.
#[derive(Debug)]
pub struct KeyEvents {
    target: Pane,
}

impl Default for KeyEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyEvents {
    /// Timeframe keys start out targeting the right pane.
    pub fn new() -> Self {
        KeyEvents {
            target: Pane::Right,
        }
    }

    pub fn target(&self) -> Pane {
        self.target
    }

    fn translate(&mut self, event: Event) -> Option<UiEvent> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Press => None,
            Event::Key(KeyEvent {
                code: KeyCode::Tab, ..
            }) => {
                self.target = match self.target {
                    Pane::Left => Pane::Right,
                    Pane::Right => Pane::Left,
                };
                info!("Timeframe keys target the {} pane", self.target.as_str());
                None
            }
            Event::Key(key) => {
                let mapped = map_key(&key, self.target);
                if mapped.is_none() {
                    debug!("Ignoring key {:?}", key.code);
                }
                mapped
            }
            Event::Resize(..) => Some(UiEvent::Redraw),
            _ => None,
        }
    }
}

impl EventSource for KeyEvents {
    fn next_event(&mut self) -> Result<Option<UiEvent>, AppError> {
        loop {
            let event = event::read()
                .map_err(|e| AppError::Surface(format!("terminal input: {}", e)))?;
            if let Some(ui) = self.translate(event) {
                return Ok(Some(ui));
            }
        }
    }
}

/// Map one key press. Timeframe keys are sent to `pane`.
pub fn map_key(key: &KeyEvent, pane: Pane) -> Option<UiEvent> {
    let mods = key.modifiers;
    match key.code {
        KeyCode::Esc => Some(UiEvent::Quit),
        KeyCode::Char('c') if mods.contains(KeyModifiers::CONTROL) => Some(UiEvent::Quit),
        KeyCode::Char(c) if mods.contains(KeyModifiers::CONTROL) => {
            Some(UiEvent::Key(Hotkey {
                modifier: Modifier::Ctrl,
                key: c,
            }))
        }
        KeyCode::Char(c) if mods.contains(KeyModifiers::ALT) => Some(UiEvent::Key(Hotkey {
            modifier: Modifier::Alt,
            key: c,
        })),
        KeyCode::Char(c) => {
            if let Some(&(_, digit)) = SHIFTED_DIGITS.iter().find(|(s, _)| *s == c) {
                return Some(UiEvent::Key(Hotkey::shift(digit)));
            }
            if mods.contains(KeyModifiers::SHIFT) || c.is_ascii_uppercase() {
                return Some(UiEvent::Key(Hotkey::shift(c)));
            }
            if c == 'q' {
                return Some(UiEvent::Quit);
            }
            timeframe_key(c).map(|tf| UiEvent::TimeframeSelected {
                pane,
                label: tf.as_str().to_string(),
            })
        }
        _ => None,
    }
}

fn timeframe_key(c: char) -> Option<DisplayTimeframe> {
    let digit = c.to_digit(10)? as usize;
    DisplayTimeframe::ALL.get(digit.checked_sub(1)?).copied()
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;
    use crate::ui::keymap::{KeyCommand, Keymap};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn hotkey(event: Option<UiEvent>) -> Hotkey {
        match event {
            Some(UiEvent::Key(hotkey)) => hotkey,
            other => panic!("expected a hotkey, got {:?}", other),
        }
    }

    #[test]
    fn test_shift_digits_resolve_to_navigation() {
        let keymap = Keymap::default();
        // Legacy terminals report the shifted symbol, others the digit
        let bang = hotkey(map_key(&press(KeyCode::Char('!'), KeyModifiers::SHIFT), Pane::Right));
        let one = hotkey(map_key(&press(KeyCode::Char('1'), KeyModifiers::SHIFT), Pane::Right));
        let at = hotkey(map_key(&press(KeyCode::Char('@'), KeyModifiers::NONE), Pane::Right));
        assert_eq!(keymap.resolve(&bang), Some(KeyCommand::Advance));
        assert_eq!(keymap.resolve(&one), Some(KeyCommand::Advance));
        assert_eq!(keymap.resolve(&at), Some(KeyCommand::Retreat));
    }

    #[test]
    fn test_shift_s_resolves_to_screenshot() {
        let keymap = Keymap::default();
        let key = hotkey(map_key(&press(KeyCode::Char('S'), KeyModifiers::SHIFT), Pane::Left));
        assert_eq!(keymap.resolve(&key), Some(KeyCommand::Screenshot));
    }

    #[test]
    fn test_plain_digits_select_timeframes() {
        let event = map_key(&press(KeyCode::Char('2'), KeyModifiers::NONE), Pane::Left);
        assert_eq!(
            event,
            Some(UiEvent::TimeframeSelected {
                pane: Pane::Left,
                label: "4H".into()
            })
        );
        let event = map_key(&press(KeyCode::Char('6'), KeyModifiers::NONE), Pane::Right);
        assert_eq!(
            event,
            Some(UiEvent::TimeframeSelected {
                pane: Pane::Right,
                label: "1M".into()
            })
        );
        assert_eq!(map_key(&press(KeyCode::Char('7'), KeyModifiers::NONE), Pane::Right), None);
        assert_eq!(map_key(&press(KeyCode::Char('0'), KeyModifiers::NONE), Pane::Right), None);
    }

    #[test]
    fn test_quit_keys() {
        for key in [
            press(KeyCode::Esc, KeyModifiers::NONE),
            press(KeyCode::Char('q'), KeyModifiers::NONE),
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert_eq!(map_key(&key, Pane::Right), Some(UiEvent::Quit));
        }
        assert_eq!(map_key(&press(KeyCode::Char('x'), KeyModifiers::NONE), Pane::Right), None);
        assert_eq!(map_key(&press(KeyCode::Left, KeyModifiers::NONE), Pane::Right), None);
    }

    #[test]
    fn test_tab_switches_timeframe_target() {
        let mut events = KeyEvents::new();
        assert_eq!(events.target(), Pane::Right);
        let tab = Event::Key(press(KeyCode::Tab, KeyModifiers::NONE));
        assert_eq!(events.translate(tab), None);
        assert_eq!(events.target(), Pane::Left);

        let digit = Event::Key(press(KeyCode::Char('3'), KeyModifiers::NONE));
        assert_eq!(
            events.translate(digit),
            Some(UiEvent::TimeframeSelected {
                pane: Pane::Left,
                label: "1H".into()
            })
        );
    }

    #[test]
    fn test_releases_ignored_and_resize_redraws() {
        let mut events = KeyEvents::new();
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
            ..press(KeyCode::Char('!'), KeyModifiers::SHIFT)
        };
        assert_eq!(events.translate(Event::Key(release)), None);
        assert_eq!(events.translate(Event::Resize(80, 24)), Some(UiEvent::Redraw));
        assert_eq!(events.translate(Event::FocusGained), None);
    }
}
