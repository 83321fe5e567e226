#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
}

/// A key press with its modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifier: Modifier,
    pub key: char,
}

impl Hotkey {
    pub const fn shift(key: char) -> Self {
        Hotkey {
            modifier: Modifier::Shift,
            key,
        }
    }

    fn matches(&self, other: &Hotkey) -> bool {
        self.modifier == other.modifier && self.key.eq_ignore_ascii_case(&other.key)
    }
}

/// Chart actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Advance,
    Retreat,
    Screenshot,
}

#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: Vec<(Hotkey, KeyCommand)>,
}

impl Default for Keymap {
    /// Shift+1 advances, Shift+2 goes back, Shift+S saves a screenshot.
    fn default() -> Self {
        Keymap {
            bindings: vec![
                (Hotkey::shift('1'), KeyCommand::Advance),
                (Hotkey::shift('2'), KeyCommand::Retreat),
                (Hotkey::shift('S'), KeyCommand::Screenshot),
            ],
        }
    }
}

impl Keymap {
    pub fn resolve(&self, hotkey: &Hotkey) -> Option<KeyCommand> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound.matches(hotkey))
            .map(|(_, command)| *command)
    }

    /// Rebind `command`, replacing any previous binding for it.
    pub fn bind(&mut self, hotkey: Hotkey, command: KeyCommand) {
        self.bindings.retain(|(_, c)| *c != command);
        self.bindings.push((hotkey, command));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let keymap = Keymap::default();
        assert_eq!(keymap.resolve(&Hotkey::shift('1')), Some(KeyCommand::Advance));
        assert_eq!(keymap.resolve(&Hotkey::shift('2')), Some(KeyCommand::Retreat));
        assert_eq!(keymap.resolve(&Hotkey::shift('s')), Some(KeyCommand::Screenshot));
        assert_eq!(keymap.resolve(&Hotkey::shift('3')), None);
        let ctrl_one = Hotkey {
            modifier: Modifier::Ctrl,
            key: '1',
        };
        assert_eq!(keymap.resolve(&ctrl_one), None);
    }

    #[test]
    fn test_rebind_replaces_previous_key() {
        let mut keymap = Keymap::default();
        keymap.bind(Hotkey::shift('N'), KeyCommand::Advance);
        assert_eq!(keymap.resolve(&Hotkey::shift('n')), Some(KeyCommand::Advance));
        assert_eq!(keymap.resolve(&Hotkey::shift('1')), None);
    }
}
