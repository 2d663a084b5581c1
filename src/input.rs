use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// One logical action bound to one or more physical keys. Ctrl-chords
/// are matched on the modifier; plain bindings ignore Shift so that
/// `G`-style keys work across terminals.
#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<(KeyCode, bool)>,
    pub help_key: &'static str,
    pub help_desc: &'static str,
}

impl Binding {
    fn new(keys: Vec<(KeyCode, bool)>, help_key: &'static str, help_desc: &'static str) -> Self {
        Binding {
            keys,
            help_key,
            help_desc,
        }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        self.keys
            .iter()
            .any(|(code, wants_ctrl)| *code == key.code && *wants_ctrl == ctrl)
    }
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    pub quit: Binding,
    pub help: Binding,
    pub up: Binding,
    pub down: Binding,
    pub left: Binding,
    pub right: Binding,
    pub top: Binding,
    pub bottom: Binding,
    pub enter: Binding,
    pub back: Binding,
    pub tab: Binding,

    pub refresh: Binding,
    pub filter: Binding,
    pub sort: Binding,
    pub search: Binding,

    pub fetch_all: Binding,
    pub prune_remote: Binding,
    pub cleanup_merged: Binding,

    pub open_pr: Binding,
    pub copy_branch: Binding,
    pub copy_url: Binding,
    pub copy_pr_number: Binding,
    pub open_url: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        let plain = |code: KeyCode| (code, false);
        let ctrl = |code: KeyCode| (code, true);

        KeyMap {
            quit: Binding::new(
                vec![plain(KeyCode::Char('q')), ctrl(KeyCode::Char('c'))],
                "q",
                "quit",
            ),
            help: Binding::new(vec![plain(KeyCode::Char('?'))], "?", "help"),
            up: Binding::new(
                vec![plain(KeyCode::Char('k')), plain(KeyCode::Up)],
                "k/↑",
                "up",
            ),
            down: Binding::new(
                vec![plain(KeyCode::Char('j')), plain(KeyCode::Down)],
                "j/↓",
                "down",
            ),
            left: Binding::new(
                vec![plain(KeyCode::Char('h')), plain(KeyCode::Left)],
                "h/←",
                "previous tab",
            ),
            right: Binding::new(
                vec![plain(KeyCode::Char('l')), plain(KeyCode::Right)],
                "l/→",
                "next tab",
            ),
            top: Binding::new(
                vec![plain(KeyCode::Char('g')), plain(KeyCode::Home)],
                "g",
                "top",
            ),
            bottom: Binding::new(
                vec![plain(KeyCode::Char('G')), plain(KeyCode::End)],
                "G",
                "bottom",
            ),
            enter: Binding::new(vec![plain(KeyCode::Enter)], "enter", "select"),
            back: Binding::new(
                vec![plain(KeyCode::Esc), plain(KeyCode::Backspace)],
                "esc",
                "back",
            ),
            tab: Binding::new(vec![plain(KeyCode::Tab)], "tab", "next tab"),
            refresh: Binding::new(
                vec![plain(KeyCode::Char('r')), ctrl(KeyCode::Char('r'))],
                "r",
                "refresh",
            ),
            filter: Binding::new(vec![plain(KeyCode::Char('f'))], "f", "filter"),
            sort: Binding::new(vec![plain(KeyCode::Char('s'))], "s", "sort"),
            search: Binding::new(vec![plain(KeyCode::Char('/'))], "/", "search"),
            fetch_all: Binding::new(vec![plain(KeyCode::Char('F'))], "F", "fetch all"),
            prune_remote: Binding::new(vec![plain(KeyCode::Char('P'))], "P", "prune"),
            cleanup_merged: Binding::new(vec![plain(KeyCode::Char('C'))], "C", "cleanup"),
            open_pr: Binding::new(vec![plain(KeyCode::Char('p'))], "p", "open/create PR"),
            copy_branch: Binding::new(vec![plain(KeyCode::Char('b'))], "b", "copy branch"),
            copy_url: Binding::new(vec![plain(KeyCode::Char('u'))], "u", "copy URL"),
            copy_pr_number: Binding::new(vec![plain(KeyCode::Char('n'))], "n", "copy PR number"),
            open_url: Binding::new(vec![plain(KeyCode::Char('o'))], "o", "open URL"),
        }
    }
}

impl KeyMap {
    /// Rows for the help view.
    pub fn help_rows(&self) -> Vec<(&'static str, &'static str)> {
        [
            &self.up,
            &self.down,
            &self.top,
            &self.bottom,
            &self.enter,
            &self.back,
            &self.tab,
            &self.filter,
            &self.sort,
            &self.search,
            &self.refresh,
            &self.fetch_all,
            &self.prune_remote,
            &self.cleanup_merged,
            &self.open_pr,
            &self.copy_branch,
            &self.copy_url,
            &self.copy_pr_number,
            &self.open_url,
            &self.help,
            &self.quit,
        ]
        .iter()
        .map(|b| (b.help_key, b.help_desc))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::CONTROL)
    }

    #[test]
    fn refresh_matches_r_and_ctrl_r() {
        let keys = KeyMap::default();
        assert!(keys.refresh.matches(&press(KeyCode::Char('r'))));
        assert!(keys.refresh.matches(&ctrl_press(KeyCode::Char('r'))));
        assert!(!keys.refresh.matches(&press(KeyCode::Char('x'))));
    }

    #[test]
    fn quit_requires_ctrl_for_c() {
        let keys = KeyMap::default();
        assert!(keys.quit.matches(&ctrl_press(KeyCode::Char('c'))));
        assert!(!keys.quit.matches(&press(KeyCode::Char('c'))));
        assert!(keys.quit.matches(&press(KeyCode::Char('q'))));
    }

    #[test]
    fn arrows_and_vim_keys_both_navigate() {
        let keys = KeyMap::default();
        assert!(keys.up.matches(&press(KeyCode::Up)));
        assert!(keys.up.matches(&press(KeyCode::Char('k'))));
        assert!(keys.down.matches(&press(KeyCode::Down)));
        assert!(keys.down.matches(&press(KeyCode::Char('j'))));
    }
}
