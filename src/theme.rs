use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub border: Style,
    pub border_title: Style,
    pub selection: Style,
    pub text_dim: Style,
    pub header: Style,

    // Repo list columns
    pub repo_name: Style,
    pub branch: Style,
    pub status_clean: Style,
    pub status_dirty: Style,
    pub status_error: Style,

    // PR / workflow states
    pub pr_open: Style,
    pub pr_draft: Style,
    pub pr_merged: Style,
    pub checks_passing: Style,
    pub checks_failing: Style,
    pub checks_pending: Style,

    pub tab_active: Style,
    pub status_bar: Style,
    pub footer: Style,
    pub loading: Style,
    pub batch_ok: Style,
    pub batch_failed: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border: Style::default().fg(Color::Cyan),
            border_title: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selection: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            text_dim: Style::default().fg(Color::DarkGray),
            header: Style::default().add_modifier(Modifier::BOLD),

            repo_name: Style::default().fg(Color::White),
            branch: Style::default().fg(Color::Magenta),
            status_clean: Style::default().fg(Color::Green),
            status_dirty: Style::default().fg(Color::Yellow),
            status_error: Style::default().fg(Color::Red),

            pr_open: Style::default().fg(Color::Green),
            pr_draft: Style::default().fg(Color::DarkGray),
            pr_merged: Style::default().fg(Color::Magenta),
            checks_passing: Style::default().fg(Color::Green),
            checks_failing: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            checks_pending: Style::default().fg(Color::Yellow),

            tab_active: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            status_bar: Style::default().fg(Color::Black).bg(Color::Cyan),
            footer: Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            loading: Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            batch_ok: Style::default().fg(Color::Green),
            batch_failed: Style::default().fg(Color::Red),
        }
    }
}
