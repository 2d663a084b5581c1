use once_cell::sync::Lazy;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, DetailTab, ViewMode};
use crate::models::{repo_name, PrInfo, RepoSummary};
use crate::theme::Theme;

// Build the style table once for all frames.
static THEME: Lazy<Theme> = Lazy::new(Theme::default);

pub fn render(f: &mut Frame, app: &App) {
    let theme = &*THEME;
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area);

    match app.view_mode {
        ViewMode::RepoList | ViewMode::Help | ViewMode::Filter | ViewMode::Sort => {
            render_repo_list(f, app, theme, chunks[0]);
        }
        ViewMode::RepoDetail => render_repo_detail(f, app, theme, chunks[0]),
        ViewMode::BranchDetail => render_branch_detail(f, app, theme, chunks[0]),
        ViewMode::PrDetail => render_pr_detail(f, app, theme, chunks[0]),
        ViewMode::BatchProgress => render_batch(f, app, theme, chunks[0]),
    }

    render_status_line(f, app, theme, chunks[1]);
    render_footer(f, app, theme, chunks[2]);

    // Overlays on top of the list.
    match app.view_mode {
        ViewMode::Help => render_help(f, app, theme),
        ViewMode::Filter => render_filter_editor(f, app, theme),
        ViewMode::Sort => render_sort_editor(f, app, theme),
        _ => {}
    }
}

fn pad(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

fn summary_line<'a>(app: &App, theme: &Theme, summary: &RepoSummary, selected: bool) -> Line<'a> {
    let marker = if selected { "→ " } else { "  " };

    if let Some(err) = &summary.error {
        return Line::from(vec![
            Span::raw(marker.to_string()),
            Span::styled(pad(&summary.name(), 24), theme.status_error),
            Span::styled(format!("error: {err}"), theme.status_error),
        ]);
    }

    let status_style = if summary.is_dirty() {
        theme.status_dirty
    } else {
        theme.status_clean
    };

    let pr_text = match &summary.pr_info {
        Some(pr) => format!("#{} {}", pr.number, pr.checks.summary()),
        None => {
            let count = app.pr_counts.get(&summary.path).copied().unwrap_or(0);
            if count > 0 {
                format!("{count} open")
            } else {
                "—".to_string()
            }
        }
    };
    let workflow_text = summary
        .workflow_info
        .as_ref()
        .map(|w| w.status_display())
        .unwrap_or("—");

    let mut spans = vec![
        Span::raw(marker.to_string()),
        Span::styled(
            pad(&summary.name(), 24),
            if selected { theme.selection } else { theme.repo_name },
        ),
        Span::styled(pad(&summary.branch, 20), theme.branch),
        Span::styled(pad(&summary.status_summary(), 14), status_style),
        Span::raw(pad(&pr_text, 14)),
        Span::raw(pad(workflow_text, 10)),
    ];
    if summary.stash_count > 0 {
        spans.push(Span::styled(
            format!("⚑{} ", summary.stash_count),
            theme.text_dim,
        ));
    }
    spans.push(Span::styled(summary.relative_modified(), theme.text_dim));
    Line::from(spans)
}

fn render_repo_list(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = if app.loading {
        format!(
            "Repositories ({}/{} loaded)",
            app.loaded_count, app.loading_count
        )
    } else {
        format!(
            "Repositories ({} shown, {} dirty, {} with PR)",
            app.filtered_paths.len(),
            app.dirty_count(),
            app.pr_count()
        )
    };

    let block = Block::default()
        .title(Span::styled(title, theme.border_title))
        .borders(Borders::ALL)
        .style(theme.border);

    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(block.inner(area));
    f.render_widget(block, area);

    // Header row / search prompt.
    if app.searching {
        let prompt = Paragraph::new(format!("/{}", app.search_input)).style(theme.selection);
        f.render_widget(prompt, inner_chunks[0]);
    } else {
        let header = Paragraph::new(format!(
            "  {}{}{}{}{}",
            pad("Repository", 24),
            pad("Branch", 20),
            pad("Status", 14),
            pad("PR", 14),
            pad("Checks", 10),
        ))
        .style(theme.header);
        f.render_widget(header, inner_chunks[0]);
    }

    if app.filtered_paths.is_empty() {
        let text = if app.loading {
            "Scanning for repositories..."
        } else {
            "No repositories found"
        };
        let style = if app.loading { theme.loading } else { theme.text_dim };
        let empty = Paragraph::new(text).style(style).alignment(Alignment::Center);
        f.render_widget(empty, inner_chunks[1]);
        return;
    }

    let items: Vec<ListItem> = app
        .filtered_paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let selected = i == app.cursor;
            match app.summaries.get(path) {
                Some(summary) => ListItem::new(summary_line(app, theme, summary, selected)),
                None => ListItem::new(Line::from(vec![
                    Span::raw(if selected { "→ " } else { "  " }),
                    Span::styled(pad(&repo_name(path), 24), theme.repo_name),
                    Span::styled("loading...", theme.loading),
                ])),
            }
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.cursor));
    f.render_stateful_widget(List::new(items), inner_chunks[1], &mut state);
}

fn detail_title(app: &App) -> String {
    app.selected_repo
        .as_deref()
        .map(|p| repo_name(p))
        .unwrap_or_default()
}

fn render_repo_detail(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = match app.selected_summary() {
        Some(summary) => format!(
            "{} [{} {}]",
            detail_title(app),
            summary.branch,
            summary.status_summary()
        ),
        None => detail_title(app),
    };
    let block = Block::default()
        .title(Span::styled(title, theme.border_title))
        .borders(Borders::ALL)
        .style(theme.border);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(inner);

    let titles = [
        DetailTab::Branches,
        DetailTab::Stashes,
        DetailTab::Worktrees,
        DetailTab::Prs,
    ]
    .map(|t| t.title());
    let tabs = Tabs::new(titles.to_vec())
        .select(app.detail_tab.index())
        .highlight_style(theme.tab_active)
        .divider(symbols::DOT);
    f.render_widget(tabs, chunks[0]);

    let lines: Vec<Line> = match app.detail_tab {
        DetailTab::Branches => app
            .branches
            .iter()
            .map(|b| {
                let mut spans = vec![
                    Span::raw(if b.is_current { "* " } else { "  " }),
                    Span::styled(pad(&b.name, 32), theme.branch),
                ];
                if b.ahead > 0 || b.behind > 0 {
                    spans.push(Span::styled(
                        pad(&format!("↑{} ↓{}", b.ahead, b.behind), 10),
                        theme.status_dirty,
                    ));
                } else {
                    spans.push(Span::raw(pad("", 10)));
                }
                spans.push(Span::styled(b.relative_last_commit(), theme.text_dim));
                Line::from(spans)
            })
            .collect(),
        DetailTab::Stashes => app
            .stashes
            .iter()
            .map(|s| {
                Line::from(vec![
                    Span::styled(format!("  stash@{{{}}} ", s.index), theme.selection),
                    Span::raw(s.message.clone()),
                    Span::styled(format!("  {}", s.relative_date()), theme.text_dim),
                ])
            })
            .collect(),
        DetailTab::Worktrees => app
            .worktrees
            .iter()
            .map(|w| {
                let mut flags = String::new();
                if w.is_bare {
                    flags.push_str(" [bare]");
                }
                if w.is_locked {
                    flags.push_str(" [locked]");
                }
                Line::from(vec![
                    Span::raw(format!("  {} ", w.path.display())),
                    Span::styled(w.branch.clone(), theme.branch),
                    Span::styled(flags, theme.text_dim),
                ])
            })
            .collect(),
        DetailTab::Prs => app.prs.iter().map(|pr| pr_row(theme, pr)).collect(),
    };

    if lines.is_empty() {
        // "Still loading" and "loaded, nothing there" must read differently.
        let (what, style) = if app.detail_loading {
            ("Loading...", theme.loading)
        } else {
            let none = match app.detail_tab {
                DetailTab::Branches => "No branches found",
                DetailTab::Stashes => "No stashes found",
                DetailTab::Worktrees => "No worktrees found",
                DetailTab::Prs => "No open pull requests",
            };
            (none, theme.text_dim)
        };
        let empty = Paragraph::new(what)
            .style(style)
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
        return;
    }

    let items: Vec<ListItem> = lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let item = ListItem::new(line);
            if i == app.detail_cursor {
                item.style(theme.selection)
            } else {
                item
            }
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.detail_cursor));
    f.render_stateful_widget(List::new(items), chunks[1], &mut state);
}

fn pr_row<'a>(theme: &Theme, pr: &PrInfo) -> Line<'a> {
    let state_style = if pr.is_draft {
        theme.pr_draft
    } else {
        match pr.state.as_str() {
            "OPEN" => theme.pr_open,
            "MERGED" => theme.pr_merged,
            _ => theme.text_dim,
        }
    };
    Line::from(vec![
        Span::styled(format!("  #{:<6}", pr.number), theme.selection),
        Span::styled(pad(pr.status_display(), 8), state_style),
        Span::raw(pad(&pr.title, 50)),
        Span::styled(pr.review_status().to_string(), theme.text_dim),
    ])
}

fn render_branch_detail(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let d = &app.branch_detail;
    let title = format!("{} — {}", detail_title(app), d.branch.name);
    let block = Block::default()
        .title(Span::styled(title, theme.border_title))
        .borders(Borders::ALL)
        .style(theme.border);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = vec![];
    if d.branch.name.is_empty() {
        lines.push(Line::styled("Loading branch details...", theme.loading));
    } else {
        if !d.branch.upstream.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Upstream: ", theme.header),
                Span::raw(d.branch.upstream.clone()),
                Span::styled(
                    format!("  ↑{} ↓{}", d.branch.ahead, d.branch.behind),
                    theme.status_dirty,
                ),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled("Changes:  ", theme.header),
            Span::raw(d.file_changes_summary()),
        ]));
        if let Some(pr) = &d.pr_info {
            lines.push(Line::from(vec![
                Span::styled("PR:       ", theme.header),
                Span::styled(format!("#{} ", pr.number), theme.selection),
                Span::raw(pr.title.clone()),
                Span::styled(format!("  [{}]", pr.status_display()), theme.pr_open),
            ]));
        }
        if let Some(wf) = &d.workflow_info {
            lines.push(Line::from(vec![
                Span::styled("Checks:   ", theme.header),
                Span::raw(wf.status_display()),
            ]));
            for run in &wf.runs {
                let style = match run.status_display() {
                    "success" => theme.checks_passing,
                    "failure" => theme.checks_failing,
                    _ => theme.checks_pending,
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("    {} ", run.name)),
                    Span::styled(run.status_display().to_string(), style),
                ]));
            }
        }
        lines.push(Line::raw(""));
        lines.push(Line::styled("Recent commits", theme.header));
        for c in &d.commits {
            lines.push(Line::from(vec![
                Span::styled(format!("  {} ", c.short_hash), theme.branch),
                Span::raw(pad(&c.subject, 60)),
                Span::styled(format!("{} · {}", c.author, c.relative_date()), theme.text_dim),
            ]));
        }
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn render_pr_detail(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let d = &app.pr_detail;
    let title = format!("{} — PR #{}", detail_title(app), d.info.number);
    let block = Block::default()
        .title(Span::styled(title, theme.border_title))
        .borders(Borders::ALL)
        .style(theme.border);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(d.info.title.clone(), theme.header),
            Span::styled(format!("  [{}]", d.info.status_display()), theme.pr_open),
        ]),
        Line::from(vec![
            Span::styled("Branch:   ", theme.header),
            Span::styled(d.info.head_ref.clone(), theme.branch),
            Span::raw(" → "),
            Span::styled(d.info.base_ref.clone(), theme.branch),
        ]),
    ];

    // Cheap fields render immediately; the rest waits on the full fetch.
    if d.is_fully_loaded() {
        lines.push(Line::from(vec![
            Span::styled("Author:   ", theme.header),
            Span::raw(d.author.clone()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Opened:   ", theme.header),
            Span::raw(d.relative_created()),
            Span::styled("   Updated: ", theme.header),
            Span::raw(d.relative_updated()),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Diff:     ", theme.header),
            Span::styled(format!("+{}", d.additions), theme.checks_passing),
            Span::raw(" / "),
            Span::styled(format!("-{}", d.deletions), theme.checks_failing),
            Span::styled(format!("   {} comments", d.comments), theme.text_dim),
        ]));
        lines.push(Line::from(vec![
            Span::styled("Review:   ", theme.header),
            Span::raw(d.info.review_status().to_string()),
        ]));
        if !d.assignees.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Assigned: ", theme.header),
                Span::raw(d.assignees.join(", ")),
            ]));
        }
        if !d.reviewers.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Awaiting: ", theme.header),
                Span::raw(d.reviewers.join(", ")),
            ]));
        }
        if !d.body.is_empty() {
            lines.push(Line::raw(""));
            for body_line in d.body.lines() {
                lines.push(Line::raw(body_line.to_string()));
            }
        }
    } else {
        lines.push(Line::styled("Loading full details...", theme.loading));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn render_batch(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = format!(
        "{} ({}/{})",
        app.batch_task,
        app.batch_results.len(),
        app.batch_total
    );
    let block = Block::default()
        .title(Span::styled(title, theme.border_title))
        .borders(Borders::ALL)
        .style(theme.border);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let mut lines: Vec<Line> = app
        .batch_results
        .iter()
        .map(|r| {
            let (mark, style) = if r.success {
                ("✓", theme.batch_ok)
            } else {
                ("✗", theme.batch_failed)
            };
            Line::from(vec![
                Span::styled(format!(" {mark} "), style),
                Span::raw(pad(&r.repo_name, 24)),
                Span::raw(pad(&r.message, 50)),
                Span::styled(format!("{}ms", r.duration_ms), theme.text_dim),
            ])
        })
        .collect();

    if app.batch_running {
        lines.push(Line::styled("Running...", theme.loading));
    } else {
        lines.push(Line::styled("Done. Press esc to go back.", theme.text_dim));
    }

    f.render_widget(Paragraph::new(lines), inner);
}

fn render_status_line(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    if !app.status_message.is_empty() {
        let status = Paragraph::new(format!(" {} ", app.status_message)).style(theme.status_bar);
        f.render_widget(status, area);
    }
}

fn render_footer(f: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let hints = match app.view_mode {
        ViewMode::RepoList => {
            "↑/↓ navigate | enter open | f filter | s sort | / search | r refresh | F/P/C batch | ? help | q quit"
        }
        ViewMode::RepoDetail => {
            "tab switch | ↑/↓ navigate | enter open | r refresh | esc back | q quit"
        }
        ViewMode::BranchDetail => "p open/create PR | b copy branch | o open URL | r refresh | esc back",
        ViewMode::PrDetail => {
            "↑/↓ adjacent PR | o open | u copy URL | n copy number | b copy branch | r refresh | esc back"
        }
        ViewMode::Help => "esc close",
        ViewMode::Filter => "enter/key cycle | * reset | esc close",
        ViewMode::Sort => "enter/key cycle | [/] priority | * reset | esc close",
        ViewMode::BatchProgress => "esc back (when finished) | q quit",
    };
    let footer = Paragraph::new(hints)
        .block(Block::default().borders(Borders::ALL))
        .style(theme.footer);
    f.render_widget(footer, area);
}

fn render_help(f: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(50, 80, f.area());
    f.render_widget(Clear, area);

    let lines: Vec<Line> = app
        .keys
        .help_rows()
        .into_iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme.selection),
                Span::raw(desc),
            ])
        })
        .collect();

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled("Help", theme.border_title))
            .borders(Borders::ALL)
            .style(theme.border),
    );
    f.render_widget(help, area);
}

fn render_filter_editor(f: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(40, 50, f.area());
    f.render_widget(Clear, area);

    let lines: Vec<Line> = crate::models::selectable_filter_modes()
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let active = app
                .active_filters
                .iter()
                .find(|af| af.mode == *mode)
                .copied();
            let marker = match active {
                Some(af) if af.enabled && af.inverted => "[!]",
                Some(af) if af.enabled => "[x]",
                _ => "[ ]",
            };
            let style = if i == app.filter_cursor {
                theme.selection
            } else {
                theme.repo_name
            };
            Line::styled(
                format!(" {} {} ({})", marker, mode.label(), mode.short_key()),
                style,
            )
        })
        .collect();

    let editor = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled("Filters", theme.border_title))
            .borders(Borders::ALL)
            .style(theme.border),
    );
    f.render_widget(editor, area);
}

fn render_sort_editor(f: &mut Frame, app: &App, theme: &Theme) {
    let area = centered_rect(40, 50, f.area());
    f.render_widget(Clear, area);

    let lines: Vec<Line> = crate::models::all_sort_modes()
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let active = app.active_sorts.iter().find(|s| s.mode == *mode).copied();
            let marker = match active {
                Some(s) if s.enabled => {
                    let arrow = if s.direction == crate::models::SortDirection::Asc {
                        "↑"
                    } else {
                        "↓"
                    };
                    format!("[{}{}]", s.priority + 1, arrow)
                }
                _ => "[  ]".to_string(),
            };
            let style = if i == app.sort_cursor {
                theme.selection
            } else {
                theme.repo_name
            };
            Line::styled(
                format!(" {} {} ({})", marker, mode.label(), mode.short_key()),
                style,
            )
        })
        .collect();

    let editor = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled("Sorting", theme.border_title))
            .borders(Borders::ALL)
            .style(theme.border),
    );
    f.render_widget(editor, area);
}

/// Centers a rectangle within another rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r)[1];
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical)[1]
}
