use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::cli::state::{App, Mode};
use crate::cli::util::{bucket_meta, fmt_vnd};
use crate::funds::{parse_amount, BucketBalances, BucketKey};

pub fn draw<S>(f: &mut Frame, app: &mut App<S>) {
    let size = f.size();

    // header | buckets | status bar
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(3)])
        .split(size);

    draw_header(f, root[0], app);
    draw_buckets(f, root[1], app);
    draw_status(f, root[2], app);

    match app.mode {
        Mode::Browse => {}
        Mode::Distribute => {
            let area = center_rect(root[1], 56, 14);
            f.render_widget(Clear, area);
            draw_distribute_modal(f, area, app);
        }
        Mode::Adjust(key) => {
            let area = center_rect(root[1], 56, 8);
            f.render_widget(Clear, area);
            let meta = bucket_meta(key);
            draw_prompt(
                f,
                area,
                &format!("{} {}", meta.icon, meta.label),
                "Add a positive amount or subtract a negative one",
                app,
            );
        }
        Mode::Endpoint => {
            let area = center_rect(root[1], 72, 8);
            f.render_widget(Clear, area);
            draw_prompt(f, area, "Sync endpoint", "URL of the sync script or server", app);
        }
        Mode::Ratios => {
            let area = center_rect(root[1], 48, 14);
            f.render_widget(Clear, area);
            draw_ratios_modal(f, area, app);
        }
        Mode::ConfirmPush => {
            let area = center_rect(root[1], 60, 6);
            f.render_widget(Clear, area);
            let p = Paragraph::new(
                "This sends the balances on this device to the\nendpoint, replacing its copy. Continue? (y/N)",
            )
            .block(Block::default().borders(Borders::ALL).title("Push to endpoint"));
            f.render_widget(p, area);
        }
        Mode::ConfirmPull => {
            let area = center_rect(root[1], 60, 6);
            f.render_widget(Clear, area);
            let p = Paragraph::new(
                "This replaces the balances on this device with the\nendpoint's copy. Continue? (y/N)",
            )
            .block(Block::default().borders(Borders::ALL).title("Load from endpoint"));
            f.render_widget(p, area);
        }
        Mode::Help => {
            let area = center_rect(root[1], 60, 18);
            f.render_widget(Clear, area);
            draw_help(f, area);
        }
    }

    if app.pending_sync.is_some() {
        let area = center_rect(root[1], 32, 3);
        f.render_widget(Clear, area);
        let p = Paragraph::new("Syncing…").block(Block::default().borders(Borders::ALL));
        f.render_widget(p, area);
    }
}

fn draw_header<S>(f: &mut Frame, area: Rect, app: &App<S>) {
    let sync = app.view.endpoint.clone().unwrap_or_else(|| "not configured".into());
    let line = Line::from(vec![
        Span::styled("Total ", Style::default().add_modifier(Modifier::DIM)),
        Span::styled(fmt_vnd(app.view.total), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::styled("Sync ", Style::default().add_modifier(Modifier::DIM)),
        Span::raw(sync),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Six Jars"));
    f.render_widget(p, area);
}

fn draw_buckets<S>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let header = Row::new(vec!["Bucket", "Ratio", "Balance"]).height(1);

    let body: Vec<Row> = BucketKey::ALL
        .iter()
        .map(|&key| {
            let meta = bucket_meta(key);
            let balance = app.view.balances.get(key);
            let balance_style = if balance.is_sign_negative() && !balance.is_zero() {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(meta.color)
            };
            Row::new(vec![
                Cell::from(format!("{} {}", meta.icon, meta.label)),
                Cell::from(format!("{}%", app.view.committed.get(key))),
                Cell::from(fmt_vnd(balance)).style(balance_style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(45),
        Constraint::Length(8),
        Constraint::Percentage(45),
    ];

    let table = Table::new(body, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Buckets  (Up/Down, Enter=adjust, d=distribute, r=ratios, p=push, l=load)"),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut app.table);
}

fn draw_status<S>(f: &mut Frame, area: Rect, app: &App<S>) {
    let p = Paragraph::new(app.status.as_str()).block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
}

fn draw_prompt<S>(f: &mut Frame, area: Rect, title: &str, hint: &str, app: &App<S>) {
    let lines = vec![
        hint.to_string(),
        String::new(),
        format!("> {}", app.input.rendered()),
        String::new(),
        "Enter: confirm | Esc: cancel".into(),
        app.error.clone().unwrap_or_default(),
    ]
    .join("\n");

    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn draw_distribute_modal<S>(f: &mut Frame, area: Rect, app: &App<S>) {
    let amount = parse_amount(&app.input.value).unwrap_or_default();
    let preview = BucketBalances::shares(amount, &app.view.ratios).unwrap_or_default();

    let mut lines = vec![
        format!("> {}", app.input.rendered()),
        String::new(),
    ];
    for (key, share) in preview.iter() {
        let meta = bucket_meta(key);
        lines.push(format!("{} {:<12} +{}", meta.icon, meta.label, fmt_vnd(share)));
    }
    lines.push(String::new());
    lines.push("Enter: distribute | Esc: cancel".into());
    if let Some(err) = &app.error {
        lines.push(err.clone());
    }

    let p = Paragraph::new(lines.join("\n"))
        .block(Block::default().borders(Borders::ALL).title("Just got paid?"));
    f.render_widget(p, area);
}

fn draw_ratios_modal<S>(f: &mut Frame, area: Rect, app: &mut App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(4)])
        .split(area);

    let total = app.view.ratios.total();
    let items: Vec<ListItem> = app
        .view
        .ratios
        .iter()
        .map(|(key, percent)| {
            let meta = bucket_meta(key);
            let bar = "█".repeat(usize::from(percent) / 5);
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} {:<12} {:>3}% ", meta.icon, meta.label, percent)),
                Span::styled(bar, Style::default().fg(meta.color)),
            ]))
        })
        .collect();

    let total_style = if total == 100 {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(vec![
                    Span::raw("Ratios "),
                    Span::styled(format!("{total}/100%"), total_style),
                ])),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, chunks[0], &mut app.ratio_sel);

    let footer = if let Some(err) = &app.error {
        err.clone()
    } else if total != 100 {
        "Ratios must add up to 100% before they can be saved.".into()
    } else {
        "Ratios are balanced. Enter saves them.".into()
    };
    let help = Paragraph::new(format!("←/→ ±1  PgUp/PgDn ±10  Enter save  Esc discard\n{footer}"))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    f.render_widget(help, chunks[1]);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        "Buckets:",
        "  Up/Down  : Select bucket",
        "  Enter/a  : Adjust selected bucket (+/-)",
        "  d        : Distribute a deposit across all buckets",
        "  r        : Edit ratios",
        "  e        : Set sync endpoint",
        "  p        : Push balances to endpoint (asks first)",
        "  l        : Load balances from endpoint (overwrites)",
        "  q        : Quit",
        "",
        "Ratios:",
        "  Left/Right, -/+ : Change by 1",
        "  PgDn/PgUp       : Change by 10",
        "  Enter           : Save (only when total is 100%)",
        "  Esc             : Discard edits",
    ].join("\n");

    let p = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));

    f.render_widget(p, area);
}

fn center_rect(rect: Rect, w: u16, h: u16) -> Rect {
    let x = rect.x + rect.width.saturating_sub(w) / 2;
    let y = rect.y + rect.height.saturating_sub(h) / 2;
    Rect { x, y, width: w.min(rect.width), height: h.min(rect.height) }
}
