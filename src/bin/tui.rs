mod tui_app;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tui_app::{
    format_apy, format_days, format_factor, format_spread, truncate, AppState, ConnectionStatus,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build HTTP client");

    let mut app = AppState::new(base_url);

    // Initial fetch before rendering
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();
    table_state.select(None);

    let result = run_loop(&mut terminal, &mut app, &client, &mut table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
    table_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(2);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, table_state))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.refresh(client).await;
                            fetch_selection_narrative(app, client, table_state).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Char('f') | KeyCode::Char('F') => {
                            app.cycle_tier_filter();
                            table_state.select(None);
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Char('s') | KeyCode::Char('S') => {
                            app.toggle_sort();
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Char('l') | KeyCode::Char('L') => {
                            app.toggle_locale();
                            app.refresh(client).await;
                            fetch_selection_narrative(app, client, table_state).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = app.markets.len().saturating_sub(1);
                            let next = table_state.selected().map_or(0, |i| (i + 1).min(max));
                            table_state.select(Some(next));
                            fetch_selection_narrative(app, client, table_state).await;
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = table_state
                                .selected()
                                .map_or(0, |i| i.saturating_sub(1));
                            table_state.select(Some(prev));
                            fetch_selection_narrative(app, client, table_state).await;
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            fetch_selection_narrative(app, client, table_state).await;
            last_tick = std::time::Instant::now();
        }
    }
}

/// Fetch the narrative for whichever market is currently selected.
async fn fetch_selection_narrative(
    app: &mut AppState,
    client: &reqwest::Client,
    table_state: &TableState,
) {
    let Some(idx) = table_state.selected() else { return };
    let Some(id) = app.markets.get(idx).map(|m| m.id.clone()) else { return };
    if app.narrative_for_market(&id).is_none() {
        app.fetch_narrative(client, &id).await;
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, table_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_body(f, app, table_state, chunks[1]);
    render_footer(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(e, 40)), Color::Red),
    };

    let title_spans = vec![
        Span::styled(
            " Pendle YT Analyzer  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} markets", app.summary.total_markets),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("SB:{}", app.summary.strong_buy),
            Style::default().fg(Color::Green),
        ),
        Span::raw(" "),
        Span::styled(format!("B:{}", app.summary.buy), Style::default().fg(Color::Blue)),
        Span::raw(" "),
        Span::styled(format!("H:{}", app.summary.hold), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(format!("A:{}", app.summary.avoid), Style::default().fg(Color::Red)),
        Span::raw("  │  "),
        Span::styled(
            format!("filter: {}", app.tier_filter()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(
            format!("lang: {}", app.locale),
            Style::default().fg(Color::White),
        ),
    ];

    let header_line = Line::from(title_spans);
    let paragraph = Paragraph::new(header_line)
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, table_state: &mut TableState, area: Rect) {
    // Horizontal split: market table (60%) | detail pane (40%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_markets_table(f, app, table_state, halves[0]);
    render_detail(f, app, table_state, halves[1]);
}

fn tier_color(tier: &str) -> Color {
    match tier {
        "strong_buy" => Color::Green,
        "buy" => Color::Blue,
        "hold" => Color::Yellow,
        "avoid" => Color::Red,
        _ => Color::White,
    }
}

fn render_markets_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let header_cells = ["#", "Market", "Score", "Tier", "Spread", "Maturity", "Lev"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .markets
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let spread = m.underlying_apy - m.implied_apy;
            let spread_color = if spread >= 3.0 {
                Color::Green
            } else if spread > 0.0 {
                Color::Yellow
            } else {
                Color::Red
            };

            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(&m.name, 26)),
                Cell::from(format!("{}", m.score))
                    .style(Style::default().fg(tier_color(&m.tier))),
                Cell::from(m.tier_label.clone())
                    .style(Style::default().fg(tier_color(&m.tier))),
                Cell::from(format_spread(spread)).style(Style::default().fg(spread_color)),
                Cell::from(format_days(m.days_to_maturity)),
                Cell::from(format!("{:.1}x", m.leverage)).style(Style::default().fg(Color::Cyan)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " ACTIVE OPPORTUNITIES ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    )
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_detail(f: &mut Frame, app: &AppState, table_state: &TableState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " DETAIL ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let Some(m) = table_state.selected().and_then(|i| app.markets.get(i)) else {
        let hint = Paragraph::new("Select a market with ↑↓ / j k")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(hint, area);
        return;
    };

    let spread = m.underlying_apy - m.implied_apy;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                m.name.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("[{}]", m.tier_label),
                Style::default().fg(tier_color(&m.tier)).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{} · {}", m.protocol, m.symbol), Style::default().fg(Color::DarkGray)),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Score: "),
            Span::styled(
                format!("{}/100", m.score),
                Style::default().fg(tier_color(&m.tier)).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("Implied APY: "),
            Span::styled(format_apy(m.implied_apy), Style::default().fg(Color::White)),
            Span::raw("   Underlying APY: "),
            Span::styled(format_apy(m.underlying_apy), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::raw("Spread: "),
            Span::styled(
                format_spread(spread),
                Style::default().fg(if spread > 0.0 { Color::Green } else { Color::Red }),
            ),
            Span::raw("   Maturity: "),
            Span::raw(format_days(m.days_to_maturity)),
            Span::raw("   Leverage: "),
            Span::styled(format!("{:.1}x", m.leverage), Style::default().fg(Color::Cyan)),
        ]),
        Line::raw(""),
        Line::from(Span::styled(
            "Factors",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "  spread {}  trend {}  maturity {}",
            format_factor(m.spread_factor),
            format_factor(m.trend_factor),
            format_factor(m.maturity_factor),
        )),
        Line::raw(""),
        Line::from(Span::styled(
            "Analysis",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(m.analysis.clone()),
        Line::raw(""),
    ];

    match app.narrative_for_market(&m.id) {
        Some(n) => {
            lines.push(Line::from(Span::styled(
                "AI Verdict",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(n.description.clone()));
            lines.push(Line::from(n.verdict.clone()));
        }
        None => {
            lines.push(Line::from(Span::styled(
                "Generating insights...",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let sort_label = if app.sort_descending { "high→low" } else { "low→high" };
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[f] ", Style::default().fg(Color::Yellow)),
        Span::raw("filter tier  "),
        Span::styled("[s] ", Style::default().fg(Color::Yellow)),
        Span::raw(format!("sort ({sort_label})  ")),
        Span::styled("[l] ", Style::default().fg(Color::Yellow)),
        Span::raw("language  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("select  "),
        Span::styled("auto-refresh: 2s", Style::default().fg(Color::DarkGray)),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
