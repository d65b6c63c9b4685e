use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::app::{DashboardState, ShardView};
use crate::constants::{BAR_WIDTH, INPUT_POLL_MS, RATE_BAR_WIDTH};
use crate::error::UiError;
use crate::poller::{Phase, Poller, Scheduler};
use crate::util::{bar_cells, format_comma, format_eta, format_percent, format_rate, trend_arrow};

// Labels and separators that share a row with a bar
const BAR_ROW_OVERHEAD: u16 = 36;

pub fn run(
    poller: Poller,
    state: DashboardState,
    target: &str,
    period: Duration,
    shutdown: Arc<AtomicBool>,
) -> Result<(), UiError> {
    // Initialize terminal
    enable_raw_mode().map_err(UiError::Startup)?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(UiError::Startup(err));
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(err) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            return Err(UiError::Startup(err));
        }
    };

    let res = run_app_loop(&mut terminal, &poller, state, target, period, &shutdown);

    // Cleanup
    let restored = disable_raw_mode()
        .and_then(|_| execute!(terminal.backend_mut(), LeaveAlternateScreen))
        .and_then(|_| terminal.show_cursor());

    res.and(restored).map_err(UiError::Session)
}

fn run_app_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    poller: &Poller,
    mut state: DashboardState,
    target: &str,
    period: Duration,
    shutdown: &AtomicBool,
) -> io::Result<()> {
    let mut scheduler = Scheduler::new(period, Instant::now());
    let input_slice = Duration::from_millis(INPUT_POLL_MS);

    loop {
        terminal.draw(|f| draw_dashboard(f, &state, scheduler.phase(), target))?;
        scheduler.rendered(Instant::now());

        if shutdown.load(Ordering::SeqCst) {
            tracing::info!("interrupt received, quitting");
            return Ok(());
        }

        // Handle input
        let timeout = scheduler.wait_timeout(Instant::now(), input_slice);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if is_quit_key(&key) {
                    tracing::info!("quit requested");
                    return Ok(());
                }
            }
        }

        if scheduler.start_fetch(Instant::now()) {
            poller.request();
        } else if scheduler.phase() == Phase::Fetching {
            if let Some(result) = poller.try_recv() {
                state = state.advance(result);
                scheduler.fetch_done();
            }
        }
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

pub fn draw_dashboard(f: &mut Frame, state: &DashboardState, phase: Phase, target: &str) {
    // ============= whole screen layout ============
    let banner_height = if state.last_error.is_some() { 4 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Length(banner_height), // Error banner
            Constraint::Min(4),                // Shard panels
            Constraint::Length(1),             // Status bar
        ])
        .split(f.size());

    // ============= Header ============
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Snapchain Node Monitor", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(state.as_of.to_rfc2822(), Style::default().fg(Color::Gray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", target)),
    );
    f.render_widget(header, chunks[0]);

    // ============= Error banner ============
    if let Some(err) = &state.last_error {
        let banner = Paragraph::new(Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(err.clone(), Style::default().fg(Color::Red)),
        ]))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Red))
                .title(" last poll failed "),
        );
        f.render_widget(banner, chunks[1]);
    }

    // ============= Shard panels ============
    let shard_block = Block::default()
        .title(" Shards ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = shard_block.inner(chunks[2]);

    let lines = if state.shards.is_empty() {
        vec![Line::from(Span::styled(
            "Waiting for shard data...",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        state
            .shards
            .values()
            .flat_map(|view| shard_lines(view, state, inner))
            .collect()
    };
    f.render_widget(Paragraph::new(lines).block(shard_block), chunks[2]);

    // ============ Bottom Status Bar ============
    let phase_label = match phase {
        Phase::Idle => Span::styled("idle", Style::default().fg(Color::Green)),
        Phase::Fetching => Span::styled("fetching", Style::default().fg(Color::Yellow)),
        Phase::Rendering => Span::styled("rendering", Style::default().fg(Color::Cyan)),
    };
    let status_content = Line::from(vec![
        Span::styled(
            " SC-MON ",
            Style::default().bg(Color::White).fg(Color::Black).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        phase_label,
        Span::raw(format!(" | Window: {} samples", state.capacity())),
        Span::raw(" | (Press 'q' or ESC to quit)"),
    ]);
    let status_bar = Paragraph::new(status_content).style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(status_bar, chunks[3]);
}

fn shard_lines(view: &ShardView, state: &DashboardState, area: Rect) -> Vec<Line<'static>> {
    let snapshot = &view.snapshot;
    let metrics = &view.metrics;
    let samples = state.history(snapshot.shard_id).map_or(0, |h| h.len());
    let room = area.width.saturating_sub(BAR_ROW_OVERHEAD) as usize;

    let ratio = view.sync_ratio();
    let sync_color = if ratio > 0.7 {
        Color::Green
    } else if ratio > 0.4 {
        Color::Yellow
    } else {
        Color::Red
    };
    let (sync_filled, sync_empty) = bar_cells(ratio, BAR_WIDTH.min(room));
    let (rate_filled, rate_empty) = bar_cells(view.rate_ratio(state.max_rate), RATE_BAR_WIDTH.min(room));
    let label = Style::default().fg(Color::DarkGray);

    vec![
        Line::from(vec![
            Span::styled(
                format!("Shard {}", snapshot.shard_id),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(" | Height: ", label),
            Span::raw(format!("{:<10}", format_comma(snapshot.max_height))),
            Span::styled(" | Delay: ", label),
            Span::raw(format!("{:<10}", format_comma(snapshot.block_delay))),
            Span::styled(" | ETA: ", label),
            Span::raw(format!("{:<8}", format_eta(view.eta_secs()))),
            Span::styled(" | Samples: ", label),
            Span::raw(format!("{}/{}", samples, state.capacity())),
        ]),
        Line::from(vec![
            Span::styled("Sync status: ", label),
            Span::raw("["),
            Span::styled(sync_filled, Style::default().fg(sync_color)),
            Span::raw(sync_empty),
            Span::raw("] "),
            Span::styled(format_percent(ratio), Style::default().fg(sync_color)),
        ]),
        Line::from(vec![
            Span::styled("Blocks/sec:  ", label),
            Span::raw("["),
            Span::styled(rate_filled, Style::default().fg(Color::Gray)),
            Span::raw(rate_empty),
            Span::raw("] "),
            Span::styled(
                format_rate(metrics.instantaneous_rate),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::raw(trend_arrow(metrics.trend())),
            Span::styled(format!("  avg {}", format_rate(metrics.average_rate)), label),
        ]),
        Line::from(""),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{PollResult, ShardSnapshot};
    use crate::error::FetchError;
    use chrono::{Local, TimeZone};
    use ratatui::backend::TestBackend;

    fn render(state: &DashboardState, phase: Phase) -> String {
        let backend = TestBackend::new(140, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| draw_dashboard(f, state, phase, "http://localhost:3381/v1/info"))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    fn two_polls() -> DashboardState {
        let snap = |h| ShardSnapshot {
            shard_id: 1,
            max_height: h,
            block_delay: 1_000_000,
        };
        DashboardState::new(100)
            .advance(PollResult::Success {
                snapshots: vec![snap(1000)],
                observed_at: Local.timestamp_opt(1_700_000_000, 0).unwrap(),
            })
            .advance(PollResult::Success {
                snapshots: vec![snap(1050)],
                observed_at: Local.timestamp_opt(1_700_000_010, 0).unwrap(),
            })
    }

    #[test]
    fn renders_shard_rows() {
        let text = render(&two_polls(), Phase::Idle);
        assert!(text.contains("Snapchain Node Monitor"));
        assert!(text.contains("Shard 1"));
        assert!(text.contains("Height: 1,050"));
        assert!(text.contains("Delay: 1,000,000"));
        assert!(text.contains("5.00 blk/s ↗"));
        assert!(text.contains("ETA: 2d 7h"));
        assert!(text.contains("Samples: 2/100"));
        assert!(text.contains("Press 'q' or ESC to quit"));
        assert!(!text.contains("Error:"));
    }

    #[test]
    fn failure_shows_banner_over_last_good_view() {
        let state = two_polls().advance(PollResult::Failure {
            error: FetchError::Status {
                url: "http://localhost:3381/v1/info".into(),
                status: 500,
                body: "boom".into(),
            },
            observed_at: Local.timestamp_opt(1_700_000_012, 0).unwrap(),
        });
        let text = render(&state, Phase::Idle);
        assert!(text.contains("Error:"));
        assert!(text.contains("returned 500: boom"));
        assert!(text.contains("Shard 1"));
    }

    #[test]
    fn empty_state_shows_placeholder() {
        let text = render(&DashboardState::new(100), Phase::Fetching);
        assert!(text.contains("Waiting for shard data..."));
        assert!(text.contains("fetching"));
    }

    #[test]
    fn quit_keys() {
        let key = |code, modifiers| KeyEvent::new(code, modifiers);
        assert!(is_quit_key(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit_key(&key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit_key(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit_key(&key(KeyCode::Char('x'), KeyModifiers::NONE)));
    }
}
