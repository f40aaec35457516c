use crate::app::{App, MenuState};
use crate::speedtest::{format_latency, format_mbps, TestPhase};
use crate::ui::spinner::Spinner;
use crate::updater::{manual_steps, UpdateOutcome, PACKAGE};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

// Color Palette - Elegant & Minimal
const ACCENT: Color = Color::Rgb(100, 149, 237);      // Cornflower blue
const SUCCESS: Color = Color::Rgb(134, 194, 156);     // Soft green
const SUCCESS_DIM: Color = Color::Rgb(80, 120, 90);
const UPLOAD: Color = Color::Rgb(200, 150, 210);      // Soft magenta
const WARN: Color = Color::Rgb(220, 180, 130);        // Soft amber
const ERROR: Color = Color::Rgb(225, 110, 110);       // Soft red
const TEXT_PRIMARY: Color = Color::Rgb(230, 230, 230);
const TEXT_SECONDARY: Color = Color::Rgb(160, 160, 160);
const TEXT_MUTED: Color = Color::Rgb(100, 100, 100);
const BORDER: Color = Color::Rgb(60, 60, 65);
const BORDER_ACTIVE: Color = Color::Rgb(100, 100, 110);

const CONTENT_WIDTH: u16 = 60;

pub fn draw_ui(frame: &mut Frame, app: &App, spinner: Option<&Spinner>) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(1),
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);

    let body = centered(chunks[1], CONTENT_WIDTH);
    match app.state {
        MenuState::MainMenu | MenuState::Exited => draw_menu(frame, body, app),
        MenuState::RunningTest => draw_test_view(frame, body, app, spinner),
        MenuState::ShowingVersion => draw_version(frame, body),
        MenuState::Updating => draw_update(frame, body, app, spinner),
    }

    draw_help(frame, chunks[2], app);
}

fn centered(area: Rect, width: u16) -> Rect {
    Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(width.min(area.width)),
        Constraint::Min(0),
    ])
    .split(area)[1]
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(BORDER));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::horizontal([
        Constraint::Length(12),
        Constraint::Min(10),
        Constraint::Length(20),
    ])
    .split(inner);

    // Title
    let title = Paragraph::new(PACKAGE)
        .style(Style::default().fg(TEXT_PRIMARY).add_modifier(Modifier::BOLD));
    frame.render_widget(title, chunks[0]);

    // Status
    let (status, color) = match app.state {
        MenuState::MainMenu | MenuState::Exited => ("Ready", TEXT_MUTED),
        MenuState::ShowingVersion => ("Version", TEXT_SECONDARY),
        MenuState::Updating => ("Updating", ACCENT),
        MenuState::RunningTest => match app.phase {
            TestPhase::Idle => ("Ready", TEXT_MUTED),
            TestPhase::Ping => ("Measuring latency...", WARN),
            TestPhase::Download => ("Testing download...", SUCCESS),
            TestPhase::Upload => ("Estimating upload...", UPLOAD),
            TestPhase::Complete => ("Complete", ACCENT),
        },
    };

    let status_text = Paragraph::new(status)
        .style(Style::default().fg(color))
        .alignment(Alignment::Center);
    frame.render_widget(status_text, chunks[1]);

    let right = if app.state == MenuState::RunningTest {
        create_phase_text(app.phase)
    } else {
        Line::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(TEXT_MUTED),
        )
    };
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), chunks[2]);
}

fn create_phase_text(phase: TestPhase) -> Line<'static> {
    let phases = [
        (TestPhase::Ping, "ping"),
        (TestPhase::Download, "down"),
        (TestPhase::Upload, "up"),
    ];

    let mut spans = Vec::new();

    for (i, (p, label)) in phases.iter().enumerate() {
        let is_active = phase == *p;
        let is_complete = match phase {
            TestPhase::Download => *p == TestPhase::Ping,
            TestPhase::Upload => *p == TestPhase::Ping || *p == TestPhase::Download,
            TestPhase::Complete => true,
            _ => false,
        };

        let style = if is_active {
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
        } else if is_complete {
            Style::default().fg(TEXT_SECONDARY)
        } else {
            Style::default().fg(TEXT_MUTED)
        };

        spans.push(Span::styled(*label, style));

        if i < phases.len() - 1 {
            spans.push(Span::styled(" / ", Style::default().fg(TEXT_MUTED)));
        }
    }

    Line::from(spans)
}

// Menu
fn draw_menu(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(6),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(" Select option ", Style::default().fg(ACCENT)));

    let options = [
        ("1.", "Run Speed Test", SUCCESS),
        ("2.", "View Version", WARN),
        ("3.", "Update", ACCENT),
        ("4.", "Exit", ERROR),
    ];

    let lines: Vec<Line> = options
        .iter()
        .map(|(key, label, color)| {
            Line::from(vec![
                Span::styled(format!(" {} ", key), Style::default().fg(*color).add_modifier(Modifier::BOLD)),
                Span::styled(*label, Style::default().fg(TEXT_PRIMARY)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), chunks[0]);

    if let Some(notice) = &app.notice {
        frame.render_widget(
            Paragraph::new(notice.as_str())
                .style(Style::default().fg(ERROR))
                .alignment(Alignment::Center),
            chunks[1],
        );
    }
}

// Speed test
fn draw_test_view(frame: &mut Frame, area: Rect, app: &App, spinner: Option<&Spinner>) {
    let chunks = Layout::vertical([
        Constraint::Length(4),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .split(area);

    let panels = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(chunks[0]);

    let ping = match app.phase {
        TestPhase::Idle | TestPhase::Ping => None,
        _ => Some(format_latency(app.result.ping_ms)),
    };
    let download = match app.phase {
        TestPhase::Download => app.download_progress.as_ref().map(|p| format_mbps(p.speed_mbps)),
        TestPhase::Upload | TestPhase::Complete => Some(format_mbps(app.result.download_mbps)),
        _ => None,
    };
    let upload = match app.phase {
        TestPhase::Complete => Some(format_mbps(app.result.upload_mbps)),
        _ => None,
    };

    draw_metric_panel(frame, panels[0], "Ping", WARN, app.phase == TestPhase::Ping, ping);
    draw_metric_panel(frame, panels[1], "Download", SUCCESS, app.phase == TestPhase::Download, download);
    draw_metric_panel(frame, panels[2], "Upload", UPLOAD, app.phase == TestPhase::Upload, upload);

    match (&app.download_progress, app.phase) {
        (Some(progress), TestPhase::Download) => {
            let live = Layout::horizontal([Constraint::Min(10), Constraint::Length(14)]).split(chunks[2]);
            draw_progress_bar(frame, live[0], progress.ratio, SUCCESS, SUCCESS_DIM);
            frame.render_widget(
                Paragraph::new(format_mbps(progress.speed_mbps))
                    .style(Style::default().fg(WARN))
                    .alignment(Alignment::Right),
                live[1],
            );

            let detail = format!(
                "server {} · {:.1} MB · {:.1}s",
                progress.candidate + 1,
                progress.downloaded_bytes as f64 / (1024.0 * 1024.0),
                progress.elapsed.as_secs_f64(),
            );
            frame.render_widget(
                Paragraph::new(detail)
                    .style(Style::default().fg(TEXT_MUTED))
                    .alignment(Alignment::Center),
                Rect { height: chunks[3].height.min(1), ..chunks[3] },
            );
        }
        _ => {
            if let Some(spinner) = spinner {
                draw_spinner(frame, chunks[2], spinner);
            } else if app.phase == TestPhase::Complete {
                frame.render_widget(
                    Paragraph::new("Test complete")
                        .style(Style::default().fg(TEXT_MUTED))
                        .alignment(Alignment::Center),
                    chunks[2],
                );
            }
        }
    }
}

fn draw_metric_panel(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    color: Color,
    active: bool,
    value: Option<String>,
) {
    let border_color = if active { BORDER_ACTIVE } else { BORDER };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().fg(if active { color } else { TEXT_SECONDARY }),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (text, style) = match value {
        Some(value) => (value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        None => ("—".to_string(), Style::default().fg(TEXT_MUTED)),
    };

    frame.render_widget(
        Paragraph::new(text).style(style).alignment(Alignment::Center),
        inner,
    );
}

fn draw_progress_bar(frame: &mut Frame, area: Rect, ratio: f64, color: Color, dim_color: Color) {
    if area.width < 4 {
        return;
    }

    let width = (area.width - 2) as usize;
    let filled = ((ratio * width as f64) as usize).min(width);
    let empty = width.saturating_sub(filled);

    let bar = Line::from(vec![
        Span::raw(" "),
        Span::styled("█".repeat(filled), Style::default().fg(color)),
        Span::styled("░".repeat(empty), Style::default().fg(dim_color)),
        Span::raw(" "),
    ]);

    frame.render_widget(Paragraph::new(bar), area);
}

fn draw_spinner(frame: &mut Frame, area: Rect, spinner: &Spinner) {
    let line = Line::from(vec![
        Span::styled(spinner.frame(), Style::default().fg(ACCENT)),
        Span::raw(" "),
        Span::styled(spinner.label().to_string(), Style::default().fg(TEXT_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

// Version
fn draw_version(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_ACTIVE))
        .title(Span::styled(" Version info ", Style::default().fg(ACCENT)));

    let rows = [
        (PACKAGE.to_string(), env!("CARGO_PKG_VERSION").to_string()),
        (
            "platform".to_string(),
            format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        ),
    ];

    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!(" {:<12}", label), Style::default().fg(TEXT_SECONDARY)),
                Span::styled(value, Style::default().fg(SUCCESS)),
            ])
        })
        .collect();

    let area = Rect { height: area.height.min(4), ..area };
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// Update
fn draw_update(frame: &mut Frame, area: Rect, app: &App, spinner: Option<&Spinner>) {
    let Some(outcome) = &app.update else {
        if let Some(spinner) = spinner {
            draw_spinner(frame, Rect { height: area.height.min(1), ..area }, spinner);
        }
        return;
    };

    let mut lines = Vec::new();
    match outcome {
        UpdateOutcome::Updated => {
            lines.push(Line::styled(" ✓ Update successful!", Style::default().fg(SUCCESS)));
        }
        UpdateOutcome::Failed { reason } => {
            lines.push(Line::styled(" ✗ Update failed.", Style::default().fg(ERROR)));
            lines.push(Line::styled(format!("   {}", reason), Style::default().fg(TEXT_MUTED)));
            lines.push(Line::raw(""));
            lines.push(Line::styled(" Try running manually:", Style::default().fg(TEXT_SECONDARY)));
            for step in manual_steps() {
                lines.push(Line::styled(format!("   {}", step), Style::default().fg(TEXT_SECONDARY)));
            }
        }
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_help(frame: &mut Frame, area: Rect, app: &App) {
    let help = match app.state {
        MenuState::MainMenu | MenuState::Exited => "1-4 choose · ctrl+c quit",
        MenuState::RunningTest if app.phase != TestPhase::Complete => "testing...",
        MenuState::Updating if app.update.is_none() => "updating...",
        _ => "enter continue",
    };

    frame.render_widget(
        Paragraph::new(help)
            .style(Style::default().fg(TEXT_MUTED))
            .alignment(Alignment::Center),
        area,
    );
}
