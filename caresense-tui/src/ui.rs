//! UI rendering for the TUI.

use caresense_core::format::format_relative_time;
use caresense_core::{AnalysisOutcome, RiskLevel, RiskTrend, Severity};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FormField, Screen, DURATION_OPTIONS, SYMPTOM_CHIPS};

// ========== Palette ==========

/// Brand accent for titles and focus highlights
const BRAND: Color = Color::Rgb(13, 148, 136);
/// Low risk badge color
const RISK_LOW: Color = Color::Rgb(16, 185, 129);
/// Medium risk badge color
const RISK_MEDIUM: Color = Color::Rgb(245, 158, 11);
/// High risk badge color
const RISK_HIGH: Color = Color::Rgb(225, 29, 72);
/// Dim gray for secondary text
const DIM: Color = Color::Rgb(128, 128, 128);
/// Border color for unfocused form fields
const BORDER_IDLE: Color = Color::Rgb(80, 80, 80);
/// Validation / failure message color
const ERROR_COLOR: Color = Color::Rgb(239, 68, 68);
/// Disclaimer block color
const DISCLAIMER_COLOR: Color = Color::Rgb(217, 119, 6);

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low => RISK_LOW,
        RiskLevel::Medium => RISK_MEDIUM,
        RiskLevel::High => RISK_HIGH,
    }
}

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.screen {
        Screen::Splash => render_splash(frame, app),
        Screen::Welcome => render_welcome(frame),
        Screen::Input => render_input(frame, app),
        Screen::Loading => render_loading(frame, app),
        Screen::Result => render_result(frame, app),
    }
}

/// Center a fixed-size box within the given area.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let v = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .split(area);
    let h = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .split(v[1]);
    h[1]
}

fn render_splash(frame: &mut Frame, app: &App) {
    let area = centered(frame.area(), 40, 5);
    let pulse = if app.animation_frame % 10 < 5 { "♥" } else { "♡" };
    let lines = vec![
        Line::from(Span::styled(
            format!("{pulse} CareSense"),
            Style::default().fg(BRAND).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Health risk awareness, in plain language",
            Style::default().fg(DIM),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        area,
    );
}

fn render_welcome(frame: &mut Frame) {
    let area = centered(frame.area(), 56, 12);
    let lines = vec![
        Line::from(Span::styled(
            "CareSense",
            Style::default().fg(BRAND).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Describe how you feel and get a calm, conservative"),
        Line::from("risk awareness read with coping suggestions and"),
        Line::from("clear next steps."),
        Line::from(""),
        Line::from(Span::styled(
            "This assessment does not provide a diagnosis.",
            Style::default().fg(DIM).italic(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(BRAND).bold()),
            Span::raw(" start    "),
            Span::styled("q", Style::default().fg(BRAND).bold()),
            Span::raw(" quit"),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let color = if focused { BRAND } else { BORDER_IDLE };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn render_input(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::vertical([
        Constraint::Length(2), // Header
        Constraint::Length(6), // Symptoms
        Constraint::Length(3), // Chips
        Constraint::Length(3), // Duration
        Constraint::Length(3), // Severity
        Constraint::Length(2), // Errors
        Constraint::Fill(1),
        Constraint::Length(1), // Footer
    ])
    .split(area);

    let header = Paragraph::new("Tell Us How You Feel")
        .style(Style::default().fg(BRAND).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    // Symptoms field with a visible cursor when focused
    let focused = app.focus == FormField::Symptoms;
    let mut text = app.symptoms.clone();
    if focused {
        text.push('▏');
    }
    let symptoms = if app.symptoms.is_empty() && !focused {
        Paragraph::new(Span::styled(
            "Example: headache for 2 days, mild fever, feeling anxious and tired",
            Style::default().fg(DIM).italic(),
        ))
    } else {
        Paragraph::new(text)
    };
    frame.render_widget(
        symptoms
            .wrap(Wrap { trim: false })
            .block(field_block("Describe your symptoms", focused)),
        chunks[1],
    );

    // Quick-add chips
    let focused = app.focus == FormField::Chips;
    let mut spans: Vec<Span> = Vec::new();
    for (i, chip) in SYMPTOM_CHIPS.iter().enumerate() {
        let style = if focused && i == app.chip_index {
            Style::default().fg(Color::Black).bg(BRAND)
        } else {
            Style::default().fg(DIM)
        };
        spans.push(Span::styled(format!(" {chip} "), style));
        spans.push(Span::raw(" "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(field_block("Common symptoms (space to add)", focused)),
        chunks[2],
    );

    // Duration slider
    let focused = app.focus == FormField::Duration;
    let (label, _) = DURATION_OPTIONS[app.duration_index];
    let track: String = (0..DURATION_OPTIONS.len())
        .map(|i| if i == app.duration_index { '●' } else { '─' })
        .collect();
    let duration = Line::from(vec![
        Span::styled(track, Style::default().fg(if focused { BRAND } else { DIM })),
        Span::raw("  "),
        Span::styled(label, Style::default().bold()),
    ]);
    frame.render_widget(
        Paragraph::new(duration).block(field_block("Duration (←/→)", focused)),
        chunks[3],
    );

    // Severity toggle row
    let focused = app.focus == FormField::Severity;
    let mut spans: Vec<Span> = Vec::new();
    for (i, option) in Severity::ALL.iter().enumerate() {
        let selected = app.severity == Some(*option);
        let highlighted = focused && i == app.severity_cursor;
        let style = match (selected, highlighted) {
            (true, _) => Style::default().fg(Color::Black).bg(BRAND).bold(),
            (false, true) => Style::default().fg(BRAND),
            (false, false) => Style::default().fg(DIM),
        };
        spans.push(Span::styled(format!(" {} ", option.as_str()), style));
        spans.push(Span::raw("  "));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .block(field_block("Severity, optional (space to toggle)", focused)),
        chunks[4],
    );

    // Validation and failure messages
    let mut error_lines = Vec::new();
    if let Some(msg) = &app.form_error {
        error_lines.push(Line::from(Span::styled(
            format!("⚠ {msg}"),
            Style::default().fg(ERROR_COLOR).bold(),
        )));
    }
    if let Some(msg) = &app.error {
        error_lines.push(Line::from(Span::styled(
            msg.clone(),
            Style::default().fg(ERROR_COLOR),
        )));
    }
    frame.render_widget(
        Paragraph::new(error_lines).wrap(Wrap { trim: true }),
        chunks[5],
    );

    render_footer(
        frame,
        "Enter analyze │ Tab next field │ Esc home",
        chunks[7],
    );
}

fn render_loading(frame: &mut Frame, app: &App) {
    let area = centered(frame.area(), 46, 5);
    let spinner = SPINNER_FRAMES[(app.animation_frame as usize) % SPINNER_FRAMES.len()];
    let lines = vec![
        Line::from(Span::styled(
            format!("{spinner} Analyzing your symptoms..."),
            Style::default().fg(BRAND).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "This usually takes a few seconds.",
            Style::default().fg(DIM),
        )),
    ];
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        area,
    );
}

fn render_result(frame: &mut Frame, app: &mut App) {
    let Some(outcome) = &app.outcome else {
        // Result without an outcome cannot happen through normal transitions
        render_loading(frame, app);
        return;
    };

    let area = frame.area();
    let chunks = Layout::vertical([
        Constraint::Length(2),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    let header = Paragraph::new("Your Health Risk Awareness Results")
        .style(Style::default().fg(BRAND).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let lines = result_lines(outcome);

    // Clamp scrolling to the rendered content
    let viewport = chunks[1].height as usize;
    let max_scroll = lines.len().saturating_sub(viewport);
    if app.scroll_offset > max_scroll {
        app.scroll_offset = max_scroll;
    }

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset as u16, 0));
    frame.render_widget(body, chunks[1]);

    render_footer(
        frame,
        "j/k scroll │ n new assessment │ Esc home │ q quit",
        chunks[2],
    );
}

/// Build the full result body as styled lines.
fn result_lines(outcome: &AnalysisOutcome) -> Vec<Line<'static>> {
    let result = &outcome.result;
    let color = risk_color(result.risk_level);
    let mut lines: Vec<Line> = Vec::new();

    // Risk badge, with the trend badge suppressed when Unknown
    let mut badge = vec![Span::styled(
        format!("  {} Risk  ", result.risk_level.as_str()),
        Style::default().fg(Color::Black).bg(color).bold(),
    )];
    if outcome.trend != RiskTrend::Unknown {
        let (trend_color, arrow) = match outcome.trend {
            RiskTrend::Improving => (RISK_LOW, "↓"),
            RiskTrend::Worsening => (RISK_HIGH, "↑"),
            _ => (RISK_MEDIUM, "→"),
        };
        badge.push(Span::raw("  "));
        badge.push(Span::styled(
            format!("{arrow} {}", outcome.trend.as_str()),
            Style::default().fg(trend_color).bold(),
        ));
    }
    lines.push(Line::from(badge));
    lines.push(Line::from(""));
    lines.push(Line::from(result.explanation.clone()));
    lines.push(Line::from(Span::styled(
        "This is not a diagnosis.",
        Style::default().fg(DIM).italic(),
    )));
    lines.push(Line::from(""));

    if !outcome.prior.is_empty() {
        let mut spans = vec![Span::styled("Previous: ", Style::default().fg(DIM))];
        for entry in &outcome.prior {
            spans.push(Span::styled(
                entry.risk_level.as_str(),
                Style::default().fg(risk_color(entry.risk_level)),
            ));
            spans.push(Span::styled(
                format!(" ({})  ", format_relative_time(entry.date)),
                Style::default().fg(DIM),
            ));
        }
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }

    if !result.coping_and_wellness.is_empty() {
        lines.push(section_title("Coping & Wellness Guidance"));
        for item in &result.coping_and_wellness {
            lines.push(Line::from(vec![
                Span::styled(format!("  • {}: ", item.title), Style::default().bold()),
                Span::raw(item.description.clone()),
            ]));
        }
        lines.push(Line::from(""));
    }

    if let Some(plan) = &result.daily_plan {
        let slots: Vec<_> = plan
            .slots()
            .into_iter()
            .filter_map(|(label, action)| action.map(|a| (label, a.to_string())))
            .collect();
        if !slots.is_empty() {
            lines.push(section_title("Daily Plan"));
            for (label, action) in slots {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {label}: "), Style::default().bold()),
                    Span::raw(action),
                ]));
            }
            lines.push(Line::from(""));
        }
    }

    if let Some(factors) = &result.risk_analysis {
        let rows = [
            ("Duration", factors.duration_factor.as_deref()),
            ("Severity", factors.severity_factor.as_deref()),
            ("Symptoms", factors.symptom_logic.as_deref()),
        ];
        if rows.iter().any(|(_, v)| v.is_some()) {
            lines.push(section_title("Why this level"));
            for (label, value) in rows {
                if let Some(value) = value {
                    lines.push(Line::from(vec![
                        Span::styled(format!("  {label}: "), Style::default().bold()),
                        Span::raw(value.to_string()),
                    ]));
                }
            }
            lines.push(Line::from(""));
        }
    }

    lines.push(section_title("Next-Step Guidance"));
    lines.push(Line::from(vec![
        Span::styled("  What to do now: ", Style::default().bold()),
        Span::raw(result.next_steps.what_to_do_now.clone()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  When to seek help: ", Style::default().bold()),
        Span::raw(result.next_steps.when_to_seek_help.clone()),
    ]));
    if result.risk_level == RiskLevel::High {
        if let Some(emergency) = result
            .next_steps
            .emergency_guidance
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            lines.push(Line::from(Span::styled(
                format!("  ⚠ Emergency: {emergency}"),
                Style::default().fg(RISK_HIGH).bold(),
            )));
        }
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        format!("Disclaimer: {}", result.disclaimer),
        Style::default().fg(DISCLAIMER_COLOR),
    )));

    if let Some(raw) = &result.raw_response {
        lines.push(Line::from(""));
        lines.push(section_title("Original Response"));
        for raw_line in raw.lines() {
            lines.push(Line::from(Span::styled(
                raw_line.to_string(),
                Style::default().fg(DIM),
            )));
        }
    }

    lines
}

fn section_title(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(BRAND).add_modifier(Modifier::BOLD),
    ))
}

fn render_footer(frame: &mut Frame, hints: &str, area: Rect) {
    let footer = Paragraph::new(hints).style(Style::default().fg(DIM));
    frame.render_widget(footer, area);
}
