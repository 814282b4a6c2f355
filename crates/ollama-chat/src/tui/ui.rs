use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::app::App;
use crate::api::TurnRole;
use crate::conversation::ConversationView;

const HELP: &str = "Enter send | Tab model | Ctrl-L clear | Ctrl-R reload | Esc quit";

pub fn render(frame: &mut Frame, app: &App) {
    let view = app.conversation.view();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app, &view);
    render_transcript(frame, chunks[1], app, &view);
    render_input(frame, chunks[2], &view);
    render_status(frame, chunks[3], app);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, view: &ConversationView) {
    let installed = if app.models.is_empty() {
        String::new()
    } else {
        format!("  ({} available, Tab to switch)", app.models.len())
    };
    let line = Line::from(vec![
        Span::styled("Model: ", Style::default().fg(Color::Gray)),
        Span::styled(
            view.model.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(installed, Style::default().fg(Color::DarkGray)),
    ]);
    let header =
        Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" Ollama Chat "));
    frame.render_widget(header, area);
}

fn render_transcript(frame: &mut Frame, area: Rect, app: &App, view: &ConversationView) {
    let mut lines: Vec<Line> = Vec::new();
    for turn in view.turns {
        let (label, color) = match turn.role() {
            TurnRole::User => ("You", Color::Blue),
            TurnRole::Assistant => ("Bot", Color::Green),
            TurnRole::Error => ("Error", Color::Red),
        };
        lines.push(Line::from(Span::styled(
            format!("{label}:"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for text in turn.content().lines() {
            lines.push(Line::from(Span::styled(
                text.to_string(),
                Style::default().fg(color),
            )));
        }
        lines.push(Line::default());
    }
    if view.busy {
        let dots = ".".repeat(app.tick % 3 + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default().fg(Color::Yellow),
        )));
    }

    let inner_width = area.width.saturating_sub(2).max(1);
    let inner_height = area.height.saturating_sub(2);
    let transcript = Paragraph::new(lines).wrap(Wrap { trim: false });
    let total = u16::try_from(transcript.line_count(inner_width)).unwrap_or(u16::MAX);
    let bottom = total.saturating_sub(inner_height);
    let offset = bottom.saturating_sub(app.scroll);

    let transcript = transcript
        .block(Block::default().borders(Borders::ALL).title(" Chat "))
        .scroll((offset, 0));
    frame.render_widget(transcript, area);
}

fn render_input(frame: &mut Frame, area: Rect, view: &ConversationView) {
    let (title, style) = if view.busy {
        (" Waiting for response... ", Style::default().fg(Color::DarkGray))
    } else {
        (" Message ", Style::default())
    };
    let input = Paragraph::new(view.input.to_string())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(input, area);

    if !view.busy {
        let typed = u16::try_from(view.input.chars().count()).unwrap_or(u16::MAX);
        let cursor_x = area.x.saturating_add(1).saturating_add(typed);
        let max_x = area.x.saturating_add(area.width.saturating_sub(2));
        frame.set_cursor_position((cursor_x.min(max_x), area.y + 1));
    }
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let color = if app.status.is_error {
        Color::Red
    } else {
        Color::Green
    };
    let line = Line::from(vec![
        Span::styled(app.status.text.clone(), Style::default().fg(color)),
        Span::raw("  "),
        Span::styled(HELP, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
