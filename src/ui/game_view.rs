use crate::game::{Cell, Player, COLS, ROWS};
use crate::session::{Phase, Session};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    match app.screen() {
        Screen::Resume(snapshot) => render_prompt(
            frame,
            "Resume",
            vec![
                Line::from("A saved game was found:"),
                Line::from(snapshot.summary()),
                Line::from(""),
                Line::from("y / Enter: resume  |  n / Esc: start over"),
            ],
        ),
        Screen::Setup { names, field } => render_setup(frame, app, names, *field),
        Screen::Game => render_game(frame, app),
    }
}

fn player_color(player: Player) -> Color {
    match player {
        Player::One => Color::Red,
        Player::Two => Color::Yellow,
    }
}

fn render_prompt(frame: &mut Frame, title: &str, lines: Vec<Line>) {
    let widget = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    frame.render_widget(widget, centered(frame.area(), 60, 8));
}

fn render_setup(frame: &mut Frame, app: &App, names: &[String; 2], field: usize) {
    let mut lines = vec![Line::from("Enter player names"), Line::from("")];
    for (i, name) in names.iter().enumerate() {
        let player = if i == 0 { Player::One } else { Player::Two };
        let marker = if i == field { "> " } else { "  " };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(
                format!("Player {}: ", i + 1),
                Style::default()
                    .fg(player_color(player))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(name.clone()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(
        app.message().unwrap_or("Tab: switch  |  Enter: start  |  Esc: quit").to_string(),
    ));
    render_prompt(frame, "Four in a Row", lines);
}

fn render_game(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(12),   // Board
            Constraint::Length(3), // Message
            Constraint::Length(3), // Controls
        ])
        .split(frame.area());

    render_header(frame, app.session(), chunks[0]);
    render_board(frame, app, chunks[1]);
    render_message(frame, app.message(), chunks[2]);
    render_controls(frame, chunks[3]);
}

fn render_header(frame: &mut Frame, session: &Session, area: Rect) {
    let current = session.current_player();
    let one = session.player(Player::One);
    let two = session.player(Player::Two);
    let scores = format!("{} {} : {} {}", one.name, one.score, two.score, two.name);
    let clock = session.elapsed_secs();

    let status = match session.phase() {
        Phase::Ended => format!("Game over  |  {scores}"),
        _ => format!(
            "{} to move  |  {scores}  |  {}:{:02}",
            session.player(current).name,
            clock / 60,
            clock % 60
        ),
    };

    let header = Paragraph::new(status)
        .style(
            Style::default()
                .fg(player_color(current))
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Four in a Row"));

    frame.render_widget(header, area);
}

fn render_board(frame: &mut Frame, app: &App, area: Rect) {
    let session = app.session();
    let board = session.board();
    let pending = session.pending_column();
    let winning = session.winning_line().map(|l| l.cells.as_slice()).unwrap_or(&[]);
    let mut lines = Vec::new();

    // Column numbers with selection indicator
    let mut col_line = vec![Span::raw("   ")];
    for col in 0..COLS {
        let label = format!(" {} ", col + 1);
        let span = if Some(col) == pending {
            Span::styled(
                label,
                Style::default()
                    .fg(Color::Black)
                    .bg(player_color(session.current_player()))
                    .add_modifier(Modifier::BOLD),
            )
        } else if col == app.cursor() {
            Span::styled(
                label,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
        } else {
            Span::raw(label)
        };
        col_line.push(span);
    }
    col_line.push(Span::raw("  "));
    lines.push(Line::from(col_line));

    lines.push(Line::from("  ╔═════════════════════╗"));

    for row in 0..ROWS {
        let mut row_spans = vec![Span::raw("  ║")];
        for col in 0..COLS {
            let (symbol, mut style) = match board.get(row, col).player() {
                None => (" . ", Style::default().fg(Color::DarkGray)),
                Some(player) => (" ● ", Style::default().fg(player_color(player))),
            };
            if winning.contains(&(row, col)) {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            } else if app.landed() == Some((row, col)) {
                style = style.add_modifier(Modifier::BOLD);
            }
            row_spans.push(Span::styled(symbol, style));
        }
        row_spans.push(Span::raw("║"));
        lines.push(Line::from(row_spans));
    }

    lines.push(Line::from("  ╚═════════════════════╝"));

    // Where the pending disc would land
    let mut indicator_line = vec![Span::raw("   ")];
    for col in 0..COLS {
        let marker = if Some(col) == pending && board.get(0, col) == Cell::Empty {
            " ▲ "
        } else {
            "   "
        };
        indicator_line.push(Span::styled(marker, Style::default().fg(Color::Cyan)));
    }
    indicator_line.push(Span::raw("  "));
    lines.push(Line::from(indicator_line));

    let board_widget = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(board_widget, area);
}

fn render_message(frame: &mut Frame, message: Option<&str>, area: Rect) {
    let msg_widget = Paragraph::new(message.unwrap_or(""))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(msg_widget, area);
}

fn render_controls(frame: &mut Frame, area: Rect) {
    let line = Line::from(
        "1-7/←→: Select  |  Enter: Drop  |  Esc: Cancel  |  U: Undo  |  H: Hint  |  N: Rematch  |  Q: Quit",
    );

    let controls = Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));

    frame.render_widget(controls, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
