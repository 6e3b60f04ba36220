//! TUI rendering — orchestrates all panes.

pub mod comments;

use chrono::Local;
use ngestream_core::{
  focus::InteractionFocus,
  store::{CommentStore, ProfileLookup},
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, Mode, PREMIUM_NOTICE};

// ─── Root draw ───────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw<S>(f: &mut Frame, app: &App<S>)
where
  S: CommentStore + ProfileLookup,
{
  let area = f.area();
  let composing = matches!(app.mode, Mode::ComposeRoot | Mode::ComposeFocused);

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1),                               // header
      Constraint::Min(0),                                  // comments
      Constraint::Length(if composing { 5 } else { 0 }),   // composer
      Constraint::Length(1),                               // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  comments::draw(f, rows[1], app);
  if composing {
    draw_composer(f, rows[2], app);
  }
  draw_status(f, rows[3], app);
}

// ─── Header ──────────────────────────────────────────────────────────────────

fn draw_header<S>(f: &mut Frame, area: Rect, app: &App<S>)
where
  S: CommentStore + ProfileLookup,
{
  let date = Local::now().format("%Y-%m-%d").to_string();

  let left = Span::styled(
    format!(" ngestream  movie {}", app.thread.movie_id()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let who = match (&app.viewer_name, app.thread.viewer()) {
    (Some(name), Some(v)) => format!("{name} ({}) ", v.tier),
    _ => "not signed in ".to_owned(),
  };
  let right = Span::styled(format!("{who} {date} "), Style::default().fg(Color::Gray));

  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![left, Span::raw(" ".repeat(pad as usize)), right]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Composer ────────────────────────────────────────────────────────────────

fn draw_composer<S>(f: &mut Frame, area: Rect, app: &App<S>)
where
  S: CommentStore + ProfileLookup,
{
  let title = match (app.mode, app.thread.focus()) {
    (Mode::ComposeRoot, _) => " New comment ".to_owned(),
    (_, InteractionFocus::Replying(id)) => {
      let author = app
        .thread
        .find(id)
        .map(|n| app.thread.display_name(n.comment.user_id))
        .unwrap_or_default();
      format!(" Reply to {author} ")
    }
    (_, InteractionFocus::Editing(_)) => " Edit comment ".to_owned(),
    _ => " Comment ".to_owned(),
  };

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));
  f.render_widget(
    Paragraph::new(format!("{}_", app.composer))
      .wrap(Wrap { trim: false })
      .block(block),
    area,
  );
}

// ─── Status bar ──────────────────────────────────────────────────────────────

fn draw_status<S>(f: &mut Frame, area: Rect, app: &App<S>)
where
  S: CommentStore + ProfileLookup,
{
  let (mode_label, hints) = match app.mode {
    Mode::Browse if app.thread.can_write() => (
      "BROWSE",
      "jk move  Enter replies  n new  r reply  e edit  d delete  R refresh  q quit",
    ),
    Mode::Browse => ("BROWSE", PREMIUM_NOTICE),
    Mode::ComposeRoot | Mode::ComposeFocused => ("WRITE", "Enter send  Esc cancel"),
    Mode::ConfirmDelete(id) => (
      "DELETE",
      if app.thread.find(id).is_some_and(|n| !n.comment.is_root()) {
        "Delete this reply and everything under it? y confirm  any other key cancels"
      } else {
        "Delete this comment and all its replies? y confirm  any other key cancels"
      },
    ),
  };

  let status = if app.status_msg.is_empty() || matches!(app.mode, Mode::ConfirmDelete(_)) {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(format!("  {status}"), Style::default().fg(Color::Gray));

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span]))
      .style(Style::default().bg(Color::Black)),
    area,
  );
}
