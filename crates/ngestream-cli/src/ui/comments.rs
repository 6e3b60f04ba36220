//! Comment thread pane.

use chrono::{DateTime, Utc};
use ngestream_core::{
  focus::InteractionFocus,
  profile::initial,
  store::{CommentStore, ProfileLookup},
  tree::CommentNode,
};
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::App;

/// Replies deeper than this are drawn at this depth.
pub const MAX_INDENT_DEPTH: usize = 6;

const INDENT: &str = "  ";

/// Render the comment list into `area`.
pub fn draw<S>(f: &mut Frame, area: Rect, app: &App<S>)
where
  S: CommentStore + ProfileLookup,
{
  let thread = &app.thread;
  let total = thread.total_comments();
  let mut title = format!(" Comments ({total}) ");
  if thread.is_stale() {
    title.push_str("[stale] ");
  }

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let visible = app.visible();
  if visible.is_empty() {
    f.render_widget(
      Paragraph::new(Line::from(Span::styled(
        "No comments yet. Be the first to share your thoughts!",
        Style::default().fg(Color::DarkGray),
      ))),
      inner,
    );
    return;
  }

  let now = Utc::now();
  let items: Vec<ListItem> = visible
    .iter()
    .map(|(depth, node)| comment_item(app, *depth, node, now))
    .collect();

  let mut state = ListState::default();
  state.select(Some(app.cursor.min(visible.len() - 1)));

  f.render_stateful_widget(
    List::new(items).highlight_style(Style::default().bg(Color::Blue).fg(Color::White)),
    inner,
    &mut state,
  );
}

fn comment_item<'a, S>(
  app: &App<S>,
  depth: usize,
  node: &'a CommentNode,
  now: DateTime<Utc>,
) -> ListItem<'a>
where
  S: CommentStore + ProfileLookup,
{
  let thread = &app.thread;
  let c = &node.comment;
  let indent = INDENT.repeat(depth.min(MAX_INDENT_DEPTH));
  let name = thread.display_name(c.user_id);

  // Authors with a profile picture get a filled badge; the rest fall back to
  // a plain initial.
  let avatar_style = if thread.avatar_url(c.user_id).is_some() {
    Style::default().fg(Color::Black).bg(Color::Cyan)
  } else {
    Style::default().fg(Color::Cyan)
  };

  let marker = if node.replies.is_empty() {
    "  "
  } else if thread.is_expanded(c.id) {
    "▾ "
  } else {
    "▸ "
  };

  let mut header = vec![
    Span::raw(indent.clone()),
    Span::raw(marker),
    Span::styled(format!("[{}] ", initial(&name)), avatar_style),
    Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
    Span::styled(
      format!("  {}", relative_time(c.created_at, now)),
      Style::default().fg(Color::DarkGray),
    ),
  ];
  if c.is_edited() {
    header.push(Span::styled(" (edited)", Style::default().fg(Color::DarkGray)));
  }
  if node.reply_count > 0 {
    let noun = if node.reply_count == 1 { "reply" } else { "replies" };
    header.push(Span::styled(
      format!("  {} {noun}", node.reply_count),
      Style::default().fg(Color::Yellow),
    ));
  }
  match thread.focus() {
    InteractionFocus::Replying(id) if id == c.id => {
      header.push(Span::styled("  ← replying", Style::default().fg(Color::Green)));
    }
    InteractionFocus::Editing(id) if id == c.id => {
      header.push(Span::styled("  ← editing", Style::default().fg(Color::Green)));
    }
    _ => {}
  }

  let mut lines = vec![Line::from(header)];
  let body_indent = format!("{indent}    ");
  for text in c.comment.lines() {
    lines.push(Line::from(vec![Span::raw(body_indent.clone()), Span::raw(text.to_owned())]));
  }
  ListItem::new(lines)
}

/// Short human description of how long ago `at` was.
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let secs = (now - at).num_seconds();
  match secs {
    s if s < 60 => "just now".to_owned(),
    s if s < 3_600 => format!("{}m ago", s / 60),
    s if s < 86_400 => format!("{}h ago", s / 3_600),
    s if s < 30 * 86_400 => format!("{}d ago", s / 86_400),
    _ => at.format("%Y-%m-%d").to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ago(secs: i64) -> String {
    let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    relative_time(now - chrono::Duration::seconds(secs), now)
  }

  #[test]
  fn relative_times() {
    assert_eq!(ago(5), "just now");
    assert_eq!(ago(-5), "just now");
    assert_eq!(ago(125), "2m ago");
    assert_eq!(ago(3 * 3_600), "3h ago");
    assert_eq!(ago(2 * 86_400), "2d ago");
    assert_eq!(ago(90 * 86_400), "2023-08-16");
  }
}
