//! Forest construction — flat comment rows into nested reply trees.
//!
//! Roots are ordered newest first; replies under any node are ordered oldest
//! first, so new discussions surface at the top while each conversation reads
//! chronologically. Ties on `created_at` are broken by `id`.
//!
//! Nothing here recurses on tree depth. Reply chains are user-generated and
//! unbounded, so construction, traversal, drop, clone and equality all use
//! explicit stacks.

use std::{collections::HashMap, fmt};

use uuid::Uuid;

use crate::comment::Comment;

// ─── CommentNode ─────────────────────────────────────────────────────────────

/// A comment with its nested replies. Built fresh on every sync and never
/// patched in place.
pub struct CommentNode {
  pub comment:     Comment,
  pub replies:     Vec<CommentNode>,
  /// Every node below this one, not just direct replies.
  pub reply_count: usize,
}

impl Drop for CommentNode {
  fn drop(&mut self) {
    let mut pending = std::mem::take(&mut self.replies);
    while let Some(mut node) = pending.pop() {
      pending.append(&mut node.replies);
    }
  }
}

impl CommentNode {
  /// This node without its replies, with room reserved for them.
  fn detached(&self) -> Self {
    Self {
      comment:     self.comment.clone(),
      replies:     Vec::with_capacity(self.replies.len()),
      reply_count: self.reply_count,
    }
  }
}

impl Clone for CommentNode {
  fn clone(&self) -> Self {
    // `open` is the path from the root to the node being filled in.
    let mut open = vec![self.detached()];
    for (depth, node) in walk(&self.replies) {
      close_to(&mut open, depth + 1);
      open.push(node.detached());
    }
    close_to(&mut open, 1);
    open.swap_remove(0)
  }
}

/// Pop `open` down to `len` entries, attaching each popped node to the one
/// beneath it. `len` must be at least 1.
fn close_to(open: &mut Vec<CommentNode>, len: usize) {
  while open.len() > len {
    if let Some(done) = open.pop()
      && let Some(parent) = open.last_mut()
    {
      parent.replies.push(done);
    }
  }
}

impl PartialEq for CommentNode {
  fn eq(&self, other: &Self) -> bool {
    fn shape((depth, n): (usize, &CommentNode)) -> (usize, &Comment, usize) {
      (depth, &n.comment, n.reply_count)
    }
    walk(std::slice::from_ref(self))
      .map(shape)
      .eq(walk(std::slice::from_ref(other)).map(shape))
  }
}

impl Eq for CommentNode {}

impl fmt::Debug for CommentNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let replies: Vec<Uuid> = self.replies.iter().map(|r| r.comment.id).collect();
    f.debug_struct("CommentNode")
      .field("comment", &self.comment)
      .field("replies", &replies)
      .field("reply_count", &self.reply_count)
      .finish()
  }
}

// ─── Build ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unseen,
  OnPath,
  Done,
}

/// Build the forest for one subject's comments.
///
/// Every input row appears exactly once in the output. A row is a root when
/// its `parent_id` is `None`, points at itself, or points at an id that is
/// not in `rows`. If parent pointers form a cycle, its oldest member becomes
/// a root.
pub fn build_forest(rows: Vec<Comment>) -> Vec<CommentNode> {
  let n = rows.len();

  let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(n);
  for (i, row) in rows.iter().enumerate() {
    index.entry(row.id).or_insert(i);
  }

  let mut parent: Vec<Option<usize>> = rows
    .iter()
    .enumerate()
    .map(|(i, row)| {
      row
        .parent_id
        .and_then(|p| index.get(&p).copied())
        .filter(|&p| p != i)
    })
    .collect();

  break_cycles(&rows, &mut parent);

  let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
  let mut roots: Vec<usize> = Vec::new();
  for (i, p) in parent.iter().enumerate() {
    match p {
      Some(p) => children[*p].push(i),
      None => roots.push(i),
    }
  }

  for list in &mut children {
    list.sort_by_key(|&i| sort_key(&rows[i]));
  }
  roots.sort_by(|&a, &b| sort_key(&rows[b]).cmp(&sort_key(&rows[a])));

  // Post-order assembly: a node is built once all of its replies are.
  let mut slots: Vec<Option<Comment>> = rows.into_iter().map(Some).collect();
  let mut built: Vec<Option<CommentNode>> = (0..n).map(|_| None).collect();
  let mut stack: Vec<(usize, bool)> = Vec::new();

  for &root in &roots {
    stack.push((root, false));
    while let Some((i, ready)) = stack.pop() {
      if !ready {
        stack.push((i, true));
        stack.extend(children[i].iter().rev().map(|&c| (c, false)));
        continue;
      }
      let replies: Vec<CommentNode> =
        children[i].iter().filter_map(|&c| built[c].take()).collect();
      let reply_count = replies.iter().map(|r| 1 + r.reply_count).sum();
      if let Some(comment) = slots[i].take() {
        built[i] = Some(CommentNode { comment, replies, reply_count });
      }
    }
  }

  roots.iter().filter_map(|&r| built[r].take()).collect()
}

fn sort_key(c: &Comment) -> (chrono::DateTime<chrono::Utc>, Uuid) {
  (c.created_at, c.id)
}

/// Detach one member of every parent cycle so all chains end at a root.
fn break_cycles(rows: &[Comment], parent: &mut [Option<usize>]) {
  let mut mark = vec![Mark::Unseen; rows.len()];
  let mut path: Vec<usize> = Vec::new();

  for start in 0..rows.len() {
    if mark[start] != Mark::Unseen {
      continue;
    }
    path.clear();
    let mut cur = Some(start);
    while let Some(i) = cur {
      match mark[i] {
        Mark::Done => break,
        Mark::OnPath => {
          if let Some(pos) = path.iter().position(|&p| p == i)
            && let Some(&oldest) =
              path[pos..].iter().min_by_key(|&&p| sort_key(&rows[p]))
          {
            tracing::warn!(
              comment_id = %rows[oldest].id,
              "reply cycle detected; treating comment as a root"
            );
            parent[oldest] = None;
          }
          break;
        }
        Mark::Unseen => {
          mark[i] = Mark::OnPath;
          path.push(i);
          cur = parent[i];
        }
      }
    }
    for &i in &path {
      mark[i] = Mark::Done;
    }
  }
}

// ─── Traversal ───────────────────────────────────────────────────────────────

/// Pre-order iterator over a forest, yielding `(depth, node)`.
///
/// Replies of a node are only visited when `descend` returns `true` for it.
pub struct Walk<'a, F> {
  stack:   Vec<(usize, &'a CommentNode)>,
  descend: F,
}

impl<'a, F> Iterator for Walk<'a, F>
where
  F: FnMut(&CommentNode) -> bool,
{
  type Item = (usize, &'a CommentNode);

  fn next(&mut self) -> Option<Self::Item> {
    let (depth, node) = self.stack.pop()?;
    if !node.replies.is_empty() && (self.descend)(node) {
      self
        .stack
        .extend(node.replies.iter().rev().map(|r| (depth + 1, r)));
    }
    Some((depth, node))
  }
}

/// Visit every node in display order.
pub fn walk(forest: &[CommentNode]) -> Walk<'_, fn(&CommentNode) -> bool> {
  walk_visible(forest, always as fn(&CommentNode) -> bool)
}

fn always(_: &CommentNode) -> bool { true }

/// Visit nodes in display order, descending only into nodes for which
/// `descend` holds (typically "is expanded").
pub fn walk_visible<F>(forest: &[CommentNode], descend: F) -> Walk<'_, F>
where
  F: FnMut(&CommentNode) -> bool,
{
  Walk {
    stack: forest.iter().rev().map(|n| (0, n)).collect(),
    descend,
  }
}

/// Roots plus all of their descendants.
pub fn total_comments(forest: &[CommentNode]) -> usize {
  forest.iter().map(|n| 1 + n.reply_count).sum()
}

pub fn find(forest: &[CommentNode], id: Uuid) -> Option<&CommentNode> {
  walk(forest)
    .map(|(_, n)| n)
    .find(|n| n.comment.id == id)
}

/// Ids from the root down to the parent of `id`; empty for a root.
/// `None` if `id` is not in the forest.
pub fn ancestors(forest: &[CommentNode], id: Uuid) -> Option<Vec<Uuid>> {
  let mut path: Vec<Uuid> = Vec::new();
  for (depth, node) in walk(forest) {
    path.truncate(depth);
    if node.comment.id == id {
      return Some(path);
    }
    path.push(node.comment.id);
  }
  None
}
