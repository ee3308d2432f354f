//! Game session: run-time state plus the progression protocol.
//!
//! A session is either `Active(index)` or `Won`. `submit` and `restart` are the
//! only mutators. A rejected answer never changes the active level; it only
//! bumps that level's failure tally, and once the tally reaches the hint
//! threshold the level's hint becomes visible until the next restart.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::domain::{keys, Context, LevelDefinition};

/// Failures on one level before its hint is disclosed.
pub const DEFAULT_HINT_THRESHOLD: u32 = 3;

/// Where the playthrough stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
  Active(usize),
  Won,
}

/// Result of validating one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
  Correct,
  Incorrect,
}

/// What the UI needs to render after a submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitOutcome {
  pub verdict: Verdict,
  pub hint_visible: bool,
  pub hint_text: Option<&'static str>,
  pub won: bool,
}

impl SubmitOutcome {
  fn won() -> Self {
    Self { verdict: Verdict::Correct, hint_visible: false, hint_text: None, won: true }
  }
}

/// Mutable state of one playthrough.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
  /// 0-based; equals the catalog length only once the game is won.
  pub current_index: usize,
  pub context: Context,
  /// Accepted answers, one per completed level, in level order.
  pub history: Vec<String>,
  /// Failure tallies keyed by level index.
  pub failure_counts: BTreeMap<usize, u32>,
}

impl SessionState {
  /// Running context with `levelNumber` overlaid for level `index`.
  fn eval_context(&self, index: usize) -> Context {
    self.context.clone().with(keys::LEVEL_NUMBER, (index + 1) as u64)
  }

  /// Run the setup of the level at `index` (if any) and merge its output.
  fn activate(&mut self, catalog: &Catalog, index: usize) {
    let Some(level) = catalog.get(index) else { return };
    if let Some(update) = level.setup(&self.eval_context(index)) {
      debug!(target: "level", level_id = level.id, keys = update.len(), "Merged level setup into context");
      self.context.merge(update);
    }
  }

  fn failures(&self, index: usize) -> u32 {
    self.failure_counts.get(&index).copied().unwrap_or(0)
  }
}

/// One playthrough over a shared, immutable catalog.
#[derive(Clone, Debug)]
pub struct GameSession {
  catalog: Arc<Catalog>,
  hint_threshold: u32,
  state: SessionState,
}

impl GameSession {
  /// Start a fresh playthrough at the first level.
  pub fn new(catalog: Arc<Catalog>, hint_threshold: u32) -> Self {
    let mut session = Self {
      catalog,
      hint_threshold: hint_threshold.max(1),
      state: SessionState::default(),
    };
    session.reset();
    session
  }

  #[allow(dead_code)]
  pub fn with_defaults() -> Self {
    Self::new(Arc::new(Catalog::standard()), DEFAULT_HINT_THRESHOLD)
  }

  pub fn progress(&self) -> Progress {
    if self.state.current_index >= self.catalog.len() {
      Progress::Won
    } else {
      Progress::Active(self.state.current_index)
    }
  }

  pub fn is_won(&self) -> bool {
    self.progress() == Progress::Won
  }

  pub fn current_level(&self) -> Option<&LevelDefinition> {
    match self.progress() {
      Progress::Active(i) => self.catalog.get(i),
      Progress::Won => None,
    }
  }

  /// Prompt of the active level; `None` once won.
  pub fn current_prompt(&self) -> Option<String> {
    let level = self.current_level()?;
    Some(level.prompt.resolve(&self.state.eval_context(self.state.current_index)))
  }

  /// 1-based level number for progress display, capped at the total.
  pub fn current_level_number(&self) -> usize {
    (self.state.current_index + 1).min(self.total_levels())
  }

  pub fn total_levels(&self) -> usize {
    self.catalog.len()
  }

  #[allow(dead_code)]
  pub fn hint_threshold(&self) -> u32 {
    self.hint_threshold
  }

  #[allow(dead_code)]
  pub fn failure_count(&self, index: usize) -> u32 {
    self.state.failures(index)
  }

  /// True iff the active level has failed at least `hint_threshold` times.
  pub fn hint_visible(&self) -> bool {
    match self.progress() {
      Progress::Active(i) => self.state.failures(i) >= self.hint_threshold,
      Progress::Won => false,
    }
  }

  /// Hint of the active level, only while it is visible.
  pub fn current_hint(&self) -> Option<&'static str> {
    if !self.hint_visible() {
      return None;
    }
    self.current_level().map(|l| l.hint)
  }

  /// Describes what the active level accepts. Debug surfaces only.
  pub fn expected_answer(&self) -> Option<String> {
    let level = self.current_level()?;
    Some(level.expected_answer.resolve(&self.state.eval_context(self.state.current_index)))
  }

  pub fn history(&self) -> &[String] {
    &self.state.history
  }

  #[allow(dead_code)]
  pub fn context(&self) -> &Context {
    &self.state.context
  }

  /// Read-only view of the whole state, serializable for debugging.
  pub fn snapshot(&self) -> &SessionState {
    &self.state
  }

  /// Normalize, validate and either advance or record a failure.
  /// Submitting after the game is won is a no-op.
  #[instrument(level = "debug", skip(self, raw), fields(index = self.state.current_index, answer_len = raw.len()))]
  pub fn submit(&mut self, raw: &str) -> SubmitOutcome {
    let index = match self.progress() {
      Progress::Active(i) => i,
      Progress::Won => {
        debug!(target: "level", "Submission after win ignored");
        return SubmitOutcome::won();
      }
    };
    let catalog = Arc::clone(&self.catalog);
    let Some(level) = catalog.get(index) else { return SubmitOutcome::won() };

    let candidate = level.normalize(raw);
    let eval = self.state.eval_context(index);

    if level.accepts(&candidate, &eval) {
      self.state.history.push(candidate.clone());
      self.state.context.insert(keys::LAST_ACCEPTED_ANSWER, candidate);
      self.state.current_index = index + 1;

      if self.is_won() {
        info!(target: "level", level_id = level.id, number = index + 1, "Final level solved; game won");
        return SubmitOutcome::won();
      }
      self.state.activate(&catalog, index + 1);
      info!(target: "level", level_id = level.id, number = index + 1, "Level solved; advancing");
      return SubmitOutcome { verdict: Verdict::Correct, hint_visible: false, hint_text: None, won: false };
    }

    let fails = self.state.failure_counts.entry(index).or_insert(0);
    *fails += 1;
    let fails = *fails;
    let hint_visible = fails >= self.hint_threshold;
    if fails == self.hint_threshold {
      info!(target: "level", level_id = level.id, fails, "Hint disclosed");
    } else {
      debug!(target: "level", level_id = level.id, fails, "Answer rejected");
    }
    SubmitOutcome {
      verdict: Verdict::Incorrect,
      hint_visible,
      hint_text: hint_visible.then_some(level.hint),
      won: false,
    }
  }

  /// Back to the first level with empty context, history and failure tallies.
  #[instrument(level = "debug", skip(self), fields(index = self.state.current_index))]
  pub fn restart(&mut self) {
    self.reset();
    info!(target: "level", total = self.total_levels(), "Session restarted");
  }

  fn reset(&mut self) {
    self.state = SessionState::default();
    self.state.activate(&self.catalog, 0);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CANONICAL: [&str; 10] = [
    "password", "incorrect", "again", "again later", "10", "1010", "dcba", "47sum", "1001", "echo",
  ];

  fn session() -> GameSession {
    GameSession::with_defaults()
  }

  /// Session parked on level `index` via canonical answers.
  fn session_at(index: usize) -> GameSession {
    let mut s = session();
    for answer in &CANONICAL[..index] {
      assert_eq!(s.submit(answer).verdict, Verdict::Correct);
    }
    s
  }

  #[test]
  fn new_session_starts_on_first_level() {
    let s = session();
    assert_eq!(s.progress(), Progress::Active(0));
    assert_eq!(s.current_prompt().as_deref(), Some("Enter password:"));
    assert_eq!(s.current_level_number(), 1);
    assert_eq!(s.total_levels(), 10);
    assert!(s.history().is_empty());
    assert!(!s.hint_visible());
  }

  #[test]
  fn every_canonical_answer_advances() {
    for (i, answer) in CANONICAL.iter().enumerate() {
      let mut s = session_at(i);
      let out = s.submit(answer);
      assert_eq!(out.verdict, Verdict::Correct, "level {}", i + 1);
      if i + 1 == CANONICAL.len() {
        assert_eq!(s.progress(), Progress::Won);
      } else {
        assert_eq!(s.progress(), Progress::Active(i + 1));
      }
    }
  }

  #[test]
  fn every_wrong_answer_counts_exactly_once() {
    for i in 0..CANONICAL.len() {
      let mut s = session_at(i);
      let out = s.submit("definitely not it");
      assert_eq!(out.verdict, Verdict::Incorrect);
      assert!(!out.won);
      assert_eq!(s.progress(), Progress::Active(i));
      assert_eq!(s.failure_count(i), 1);
      assert_eq!(s.history().len(), i);
    }
  }

  #[test]
  fn hint_appears_on_third_failure_and_stays() {
    let mut s = session_at(2);
    assert!(!s.submit("x").hint_visible);
    assert!(!s.submit("Again").hint_visible);
    assert_eq!(s.current_hint(), None);

    let third = s.submit("again.");
    assert!(third.hint_visible);
    assert_eq!(third.hint_text, Some("Ignore punctuation. One word stands out."));
    assert!(s.hint_visible());

    let fourth = s.submit("nope");
    assert!(fourth.hint_visible);
    assert_eq!(s.failure_count(2), 4);
  }

  #[test]
  fn hint_is_per_level() {
    let mut s = session();
    for _ in 0..3 {
      s.submit("wrong");
    }
    assert!(s.hint_visible());
    assert_eq!(s.submit("password").verdict, Verdict::Correct);
    assert!(!s.hint_visible());
    assert_eq!(s.failure_count(0), 3);
    assert_eq!(s.failure_count(1), 0);
  }

  #[test]
  fn custom_threshold_is_honored_and_clamped() {
    let mut s = GameSession::new(Arc::new(Catalog::standard()), 1);
    assert!(s.submit("wrong").hint_visible);

    let zero = GameSession::new(Arc::new(Catalog::standard()), 0);
    assert_eq!(zero.hint_threshold(), 1);
    assert!(!zero.hint_visible());
  }

  #[test]
  fn restart_clears_everything() {
    let mut s = session_at(6);
    for _ in 0..3 {
      s.submit("zzz");
    }
    assert!(s.hint_visible());

    s.restart();
    assert_eq!(s.progress(), Progress::Active(0));
    assert!(s.history().is_empty());
    assert!(s.context().is_empty());
    assert!(s.snapshot().failure_counts.is_empty());
    assert!(!s.hint_visible());
    assert_eq!(s.failure_count(6), 0);
  }

  #[test]
  fn restart_from_won() {
    let mut s = session_at(10);
    assert!(s.is_won());
    s.restart();
    assert_eq!(s.progress(), Progress::Active(0));
    assert_eq!(s.current_prompt().as_deref(), Some("Enter password:"));
  }

  #[test]
  fn full_run_wins_only_on_tenth_answer() {
    let mut s = session();
    for (i, answer) in CANONICAL.iter().enumerate() {
      let out = s.submit(answer);
      assert_eq!(out.won, i == 9, "after answer {}", i + 1);
    }
    assert_eq!(s.history(), &CANONICAL.map(String::from)[..]);
    assert_eq!(s.current_prompt(), None);
    assert_eq!(s.current_level_number(), 10);
  }

  #[test]
  fn submit_after_win_is_a_no_op() {
    let mut s = session_at(10);
    let before = s.snapshot().clone();
    let out = s.submit("anything");
    assert!(out.won);
    assert_eq!(out.verdict, Verdict::Correct);
    assert_eq!(s.snapshot(), &before);
  }

  #[test]
  fn chained_repeat_reads_history() {
    let s = session_at(5);
    assert_eq!(s.history(), &["password", "incorrect", "again", "again later", "10"]);
    for ok in ["1010", "10x2", "the previous levels answer twice no space"] {
      let mut probe = s.clone();
      assert_eq!(probe.submit(ok).verdict, Verdict::Correct, "{ok}");
    }
    let mut probe = s.clone();
    assert_eq!(probe.submit("1011").verdict, Verdict::Incorrect);
    assert_eq!(s.expected_answer().as_deref(), Some("1010 OR phrase or prevAnswerx2"));
  }

  #[test]
  fn word_count_history_stores_trimmed_answer() {
    let mut s = session_at(4);
    assert_eq!(s.submit(" 10 ").verdict, Verdict::Correct);
    assert_eq!(s.history().last().map(String::as_str), Some("10"));
    assert_eq!(s.context().text(keys::PREVIOUS_ANSWER).as_deref(), Some("10"));
  }

  #[test]
  fn word_count_variants() {
    let s = session_at(4);
    for (input, expected) in [
      (" 10 ", Verdict::Correct),
      ("The Number Of Words In This Sentence", Verdict::Correct),
      ("ten", Verdict::Incorrect),
    ] {
      let mut probe = s.clone();
      assert_eq!(probe.submit(input).verdict, expected, "{input}");
    }
  }

  #[test]
  fn binary_level_captures_its_number_on_activation() {
    let s = session_at(8);
    assert_eq!(s.context().number(keys::ACTIVE_LEVEL), Some(9));
    for ok in ["1001", "0b1001", "bin1001", "9", "binary 9"] {
      let mut probe = s.clone();
      assert_eq!(probe.submit(ok).verdict, Verdict::Correct, "{ok}");
    }
    let mut probe = s.clone();
    assert_eq!(probe.submit("1000").verdict, Verdict::Incorrect);
  }

  #[test]
  fn level_number_is_never_stored() {
    let s = session_at(9);
    assert!(s.context().get(keys::LEVEL_NUMBER).is_none());
    assert_eq!(s.context().text(keys::LAST_ACCEPTED_ANSWER).as_deref(), Some("1001"));
  }

  #[test]
  fn empty_catalog_is_immediately_won() {
    let mut s = GameSession::new(Arc::new(Catalog::new(Vec::new())), DEFAULT_HINT_THRESHOLD);
    assert!(s.is_won());
    assert_eq!(s.current_level_number(), 0);
    assert!(s.submit("x").won);
  }
}
