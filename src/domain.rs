//! Domain models used by the engine: level definitions, context-dependent text, and the context map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known context keys.
pub mod keys {
  /// Accepted answer of the most recently completed level.
  pub const LAST_ACCEPTED_ANSWER: &str = "lastAcceptedAnswer";
  /// 1-based number of the level being evaluated (overlaid, never stored).
  pub const LEVEL_NUMBER: &str = "levelNumber";
  /// Previous level's answer, captured when the chained-repeat level activates.
  pub const PREVIOUS_ANSWER: &str = "previousAnswer";
  /// Level number captured when the binary level activates.
  pub const ACTIVE_LEVEL: &str = "activeLevel";
}

/// A single value stored in the session context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
  Number(u64),
  Text(String),
}

impl From<u64> for ContextValue {
  fn from(n: u64) -> Self { ContextValue::Number(n) }
}
impl From<String> for ContextValue {
  fn from(s: String) -> Self { ContextValue::Text(s) }
}
impl From<&str> for ContextValue {
  fn from(s: &str) -> Self { ContextValue::Text(s.to_string()) }
}

/// Facts accumulated from prior levels. Keys are only ever added or overwritten.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
  entries: BTreeMap<String, ContextValue>,
}

impl Context {
  pub fn new() -> Self { Self::default() }

  #[allow(dead_code)]
  pub fn get(&self, key: &str) -> Option<&ContextValue> {
    self.entries.get(key)
  }

  /// Text value for `key`; numbers are rendered in decimal.
  pub fn text(&self, key: &str) -> Option<String> {
    match self.entries.get(key)? {
      ContextValue::Text(s) => Some(s.clone()),
      ContextValue::Number(n) => Some(n.to_string()),
    }
  }

  pub fn number(&self, key: &str) -> Option<u64> {
    match self.entries.get(key)? {
      ContextValue::Number(n) => Some(*n),
      ContextValue::Text(s) => s.parse().ok(),
    }
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
    self.entries.insert(key.into(), value.into());
  }

  /// Builder-style insert, handy for partial updates returned by `derive_context`.
  #[must_use]
  pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
    self.insert(key, value);
    self
  }

  /// Merge a partial update into this context (later values win).
  pub fn merge(&mut self, update: Context) {
    self.entries.extend(update.entries);
  }

  pub fn len(&self) -> usize { self.entries.len() }

  #[allow(dead_code)]
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

/// Text that is either fixed or computed from the session context.
#[derive(Clone, Copy)]
pub enum Text {
  Static(&'static str),
  Derived(fn(&Context) -> String),
}

impl Text {
  pub fn resolve(&self, ctx: &Context) -> String {
    match self {
      Text::Static(s) => (*s).to_string(),
      Text::Derived(f) => f(ctx),
    }
  }
}

impl std::fmt::Debug for Text {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Text::Static(s) => write!(f, "Static({:?})", s),
      Text::Derived(_) => f.write_str("Derived(<fn>)"),
    }
  }
}

pub type Validator = fn(&str, &Context) -> bool;
pub type Normalizer = fn(&str) -> String;
pub type ContextDeriver = fn(&Context) -> Context;

/// One puzzle step. Built once with the catalog and never mutated.
#[derive(Clone)]
pub struct LevelDefinition {
  /// Stable slug used in logs and protocol payloads.
  pub id: &'static str,
  pub prompt: Text,
  pub validate: Validator,
  pub normalize_input: Option<Normalizer>,
  pub derive_context: Option<ContextDeriver>,
  /// Describes the accepted answer(s). Debug surfaces only, never used to validate.
  pub expected_answer: Text,
  pub hint: &'static str,
}

impl LevelDefinition {
  pub fn new(id: &'static str, prompt: &'static str, validate: Validator) -> Self {
    Self {
      id,
      prompt: Text::Static(prompt),
      validate,
      normalize_input: None,
      derive_context: None,
      expected_answer: Text::Static(""),
      hint: "",
    }
  }

  #[must_use]
  pub fn with_normalizer(mut self, f: Normalizer) -> Self {
    self.normalize_input = Some(f);
    self
  }

  #[must_use]
  pub fn with_setup(mut self, f: ContextDeriver) -> Self {
    self.derive_context = Some(f);
    self
  }

  #[must_use]
  pub fn with_expected(mut self, expected: Text) -> Self {
    self.expected_answer = expected;
    self
  }

  #[must_use]
  pub fn with_hint(mut self, hint: &'static str) -> Self {
    self.hint = hint;
    self
  }

  /// Identity when the level has no normalizer.
  pub fn normalize(&self, raw: &str) -> String {
    match self.normalize_input {
      Some(f) => f(raw),
      None => raw.to_string(),
    }
  }

  pub fn accepts(&self, candidate: &str, ctx: &Context) -> bool {
    (self.validate)(candidate, ctx)
  }

  /// Partial context update produced when this level becomes active.
  pub fn setup(&self, ctx: &Context) -> Option<Context> {
    self.derive_context.map(|f| f(ctx))
  }
}

impl std::fmt::Debug for LevelDefinition {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LevelDefinition")
      .field("id", &self.id)
      .field("prompt", &self.prompt)
      .field("normalizes", &self.normalize_input.is_some())
      .field("has_setup", &self.derive_context.is_some())
      .field("hint", &self.hint)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn context_merge_overwrites_and_keeps_existing_keys() {
    let mut ctx = Context::new().with("a", "one").with("n", 3u64);
    ctx.merge(Context::new().with("a", "two").with("b", "three"));

    assert_eq!(ctx.text("a").as_deref(), Some("two"));
    assert_eq!(ctx.text("b").as_deref(), Some("three"));
    assert_eq!(ctx.number("n"), Some(3));
    assert_eq!(ctx.text("n").as_deref(), Some("3"));
    assert_eq!(ctx.len(), 3);
  }

  #[test]
  fn derived_text_reads_context() {
    fn greet(ctx: &Context) -> String {
      format!("hi {}", ctx.text("name").unwrap_or_default())
    }
    let ctx = Context::new().with("name", "echo");
    assert_eq!(Text::Derived(greet).resolve(&ctx), "hi echo");
    assert_eq!(Text::Static("fixed").resolve(&ctx), "fixed");
  }

  #[test]
  fn level_without_normalizer_is_identity() {
    let lvl = LevelDefinition::new("x", "prompt", |v, _| v == "x");
    assert_eq!(lvl.normalize("  x "), "  x ");
    assert!(lvl.accepts("x", &Context::new()));
    assert!(lvl.setup(&Context::new()).is_none());
  }

  #[test]
  fn context_serializes_as_flat_map() {
    let ctx = Context::new().with(keys::LAST_ACCEPTED_ANSWER, "10").with(keys::ACTIVE_LEVEL, 9u64);
    let json = serde_json::to_value(&ctx).unwrap();
    assert_eq!(json, serde_json::json!({ "activeLevel": 9, "lastAcceptedAnswer": "10" }));
  }
}
