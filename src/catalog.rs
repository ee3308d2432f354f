//! The fixed puzzle sequence.
//!
//! Each level accepts its canonical answer plus a documented set of lenient
//! variants. Validators are pure functions of `(candidate, context)`; levels
//! that chain on earlier answers read them from context keys filled in by their
//! own setup function, never from anywhere else.

use crate::domain::{keys, Context, LevelDefinition, Text};
use crate::util::{fold, strip_chars, strip_whitespace};

/// Punctuation ignored when the chained-repeat instruction is typed literally.
const INSTRUCTION_PUNCT: &[char] = &[',', '.', '\'', '"'];

/// Ordered, immutable list of levels.
#[derive(Clone, Debug)]
pub struct Catalog {
  levels: Vec<LevelDefinition>,
}

impl Catalog {
  pub fn new(levels: Vec<LevelDefinition>) -> Self {
    Self { levels }
  }

  /// The ten-level password game.
  pub fn standard() -> Self {
    Self::new(vec![
      LevelDefinition::new("literal-password", "Enter password:", |v, _| v == "password")
        .with_expected(Text::Static("password"))
        .with_hint("Yes, the literal word password."),
      LevelDefinition::new("incorrect", "Password is incorrect", |v, _| v == "incorrect")
        .with_expected(Text::Static("incorrect"))
        .with_hint("What word appears (and is emphasized) in the label?"),
      // Case-sensitive on purpose; most later levels fold case.
      LevelDefinition::new("try-again", "Try again.", |v, _| v == "again")
        .with_expected(Text::Static("again"))
        .with_hint("Ignore punctuation. One word stands out."),
      LevelDefinition::new("again-later", "Please try again later.", |v, _| v == "again later")
        .with_expected(Text::Static("again later"))
        .with_hint("Take the last two meaningful words."),
      LevelDefinition::new(
        "word-count",
        "The password equals the number of words in this sentence.",
        word_count,
      )
      .with_normalizer(|raw| raw.trim().to_string())
      .with_expected(Text::Static("10 OR \"the number of words in this sentence\""))
      .with_hint("Either give the count (10) or literally type the phrase after \"equals\"."),
      LevelDefinition::new(
        "chained-repeat",
        "Type the previous level's answer twice, no space.",
        chained_repeat,
      )
      .with_setup(capture_previous_answer)
      .with_expected(Text::Derived(chained_repeat_expected))
      .with_hint("Either double it exactly, write the instruction literally, or try prevAnswer + x2."),
      LevelDefinition::new(
        "alphabet-backwards",
        "Enter the first 4 letters of the alphabet backwards.",
        alphabet_backwards,
      )
      .with_expected(Text::Static("dcba (case/spacing flexible) OR the sentence itself"))
      .with_hint("Reverse A B C D -> D C B A. Or be literal with the instruction."),
      LevelDefinition::new(
        "sum-and-word",
        "Enter the sum of 12 and 35, then the word sum (no space).",
        sum_and_word,
      )
      .with_expected(Text::Static("47sum (also accepts 47SUM, sum47, 12+35=sum)"))
      .with_hint("Add them: 12 + 35. Then maybe append/precede the word sum."),
      LevelDefinition::new("binary-level", "Type the current level number in binary.", binary_level)
        .with_setup(capture_active_level)
        .with_expected(Text::Derived(binary_level_expected))
        .with_hint("Level 9 -> 1001 in binary. Prefixed or decimal also allowed."),
      LevelDefinition::new(
        "echo-riddle",
        "Final: I speak without a mouth and hear without ears. What am I?",
        |v, _| {
          let t = fold(v);
          t == "echo" || t == "an echo"
        },
      )
      .with_expected(Text::Static("echo"))
      .with_hint("It returns what you send to it—classic riddle."),
    ])
  }

  pub fn get(&self, index: usize) -> Option<&LevelDefinition> {
    self.levels.get(index)
  }

  pub fn len(&self) -> usize {
    self.levels.len()
  }

  #[allow(dead_code)]
  pub fn is_empty(&self) -> bool {
    self.levels.is_empty()
  }

  #[allow(dead_code)]
  pub fn iter(&self) -> impl Iterator<Item = &LevelDefinition> {
    self.levels.iter()
  }
}

fn word_count(v: &str, _ctx: &Context) -> bool {
  let t = fold(v);
  t == "10" || t == "the number of words in this sentence"
}

fn capture_previous_answer(ctx: &Context) -> Context {
  match ctx.text(keys::LAST_ACCEPTED_ANSWER) {
    Some(prev) => Context::new().with(keys::PREVIOUS_ANSWER, prev),
    None => Context::new(),
  }
}

fn chained_repeat(v: &str, ctx: &Context) -> bool {
  let candidate = v.trim();
  let literal = strip_chars("the previous level's answer twice no space", INSTRUCTION_PUNCT);
  if strip_chars(&candidate.to_lowercase(), INSTRUCTION_PUNCT) == literal {
    return true;
  }
  // Without a captured answer only the literal instruction can match.
  let Some(prev) = ctx.text(keys::PREVIOUS_ANSWER) else { return false };
  candidate == prev.repeat(2) || candidate.to_lowercase() == format!("{}x2", prev).to_lowercase()
}

fn chained_repeat_expected(ctx: &Context) -> String {
  let prev = ctx.text(keys::PREVIOUS_ANSWER).unwrap_or_default();
  format!("{} OR phrase or prevAnswerx2", prev.repeat(2))
}

fn alphabet_backwards(v: &str, _ctx: &Context) -> bool {
  let raw = v.trim();
  strip_whitespace(raw).to_lowercase() == "dcba"
    || raw.to_lowercase() == "the first 4 letters of the alphabet backwards"
}

fn sum_and_word(v: &str, _ctx: &Context) -> bool {
  let t = v.trim();
  let lower = t.to_lowercase();
  lower == "47sum" || t == "47SUM" || lower == "sum47" || strip_whitespace(t) == "12+35=sum"
}

fn capture_active_level(ctx: &Context) -> Context {
  match ctx.number(keys::LEVEL_NUMBER) {
    Some(n) => Context::new().with(keys::ACTIVE_LEVEL, n),
    None => Context::new(),
  }
}

/// Level captured on activation, falling back to the evaluation-time number.
fn active_level(ctx: &Context) -> Option<u64> {
  ctx.number(keys::ACTIVE_LEVEL).or_else(|| ctx.number(keys::LEVEL_NUMBER))
}

fn binary_level(v: &str, ctx: &Context) -> bool {
  let Some(level) = active_level(ctx) else { return false };
  let base = format!("{:b}", level);
  let t = fold(v);
  if t == base || t == format!("0b{}", base) || t == format!("bin{}", base) {
    return true;
  }
  match ctx.number(keys::LEVEL_NUMBER) {
    Some(n) => t == n.to_string() || t == format!("binary {}", n),
    None => false,
  }
}

fn binary_level_expected(ctx: &Context) -> String {
  let level = active_level(ctx).unwrap_or_default();
  let base = format!("{:b}", level);
  format!("{base} (also accepts 0b{base}, bin{base}, decimal {level})")
}
