//! Static question banks used by the generator

use crate::models::{Difficulty, QuestionSnapshot};
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankItem {
  pub question: &'static str,
  pub options: [&'static str; 4],
  /// Index into `options`
  pub correct: usize,
  pub explanation: Option<&'static str>,
}

impl BankItem {
  pub fn correct_answer(&self) -> &'static str {
    self.options[self.correct]
  }

  pub fn snapshot(&self, user_answer: Option<&str>) -> QuestionSnapshot {
    QuestionSnapshot {
      question: self.question.to_string(),
      options: self.options.iter().map(|o| o.to_string()).collect(),
      user_answer: user_answer.map(String::from),
      correct_answer: self.correct_answer().to_string(),
      explanation: self.explanation.map(String::from),
    }
  }
}

/// Difficulty-partitioned items
#[derive(Debug, Clone)]
pub struct QuestionBank {
  easy: Vec<BankItem>,
  medium: Vec<BankItem>,
  hard: Vec<BankItem>,
}

impl QuestionBank {
  pub fn new(easy: Vec<BankItem>, medium: Vec<BankItem>, hard: Vec<BankItem>) -> Self {
    Self { easy, medium, hard }
  }

  /// One list serves every difficulty
  pub fn shared(items: Vec<BankItem>) -> Self {
    Self {
      easy: items.clone(),
      medium: items.clone(),
      hard: items,
    }
  }

  pub fn bucket(&self, difficulty: Difficulty) -> &[BankItem] {
    match difficulty {
      Difficulty::Easy => &self.easy,
      Difficulty::Medium => &self.medium,
      Difficulty::Hard => &self.hard,
    }
  }

  /// Up to `count` distinct items from the bucket
  pub fn sample<R: Rng + ?Sized>(&self, difficulty: Difficulty, count: usize, rng: &mut R) -> Vec<BankItem> {
    self.bucket(difficulty).choose_multiple(rng, count).copied().collect()
  }

  /// Arithmetic and reasoning items, 8 per difficulty
  pub fn builtin() -> Self {
    Self::new(EASY.to_vec(), MEDIUM.to_vec(), HARD.to_vec())
  }

  /// Critical-thinking items, shared across difficulties
  pub fn critical_thinking() -> Self {
    Self::shared(CRITICAL_THINKING.to_vec())
  }
}

const fn item(question: &'static str, options: [&'static str; 4], correct: usize) -> BankItem {
  BankItem {
    question,
    options,
    correct,
    explanation: None,
  }
}

const fn explained(
  question: &'static str,
  options: [&'static str; 4],
  correct: usize,
  explanation: &'static str,
) -> BankItem {
  BankItem {
    question,
    options,
    correct,
    explanation: Some(explanation),
  }
}

const EASY: [BankItem; 8] = [
  item("2 + 2 = ?", ["3", "4", "5", "6"], 1),
  item("7 - 3 = ?", ["2", "3", "4", "5"], 2),
  item("8 × 2 = ?", ["14", "16", "18", "20"], 1),
  item("10 ÷ 5 = ?", ["1", "2", "3", "5"], 1),
  item("What comes next: 2, 4, 6, 8, ?", ["9", "10", "12", "14"], 1),
  item(
    "If a car travels at 60 km/h, how far will it go in 1 hour?",
    ["30 km", "60 km", "90 km", "120 km"],
    1,
  ),
  item("Complete the pattern: A, C, E, G, ?", ["H", "I", "J", "K"], 1),
  item("Which of these is a primary color?", ["Green", "Orange", "Red", "Purple"], 2),
];

const MEDIUM: [BankItem; 8] = [
  item("If 3x - 7 = 14, what is x?", ["5", "7", "8", "10"], 1),
  item("25% of 80 is equal to?", ["15", "20", "25", "40"], 1),
  item("Complete the sequence: 3, 6, 12, 24, ?", ["36", "48", "52", "60"], 1),
  item(
    "If a train travels at 80 km/h, how long will it take to cover 200 km?",
    ["2 hours", "2.5 hours", "3 hours", "4 hours"],
    1,
  ),
  item("The average of 5, 10, 15 and 20 is?", ["10", "12.5", "15", "50"], 1),
  item(
    "If a shirt costs $25 with a 20% discount, what was the original price?",
    ["$20", "$28", "$30", "$31.25"],
    3,
  ),
  item("What is the next letter pattern: WXY, UVW, STU, ?", ["QRS", "PQR", "RST", "TUV"], 0),
  item(
    "If all cats have tails, and Fluffy is a cat, then...",
    ["All animals have tails", "Fluffy has a tail", "Fluffy is an animal", "All tails belong to cats"],
    1,
  ),
];

const HARD: [BankItem; 8] = [
  item("If log(x) = 2, what is x?", ["10", "20", "100", "1000"], 2),
  item(
    "Find the derivative of f(x) = 3x² + 2x - 1",
    ["6x + 2", "6x - 2", "3x² + 2", "6x² + 2x"],
    0,
  ),
  item(
    "A factory produces 1000 items, of which 5% are defective. If 3 items are selected at random, what is the probability all are non-defective?",
    ["0.857", "0.875", "0.900", "0.950"],
    0,
  ),
  item(
    "In a right triangle, if one leg is 5 and the hypotenuse is 13, what is the length of the other leg?",
    ["8", "12", "11", "10"],
    1,
  ),
  item("What is the value of x in the equation 2^(x+1) = 32?", ["3", "4", "5", "16"], 1),
  item(
    "If A implies B, and B implies C, then...",
    ["A implies C", "C implies A", "A and C are equivalent", "None of the above"],
    0,
  ),
  item("Solve for x: 3x - log(x) = 10", ["3", "3.5", "4", "4.5"], 1),
  item(
    "In a study, 70% of participants were female. If there were 210 females, how many participants were there in total?",
    ["280", "300", "350", "420"],
    1,
  ),
];

const CRITICAL_THINKING: [BankItem; 10] = [
  explained(
    "Which of the following best represents a logical fallacy?",
    [
      "Using evidence to support a claim",
      "Attacking a person's character instead of their argument",
      "Making a conclusion based on multiple premises",
      "Examining both sides of an issue",
    ],
    1,
    "An ad hominem argument attacks the person making the argument rather than the argument itself.",
  ),
  explained(
    "What is the main purpose of a control group in a scientific experiment?",
    [
      "To increase the sample size",
      "To provide a basis for comparison",
      "To ensure the experiment is reproducible",
      "To make the results more interesting",
    ],
    1,
    "A control group lets researchers tell whether an effect comes from the treatment or from other factors.",
  ),
  explained(
    "If all mammals are animals, and all dogs are mammals, what can be logically concluded?",
    [
      "All animals are mammals",
      "All animals are dogs",
      "All dogs are animals",
      "No valid conclusion can be drawn",
    ],
    2,
    "Dogs are a subset of mammals, which are a subset of animals, so dogs are a subset of animals.",
  ),
  explained(
    "What is the primary flaw in the following argument: 'Most scientists agree that climate change is real, so it must be true.'?",
    [
      "It relies on appeal to authority",
      "It uses circular reasoning",
      "It commits the straw man fallacy",
      "It employs false dichotomy",
    ],
    0,
    "The argument cites the consensus rather than the evidence behind it.",
  ),
  explained(
    "Which statement best exemplifies critical thinking?",
    [
      "Accepting information from trusted sources without question",
      "Dismissing evidence that contradicts your beliefs",
      "Evaluating evidence and considering alternative explanations",
      "Finding sources that support your pre-existing views",
    ],
    2,
    "Critical thinking weighs evidence and alternatives instead of assumptions.",
  ),
  explained(
    "What is the issue with correlation in establishing causation?",
    [
      "Correlations are never related to causation",
      "Correlations are always random coincidences",
      "Correlation alone cannot prove causation",
      "Causation always precedes correlation",
    ],
    2,
    "Two factors moving together may share a third cause, run in reverse, or be coincidence.",
  ),
  explained(
    "In a deductive argument, if the premises are true and the argument is valid, then the conclusion is:",
    [
      "Possibly true",
      "Necessarily true",
      "Likely to be false",
      "Unrelated to the premises",
    ],
    1,
    "A valid deductive argument with true premises guarantees its conclusion.",
  ),
  explained(
    "What is the main problem with confirmation bias?",
    [
      "It makes people too skeptical of new information",
      "It leads people to ignore evidence that supports their views",
      "It causes people to seek out and favor information that confirms existing beliefs",
      "It forces people to change their opinions too frequently",
    ],
    2,
    "Confirmation bias favors information that agrees with what one already believes.",
  ),
  explained(
    "Why is sample size important in research?",
    [
      "Larger samples are always more expensive to study",
      "Smaller samples provide more detailed information",
      "Larger samples typically provide more reliable results",
      "Sample size has no effect on research validity",
    ],
    2,
    "Larger samples dampen random variation and outliers.",
  ),
  explained(
    "What does it mean to evaluate the credibility of a source?",
    [
      "Checking if the source agrees with your viewpoint",
      "Assessing the author's expertise, potential biases, and evidence quality",
      "Determining how popular the source is",
      "Verifying that the source is recent",
    ],
    1,
    "Credibility rests on expertise, conflicts of interest and the quality of the evidence.",
  ),
];

#[cfg(test)]
mod tests {
  use super::*;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use std::collections::HashSet;

  #[test]
  fn test_builtin_bank_sizes() {
    let bank = QuestionBank::builtin();
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
      assert_eq!(bank.bucket(difficulty).len(), 8);
    }
    assert_eq!(QuestionBank::critical_thinking().bucket(Difficulty::Hard).len(), 10);
  }

  #[test]
  fn test_sample_is_without_replacement() {
    let bank = QuestionBank::builtin();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
      let picked = bank.sample(Difficulty::Medium, 5, &mut rng);
      assert_eq!(picked.len(), 5);
      let unique: HashSet<_> = picked.iter().map(|i| i.question).collect();
      assert_eq!(unique.len(), 5);
    }

    // Capped at bucket size
    assert_eq!(bank.sample(Difficulty::Easy, 20, &mut rng).len(), 8);
  }

  #[test]
  fn test_every_answer_key_is_in_range() {
    let all = EASY.iter().chain(MEDIUM.iter()).chain(HARD.iter()).chain(CRITICAL_THINKING.iter());
    for item in all {
      assert!(item.correct < 4, "bad key for {}", item.question);
    }
  }
}
