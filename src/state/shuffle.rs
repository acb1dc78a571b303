//! Per-session randomisation of question order and option order.

use std::{fmt, str::FromStr};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::quiz::Question;

/// Which parts of a quiz are randomised for a play-through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShuffleMode {
    /// Questions and options keep their authored order.
    #[default]
    None,
    /// Question order is permuted; options are untouched.
    Questions,
    /// Each question's options are permuted; question order is untouched.
    Answers,
    /// Both question order and option order are permuted.
    All,
}

impl ShuffleMode {
    /// Every mode, in the order offered to players.
    pub const ALL: [ShuffleMode; 4] = [
        ShuffleMode::None,
        ShuffleMode::Questions,
        ShuffleMode::Answers,
        ShuffleMode::All,
    ];

    /// Stable wire name, also used in button payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ShuffleMode::None => "none",
            ShuffleMode::Questions => "questions",
            ShuffleMode::Answers => "answers",
            ShuffleMode::All => "all",
        }
    }

    /// Human readable label for keyboards.
    pub fn label(self) -> &'static str {
        match self {
            ShuffleMode::None => "No shuffle",
            ShuffleMode::Questions => "Shuffle questions",
            ShuffleMode::Answers => "Shuffle answers",
            ShuffleMode::All => "Shuffle everything",
        }
    }

    fn shuffles_questions(self) -> bool {
        matches!(self, ShuffleMode::Questions | ShuffleMode::All)
    }

    fn shuffles_answers(self) -> bool {
        matches!(self, ShuffleMode::Answers | ShuffleMode::All)
    }
}

impl fmt::Display for ShuffleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown shuffle mode name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shuffle mode `{0}`")]
pub struct UnknownShuffleMode(pub String);

impl FromStr for ShuffleMode {
    type Err = UnknownShuffleMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShuffleMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownShuffleMode(s.to_owned()))
    }
}

/// Working copy of a quiz for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledQuiz {
    /// Questions in play order, with options in display order.
    pub ordered_questions: Vec<Question>,
    /// Correct option position for each entry of `ordered_questions`.
    pub per_question_correct_index: Vec<usize>,
}

/// Shuffle `questions` according to `mode` using the thread-local RNG.
pub fn apply_shuffle(questions: &[Question], mode: ShuffleMode) -> ShuffledQuiz {
    apply_shuffle_with(&mut rand::rng(), questions, mode)
}

/// Shuffle `questions` according to `mode` with an explicit random source.
///
/// The input is never mutated: the result always owns fresh copies. When options are
/// permuted the correct index follows the option that was correct before, not its slot.
pub fn apply_shuffle_with<R: Rng + ?Sized>(
    rng: &mut R,
    questions: &[Question],
    mode: ShuffleMode,
) -> ShuffledQuiz {
    let mut ordered_questions = questions.to_vec();

    if mode.shuffles_questions() {
        ordered_questions.shuffle(rng);
    }

    if mode.shuffles_answers() {
        for question in &mut ordered_questions {
            shuffle_options(rng, question);
        }
    }

    let per_question_correct_index = ordered_questions
        .iter()
        .map(|question| question.correct_index)
        .collect();

    ShuffledQuiz {
        ordered_questions,
        per_question_correct_index,
    }
}

fn shuffle_options<R: Rng + ?Sized>(rng: &mut R, question: &mut Question) {
    let mut permutation: Vec<usize> = (0..question.options.len()).collect();
    permutation.shuffle(rng);

    // permutation[new_slot] = old_slot
    let options = permutation
        .iter()
        .map(|&old| question.options[old].clone())
        .collect();
    let correct_index = permutation
        .iter()
        .position(|&old| old == question.correct_index)
        .unwrap_or(question.correct_index);

    question.options = options;
    question.correct_index = correct_index;
}
