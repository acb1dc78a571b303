use std::time::Duration;

use tokio::sync::watch;
use uuid::Uuid;

use crate::state::{
    quiz::{ChatId, Quiz, QuizId},
    registry::SessionId,
    scores::FinalCounts,
    shuffle::ShuffleMode,
    state_machine::PlayStateMachine,
};

/// One user's play-through, from quiz selection until its report is delivered.
#[derive(Debug)]
pub struct PlaySession {
    pub session_id: SessionId,
    pub chat_id: ChatId,
    pub quiz: Quiz,
    pub shuffle_mode: ShuffleMode,
    /// Question window in seconds; zero until a timer has been chosen.
    pub timer_secs: u64,
    pub machine: PlayStateMachine,
    cancel: watch::Sender<bool>,
}

impl PlaySession {
    pub fn new(chat_id: ChatId, quiz: Quiz, shuffle_mode: ShuffleMode) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            session_id: Uuid::new_v4(),
            chat_id,
            quiz,
            shuffle_mode,
            timer_secs: 0,
            machine: PlayStateMachine::new(),
            cancel,
        }
    }

    /// Receiver resolved once the session is abandoned.
    pub fn cancellation(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Signal the session task to stop at its next suspension point.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }
}

/// Final outcome of a play-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub quiz_id: QuizId,
    pub quiz_title: String,
    pub total: u32,
    pub correct: u32,
    pub wrong: u32,
    pub answered: u32,
    pub missed: u32,
    pub elapsed: Duration,
    /// Emission stopped before the last question.
    pub aborted: bool,
}

impl SessionReport {
    /// Build a report so that `correct + wrong + missed == total` always holds.
    pub fn new(
        session_id: SessionId,
        quiz: &Quiz,
        counts: FinalCounts,
        elapsed: Duration,
        aborted: bool,
    ) -> Self {
        let total = u32::try_from(quiz.questions.len()).unwrap_or(u32::MAX);
        let answered = (counts.correct + counts.wrong).min(total);
        let correct = counts.correct.min(answered);
        Self {
            session_id,
            quiz_id: quiz.id,
            quiz_title: quiz.title.clone(),
            total,
            correct,
            wrong: answered - correct,
            answered,
            missed: total - answered,
            elapsed,
            aborted,
        }
    }
}
