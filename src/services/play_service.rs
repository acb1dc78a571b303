//! Play engine: quiz selection, timed emission of questions and finalization.
//!
//! Each running session is driven by one spawned task. The task only suspends on the
//! question windows and the grace period, and never while holding a score card lock.
//! Answers are ingested concurrently through [`crate::services::answer_service`].

use std::{
    fmt::Write as _,
    time::{Duration, SystemTime},
};

use thiserror::Error;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, sleep},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::ResultEntity,
    error::ServiceError,
    services::transport::OutboundQuestion,
    state::{
        SharedState,
        quiz::{ChatId, Quiz, QuizId, UserId},
        registry::{Correlation, SessionId},
        scores::SharedCard,
        session::{PlaySession, SessionReport},
        shuffle::{ShuffleMode, ShuffledQuiz, apply_shuffle},
        state_machine::{InvalidTransition, PlayEvent, PlayPhase},
    },
};

/// Reasons a play session cannot be prepared or started.
#[derive(Debug, Error)]
pub enum PlayError {
    #[error("quiz `{0}` not found")]
    QuizNotFound(QuizId),
    #[error("quiz `{0}` has no questions")]
    EmptyQuiz(QuizId),
    #[error("a {requested}s timer is not offered (allowed: {allowed:?})")]
    TimerNotAllowed { requested: u64, allowed: Vec<u64> },
    #[error("no play session is being prepared")]
    NoSession,
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
}

/// Quiz picked for a new session, waiting for a timer.
#[derive(Debug, Clone)]
pub struct SelectedQuiz {
    pub session_id: SessionId,
    pub quiz_id: QuizId,
    pub title: String,
    pub question_count: usize,
}

/// Handle on a session whose questions are being emitted.
#[derive(Debug)]
pub struct RunningSession {
    pub session_id: SessionId,
    pub quiz_title: String,
    pub question_count: usize,
    /// Resolves with the report, or `None` when the session was abandoned.
    pub task: JoinHandle<Option<SessionReport>>,
}

struct SessionRun {
    user_id: UserId,
    session_id: SessionId,
    chat_id: ChatId,
    quiz: Quiz,
    shuffled: ShuffledQuiz,
    window: Duration,
    cancel: watch::Receiver<bool>,
}

/// Load `quiz_id` for `user_id` and open a session with the given shuffle mode.
///
/// A session the user already has is superseded, but only once the new quiz is known
/// to be playable.
pub async fn select_quiz(
    state: &SharedState,
    user_id: UserId,
    chat_id: ChatId,
    quiz_id: QuizId,
    mode: ShuffleMode,
) -> Result<SelectedQuiz, ServiceError> {
    let store = state.require_quiz_store().await?;
    let entity = store
        .find_quiz(quiz_id)
        .await?
        .ok_or(PlayError::QuizNotFound(quiz_id))?;
    let quiz = Quiz::try_from(entity).map_err(|err| {
        warn!(%quiz_id, error = %err, "stored quiz cannot be played");
        PlayError::QuizNotFound(quiz_id)
    })?;
    if quiz.questions.is_empty() {
        return Err(PlayError::EmptyQuiz(quiz_id).into());
    }

    if abandon(state, user_id).await {
        info!(user_id, "previous play session superseded");
    }

    let mut session = PlaySession::new(chat_id, quiz, mode);
    session
        .machine
        .apply(PlayEvent::ShuffleChosen)
        .map_err(PlayError::from)?;

    let selected = SelectedQuiz {
        session_id: session.session_id,
        quiz_id,
        title: session.quiz.title.clone(),
        question_count: session.quiz.questions.len(),
    };

    if let Some(previous) = state.sessions().insert(user_id, session) {
        previous.cancel();
    }

    info!(
        user_id,
        chat_id,
        session_id = %selected.session_id,
        %quiz_id,
        shuffle = %mode,
        "quiz selected for play"
    );
    Ok(selected)
}

/// Choose the question window of the prepared session.
pub fn select_timer(state: &SharedState, user_id: UserId, secs: u64) -> Result<(), ServiceError> {
    let config = state.config();
    if !config.allows_timer(secs) {
        return Err(PlayError::TimerNotAllowed {
            requested: secs,
            allowed: config.timer_choices_secs.clone(),
        }
        .into());
    }

    let mut session = state
        .sessions()
        .get_mut(&user_id)
        .ok_or(PlayError::NoSession)?;
    session
        .machine
        .apply(PlayEvent::TimerChosen)
        .map_err(PlayError::from)?;
    session.timer_secs = secs;
    Ok(())
}

/// Shuffle the quiz, open the score card and spawn the session task.
pub async fn start(state: &SharedState, user_id: UserId) -> Result<RunningSession, ServiceError> {
    let run = {
        let mut session = state
            .sessions()
            .get_mut(&user_id)
            .ok_or(PlayError::NoSession)?;
        session
            .machine
            .apply(PlayEvent::Start)
            .map_err(PlayError::from)?;

        SessionRun {
            user_id,
            session_id: session.session_id,
            chat_id: session.chat_id,
            quiz: session.quiz.clone(),
            shuffled: apply_shuffle(&session.quiz.questions, session.shuffle_mode),
            window: Duration::from_secs(session.timer_secs),
            cancel: session.cancellation(),
        }
    };

    let card = state
        .scores()
        .open(
            user_id,
            run.session_id,
            run.shuffled.per_question_correct_index.clone(),
        )
        .await;

    if let Err(err) = state
        .transport()
        .emit_text(run.chat_id, format!("▶️ Starting quiz: {}", run.quiz.title))
        .await
    {
        warn!(user_id, error = %err, "failed to announce quiz start");
    }

    let session_id = run.session_id;
    let quiz_title = run.quiz.title.clone();
    let question_count = run.shuffled.ordered_questions.len();
    info!(
        user_id,
        %session_id,
        questions = question_count,
        window_secs = run.window.as_secs(),
        "play session started"
    );

    let task = tokio::spawn(run_session(state.clone(), run, card));

    Ok(RunningSession {
        session_id,
        quiz_title,
        question_count,
        task,
    })
}

/// Abandon the user's session, if any: no report, pending tokens purged.
pub async fn abandon(state: &SharedState, user_id: UserId) -> bool {
    let Some((_, mut session)) = state.sessions().remove(&user_id) else {
        return false;
    };
    session.cancel();
    if let Err(err) = session.machine.apply(PlayEvent::Abandon) {
        debug!(user_id, error = %err, "abandoned session was already done");
    }

    if let Some(card) = state.scores().card(user_id) {
        let owned = card.lock().await.session_id == session.session_id;
        if owned {
            let counts = state
                .scores()
                .finalize(user_id, &card, state.registry())
                .await;
            debug!(
                user_id,
                purged = counts.purged_tokens,
                "score card of abandoned session closed"
            );
        }
    }

    info!(user_id, session_id = %session.session_id, "play session abandoned");
    true
}

/// Abandon every session, used on shutdown.
pub async fn abandon_all(state: &SharedState) -> usize {
    let users: Vec<UserId> = state.sessions().iter().map(|entry| *entry.key()).collect();
    let mut abandoned = 0;
    for user_id in users {
        if abandon(state, user_id).await {
            abandoned += 1;
        }
    }
    abandoned
}

/// Phase of the user's current session.
pub fn session_phase(state: &SharedState, user_id: UserId) -> Option<PlayPhase> {
    state
        .sessions()
        .get(&user_id)
        .map(|session| session.machine.phase())
}

async fn run_session(
    state: SharedState,
    run: SessionRun,
    card: SharedCard,
) -> Option<SessionReport> {
    let SessionRun {
        user_id,
        session_id,
        chat_id,
        quiz,
        shuffled,
        window,
        mut cancel,
    } = run;

    let started_at = Instant::now();
    let total = shuffled.ordered_questions.len();
    let mut aborted = false;

    for (index, question) in shuffled.ordered_questions.into_iter().enumerate() {
        if *cancel.borrow() {
            return release_abandoned(&state, user_id, session_id, &card).await;
        }

        let outbound = OutboundQuestion {
            text: format!(
                "Q{}/{}: {} (⏱️ {}s)",
                index + 1,
                total,
                question.text,
                window.as_secs()
            ),
            options: question.options,
            correct_index: question.correct_index,
            open_period_secs: Some(window.as_secs()),
        };

        let token = match state.transport().emit_question(chat_id, outbound).await {
            Ok(token) => token,
            Err(err) => {
                warn!(
                    user_id,
                    %session_id,
                    question = index,
                    error = %err,
                    "question emission failed; finalizing early"
                );
                aborted = true;
                break;
            }
        };

        let correlation = Correlation {
            user_id,
            session_id,
            question_index: index,
        };
        match state
            .scores()
            .register_question(&card, state.registry(), &token, correlation)
            .await
        {
            Ok(true) => debug!(user_id, %session_id, question = index, "question emitted"),
            Ok(false) => return release_abandoned(&state, user_id, session_id, &card).await,
            Err(err) => {
                error!(
                    user_id,
                    %session_id,
                    question = index,
                    error = %err,
                    "correlation token collision; finalizing early"
                );
                aborted = true;
                break;
            }
        }

        if !sleep_unless_cancelled(&mut cancel, window).await {
            return release_abandoned(&state, user_id, session_id, &card).await;
        }
    }

    if !aborted && !sleep_unless_cancelled(&mut cancel, state.config().grace_period).await {
        return release_abandoned(&state, user_id, session_id, &card).await;
    }

    advance(&state, user_id, session_id, PlayEvent::QuestionsExhausted);
    let counts = state
        .scores()
        .finalize(user_id, &card, state.registry())
        .await;
    let report = SessionReport::new(session_id, &quiz, counts, started_at.elapsed(), aborted);
    info!(
        user_id,
        %session_id,
        correct = report.correct,
        wrong = report.wrong,
        missed = report.missed,
        aborted,
        "play session finalized"
    );

    publish_report(&state, user_id, chat_id, &report).await;

    advance(&state, user_id, session_id, PlayEvent::Finalized);
    state
        .sessions()
        .remove_if(&user_id, |_, session| session.session_id == session_id);

    Some(report)
}

/// Sleep for `duration`; `false` when the session got cancelled first.
async fn sleep_unless_cancelled(cancel: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        _ = sleep(duration) => true,
        _ = cancel.wait_for(|cancelled| *cancelled) => false,
    }
}

async fn release_abandoned(
    state: &SharedState,
    user_id: UserId,
    session_id: SessionId,
    card: &SharedCard,
) -> Option<SessionReport> {
    let counts = state
        .scores()
        .finalize(user_id, card, state.registry())
        .await;
    debug!(
        user_id,
        %session_id,
        purged = counts.purged_tokens,
        "session task stopped after abandon"
    );
    None
}

fn advance(state: &SharedState, user_id: UserId, session_id: SessionId, event: PlayEvent) {
    let Some(mut session) = state.sessions().get_mut(&user_id) else {
        return;
    };
    if session.session_id != session_id {
        return;
    }
    if let Err(err) = session.machine.apply(event) {
        warn!(user_id, %session_id, error = %err, "unexpected play transition");
    }
}

/// Persist the result, then deliver the report and the leaderboard. Failures are logged.
async fn publish_report(
    state: &SharedState,
    user_id: UserId,
    chat_id: ChatId,
    report: &SessionReport,
) {
    let store = state.quiz_store().await;

    match &store {
        Some(store) => {
            let result = ResultEntity {
                id: Uuid::new_v4(),
                quiz_id: report.quiz_id,
                user_id,
                correct: report.correct,
                wrong: report.wrong,
                missed: report.missed,
                total: report.total,
                finished_at: SystemTime::now(),
            };
            if let Err(err) = store.save_result(result).await {
                warn!(user_id, error = %err, "failed to persist session result");
            }
        }
        None => warn!(user_id, "storage unavailable; session result not persisted"),
    }

    if let Err(err) = state
        .transport()
        .emit_report(chat_id, render_report(report), report.clone())
        .await
    {
        warn!(user_id, error = %err, "failed to deliver session report");
    }

    let Some(store) = store else {
        return;
    };
    match store
        .top_results(report.quiz_id, state.config().leaderboard_size)
        .await
    {
        Ok(results) => {
            if let Err(err) = state
                .transport()
                .emit_text(chat_id, render_leaderboard(&results))
                .await
            {
                warn!(user_id, error = %err, "failed to deliver leaderboard");
            }
        }
        Err(err) => warn!(user_id, error = %err, "failed to load leaderboard"),
    }
}

pub(crate) fn render_report(report: &SessionReport) -> String {
    let mut text = format!(
        "🏁 Quiz finished: {}\n✅ Correct: {}\n❌ Wrong: {}\n⏭️ Missed: {}\nScore: {}/{} in {:.1}s",
        report.quiz_title,
        report.correct,
        report.wrong,
        report.missed,
        report.correct,
        report.total,
        report.elapsed.as_secs_f64()
    );
    if report.aborted {
        text.push_str("\n⚠️ The quiz was interrupted before the last question.");
    }
    text
}

pub(crate) fn render_leaderboard(results: &[ResultEntity]) -> String {
    if results.is_empty() {
        return "🏆 Leaderboard\n\nNo results yet.".to_string();
    }

    let mut text = format!("🏆 Leaderboard - Top {}\n\n", results.len());
    for (rank, result) in results.iter().enumerate() {
        let _ = writeln!(
            text,
            "{}. user {} - {}/{}",
            rank + 1,
            result.user_id,
            result.correct,
            result.total
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(aborted: bool) -> SessionReport {
        SessionReport {
            session_id: Uuid::nil(),
            quiz_id: Uuid::nil(),
            quiz_title: "Capitals".into(),
            total: 2,
            correct: 1,
            wrong: 0,
            answered: 1,
            missed: 1,
            elapsed: Duration::from_millis(23_000),
            aborted,
        }
    }

    #[test]
    fn report_text_mentions_every_count() {
        let text = render_report(&report(false));
        assert!(text.contains("Capitals"));
        assert!(text.contains("Correct: 1"));
        assert!(text.contains("Missed: 1"));
        assert!(text.contains("Score: 1/2 in 23.0s"));
        assert!(!text.contains("interrupted"));
        assert!(render_report(&report(true)).contains("interrupted"));
    }

    #[test]
    fn leaderboard_is_numbered() {
        let result = |user_id, correct| ResultEntity {
            id: Uuid::new_v4(),
            quiz_id: Uuid::nil(),
            user_id,
            correct,
            wrong: 0,
            missed: 3 - correct,
            total: 3,
            finished_at: SystemTime::now(),
        };
        let text = render_leaderboard(&[result(7, 3), result(9, 1)]);
        assert!(text.starts_with("🏆 Leaderboard - Top 2"));
        assert!(text.contains("1. user 7 - 3/3\n2. user 9 - 1/3\n"));
        assert!(render_leaderboard(&[]).contains("No results yet"));
    }
}
