use tracing::{info, warn};

use crate::{
    dao::models::NewQuizEntity,
    error::ServiceError,
    state::{
        SharedState,
        authoring::{AuthoringInput, AuthoringOutcome, AuthoringPrompt, AuthoringState},
        quiz::{QuizDraft, QuizId, UserId},
    },
};

/// What the chat should tell the author after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthoringReply {
    /// The input does not belong to the conversation; say nothing.
    Ignored,
    Prompt(AuthoringPrompt),
    Saved { quiz_id: QuizId, draft: QuizDraft },
    Cancelled,
}

/// Feed one input into the author's conversation and persist the quiz once finished.
///
/// While the quiz is being written, further inputs other than `Cancel` are ignored. When
/// the store refuses the quiz the conversation is reopened so finishing can be retried.
pub async fn handle_input(
    state: &SharedState,
    user_id: UserId,
    input: AuthoringInput,
) -> Result<AuthoringReply, ServiceError> {
    let outcome = {
        let mut conversation = if input == AuthoringInput::Begin {
            state
                .authoring()
                .entry(user_id)
                .or_insert_with(|| AuthoringState::new(user_id))
        } else {
            match state.authoring().get_mut(&user_id) {
                Some(conversation) => conversation,
                None => return Ok(AuthoringReply::Ignored),
            }
        };
        conversation.apply(input)?
    };

    match outcome {
        AuthoringOutcome::Ignored => Ok(AuthoringReply::Ignored),
        AuthoringOutcome::Advanced(prompt) => Ok(AuthoringReply::Prompt(prompt)),
        AuthoringOutcome::Cancelled => {
            state.authoring().remove(&user_id);
            info!(user_id, "quiz authoring cancelled");
            Ok(AuthoringReply::Cancelled)
        }
        AuthoringOutcome::ReadyToSave(draft) => save(state, user_id, draft).await,
    }
}

async fn save(
    state: &SharedState,
    user_id: UserId,
    draft: QuizDraft,
) -> Result<AuthoringReply, ServiceError> {
    let quiz_id = match persist(state, &draft).await {
        Ok(quiz_id) => quiz_id,
        Err(err) => {
            if let Some(mut conversation) = state.authoring().get_mut(&user_id) {
                conversation.abort_save();
            }
            warn!(user_id, error = %err, "failed to save quiz; authoring state kept");
            return Err(err);
        }
    };

    if let Some(mut conversation) = state.authoring().get_mut(&user_id) {
        conversation.commit_saved();
    }
    state
        .authoring()
        .remove_if(&user_id, |_, conversation| !conversation.is_active());

    info!(
        user_id,
        %quiz_id,
        questions = draft.questions.len(),
        "quiz saved"
    );
    Ok(AuthoringReply::Saved { quiz_id, draft })
}

async fn persist(state: &SharedState, draft: &QuizDraft) -> Result<QuizId, ServiceError> {
    let store = state.require_quiz_store().await?;
    Ok(store.create_quiz(NewQuizEntity::from(draft.clone())).await?)
}
