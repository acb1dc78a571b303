mod common;

use std::time::Duration;

use common::{Harness, Sent, capitals};
use quiz_bot_back::{
    dto::chat::{CallbackAction, Keyboard},
    error::ServiceError,
    services::chat_service,
    state::{authoring::AuthoringStep, shuffle::ShuffleMode, state_machine::PlayPhase},
};

const USER: i64 = 3;
const CHAT: i64 = 30;

async fn say(harness: &mut Harness, text: &str) -> Vec<Sent> {
    assert!(
        chat_service::handle_message(&harness.state, CHAT, USER, text)
            .await
            .unwrap(),
        "`{text}` was not handled"
    );
    harness.drain()
}

async fn press(harness: &mut Harness, action: CallbackAction) -> Vec<Sent> {
    let handled = chat_service::handle_callback(&harness.state, CHAT, USER, &action.to_string())
        .await
        .unwrap();
    assert!(handled, "`{action}` was not handled");
    harness.drain()
}

fn last_text(sent: &[Sent]) -> &str {
    match sent.last() {
        Some(Sent::Text { text, .. } | Sent::Prompt { text, .. }) => text.as_str(),
        other => panic!("expected a message, got {other:?}"),
    }
}

fn last_keyboard(sent: &[Sent]) -> &Keyboard {
    match sent.last() {
        Some(Sent::Prompt { keyboard, .. }) => keyboard,
        other => panic!("expected a prompt, got {other:?}"),
    }
}

#[tokio::test]
async fn authoring_conversation_saves_the_quiz() {
    let mut harness = Harness::new().await;

    let sent = say(&mut harness, "/start").await;
    let buttons: Vec<_> = last_keyboard(&sent).buttons().map(|b| b.data.clone()).collect();
    assert_eq!(buttons, ["create_quiz", "view_quizzes"]);

    let sent = press(&mut harness, CallbackAction::CreateQuiz).await;
    assert_eq!(last_text(&sent), "Send the title of your quiz.");
    say(&mut harness, "Capitals").await;
    let sent = say(&mut harness, "/skip").await;
    assert_eq!(last_text(&sent), "Send the first question.");
    say(&mut harness, "Capital of France?").await;
    let sent = say(&mut harness, "Paris").await;
    assert_eq!(last_text(&sent), "Send option 2:");
    let sent = say(&mut harness, "Lyon").await;
    assert_eq!(last_keyboard(&sent).buttons().count(), 2);

    let sent = press(&mut harness, CallbackAction::DoneOptions).await;
    let labels: Vec<_> = last_keyboard(&sent).buttons().map(|b| b.label.clone()).collect();
    assert_eq!(labels, ["Paris", "Lyon"]);

    let sent = press(&mut harness, CallbackAction::Correct(0)).await;
    let preview = sent.iter().find_map(|item| match item {
        Sent::Question { token, question, .. } => Some((token.clone(), question.clone())),
        _ => None,
    });
    let (preview_token, preview) = preview.expect("question preview sent");
    assert_eq!(preview.open_period_secs, None);
    assert!(!harness.state.registry().contains(&preview_token));

    let sent = press(&mut harness, CallbackAction::FinishQuiz).await;
    assert!(last_text(&sent).contains("\"Capitals\" saved with 1 question(s)"));

    let quizzes = harness.store.quizzes();
    assert_eq!(quizzes.len(), 1);
    let saved = &quizzes[0];
    assert_eq!((saved.owner_id, saved.title.as_str()), (USER, "Capitals"));
    assert_eq!(saved.description, "");
    assert_eq!(saved.questions.len(), 1);
    assert_eq!(saved.questions[0].options, ["Paris", "Lyon"]);
    assert_eq!(saved.questions[0].correct_index, 0);
    assert!(harness.state.authoring().get(&USER).is_none());

    let play = CallbackAction::Play(saved.id).to_string();
    assert_eq!(last_keyboard(&sent).buttons().next().map(|b| b.data.as_str()), Some(play.as_str()));
}

#[tokio::test]
async fn failed_save_keeps_the_conversation() {
    let mut harness = Harness::new().await;
    press(&mut harness, CallbackAction::CreateQuiz).await;
    for text in ["Capitals", "/skip", "Capital of France?", "Paris", "Lyon"] {
        say(&mut harness, text).await;
    }
    press(&mut harness, CallbackAction::DoneOptions).await;
    press(&mut harness, CallbackAction::Correct(0)).await;

    harness.store.set_offline(true);
    let err = chat_service::handle_callback(
        &harness.state,
        CHAT,
        USER,
        &CallbackAction::FinishQuiz.to_string(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
    assert!(last_text(&harness.drain()).contains("Storage is unavailable"));
    assert_eq!(
        harness.state.authoring().get(&USER).map(|entry| entry.step()),
        Some(AuthoringStep::AwaitingMoreQuestionsOrFinish)
    );

    harness.store.set_offline(false);
    press(&mut harness, CallbackAction::FinishQuiz).await;
    assert_eq!(harness.store.quizzes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn finishing_twice_while_saving_stores_one_quiz() {
    let mut harness = Harness::with_slow_saves(Duration::from_millis(50)).await;
    press(&mut harness, CallbackAction::CreateQuiz).await;
    for text in ["Capitals", "/skip", "Capital of France?", "Paris", "Lyon"] {
        say(&mut harness, text).await;
    }
    press(&mut harness, CallbackAction::DoneOptions).await;
    press(&mut harness, CallbackAction::Correct(0)).await;

    let finish = CallbackAction::FinishQuiz.to_string();
    let (first, second) = tokio::join!(
        chat_service::handle_callback(&harness.state, CHAT, USER, &finish),
        chat_service::handle_callback(&harness.state, CHAT, USER, &finish),
    );
    assert!(first.unwrap());
    assert!(!second.unwrap());

    assert_eq!(harness.store.quizzes().len(), 1);
    assert!(harness.state.authoring().get(&USER).is_none());
    let saved: Vec<_> = harness
        .drain()
        .into_iter()
        .filter(|item| matches!(item, Sent::Prompt { text, .. } if text.contains("saved with")))
        .collect();
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn invalid_input_is_reported_and_can_be_retried() {
    let mut harness = Harness::new().await;
    press(&mut harness, CallbackAction::CreateQuiz).await;

    let long_title = "x".repeat(201);
    let err = chat_service::handle_message(&harness.state, CHAT, USER, &long_title)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Authoring(_)));
    assert!(last_text(&harness.drain()).contains("Please try again"));

    let sent = say(&mut harness, "Capitals").await;
    assert_eq!(last_text(&sent), "Send the description of your quiz or type /skip.");
}

#[tokio::test]
async fn unrelated_updates_are_not_handled() {
    let harness = Harness::new().await;
    for text in ["hello", "/skip", "/cancel", "/unknown"] {
        assert!(
            !chat_service::handle_message(&harness.state, CHAT, USER, text)
                .await
                .unwrap()
        );
    }
    let err = chat_service::handle_callback(&harness.state, CHAT, USER, "dance")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test(start_paused = true)]
async fn play_buttons_walk_through_shuffle_and_timer() {
    let mut harness = Harness::new().await;
    let quiz = capitals(USER);
    let quiz_id = quiz.id;
    harness.store.insert_quiz(quiz);

    let sent = press(&mut harness, CallbackAction::ViewQuizzes).await;
    assert_eq!(last_keyboard(&sent).buttons().count(), 1);

    let sent = press(&mut harness, CallbackAction::Play(quiz_id)).await;
    assert_eq!(last_keyboard(&sent).buttons().count(), ShuffleMode::ALL.len());

    let sent = press(&mut harness, CallbackAction::Shuffle(quiz_id, ShuffleMode::All)).await;
    let timers: Vec<_> = last_keyboard(&sent).buttons().map(|b| b.data.clone()).collect();
    assert_eq!(timers, ["timer:10", "timer:15", "timer:30"]);
    assert_eq!(
        quiz_bot_back::services::play_service::session_phase(&harness.state, USER),
        Some(PlayPhase::ShuffleSelected)
    );

    press(&mut harness, CallbackAction::Timer(15)).await;
    assert_eq!(
        quiz_bot_back::services::play_service::session_phase(&harness.state, USER),
        Some(PlayPhase::Running)
    );

    let report = harness.next_report().await;
    assert_eq!(report.missed, 2);
}
