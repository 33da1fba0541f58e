//! Command layer behavior on top of the controller.

mod common;

use common::app_state;
use medrecap_companion::commands::{
    self, check_answer, finish_quiz, get_stats, next_question, quiz_snapshot, record_mood,
    select_option, select_tile, start_matching, start_quiz, suggested_topics,
};
use pretty_assertions::assert_eq;
use study_core::{QuestionStatus, ViewState};

#[test]
fn test_suggested_topics() {
    assert_eq!(
        suggested_topics(),
        vec![
            "Thoracic Surface Anatomy",
            "Coronary Circulation",
            "Cranial Nerves",
            "Brachial Plexus",
        ]
    );
}

#[tokio::test]
async fn test_select_topic_reports_snapshot() {
    let (state, _) = app_state();
    let snapshot = commands::select_topic("Brachial Plexus".to_string(), &state)
        .await
        .unwrap();
    assert_eq!(snapshot.view, ViewState::Study);
    assert_eq!(
        commands::current_guide(&state).await.unwrap().unwrap().topic,
        "Brachial Plexus"
    );

    let snapshot = commands::go_home(&state).await.unwrap();
    assert_eq!(snapshot.view, ViewState::Home);
}

#[tokio::test]
async fn test_failures_become_command_errors() {
    let (state, generator) = app_state();
    generator.fail_topic("Renal Physiology");

    let err = commands::select_topic("Renal Physiology".to_string(), &state)
        .await
        .unwrap_err();
    assert!(err.message.contains("connection reset"));

    let err = start_quiz(None, &state).await.unwrap_err();
    assert_eq!(err.message, "no study guide loaded");
}

#[tokio::test]
async fn test_unknown_difficulty() {
    let (state, _) = app_state();
    commands::select_topic("Brachial Plexus".to_string(), &state)
        .await
        .unwrap();
    let err = start_quiz(Some("nightmare".to_string()), &state)
        .await
        .unwrap_err();
    assert_eq!(err.message, "unknown difficulty: nightmare");
}

#[tokio::test]
async fn test_rejected_selection_returns_current_view() {
    let (state, _) = app_state();
    commands::select_topic("Brachial Plexus".to_string(), &state)
        .await
        .unwrap();
    start_quiz(Some("hard".to_string()), &state).await.unwrap();

    // out of range option is ignored
    let view = select_option(0, 9, &state).await.unwrap();
    assert_eq!(view.states[0].selected_option, None);

    // checking with nothing selected is ignored
    let view = check_answer(0, &state).await.unwrap();
    assert_eq!(view.states[0].status, QuestionStatus::Unanswered);

    select_option(0, 0, &state).await.unwrap();
    let view = check_answer(0, &state).await.unwrap();
    assert_eq!(view.states[0].status, QuestionStatus::Correct);
    assert_eq!(quiz_snapshot(&state).await.unwrap(), view);
}

#[tokio::test]
async fn test_finish_quiz_updates_stats() {
    let (state, _) = app_state();
    commands::select_topic("Brachial Plexus".to_string(), &state)
        .await
        .unwrap();
    start_quiz(None, &state).await.unwrap();

    for i in 0..5 {
        select_option(i, 0, &state).await.unwrap();
        check_answer(i, &state).await.unwrap();
        next_question(&state).await.unwrap();
    }
    let reward = finish_quiz(&state).await.unwrap();

    assert!(reward.mastered);
    let stats = get_stats(&state).await.unwrap();
    assert_eq!(stats.points, 50);
    assert_eq!(stats.topics_mastered, 1);
    assert_eq!(stats.streak_days, 1);
}

#[tokio::test]
async fn test_tile_commands() {
    let (state, _) = app_state();
    commands::select_topic("Brachial Plexus".to_string(), &state)
        .await
        .unwrap();
    let section = "Conduction System".to_string();
    start_matching(section.clone(), &state).await.unwrap();

    let err = select_tile(section.clone(), "tile-7".to_string(), &state)
        .await
        .unwrap_err();
    assert_eq!(err.message, "invalid tile id: tile-7");

    // unknown pair index is ignored
    let response = select_tile(section.clone(), "term-42".to_string(), &state)
        .await
        .unwrap();
    assert_eq!(response.outcome, None);
    assert_eq!(response.board.selected, None);

    let response = select_tile(section, "def-1".to_string(), &state)
        .await
        .unwrap();
    assert!(response.outcome.is_some());
    assert!(response.board.selected.is_some());
}

#[tokio::test]
async fn test_mood_validation() {
    let (state, _) = app_state();
    assert_eq!(record_mood(3, &state).await.unwrap().mood_score, Some(3));
    assert!(record_mood(0, &state).await.is_err());
}
