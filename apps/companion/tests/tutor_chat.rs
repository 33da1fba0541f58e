//! Tutor chat through the command layer.

mod common;

use common::app_state;
use medrecap_companion::chat::CHAT_APOLOGY;
use medrecap_companion::commands::{chat_transcript, select_topic, send_chat_message};
use medrecap_companion::generation::{ChatChunk, ChatRole, Citation};
use pretty_assertions::assert_eq;

fn chunk(text: &str, uris: &[&str]) -> ChatChunk {
    ChatChunk {
        text: text.to_string(),
        citations: uris
            .iter()
            .map(|uri| Citation {
                title: format!("Source {}", uri),
                uri: uri.to_string(),
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_chat_needs_a_topic() {
    let (state, _) = app_state();
    assert!(send_chat_message("hello".to_string(), &state).await.is_err());
}

#[tokio::test]
async fn test_reply_accumulates_and_dedupes_citations() {
    let (state, generator) = app_state();
    select_topic("Cranial Nerves".to_string(), &state).await.unwrap();
    generator.set_chat_reply(vec![
        Ok(chunk("CN VII ", &["https://a.example"])),
        Ok(chunk("exits the stylomastoid ", &["https://b.example", "https://a.example"])),
        Ok(chunk("foramen.", &[])),
    ]);

    let replies = send_chat_message("Where does the facial nerve exit?".to_string(), &state)
        .await
        .unwrap();

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].role, ChatRole::Model);
    assert_eq!(replies[0].text, "CN VII exits the stylomastoid foramen.");
    let uris: Vec<&str> = replies[0].citations.iter().map(|c| c.uri.as_str()).collect();
    assert_eq!(uris, vec!["https://a.example", "https://b.example"]);

    let transcript = chat_transcript(&state).await.unwrap();
    assert_eq!(transcript.len(), 3);
    assert!(transcript[0].text.contains("Cranial Nerves"));
    assert_eq!(transcript[1].role, ChatRole::User);
}

#[tokio::test]
async fn test_stream_error_appends_apology() {
    let (state, generator) = app_state();
    select_topic("Cranial Nerves".to_string(), &state).await.unwrap();
    generator.set_chat_reply(vec![Ok(chunk("Partial", &[])), Err(())]);

    let replies = send_chat_message("Explain Bell's palsy".to_string(), &state)
        .await
        .unwrap();

    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].text, "Partial");
    assert_eq!(replies[1].text, CHAT_APOLOGY);
    assert!(replies[1].is_error);
}

#[tokio::test]
async fn test_history_excludes_greeting_and_errors() {
    let (state, generator) = app_state();
    select_topic("Cranial Nerves".to_string(), &state).await.unwrap();

    generator.set_chat_reply(vec![Err(())]);
    send_chat_message("first".to_string(), &state).await.unwrap();
    generator.set_chat_reply(vec![Ok(chunk("answer", &[]))]);
    send_chat_message("second".to_string(), &state).await.unwrap();

    let histories = generator.chat_histories();
    assert!(histories[0].is_empty());
    let texts: Vec<&str> = histories[1].iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["first"]);
}

#[tokio::test]
async fn test_new_topic_starts_new_conversation() {
    let (state, generator) = app_state();
    select_topic("Cranial Nerves".to_string(), &state).await.unwrap();
    generator.set_chat_reply(vec![Ok(chunk("answer", &[]))]);
    send_chat_message("question".to_string(), &state).await.unwrap();

    select_topic("Brachial Plexus".to_string(), &state).await.unwrap();

    let transcript = chat_transcript(&state).await.unwrap();
    assert_eq!(transcript.len(), 1);
    assert!(transcript[0].text.contains("Brachial Plexus"));
}

#[tokio::test]
async fn test_blank_message_is_ignored() {
    let (state, generator) = app_state();
    select_topic("Cranial Nerves".to_string(), &state).await.unwrap();

    assert!(send_chat_message("   ".to_string(), &state).await.unwrap().is_empty());
    assert!(generator.chat_histories().is_empty());
}
