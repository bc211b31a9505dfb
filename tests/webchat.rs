mod common;

use std::time::Duration;

use reqwest::Client;
use tokio::sync::mpsc;

use currex::webchat::{ChatClient, ChatFeed};

fn chat(base_url: &str) -> ChatClient {
    ChatClient::new(Client::new(), base_url)
}

#[actix_web::test]
async fn poll_advances_cursor() {
    let (base_url, _backend) = common::spawn_backend();
    let mut feed = ChatFeed::open(chat(&base_url), None).await.unwrap();
    assert_eq!(feed.session_key(), "chat-1");

    let first = feed.poll().await.unwrap();
    assert_eq!(first.len(), 2);

    let second = feed.poll().await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, "m3");

    assert!(feed.poll().await.unwrap().is_empty());

    let ids: Vec<&str> = feed.messages().iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}

#[actix_web::test]
async fn send_echoes_accepted_message() {
    let (base_url, backend) = common::spawn_backend();
    let mut feed = ChatFeed::open(chat(&base_url), None).await.unwrap();

    assert!(feed.send("  Is the rate still 797?  ").await.unwrap());
    assert!(!feed.send("   ").await.unwrap());

    let sent = backend.chat_sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["text"], "Is the rate still 797?");

    let echoed = feed.messages().last().unwrap();
    assert_eq!(echoed.author, "client");
    assert_eq!(echoed.text, "Is the rate still 797?");
}

#[actix_web::test]
async fn session_falls_back_to_existing_key() {
    let (base_url, _backend) = common::spawn_backend();
    let mut feed = ChatFeed::open(chat(&base_url), Some("no-key")).await.unwrap();

    assert_eq!(feed.session_key(), "no-key");
    assert!(feed.poll().await.unwrap().is_empty());
    assert!(!feed.send("hello").await.unwrap());
    assert!(feed.messages().is_empty());
}

#[actix_web::test]
async fn watch_forwards_new_messages() {
    let (base_url, _backend) = common::spawn_backend();
    let feed = ChatFeed::open(chat(&base_url), None).await.unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    actix_web::rt::spawn(feed.watch(Duration::from_millis(20), tx));

    let mut ids = Vec::new();
    while ids.len() < 3 {
        let message = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        ids.push(message.id);
    }
    assert_eq!(ids, vec!["m1", "m2", "m3"]);
}
