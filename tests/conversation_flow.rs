mod common;

use common::{drain_notices, Backend, Harness};
use parlor::{
    api::ApiClient,
    bus::Event,
    handle::ConversationId,
    route::Route,
    session::Session,
    views::{conversation, ConversationView, SendOutcome},
};
use url::Url;

fn id(raw: &str) -> ConversationId {
    ConversationId::new(raw).unwrap()
}

fn view(h: &Harness, session: Session, conversation_id: Option<ConversationId>) -> ConversationView {
    ConversationView::new(h.api.clone(), h.bus.clone(), Some(session), conversation_id)
}

#[tokio::test]
async fn recipient_comes_from_identifier_then_from_messages() {
    let h = Harness::new(Backend::with_users(&["alice", "bob"])).await;
    let session = h.log_in_as("alice").await;

    // Nothing stored yet for alice_bob: the load fails, the id decides.
    let mut view = view(&h, session, Some(id("alice_bob")));
    view.mount().await;
    assert!(view.messages().is_empty());
    assert_eq!(view.recipient(), Some("bob"));
    assert!(!view.needs_manual_entry());

    h.backend.add_message("alice_bob", "BOB", "alice", "hey");
    view.load().await;
    assert_eq!(view.messages().len(), 1);
    assert_eq!(view.recipient(), Some("bob"));
}

#[tokio::test]
async fn failed_load_is_non_fatal() {
    let h = Harness::new(Backend::with_users(&["alice", "bob"])).await;
    let session = h.log_in_as("alice").await;
    let mut rx = h.bus.subscribe();

    let mut view = view(&h, session, Some(id("alice_bob")));
    view.mount().await;

    assert_eq!(drain_notices(&mut rx), [conversation::LOAD_FAILED]);
    assert!(view.messages().is_empty());
    assert!(view.render().contains("Conversation alice_bob"));
}

#[tokio::test]
async fn malformed_identifiers_ask_for_manual_entry() {
    let h = Harness::new(Backend::with_users(&["alice"])).await;
    let session = h.log_in_as("alice").await;

    for raw in ["alice", "alice_bob_carol", "_"] {
        let mut view = view(&h, session.clone(), Some(id(raw)));
        view.mount().await;
        assert_eq!(view.recipient(), None, "{raw}");
        assert!(view.needs_manual_entry(), "{raw}");
        assert!(view.render().contains("Recipient: "), "{raw}");
    }
}

#[tokio::test]
async fn blank_recipient_sends_nothing() {
    let h = Harness::new(Backend::with_users(&["alice", "bob"])).await;
    let session = h.log_in_as("alice").await;
    let mut rx = h.bus.subscribe();

    let mut view = view(&h, session, None);
    view.mount().await;
    assert!(view.needs_manual_entry());

    view.set_body("hello?");
    assert_eq!(view.send().await, SendOutcome::MissingRecipient);

    view.set_recipient("   ");
    assert_eq!(view.send().await, SendOutcome::MissingRecipient);

    assert_eq!(h.backend.request_count(), 0);
    assert_eq!(
        drain_notices(&mut rx),
        [conversation::MISSING_RECIPIENT, conversation::MISSING_RECIPIENT]
    );
    assert_eq!(view.draft().body_text, "hello?");
}

#[tokio::test]
async fn successful_send_moves_to_the_conversation_and_loads_it_once() {
    let h = Harness::new(Backend::with_users(&["alice", "bob"])).await;
    let session = h.log_in_as("alice").await;
    let mut rx = h.bus.subscribe();

    let mut view = view(&h, session, None);
    view.mount().await;
    view.set_recipient(" Bob ");
    view.set_body("hello bob");

    assert_eq!(view.send().await, SendOutcome::Sent(id("alice_bob")));
    assert_eq!(view.conversation_id(), Some(&id("alice_bob")));
    assert_eq!(
        h.backend.count("GET /getConversation?conversationId=alice_bob"),
        1
    );
    assert_eq!(h.backend.count("POST /sendMessage"), 1);
    assert_eq!(view.messages().len(), 1);
    assert_eq!(view.messages()[0].message, "hello bob");
    assert!(view.draft().body_text.is_empty());
    assert_eq!(view.recipient(), Some("bob"));

    let mut navigated = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Navigated(route) = event {
            navigated.push(route);
        }
    }
    assert_eq!(navigated, [Route::conversation(id("alice_bob"))]);
}

#[tokio::test]
async fn reply_goes_into_the_existing_conversation() {
    let backend = Backend::with_users(&["alice", "bob"]);
    backend.add_message("alice_bob", "alice", "bob", "ping");
    let h = Harness::new(backend).await;
    let session = h.log_in_as("bob").await;

    let mut view = view(&h, session, Some(id("alice_bob")));
    view.mount().await;
    assert_eq!(view.recipient(), Some("alice"));

    view.set_body("pong");
    assert_eq!(view.send().await, SendOutcome::Sent(id("alice_bob")));
    assert_eq!(view.messages().len(), 2);
    // Mount plus the reload after sending.
    assert_eq!(
        h.backend.count("GET /getConversation?conversationId=alice_bob"),
        2
    );
}

#[tokio::test]
async fn rejected_send_surfaces_backend_message() {
    let h = Harness::new(Backend::with_users(&["alice"])).await;
    let session = h.log_in_as("alice").await;
    let mut rx = h.bus.subscribe();

    let mut view = view(&h, session, None);
    view.set_recipient("ghost");
    view.set_body("anyone?");

    let expected = "User ghost does not exist";
    assert_eq!(view.send().await, SendOutcome::Rejected(expected.into()));
    assert_eq!(drain_notices(&mut rx), [expected]);
    assert_eq!(view.conversation_id(), None);
    assert_eq!(view.draft().body_text, "anyone?");
    assert_eq!(h.backend.count("GET /getConversation"), 0);
}

#[tokio::test]
async fn unreachable_backend_gives_generic_failure() {
    // Grab a free port and close it again.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = Harness::new(Backend::with_users(&[])).await;
    let api = ApiClient::new(Url::parse(&format!("http://{}", addr)).unwrap(), None).unwrap();
    let mut rx = h.bus.subscribe();

    let mut view = ConversationView::new(
        api,
        h.bus.clone(),
        Some(Session::new("alice")),
        Some(id("alice_bob")),
    );
    view.mount().await;
    assert!(view.messages().is_empty());
    assert_eq!(view.recipient(), Some("bob"));

    view.set_body("hi");
    assert_eq!(view.send().await, SendOutcome::Failed);
    assert_eq!(
        drain_notices(&mut rx),
        [conversation::LOAD_FAILED, conversation::SEND_FAILED]
    );
}

#[tokio::test]
async fn loading_twice_gives_the_same_messages() {
    let backend = Backend::with_users(&["alice", "bob"]);
    backend.add_message("alice_bob", "alice", "bob", "one");
    backend.add_message("alice_bob", "bob", "alice", "two");
    let h = Harness::new(backend).await;
    let session = h.log_in_as("alice").await;

    let mut view = view(&h, session, Some(id("alice_bob")));
    view.load().await;
    let first = view.messages().to_vec();
    view.load().await;
    assert_eq!(view.messages(), first.as_slice());
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn reopening_the_same_conversation_does_not_reload() {
    let backend = Backend::with_users(&["alice", "bob", "carol"]);
    backend.add_message("alice_bob", "alice", "bob", "one");
    backend.add_message("carol_alice", "carol", "alice", "yo");
    let h = Harness::new(backend).await;
    let session = h.log_in_as("alice").await;

    let mut view = view(&h, session, Some(id("alice_bob")));
    view.mount().await;
    view.open(id("alice_bob")).await;
    assert_eq!(h.backend.count("GET /getConversation"), 1);

    view.open(id("carol_alice")).await;
    assert_eq!(h.backend.count("GET /getConversation"), 2);
    assert_eq!(view.recipient(), Some("carol"));
    assert_eq!(view.messages()[0].message, "yo");
}

#[tokio::test]
async fn null_message_body_still_loads_the_history() {
    let backend = Backend::with_users(&["alice", "bob"]);
    backend.add_message("alice_bob", "bob", "alice", "first");
    backend.add_raw(
        "alice_bob",
        serde_json::json!({"fromId": "bob", "toId": "alice", "message": null}),
    );
    let h = Harness::new(backend).await;
    let session = h.log_in_as("alice").await;
    let mut rx = h.bus.subscribe();

    let mut view = view(&h, session, Some(id("alice_bob")));
    view.mount().await;

    assert_eq!(view.messages().len(), 2);
    assert!(view.render().contains("  bob: ...\n"));
    assert!(drain_notices(&mut rx).is_empty());
}
