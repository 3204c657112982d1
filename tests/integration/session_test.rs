//! Chat Turn Integration Tests
//!
//! A `Session` over a real index with scripted model replies: rewrite,
//! dispatch, operation and composition in one turn.

use std::sync::Arc;
use std::time::Duration;

use governor::clock::FakeRelativeClock;
use tempfile::tempdir;
use yoga_gpt::services::knowledge::{IndexBuilder, Retriever};
use yoga_gpt::services::RATE_LIMIT_WARNING;
use yoga_gpt::{AppConfig, Role, Session, TurnOutcome, TurnPhase, YogaStyle};
use yoga_gpt_llm::MessageRole;

use crate::support::{test_config, text, tool, write_corpus, ScriptedLlm, WordHashEmbedder};

async fn session_over_corpus(
    llm: Arc<ScriptedLlm>,
) -> (Session<FakeRelativeClock>, FakeRelativeClock, AppConfig, tempfile::TempDir) {
    let root = tempdir().unwrap();
    let corpus = root.path().join("data");
    let index_dir = root.path().join("index");
    std::fs::create_dir_all(&corpus).unwrap();
    write_corpus(&corpus);
    let config = test_config(&corpus, &index_dir);

    let embedder = Arc::new(WordHashEmbedder::new());
    let index = IndexBuilder::new(&config, embedder.clone())
        .build(&corpus)
        .await
        .unwrap();
    let retriever = Arc::new(Retriever::new(Arc::new(index), embedder));

    let clock = FakeRelativeClock::default();
    let session = Session::with_clock(llm, retriever, &config, clock.clone());
    (session, clock, config, root)
}

#[tokio::test]
async fn test_pose_benefits_turn_end_to_end() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        text("What are the benefits and contraindications of Tree Pose?"),
        tool("get_pose_benefits", r#"{"pose_names": ["tree pose"]}"#, 200, 40),
        text("Description:\n- A standing balance.\n\nBenefits:\n- Better balance"),
    ]));
    let (mut session, _, _, _root) = session_over_corpus(llm.clone()).await;

    let TurnOutcome::Replied(reply) = session.submit("is tree pose good for me?").await else {
        panic!("turn should be accepted");
    };

    assert!(reply.starts_with("### Tree Pose\n\nDescription:\n- A standing balance."));
    assert!(reply.contains("**Sources:**\n"));
    assert!(reply.contains("standing.txt"));
    assert!(reply.contains(
        "[See Tree Pose on Yoga Journal](https://www.yogajournal.com/poses/tree-pose/)"
    ));
    assert!(reply.contains("**Token usage:** 240 tokens (Prompt: 200, Completion: 40)"));
    assert!(reply.ends_with("**Estimated cost:** $0.0084"));
    assert_eq!(session.phase(), TurnPhase::Idle);

    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);
    let (dispatch_messages, system, tools) = &requests[1];
    assert!(system.is_some());
    assert_eq!(tools.len(), 4);
    assert_eq!(
        dispatch_messages[0].content,
        "What are the benefits and contraindications of Tree Pose?"
    );
    let (summary_messages, _, summary_tools) = &requests[2];
    assert!(summary_tools.is_empty());
    assert!(summary_messages[0].content.contains("Tree pose (Vrksasana)"));
}

#[tokio::test]
async fn test_image_request_includes_benefits_and_link() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        text("Show me cobra pose"),
        tool("get_yogajournal_pose_image", r#"{"pose_name": "Cobra"}"#, 10, 10),
        text("Cobra strengthens the spine."),
    ]));
    let (mut session, _, _, _root) = session_over_corpus(llm.clone()).await;

    let TurnOutcome::Replied(reply) = session.submit("picture of cobra").await else {
        panic!("turn should be accepted");
    };
    let body_end = reply.find("[See Cobra on Yoga Journal]").unwrap();
    assert!(reply[..body_end].contains("### Cobra\n\nCobra strengthens the spine."));
    assert_eq!(llm.request_count(), 3);
}

#[tokio::test]
async fn test_sequence_turn_and_follow_up_history() {
    let llm = Arc::new(ScriptedLlm::new(vec![
        text("Create a yin sequence"),
        tool(
            "create_yoga_sequence",
            r#"{"poses": ["downward dog", "child's pose"], "style": "yin"}"#,
            50,
            25,
        ),
        text("Thanks question"),
        text("You're welcome!"),
    ]));
    let (mut session, clock, _, _root) = session_over_corpus(llm.clone()).await;
    session.set_show_images(false);

    let TurnOutcome::Replied(reply) = session.submit("yin sequence please").await else {
        panic!("turn should be accepted");
    };
    assert!(reply.starts_with("### Yin Yoga Sequence"));
    assert!(reply.contains("Downward Dog (180 seconds)"));
    assert!(reply.contains("Child'S Pose (180 seconds)"));
    assert!(reply.contains("**Total duration:** 360 seconds"));
    assert!(!reply.contains("yogajournal.com"));

    clock.advance(Duration::from_secs(10));
    session.submit("thanks").await;

    let requests = llm.requests.lock().unwrap();
    let roles: Vec<MessageRole> = requests[3].0.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
    );
    assert_eq!(session.history().len(), 4);
    assert_eq!(session.history()[3].role, Role::Assistant);
    assert_eq!(session.history()[3].content, "You're welcome!");
}

#[tokio::test]
async fn test_fast_second_turn_is_dropped() {
    let llm = Arc::new(ScriptedLlm::new(vec![text("q"), text("Hello!")]));
    let (mut session, clock, _, _root) = session_over_corpus(llm.clone()).await;
    session.set_style(YogaStyle::Vinyasa);

    assert!(matches!(session.submit("hi").await, TurnOutcome::Replied(_)));
    clock.advance(Duration::from_secs(3));

    match session.submit("hi again").await {
        TurnOutcome::RateLimited { message, retry_in } => {
            assert_eq!(message, RATE_LIMIT_WARNING);
            assert_eq!(retry_in, Duration::from_secs(7));
        }
        other => panic!("expected rate limit, got {:?}", other),
    }
    assert_eq!(session.history().len(), 2);
    assert_eq!(llm.request_count(), 2);
}
