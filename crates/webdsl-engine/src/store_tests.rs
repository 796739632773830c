use super::*;
use crate::testing::FakeChannel;
use webdsl_protocols::error::ScriptError;
use webdsl_protocols::RunState;
use webdsl_relay::MemoryBackend;

fn store(channel: &Arc<FakeChannel>) -> ScriptStore {
    let channel: Arc<dyn PageChannel> = channel.clone();
    ScriptStore::new(channel)
}

#[tokio::test]
async fn test_save_then_load_is_byte_identical() {
    let channel = Arc::new(FakeChannel::default());
    let store = store(&channel);
    let text = "  click #submit\n\n\twait 1  \nASK_USER \"confirm the result\"\n";

    store.save_script(&Script::new(text)).await.unwrap();
    let loaded = store.load_script().await.unwrap();
    assert_eq!(loaded.text(), text);
}

#[tokio::test]
async fn test_clear_script() {
    let channel = Arc::new(FakeChannel::with_backend(
        MemoryBackend::new().with_script("wait 1"),
    ));
    let store = store(&channel);

    store.clear_script().await.unwrap();
    assert!(store.load_script().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_command_catalog() {
    let channel = Arc::new(FakeChannel::default());
    let catalog = store(&channel).command_catalog().await.unwrap();

    assert_eq!(catalog.len(), 7);
    assert_eq!(catalog.get("TYPE_XPATH").unwrap().arity(), 2);
    assert_eq!(catalog.get("ask_user").unwrap().name, "ASK_USER");
}

#[tokio::test]
async fn test_add_command_quotes_args_and_reloads() {
    let channel = Arc::new(FakeChannel::with_backend(
        MemoryBackend::new().with_script("wait 1"),
    ));
    let store = store(&channel);

    let script = store
        .add_command(
            "TYPE_XPATH",
            &["//input[@name=\"q\"]".to_string(), "hello world".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(script.command_count(), 2);
    assert_eq!(
        script.line(1),
        Some(r#"TYPE_XPATH "//input[@name=\"q\"]" "hello world""#)
    );
}

#[tokio::test]
async fn test_add_command_validates_against_catalog() {
    let channel = Arc::new(FakeChannel::default());
    let store = store(&channel);

    let err = store.add_command("FLY", &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::Script(ScriptError::UnknownCommand(_))));

    let err = store
        .add_command("NAVIGATE", &["a".to_string(), "b".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Script(ScriptError::ArityMismatch {
            expected: 1,
            actual: 2,
            ..
        })
    ));
    assert_eq!(channel.backend.script(), "");
}

#[tokio::test]
async fn test_push_and_fetch_status() {
    let channel = Arc::new(FakeChannel::default());
    let store = store(&channel);
    let cursor = ExecutionCursor::at(4, RunState::Running);

    store.push_status(cursor).await.unwrap();
    assert_eq!(store.fetch_status().await.unwrap(), cursor);
}

#[tokio::test]
async fn test_execute_remote_sends_args_verbatim() {
    let channel = Arc::new(FakeChannel::default());
    let store = store(&channel);

    let result = store
        .execute_remote("ASK_USER", "\"Is the total right?\"")
        .await
        .unwrap();
    assert_eq!(result, "\"Is the total right?\"");
    assert_eq!(
        channel.backend.executed(),
        vec![("ASK_USER".to_string(), "\"Is the total right?\"".to_string())]
    );
}

#[tokio::test]
async fn test_backend_failure_is_relay_error() {
    let channel = Arc::new(FakeChannel::default());
    let store = store(&channel);

    let err = store.fetch("/nowhere", FetchOptions::get()).await.unwrap_err();
    assert!(matches!(err, EngineError::Relay(_)));
}
