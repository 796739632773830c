use super::*;
use crate::bridge::PageChannel;
use crate::memory_backend::MemoryBackend;
use crate::prompt::FixedLabel;
use parking_lot::Mutex;
use serde_json::json;
use webdsl_config::Config;
use webdsl_dom::{BoundingBox, Dom, ElementLocator, Point, StaticDocument};
use webdsl_protocols::{FailureKind, FetchOptions, PageCall, RelayError};

const PAGE: &str = r#"<html><body>
    <input id="q" name="q">
    <button id="go" class="btn">Go</button>
</body></html>"#;

fn page() -> Arc<Mutex<StaticDocument>> {
    Arc::new(Mutex::new(StaticDocument::parse(PAGE)))
}

#[test]
fn test_builder_methods() {
    let ext = BrowserExtension::new(page(), Arc::new(MemoryBackend::new()))
        .highlight(Duration::from_millis(50))
        .request_timeout(Some(Duration::from_secs(2)))
        .selection_endpoint("/select");

    assert_eq!(ext.highlight, Duration::from_millis(50));
    assert_eq!(ext.request_timeout, Some(Duration::from_secs(2)));
    assert_eq!(ext.selection_endpoint, "/select");
    assert!(ext.prompt_for_label);
}

#[test]
fn test_configure_reads_relay_section() {
    let mut config = Config::default();
    config.relay.highlight_ms = 120;
    config.relay.request_timeout_ms = Some(900);
    config.relay.prompt_for_label = false;

    let ext = BrowserExtension::new(page(), Arc::new(MemoryBackend::new())).configure(&config);
    assert_eq!(ext.highlight, Duration::from_millis(120));
    assert_eq!(ext.request_timeout, Some(Duration::from_millis(900)));
    assert!(!ext.prompt_for_label);
}

#[tokio::test]
async fn test_page_command_round_trip() {
    let doc = page();
    let contexts = BrowserExtension::new(doc.clone(), Arc::new(MemoryBackend::new())).launch();
    let bridge = contexts.page_bridge();

    let value = bridge
        .execute_command("type", vec!["q".to_string(), "rust".to_string()])
        .await
        .unwrap();
    assert_eq!(value, json!("Typed 'rust' into q"));

    let q = ElementLocator::locate(&*doc.lock(), "q").unwrap().element;
    assert_eq!(doc.lock().value(q), Some("rust"));
}

#[tokio::test]
async fn test_page_command_failure_keeps_kind() {
    let contexts = BrowserExtension::new(page(), Arc::new(MemoryBackend::new())).launch();
    let bridge = contexts.page_bridge();

    let err = bridge
        .execute_command("click", vec!["#absent".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RelayError::Rejected {
            kind: FailureKind::LocatorMiss,
            ..
        }
    ));
}

#[tokio::test]
async fn test_fetch_api_reaches_backend() {
    let backend = Arc::new(MemoryBackend::new().with_script("click go"));
    let contexts = BrowserExtension::new(page(), backend).launch();
    let bridge = contexts.page_bridge();

    let value = bridge.fetch_api("/get_script", FetchOptions::get()).await.unwrap();
    assert_eq!(value["script"], "click go");
}

#[tokio::test]
async fn test_two_bridges_get_their_own_replies() {
    let contexts = BrowserExtension::new(page(), Arc::new(MemoryBackend::new())).launch();
    let a = contexts.page_bridge();
    let b = contexts.page_bridge();

    let (ra, rb) = tokio::join!(
        a.execute_command("click", vec!["go".to_string()]),
        b.execute_command("wait", vec!["0".to_string()]),
    );
    assert_eq!(ra.unwrap(), json!("Clicked element: go"));
    assert_eq!(rb.unwrap(), json!("Waited 0 seconds"));
}

#[tokio::test]
async fn test_reset_session_restores_highlight() {
    let doc = page();
    let contexts = BrowserExtension::new(doc.clone(), Arc::new(MemoryBackend::new()))
        .highlight(Duration::from_secs(30))
        .launch();
    let bridge = contexts.page_bridge();
    let go = ElementLocator::locate(&*doc.lock(), "go").unwrap().element;

    bridge.execute_command("click", vec!["go".to_string()]).await.unwrap();
    assert!(doc.lock().outline(go).unwrap().is_some());

    bridge.post(PageCall::ResetSession);
    for _ in 0..100 {
        if doc.lock().outline(go).unwrap().is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(doc.lock().outline(go).unwrap(), None);
}

#[tokio::test]
async fn test_grab_element_from_broker() {
    let doc = page();
    let go = ElementLocator::locate(&*doc.lock(), "go").unwrap().element;
    doc.lock()
        .set_bounds(go, BoundingBox::new(0.0, 0.0, 40.0, 20.0))
        .unwrap();
    let backend = Arc::new(MemoryBackend::new());
    let contexts = BrowserExtension::new(doc, backend.clone())
        .label_prompt(Arc::new(FixedLabel("go button".to_string())))
        .launch();

    contexts.relay().pointer_down(Point::new(10.0, 10.0)).await.unwrap();
    let grabbed = contexts.broker().grab_element().await.unwrap();

    assert_eq!(grabbed.element_name, "go button");
    assert!(grabbed.element_html.starts_with("<button"));
    assert_eq!(backend.selections().len(), 1);
    assert_eq!(backend.selections()[0].element_html, grabbed.element_html);
}

#[tokio::test]
async fn test_broker_execute_command() {
    let contexts = BrowserExtension::new(page(), Arc::new(MemoryBackend::new())).launch();
    let value = contexts
        .broker()
        .execute_command("wait", vec!["0".to_string()])
        .await
        .unwrap();
    assert_eq!(value, json!("Waited 0 seconds"));
}

#[tokio::test]
async fn test_shutdown_closes_channels() {
    let contexts = BrowserExtension::new(page(), Arc::new(MemoryBackend::new())).launch();
    let broker = contexts.broker().clone();
    contexts.shutdown().await;

    let err = broker.fetch_api("/get_script", FetchOptions::get()).await.unwrap_err();
    assert_eq!(err, RelayError::ChannelClosed);
}
