use super::*;
use serde_json::json;
use webdsl_protocols::{FailureKind, ReplyContent};

/// Reads the next page call off the bus.
async fn next_call(rx: &mut broadcast::Receiver<WindowMessage>) -> PageEnvelope {
    loop {
        if let WindowMessage::FromPage(envelope) = rx.recv().await.unwrap() {
            return envelope;
        }
    }
}

fn reply(envelope: &PageEnvelope, content: ReplyContent) -> WindowMessage {
    WindowMessage::FromExtension(ExtensionEnvelope {
        request_id: envelope.request_id,
        origin: envelope.origin.clone(),
        content,
    })
}

#[tokio::test]
async fn test_call_resolves_with_data() {
    let bus = WindowBus::new();
    let mut relay = bus.subscribe();
    let bridge = PageBridge::connect(bus.clone());

    let responder = tokio::spawn(async move {
        let envelope = next_call(&mut relay).await;
        assert!(matches!(envelope.call, PageCall::ExecuteCommand { .. }));
        bus.post(reply(&envelope, ReplyContent::ok(json!("Clicked element"))));
    });

    let value = bridge
        .execute_command("click", vec!["#submit".to_string()])
        .await
        .unwrap();
    assert_eq!(value, json!("Clicked element"));
    assert_eq!(bridge.pending_count(), 0);
    responder.await.unwrap();
}

#[tokio::test]
async fn test_call_rejects_with_kind() {
    let bus = WindowBus::new();
    let mut relay = bus.subscribe();
    let bridge = PageBridge::connect(bus.clone());

    tokio::spawn(async move {
        let envelope = next_call(&mut relay).await;
        bus.post(reply(
            &envelope,
            ReplyContent::failed(FailureKind::LocatorMiss, "Element not found"),
        ));
    });

    let err = bridge
        .execute_command("click", vec!["#nope".to_string()])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RelayError::Rejected {
            kind: FailureKind::LocatorMiss,
            message: "Element not found".to_string(),
        }
    );
}

#[tokio::test]
async fn test_overlapping_calls_correlate_by_id() {
    let bus = WindowBus::new();
    let mut relay = bus.subscribe();
    let bridge = Arc::new(PageBridge::connect(bus.clone()));

    tokio::spawn(async move {
        let first = next_call(&mut relay).await;
        let second = next_call(&mut relay).await;
        // Answer in reverse order.
        bus.post(reply(&second, ReplyContent::ok(json!("second"))));
        bus.post(reply(&first, ReplyContent::ok(json!("first"))));
    });

    let a = {
        let bridge = bridge.clone();
        tokio::spawn(async move { bridge.fetch_api("/get_script", FetchOptions::get()).await })
    };
    // Make sure the first call is posted before the second.
    while bridge.pending_count() == 0 {
        tokio::task::yield_now().await;
    }
    let b = bridge.fetch_api("/get_command_structure", FetchOptions::get()).await;

    assert_eq!(b.unwrap(), json!("second"));
    assert_eq!(a.await.unwrap().unwrap(), json!("first"));
}

#[tokio::test]
async fn test_foreign_and_unknown_replies_are_ignored() {
    let bus = WindowBus::new();
    let mut relay = bus.subscribe();
    let bridge = PageBridge::connect(bus.clone());

    tokio::spawn(async move {
        let envelope = next_call(&mut relay).await;
        bus.post(WindowMessage::FromExtension(ExtensionEnvelope {
            request_id: envelope.request_id,
            origin: Origin::named("someone-else"),
            content: ReplyContent::ok(json!("wrong origin")),
        }));
        bus.post(WindowMessage::FromExtension(ExtensionEnvelope {
            request_id: RequestId(9999),
            origin: envelope.origin.clone(),
            content: ReplyContent::ok(json!("wrong id")),
        }));
        bus.post(WindowMessage::InitUi);
        bus.post(reply(&envelope, ReplyContent::ok(json!("right"))));
    });

    let value = bridge.fetch_api("/get_script", FetchOptions::get()).await.unwrap();
    assert_eq!(value, json!("right"));
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_call_stays_pending_without_timeout() {
    let bus = WindowBus::new();
    let bridge = PageBridge::connect(bus);

    let mut call = Box::pin(bridge.fetch_api("/get_script", FetchOptions::get()));
    let outcome = tokio::time::timeout(Duration::from_secs(3600), &mut call).await;
    assert!(outcome.is_err());
    assert_eq!(bridge.pending_count(), 1);

    drop(call);
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn test_timeout_error_saturates_milliseconds() {
    let err = timed_out(RequestId(9), Duration::MAX);
    assert!(matches!(
        err,
        RelayError::Timeout {
            request_id: 9,
            after_ms: u64::MAX
        }
    ));
    let err = timed_out(RequestId(1), Duration::from_millis(1500));
    assert!(matches!(err, RelayError::Timeout { after_ms: 1500, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_optional_timeout() {
    let bus = WindowBus::new();
    let bridge = PageBridge::connect(bus).with_timeout(Some(Duration::from_millis(250)));

    let err = bridge
        .fetch_api("/get_script", FetchOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Timeout { after_ms: 250, .. }));
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn test_post_does_not_wait() {
    let bus = WindowBus::new();
    let mut relay = bus.subscribe();
    let bridge = PageBridge::connect(bus.clone());

    bridge.post(PageCall::ResetSession);
    let envelope = next_call(&mut relay).await;
    assert_eq!(envelope.call, PageCall::ResetSession);
    assert_eq!(envelope.origin, *bridge.origin());
    assert_eq!(bridge.pending_count(), 0);
}
