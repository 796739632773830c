use super::*;
use crate::prompt::{CancelPrompt, FixedLabel};
use webdsl_dom::{BoundingBox, StaticDocument};

const PAGE: &str = r#"<html><body>
    <form>
      <input id="email" name="email" class="field">
      <button id="submit" class="btn primary">Send</button>
    </form>
    <div class="notice">Saved</div>
</body></html>"#;

fn setup() -> (Arc<Mutex<StaticDocument>>, CommandDispatcher) {
    let doc = Arc::new(Mutex::new(StaticDocument::parse(PAGE)));
    let dom: SharedDom = doc.clone();
    let dispatcher = CommandDispatcher::new(dom, Duration::from_millis(500));
    (doc, dispatcher)
}

fn handle(doc: &Arc<Mutex<StaticDocument>>, selector: &str) -> ElementHandle {
    ElementLocator::locate(&*doc.lock(), selector).unwrap().element
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Default)]
struct RecordingReporter {
    reports: Mutex<Vec<GrabbedElement>>,
}

#[async_trait]
impl SelectionReporter for RecordingReporter {
    async fn report(&self, grabbed: &GrabbedElement) -> Result<(), RelayError> {
        self.reports.lock().push(grabbed.clone());
        Ok(())
    }
}

struct FailingReporter;

#[async_trait]
impl SelectionReporter for FailingReporter {
    async fn report(&self, _grabbed: &GrabbedElement) -> Result<(), RelayError> {
        Err(RelayError::rejected(FailureKind::RelayFailure, "connection refused"))
    }
}

#[test]
fn test_primitive_parse_is_case_insensitive() {
    assert_eq!(Primitive::parse("CLICK"), Some(Primitive::Click));
    assert_eq!(Primitive::parse("grabelement"), Some(Primitive::GrabElement));
    assert_eq!(Primitive::parse("Type"), Some(Primitive::Type));
    assert_eq!(Primitive::parse("NAVIGATE"), None);
    assert!(CommandDispatcher::supports("wait"));
    assert!(!CommandDispatcher::supports("ASK_USER"));
}

#[tokio::test]
async fn test_click_by_id() {
    let (doc, dispatcher) = setup();
    let reply = dispatcher.dispatch("click", &args(&["submit"])).await;
    assert!(reply.success, "{}", reply.message);
    let element = handle(&doc, "submit");
    assert_eq!(doc.lock().click_count(element), 1);
}

#[tokio::test]
async fn test_click_by_class_only() {
    let (doc, dispatcher) = setup();
    let reply = dispatcher.dispatch("click", &args(&["notice"])).await;
    assert!(reply.success);
    let element = handle(&doc, "notice");
    assert_eq!(doc.lock().click_count(element), 1);
}

#[tokio::test]
async fn test_click_by_css_selector() {
    let (doc, dispatcher) = setup();
    let reply = dispatcher.dispatch("click", &args(&["form > button.primary"])).await;
    assert!(reply.success);
    let element = handle(&doc, "submit");
    assert_eq!(doc.lock().click_count(element), 1);
}

#[tokio::test]
async fn test_click_miss_reports_not_found() {
    let (_doc, dispatcher) = setup();
    let reply = dispatcher.dispatch("click", &args(&["#missing"])).await;
    assert!(!reply.success);
    assert_eq!(reply.kind, Some(FailureKind::LocatorMiss));
    assert!(reply.message.contains("not found"));
}

#[tokio::test]
async fn test_click_without_selector() {
    let (_doc, dispatcher) = setup();
    let reply = dispatcher.dispatch("click", &[]).await;
    assert!(!reply.success);
    assert_eq!(reply.kind, Some(FailureKind::DispatchFailure));
}

#[tokio::test]
async fn test_type_joins_remaining_params() {
    let (doc, dispatcher) = setup();
    let reply = dispatcher
        .dispatch("type", &args(&["email", "hello", "world"]))
        .await;
    assert!(reply.success);
    let element = handle(&doc, "email");
    assert_eq!(doc.lock().value(element), Some("hello world"));
}

#[tokio::test]
async fn test_type_miss_and_unsupported() {
    let (_doc, dispatcher) = setup();
    let reply = dispatcher.dispatch("type", &args(&["#nope", "x"])).await;
    assert_eq!(reply.kind, Some(FailureKind::LocatorMiss));

    let reply = dispatcher.dispatch("type", &args(&["notice", "x"])).await;
    assert!(!reply.success);
    assert_eq!(reply.kind, Some(FailureKind::DispatchFailure));
}

#[tokio::test(start_paused = true)]
async fn test_wait_always_succeeds() {
    let (_doc, dispatcher) = setup();
    let started = tokio::time::Instant::now();
    let reply = dispatcher.dispatch("wait", &args(&["2"])).await;
    assert!(reply.success);
    assert!(started.elapsed() >= Duration::from_secs(2));

    assert!(dispatcher.dispatch("wait", &args(&["soon"])).await.success);
    assert!(dispatcher.dispatch("wait", &[]).await.success);
    assert!(dispatcher.dispatch("wait", &args(&["-3"])).await.success);
}

#[tokio::test(start_paused = true)]
async fn test_reset_cuts_wait_short() {
    let (_doc, dispatcher) = setup();
    let dispatcher = Arc::new(dispatcher);
    let waiting = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch("wait", &args(&["60"])).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;
    let started = tokio::time::Instant::now();
    dispatcher.reset_session();
    let reply = waiting.await.unwrap();
    assert!(reply.success);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_wait_beyond_duration_range_saturates() {
    let (_doc, dispatcher) = setup();
    let dispatcher = Arc::new(dispatcher);
    let waiting = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.dispatch("wait", &args(&["1e20"])).await })
    };
    tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
    assert!(!waiting.is_finished());

    dispatcher.reset_session();
    let reply = waiting.await.unwrap();
    assert!(reply.success);
    assert!(reply.message.starts_with("Waited "));
}

#[tokio::test]
async fn test_unknown_command_keeps_running() {
    let (_doc, dispatcher) = setup();
    let reply = dispatcher.dispatch("fly", &args(&["away"])).await;
    assert!(!reply.success);
    assert_eq!(reply.message, "Unknown command: fly");

    assert!(dispatcher.dispatch("click", &args(&["submit"])).await.success);
}

#[tokio::test(start_paused = true)]
async fn test_highlight_is_transient() {
    let (doc, dispatcher) = setup();
    let submit = handle(&doc, "submit");

    dispatcher.dispatch("click", &args(&["submit"])).await;
    assert!(dispatcher.highlighter().is_lit(submit));
    assert!(doc.lock().outline(submit).unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(doc.lock().outline(submit).unwrap(), None);
}

#[tokio::test]
async fn test_reset_restores_highlight_immediately() {
    let (doc, dispatcher) = setup();
    let submit = handle(&doc, "submit");

    dispatcher.dispatch("click", &args(&["submit"])).await;
    dispatcher.reset_session();
    assert_eq!(doc.lock().outline(submit).unwrap(), None);
    assert_eq!(dispatcher.highlighter().lit_count(), 0);
}

#[tokio::test]
async fn test_grab_element_reports_markup_and_label() {
    let (doc, dispatcher) = setup();
    let submit = handle(&doc, "submit");
    doc.lock()
        .set_bounds(submit, BoundingBox::new(10.0, 10.0, 80.0, 20.0))
        .unwrap();
    let reporter = Arc::new(RecordingReporter::default());
    let dispatcher = dispatcher
        .with_prompt(Arc::new(FixedLabel("send button".to_string())))
        .with_reporter(reporter.clone());

    dispatcher.record_pointer(Point::new(20.0, 15.0));
    let reply = dispatcher.dispatch("grabElement", &[]).await;
    assert!(reply.success, "{}", reply.message);

    let reports = reporter.reports.lock();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].element_name, "send button");
    assert!(reports[0].element_html.contains("id=\"submit\""));
}

#[tokio::test]
async fn test_grab_element_failures() {
    let (doc, dispatcher) = setup();
    let dispatcher = dispatcher.with_prompt(Arc::new(CancelPrompt));

    let reply = dispatcher.dispatch("grabElement", &[]).await;
    assert_eq!(reply.kind, Some(FailureKind::DispatchFailure));

    dispatcher.record_pointer(Point::new(500.0, 500.0));
    let reply = dispatcher.dispatch("grabElement", &[]).await;
    assert_eq!(reply.kind, Some(FailureKind::LocatorMiss));

    let submit = handle(&doc, "submit");
    doc.lock()
        .set_bounds(submit, BoundingBox::new(490.0, 490.0, 20.0, 20.0))
        .unwrap();
    let reply = dispatcher.dispatch("grabElement", &[]).await;
    assert_eq!(reply.kind, Some(FailureKind::UserCancelled));
}

#[tokio::test]
async fn test_grab_element_report_failure() {
    let (doc, dispatcher) = setup();
    let submit = handle(&doc, "submit");
    doc.lock()
        .set_bounds(submit, BoundingBox::new(0.0, 0.0, 50.0, 50.0))
        .unwrap();
    let dispatcher = dispatcher.with_reporter(Arc::new(FailingReporter));
    dispatcher.record_pointer(Point::new(5.0, 5.0));

    let err = dispatcher.grab_element().await.unwrap_err();
    assert!(matches!(err, StepError::RelayFailure(_)));
}
