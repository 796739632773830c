use super::*;

const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <form id="login">
      <input id="email" name="email" class="field wide" value="old@example.com">
      <input name="password" type="password" class="field">
      <button id="submit" class="btn primary">Sign in</button>
    </form>
    <div class="footer"><a href="/help">Help</a></div>
  </body>
</html>"#;

fn doc() -> StaticDocument {
    StaticDocument::parse(PAGE)
}

#[test]
fn test_parse_collects_elements_in_order() {
    let doc = doc();
    let html = doc.element_by_tag("html").unwrap();
    assert_eq!(html.raw(), 0);
    assert!(doc.element_count() >= 8);
}

#[test]
fn test_lookup_by_id_and_name() {
    let doc = doc();
    let by_id = doc.element_by_id("email").unwrap();
    let by_name = doc.element_by_name("email").unwrap();
    assert_eq!(by_id, by_name);
    assert_eq!(doc.tag_name(by_id), Some("input"));
    assert!(doc.element_by_id("missing").is_none());
}

#[test]
fn test_lookup_by_class_requires_all_classes() {
    let doc = doc();
    let field = doc.element_by_class("field").unwrap();
    assert_eq!(Some(field), doc.element_by_id("email"));

    let primary = doc.element_by_class("primary btn").unwrap();
    assert_eq!(Some(primary), doc.element_by_id("submit"));

    assert!(doc.element_by_class("field primary").is_none());
    assert!(doc.element_by_class("   ").is_none());
}

#[test]
fn test_lookup_by_tag_ignores_case() {
    let doc = doc();
    assert_eq!(doc.element_by_tag("BUTTON"), doc.element_by_id("submit"));
    assert_eq!(doc.element_by_tag("*"), doc.element_by_tag("html"));
}

#[test]
fn test_query_selector_matches_tree_order() {
    let doc = doc();
    let found = doc.query_selector("form > input[type=password]").unwrap().unwrap();
    assert_eq!(Some(found), doc.element_by_name("password"));

    let link = doc.query_selector(".footer a").unwrap().unwrap();
    assert_eq!(doc.tag_name(link), Some("a"));

    assert_eq!(doc.query_selector("#nothing").unwrap(), None);
}

#[test]
fn test_query_selector_invalid() {
    let err = doc().query_selector("[[[").unwrap_err();
    assert!(matches!(err, DomError::InvalidSelector(_)));
}

#[test]
fn test_set_value_on_input() {
    let mut doc = doc();
    let email = doc.element_by_id("email").unwrap();
    assert_eq!(doc.value(email), Some("old@example.com"));

    doc.set_value(email, "new@example.com").unwrap();
    assert_eq!(doc.value(email), Some("new@example.com"));
}

#[test]
fn test_set_value_on_button_is_unsupported() {
    let mut doc = doc();
    let button = doc.element_by_id("submit").unwrap();
    let err = doc.set_value(button, "x").unwrap_err();
    assert!(matches!(err, DomError::Unsupported { .. }));
}

#[test]
fn test_click_counts() {
    let mut doc = doc();
    let button = doc.element_by_id("submit").unwrap();
    doc.click(button).unwrap();
    doc.click(button).unwrap();
    assert_eq!(doc.click_count(button), 2);
}

#[test]
fn test_outline_round_trip() {
    let mut doc = doc();
    let button = doc.element_by_id("submit").unwrap();
    assert_eq!(doc.outline(button).unwrap(), None);

    doc.set_outline(button, Some("2px solid red".to_string())).unwrap();
    assert_eq!(doc.outline(button).unwrap().as_deref(), Some("2px solid red"));

    doc.set_outline(button, None).unwrap();
    assert_eq!(doc.outline(button).unwrap(), None);
}

#[test]
fn test_outer_html() {
    let doc = doc();
    let button = doc.element_by_id("submit").unwrap();
    let html = doc.outer_html(button).unwrap();
    assert!(html.starts_with("<button"));
    assert!(html.contains("Sign in"));
}

#[test]
fn test_element_at_prefers_innermost() {
    let mut doc = doc();
    let form = doc.element_by_id("login").unwrap();
    let button = doc.element_by_id("submit").unwrap();
    doc.set_bounds(form, BoundingBox::new(0.0, 0.0, 400.0, 300.0)).unwrap();
    doc.set_bounds(button, BoundingBox::new(10.0, 200.0, 80.0, 30.0)).unwrap();

    assert_eq!(doc.element_at(Point::new(20.0, 210.0)), Some(button));
    assert_eq!(doc.element_at(Point::new(300.0, 10.0)), Some(form));
    assert_eq!(doc.element_at(Point::new(900.0, 900.0)), None);
}

#[test]
fn test_stale_handle() {
    let mut doc = doc();
    let bogus = ElementHandle::new(10_000);
    assert_eq!(doc.click(bogus).unwrap_err(), DomError::StaleHandle(10_000));
    assert!(doc.outer_html(bogus).is_err());
}

#[test]
fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.html");
    std::fs::write(&path, PAGE).unwrap();

    let doc = StaticDocument::from_file(&path).unwrap();
    assert!(doc.element_by_id("submit").is_some());

    let missing = StaticDocument::from_file(&dir.path().join("nope.html"));
    assert!(matches!(missing, Err(DomError::Load(_))));
}
