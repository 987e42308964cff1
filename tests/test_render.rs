use std::sync::Arc;

use vein::html::render::as_written;
use vein::html::{Element, Page, Rendering};

fn page(html: &str) -> Page {
    Page::from_html(html, as_written()).unwrap()
}

#[test]
fn test_untouched_page_round_trips() {
    let page = page("<!DOCTYPE html><html><head><title>T</title></head><body><p class=\"x\">a &amp; b</p><br><!--c--></body></html>");

    assert_eq!(
        page.render().finish(),
        "<!DOCTYPE html><html><head><title>T</title></head><body><p class=\"x\">a &amp; b</p><br><!--c--></body></html>"
    );
}

#[test]
fn test_set_text_by_id_escapes() {
    let page = page(r#"<p id="greeting">placeholder</p>"#);
    let node = page.document().tag_by_id("greeting").unwrap();

    let mut render = page.render();
    render.set_text(node, "<b>Tom & Jerry</b>");
    let html = render.finish();

    assert!(html.contains(r#"<p id="greeting">&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;</p>"#));
}

#[test]
fn test_set_text_on_void_element_writes_nothing() {
    let page = page(r#"<input id="field" name="field">"#);
    let node = page.document().tag_by_id("field").unwrap();

    let mut render = page.render();
    render.set_text(node, "lost");
    let html = render.finish();

    assert!(html.contains(r#"<input id="field" name="field">"#));
    assert!(!html.contains("lost"));
    assert!(!html.contains("</input>"));
}

#[test]
fn test_set_attr_replaces_and_appends() {
    let page = page(r#"<input name="email" value="old">"#);
    let node = page.document().tag_by_name("email").unwrap();

    let mut render = page.render();
    render
        .set_attr(node, "value", "a\"b")
        .set_attr(node, "placeholder", "you@example.com");
    let html = render.finish();

    assert!(html.contains(r#"<input name="email" value="a&quot;b" placeholder="you@example.com">"#));
    assert!(!html.contains("</input>"));
}

#[test]
fn test_render_does_not_modify_page() {
    let page = page(r#"<p id="x">original</p>"#);
    let node = page.document().tag_by_id("x").unwrap();

    let mut render = page.render();
    render.set_text(node, "changed");
    assert!(render.finish().contains("changed"));

    assert!(page.render().finish().contains(r#"<p id="x">original</p>"#));
}

#[test]
fn test_script_text_is_not_escaped() {
    let page = page("<script>if (a < b && c) {}</script>");

    assert!(page.render().finish().contains("<script>if (a < b && c) {}</script>"));
}

#[test]
fn test_per_node_callback_beats_default() {
    let page = Page::from_html(
        r#"<p id="a">a</p><p id="b">b</p>"#,
        Arc::new(|el: &Element| {
            let mut r = Rendering::default();
            if el.is("p") {
                r.set_attr("data-default", "1");
            }
            r
        }),
    )
    .unwrap();
    let a = page.document().tag_by_id("a").unwrap();

    let mut render = page.render();
    render.with_callback(
        a,
        Arc::new(|_: &Element| Rendering {
            text: Some("from callback".to_string()),
            ..Rendering::default()
        }),
    );
    let html = render.finish();

    assert!(html.contains(r#"<p id="a">from callback</p>"#));
    assert!(html.contains(r#"<p id="b" data-default="1">b</p>"#));
}

#[test]
fn test_explicit_values_win_over_callback() {
    let page = page(r#"<p id="a">a</p>"#);
    let a = page.document().tag_by_id("a").unwrap();

    let mut render = page.render();
    render
        .with_callback(
            a,
            Arc::new(|_: &Element| Rendering {
                text: Some("callback".to_string()),
                ..Rendering::default()
            }),
        )
        .set_text(a, "explicit");

    assert!(render.finish().contains(r#"<p id="a">explicit</p>"#));
}

#[test]
fn test_template_contents_are_rendered() {
    let page = page(r#"<template id="row"><td>cell</td></template>"#);

    assert!(page.render().finish().contains(r#"<template id="row"><td>cell</td></template>"#));
}
