use weft_core::element::{text, Element, Props};
use weft_testing::{CallLog, TestRoot};

fn nested(log: &CallLog, stop_in: Option<&'static str>) -> Element {
    let tag = |log: &CallLog, name: &'static str, capture: bool| {
        let log = log.clone();
        let label = if capture {
            format!("{name}:capture")
        } else {
            format!("{name}:bubble")
        };
        let stops = stop_in.map(|s| s == label.as_str()).unwrap_or(false);
        move |event: &mut weft_core::SyntheticEvent| {
            log.push(label.clone());
            if stops {
                event.stop_propagation();
            }
        }
    };
    Element::host(
        "div",
        Props::new()
            .on_capture("click", tag(log, "outer", true))
            .on("click", tag(log, "outer", false))
            .child(Element::host(
                "button",
                Props::new()
                    .on_capture("click", tag(log, "inner", true))
                    .on("click", tag(log, "inner", false))
                    .child(text("go")),
            )),
    )
}

#[test]
fn capture_descends_then_bubble_ascends() {
    let log = CallLog::new();
    let harness = TestRoot::new();
    harness.render(nested(&log, None)).unwrap();

    let button = harness.find_by_type("button").unwrap();
    harness.dispatch(button, "click").unwrap();

    assert_eq!(
        log.take(),
        vec![
            "outer:capture",
            "inner:capture",
            "inner:bubble",
            "outer:bubble"
        ]
    );
}

#[test]
fn stop_propagation_in_capture_suppresses_everything_after() {
    let log = CallLog::new();
    let harness = TestRoot::new();
    harness.render(nested(&log, Some("outer:capture"))).unwrap();

    let button = harness.find_by_type("button").unwrap();
    harness.dispatch(button, "click").unwrap();

    assert_eq!(log.take(), vec!["outer:capture"]);
}

#[test]
fn stop_propagation_at_target_still_suppresses_ancestor_bubble() {
    let log = CallLog::new();
    let harness = TestRoot::new();
    harness.render(nested(&log, Some("inner:bubble"))).unwrap();

    let button = harness.find_by_type("button").unwrap();
    harness.dispatch(button, "click").unwrap();

    assert_eq!(
        log.take(),
        vec!["outer:capture", "inner:capture", "inner:bubble"]
    );
}

#[test]
fn prevent_default_is_reported_to_the_caller() {
    let harness = TestRoot::new();
    harness
        .render(Element::host(
            "a",
            Props::new()
                .attr("href", "#")
                .on("click", |event| event.prevent_default()),
        ))
        .unwrap();

    let anchor = harness.find_by_type("a").unwrap();
    assert!(harness.dispatch(anchor, "click").unwrap());
    assert!(!harness.dispatch(anchor, "mouseover").unwrap());
}

#[test]
fn events_on_unknown_instances_are_ignored() {
    let harness = TestRoot::new();
    harness
        .render(Element::host("div", Props::new()))
        .unwrap();
    assert!(!harness.dispatch(9999, "click").unwrap());
}

#[test]
fn handlers_see_committed_state_after_re_render() {
    let log = CallLog::new();
    let harness = TestRoot::new();
    let render_label = |label: &'static str| {
        let log = log.clone();
        harness.render(Element::host(
            "button",
            Props::new().on("click", move |_| log.push(label)),
        ))
    };

    render_label("old").unwrap();
    render_label("new").unwrap();

    let button = harness.find_by_type("button").unwrap();
    harness.dispatch(button, "click").unwrap();
    assert_eq!(log.take(), vec!["new"]);
}
