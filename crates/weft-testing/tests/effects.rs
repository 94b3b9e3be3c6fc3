use weft_core::element::{text, Component, Element, Props};
use weft_core::hooks::Dep;
use weft_core::PropValue;
use weft_testing::{CallLog, TestRoot};

fn prop_i64(props: &Props, name: &str) -> i64 {
    match props.get(name) {
        Some(PropValue::Number(n)) => *n as i64,
        _ => 0,
    }
}

#[test]
fn effect_runs_after_mount_and_cleanup_runs_at_unmount() {
    let log = CallLog::new();
    let widget = {
        let log = log.clone();
        Component::new("Widget", move |cx, _| {
            let log = log.clone();
            cx.use_effect(Some(vec![]), move || {
                log.push("create");
                let log = log.clone();
                Some(Box::new(move || log.push("destroy")) as Box<dyn FnOnce()>)
            });
            vec![Element::host("div", Props::new()).into()]
        })
    };

    let harness = TestRoot::new();
    harness
        .render(Element::component(&widget, Props::new()))
        .unwrap();
    assert_eq!(log.entries(), vec!["create"]);

    // Replace the component subtree entirely.
    harness
        .render(Element::host("p", Props::new().child(text("gone"))))
        .unwrap();
    assert_eq!(log.entries(), vec!["create", "destroy"]);
}

#[test]
fn empty_deps_run_once_changed_deps_rerun() {
    let log = CallLog::new();
    let tracker = {
        let log = log.clone();
        Component::new("Tracker", move |cx, props| {
            let n = prop_i64(props, "n");
            let log = log.clone();
            cx.use_effect(Some(vec![Dep::from(n)]), move || {
                log.push(format!("create:{n}"));
                let log = log.clone();
                Some(Box::new(move || log.push(format!("destroy:{n}"))) as Box<dyn FnOnce()>)
            });
            vec![Element::host("div", Props::new()).into()]
        })
    };

    let harness = TestRoot::new();
    let render_n =
        |n: i64| harness.render(Element::component(&tracker, Props::new().attr("n", n)));

    render_n(1).unwrap();
    render_n(1).unwrap();
    assert_eq!(log.entries(), vec!["create:1"]);

    render_n(2).unwrap();
    assert_eq!(log.entries(), vec!["create:1", "destroy:1", "create:2"]);
}

#[test]
fn no_deps_reruns_every_render() {
    let log = CallLog::new();
    let eager = {
        let log = log.clone();
        Component::new("Eager", move |cx, props| {
            let n = prop_i64(props, "n");
            let log = log.clone();
            cx.use_effect(None, move || {
                log.push(format!("run:{n}"));
                None
            });
            vec![Element::host("div", Props::new()).into()]
        })
    };

    let harness = TestRoot::new();
    harness
        .render(Element::component(&eager, Props::new().attr("n", 1)))
        .unwrap();
    harness
        .render(Element::component(&eager, Props::new().attr("n", 1)))
        .unwrap();
    assert_eq!(log.entries(), vec!["run:1", "run:1"]);
}

#[test]
fn no_deps_with_cleanup_pairs_destroy_with_every_rerun() {
    let log = CallLog::new();
    let chatty = {
        let log = log.clone();
        Component::new("Chatty", move |cx, _| {
            let log = log.clone();
            cx.use_effect(None, move || {
                log.push("create");
                let log = log.clone();
                Some(Box::new(move || log.push("destroy")) as Box<dyn FnOnce()>)
            });
            vec![Element::host("div", Props::new()).into()]
        })
    };

    let harness = TestRoot::new();
    harness
        .render(Element::component(&chatty, Props::new()))
        .unwrap();
    // No cleanup exists yet on the very first run.
    assert_eq!(log.entries(), vec!["create"]);

    harness
        .render(Element::component(&chatty, Props::new()))
        .unwrap();
    assert_eq!(log.entries(), vec!["create", "destroy", "create"]);

    harness
        .render(Element::host("p", Props::new().child(text("done"))))
        .unwrap();
    assert_eq!(
        log.entries(),
        vec!["create", "destroy", "create", "destroy"]
    );
}

#[test]
fn passive_destroys_run_before_any_create_across_components() {
    let log = CallLog::new();
    let tracked = |name: &'static str, log: &CallLog| {
        let log = log.clone();
        Component::new(name, move |cx, props| {
            let n = prop_i64(props, "n");
            let log = log.clone();
            cx.use_effect(Some(vec![Dep::from(n)]), move || {
                log.push(format!("create:{name}"));
                let log = log.clone();
                Some(Box::new(move || log.push(format!("destroy:{name}"))) as Box<dyn FnOnce()>)
            });
            vec![Element::host("div", Props::new()).into()]
        })
    };
    let first = tracked("first", &log);
    let second = tracked("second", &log);

    let page = {
        let first = first.clone();
        let second = second.clone();
        Component::new("Page", move |_, props| {
            let n = prop_i64(props, "n");
            vec![
                Element::component(&first, Props::new().attr("n", n)).into(),
                Element::component(&second, Props::new().attr("n", n)).into(),
            ]
        })
    };

    let harness = TestRoot::new();
    harness
        .render(Element::component(&page, Props::new().attr("n", 1)))
        .unwrap();
    log.take();

    harness
        .render(Element::component(&page, Props::new().attr("n", 2)))
        .unwrap();
    assert_eq!(
        log.entries(),
        vec!["destroy:first", "destroy:second", "create:first", "create:second"]
    );
}

#[test]
fn layout_effects_run_before_passive_effects() {
    let log = CallLog::new();
    let ordered = {
        let log = log.clone();
        Component::new("Ordered", move |cx, props| {
            let n = prop_i64(props, "n");
            let passive_log = log.clone();
            cx.use_effect(Some(vec![Dep::from(n)]), move || {
                passive_log.push("passive-create");
                let log = passive_log.clone();
                Some(Box::new(move || log.push("passive-destroy")) as Box<dyn FnOnce()>)
            });
            let layout_log = log.clone();
            cx.use_layout_effect(Some(vec![Dep::from(n)]), move || {
                layout_log.push("layout-create");
                let log = layout_log.clone();
                Some(Box::new(move || log.push("layout-destroy")) as Box<dyn FnOnce()>)
            });
            vec![Element::host("div", Props::new()).into()]
        })
    };

    let harness = TestRoot::new();
    let render_n =
        |n: i64| harness.render(Element::component(&ordered, Props::new().attr("n", n)));

    render_n(1).unwrap();
    assert_eq!(log.take(), vec!["layout-create", "passive-create"]);

    // On update: layout destroys fire in the mutation pass, layout creates
    // in the layout pass, passive pairs last.
    render_n(2).unwrap();
    assert_eq!(
        log.take(),
        vec![
            "layout-destroy",
            "layout-create",
            "passive-destroy",
            "passive-create"
        ]
    );
}

#[test]
fn effect_dispatch_schedules_a_follow_up_pass() {
    let log = CallLog::new();
    let once = {
        let log = log.clone();
        Component::new("Once", move |cx, _| {
            let (value, set_value) = cx.use_state(|| 0);
            log.push(format!("render:{value}"));
            cx.use_effect(Some(vec![]), move || {
                set_value.set(42);
                None
            });
            vec![Element::host("p", Props::new().child(text(value))).into()]
        })
    };

    let harness = TestRoot::new();
    harness
        .render(Element::component(&once, Props::new()))
        .unwrap();
    assert_eq!(log.take(), vec!["render:0", "render:42"]);
    assert_eq!(harness.text_content(), "42");
}
