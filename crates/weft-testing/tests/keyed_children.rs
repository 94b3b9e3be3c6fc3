use weft_core::element::{text, Element, Props};
use weft_core::host::HostMutation;
use weft_testing::TestRoot;

fn item(key: &str, label: &str) -> Element {
    Element::host("li", Props::new().child(text(label))).keyed(key)
}

fn list(items: &[(&str, &str)]) -> Element {
    let mut props = Props::new();
    for (key, label) in items {
        props = props.child(item(key, label));
    }
    Element::host("ul", props)
}

#[test]
fn removing_a_keyed_child_keeps_sibling_instances() {
    let harness = TestRoot::new();
    harness
        .render(list(&[("a", "one"), ("b", "two"), ("c", "three")]))
        .unwrap();
    let ul = harness.find_by_type("ul").unwrap();
    let before = harness.host().children_of(ul);
    harness.take_mutations();

    harness
        .render(list(&[("a", "one"), ("c", "tres")]))
        .unwrap();

    let after = harness.host().children_of(ul);
    assert_eq!(after, vec![before[0], before[2]]);
    assert_eq!(
        harness.mutations(),
        vec![
            HostMutation::RemoveChild {
                parent: ul,
                child: before[1]
            },
            HostMutation::CommitUpdate { id: before[2] },
        ]
    );
    assert_eq!(harness.text_content(), "onetres");
}

#[test]
fn reorder_moves_only_backward_shifted_items() {
    let harness = TestRoot::new();
    harness
        .render(list(&[("a", "A"), ("b", "B"), ("c", "C")]))
        .unwrap();
    let ul = harness.find_by_type("ul").unwrap();
    let before = harness.host().children_of(ul);
    let (a, b, c) = (before[0], before[1], before[2]);
    harness.take_mutations();

    harness
        .render(list(&[("c", "C"), ("a", "A"), ("b", "B")]))
        .unwrap();

    // The forward-scan heuristic holds c in place and re-appends a and b
    // after it; nothing is created or destroyed.
    assert_eq!(harness.host().children_of(ul), vec![c, a, b]);
    assert_eq!(
        harness.mutations(),
        vec![
            HostMutation::AppendChild { parent: ul, child: a },
            HostMutation::AppendChild { parent: ul, child: b },
        ]
    );
}

#[test]
fn inserting_in_the_middle_anchors_on_the_next_stable_sibling() {
    let harness = TestRoot::new();
    harness.render(list(&[("a", "A"), ("c", "C")])).unwrap();
    let ul = harness.find_by_type("ul").unwrap();
    let before = harness.host().children_of(ul);
    harness.take_mutations();

    harness
        .render(list(&[("a", "A"), ("b", "B"), ("c", "C")]))
        .unwrap();

    let after = harness.host().children_of(ul);
    assert_eq!(after.len(), 3);
    assert_eq!((after[0], after[2]), (before[0], before[1]));
    let inserted = after[1];
    assert!(harness.mutations().contains(&HostMutation::InsertBefore {
        parent: ul,
        child: inserted,
        before: before[1],
    }));
}

#[test]
fn same_key_different_type_recreates_the_node() {
    let harness = TestRoot::new();
    harness
        .render(Element::host(
            "div",
            Props::new().child(Element::host("span", Props::new().child(text("x"))).keyed("k")),
        ))
        .unwrap();
    let span = harness.find_by_type("span").unwrap();
    harness.take_mutations();

    harness
        .render(Element::host(
            "div",
            Props::new().child(Element::host("em", Props::new().child(text("x"))).keyed("k")),
        ))
        .unwrap();

    let div = harness.find_by_type("div").unwrap();
    let em = harness.find_by_type("em").unwrap();
    assert_ne!(em, span);
    let mutations = harness.mutations();
    assert!(mutations.contains(&HostMutation::RemoveChild {
        parent: div,
        child: span
    }));
    assert!(mutations
        .iter()
        .any(|m| matches!(m, HostMutation::CreateInstance { ty, .. } if ty == "em")));
}

#[test]
fn unkeyed_children_match_by_position() {
    let harness = TestRoot::new();
    harness
        .render(Element::host(
            "div",
            Props::new()
                .child(Element::host("span", Props::new().child(text("1"))))
                .child(Element::host("span", Props::new().child(text("2")))),
        ))
        .unwrap();
    let div = harness.find_by_type("div").unwrap();
    let before = harness.host().children_of(div);
    harness.take_mutations();

    harness
        .render(Element::host(
            "div",
            Props::new()
                .child(Element::host("span", Props::new().child(text("uno"))))
                .child(Element::host("span", Props::new().child(text("dos")))),
        ))
        .unwrap();

    assert_eq!(harness.host().children_of(div), before);
    assert_eq!(
        harness.mutations(),
        vec![
            HostMutation::CommitUpdate { id: before[0] },
            HostMutation::CommitUpdate { id: before[1] },
        ]
    );
}

#[test]
fn growing_and_shrinking_unkeyed_lists() {
    let harness = TestRoot::new();
    harness
        .render(list(&[("a", "A")]))
        .unwrap();
    let ul = harness.find_by_type("ul").unwrap();

    harness
        .render(list(&[("a", "A"), ("b", "B"), ("c", "C")]))
        .unwrap();
    assert_eq!(harness.text_content(), "ABC");

    harness.render(list(&[("b", "B")])).unwrap();
    assert_eq!(harness.host().children_of(ul).len(), 1);
    assert_eq!(harness.text_content(), "B");
}
