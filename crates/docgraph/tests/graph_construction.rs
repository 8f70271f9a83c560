mod common;

use common::{at, model, registry};
use docgraph::{Graph, GraphError, Shape, StructuralError};
use serde_json::json;

#[test]
fn builders_run_along_the_kind_chain() {
    let (g, _) = model(&json!({"classes": {"Shape": {"type": "iface"}}}));
    let shape = at(&g, "/Model/classes/Shape");
    assert_eq!(g.kind_name(shape).unwrap(), "Interface");
    // Class children first, then what Interface adds.
    let names: Vec<String> = g
        .children(shape)
        .unwrap()
        .into_iter()
        .map(|c| g.node(c).unwrap().name().to_string())
        .collect();
    assert_eq!(names, ["domain", "weight", "position", "abstract", "visibility"]);
}

#[test]
fn shapes_match_declared_children() {
    let (g, _) = model(&json!({"classes": {"Foo": {}}, "domains": {"Bar": {}}}));
    assert_eq!(g.shape(at(&g, "/Model/classes")).unwrap(), Shape::Set);
    assert_eq!(g.shape(at(&g, "/Model/classes/Foo/domain")).unwrap(), Shape::Link);
    assert_eq!(g.shape(at(&g, "/Model/classes/Foo/position")).unwrap(), Shape::Vector);
    assert_eq!(g.shape(at(&g, "/Model/domains/Bar/color")).unwrap(), Shape::Color);
    assert_eq!(g.shape(at(&g, "/Model/domains/Bar/classes")).unwrap(), Shape::LinkSet);
}

#[test]
fn paths_and_ancestors() {
    let (g, root) = model(&json!({"classes": {"Foo": {}}}));
    let weight = at(&g, "/Model/classes/Foo/weight");
    assert_eq!(g.path(weight).unwrap(), "/Model/classes/Foo/weight");
    assert_eq!(g.ancestor_of_kind(weight, "Class"), Some(at(&g, "/Model/classes/Foo")));
    assert_eq!(g.ancestor_of_kind(weight, "Model"), Some(root));
    assert_eq!(g.ancestor_of_kind(weight, "Domain"), None);
}

#[test]
fn duplicate_names_are_rejected() {
    let (mut g, root) = model(&json!({}));
    let err = g.add_node(root, "domains", "Node").unwrap_err();
    assert!(matches!(
        err,
        GraphError::Structural(StructuralError::NameConflict { .. })
    ));
}

#[test]
fn reserved_names_are_rejected() {
    let (mut g, root) = model(&json!({}));
    for name in ["type", "name", "debug", "..", "a/b", ""] {
        assert_eq!(
            g.add_node(root, name, "Node").unwrap_err(),
            GraphError::Structural(StructuralError::InvalidName(name.to_string()))
        );
    }
}

#[test]
fn unknown_kind_is_structural() {
    let mut g = Graph::new(registry());
    assert_eq!(
        g.construct("Nope", "x", None, None).unwrap_err(),
        GraphError::Structural(StructuralError::UnknownKind("Nope".to_string()))
    );
}

#[test]
fn validation_errors_abort_construction() {
    let mut g = Graph::new(registry());
    let err = g
        .construct("Model", "Model", None, Some(&json!({"classes": {"Foo": {"weight": 11}}})))
        .unwrap_err();
    assert!(matches!(err, GraphError::Validation(_)));
    assert!(g.root().is_none());
    assert_eq!(g.len(), 0);
}
