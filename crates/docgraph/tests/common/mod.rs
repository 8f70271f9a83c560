//! Shared schema for integration tests: a model of domains and classes.
#![allow(dead_code)]

use std::sync::Arc;

use docgraph::{Graph, NodeId, NumberSpec, TypeRegistry};
use serde_json::Value;

pub fn registry() -> Arc<TypeRegistry> {
    let mut r = TypeRegistry::new();
    r.register("Model", None, Some("Node"), |g, id| {
        g.add_set(id, "domains", "Domain")?;
        g.add_set(id, "classes", "Class")?;
        Ok(())
    })
    .unwrap();
    r.register("Domain", None, Some("Node"), |g, id| {
        g.add_color(id, "color")?;
        g.add_link_set(id, "classes", "../../classes/", Some("Class"))?;
        Ok(())
    })
    .unwrap();
    r.register("Class", None, Some("Node"), |g, id| {
        g.add_link(id, "domain", "", Some("Domain"))?;
        g.add_number(
            id,
            "weight",
            NumberSpec {
                default: Some(1.0),
                min: Some(0.0),
                max: Some(10.0),
            },
        )?;
        g.add_vector(id, "position")?;
        g.add_boolean(id, "abstract", Some(false))?;
        Ok(())
    })
    .unwrap();
    r.register("Interface", Some("iface"), Some("Class"), |g, id| {
        g.add_string(id, "visibility", Some("public"), &["public", "internal"])?;
        Ok(())
    })
    .unwrap();
    r.register("Entry", None, Some("Node"), |g, id| {
        g.add_number(id, "value", NumberSpec::default())?;
        Ok(())
    })
    .unwrap();
    r.register("Alpha", Some("alpha"), Some("Entry"), |g, id| {
        g.add_boolean(id, "strong", Some(false))?;
        Ok(())
    })
    .unwrap();
    r.register("Table", None, Some("Node"), |g, id| {
        g.add_set(id, "entries", "Entry")?;
        Ok(())
    })
    .unwrap();
    Arc::new(r)
}

pub fn model(raw: &Value) -> (Graph, NodeId) {
    let mut g = Graph::new(registry());
    let root = g.construct("Model", "Model", None, Some(raw)).unwrap();
    (g, root)
}

pub fn at(g: &Graph, path: &str) -> NodeId {
    g.find(path).unwrap_or_else(|| panic!("no node at {path}"))
}
