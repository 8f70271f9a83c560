//! Kinds every registry starts with.

use std::sync::Arc;

use crate::constants::{kinds, COLOR_CHANNELS, COLOR_TEXT, VECTOR_COMPONENTS};
use crate::error::Result;
use crate::graph::{Graph, NodeId, Payload};
use crate::link::{LinkSetState, LinkState};
use crate::registry::{Builder, TypeRegistry};
use crate::set::SetState;
use crate::value::{NumberSpec, NumberState, Simple, StringState};

fn builder<F>(f: F) -> Option<Builder>
where
    F: Fn(&mut Graph, NodeId) -> Result<()> + Send + Sync + 'static,
{
    Some(Arc::new(f))
}

fn set_payload(graph: &mut Graph, id: NodeId, payload: Payload) -> Result<()> {
    graph.node_mut(id)?.payload = payload;
    Ok(())
}

pub(crate) fn install(registry: &mut TypeRegistry) {
    let tag = |name: &str| name.to_lowercase();

    let node = registry.insert(kinds::NODE, tag(kinds::NODE), None, builder(|_, _| Ok(())));

    registry.insert(
        kinds::NODE_SET,
        tag(kinds::NODE_SET),
        Some(node),
        builder(move |g, id| set_payload(g, id, Payload::Set(SetState::new(node)))),
    );
    registry.insert(
        kinds::NODE_LINK,
        tag(kinds::NODE_LINK),
        Some(node),
        builder(|g, id| set_payload(g, id, Payload::Link(LinkState::default()))),
    );
    registry.insert(
        kinds::NODE_LINK_SET,
        tag(kinds::NODE_LINK_SET),
        Some(node),
        builder(|g, id| set_payload(g, id, Payload::LinkSet(LinkSetState::default()))),
    );

    let simple = registry.insert(kinds::SIMPLE, tag(kinds::SIMPLE), Some(node), None);
    registry.insert(
        kinds::BOOLEAN,
        tag(kinds::BOOLEAN),
        Some(simple),
        builder(|g, id| set_payload(g, id, Payload::Boolean(Simple::default()))),
    );
    registry.insert(
        kinds::NUMBER,
        tag(kinds::NUMBER),
        Some(simple),
        builder(|g, id| set_payload(g, id, Payload::Number(NumberState::default()))),
    );
    registry.insert(
        kinds::STRING,
        tag(kinds::STRING),
        Some(simple),
        builder(|g, id| set_payload(g, id, Payload::String(StringState::default()))),
    );

    let complex = registry.insert(kinds::COMPLEX, tag(kinds::COMPLEX), Some(node), None);
    registry.insert(
        kinds::VECTOR,
        tag(kinds::VECTOR),
        Some(complex),
        builder(|g, id| {
            set_payload(g, id, Payload::Vector)?;
            for component in VECTOR_COMPONENTS {
                g.add_number(
                    id,
                    component,
                    NumberSpec {
                        default: Some(0.0),
                        ..NumberSpec::default()
                    },
                )?;
            }
            Ok(())
        }),
    );
    registry.insert(
        kinds::COLOR,
        tag(kinds::COLOR),
        Some(complex),
        builder(|g, id| {
            set_payload(g, id, Payload::Color)?;
            for channel in COLOR_CHANNELS {
                // Opaque black.
                let default = if channel == "a" { 1.0 } else { 0.0 };
                g.add_number(
                    id,
                    channel,
                    NumberSpec {
                        default: Some(default),
                        min: Some(0.0),
                        max: Some(1.0),
                    },
                )?;
            }
            g.add_string(id, COLOR_TEXT, None, &[])?;
            Ok(())
        }),
    );
}
