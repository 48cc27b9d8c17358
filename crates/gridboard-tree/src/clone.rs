//! Deep copy with identifier remap
//!
//! Duplicating a component copies its render tree and metadata under a new
//! identity. The copy must share no mutable state with the source, and every
//! embedded reference to the old identity must be rewritten — a single
//! missed reference would leave the duplicate's controls acting on the
//! original.

use crate::node::{ComponentRef, RenderNode};
use gridboard_core::{ComponentIndex, ComponentMetadata};

/// Clone a render tree, remapping every reference from `old` to `new`
///
/// The result is structurally independent of the source; references to
/// identities other than `old` are preserved untouched.
#[must_use]
pub fn clone_tree(tree: &RenderNode, old: ComponentIndex, new: ComponentIndex) -> RenderNode {
    match tree {
        RenderNode::Leaf(value) => RenderNode::Leaf(value.clone()),
        RenderNode::List(children) => RenderNode::List(
            children.iter().map(|c| clone_tree(c, old, new)).collect(),
        ),
        RenderNode::Map(entries) => RenderNode::Map(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), clone_tree(v, old, new)))
                .collect(),
        ),
        RenderNode::Ref(r) => {
            let target = if r.index() == old { new } else { r.index() };
            RenderNode::Ref(ComponentRef::new(target))
        }
        RenderNode::WithId { id, child } => RenderNode::WithId {
            id: if *id == old { new } else { *id },
            child: Box::new(clone_tree(child, old, new)),
        },
    }
}

/// Clone component metadata under a new identity
///
/// The record is copied, only `index` is overridden; nested render
/// parameters are deep-copied so editing the duplicate's parameters never
/// mutates the original's.
#[must_use]
pub fn clone_metadata(metadata: &ComponentMetadata, new: ComponentIndex) -> ComponentMetadata {
    let mut cloned = metadata.clone();
    cloned.index = new;
    cloned
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::{ComponentType, DataSourceRef, FilterDependency};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn remap_rewrites_every_reference() {
        let old = ComponentIndex::fresh();
        let new = ComponentIndex::fresh();
        let unrelated = ComponentIndex::fresh();

        let tree = RenderNode::map([
            (
                "header".to_string(),
                RenderNode::with_id(old, RenderNode::leaf(json!("title"))),
            ),
            (
                "body".to_string(),
                RenderNode::list(vec![
                    RenderNode::reference(old),
                    RenderNode::reference(unrelated),
                    RenderNode::map([(
                        "nested".to_string(),
                        RenderNode::with_id(unrelated, RenderNode::reference(old)),
                    )]),
                ]),
            ),
        ]);

        let n = tree.reference_count(old);
        let cloned = clone_tree(&tree, old, new);

        assert_eq!(cloned.reference_count(old), 0);
        assert_eq!(cloned.reference_count(new), n);
        assert_eq!(cloned.reference_count(unrelated), tree.reference_count(unrelated));
        // Source tree untouched.
        assert_eq!(tree.reference_count(old), n);
    }

    #[test]
    fn clone_is_structurally_independent() {
        let old = ComponentIndex::fresh();
        let new = ComponentIndex::fresh();
        let tree = RenderNode::list(vec![RenderNode::leaf(json!({"depth": [1, 2, 3]}))]);

        let mut cloned = clone_tree(&tree, old, new);
        if let RenderNode::List(children) = &mut cloned {
            children.push(RenderNode::leaf(json!("extra")));
        }

        // Mutating the clone leaves the source unchanged.
        assert_eq!(tree.size(), 2);
        assert_eq!(cloned.size(), 3);
    }

    #[test]
    fn metadata_clone_overrides_only_index() {
        let old = ComponentIndex::fresh();
        let new = ComponentIndex::fresh();
        let metadata = ComponentMetadata::new(old, ComponentType::Chart)
            .with_source(DataSourceRef::new("experiments"))
            .with_render_params(json!({"x": "time", "series": {"color": "auto"}}))
            .with_dependency(FilterDependency::on_source(DataSourceRef::new("experiments")));

        let cloned = clone_metadata(&metadata, new);

        assert_eq!(cloned.index, new);
        assert_eq!(cloned.component_type, metadata.component_type);
        assert_eq!(cloned.data_source_ref, metadata.data_source_ref);
        assert_eq!(cloned.render_params, metadata.render_params);
        assert_eq!(cloned.filter_dependencies, metadata.filter_dependencies);
    }

    #[test]
    fn metadata_params_are_deep_copied() {
        let old = ComponentIndex::fresh();
        let metadata = ComponentMetadata::new(old, ComponentType::Card)
            .with_render_params(json!({"label": "count"}));

        let mut cloned = clone_metadata(&metadata, ComponentIndex::fresh());
        cloned.render_params["label"] = json!("sum");

        assert_eq!(metadata.render_params["label"], json!("count"));
    }

    fn arb_tree(old: ComponentIndex, unrelated: ComponentIndex) -> impl Strategy<Value = RenderNode> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(|n| RenderNode::leaf(json!(n))),
            "[a-z]{0,8}".prop_map(|s| RenderNode::leaf(json!(s))),
            Just(RenderNode::reference(old)),
            Just(RenderNode::reference(unrelated)),
        ];
        leaf.prop_recursive(4, 48, 4, move |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(RenderNode::list),
                proptest::collection::vec(("[a-z]{1,6}", inner.clone()), 0..4)
                    .prop_map(RenderNode::map),
                (any::<bool>(), inner).prop_map(move |(use_old, child)| {
                    RenderNode::with_id(if use_old { old } else { unrelated }, child)
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn clone_roundtrip_moves_all_references(
            tree in arb_tree(
                ComponentIndex(uuid::Uuid::from_u128(0x11)),
                ComponentIndex(uuid::Uuid::from_u128(0x22)),
            )
        ) {
            let old = ComponentIndex(uuid::Uuid::from_u128(0x11));
            let unrelated = ComponentIndex(uuid::Uuid::from_u128(0x22));
            let new = ComponentIndex(uuid::Uuid::from_u128(0x33));

            let n = tree.reference_count(old);
            let u = tree.reference_count(unrelated);
            let cloned = clone_tree(&tree, old, new);

            prop_assert_eq!(cloned.reference_count(old), 0);
            prop_assert_eq!(cloned.reference_count(new), n);
            prop_assert_eq!(cloned.reference_count(unrelated), u);
        }
    }
}
