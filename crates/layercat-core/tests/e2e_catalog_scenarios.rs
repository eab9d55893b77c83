#![forbid(unsafe_code)]

//! End-to-end scenarios over a parsed catalogue document.

use serde_json::json;

use layercat_core::{
    CatalogDocument, Direction, ExpansionKey, ExpansionState, GroupItem, GroupLifecycle,
    HierarchyError, NavigationState, OrderedLayerStore, PartitionKey, PartitionView,
    RelocationEngine, SubgroupLifecycle,
};

fn catalogue() -> (OrderedLayerStore, serde_json::Map<String, serde_json::Value>) {
    let raw = json!({
        "title": "Regional viewer",
        "interfaceGroups": ["Imagery", "Boundaries"],
        "sources": [
            { "name": "osm", "isBaseLayer": true },
            { "name": "ortho", "layout": { "interfaceGroup": "Imagery" } },
            { "name": "ortho-2020", "layout": { "interfaceGroup": "Imagery", "subinterfaceGroup": "2020" } },
            { "name": "ortho-2021", "layout": { "interfaceGroup": "Imagery", "subinterfaceGroup": "2021" } },
            { "name": "counties", "layout": { "interfaceGroup": "Boundaries", "legend": true } },
            { "name": "loose" }
        ]
    });
    CatalogDocument::from_json_str(&raw.to_string())
        .unwrap()
        .into_store()
}

fn names(store: &OrderedLayerStore) -> Vec<&str> {
    store
        .layers()
        .iter()
        .map(|l| l.field("name").and_then(|v| v.as_str()).unwrap_or("?"))
        .collect()
}

#[test]
fn view_partitions_the_document() {
    let (store, _) = catalogue();
    let view = PartitionView::build(&store);
    assert_eq!(view.base_layers(), [0]);
    assert_eq!(view.ungrouped(), [5]);
    let imagery = view.group("Imagery").unwrap();
    assert_eq!(imagery.members, vec![1, 2, 3]);
    assert_eq!(imagery.direct, vec![1]);
    let items = imagery.items();
    assert!(matches!(items[0], GroupItem::Layer(1)));
    assert!(matches!(items[1], GroupItem::Subgroup(s) if s.name == "2020"));
}

#[test]
fn subgroup_block_moves_down() {
    let (mut store, _) = catalogue();
    RelocationEngine::new(&mut store)
        .move_subgroup("Imagery", "2020", Direction::Down)
        .unwrap();
    assert_eq!(
        names(&store),
        ["osm", "ortho", "ortho-2021", "ortho-2020", "counties", "loose"]
    );
    let view = PartitionView::build(&store);
    assert_eq!(view.subgroup_order("Imagery"), ["2021", "2020"]);
}

#[test]
fn cross_partition_drop_lands_before_target() {
    let (mut store, _) = catalogue();
    RelocationEngine::new(&mut store)
        .move_before(5, &PartitionKey::group("Imagery"), 1)
        .unwrap();
    assert_eq!(
        names(&store),
        ["osm", "loose", "ortho", "ortho-2020", "ortho-2021", "counties"]
    );
    assert_eq!(store.get(1).unwrap().group(), Some("Imagery"));
}

#[test]
fn rename_then_serialize_navigation() {
    let (mut store, _) = catalogue();
    let nav: NavigationState = serde_json::from_value(json!({ "expandedGroups": ["Imagery"] })).unwrap();
    let mut exp = ExpansionState::hydrate(&nav);
    GroupLifecycle::new(&mut store, &mut exp)
        .rename("Imagery", "Satellite")
        .unwrap();
    assert_eq!(
        serde_json::to_value(exp.serialize()).unwrap(),
        json!({ "expandedLayers": [], "expandedGroups": ["Satellite"], "expandedSubGroups": [] })
    );
}

#[test]
fn duplicate_group_leaves_order_unchanged() {
    let (mut store, _) = catalogue();
    let mut exp = ExpansionState::new();
    let mut groups = GroupLifecycle::new(&mut store, &mut exp);
    groups.add("X").unwrap();
    let err = groups.add("X").unwrap_err();
    assert!(matches!(err, HierarchyError::DuplicateName { .. }));
    assert_eq!(store.groups(), ["Imagery", "Boundaries", "X"]);
}

#[test]
fn merge_then_round_trip_document() {
    let (mut store, extra) = catalogue();
    let mut exp = ExpansionState::new();
    exp.set_expanded(&ExpansionKey::subgroup("Imagery", "2021"), true);
    SubgroupLifecycle::new(&mut store, &mut exp)
        .merge("Imagery", "2021", "2020")
        .unwrap();
    assert!(!exp.is_expanded(&ExpansionKey::subgroup("Imagery", "2021")));

    let doc = CatalogDocument::from_store(&store, extra);
    let value: serde_json::Value =
        serde_json::from_str(&doc.to_json_string_pretty().unwrap()).unwrap();
    assert_eq!(value["title"], "Regional viewer");
    assert_eq!(value["sources"][3]["layout"]["subinterfaceGroup"], "2020");
    assert_eq!(value["sources"][4]["layout"]["legend"], true);
}
