//! Array mutation protocol and deferred rebuilds.

use std::cell::Cell;
use std::rc::Rc;

use inspector_core::{Inspectable, Instance, Value};
use inspector_tree::{
    ContainerKind, DeepCopy, RebuildReason, ReflectCloner, SnapshotLayer, TreeError, TreeObject,
    TreeSettings,
};
use rstest::rstest;

#[derive(Clone, Default, Inspectable)]
struct Waypoint {
    pub x: i32,
    pub label: String,
}

#[derive(Clone, Default, Inspectable)]
struct Route {
    pub numbers: Vec<i32>,
    pub points: Vec<Waypoint>,
    pub weights: Box<[f32]>,
    pub shared: Vec<Instance>,
}

fn route(len: usize) -> Route {
    Route {
        numbers: (0..len as i32).collect(),
        points: vec![
            Waypoint {
                x: 1,
                label: "a".into(),
            },
            Waypoint {
                x: 2,
                label: "b".into(),
            },
        ],
        weights: vec![0.5, 1.5].into_boxed_slice(),
        shared: Vec::new(),
    }
}

fn numbers(tree: &TreeObject) -> Vec<i32> {
    tree.target()
        .with(|r: &Route| r.numbers.clone())
        .unwrap_or_default()
}

fn child_count(tree: &TreeObject, path: &str) -> usize {
    let id = tree.find_property(path).unwrap();
    tree.node(id).unwrap().children().len()
}

#[rstest]
#[case(0)]
#[case(-3)]
fn resize_to_zero_or_negative_empties(#[case] size: isize) {
    let mut tree = TreeObject::new(route(5));
    let id = tree.find_property("numbers").unwrap();
    assert_eq!(child_count(&tree, "numbers"), 5);

    tree.resize(id, size).unwrap();
    tree.process_pending_rebuilds();

    assert_eq!(child_count(&tree, "numbers"), 0);
    assert!(numbers(&tree).is_empty());
}

#[test]
fn resize_to_same_size_is_a_no_op() {
    let mut tree = TreeObject::new(route(5));
    let id = tree.find_property("numbers").unwrap();
    let before = tree.scheduled_rebuilds();
    tree.resize(id, 5).unwrap();
    assert_eq!(tree.scheduled_rebuilds(), before);
    assert!(tree.pending_rebuilds().is_empty());
}

#[test]
fn resize_grows_with_defaults() {
    let mut tree = TreeObject::new(route(2));
    let id = tree.find_property("points").unwrap();
    tree.resize(id, 4).unwrap();
    tree.process_pending_rebuilds();

    assert_eq!(tree.array_size(id).unwrap(), 4);
    let label = tree.find_property("points.Array.data[3].label").unwrap();
    assert_eq!(tree.get_as::<String>(label).unwrap(), "");

    // fresh defaults are distinct instances
    let a = tree.find_property("points.Array.data[2]").unwrap();
    let b = tree.find_property("points.Array.data[3]").unwrap();
    let a = tree.get_value(a).unwrap();
    assert!(!a.same_instance(&tree.get_value(b).unwrap()));
}

#[test]
fn growing_object_list_needs_explicit_instances() {
    let mut value = route(0);
    value.shared.push(Instance::new(Waypoint::default()));
    let mut tree = TreeObject::new(value);
    let id = tree.find_property("shared").unwrap();

    assert_eq!(
        tree.resize(id, 2),
        Err(TreeError::NoDefaultElement("shared".into()))
    );
    assert_eq!(tree.array_size(id).unwrap(), 1);
    assert!(tree.pending_rebuilds().is_empty());

    // shrinking needs no default
    tree.resize(id, 0).unwrap();
    assert_eq!(tree.array_size(id).unwrap(), 0);

    tree.insert(id, 0, Value::Object(Instance::new(Waypoint::default())))
        .unwrap();
    assert_eq!(tree.array_size(id).unwrap(), 1);
}

#[rstest]
#[case(0)]
#[case(2)]
#[case(4)]
fn insert_then_remove_is_neutral(#[case] k: usize) {
    let mut tree = TreeObject::new(route(4));
    let id = tree.find_property("numbers").unwrap();
    let original = numbers(&tree);

    tree.insert(id, k, Value::Int(99)).unwrap();
    tree.process_pending_rebuilds();
    let element = tree
        .find_property(&format!("numbers.Array.data[{k}]"))
        .unwrap();
    assert_eq!(tree.get_as::<i32>(element).unwrap(), 99);

    tree.remove_at(id, k).unwrap();
    tree.process_pending_rebuilds();
    assert_eq!(numbers(&tree), original);
    assert_eq!(child_count(&tree, "numbers"), 4);
}

#[test]
fn insert_past_end_fails() {
    let mut tree = TreeObject::new(route(2));
    let id = tree.find_property("numbers").unwrap();
    assert_eq!(
        tree.insert(id, 5, Value::Int(1)),
        Err(TreeError::IndexOutOfRange {
            path: "numbers".into(),
            index: 5,
            len: 2,
        })
    );
    assert!(tree.pending_rebuilds().is_empty());
}

#[test]
fn insert_coerces_to_element_type() {
    let mut tree = TreeObject::new(route(1));
    let id = tree.find_property("numbers").unwrap();
    tree.insert(id, 1, Value::Float(2.5)).unwrap();
    assert_eq!(numbers(&tree), vec![0, 2]);
    assert!(matches!(
        tree.insert(id, 0, Value::Str("x".into())),
        Err(TreeError::Coercion(_))
    ));
}

#[test]
fn fixed_array_insert_and_remove() {
    let mut tree = TreeObject::new(route(0));
    let id = tree.find_property("weights").unwrap();
    let handle = tree.node(id).unwrap().array_handle().unwrap().clone();
    assert_eq!(handle.kind(), ContainerKind::Array);
    assert!(!handle.is_list_kind());

    tree.insert(id, 1, Value::Float(9.0)).unwrap();
    tree.remove_last(id).unwrap();
    tree.process_pending_rebuilds();

    let weights = tree.target().with(|r: &Route| r.weights.to_vec()).unwrap();
    assert_eq!(weights, vec![0.5, 9.0]);
    assert_eq!(child_count(&tree, "weights"), 2);
}

#[test]
fn swap_exchanges_elements() {
    let mut tree = TreeObject::new(route(0));
    let id = tree.find_property("points").unwrap();
    tree.swap(id, 0, 1).unwrap();
    tree.process_pending_rebuilds();

    let label = tree.find_property("points.Array.data[0].label").unwrap();
    assert_eq!(tree.get_as::<String>(label).unwrap(), "b");
    assert!(matches!(
        tree.swap(id, 0, 7),
        Err(TreeError::IndexOutOfRange { index: 7, .. })
    ));
}

#[test]
fn set_element_value_through_container_and_element() {
    let mut tree = TreeObject::new(route(3));
    let id = tree.find_property("numbers").unwrap();
    tree.set_element_value(id, 1, Value::Int(-4)).unwrap();
    assert_eq!(numbers(&tree), vec![0, -4, 2]);

    tree.process_pending_rebuilds();
    let element = tree.find_property("numbers.Array.data[2]").unwrap();
    tree.set_value(element, 12i32).unwrap();
    assert_eq!(numbers(&tree), vec![0, -4, 12]);
    assert_eq!(tree.pending_rebuilds()[0].reason, RebuildReason::SetElementValue);
}

#[test]
fn duplicate_element_inserts_deep_copy_after_source() {
    let mut tree = TreeObject::new(route(0));
    let source = tree.find_property("points.Array.data[0]").unwrap();
    tree.duplicate_element(source, &mut ReflectCloner::new())
        .unwrap();
    tree.process_pending_rebuilds();

    let labels = tree
        .target()
        .with(|r: &Route| r.points.iter().map(|p| p.label.clone()).collect::<Vec<_>>())
        .unwrap();
    assert_eq!(labels, vec!["a", "a", "b"]);

    let x = tree.find_property("points.Array.data[1].x").unwrap();
    tree.set_value(x, 50i32).unwrap();
    assert_eq!(tree.target().with(|r: &Route| r.points[0].x), Some(1));
}

#[test]
fn duplicate_shared_object_is_not_aliased() {
    let original = Instance::new(Waypoint {
        x: 3,
        label: "shared".into(),
    });
    let mut value = route(0);
    value.shared.push(original.clone());
    let mut tree = TreeObject::new(value);

    let source = tree.find_property("shared.Array.data[0]").unwrap();
    tree.duplicate_element(source, &mut ReflectCloner::new())
        .unwrap();

    let shared = tree.target().with(|r: &Route| r.shared.clone()).unwrap();
    assert_eq!(shared.len(), 2);
    assert!(shared[0].ptr_eq(&original));
    assert!(!shared[1].ptr_eq(&original));
    assert_eq!(shared[1].with(|w: &Waypoint| w.label.clone()), Some("shared".to_string()));
}

struct Counting {
    copies: usize,
}

impl DeepCopy for Counting {
    fn deep_copy(&mut self, value: &Value) -> Value {
        self.copies += 1;
        value.clone()
    }
}

#[test]
fn duplicate_uses_given_copier() {
    let mut tree = TreeObject::new(route(2));
    let source = tree.find_property("numbers.Array.data[1]").unwrap();
    let mut copier = Counting { copies: 0 };
    tree.duplicate_element(source, &mut copier).unwrap();
    assert_eq!(copier.copies, 1);
    assert_eq!(numbers(&tree), vec![0, 1, 1]);

    let container = tree.find_property("numbers").unwrap();
    assert!(matches!(
        tree.duplicate_element(container, &mut copier),
        Err(TreeError::NotElement(_))
    ));
}

#[test]
fn redraw_fires_once_per_processed_rebuild() {
    let mut tree = TreeObject::new(route(3));
    let redraws = Rc::new(Cell::new(0));
    let counter = Rc::clone(&redraws);
    tree.set_redraw_callback(move || counter.set(counter.get() + 1));

    let numbers = tree.find_property("numbers").unwrap();
    let points = tree.find_property("points").unwrap();
    tree.insert(numbers, 0, Value::Int(1)).unwrap();
    tree.remove_at(numbers, 0).unwrap();
    tree.remove_last(points).unwrap();
    assert_eq!(redraws.get(), 0);

    // coalesced: one request per path
    assert_eq!(tree.pending_rebuilds().len(), 2);
    assert_eq!(tree.scheduled_rebuilds(), 3);
    assert_eq!(tree.process_pending_rebuilds(), 2);
    assert_eq!(redraws.get(), 2);
    assert_eq!(tree.process_pending_rebuilds(), 0);
}

#[test]
fn without_coalescing_every_mutation_rebuilds() {
    let settings = TreeSettings {
        coalesce_rebuilds: false,
        ..TreeSettings::default()
    };
    let mut tree = TreeObject::with_settings(Instance::new(route(3)), None, settings);
    let id = tree.find_property("numbers").unwrap();
    tree.insert(id, 0, Value::Int(1)).unwrap();
    tree.insert(id, 0, Value::Int(2)).unwrap();
    assert_eq!(tree.pending_rebuilds().len(), 2);
    assert_eq!(tree.process_pending_rebuilds(), 2);
    assert_eq!(child_count(&tree, "numbers"), 5);
}

#[test]
fn rebuild_of_vanished_path_is_skipped() {
    let mut tree = TreeObject::new(route(3));
    let numbers = tree.find_property("numbers").unwrap();
    tree.schedule_rebuild("numbers.Array.data[2]", RebuildReason::SetValue);
    tree.resize(numbers, 1).unwrap();
    // data[2] is still registered when its own request runs first
    assert_eq!(tree.process_pending_rebuilds(), 2);

    tree.schedule_rebuild("numbers.Array.data[2]", RebuildReason::SetValue);
    assert_eq!(tree.process_pending_rebuilds(), 0);
}

#[test]
fn mutations_commit_to_native_layer() {
    let layer = SnapshotLayer::new();
    let mut tree = TreeObject::native(Instance::new(route(2)), layer.clone());
    let id = tree.find_property("numbers").unwrap();
    tree.resize(id, 3).unwrap();
    assert_eq!(layer.commit_count(), 1);
    assert!(layer.is_dirty());
    assert!(tree.find_native_property("numbers.Array.data[2]").is_some());
}

#[test]
fn element_ids_do_not_survive_mutation() {
    let mut tree = TreeObject::new(route(3));
    let id = tree.find_property("numbers").unwrap();
    let old = tree.find_property("numbers.Array.data[0]").unwrap();
    tree.swap(id, 0, 2).unwrap();
    tree.process_pending_rebuilds();
    assert!(matches!(tree.node(old), Err(TreeError::StaleNode(_))));
    // the container node itself is kept
    assert!(tree.node(id).is_ok());
}
