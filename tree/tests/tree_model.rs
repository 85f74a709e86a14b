//! Tree construction, value access and native sync.

use std::cell::RefCell;
use std::rc::Rc;

use inspector_core::{
    CoercionError, DisplayName, Inspectable, Instance, TypeRef, Value,
};
use inspector_tree::{
    NativeLayer, NativeProperty, NodeKind, Snapshot, SnapshotLayer, TreeError, TreeObject,
    TreeSettings, ValueChanged,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Inspectable)]
enum Mode {
    #[default]
    Idle,
    Run = 4,
}

#[derive(Clone, Default, Inspectable)]
struct Stats {
    pub health: f32,
    pub mana: f32,
}

#[derive(Clone, Default, Inspectable)]
struct Item {
    pub name: String,
    pub count: u32,
}

#[derive(Clone, Default, Inspectable)]
struct Inventory {
    #[inspect(rename = "Items")]
    pub items: Vec<Item>,
    pub capacity: u32,
}

#[derive(Clone, Default, Inspectable)]
struct Entity {
    pub id: u32,
    #[inspect(serialize)]
    tag: String,
    #[inspect(hide)]
    pub cache: u32,
    #[inspect(skip)]
    pub scratch: u32,
}

#[derive(Clone, Default, Inspectable)]
struct Holder {
    pub stats: Stats,
}

#[derive(Clone, Default, Inspectable)]
struct Party {
    pub leader: Option<Instance>,
}

#[derive(Clone, Default, Inspectable)]
#[inspect(
    button(heal),
    show(name = "Speed", get = speed, set = set_speed, attr = DisplayName("Walk speed"))
)]
struct Player {
    #[inspect(base)]
    base: Entity,
    pub stats: Stats,
    #[inspect(rename = "Inventory")]
    pub inventory: Inventory,
    pub mode: Mode,
    pub kind: TypeRef,
    pub target: Option<Instance>,
    pub slots: Option<Vec<u32>>,
    speed_value: f32,
}

impl Player {
    fn speed(&self) -> f32 {
        self.speed_value
    }

    fn set_speed(&mut self, value: f32) {
        self.speed_value = value;
    }

    fn heal(&mut self) {
        self.stats.health = 100.0;
    }
}

fn item(name: &str, count: u32) -> Item {
    Item {
        name: name.into(),
        count,
    }
}

fn player() -> Player {
    Player {
        base: Entity {
            id: 1,
            tag: "hero".into(),
            ..Default::default()
        },
        stats: Stats {
            health: 80.0,
            mana: 20.0,
        },
        inventory: Inventory {
            items: vec![item("sword", 1), item("potion", 3)],
            capacity: 8,
        },
        target: Some(Instance::new(Entity {
            id: 2,
            ..Default::default()
        })),
        ..Default::default()
    }
}

fn field_names(tree: &TreeObject) -> Vec<String> {
    tree.fields()
        .iter()
        .map(|id| tree.node(*id).unwrap().name().to_owned())
        .collect()
}

#[test]
fn base_fields_come_first() {
    let tree = TreeObject::new(player());
    assert_eq!(
        field_names(&tree),
        vec!["id", "tag", "stats", "Inventory", "mode", "kind", "target", "slots"]
    );
}

#[test]
fn every_path_resolves_to_its_node() {
    let tree = TreeObject::new(player());
    let mut count = 0;
    for (path, id) in tree.paths() {
        assert_eq!(tree.find_property(path), Some(id));
        assert_eq!(tree.node(id).unwrap().path(), path);
        count += 1;
    }
    assert_eq!(count, tree.node_count());
    assert!(tree.find_property("cache").is_none());
    assert!(tree.find_property("scratch").is_none());
}

#[test]
fn element_paths_use_array_data_segments() {
    let tree = TreeObject::new(player());
    let items = tree.find_property("Inventory.Items").unwrap();
    let children: Vec<String> = tree
        .node(items)
        .unwrap()
        .children()
        .iter()
        .map(|id| tree.node(*id).unwrap().path().to_owned())
        .collect();
    assert_eq!(
        children,
        vec!["Inventory.Items.Array.data[0]", "Inventory.Items.Array.data[1]"]
    );
    let first = tree.find_property("Inventory.Items.Array.data[0]").unwrap();
    let node = tree.node(first).unwrap();
    assert_eq!(node.element_index(), Some(0));
    assert!(matches!(node.kind(), NodeKind::ArrayElement { index: 0 }));
    assert!(tree.find_property("Inventory.Items.Array.data[1].count").is_some());
}

#[test]
fn struct_reads_keep_identity() {
    let tree = TreeObject::new(player());
    let stats = tree.find_property("stats").unwrap();
    let first = tree.get_value(stats).unwrap();
    let second = tree.get_value(stats).unwrap();
    assert!(first.same_instance(&second));

    let live = tree.get_value_uncached(stats).unwrap();
    assert!(!first.same_instance(&live));
}

#[test]
fn nested_struct_write_propagates() {
    let mut tree = TreeObject::new(player());
    let stats = tree.find_property("stats").unwrap();
    let health = tree.find_property("stats.health").unwrap();
    let cached = tree.get_value(stats).unwrap();

    tree.set_value(health, 42.0f32).unwrap();

    let seen = cached.as_instance().unwrap().with(|s: &Stats| s.health);
    assert_eq!(seen, Some(42.0));
    assert_eq!(tree.target().with(|p: &Player| p.stats.health), Some(42.0));
    assert_eq!(tree.get_as::<f32>(health).unwrap(), 42.0);
}

#[test]
fn deep_element_write_propagates_through_struct_and_list() {
    let mut tree = TreeObject::new(player());
    let count = tree
        .find_property("Inventory.Items.Array.data[1].count")
        .unwrap();
    tree.set_value(count, 9u32).unwrap();
    assert_eq!(
        tree.target().with(|p: &Player| p.inventory.items[1].count),
        Some(9)
    );
    // the element cell was flushed, not replaced
    assert_eq!(tree.get_as::<u32>(count).unwrap(), 9);
}

#[test]
fn coercion_errors_surface_and_leave_value() {
    let mut tree = TreeObject::new(player());
    let health = tree.find_property("stats.health").unwrap();
    assert!(matches!(
        tree.set_value_dyn(health, Value::Str("lots".into())),
        Err(TreeError::Coercion(CoercionError::InvalidCast { .. }))
    ));
    assert!(matches!(
        tree.set_value_dyn(health, Value::Null),
        Err(TreeError::Coercion(CoercionError::NullIntoValueType { .. }))
    ));
    assert_eq!(tree.get_as::<f32>(health).unwrap(), 80.0);

    // numeric strings convert
    tree.set_value_dyn(health, Value::Str("12.5".into())).unwrap();
    assert_eq!(tree.get_as::<f32>(health).unwrap(), 12.5);
}

#[test]
fn enum_from_integral() {
    let mut tree = TreeObject::new(player());
    let mode = tree.find_property("mode").unwrap();
    tree.set_value_dyn(mode, Value::Int(4)).unwrap();
    assert_eq!(tree.get_as::<Mode>(mode).unwrap(), Mode::Run);
    assert!(matches!(
        tree.set_value_dyn(mode, Value::Int(2)),
        Err(TreeError::Coercion(CoercionError::OutOfRange { .. }))
    ));
    tree.set_value_dyn(mode, Value::Str("Idle".into())).unwrap();
    assert_eq!(tree.target().with(|p: &Player| p.mode), Some(Mode::Idle));
}

#[test]
fn type_reference_from_name() {
    let mut tree = TreeObject::new(player());
    let kind = tree.find_property("kind").unwrap();
    // Stats was registered when the tree discovered it
    tree.set_value_dyn(kind, Value::Str("Stats".into())).unwrap();
    assert_eq!(tree.get_as::<TypeRef>(kind).unwrap(), TypeRef::of::<Stats>());
    assert!(matches!(
        tree.set_value_dyn(kind, Value::Str("NoSuchType".into())),
        Err(TreeError::Coercion(CoercionError::UnknownType(_)))
    ));
    tree.set_value_dyn(kind, Value::Null).unwrap();
    assert_eq!(tree.get_as::<TypeRef>(kind).unwrap(), TypeRef(None));
}

#[test]
fn show_property_and_button() {
    let mut tree = TreeObject::new(player());
    let speed = tree.find_property("Speed").unwrap();
    assert_eq!(tree.properties(), &[speed]);
    assert_eq!(tree.node(speed).unwrap().display_name(), "Walk speed");
    assert_eq!(
        tree.try_get_attribute::<DisplayName>(speed).map(|d| d.0),
        Some("Walk speed")
    );

    tree.set_value(speed, 3.5f32).unwrap();
    assert_eq!(tree.get_value(speed).unwrap(), Value::Float(3.5));
    assert_eq!(tree.target().with(|p: &Player| p.speed_value), Some(3.5));

    let heal = tree.find_property("heal").unwrap();
    assert_eq!(tree.buttons(), &[heal]);
    let stats = tree.find_property("stats").unwrap();
    let _ = tree.get_value(stats).unwrap();
    tree.invoke(heal).unwrap();
    let health = tree.find_property("stats.health").unwrap();
    assert_eq!(tree.get_as::<f32>(health).unwrap(), 100.0);

    assert!(matches!(
        tree.set_value_dyn(heal, Value::Null),
        Err(TreeError::NotAssignable(_))
    ));
}

#[test]
fn uninitialized_container_has_no_children() {
    let mut tree = TreeObject::new(player());
    let slots = tree.find_property("slots").unwrap();
    assert!(tree.node(slots).unwrap().children().is_empty());
    assert!(tree.node(slots).unwrap().is_array_like());
    assert_eq!(
        tree.resize(slots, 2),
        Err(TreeError::Uninitialized("slots".into()))
    );

    // assigning a container initializes it
    tree.set_value_dyn(slots, Value::List(vec![Value::UInt(4)]))
        .unwrap();
    tree.process_pending_rebuilds();
    assert!(tree.find_property("slots.Array.data[0]").is_some());
}

#[test]
fn value_changed_reports_previous_and_current() {
    let mut tree = TreeObject::new(player());
    let events: Rc<RefCell<Vec<ValueChanged>>> = Rc::default();
    let sink = Rc::clone(&events);
    tree.set_value_changed_callback(move |event| sink.borrow_mut().push(event.clone()));

    let id = tree.find_property("id").unwrap();
    tree.set_value(id, 7u32).unwrap();

    let items = tree.find_property("Inventory.Items").unwrap();
    tree.set_value_dyn(items, Value::List(Vec::new())).unwrap();

    // whole-struct writes are not scalar edits
    let stats = tree.find_property("stats").unwrap();
    tree.set_value_dyn(stats, Value::Struct(Instance::new(Stats::default())))
        .unwrap();
    let target = tree.find_property("target").unwrap();
    tree.set_value_dyn(target, Value::Object(Instance::new(Entity::default())))
        .unwrap();

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].path, "id");
    assert_eq!(events[0].previous, Some(Value::UInt(1)));
    assert_eq!(events[0].current, Value::UInt(7));
}

#[test]
fn stale_ids_fail_after_rebuild() {
    let mut tree = TreeObject::new(player());
    let items = tree.find_property("Inventory.Items").unwrap();
    let old = tree.find_property("Inventory.Items.Array.data[0]").unwrap();
    tree.insert(items, 0, Value::Struct(Instance::new(item("bow", 1))))
        .unwrap();

    // nothing changes until the queue is drained
    assert!(tree.node(old).is_ok());
    assert_eq!(tree.process_pending_rebuilds(), 1);

    assert_eq!(tree.get_value(old), Err(TreeError::StaleNode(old)));
    let new = tree.find_property("Inventory.Items.Array.data[0]").unwrap();
    assert_eq!(new.generation(), tree.generation());
    let name = tree.find_property("Inventory.Items.Array.data[0].name").unwrap();
    assert_eq!(tree.get_as::<String>(name).unwrap(), "bow");
}

#[test]
fn rebuild_all_restarts_discovery() {
    let mut tree = TreeObject::new(player());
    let before = tree.node_count();
    let id = tree.find_property("id").unwrap();
    tree.rebuild_all();
    assert_eq!(tree.node_count(), before);
    assert!(tree.node(id).is_err());
    assert!(tree.find_property("id").is_some());
}

#[test]
fn depth_limit_stops_expansion() {
    let _ = env_logger::builder().is_test(true).try_init();
    let settings = TreeSettings::from_toml_str("[tree]\nmax_depth = 1\n").unwrap();
    let tree = TreeObject::with_settings(Instance::new(player()), None, settings);
    assert!(tree.find_property("Inventory.Items").is_some());
    assert!(tree.find_property("Inventory.Items.Array.data[0]").is_none());
}

/// Records every call in order.
struct RecordingLayer {
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl NativeLayer for RecordingLayer {
    fn resolve(&self, path: &str) -> Option<NativeProperty> {
        Some(NativeProperty {
            path: path.to_owned(),
            data: Snapshot::Null,
        })
    }

    fn refresh(&mut self, _target: &Instance) {
        self.log.borrow_mut().push("refresh");
    }

    fn commit_without_undo(&mut self, _target: &Instance) {
        self.log.borrow_mut().push("commit");
    }

    fn mark_dirty(&mut self, _target: &Instance) {
        self.log.borrow_mut().push("dirty");
    }
}

#[test]
fn apply_runs_native_sequence_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut tree = TreeObject::native(
        Instance::new(player()),
        RecordingLayer {
            log: Rc::clone(&log),
        },
    );
    assert!(tree.is_native());
    assert!(tree.find_native_property("stats.health").is_some());

    let health = tree.find_property("stats.health").unwrap();
    tree.set_value(health, 5.0f32).unwrap();
    assert_eq!(*log.borrow(), vec!["refresh", "commit", "dirty"]);
}

#[test]
fn plain_roots_have_no_native_properties() {
    let tree = TreeObject::new(player());
    assert!(!tree.is_native());
    assert!(tree.find_native_property("stats").is_none());
}

#[test]
fn nested_session_applies_outer_root() {
    let layer = SnapshotLayer::new();
    let target = Instance::new(player());
    let outer = Rc::new(RefCell::new(TreeObject::native(target.clone(), layer.clone())));

    let mut inner = TreeObject::nested(&outer, "target").unwrap();
    assert!(!inner.is_native());
    let id = inner.find_property("id").unwrap();
    inner.set_value(id, 42u32).unwrap();

    assert!(layer.is_dirty());
    assert_eq!(layer.commit_count(), 1);
    assert_eq!(
        layer.resolve("target.id").map(|p| p.data),
        Some(Snapshot::UInt(42))
    );

    // the outer tree sees the shared object change
    let outer_id = outer.borrow().find_property("target.id").unwrap();
    assert_eq!(outer.borrow().get_as::<u32>(outer_id).unwrap(), 42);
}

#[test]
fn nested_and_outer_edits_under_shared_struct_both_land() {
    let leader = Instance::new(Holder::default());
    let outer = Rc::new(RefCell::new(TreeObject::new(Party {
        leader: Some(leader.clone()),
    })));
    let outer_mana = outer.borrow().find_property("leader.stats.mana").unwrap();
    // caches the outer copy of `leader.stats`
    assert_eq!(outer.borrow().get_as::<f32>(outer_mana).unwrap(), 0.0);

    let mut inner = TreeObject::nested(&outer, "leader").unwrap();
    let health = inner.find_property("stats.health").unwrap();
    inner.set_value(health, 50.0f32).unwrap();

    outer.borrow_mut().set_value(outer_mana, 7.0f32).unwrap();
    let stats = leader.with(|h: &Holder| (h.stats.health, h.stats.mana));
    assert_eq!(stats, Some((50.0, 7.0)));

    let outer_health = outer.borrow().find_property("leader.stats.health").unwrap();
    assert_eq!(outer.borrow().get_as::<f32>(outer_health).unwrap(), 50.0);
    assert_eq!(inner.get_as::<f32>(health).unwrap(), 50.0);
}

#[test]
fn nested_requires_an_object() {
    let outer = Rc::new(RefCell::new(TreeObject::new(player())));
    assert!(matches!(
        TreeObject::nested(&outer, "stats"),
        Err(TreeError::NotAnObject(_))
    ));
    assert!(matches!(
        TreeObject::nested(&outer, "missing"),
        Err(TreeError::PathNotFound(_))
    ));
}

#[test]
fn parent_object_of_nested_member() {
    let tree = TreeObject::new(player());
    let mana = tree.find_property("stats.mana").unwrap();
    let stats = tree.find_property("stats").unwrap();
    let owner = tree.get_parent_object(mana).unwrap();
    assert!(Value::Struct(owner).same_instance(&tree.get_value(stats).unwrap()));

    let id = tree.find_property("id").unwrap();
    assert!(tree.get_parent_object(id).unwrap().ptr_eq(tree.target()));
}
