#![allow(dead_code)]

use constructor_core::{
    Area, AreaId, ClonedHolder, ConstructorEditor, ConstructorGateway, ConstructorHolder,
    EngineConfig, GatewayError, GatewayResult, GroupId, HolderId, LoadedTree, NewGroup, NewHolder,
    NodeRef, SqliteConstructorGateway,
};
use rusqlite::Connection;
use std::cell::RefCell;

const READ_METHODS: &[&str] = &["list_areas", "load_area", "load_constructor_tree"];

/// Fails the call to `method` once `skip` earlier calls to it succeeded.
pub struct FailRule {
    pub method: &'static str,
    pub skip: usize,
    pub error: GatewayError,
}

/// SQLite gateway wrapper that records every call and can inject failures.
///
/// It does not override the batched move, so the trait's per-holder
/// fallback is what runs behind it.
pub struct RecordingGateway<'conn> {
    inner: SqliteConstructorGateway<'conn>,
    calls: RefCell<Vec<&'static str>>,
    fail: RefCell<Option<FailRule>>,
}

impl<'conn> RecordingGateway<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            inner: SqliteConstructorGateway::try_new(conn).unwrap(),
            calls: RefCell::new(Vec::new()),
            fail: RefCell::new(None),
        }
    }

    pub fn fail_on(&self, rule: FailRule) {
        *self.fail.borrow_mut() = Some(rule);
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn write_calls(&self) -> Vec<&'static str> {
        self.calls
            .borrow()
            .iter()
            .copied()
            .filter(|call| !READ_METHODS.contains(call))
            .collect()
    }

    fn record(&self, method: &'static str) -> GatewayResult<()> {
        self.calls.borrow_mut().push(method);
        let mut fail = self.fail.borrow_mut();
        let Some(rule) = fail.as_mut() else {
            return Ok(());
        };
        if rule.method != method {
            return Ok(());
        }
        if rule.skip > 0 {
            rule.skip -= 1;
            return Ok(());
        }
        let error = rule.error.clone();
        *fail = None;
        Err(error)
    }
}

impl ConstructorGateway for RecordingGateway<'_> {
    fn insert_area(&self, name: &str) -> GatewayResult<AreaId> {
        self.record("insert_area")?;
        self.inner.insert_area(name)
    }

    fn list_areas(&self) -> GatewayResult<Vec<Area>> {
        self.record("list_areas")?;
        self.inner.list_areas()
    }

    fn load_area(&self, area: AreaId) -> GatewayResult<Option<Area>> {
        self.record("load_area")?;
        self.inner.load_area(area)
    }

    fn remove_area(&self, area: AreaId) -> GatewayResult<()> {
        self.record("remove_area")?;
        self.inner.remove_area(area)
    }

    fn load_constructor_tree(&self, area: AreaId) -> GatewayResult<Option<LoadedTree>> {
        self.record("load_constructor_tree")?;
        self.inner.load_constructor_tree(area)
    }

    fn insert_constructor_group(&self, group: &NewGroup) -> GatewayResult<GroupId> {
        self.record("insert_constructor_group")?;
        self.inner.insert_constructor_group(group)
    }

    fn insert_constructor_holder(&self, holder: &NewHolder) -> GatewayResult<HolderId> {
        self.record("insert_constructor_holder")?;
        self.inner.insert_constructor_holder(holder)
    }

    fn insert_constructor_holder_sub_tree(
        &self,
        parent: GroupId,
        holder: &ClonedHolder,
    ) -> GatewayResult<HolderId> {
        self.record("insert_constructor_holder_sub_tree")?;
        self.inner.insert_constructor_holder_sub_tree(parent, holder)
    }

    fn update_constructor_holder_group_id(
        &self,
        holder: HolderId,
        group: GroupId,
    ) -> GatewayResult<()> {
        self.record("update_constructor_holder_group_id")?;
        self.inner.update_constructor_holder_group_id(holder, group)
    }

    fn update_constructor_holder_sub_reference(
        &self,
        holder: HolderId,
        target: Option<GroupId>,
    ) -> GatewayResult<()> {
        self.record("update_constructor_holder_sub_reference")?;
        self.inner.update_constructor_holder_sub_reference(holder, target)
    }

    fn update_constructor_holder_sub_group_id(
        &self,
        holder: HolderId,
        group: Option<GroupId>,
    ) -> GatewayResult<()> {
        self.record("update_constructor_holder_sub_group_id")?;
        self.inner.update_constructor_holder_sub_group_id(holder, group)
    }

    fn update_area_constructor_group(
        &self,
        area: AreaId,
        group: Option<GroupId>,
    ) -> GatewayResult<()> {
        self.record("update_area_constructor_group")?;
        self.inner.update_area_constructor_group(area, group)
    }

    fn remove_constructor_object_with_sub_tree(&self, node: NodeRef) -> GatewayResult<()> {
        self.record("remove_constructor_object_with_sub_tree")?;
        self.inner.remove_constructor_object_with_sub_tree(node)
    }

    fn update_constructor_holder_properties(
        &self,
        holder: &ConstructorHolder,
    ) -> GatewayResult<()> {
        self.record("update_constructor_holder_properties")?;
        self.inner.update_constructor_holder_properties(holder)
    }
}

pub fn setup() -> Connection {
    constructor_core::open_db_in_memory().unwrap()
}

/// Creates an area with a root group and returns both ids.
pub fn seed_area(conn: &Connection, name: &str) -> (AreaId, GroupId) {
    let gateway = SqliteConstructorGateway::try_new(conn).unwrap();
    let area = gateway.insert_area(name).unwrap();
    let root = gateway
        .insert_constructor_group(&NewGroup::default())
        .unwrap();
    gateway
        .update_area_constructor_group(area, Some(root))
        .unwrap();
    (area, root)
}

pub fn open_editor(conn: &Connection, area: AreaId) -> ConstructorEditor<RecordingGateway<'_>> {
    ConstructorEditor::open(RecordingGateway::new(conn), area, EngineConfig::default()).unwrap()
}

/// Names of the holders of `group` in sibling order.
pub fn child_names<G: ConstructorGateway>(
    editor: &ConstructorEditor<G>,
    group: GroupId,
) -> Vec<String> {
    editor
        .forest()
        .sibling_names(group)
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Adds a holder named `name` with a fresh owned group.
pub fn holder_with_group<G: ConstructorGateway>(
    editor: &mut ConstructorEditor<G>,
    parent: GroupId,
    name: &str,
) -> (HolderId, GroupId) {
    let holder = editor.add_holder(parent, Some(name)).unwrap();
    let group = editor.add_group(holder, false).unwrap();
    (holder, group)
}
