//! SQLite implementation of the constructor persistence gateway.
//!
//! # Responsibility
//! - Persist areas, constructor groups and holders.
//! - Keep SQL details, sibling ordering and subtree cascades inside the
//!   gateway boundary.
//!
//! # Invariants
//! - Sibling order is `sort_order ASC, id ASC`; inserts and moves append.
//! - Subtree deletes follow ownership only; referenced groups survive and
//!   references to deleted groups are nulled by the schema.
//! - Multi-statement writes run in one immediate transaction.

use super::gateway::{ConstructorGateway, GatewayError, GatewayResult, LoadedTree};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::constructor::{
    Area, ConstructorGroup, ConstructorHolder, HolderProperties, NewGroup, NewHolder, SubObject,
};
use crate::model::ids::{AreaId, GroupId, HolderId};
use crate::model::node::NodeRef;
use crate::tree::clone::{ClonedHolder, ClonedSubObject};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const HOLDER_SELECT_SQL: &str = "SELECT
    id,
    parent_group_id,
    name,
    alias,
    inheritance,
    sub_relation_name,
    super_relation_name,
    sub_group_aliases,
    invisible,
    is_home,
    ask_for_related_area,
    area_id,
    sub_group_id,
    sub_reference_id,
    link_target_id
FROM constructor_holders";

const OWNED_GROUPS_SQL: &str = "WITH RECURSIVE owned(id) AS (
        SELECT id
        FROM constructor_groups
        WHERE id = ?1
        UNION
        SELECT g.id
        FROM constructor_groups g
        INNER JOIN constructor_holders h ON g.parent_holder_id = h.id
        INNER JOIN owned o ON h.parent_group_id = o.id
    )
    SELECT id FROM owned;";

/// SQLite-backed constructor gateway.
pub struct SqliteConstructorGateway<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteConstructorGateway<'conn> {
    /// Creates gateway from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> GatewayResult<Self> {
        ensure_constructor_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn immediate(&self) -> GatewayResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl ConstructorGateway for SqliteConstructorGateway<'_> {
    fn insert_area(&self, name: &str) -> GatewayResult<AreaId> {
        self.conn
            .execute("INSERT INTO areas (name) VALUES (?1);", [name])?;
        Ok(AreaId(self.conn.last_insert_rowid()))
    }

    fn list_areas(&self) -> GatewayResult<Vec<Area>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, constructor_group_id
             FROM areas
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut areas = Vec::new();
        while let Some(row) = rows.next()? {
            areas.push(parse_area_row(row)?);
        }
        Ok(areas)
    }

    fn load_area(&self, area: AreaId) -> GatewayResult<Option<Area>> {
        load_area(self.conn, area)
    }

    fn remove_area(&self, area: AreaId) -> GatewayResult<()> {
        let tx = self.immediate()?;
        let existing = load_area(&tx, area)?.ok_or_else(|| not_found(area))?;
        if let Some(root) = existing.constructor_group_id {
            delete_group_subtree(&tx, root)?;
        }
        tx.execute("DELETE FROM areas WHERE id = ?1;", [area.get()])?;
        tx.commit()?;
        debug!("event=area_remove module=gateway status=ok area_id={area}");
        Ok(())
    }

    fn load_constructor_tree(&self, area: AreaId) -> GatewayResult<Option<LoadedTree>> {
        let existing = load_area(self.conn, area)?.ok_or_else(|| not_found(area))?;
        let Some(root) = existing.constructor_group_id else {
            return Ok(None);
        };

        let mut groups = Vec::new();
        let mut holders = Vec::new();
        for group_id in owned_group_ids(self.conn, root)? {
            let mut group = load_group(self.conn, group_id)?.ok_or_else(|| not_found(group_id))?;
            let children = load_child_holders(self.conn, group_id)?;
            group.children = children.iter().map(|holder| holder.id).collect();
            groups.push(group);
            holders.extend(children);
        }
        if groups.is_empty() {
            return Err(not_found(root));
        }

        Ok(Some(LoadedTree {
            root,
            groups,
            holders,
        }))
    }

    fn insert_constructor_group(&self, group: &NewGroup) -> GatewayResult<GroupId> {
        insert_group_row(
            self.conn,
            group.parent_holder_id,
            group.extension_area_id,
            &group.alias,
        )
    }

    fn insert_constructor_holder(&self, holder: &NewHolder) -> GatewayResult<HolderId> {
        insert_holder_row(
            self.conn,
            holder.parent_group_id,
            &holder.name,
            &holder.properties,
            holder.link_target_id,
        )
    }

    fn insert_constructor_holder_sub_tree(
        &self,
        parent: GroupId,
        holder: &ClonedHolder,
    ) -> GatewayResult<HolderId> {
        let tx = self.immediate()?;
        let id = insert_cloned_holder(&tx, parent, holder)?;
        tx.commit()?;
        Ok(id)
    }

    fn update_constructor_holder_group_id(
        &self,
        holder: HolderId,
        group: GroupId,
    ) -> GatewayResult<()> {
        move_holder(self.conn, holder, group)
    }

    fn update_constructor_holders_group_id(
        &self,
        holders: &[HolderId],
        group: GroupId,
    ) -> GatewayResult<()> {
        let tx = self.immediate()?;
        for holder in holders {
            move_holder(&tx, *holder, group)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn update_constructor_holder_sub_reference(
        &self,
        holder: HolderId,
        target: Option<GroupId>,
    ) -> GatewayResult<()> {
        let changed = self.conn.execute(
            "UPDATE constructor_holders
             SET sub_reference_id = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![holder.get(), target.map(GroupId::get)],
        )?;
        expect_changed(changed, holder)
    }

    fn update_constructor_holder_sub_group_id(
        &self,
        holder: HolderId,
        group: Option<GroupId>,
    ) -> GatewayResult<()> {
        set_sub_group(self.conn, holder, group)
    }

    fn update_area_constructor_group(
        &self,
        area: AreaId,
        group: Option<GroupId>,
    ) -> GatewayResult<()> {
        let changed = self.conn.execute(
            "UPDATE areas SET constructor_group_id = ?2 WHERE id = ?1;",
            params![area.get(), group.map(GroupId::get)],
        )?;
        expect_changed(changed, area)
    }

    fn remove_constructor_object_with_sub_tree(&self, node: NodeRef) -> GatewayResult<()> {
        match node {
            NodeRef::Area { id } => self.remove_area(id),
            NodeRef::Group { id } => {
                let tx = self.immediate()?;
                load_group(&tx, id)?.ok_or_else(|| not_found(id))?;
                delete_group_subtree(&tx, id)?;
                tx.commit()?;
                Ok(())
            }
            NodeRef::Holder { id } => {
                let tx = self.immediate()?;
                let owned: Option<i64> = tx
                    .query_row(
                        "SELECT sub_group_id FROM constructor_holders WHERE id = ?1;",
                        [id.get()],
                        |row| row.get(0),
                    )
                    .optional()?
                    .ok_or_else(|| not_found(id))?;
                if let Some(group) = owned {
                    delete_group_subtree(&tx, GroupId(group))?;
                }
                tx.execute("DELETE FROM constructor_holders WHERE id = ?1;", [id.get()])?;
                tx.commit()?;
                Ok(())
            }
            NodeRef::GroupRef { holder, target } => {
                let changed = self.conn.execute(
                    "UPDATE constructor_holders
                     SET sub_reference_id = NULL,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?1
                       AND sub_reference_id = ?2;",
                    params![holder.get(), target.get()],
                )?;
                expect_changed(changed, node)
            }
        }
    }

    fn update_constructor_holder_properties(
        &self,
        holder: &ConstructorHolder,
    ) -> GatewayResult<()> {
        let properties = &holder.properties;
        let changed = self.conn.execute(
            "UPDATE constructor_holders
             SET name = ?2,
                 alias = ?3,
                 inheritance = ?4,
                 sub_relation_name = ?5,
                 super_relation_name = ?6,
                 sub_group_aliases = ?7,
                 invisible = ?8,
                 is_home = ?9,
                 ask_for_related_area = ?10,
                 area_id = ?11,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                holder.id.get(),
                holder.name.as_str(),
                properties.alias.as_str(),
                properties.inheritance,
                properties.sub_relation_name.as_str(),
                properties.super_relation_name.as_str(),
                properties.sub_group_aliases.as_str(),
                properties.invisible,
                properties.is_home,
                properties.ask_for_related_area,
                properties.area_id.map(AreaId::get),
            ],
        )?;
        expect_changed(changed, holder.id)
    }
}

fn load_area(conn: &Connection, area: AreaId) -> GatewayResult<Option<Area>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, constructor_group_id
         FROM areas
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([area.get()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_area_row(row)?));
    }
    Ok(None)
}

fn load_group(conn: &Connection, group: GroupId) -> GatewayResult<Option<ConstructorGroup>> {
    let mut stmt = conn.prepare(
        "SELECT id, parent_holder_id, extension_area_id, alias
         FROM constructor_groups
         WHERE id = ?1;",
    )?;
    let mut rows = stmt.query([group.get()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(ConstructorGroup {
            id: GroupId(row.get("id")?),
            parent_holder_id: row.get::<_, Option<i64>>("parent_holder_id")?.map(HolderId),
            extension_area_id: row.get::<_, Option<i64>>("extension_area_id")?.map(AreaId),
            alias: row.get("alias")?,
            children: Vec::new(),
        }));
    }
    Ok(None)
}

fn load_child_holders(conn: &Connection, group: GroupId) -> GatewayResult<Vec<ConstructorHolder>> {
    let mut stmt = conn.prepare(&format!(
        "{HOLDER_SELECT_SQL}
         WHERE parent_group_id = ?1
         ORDER BY sort_order ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([group.get()])?;
    let mut holders = Vec::new();
    while let Some(row) = rows.next()? {
        holders.push(parse_holder_row(row)?);
    }
    Ok(holders)
}

fn owned_group_ids(conn: &Connection, root: GroupId) -> GatewayResult<Vec<GroupId>> {
    let mut stmt = conn.prepare(OWNED_GROUPS_SQL)?;
    let mut rows = stmt.query([root.get()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(GroupId(row.get(0)?));
    }
    Ok(ids)
}

fn delete_group_subtree(conn: &Connection, root: GroupId) -> GatewayResult<()> {
    let groups = owned_group_ids(conn, root)?;
    for group in &groups {
        conn.execute(
            "DELETE FROM constructor_holders WHERE parent_group_id = ?1;",
            [group.get()],
        )?;
    }
    for group in &groups {
        conn.execute("DELETE FROM constructor_groups WHERE id = ?1;", [group.get()])?;
    }
    debug!(
        "event=subtree_delete module=gateway status=ok root_group_id={root} group_count={}",
        groups.len()
    );
    Ok(())
}

fn insert_group_row(
    conn: &Connection,
    parent_holder_id: Option<HolderId>,
    extension_area_id: Option<AreaId>,
    alias: &str,
) -> GatewayResult<GroupId> {
    conn.execute(
        "INSERT INTO constructor_groups (
            parent_holder_id,
            extension_area_id,
            alias
        ) VALUES (?1, ?2, ?3);",
        params![
            parent_holder_id.map(HolderId::get),
            extension_area_id.map(AreaId::get),
            alias,
        ],
    )?;
    Ok(GroupId(conn.last_insert_rowid()))
}

fn insert_holder_row(
    conn: &Connection,
    parent: GroupId,
    name: &str,
    properties: &HolderProperties,
    link_target_id: Option<HolderId>,
) -> GatewayResult<HolderId> {
    let sort_order = next_sort_order(conn, parent)?;
    conn.execute(
        "INSERT INTO constructor_holders (
            parent_group_id,
            name,
            alias,
            inheritance,
            sub_relation_name,
            super_relation_name,
            sub_group_aliases,
            invisible,
            is_home,
            ask_for_related_area,
            area_id,
            link_target_id,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
        params![
            parent.get(),
            name,
            properties.alias.as_str(),
            properties.inheritance,
            properties.sub_relation_name.as_str(),
            properties.super_relation_name.as_str(),
            properties.sub_group_aliases.as_str(),
            properties.invisible,
            properties.is_home,
            properties.ask_for_related_area,
            properties.area_id.map(AreaId::get),
            link_target_id.map(HolderId::get),
            sort_order,
        ],
    )?;
    Ok(HolderId(conn.last_insert_rowid()))
}

fn insert_cloned_holder(
    conn: &Connection,
    parent: GroupId,
    holder: &ClonedHolder,
) -> GatewayResult<HolderId> {
    let id = insert_holder_row(
        conn,
        parent,
        &holder.name,
        &holder.properties,
        holder.link_target_id,
    )?;
    match &holder.sub_object {
        Some(ClonedSubObject::Group(group)) => {
            let group_id = insert_group_row(conn, Some(id), group.extension_area_id, &group.alias)?;
            set_sub_group(conn, id, Some(group_id))?;
            for child in &group.children {
                insert_cloned_holder(conn, group_id, child)?;
            }
        }
        Some(ClonedSubObject::Ref(target)) => {
            let changed = conn.execute(
                "UPDATE constructor_holders SET sub_reference_id = ?2 WHERE id = ?1;",
                params![id.get(), target.get()],
            )?;
            expect_changed(changed, id)?;
        }
        None => {}
    }
    Ok(id)
}

fn set_sub_group(conn: &Connection, holder: HolderId, group: Option<GroupId>) -> GatewayResult<()> {
    let changed = conn.execute(
        "UPDATE constructor_holders
         SET sub_group_id = ?2,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![holder.get(), group.map(GroupId::get)],
    )?;
    expect_changed(changed, holder)
}

fn move_holder(conn: &Connection, holder: HolderId, group: GroupId) -> GatewayResult<()> {
    let sort_order = next_sort_order(conn, group)?;
    let changed = conn.execute(
        "UPDATE constructor_holders
         SET parent_group_id = ?2,
             sort_order = ?3,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![holder.get(), group.get(), sort_order],
    )?;
    expect_changed(changed, holder)
}

fn next_sort_order(conn: &Connection, group: GroupId) -> GatewayResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(sort_order), -1) + 1
         FROM constructor_holders
         WHERE parent_group_id = ?1;",
        [group.get()],
        |row| row.get(0),
    )?;
    Ok(next)
}

fn parse_area_row(row: &Row<'_>) -> GatewayResult<Area> {
    Ok(Area {
        id: AreaId(row.get("id")?),
        name: row.get("name")?,
        constructor_group_id: row
            .get::<_, Option<i64>>("constructor_group_id")?
            .map(GroupId),
    })
}

fn parse_holder_row(row: &Row<'_>) -> GatewayResult<ConstructorHolder> {
    let id = HolderId(row.get("id")?);
    let sub_group = row.get::<_, Option<i64>>("sub_group_id")?.map(GroupId);
    let sub_reference = row.get::<_, Option<i64>>("sub_reference_id")?.map(GroupId);
    let sub_object = match (sub_group, sub_reference) {
        (Some(group), None) => Some(SubObject::Group(group)),
        (None, Some(target)) => Some(SubObject::Ref(target)),
        (None, None) => None,
        (Some(_), Some(_)) => {
            return Err(GatewayError::ConstraintViolation(format!(
                "{id} has both an owned group and a group reference"
            )));
        }
    };

    Ok(ConstructorHolder {
        id,
        name: row.get("name")?,
        parent_group_id: GroupId(row.get("parent_group_id")?),
        properties: HolderProperties {
            alias: row.get("alias")?,
            inheritance: parse_flag(row, "inheritance")?,
            sub_relation_name: row.get("sub_relation_name")?,
            super_relation_name: row.get("super_relation_name")?,
            sub_group_aliases: row.get("sub_group_aliases")?,
            invisible: parse_flag(row, "invisible")?,
            is_home: parse_flag(row, "is_home")?,
            ask_for_related_area: parse_flag(row, "ask_for_related_area")?,
            area_id: row.get::<_, Option<i64>>("area_id")?.map(AreaId),
        },
        sub_object,
        link_target_id: row.get::<_, Option<i64>>("link_target_id")?.map(HolderId),
    })
}

fn parse_flag(row: &Row<'_>, column: &'static str) -> GatewayResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(GatewayError::ConstraintViolation(format!(
            "invalid flag value `{other}` in constructor_holders.{column}"
        ))),
    }
}

fn expect_changed(changed: usize, subject: impl std::fmt::Display) -> GatewayResult<()> {
    if changed == 0 {
        return Err(not_found(subject));
    }
    Ok(())
}

fn not_found(subject: impl std::fmt::Display) -> GatewayError {
    GatewayError::NotFound(subject.to_string())
}

fn ensure_constructor_connection_ready(conn: &Connection) -> Result<(), DbError> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(DbError::SchemaMismatch(format!(
            "constructor gateway requires schema version {expected_version}, got {actual_version}"
        )));
    }

    for table in ["areas", "constructor_groups", "constructor_holders"] {
        if !table_exists(conn, table)? {
            return Err(DbError::SchemaMismatch(format!(
                "constructor gateway requires table `{table}`"
            )));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, DbError> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
