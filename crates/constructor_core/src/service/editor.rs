//! Constructor editor use-case service.
//!
//! # Responsibility
//! - Validate structural edits against the loaded forest before touching
//!   storage.
//! - Commit validated edits through the gateway and reload afterwards.
//! - Drive the two-step interactions and keep session view state in sync.
//!
//! # Invariants
//! - A validation failure issues zero gateway calls.
//! - Every commit, successful or not, is followed by a full reload; a reload
//!   failure never replaces the original persistence error.
//! - Node identities are trusted only against the current forest. An id
//!   that resolved in the previous load and no longer does is a stale
//!   reference, not a validation failure.

use super::error::{EditorError, EditorResult, ValidationError};
use super::interaction::{PendingCommit, PendingInteraction};
use super::paste::NameResolver;
use super::view_state::SessionViewState;
use crate::config::EngineConfig;
use crate::model::constructor::{
    ConstructorGroup, ConstructorHolder, HolderPatch, HolderProperties, NewGroup, NewHolder,
    SubObject,
};
use crate::model::ids::{AreaId, GroupId, HolderId};
use crate::model::node::NodeRef;
use crate::repo::gateway::{ConstructorGateway, GatewayError, GatewayResult};
use crate::tree::clone::ClonedNode;
use crate::tree::forest::ConstructorForest;
use crate::tree::links::LinkResolution;
use crate::tree::render::render_outline;
use log::{debug, info, warn};
use std::time::Instant;

/// Editing session over one area.
pub struct ConstructorEditor<G: ConstructorGateway> {
    gateway: G,
    config: EngineConfig,
    area: AreaId,
    forest: ConstructorForest,
    /// Forest of the previous load, used to tell stale ids from unknown ones.
    retired: ConstructorForest,
    links: LinkResolution,
    interaction: PendingInteraction,
    view: SessionViewState,
}

impl<G: ConstructorGateway> ConstructorEditor<G> {
    /// Opens a session on `area` and performs the initial load.
    pub fn open(gateway: G, area: AreaId, config: EngineConfig) -> EditorResult<Self> {
        let links = LinkResolution::resolve(
            &ConstructorForest::new(),
            &config.broken_link_placeholder,
        );
        let mut editor = Self {
            gateway,
            config,
            area,
            forest: ConstructorForest::new(),
            retired: ConstructorForest::new(),
            links,
            interaction: PendingInteraction::Idle,
            view: SessionViewState::new(),
        };
        editor.reload()?;
        info!(
            "event=editor_open module=editor status=ok area_id={area} session_id={}",
            editor.view.session_id()
        );
        Ok(editor)
    }

    pub fn area(&self) -> AreaId {
        self.area
    }

    pub fn forest(&self) -> &ConstructorForest {
        &self.forest
    }

    pub fn links(&self) -> &LinkResolution {
        &self.links
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn interaction(&self) -> PendingInteraction {
        self.interaction
    }

    pub fn view_state(&self) -> &SessionViewState {
        &self.view
    }

    pub fn view_state_mut(&mut self) -> &mut SessionViewState {
        &mut self.view
    }

    /// Consumes the session and returns the gateway.
    pub fn into_gateway(self) -> G {
        self.gateway
    }

    /// Root group of the session area.
    pub fn root_group(&self) -> Option<GroupId> {
        self.forest.root_group_of(self.area)
    }

    /// Path from the owning area down to `node`.
    pub fn path_to(&self, node: NodeRef) -> Option<Vec<NodeRef>> {
        let area = self.forest.owning_area(node)?;
        self.forest.path_to(NodeRef::area(area), node)
    }

    /// Name shown for `holder`, following links.
    pub fn display_name(&self, holder: HolderId) -> String {
        self.links.display_name(&self.forest, holder)
    }

    /// Text outline of the session area.
    pub fn outline(&self) -> Vec<String> {
        render_outline(&self.forest, &self.links, self.area)
    }

    /// Reloads after storage changed outside this session.
    pub fn notify_data_changed(&mut self) -> EditorResult<()> {
        debug!("event=data_changed module=editor status=ok area_id={}", self.area);
        self.reload()
    }

    /// Reloads every area tree and reconciles session state.
    pub fn reload(&mut self) -> EditorResult<()> {
        let started = Instant::now();
        let forest = load_forest(&self.gateway)?;
        forest.check_integrity()?;
        if forest.area(self.area).is_none() {
            warn!(
                "event=forest_reload module=editor status=error reason=stale_area area_id={}",
                self.area
            );
            return Err(EditorError::StaleReference(NodeRef::area(self.area)));
        }

        self.links = LinkResolution::resolve(&forest, &self.config.broken_link_placeholder);
        self.retired = std::mem::replace(&mut self.forest, forest);
        self.reconcile();
        debug!(
            "event=forest_reload module=editor status=ok groups={} holders={} broken_links={} duration_ms={}",
            self.forest.groups().count(),
            self.forest.holders().count(),
            self.links.broken_links().len(),
            started.elapsed().as_millis()
        );
        Ok(())
    }

    /// Appends a holder to `group`, generating a name when `name` is `None`.
    pub fn add_holder(&mut self, group: GroupId, name: Option<&str>) -> EditorResult<HolderId> {
        self.require_group(group)?;
        let name = match name {
            Some(value) => self.free_name(group, value)?,
            None => self.default_name(group)?,
        };
        let request = NewHolder::named(group, name);
        self.commit("holder_add", |gateway| gateway.insert_constructor_holder(&request))
    }

    /// Adds a holder to the root group of `area`, creating the root if needed.
    pub fn add_root_holder(&mut self, area: AreaId, name: Option<&str>) -> EditorResult<HolderId> {
        self.require_node(NodeRef::area(area))?;
        if let Some(root) = self.forest.root_group_of(area) {
            return self.add_holder(root, name);
        }

        let name = match name {
            Some(value) => normalize_name(value)?,
            None => format!("{}1", self.config.default_name_prefix),
        };
        self.commit("root_holder_add", |gateway| {
            let root = gateway.insert_constructor_group(&NewGroup::default())?;
            gateway.update_area_constructor_group(area, Some(root))?;
            gateway.insert_constructor_holder(&NewHolder::named(root, name))
        })
    }

    /// Gives `holder` a fresh owned group.
    ///
    /// An existing sub-object is only replaced with `confirm_overwrite`; an
    /// owned subtree is deleted, a reference is dropped.
    pub fn add_group(&mut self, holder: HolderId, confirm_overwrite: bool) -> EditorResult<GroupId> {
        let item = self.require_holder(holder)?;
        if item.is_link() {
            return Err(ValidationError::LinkHolderHasNoSubObject(holder).into());
        }
        let existing = item.sub_object;
        if existing.is_some() && !confirm_overwrite {
            return Err(ValidationError::SubObjectExists(holder).into());
        }

        self.commit("group_add", |gateway| {
            clear_sub_object(gateway, holder, existing)?;
            let group = gateway.insert_constructor_group(&NewGroup {
                parent_holder_id: Some(holder),
                ..NewGroup::default()
            })?;
            gateway.update_constructor_holder_sub_group_id(holder, Some(group))?;
            Ok(group)
        })
    }

    /// Renames `holder`; a link renames its target.
    pub fn rename_holder(&mut self, holder: HolderId, new_name: &str) -> EditorResult<()> {
        let name = normalize_name(new_name)?;
        let identity = self.identity_of(holder)?;
        let mut updated = self.require_holder(identity)?.clone();
        if updated.name == name {
            return Ok(());
        }
        if self
            .forest
            .name_taken(updated.parent_group_id, &name, Some(identity))
        {
            return Err(ValidationError::DuplicateName {
                group: updated.parent_group_id,
                name,
            }
            .into());
        }
        if identity != holder {
            let link_group = self.require_holder(holder)?.parent_group_id;
            if self.display_name_taken(link_group, &name, holder) {
                return Err(ValidationError::DuplicateName {
                    group: link_group,
                    name,
                }
                .into());
            }
        }

        updated.name = name;
        self.commit("holder_rename", |gateway| {
            gateway.update_constructor_holder_properties(&updated)
        })
    }

    /// Applies a property patch.
    ///
    /// On a link, relation names and sub-group aliases are written to the
    /// link and every other field to the link target.
    pub fn update_holder(&mut self, holder: HolderId, patch: &HolderPatch) -> EditorResult<()> {
        let item = self.require_holder(holder)?.clone();
        if let Some(Some(area)) = patch.area_id {
            self.require_node(NodeRef::area(area))?;
        }
        if patch.is_empty() {
            return Ok(());
        }

        let mut updates = Vec::new();
        if item.is_link() {
            let target = self.identity_of(holder)?;
            let (link_side, target_side) = patch.split_for_link();
            if !link_side.is_empty() {
                updates.push(patched(item, &link_side));
            }
            if !target_side.is_empty() {
                updates.push(patched(self.require_holder(target)?.clone(), &target_side));
            }
        } else {
            updates.push(patched(item, patch));
        }

        self.commit("holder_update", |gateway| {
            updates
                .iter()
                .try_for_each(|update| gateway.update_constructor_holder_properties(update))
        })
    }

    /// Points `holder` at `target`, deleting a previously owned subtree.
    pub fn create_group_reference(&mut self, holder: HolderId, target: GroupId) -> EditorResult<()> {
        let item = self.require_holder(holder)?;
        if item.is_link() {
            return Err(ValidationError::LinkHolderHasNoSubObject(holder).into());
        }
        let existing = item.sub_object;
        if existing == Some(SubObject::Ref(target)) {
            return Ok(());
        }
        if self.forest.group(target).is_none()
            || self
                .forest
                .is_descendant_or_self(NodeRef::holder(holder), NodeRef::group(target))
        {
            return Err(ValidationError::InvalidReferenceTarget { holder, target }.into());
        }

        self.commit("group_ref_create", |gateway| {
            if let Some(SubObject::Group(owned)) = existing {
                gateway.update_constructor_holder_sub_group_id(holder, None)?;
                gateway.remove_constructor_object_with_sub_tree(NodeRef::group(owned))?;
            }
            gateway.update_constructor_holder_sub_reference(holder, Some(target))
        })
    }

    /// Adds a link to `target` in `parent`.
    pub fn create_link(&mut self, parent: GroupId, target: HolderId) -> EditorResult<HolderId> {
        self.require_group(parent)?;
        self.require_holder(target)?;
        let request = NewHolder {
            parent_group_id: parent,
            name: self.default_name(parent)?,
            properties: HolderProperties::default(),
            link_target_id: Some(target),
        };
        self.commit("link_create", |gateway| gateway.insert_constructor_holder(&request))
    }

    /// Moves a holder, or every holder of a group, into `target`.
    pub fn move_node(&mut self, node: NodeRef, target: NodeRef) -> EditorResult<()> {
        self.require_node(node)?;
        self.require_node(target)?;
        let Some(target_group) = target.as_group() else {
            return Err(ValidationError::InvalidMoveTarget(target).into());
        };
        if self.forest.is_descendant_or_self(node, target) {
            return Err(ValidationError::CycleDetected { node, target }.into());
        }

        let moved: Vec<HolderId> = match node {
            NodeRef::Holder { id } => {
                if self.require_holder(id)?.parent_group_id == target_group {
                    return Ok(());
                }
                vec![id]
            }
            NodeRef::Group { id } => self.require_group(id)?.children.clone(),
            NodeRef::Area { .. } | NodeRef::GroupRef { .. } => {
                return Err(ValidationError::UnsupportedNode(node).into());
            }
        };
        if moved.is_empty() {
            return Ok(());
        }
        for holder in &moved {
            let name = &self.require_holder(*holder)?.name;
            if self.forest.name_taken(target_group, name, None) {
                return Err(ValidationError::DuplicateName {
                    group: target_group,
                    name: name.clone(),
                }
                .into());
            }
        }

        match moved.as_slice() {
            [single] => {
                let single = *single;
                self.commit("node_move", |gateway| {
                    gateway.update_constructor_holder_group_id(single, target_group)
                })
            }
            _ => self.commit("node_move", |gateway| {
                gateway.update_constructor_holders_group_id(&moved, target_group)
            }),
        }
    }

    /// Stores a deep copy of `node` in the session clipboard.
    pub fn copy(&mut self, node: NodeRef) -> EditorResult<()> {
        let cloned = self.clone_source(node)?;
        debug!(
            "event=clipboard_copy module=editor status=ok node={node} holders={}",
            cloned.holder_count()
        );
        self.view.set_clipboard(cloned);
        Ok(())
    }

    /// Pastes a deep copy of `source` into `target`.
    pub fn paste(
        &mut self,
        source: NodeRef,
        target: NodeRef,
        resolver: &mut dyn NameResolver,
    ) -> EditorResult<Vec<HolderId>> {
        let target_group = self.paste_target(target)?;
        let cloned = self.clone_source(source)?;
        self.paste_cloned(cloned, target_group, resolver)
    }

    /// Pastes the clipboard into `target`. The clipboard is kept.
    pub fn paste_clipboard(
        &mut self,
        target: NodeRef,
        resolver: &mut dyn NameResolver,
    ) -> EditorResult<Vec<HolderId>> {
        let target_group = self.paste_target(target)?;
        let cloned = self
            .view
            .clipboard()
            .cloned()
            .ok_or(ValidationError::NothingToPaste)?;
        self.paste_cloned(cloned, target_group, resolver)
    }

    /// Deletes `node` with everything it owns.
    ///
    /// Removing the last holder of an area root, or the root group itself,
    /// needs `remove_whole_tree` and detaches the root from the area.
    pub fn delete_node(&mut self, node: NodeRef, remove_whole_tree: bool) -> EditorResult<()> {
        self.require_node(node)?;
        match node {
            NodeRef::Area { .. } => Err(ValidationError::UnsupportedNode(node).into()),
            NodeRef::GroupRef { .. } => self.commit("node_delete", |gateway| {
                gateway.remove_constructor_object_with_sub_tree(node)
            }),
            NodeRef::Holder { id } => {
                let parent = self.require_holder(id)?.parent_group_id;
                let group = self.require_group(parent)?;
                let root_area = match group.parent_holder_id {
                    None if group.children.len() == 1 => self.forest.area_owning_root(parent),
                    _ => None,
                };
                match root_area {
                    Some(_) if !remove_whole_tree => {
                        Err(ValidationError::RootRemovalNotConfirmed(node).into())
                    }
                    Some(area) => self.commit("node_delete", |gateway| {
                        gateway.update_area_constructor_group(area, None)?;
                        gateway.remove_constructor_object_with_sub_tree(NodeRef::group(parent))
                    }),
                    None => self.commit("node_delete", |gateway| {
                        gateway.remove_constructor_object_with_sub_tree(node)
                    }),
                }
            }
            NodeRef::Group { id } => {
                let owner = self.require_group(id)?.parent_holder_id;
                match owner {
                    None if !remove_whole_tree => {
                        Err(ValidationError::RootRemovalNotConfirmed(node).into())
                    }
                    None => {
                        let area = self.forest.area_owning_root(id);
                        self.commit("node_delete", |gateway| {
                            if let Some(area) = area {
                                gateway.update_area_constructor_group(area, None)?;
                            }
                            gateway.remove_constructor_object_with_sub_tree(node)
                        })
                    }
                    Some(owner) => self.commit("node_delete", |gateway| {
                        gateway.update_constructor_holder_sub_group_id(owner, None)?;
                        gateway.remove_constructor_object_with_sub_tree(node)
                    }),
                }
            }
        }
    }

    /// Arms the group-reference interaction on `holder`.
    pub fn start_group_reference(
        &mut self,
        holder: HolderId,
        confirm_overwrite: bool,
    ) -> EditorResult<()> {
        let item = self.require_holder(holder)?;
        if item.is_link() {
            return Err(ValidationError::LinkHolderHasNoSubObject(holder).into());
        }
        if item.sub_object.is_some() && !confirm_overwrite {
            return Err(ValidationError::SubObjectExists(holder).into());
        }
        self.interaction.arm_group_ref(holder);
        debug!("event=interaction_arm module=editor status=ok kind=group_ref holder_id={holder}");
        Ok(())
    }

    /// Arms the link interaction on `group`.
    pub fn start_link(&mut self, group: GroupId) -> EditorResult<()> {
        self.require_group(group)?;
        self.interaction.arm_link(group);
        debug!("event=interaction_arm module=editor status=ok kind=link group_id={group}");
        Ok(())
    }

    pub fn cancel_interaction(&mut self) {
        self.interaction.cancel();
    }

    /// Selects `node` and completes an armed interaction when it matches.
    ///
    /// Returns the committed operation, if any.
    pub fn select(&mut self, node: NodeRef) -> EditorResult<Option<PendingCommit>> {
        self.require_node(node)?;
        let path = self.path_to(node).unwrap_or_else(|| vec![node]);
        self.view.select_path(path);

        let Some(commit) = self.interaction.select(node) else {
            return Ok(None);
        };
        match commit {
            PendingCommit::GroupReference { source, target } => {
                self.create_group_reference(source, target)?;
            }
            PendingCommit::Link { parent, target } => {
                self.create_link(parent, target)?;
            }
        }
        Ok(Some(commit))
    }

    fn paste_target(&self, target: NodeRef) -> EditorResult<GroupId> {
        self.require_node(target)?;
        target
            .as_group()
            .ok_or_else(|| ValidationError::InvalidPasteTarget(target).into())
    }

    fn clone_source(&self, source: NodeRef) -> EditorResult<ClonedNode> {
        self.require_node(source)?;
        match source {
            NodeRef::Group { .. } | NodeRef::Holder { .. } => self
                .forest
                .clone_tree(source)
                .ok_or_else(|| self.missing(source)),
            NodeRef::Area { .. } | NodeRef::GroupRef { .. } => {
                Err(ValidationError::UnsupportedNode(source).into())
            }
        }
    }

    fn paste_cloned(
        &mut self,
        cloned: ClonedNode,
        target: GroupId,
        resolver: &mut dyn NameResolver,
    ) -> EditorResult<Vec<HolderId>> {
        let mut holders = cloned.into_holders();
        let missing = holders
            .iter()
            .flat_map(|holder| holder.referenced_groups())
            .find(|group| self.forest.group(*group).is_none());
        if let Some(group) = missing {
            debug!(
                "event=paste module=editor status=rejected reason=missing_reference group_id={group}"
            );
            return Err(ValidationError::MissingReferenceTarget(group).into());
        }
        let mut taken: Vec<String> = self
            .forest
            .sibling_names(target)
            .into_iter()
            .map(str::to_string)
            .collect();

        for holder in &mut holders {
            let mut candidate = holder.name.clone();
            let mut attempts = 0;
            while taken.contains(&candidate) {
                attempts += 1;
                let proposed = if attempts > self.config.max_name_probe {
                    None
                } else {
                    resolver.resolve(&candidate, &taken)
                };
                match proposed {
                    Some(next) => {
                        // Blank proposals count as a failed attempt.
                        if let Ok(next) = normalize_name(&next) {
                            candidate = next;
                        }
                    }
                    None => {
                        debug!(
                            "event=paste module=editor status=abandoned target_group_id={target}"
                        );
                        return Err(ValidationError::PasteAbandoned { name: candidate }.into());
                    }
                }
            }
            holder.name = candidate.clone();
            taken.push(candidate);
        }
        if holders.is_empty() {
            return Ok(Vec::new());
        }

        self.commit("paste", |gateway| {
            holders
                .iter()
                .map(|holder| gateway.insert_constructor_holder_sub_tree(target, holder))
                .collect()
        })
    }

    /// Runs `write`, then reloads. On failure reloads and reports the
    /// gateway error.
    fn commit<T>(
        &mut self,
        event: &'static str,
        write: impl FnOnce(&G) -> GatewayResult<T>,
    ) -> EditorResult<T> {
        let started = Instant::now();
        match write(&self.gateway) {
            Ok(value) => {
                self.reload()?;
                info!(
                    "event={event} module=editor status=ok area_id={} duration_ms={}",
                    self.area,
                    started.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                warn!(
                    "event={event} module=editor status=error error_kind={:?} duration_ms={}",
                    err.kind(),
                    started.elapsed().as_millis()
                );
                if let Err(reload_err) = self.reload() {
                    warn!(
                        "event=forest_reload module=editor status=error after={event} error={reload_err}"
                    );
                }
                Err(EditorError::Persistence(err))
            }
        }
    }

    fn reconcile(&mut self) {
        if let Some(node) = self.interaction.armed_node() {
            if !self.forest.contains(node) {
                self.interaction.cancel();
                debug!("event=interaction_cancel module=editor status=ok reason=node_gone node={node}");
            }
        }
        let dropped = self.view.reconcile(&self.forest);
        if dropped > 0 {
            debug!("event=view_reconcile module=editor status=ok dropped={dropped}");
        }
    }

    /// Holder whose identity `holder` carries: the target for links, itself
    /// otherwise.
    fn identity_of(&self, holder: HolderId) -> EditorResult<HolderId> {
        let item = self.require_holder(holder)?;
        let Some(target) = item.link_target_id else {
            return Ok(holder);
        };
        self.links.resolved_target(holder).ok_or_else(|| {
            ValidationError::BrokenLinkEditAttempt {
                link: holder,
                target,
            }
            .into()
        })
    }

    /// Whether a sibling of `except` in `group` shows `name`.
    fn display_name_taken(&self, group: GroupId, name: &str, except: HolderId) -> bool {
        self.forest.group(group).is_some_and(|item| {
            item.children
                .iter()
                .any(|child| *child != except && self.display_name(*child) == name)
        })
    }

    fn default_name(&self, group: GroupId) -> Result<String, ValidationError> {
        let prefix = &self.config.default_name_prefix;
        (1..=self.config.max_name_probe)
            .map(|n| format!("{prefix}{n}"))
            .find(|name| !self.forest.name_taken(group, name, None))
            .ok_or_else(|| ValidationError::DuplicateName {
                group,
                name: format!("{prefix}{}", self.config.max_name_probe),
            })
    }

    fn free_name(&self, group: GroupId, name: &str) -> Result<String, ValidationError> {
        let name = normalize_name(name)?;
        if self.forest.name_taken(group, &name, None) {
            return Err(ValidationError::DuplicateName { group, name });
        }
        Ok(name)
    }

    /// Error for a node absent from the current forest.
    fn missing(&self, node: NodeRef) -> EditorError {
        if self.retired.contains(node) {
            debug!("event=node_lookup module=editor status=stale node={node}");
            return EditorError::StaleReference(node);
        }
        ValidationError::NodeNotFound(node).into()
    }

    fn require_node(&self, node: NodeRef) -> EditorResult<()> {
        if self.forest.contains(node) {
            return Ok(());
        }
        Err(self.missing(node))
    }

    fn require_group(&self, group: GroupId) -> EditorResult<&ConstructorGroup> {
        self.forest
            .group(group)
            .ok_or_else(|| self.missing(NodeRef::group(group)))
    }

    fn require_holder(&self, holder: HolderId) -> EditorResult<&ConstructorHolder> {
        self.forest
            .holder(holder)
            .ok_or_else(|| self.missing(NodeRef::holder(holder)))
    }
}

fn load_forest<G: ConstructorGateway>(gateway: &G) -> Result<ConstructorForest, GatewayError> {
    let areas = gateway.list_areas()?;
    let mut trees = Vec::new();
    for area in areas.iter().filter(|area| area.constructor_group_id.is_some()) {
        if let Some(tree) = gateway.load_constructor_tree(area.id)? {
            trees.push(tree);
        }
    }
    Ok(ConstructorForest::from_parts(areas, trees))
}

fn clear_sub_object<G: ConstructorGateway>(
    gateway: &G,
    holder: HolderId,
    existing: Option<SubObject>,
) -> GatewayResult<()> {
    match existing {
        Some(SubObject::Group(owned)) => {
            gateway.update_constructor_holder_sub_group_id(holder, None)?;
            gateway.remove_constructor_object_with_sub_tree(NodeRef::group(owned))
        }
        Some(SubObject::Ref(_)) => gateway.update_constructor_holder_sub_reference(holder, None),
        None => Ok(()),
    }
}

fn patched(mut holder: ConstructorHolder, patch: &HolderPatch) -> ConstructorHolder {
    patch.apply_to(&mut holder.properties);
    holder
}

fn normalize_name(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::InvalidName);
    }
    Ok(trimmed.to_string())
}
