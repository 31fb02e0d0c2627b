//! Link holder resolution.
//!
//! # Responsibility
//! - Map every link holder to its target within one loaded forest.
//! - Provide display names that mirror the target, with a placeholder for
//!   broken links.
//!
//! # Invariants
//! - Resolution never mutates `link_target_id`.
//! - Resolving the same forest twice yields equal results.

use super::forest::ConstructorForest;
use crate::model::ids::HolderId;
use std::collections::BTreeMap;

/// Placeholder used when a link target cannot be found. `{target}` is
/// replaced by the raw target id.
pub const DEFAULT_BROKEN_LINK_PLACEHOLDER: &str = "<broken link {target}>";

/// Resolution state of one link holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Target holder exists in the loaded forest.
    Resolved(HolderId),
    /// Target holder is missing; editing through this link is disabled.
    Broken(HolderId),
}

/// Link resolution table for one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResolution {
    states: BTreeMap<HolderId, LinkState>,
    placeholder: String,
}

impl LinkResolution {
    /// Resolves every link holder of `forest`.
    pub fn resolve(forest: &ConstructorForest, placeholder: &str) -> Self {
        let states = forest
            .holders()
            .filter_map(|holder| {
                let target = holder.link_target_id?;
                let state = if forest.holder(target).is_some() {
                    LinkState::Resolved(target)
                } else {
                    LinkState::Broken(target)
                };
                Some((holder.id, state))
            })
            .collect();
        Self {
            states,
            placeholder: placeholder.to_string(),
        }
    }

    /// State of `holder`; `None` when it is not a link.
    pub fn state(&self, holder: HolderId) -> Option<LinkState> {
        self.states.get(&holder).copied()
    }

    /// Resolved target of `holder`, if it is a working link.
    pub fn resolved_target(&self, holder: HolderId) -> Option<HolderId> {
        match self.state(holder)? {
            LinkState::Resolved(target) => Some(target),
            LinkState::Broken(_) => None,
        }
    }

    pub fn is_broken(&self, holder: HolderId) -> bool {
        matches!(self.state(holder), Some(LinkState::Broken(_)))
    }

    /// Broken link holders in ascending id order.
    pub fn broken_links(&self) -> Vec<HolderId> {
        self.states
            .iter()
            .filter(|(_, state)| matches!(state, LinkState::Broken(_)))
            .map(|(holder, _)| *holder)
            .collect()
    }

    pub fn link_count(&self) -> usize {
        self.states.len()
    }

    /// Name shown for `holder`: the target's name for links, the placeholder
    /// for broken links, the holder's own name otherwise.
    pub fn display_name(&self, forest: &ConstructorForest, holder: HolderId) -> String {
        match self.state(holder) {
            Some(LinkState::Resolved(target)) => forest
                .holder(target)
                .map(|item| item.name.clone())
                .unwrap_or_default(),
            Some(LinkState::Broken(target)) => self
                .placeholder
                .replace("{target}", &target.get().to_string()),
            None => forest
                .holder(holder)
                .map(|item| item.name.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LinkResolution, LinkState, DEFAULT_BROKEN_LINK_PLACEHOLDER};
    use crate::model::ids::HolderId;
    use crate::tree::forest::fixtures::{holder, sample_forest};

    #[test]
    fn link_resolves_to_target_name() {
        let forest = sample_forest();
        let links = LinkResolution::resolve(&forest, DEFAULT_BROKEN_LINK_PLACEHOLDER);

        assert_eq!(
            links.state(HolderId(4)),
            Some(LinkState::Resolved(HolderId(3)))
        );
        assert_eq!(links.display_name(&forest, HolderId(4)), "C");
        assert_eq!(links.display_name(&forest, HolderId(1)), "A");
        assert_eq!(links.state(HolderId(1)), None);
        assert!(links.broken_links().is_empty());
    }

    #[test]
    fn missing_target_is_reported_as_broken() {
        let mut forest = sample_forest();
        let mut link = holder(4, "D", 1, None);
        link.link_target_id = Some(HolderId(404));
        forest.insert_holder(link);

        let links = LinkResolution::resolve(&forest, DEFAULT_BROKEN_LINK_PLACEHOLDER);
        assert!(links.is_broken(HolderId(4)));
        assert_eq!(links.resolved_target(HolderId(4)), None);
        assert_eq!(links.broken_links(), vec![HolderId(4)]);
        assert_eq!(
            links.display_name(&forest, HolderId(4)),
            "<broken link 404>"
        );
        assert_eq!(
            forest.holder(HolderId(4)).and_then(|item| item.link_target_id),
            Some(HolderId(404))
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let forest = sample_forest();
        let first = LinkResolution::resolve(&forest, DEFAULT_BROKEN_LINK_PLACEHOLDER);
        let second = LinkResolution::resolve(&forest, DEFAULT_BROKEN_LINK_PLACEHOLDER);
        assert_eq!(first, second);
        assert_eq!(first.link_count(), 1);
    }
}
