use std::collections::{BTreeMap, BTreeSet};

use foundation::ids::{GroupId, RegionId};

/// A named, configured collection of regions. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    id: GroupId,
    region_ids: Vec<RegionId>,
}

impl Group {
    pub fn new(id: GroupId, region_ids: Vec<RegionId>) -> Self {
        Self { id, region_ids }
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    /// Member ids in configured order.
    pub fn region_ids(&self) -> &[RegionId] {
        &self.region_ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.region_ids.iter().any(|r| r.as_str() == id)
    }
}

/// How a region should currently be highlighted.
///
/// Individual selection outranks group membership.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Highlight {
    None,
    Group,
    Selected,
}

/// Outcome of activating a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSwitch {
    pub previous: Option<Group>,
    pub current: Group,
}

impl GroupSwitch {
    /// Regions whose highlight may have changed, without duplicates.
    pub fn affected(&self) -> Vec<RegionId> {
        let mut seen = BTreeSet::new();
        self.previous
            .iter()
            .chain(std::iter::once(&self.current))
            .flat_map(|g| g.region_ids().iter())
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect()
    }
}

/// Selected regions plus the single active group.
///
/// Ordering contract:
/// - `selected()` iterates ids in ascending order; insertion order is not kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<RegionId>,
    groups: BTreeMap<GroupId, Group>,
    active_group: Option<GroupId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_groups(groups: impl IntoIterator<Item = Group>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| (g.id().clone(), g)).collect(),
            ..Self::default()
        }
    }

    /// Inserts `id`. Returns `true` if the set changed.
    pub fn select(&mut self, id: RegionId) -> bool {
        self.selected.insert(id)
    }

    /// Removes `id`. Returns `true` if the set changed.
    pub fn unselect(&mut self, id: &str) -> bool {
        self.selected.remove(id)
    }

    /// Empties the selection and returns the removed ids.
    pub fn clear(&mut self) -> Vec<RegionId> {
        std::mem::take(&mut self.selected).into_iter().collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selected(&self) -> impl Iterator<Item = &RegionId> + '_ {
        self.selected.iter()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Activates a configured group, replacing the previous one.
    ///
    /// Returns `None` for an unknown group; the state is left untouched.
    pub fn select_group(&mut self, id: &str) -> Option<GroupSwitch> {
        let current = self.groups.get(id)?.clone();
        let previous = self
            .active_group
            .replace(current.id().clone())
            .and_then(|prev| self.groups.get(&prev).cloned());
        Some(GroupSwitch { previous, current })
    }

    /// Deactivates the active group and returns it, if any.
    pub fn clear_group(&mut self) -> Option<Group> {
        let prev = self.active_group.take()?;
        self.groups.get(&prev).cloned()
    }

    pub fn active_group(&self) -> Option<&Group> {
        self.active_group.as_ref().and_then(|id| self.groups.get(id))
    }

    /// True when `id` belongs to the active group.
    pub fn is_group_selected(&self, id: &str) -> bool {
        self.active_group().is_some_and(|g| g.contains(id))
    }

    pub fn highlight(&self, id: &str) -> Highlight {
        if self.is_selected(id) {
            Highlight::Selected
        } else if self.is_group_selected(id) {
            Highlight::Group
        } else {
            Highlight::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Group, Highlight, SelectionState};
    use foundation::ids::{GroupId, RegionId};

    fn r(id: &str) -> RegionId {
        RegionId::new(id).expect("region id")
    }

    fn group(id: &str, members: &[&str]) -> Group {
        Group::new(
            GroupId::new(id).expect("group id"),
            members.iter().map(|m| r(m)).collect(),
        )
    }

    fn state() -> SelectionState {
        SelectionState::with_groups([
            group("EU", &["DE", "FR", "IT"]),
            group("IB", &["ES", "PT"]),
        ])
    }

    #[test]
    fn select_is_idempotent() {
        let mut s = SelectionState::new();
        assert!(s.select(r("FR")));
        assert!(!s.select(r("FR")));
        assert_eq!(s.len(), 1);
        assert_eq!(s.selected().filter(|id| id.as_str() == "FR").count(), 1);
    }

    #[test]
    fn unselect_absent_is_noop() {
        let mut s = SelectionState::new();
        assert!(!s.unselect("DE"));
        s.select(r("DE"));
        assert!(s.unselect("DE"));
        assert!(s.is_empty());
    }

    #[test]
    fn clear_is_a_fixed_point() {
        let mut s = SelectionState::new();
        s.select(r("DE"));
        s.select(r("AT"));
        let removed = s.clear();
        assert_eq!(removed, vec![r("AT"), r("DE")]);
        let once = s.clone();
        assert!(s.clear().is_empty());
        assert_eq!(s, once);
    }

    #[test]
    fn select_group_marks_exactly_members() {
        let mut s = state();
        s.select(r("PL"));
        let switch = s.select_group("EU").expect("known group");
        assert!(switch.previous.is_none());

        for id in ["DE", "FR", "IT"] {
            assert!(s.is_group_selected(id), "{id} should be group-selected");
        }
        assert!(!s.is_group_selected("PL"));
        assert!(s.is_selected("PL"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn switching_groups_reports_both_memberships() {
        let mut s = state();
        s.select_group("EU");
        let switch = s.select_group("IB").expect("known group");
        assert_eq!(switch.previous.as_ref().map(|g| g.id().as_str()), Some("EU"));
        assert_eq!(
            switch.affected(),
            vec![r("DE"), r("FR"), r("IT"), r("ES"), r("PT")]
        );
        assert!(!s.is_group_selected("DE"));
        assert!(s.is_group_selected("ES"));
    }

    #[test]
    fn unknown_group_leaves_state_untouched() {
        let mut s = state();
        s.select_group("EU");
        let before = s.clone();
        assert!(s.select_group("NOPE").is_none());
        assert_eq!(s, before);
    }

    #[test]
    fn clear_group_without_active_is_noop() {
        let mut s = state();
        assert!(s.clear_group().is_none());
        s.select_group("EU");
        assert_eq!(s.clear_group().map(|g| g.id().to_string()), Some("EU".to_string()));
        assert!(s.active_group().is_none());
    }

    #[test]
    fn individual_selection_outranks_group() {
        let mut s = state();
        s.select(r("FR"));
        s.select_group("EU");
        assert_eq!(s.highlight("FR"), Highlight::Selected);
        assert_eq!(s.highlight("DE"), Highlight::Group);
        assert_eq!(s.highlight("ES"), Highlight::None);
        s.clear_group();
        assert_eq!(s.highlight("FR"), Highlight::Selected);
        assert_eq!(s.highlight("DE"), Highlight::None);
    }
}
