use serde::{Deserialize, Serialize};

use super::{Handle, Placement};
use crate::common::collections::BTreeSet;
use crate::common::config::FloatingSettings;
use crate::common::geometry::Rect;

/// Windows of one workspace that live outside its tree.
#[derive(Serialize, Deserialize, Default, Debug)]
pub(crate) struct FloatingManager {
    floating_windows: BTreeSet<Handle>,
    /// Tracked but never positioned.
    unmanaged_windows: BTreeSet<Handle>,
}

impl FloatingManager {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn is_floating(&self, handle: Handle) -> bool {
        self.floating_windows.contains(&handle)
    }

    pub(crate) fn is_unmanaged(&self, handle: Handle) -> bool {
        self.unmanaged_windows.contains(&handle)
    }

    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.is_floating(handle) || self.is_unmanaged(handle)
    }

    pub(crate) fn add_floating(&mut self, handle: Handle) {
        self.unmanaged_windows.remove(&handle);
        self.floating_windows.insert(handle);
    }

    pub(crate) fn add_unmanaged(&mut self, handle: Handle) {
        self.floating_windows.remove(&handle);
        self.unmanaged_windows.insert(handle);
    }

    /// Forgets `handle`. Returns whether it was tracked here.
    pub(crate) fn remove(&mut self, handle: Handle) -> bool {
        self.floating_windows.remove(&handle) | self.unmanaged_windows.remove(&handle)
    }

    pub(crate) fn floating(&self) -> impl Iterator<Item = Handle> + '_ {
        self.floating_windows.iter().copied()
    }

    /// Floating windows centered in `area` at the configured size.
    pub(crate) fn placements(&self, area: Rect, size: &FloatingSettings) -> Vec<Placement> {
        let rect = area.centered(size.width, size.height);
        self.floating().map(|handle| Placement { handle, rect, grow_factor: 1.0 }).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(id: isize) -> Handle { Handle(id) }

    #[test]
    fn test_floating_manager_is_floating() {
        let mut manager = FloatingManager::new();
        assert!(!manager.is_floating(h(1)));

        manager.add_floating(h(1));
        assert!(manager.is_floating(h(1)));
        assert!(!manager.is_floating(h(2)));
    }

    #[test]
    fn test_floating_and_unmanaged_are_exclusive() {
        let mut manager = FloatingManager::new();
        manager.add_floating(h(1));
        manager.add_unmanaged(h(1));
        assert!(!manager.is_floating(h(1)));
        assert!(manager.is_unmanaged(h(1)));
        assert!(manager.contains(h(1)));
    }

    #[test]
    fn test_remove_reports_whether_tracked() {
        let mut manager = FloatingManager::new();
        manager.add_floating(h(1));
        manager.add_unmanaged(h(2));

        assert!(manager.remove(h(1)));
        assert!(manager.remove(h(2)));
        assert!(!manager.contains(h(1)));
        assert!(!manager.remove(h(1)));
    }

    #[test]
    fn test_placements_are_centered_and_skip_unmanaged() {
        let mut manager = FloatingManager::new();
        manager.add_floating(h(1));
        manager.add_unmanaged(h(2));
        let size = FloatingSettings { width: 400, height: 300 };
        let placements = manager.placements(Rect::from_size(0, 0, 1000, 800), &size);
        assert_eq!(placements, vec![Placement {
            handle: h(1),
            rect: Rect::from_size(300, 250, 400, 300),
            grow_factor: 1.0,
        }]);
    }
}
