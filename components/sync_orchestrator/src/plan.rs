use completion_store::CompletionStore;
use playlist_primitives::PlaylistDescriptor;
use serde::Serialize;

/// Resolved playlists split by completion state, both in resolution order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncPlan {
    pub completed: Vec<PlaylistDescriptor>,
    pub pending: Vec<PlaylistDescriptor>,
}

impl SyncPlan {
    pub fn new(playlists: Vec<PlaylistDescriptor>, store: &CompletionStore) -> Self {
        let (completed, pending) = playlists
            .into_iter()
            .partition(|playlist| store.is_completed(&playlist.id));
        Self { completed, pending }
    }

    /// A plan that runs `descriptor` whatever its completion state
    pub fn forced(descriptor: PlaylistDescriptor) -> Self {
        Self {
            completed: Vec::new(),
            pending: vec![descriptor],
        }
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playlist_primitives::PlaylistId;

    #[test]
    fn partitions_keeping_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CompletionStore::load(dir.path().join("state.json"));
        store.mark_completed(&PlaylistId::from("b")).unwrap();

        let playlists = ["a", "b", "c"]
            .map(|id| PlaylistDescriptor::new(id, id.to_uppercase(), "u"))
            .to_vec();
        let plan = SyncPlan::new(playlists, &store);

        let ids = |list: &[PlaylistDescriptor]| {
            list.iter().map(|p| p.id.to_string()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&plan.completed), vec!["b"]);
        assert_eq!(ids(&plan.pending), vec!["a", "c"]);
        assert_eq!(plan.total(), 3);
    }
}
