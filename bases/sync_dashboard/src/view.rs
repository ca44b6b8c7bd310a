// bases/sync_dashboard/src/view.rs
//! Filtering and sorting for the overview page

use completion_store::CompletionRecord;
use playlist_primitives::PlaylistDescriptor;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Name,
    NameDesc,
    PendingFirst,
    CompletedFirst,
}

impl SortOrder {
    /// Unknown values fall back to the default order
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("name_desc") => SortOrder::NameDesc,
            Some("pending") => SortOrder::PendingFirst,
            Some("completed") => SortOrder::CompletedFirst,
            _ => SortOrder::Name,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Name => "name",
            SortOrder::NameDesc => "name_desc",
            SortOrder::PendingFirst => "pending",
            SortOrder::CompletedFirst => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    All,
    Pending,
    Completed,
    Settings,
}

impl Tab {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("pending") => Tab::Pending,
            Some("completed") => Tab::Completed,
            Some("settings") => Tab::Settings,
            _ => Tab::All,
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Pending => "pending",
            Tab::Completed => "completed",
            Tab::Settings => "settings",
        }
    }
}

/// Query string of `GET /`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub tab: Option<String>,
}

impl ListQuery {
    pub fn search(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn sort(&self) -> SortOrder {
        SortOrder::from_param(self.sort.as_deref())
    }

    pub fn tab(&self) -> Tab {
        Tab::from_param(self.tab.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistCard {
    pub id: String,
    pub title: String,
    pub url: String,
    pub completed: bool,
}

/// Headline numbers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overview {
    pub total: usize,
    pub up_to_date: usize,
    pub pending: usize,
    /// Playlists with cached metadata in the state file
    pub cached: usize,
}

impl Overview {
    pub fn new(playlists: &[PlaylistDescriptor], record: &CompletionRecord) -> Self {
        let up_to_date = playlists
            .iter()
            .filter(|p| record.is_completed(&p.id))
            .count();
        Self {
            total: playlists.len(),
            up_to_date,
            pending: playlists.len() - up_to_date,
            cached: record.stats().total_playlists,
        }
    }

    pub fn percent_synced(&self) -> String {
        if self.total == 0 {
            return "0%".to_string();
        }
        format!("{:.1}%", self.up_to_date as f64 * 100.0 / self.total as f64)
    }
}

pub fn playlist_cards(
    playlists: &[PlaylistDescriptor],
    record: &CompletionRecord,
    query: &ListQuery,
) -> Vec<PlaylistCard> {
    let needle = query.search().to_lowercase();
    let tab = query.tab();

    let mut cards: Vec<PlaylistCard> = playlists
        .iter()
        .map(|p| PlaylistCard {
            id: p.id.to_string(),
            title: p.title.clone(),
            url: p.url.clone(),
            completed: record.is_completed(&p.id),
        })
        .filter(|card| match tab {
            Tab::Pending => !card.completed,
            Tab::Completed => card.completed,
            Tab::All | Tab::Settings => true,
        })
        .filter(|card| needle.is_empty() || card.title.to_lowercase().contains(&needle))
        .collect();

    match query.sort() {
        SortOrder::Name => cards.sort_by(|a, b| a.title.cmp(&b.title)),
        SortOrder::NameDesc => cards.sort_by(|a, b| b.title.cmp(&a.title)),
        SortOrder::PendingFirst => {
            cards.sort_by(|a, b| (a.completed, &a.title).cmp(&(b.completed, &b.title)))
        }
        SortOrder::CompletedFirst => {
            cards.sort_by(|a, b| (!a.completed, &a.title).cmp(&(!b.completed, &b.title)))
        }
    }
    cards
}
