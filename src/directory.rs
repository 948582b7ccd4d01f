use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::count::round_users;
use crate::error::DirectoryError;
use crate::room::{AnonymityMode, PublicInfo, RoomRecord};

pub const MIN_KEYWORD_LENGTH: usize = 3;
pub const MAX_KEYWORDS: usize = 5;
pub const MAX_SEARCH_RESULTS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub record: RoomRecord,
    #[serde(default)]
    pub public_info: Option<PublicInfo>,
    #[serde(default)]
    pub has_avatar: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingFilter {
    pub include_closed: bool,
    pub min_users: u32,
}

impl Default for ListingFilter {
    fn default() -> Self {
        ListingFilter {
            include_closed: false,
            min_users: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchScope {
    pub address: bool,
    pub description: bool,
    pub name: bool,
}

impl Default for SearchScope {
    fn default() -> Self {
        SearchScope {
            address: true,
            description: true,
            name: true,
        }
    }
}

impl SearchScope {
    fn is_empty(self) -> bool {
        !(self.address || self.description || self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome<'a> {
    pub no_keywords: bool,
    pub too_many_keywords: bool,
    pub too_many_results: bool,
    pub keywords: Vec<String>,
    pub results: Vec<&'a DirectoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRoom {
    pub address: String,
    pub nusers: Option<u64>,
    pub is_open: bool,
    pub name: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub anonymity_mode: Option<AnonymityMode>,
}

impl From<&DirectoryEntry> for ApiRoom {
    fn from(entry: &DirectoryEntry) -> Self {
        let info = entry.public_info.clone().unwrap_or_default();
        ApiRoom {
            address: entry.record.address.to_string(),
            nusers: entry.record.nusers_moving_average.and_then(round_users),
            is_open: entry.record.is_open,
            name: info.name,
            description: info.description,
            language: info.language,
            anonymity_mode: entry.record.anonymity_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiPage {
    pub total: usize,
    pub npages: usize,
    pub page: usize,
    pub items: Vec<ApiRoom>,
}

impl From<Page<&DirectoryEntry>> for ApiPage {
    fn from(page: Page<&DirectoryEntry>) -> Self {
        ApiPage {
            total: page.total,
            npages: page.pages,
            page: page.page,
            items: page.items.into_iter().map(ApiRoom::from).collect(),
        }
    }
}

/// Headline figures for the whole snapshot, hidden and unlisted rooms included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub nmucs: usize,
    pub npublicmucs: usize,
    pub nopenmucs: usize,
    pub nhiddenmucs: usize,
    pub nusers: u64,
    pub ndomains: usize,
}

/// Read-only snapshot of every known room.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Directory { entries }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = fs::read(path).await.map_err(|source| DirectoryError::Io {
            path: display.clone(),
            source,
        })?;
        let entries: Vec<DirectoryEntry> =
            serde_json::from_slice(&raw).map_err(|source| DirectoryError::Parse {
                path: display.clone(),
                source,
            })?;
        log::info!("loaded {} rooms from {}", entries.len(), display);
        Ok(Directory::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn statistics(&self) -> Statistics {
        let mut domains = BTreeSet::new();
        let mut stats = Statistics::default();
        for entry in &self.entries {
            stats.nmucs += 1;
            stats.npublicmucs += usize::from(entry.public_info.is_some());
            stats.nopenmucs += usize::from(entry.record.is_open);
            stats.nhiddenmucs += usize::from(entry.record.is_hidden);
            stats.nusers += entry.record.nusers.map_or(0, u64::from);
            domains.insert(entry.record.address.domain.as_str());
        }
        stats.ndomains = domains.len();
        stats
    }

    /// Publicly listed, visible rooms, busiest first.
    pub fn listing(&self, filter: ListingFilter) -> Vec<&DirectoryEntry> {
        let mut rooms: Vec<&DirectoryEntry> = self
            .entries
            .iter()
            .filter(|e| e.public_info.is_some() && !e.record.is_hidden)
            .filter(|e| filter.include_closed || e.record.is_open)
            .filter(|e| {
                filter.min_users == 0
                    || e.record
                        .nusers_moving_average
                        .is_some_and(|avg| avg > f64::from(filter.min_users))
            })
            .collect();
        rooms.sort_by(|a, b| listing_order(a, b));
        rooms
    }

    pub fn page(
        &self,
        page: usize,
        per_page: usize,
        filter: ListingFilter,
    ) -> Result<Page<&DirectoryEntry>, DirectoryError> {
        if page == 0 || per_page == 0 {
            return Err(DirectoryError::InvalidPage);
        }
        let rooms = self.listing(filter);
        let total = rooms.len();
        let pages = total.div_ceil(per_page);
        // Past-the-end offsets just yield an empty page.
        let offset = (page - 1).checked_mul(per_page).unwrap_or(usize::MAX);
        let items = rooms
            .into_iter()
            .skip(offset)
            .take(per_page)
            .collect();
        Ok(Page {
            page,
            pages,
            total,
            has_prev: page > 1,
            has_next: page < pages,
            items,
        })
    }

    pub fn search(&self, query: &str, scope: SearchScope) -> SearchOutcome<'_> {
        if scope.is_empty() {
            return SearchOutcome {
                no_keywords: true,
                ..SearchOutcome::default()
            };
        }

        let keywords = prepare_keywords(query);
        if keywords.len() > MAX_KEYWORDS {
            return SearchOutcome {
                too_many_keywords: true,
                ..SearchOutcome::default()
            };
        }
        if keywords.is_empty() {
            return SearchOutcome {
                no_keywords: true,
                ..SearchOutcome::default()
            };
        }

        let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        let filter = ListingFilter {
            include_closed: false,
            min_users: 0,
        };
        let mut results: Vec<&DirectoryEntry> = self
            .listing(filter)
            .into_iter()
            .filter(|entry| needles.iter().all(|needle| matches_keyword(entry, needle, scope)))
            .take(MAX_SEARCH_RESULTS + 1)
            .collect();

        let too_many_results = results.len() > MAX_SEARCH_RESULTS;
        results.truncate(MAX_SEARCH_RESULTS);
        log::debug!("search {:?} matched {} rooms", keywords, results.len());

        SearchOutcome {
            too_many_results,
            keywords,
            results,
            ..SearchOutcome::default()
        }
    }
}

fn listing_order(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    let by_users = match (
        a.record.nusers_moving_average,
        b.record.nusers_moving_average,
    ) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_users.then_with(|| {
        a.record
            .address
            .to_string()
            .cmp(&b.record.address.to_string())
    })
}

fn matches_keyword(entry: &DirectoryEntry, needle: &str, scope: SearchScope) -> bool {
    let contains = |haystack: Option<&str>| {
        haystack.is_some_and(|h| h.to_lowercase().contains(needle))
    };
    let info = entry.public_info.as_ref();

    (scope.address && contains(Some(&entry.record.address.to_string())))
        || (scope.description && contains(info.and_then(|i| i.description.as_deref())))
        || (scope.name && contains(info.and_then(|i| i.name.as_deref())))
}

/// Page numbers to show around `current`, each flagged when a gap precedes it.
pub fn visible_pages(current: usize, pages: usize) -> Vec<(usize, bool)> {
    if pages == 0 {
        return Vec::new();
    }
    let mut visible = BTreeSet::new();
    visible.extend(current.saturating_sub(2).max(1)..=current.saturating_add(2).min(pages));
    visible.extend(1..=pages.min(2));
    visible.extend(pages.saturating_sub(1).max(1)..=pages);

    let mut prev = 0;
    visible
        .into_iter()
        .map(|page| {
            let gap = prev + 1 != page;
            prev = page;
            (page, gap)
        })
        .collect()
}

/// Shell-style split, then drops short and repeated keywords.
pub fn prepare_keywords(query: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    split_query(query)
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| k.chars().count() >= MIN_KEYWORD_LENGTH)
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

fn split_query(query: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = query.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') => match chars.next() {
                Some(next @ ('"' | '\\')) => current.push(next),
                Some(next) => {
                    current.push('\\');
                    current.push(next);
                }
                None => current.push('\\'),
            },
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}
