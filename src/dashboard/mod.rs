//! Dashboard aggregation.
//!
//! Builds one [`DashboardEntry`] per page in the output tree. Each page is
//! described by the metadata embedded in it (or, failing that, by its
//! filename), joined with the matching source transcript and the optional
//! enrichment index. Sources are never re-parsed here.

mod enrichment;

pub use enrichment::{EnrichmentIndex, SESSIONS_INDEX_FILENAME};

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::discovery::{format_project_name, SourceChat, AGENT_PREFIX};
use crate::error::Result;
use crate::export::extract_page_metadata;
use crate::layout::{OutputLayout, PageFile};
use crate::model::{ChatRecord, DashboardEntry, Enrichment, PageMetadata};
use crate::util::{collapse_whitespace, to_utc, truncate_chars};

/// Maximum characters of a first prompt shown on the dashboard.
const FIRST_PROMPT_CHARS: usize = 100;

/// Joins pages, sources and enrichment into dashboard rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardAggregator;

impl DashboardAggregator {
    /// Collect one entry per chat, most recently used first.
    #[instrument(skip_all, fields(root = %layout.root().display()))]
    pub fn collect(layout: &OutputLayout, sources: &[SourceChat], enrichment: &EnrichmentIndex) -> Result<Vec<DashboardEntry>> {
        let by_identity: HashMap<&str, &SourceChat> = sources.iter().map(|s| (s.identity.as_str(), s)).collect();
        let by_hash: HashMap<&str, &SourceChat> = sources.iter().map(|s| (s.hash.as_str(), s)).collect();

        // Pages are the same chat when their embedded identity matches; the
        // hash token only stands in when a page carries no metadata. The
        // newest page wins.
        let mut latest: HashMap<String, (PageFile, Option<PageMetadata>)> = HashMap::new();
        for page in layout.scan_pages()? {
            let metadata = read_metadata(&page);
            let key = metadata
                .as_ref()
                .map_or_else(|| page.hash.clone(), |m| m.identity.clone());
            match latest.get(&key) {
                Some((existing, _)) if existing.modified >= page.modified => {
                    debug!(path = %page.path.display(), "Skipping older copy of a listed chat");
                }
                _ => {
                    latest.insert(key, (page, metadata));
                }
            }
        }

        let mut entries: Vec<DashboardEntry> = latest
            .into_values()
            .map(|(page, metadata)| {
                let source = match &metadata {
                    Some(m) => by_identity.get(m.identity.as_str()).copied(),
                    None => by_hash.get(page.hash.as_str()).copied(),
                };
                let identity = metadata
                    .as_ref()
                    .map(|m| m.identity.clone())
                    .or_else(|| source.map(|s| s.identity.clone()))
                    .unwrap_or_else(|| page.hash.clone());
                let record = ChatRecord {
                    source_path: source.map(|s| s.path.clone()),
                    output_path: page.path.clone(),
                    source_modified: source.map(|s| s.modified),
                    rendered_size: page.size,
                    category: page.category,
                    enrichment: enrichment.get(&identity).cloned(),
                };
                build_entry(layout, &page, &record, identity, metadata.as_ref(), source)
            })
            .collect();

        entries.sort_by(|a, b| {
            b.last_used
                .cmp(&a.last_used)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        debug!(entries = entries.len(), "Collected dashboard entries");
        Ok(entries)
    }
}

fn read_metadata(page: &PageFile) -> Option<PageMetadata> {
    match std::fs::read_to_string(&page.path) {
        Ok(html) => {
            let metadata = extract_page_metadata(&html);
            if metadata.is_none() {
                debug!(path = %page.path.display(), "Page has no embedded metadata, using filename");
            }
            metadata
        }
        Err(e) => {
            warn!(path = %page.path.display(), error = %e, "Cannot read page");
            None
        }
    }
}

fn build_entry(
    layout: &OutputLayout,
    page: &PageFile,
    record: &ChatRecord,
    identity: String,
    metadata: Option<&PageMetadata>,
    source: Option<&SourceChat>,
) -> DashboardEntry {
    let enrichment = record.enrichment.as_ref();
    let meta = metadata.map(|m| &m.meta);
    let stats = metadata.map(|m| &m.stats);

    let first_prompt = non_empty(meta.and_then(|m| m.first_prompt.as_deref()))
        .or_else(|| non_empty(enrichment.and_then(|e| e.first_prompt.as_deref())))
        .map(|p| truncate_chars(&collapse_whitespace(p), FIRST_PROMPT_CHARS))
        .unwrap_or_default();

    let title = non_empty(enrichment.and_then(|e| e.custom_title.as_deref()))
        .or_else(|| non_empty(meta.and_then(|m| m.custom_title.as_deref())))
        .or_else(|| non_empty(enrichment.and_then(|e| e.summary.as_deref())))
        .map_or_else(
            || {
                if first_prompt.is_empty() {
                    "Untitled".to_string()
                } else {
                    first_prompt.clone()
                }
            },
            ToString::to_string,
        );
    let name = if identity.starts_with(AGENT_PREFIX) {
        format!("[Agent] {title}")
    } else {
        title
    };

    let (project, project_full) = project_names(enrichment, meta.and_then(|m| m.cwd.as_deref()), source);

    DashboardEntry {
        hash: page.hash.clone(),
        name,
        project,
        project_full,
        category: record.category,
        created: stats.and_then(|s| s.first_timestamp).or(Some(page.started)),
        last_used: record
            .source_modified
            .map(to_utc)
            .or_else(|| stats.and_then(|s| s.last_timestamp))
            .or(Some(page.started)),
        messages: stats.map_or_else(
            || enrichment.and_then(|e| e.message_count).unwrap_or(0) as usize,
            |s| s.message_count,
        ),
        branch: non_empty(meta.and_then(|m| m.git_branch.as_deref()))
            .or_else(|| non_empty(enrichment.and_then(|e| e.git_branch.as_deref())))
            .unwrap_or_default()
            .to_string(),
        first_prompt,
        summary: non_empty(enrichment.and_then(|e| e.summary.as_deref()))
            .unwrap_or_default()
            .to_string(),
        link: layout.relative_link(&record.output_path),
        size: record.rendered_size,
        identity,
    }
}

/// Short and full project names: enrichment path, then the transcript's
/// working directory, then the encoded project directory.
fn project_names(enrichment: Option<&Enrichment>, cwd: Option<&str>, source: Option<&SourceChat>) -> (String, String) {
    let full = non_empty(enrichment.and_then(|e| e.project_path.as_deref()))
        .or_else(|| non_empty(cwd))
        .or_else(|| source.and_then(|s| non_empty(Some(s.project_dir.as_str()))));
    match full {
        Some(full) => (format_project_name(full), full.to_string()),
        None => ("Unknown".to_string(), String::new()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
