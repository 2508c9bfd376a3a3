//! Remote Lister — paginated listing with name filtering
//!
//! Walks the remote listing one page at a time, applies the compiled filter
//! to each candidate's display name, and accumulates matches into a
//! [`MatchSet`]. Listing is strictly sequential; the match set is only
//! mutated here, before the concurrent download phase begins.

use crate::drive::FileStore;
use crate::error::{Error, Result};
use crate::types::MatchSet;
use regex::Regex;

/// Accumulate every remote file whose display name matches `filter`
///
/// Pages are fetched with the provider's cursor pagination until no
/// continuation token remains. Identifiers are preserved verbatim.
///
/// A page with zero candidates fails the whole listing with
/// [`Error::NoFilesFound`] — even a first or trailing empty page, and even if
/// earlier pages already produced matches. Deliberately carried over from the
/// tool's original behavior; see DESIGN.md before changing it.
pub async fn list_matching(store: &dyn FileStore, filter: &Regex) -> Result<MatchSet> {
    let mut matches = MatchSet::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = store.list_page(page_token.as_deref()).await?;
        if page.files.is_empty() {
            return Err(Error::NoFilesFound);
        }

        for file in &page.files {
            if filter.is_match(&file.name) {
                matches.insert(&file.id, &file.name);
            }
        }
        tracing::debug!(
            candidates = page.files.len(),
            matched = matches.len(),
            "processed listing page"
        );

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    tracing::info!(matched = matches.len(), "listing complete");
    Ok(matches)
}
