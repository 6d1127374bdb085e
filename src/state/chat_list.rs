//! Conversation list with server-side search.
//!
//! DESIGN
//! ======
//! Every fetch takes a sequence number from [`ChatListState::begin_fetch`].
//! Only the response for the latest issued number is applied, so a slow
//! response for an old search term can never replace newer results.

#[cfg(test)]
#[path = "chat_list_test.rs"]
mod chat_list_test;

use crate::error::ClientError;
use crate::net::types::ChatSummary;
use crate::util::highlight::{Segment, highlight_matches};

/// A fetch to perform for the current search term.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub seq: u64,
    pub term: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatListState {
    /// Conversations in the order the backend returned them.
    pub items: Vec<ChatSummary>,
    /// Search input as typed.
    pub search_term: String,
    pub loading: bool,
    /// Inline error from the last failed fetch; previous items stay visible.
    pub error: Option<String>,
    pub selected_id: Option<String>,
    issued_seq: u64,
    pending_term: String,
    results_term: String,
}

impl ChatListState {
    pub fn set_search_term(&mut self, term: &str) {
        term.clone_into(&mut self.search_term);
    }

    /// Issue a new fetch for the current term.
    pub fn begin_fetch(&mut self) -> SearchRequest {
        self.issued_seq += 1;
        self.loading = true;
        self.pending_term = self.search_term.trim().to_owned();
        SearchRequest { seq: self.issued_seq, term: self.pending_term.clone() }
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.issued_seq
    }

    /// Apply a fetch result. Returns `false` when `seq` is stale and the
    /// result was dropped.
    pub fn apply_results(&mut self, seq: u64, result: Result<Vec<ChatSummary>, ClientError>) -> bool {
        if !self.is_latest(seq) {
            log::debug!("dropping stale chat list response seq={seq} latest={}", self.issued_seq);
            return false;
        }
        self.loading = false;
        match result {
            Ok(items) => {
                self.items = items;
                self.error = None;
                self.results_term = std::mem::take(&mut self.pending_term);
            }
            Err(e) => {
                log::warn!("chat list fetch failed: {e}");
                self.error = Some(e.user_message());
            }
        }
        true
    }

    pub fn select(&mut self, chat_id: &str) {
        self.selected_id = Some(chat_id.to_owned());
    }

    /// Term the displayed items were fetched with.
    pub fn results_term(&self) -> &str {
        &self.results_term
    }

    /// Name segments of `item` with the matched term emphasized.
    pub fn highlighted_name(&self, item: &ChatSummary) -> Vec<Segment> {
        highlight_matches(&item.name, &self.results_term)
    }
}
