//! Crawl frontier
//!
//! This module handles:
//! - FIFO ordering of `(url, depth)` pairs, so pages are visited breadth-first
//! - The visited set, marked before a fetch is attempted
//! - The queued set, so a URL is never enqueued twice
//! - The failed set, in first-failure order

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    pub url: Url,

    /// Link distance from the start URL
    pub depth: u32,
}

/// Frontier and bookkeeping for one crawl
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    failed: Vec<String>,
    failed_set: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier seeded with the start URL at depth 0
    pub fn new(start: Url) -> Self {
        let mut frontier = Self::default();
        frontier.push(start, 0);
        frontier
    }

    /// Enqueues a URL unless it was already visited or queued
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn push(&mut self, url: Url, depth: u32) -> bool {
        let key = url.as_str();
        if self.visited.contains(key) || self.queued.contains(key) {
            return false;
        }

        self.queued.insert(key.to_string());
        self.queue.push_back(QueuedUrl { url, depth });
        true
    }

    /// Removes the next URL in breadth-first order
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        self.queue.pop_front()
    }

    /// Records a URL as visited
    ///
    /// # Returns
    ///
    /// `true` if it had not been visited before
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Records a failed URL; repeated failures are kept once
    pub fn mark_failed(&mut self, url: &str) {
        if self.failed_set.insert(url.to_string()) {
            self.failed.push(url.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of URLs waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Failed URLs in the order they first failed
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn into_failed(self) -> Vec<String> {
        self.failed
    }
}
