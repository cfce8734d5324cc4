//! Frontier coordination for documents waiting to be crawled.

use crate::document::Document;
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt;

/// Default bounded queue depth for the frontier.
pub const DEFAULT_FRONTIER_CAPACITY: usize = 4096;

/// A document scheduled for crawling, with its distance from the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    document: Document,
    depth: u8,
}

impl CrawlTask {
    /// Creates a task for `document` at `depth` reference hops from its seed.
    pub fn new(document: Document, depth: u8) -> Self {
        Self { document, depth }
    }

    /// Document to crawl.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access, used to rewrite the path once it is located on disk.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Reference hops from the seed.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Splits the task into its document and depth.
    pub fn into_parts(self) -> (Document, u8) {
        (self.document, self.depth)
    }
}

/// Errors that can emerge while queueing documents into the frontier.
#[derive(Debug)]
pub enum FrontierError {
    /// The queue is full; the caller retains ownership of the task.
    QueueFull(CrawlTask),
    /// The document was already scheduled; duplicates are rejected.
    Duplicate(CrawlTask),
}

impl fmt::Display for FrontierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull(task) => {
                write!(f, "frontier full, dropped '{}'", task.document.file_path)
            }
            Self::Duplicate(task) => {
                write!(f, "'{}' already scheduled", task.document.file_path)
            }
        }
    }
}

impl Error for FrontierError {}

/// FIFO of pending documents that admits each `(repository, path)` once.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    seen: HashSet<(String, String)>,
    capacity: usize,
}

impl Frontier {
    /// Constructs a new, empty frontier holding at most `capacity` pending tasks.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            capacity,
        }
    }

    /// Attempts to enqueue a crawl task, returning the task on failure.
    ///
    /// A task rejected for capacity is not marked as seen, so it may be offered again.
    pub fn push_task(&mut self, task: CrawlTask) -> Result<(), FrontierError> {
        let key = (
            task.document.repository_url.clone(),
            task.document.file_path.clone(),
        );
        if self.seen.contains(&key) {
            return Err(FrontierError::Duplicate(task));
        }
        if self.queue.len() >= self.capacity {
            return Err(FrontierError::QueueFull(task));
        }

        crate::debug_log!("frontier: scheduling {} at depth {}", key.1, task.depth);
        self.seen.insert(key);
        self.queue.push_back(task);
        Ok(())
    }

    /// Pops the oldest pending task.
    pub fn next_task(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }
}
