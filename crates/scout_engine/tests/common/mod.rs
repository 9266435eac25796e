#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use scout_core::{AdFlag, ExtractedPost, Record};
use scout_engine::{
    EventSink, ExtractError, ExtractorGateway, PipelineEvent, ProgressError, ProgressStore,
    RecordStore, SearchError, SearchProvider, StoreError,
};
use tokio::sync::Notify;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn post(url: &str) -> ExtractedPost {
    ExtractedPost {
        post_url: url.to_string(),
        writer: "writer".to_string(),
        published_date: "2024. 1. 2. 10:00".to_string(),
        title: format!("title of {url}"),
        content: "body".to_string(),
        tags: vec!["food".to_string()],
        sympathy_count: 3,
        ad_image_urls: Vec::new(),
        ad_flag: AdFlag::Absent,
    }
}

pub fn record(url: &str, label: &str) -> Record {
    Record::new(post(url), label)
}

/// Search that answers from a fixed Query -> URLs table.
#[derive(Default)]
pub struct ScriptedSearch {
    results: HashMap<String, Vec<String>>,
    failing: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, urls: &[&str]) -> Self {
        self.results.insert(
            query.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    pub fn failing_for(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>, SearchError> {
        self.calls.lock().unwrap().push(query.to_string());
        if self.failing.iter().any(|q| q == query) {
            return Err(SearchError::Unavailable("scripted outage".to_string()));
        }
        let mut urls = self.results.get(query).cloned().unwrap_or_default();
        urls.truncate(max_results);
        Ok(urls)
    }
}

/// Gateway whose per-URL answers are scripted as a sequence of results.
/// URLs without a script extract successfully.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, VecDeque<Result<ExtractedPost, ExtractError>>>>,
    attempts: Mutex<HashMap<String, u32>>,
    resets: AtomicUsize,
    /// When set, every extraction waits here until released.
    gate: Option<Arc<Notify>>,
    /// Notified whenever an extraction starts.
    started: Arc<Notify>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, url: &str, results: Vec<Result<ExtractedPost, ExtractError>>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), results.into());
        self
    }

    pub fn always_failing(self, url: &str, err: ExtractError, times: usize) -> Self {
        let results = (0..times).map(|_| Err(err.clone())).collect();
        self.script(url, results)
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn started(&self) -> Arc<Notify> {
        self.started.clone()
    }

    pub fn attempts(&self, url: &str) -> u32 {
        self.attempts.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ExtractorGateway for ScriptedGateway {
    async fn extract(&self, url: &str) -> Result<ExtractedPost, ExtractError> {
        *self.attempts.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(url)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| Ok(post(url)))
    }

    async fn reset_resource(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory store recording every upsert call; can be told to fail.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    rows: Mutex<HashMap<String, Record>>,
    fail_labels: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, label: &str) {
        self.fail_labels.lock().unwrap().push(label.to_string());
    }

    /// `(group_label, post_urls)` per upsert call, in call order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

impl RecordStore for RecordingStore {
    fn upsert_batch(&self, records: &[Record], group_label: &str) -> Result<usize, StoreError> {
        if self.fail_labels.lock().unwrap().iter().any(|l| l == group_label) {
            return Err(StoreError::Worker(format!("refusing '{group_label}'")));
        }
        self.calls.lock().unwrap().push((
            group_label.to_string(),
            records.iter().map(|r| r.post_url.clone()).collect(),
        ));
        let mut rows = self.rows.lock().unwrap();
        for record in records {
            let mut stored = record.clone();
            stored.group_label = group_label.to_string();
            rows.insert(stored.post_url.clone(), stored);
        }
        Ok(records.len())
    }
}

/// Progress store whose disk "fills up": the first `good_saves` saves land,
/// every later one fails. Loads return the last cursor that landed.
pub struct FlakyProgressStore {
    saved: Mutex<usize>,
    good_saves: AtomicUsize,
    failed_saves: AtomicUsize,
}

impl FlakyProgressStore {
    pub fn new(cursor: usize, good_saves: usize) -> Self {
        Self {
            saved: Mutex::new(cursor),
            good_saves: AtomicUsize::new(good_saves),
            failed_saves: AtomicUsize::new(0),
        }
    }

    pub fn read_only(cursor: usize) -> Self {
        Self::new(cursor, 0)
    }

    pub fn saved(&self) -> usize {
        *self.saved.lock().unwrap()
    }

    pub fn failed_saves(&self) -> usize {
        self.failed_saves.load(Ordering::SeqCst)
    }
}

impl ProgressStore for FlakyProgressStore {
    fn load_cursor(&self) -> Result<usize, ProgressError> {
        Ok(self.saved())
    }

    fn save_cursor(&self, cursor: usize) -> Result<(), ProgressError> {
        let landed = self
            .good_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !landed {
            self.failed_saves.fetch_add(1, Ordering::SeqCst);
            return Err(ProgressError::Io(io::Error::other("no space left on device")));
        }
        *self.saved.lock().unwrap() = cursor;
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn saved_cursors(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::CursorSaved { cursor } => Some(cursor),
                _ => None,
            })
            .collect()
    }

    pub fn failed_cursor_saves(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::CursorSaveFailed { cursor, .. } => Some(cursor),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
