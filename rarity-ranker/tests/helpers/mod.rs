//! Shared test helpers: scripted metadata sources

use rarity_ranker::models::Attributes;
use rarity_ranker::services::MetadataSource;
use rarity_ranker::FetchError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Build attributes from (category, value) pairs
pub fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(c, v)| (c.to_string(), v.to_string()))
        .collect()
}

/// Scripted behaviour for one index
#[derive(Clone)]
pub enum Scripted {
    Ok(Attributes),
    Fail,
    /// Never answers within any reasonable timeout
    Hang,
}

/// In-memory source answering from a script, with optional per-index delay
#[derive(Default)]
pub struct StubSource {
    script: HashMap<usize, Scripted>,
    delays: HashMap<usize, Duration>,
    calls: AtomicUsize,
    seen_locations: Mutex<Vec<String>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(mut self, index: usize, pairs: &[(&str, &str)]) -> Self {
        self.script.insert(index, Scripted::Ok(attrs(pairs)));
        self
    }

    pub fn fail(mut self, index: usize) -> Self {
        self.script.insert(index, Scripted::Fail);
        self
    }

    pub fn hang(mut self, index: usize) -> Self {
        self.script.insert(index, Scripted::Hang);
        self
    }

    pub fn delay(mut self, index: usize, delay: Duration) -> Self {
        self.delays.insert(index, delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_locations(&self) -> Vec<String> {
        self.seen_locations.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MetadataSource for StubSource {
    async fn fetch(&self, base_location: &str, index: usize) -> Result<Attributes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_locations
            .lock()
            .unwrap()
            .push(base_location.to_string());

        if let Some(delay) = self.delays.get(&index) {
            tokio::time::sleep(*delay).await;
        }

        match self.script.get(&index) {
            Some(Scripted::Ok(attributes)) => Ok(attributes.clone()),
            Some(Scripted::Fail) => Err(FetchError::Transport(format!("scripted failure for {}", index))),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Transport("hang ended".to_string()))
            }
            None => Err(FetchError::Response(format!("HTTP 404 for {}", index))),
        }
    }
}

/// Source recording how many fetches run at the same time
pub struct GaugeSource {
    hold: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl GaugeSource {
    /// Every fetch succeeds after `hold`
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataSource for GaugeSource {
    async fn fetch(&self, _base_location: &str, index: usize) -> Result<Attributes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.hold).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let value = if index % 2 == 0 { "even" } else { "odd" };
        Ok(attrs(&[("parity", value)]))
    }
}
