//! Test doubles for the model and the external services.

use crate::clients::{Coordinates, Geocoder, SearchBackend, SearchHit, WeatherReading, WeatherService};
use crate::error::{Result, SporError};
use crate::llm::{ChatModel, Completion, CompletionRequest, ToolCall};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

pub fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

/// Replays canned completions and records every request.
/// Errors once the script runs out.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Completion>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Completion>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SporError::OpenAI("script exhausted".to_string()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Knows a fixed set of places.
pub struct FakeGeocoder {
    places: HashMap<String, Coordinates>,
    fail: bool,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        let mut places = HashMap::new();
        places.insert(
            "oslo".to_string(),
            Coordinates {
                latitude: 59.9133,
                longitude: 10.7389,
                display_name: Some("Oslo, Norway".to_string()),
            },
        );
        Self { places, fail: false }
    }

    pub fn failing() -> Self {
        Self {
            places: HashMap::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn locate(&self, place: &str) -> Result<Option<Coordinates>> {
        if self.fail {
            return Err(SporError::Geocoding("connection refused".to_string()));
        }
        Ok(self.places.get(&place.to_lowercase()).cloned())
    }
}

/// Always reports the same reading and counts requests.
pub struct FakeWeather {
    reading: WeatherReading,
    calls: Mutex<usize>,
}

impl FakeWeather {
    pub fn new(reading: WeatherReading) -> Self {
        Self {
            reading,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl WeatherService for FakeWeather {
    async fn current(&self, _coordinates: &Coordinates) -> Result<WeatherReading> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.reading.clone())
    }
}

/// Returns one hit per query, failing for configured queries.
pub struct FakeSearch {
    failing: HashSet<String>,
    calls: Mutex<Vec<(String, usize)>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.insert(query.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(q, _)| q.clone()).collect()
    }

    pub fn max_results_seen(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(_, n)| *n).collect()
    }
}

#[async_trait]
impl SearchBackend for FakeSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));

        if self.failing.contains(query) {
            return Err(SporError::Search(format!("upstream error for '{}'", query)));
        }

        Ok(vec![SearchHit {
            title: format!("About {}", query),
            content: format!("Findings for {}.", query),
            url: format!("https://example.com/{}", query.replace(' ', "-")),
        }])
    }
}
