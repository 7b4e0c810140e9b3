//! Scripted transports and fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use lol_match_exporter::client::{ApiRequest, ApiResponse, ClientConfig, Transport, TransportError};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Replays responses in order; once the script runs out every call gets
/// the fallback response.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    fallback: ApiResponse,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<ApiResponse, TransportError>>) -> Arc<Self> {
        Self::with_fallback(responses, ApiResponse::new(500, "script exhausted"))
    }

    pub fn with_fallback(
        responses: Vec<Result<ApiResponse, TransportError>>,
        fallback: ApiResponse,
    ) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every call answers `status` with `body`
    pub fn always(status: u16, body: &str) -> Arc<Self> {
        Self::with_fallback(Vec::new(), ApiResponse::new(status, body))
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Request URLs in the order they were sent
    pub fn urls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url.clone(), Instant::now()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Answers by URL: the longest registered fragment contained in the URL
/// wins. Unknown URLs get a Riot-style 404.
#[derive(Default)]
pub struct RouteTransport {
    routes: Vec<(String, ApiResponse)>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl RouteTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, fragment: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes
            .push((fragment.to_string(), ApiResponse::new(status, body)));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests whose URL contains `fragment`
    pub fn count(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl Transport for RouteTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self
            .routes
            .iter()
            .filter(|(fragment, _)| request.url.contains(fragment.as_str()))
            .max_by_key(|(fragment, _)| fragment.len())
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| {
                ApiResponse::new(404, r#"{"status":{"message":"Data not found","status_code":404}}"#)
            });
        Ok(response)
    }
}

/// Development-key quotas (20/1 s, 100/120 s)
pub fn test_config() -> ClientConfig {
    ClientConfig::default()
}

/// Minimal Match-V5 payload with `puuid` as one of two participants.
pub fn match_json(match_id: &str, puuid: &str, champion: &str, win: bool) -> Value {
    json!({
        "metadata": {"matchId": match_id, "participants": ["someone-else", puuid]},
        "info": {
            "gameStartTimestamp": 1_704_067_200_000i64,
            "gameDuration": 1800,
            "queueId": 420,
            "gameMode": "CLASSIC",
            "gameVersion": "14.1.555.5555",
            "participants": [
                {"puuid": "someone-else", "championName": "Ahri", "win": !win},
                {
                    "puuid": puuid,
                    "championName": champion,
                    "teamPosition": "MIDDLE",
                    "win": win,
                    "kills": 5,
                    "deaths": 1,
                    "assists": 7,
                    "totalMinionsKilled": 200,
                    "neutralMinionsKilled": 10,
                    "goldEarned": 12000,
                    "totalDamageDealtToChampions": 25000,
                    "visionScore": 20
                }
            ]
        }
    })
}
