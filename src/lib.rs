//! # lol-match-exporter
//!
//! Exports a League of Legends player's match history from the Riot Games
//! API to disk: raw match (and optionally timeline) JSON plus a CSV index.
//!
//! The interesting part is the client-side traffic control in [`client`]:
//!
//! - **Dual-window rate limiting**: the personal key quota of 20 requests
//!   per second and 100 per two minutes, with a small burst allowance on
//!   the short window
//! - **Adaptive backoff**: repeated failures shrink the usable quota down to
//!   half, and a quiet minute restores it
//! - **Response cache**: bounded LRU with per-endpoint TTLs
//! - **Retries**: exponential backoff capped at 16 s, honouring `Retry-After`
//! - **Priority queue**: one background worker serving HIGH before NORMAL
//!   before LOW
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use lol_match_exporter::{ApiClient, ClientConfig, RiotApi, RiotId};
//! use lol_match_exporter::riot::pagination::MatchIdQuery;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ApiClient::new(ClientConfig::default(), "RGAPI-...")?);
//! let api = RiotApi::new(Arc::clone(&client), "euw1")?;
//!
//! let puuid = api.puuid_by_riot_id(&RiotId::parse("Caps#EUW")?).await?;
//! for match_id in api.match_ids(&puuid, &MatchIdQuery::recent(20)).await? {
//!     let match_json = api.get_match(&match_id).await?;
//!     println!("{match_id}: {}", match_json["info"]["gameMode"]);
//! }
//!
//! println!("{}", client.get_statistics());
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`client`] - Rate limiter, backoff, cache, retry executor, queue and the [`ApiClient`] façade
//! - [`riot`] - Routing table, account/match/summoner endpoints, pagination and seasons
//! - [`identifier`] - Riot ID parsing and validation (`Name#TAG`)
//! - [`output`] - Directory layout, JSON store and CSV match index
//! - [`metrics`] - Prometheus metrics
//! - [`cli`] - Command line interface

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Rate-limited Riot API client
pub mod client;

/// Riot ID parsing and validation
pub mod identifier;

/// Prometheus metrics
pub mod metrics;

/// Export output writers
pub mod output;

/// Riot API endpoints, routing and pagination
pub mod riot;

/// Graceful shutdown coordination shared across modules
pub mod shutdown;

// Re-export commonly used types
pub use client::{ApiClient, ApiRequest, ClientConfig, ClientError, ClientStatistics, Priority};
pub use identifier::RiotId;
pub use riot::{RiotApi, RiotError};
