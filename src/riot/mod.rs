//! Riot Games API endpoints used by the exporter
//!
//! [`RiotApi`] binds an [`ApiClient`] to one platform and exposes the
//! account, match, summoner, league and mastery calls with their routing,
//! pagination and optional-data semantics.

pub mod pagination;
pub mod routing;
pub mod season;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{ApiClient, ApiRequest, ClientError, Priority};
use crate::identifier::RiotId;
use pagination::{collect_match_ids, MatchIdQuery};
use routing::PlatformRoute;

/// Riot API errors
#[derive(Debug, thiserror::Error)]
pub enum RiotError {
    /// Request failed in the client
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Platform id not in the routing table
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    /// Season without known bounds
    #[error("unknown season: {0}")]
    UnknownSeason(i32),

    /// Expected field absent from a response
    #[error("response is missing field `{0}`")]
    MissingField(&'static str),

    /// Response JSON did not have the expected shape
    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),

    /// Listing did not terminate
    #[error("pagination stopped after {0} pages")]
    PaginationLimit(usize),
}

impl RiotError {
    /// Whether the API answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, RiotError::Client(err) if err.status() == Some(404))
    }
}

/// Result type for Riot API operations
pub type RiotResult<T> = Result<T, RiotError>;

/// Queue type of ranked solo/duo
pub const RANKED_SOLO: &str = "RANKED_SOLO_5x5";

/// Queue type of ranked flex
pub const RANKED_FLEX: &str = "RANKED_FLEX_SR";

/// One ranked queue standing from League-V4
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankedEntry {
    /// e.g. `RANKED_SOLO_5x5`
    pub queue_type: String,
    /// e.g. `GOLD`
    pub tier: String,
    /// Division, `I` to `IV`
    pub rank: String,
    /// League points
    pub league_points: i32,
    /// Ranked wins this split
    pub wins: u32,
    /// Ranked losses this split
    pub losses: u32,
}

impl RankedEntry {
    /// Short queue label used in summaries
    pub fn queue_label(&self) -> &str {
        match self.queue_type.as_str() {
            RANKED_SOLO => "Solo/Duo",
            RANKED_FLEX => "Flex",
            other => other,
        }
    }
}

impl fmt::Display for RankedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {} {} LP ({}W {}L)",
            self.queue_label(),
            self.tier,
            self.rank,
            self.league_points,
            self.wins,
            self.losses
        )
    }
}

/// Riot API bound to one platform.
#[derive(Debug, Clone)]
pub struct RiotApi {
    client: Arc<ApiClient>,
    route: PlatformRoute,
}

impl RiotApi {
    /// Bind `client` to `platform` (e.g. `euw1`).
    pub fn new(client: Arc<ApiClient>, platform: &str) -> RiotResult<Self> {
        let route = routing::lookup(platform)?;
        Ok(Self { client, route })
    }

    /// Routing in use
    pub fn route(&self) -> PlatformRoute {
        self.route
    }

    /// Underlying client
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Resolve a Riot ID to its PUUID via Account-V1.
    pub async fn puuid_by_riot_id(&self, riot_id: &RiotId) -> RiotResult<String> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.route.account_base(),
            urlencoding::encode(riot_id.game_name()),
            urlencoding::encode(riot_id.tag_line())
        );
        let account = self
            .client
            .submit(ApiRequest::get(url).with_priority(Priority::High))
            .await?;

        let puuid = account
            .get("puuid")
            .and_then(Value::as_str)
            .ok_or(RiotError::MissingField("puuid"))?;
        info!(%riot_id, "Resolved Riot ID");
        Ok(puuid.to_string())
    }

    /// List match ids for `puuid`, newest first.
    pub async fn match_ids(&self, puuid: &str, query: &MatchIdQuery) -> RiotResult<Vec<String>> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids",
            self.route.match_base(),
            urlencoding::encode(puuid)
        );
        let client = &self.client;

        collect_match_ids(query, |page| {
            let mut request = ApiRequest::get(url.clone());
            request.params = page.params();
            async move {
                let value = client.submit(request).await?;
                serde_json::from_value::<Vec<String>>(value)
                    .map_err(|e| RiotError::UnexpectedResponse(format!("match id list: {e}")))
            }
        })
        .await
    }

    /// List match ids for one season, walking it in 30-day segments.
    ///
    /// `per_segment` caps the ids requested per segment.
    pub async fn match_ids_by_season(
        &self,
        puuid: &str,
        season_year: i32,
        queues: &[u16],
        per_segment: u32,
    ) -> RiotResult<Vec<String>> {
        let (start, end) =
            season::season_bounds(season_year).ok_or(RiotError::UnknownSeason(season_year))?;
        let segments = season::segment_time_range(start, end, season::MAX_SEGMENT_DAYS);
        debug!(season = season_year, segments = segments.len(), "Listing season");

        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        for (segment_start, segment_end) in segments {
            let query = MatchIdQuery::recent(per_segment)
                .with_queues(queues.iter().copied())
                .with_time_range(Some(segment_start), Some(segment_end));
            for id in self.match_ids(puuid, &query).await? {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    fn match_url(&self, match_id: &str) -> String {
        format!(
            "{}/lol/match/v5/matches/{}",
            self.route.match_base(),
            urlencoding::encode(match_id)
        )
    }

    /// Full match data
    pub async fn get_match(&self, match_id: &str) -> RiotResult<Value> {
        Ok(self.client.submit(ApiRequest::get(self.match_url(match_id))).await?)
    }

    /// Match timeline, or `None` if it cannot be fetched.
    pub async fn get_timeline(&self, match_id: &str) -> Option<Value> {
        let url = format!("{}/timeline", self.match_url(match_id));
        match self.client.submit(ApiRequest::get(url)).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(match_id, error = %e, "Timeline unavailable");
                None
            }
        }
    }

    /// Summoner-V4 profile, or `None` if it cannot be fetched.
    pub async fn summoner_profile(&self, puuid: &str) -> Option<Value> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/by-puuid/{}",
            self.route.platform_base(),
            urlencoding::encode(puuid)
        );
        self.fetch_optional(url, "Summoner profile").await
    }

    /// League-V4 ranked standings, or `None` if they cannot be fetched.
    ///
    /// An unranked player yields `Some` with no entries.
    pub async fn league_entries(&self, puuid: &str) -> Option<Vec<RankedEntry>> {
        let url = format!(
            "{}/lol/league/v4/entries/by-puuid/{}",
            self.route.platform_base(),
            urlencoding::encode(puuid)
        );
        let value = self.fetch_optional(url, "League entries").await?;
        match serde_json::from_value(value) {
            Ok(entries) => Some(entries),
            Err(e) => {
                debug!(error = %e, "League entries had an unexpected shape");
                None
            }
        }
    }

    /// Champion-Mastery-V4 entries, or `None` if they cannot be fetched.
    pub async fn champion_mastery(&self, puuid: &str) -> Option<Value> {
        let url = format!(
            "{}/lol/champion-mastery/v4/champion-masteries/by-puuid/{}",
            self.route.platform_base(),
            urlencoding::encode(puuid)
        );
        self.fetch_optional(url, "Champion mastery").await
    }

    async fn fetch_optional(&self, url: String, what: &'static str) -> Option<Value> {
        match self.client.submit(ApiRequest::get(url)).await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(what, error = %e, "Optional data unavailable");
                None
            }
        }
    }

    /// Queue LOW priority fetches for `match_ids` so later
    /// [`get_match`](Self::get_match) calls hit the cache.
    ///
    /// Returns how many were queued.
    pub fn prefetch_matches(&self, match_ids: &[String]) -> usize {
        match_ids
            .iter()
            .filter_map(|id| {
                self.client
                    .enqueue(ApiRequest::get(self.match_url(id)).with_priority(Priority::Low))
                    .ok()
            })
            .count()
    }
}
