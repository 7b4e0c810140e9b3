//! Platform and regional routing for Riot endpoints
//!
//! Summoner endpoints live on the platform host (`euw1`, `kr`, ...). Match-V5
//! and Account-V1 live on regional clusters, and the two services do not
//! share the same clustering: OCE and SEA platforms use the `sea` cluster for
//! matches but `asia` for accounts.

use serde::Serialize;
use std::fmt;

use super::RiotError;

/// Regional cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// North and South America
    Americas,
    /// Europe, Turkey, Russia and Middle East
    Europe,
    /// Korea and Japan (plus OCE/SEA for accounts)
    Asia,
    /// Oceania and South-East Asia (match history only)
    Sea,
}

impl Region {
    /// Cluster host name
    pub fn host(&self) -> &'static str {
        match self {
            Region::Americas => "americas",
            Region::Europe => "europe",
            Region::Asia => "asia",
            Region::Sea => "sea",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host())
    }
}

/// Routing for one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformRoute {
    /// Platform id, e.g. `euw1`
    pub platform: &'static str,
    /// Cluster serving Match-V5
    pub match_region: Region,
    /// Cluster serving Account-V1
    pub account_region: Region,
}

impl PlatformRoute {
    /// Base URL of the platform host
    pub fn platform_base(&self) -> String {
        format!("https://{}.api.riotgames.com", self.platform)
    }

    /// Base URL for Match-V5
    pub fn match_base(&self) -> String {
        format!("https://{}.api.riotgames.com", self.match_region.host())
    }

    /// Base URL for Account-V1
    pub fn account_base(&self) -> String {
        format!("https://{}.api.riotgames.com", self.account_region.host())
    }
}

const fn route(platform: &'static str, match_region: Region, account_region: Region) -> PlatformRoute {
    PlatformRoute {
        platform,
        match_region,
        account_region,
    }
}

/// Every supported platform
pub const PLATFORMS: [PlatformRoute; 17] = [
    route("euw1", Region::Europe, Region::Europe),
    route("eun1", Region::Europe, Region::Europe),
    route("tr1", Region::Europe, Region::Europe),
    route("ru", Region::Europe, Region::Europe),
    route("me1", Region::Europe, Region::Europe),
    route("na1", Region::Americas, Region::Americas),
    route("la1", Region::Americas, Region::Americas),
    route("la2", Region::Americas, Region::Americas),
    route("br1", Region::Americas, Region::Americas),
    route("kr", Region::Asia, Region::Asia),
    route("jp1", Region::Asia, Region::Asia),
    route("oc1", Region::Sea, Region::Asia),
    route("ph2", Region::Sea, Region::Asia),
    route("sg2", Region::Sea, Region::Asia),
    route("th2", Region::Sea, Region::Asia),
    route("tw2", Region::Sea, Region::Asia),
    route("vn2", Region::Sea, Region::Asia),
];

/// Look up a platform, case-insensitively.
pub fn lookup(platform: &str) -> Result<PlatformRoute, RiotError> {
    let wanted = platform.trim().to_ascii_lowercase();
    PLATFORMS
        .iter()
        .find(|route| route.platform == wanted)
        .copied()
        .ok_or_else(|| RiotError::UnknownPlatform(platform.to_string()))
}
