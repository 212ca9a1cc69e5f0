//! Static partition source: every franchise, for every configured season

use super::PartitionSource;
use crate::error::FetchError;
use crate::types::{Partition, PartitionKey, TeamId};

/// (team id, full name, abbreviation), in upstream id order
pub const TEAMS: [(TeamId, &str, &str); 30] = [
    (1610612737, "Atlanta Hawks", "ATL"),
    (1610612738, "Boston Celtics", "BOS"),
    (1610612739, "Cleveland Cavaliers", "CLE"),
    (1610612740, "New Orleans Pelicans", "NOP"),
    (1610612741, "Chicago Bulls", "CHI"),
    (1610612742, "Dallas Mavericks", "DAL"),
    (1610612743, "Denver Nuggets", "DEN"),
    (1610612744, "Golden State Warriors", "GSW"),
    (1610612745, "Houston Rockets", "HOU"),
    (1610612746, "Los Angeles Clippers", "LAC"),
    (1610612747, "Los Angeles Lakers", "LAL"),
    (1610612748, "Miami Heat", "MIA"),
    (1610612749, "Milwaukee Bucks", "MIL"),
    (1610612750, "Minnesota Timberwolves", "MIN"),
    (1610612751, "Brooklyn Nets", "BKN"),
    (1610612752, "New York Knicks", "NYK"),
    (1610612753, "Orlando Magic", "ORL"),
    (1610612754, "Indiana Pacers", "IND"),
    (1610612755, "Philadelphia 76ers", "PHI"),
    (1610612756, "Phoenix Suns", "PHX"),
    (1610612757, "Portland Trail Blazers", "POR"),
    (1610612758, "Sacramento Kings", "SAC"),
    (1610612759, "San Antonio Spurs", "SAS"),
    (1610612760, "Oklahoma City Thunder", "OKC"),
    (1610612761, "Toronto Raptors", "TOR"),
    (1610612762, "Utah Jazz", "UTA"),
    (1610612763, "Memphis Grizzlies", "MEM"),
    (1610612764, "Washington Wizards", "WAS"),
    (1610612765, "Detroit Pistons", "DET"),
    (1610612766, "Charlotte Hornets", "CHA"),
];

/// Regular-season id for a season label: "2023-24" → "22023"
///
/// The second half must be the following year's last two digits.
pub fn regular_season_id(label: &str) -> Option<String> {
    let (start, end) = label.trim().split_once('-')?;
    if start.len() != 4 || end.len() != 2 {
        return None;
    }
    let start_year: u32 = start.parse().ok()?;
    let end_year: u32 = end.parse().ok()?;
    if (start_year + 1) % 100 != end_year {
        return None;
    }
    Some(format!("2{}", start_year))
}

/// Teams × seasons, season-major
#[derive(Debug, Clone)]
pub struct StaticPartitionSource {
    seasons: Vec<String>,
}

impl StaticPartitionSource {
    pub fn new(seasons: Vec<String>) -> Self {
        Self { seasons }
    }

    pub fn partitions(&self) -> Vec<Partition> {
        let mut partitions = Vec::with_capacity(self.seasons.len() * TEAMS.len());

        for season in &self.seasons {
            let Some(season_id) = regular_season_id(season) else {
                tracing::warn!(season = %season, "Unrecognized season label, skipping");
                continue;
            };

            for (team_id, team_name, abbreviation) in TEAMS {
                partitions.push(Partition {
                    key: PartitionKey::new(season.clone(), abbreviation),
                    season_id: season_id.clone(),
                    team_id,
                    team_name: team_name.to_string(),
                });
            }
        }

        partitions
    }
}

#[async_trait::async_trait]
impl PartitionSource for StaticPartitionSource {
    async fn list_partitions(&self) -> Result<Vec<Partition>, FetchError> {
        Ok(self.partitions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_season_id() {
        assert_eq!(regular_season_id("2023-24").as_deref(), Some("22023"));
        assert_eq!(regular_season_id("1999-00").as_deref(), Some("21999"));
        assert_eq!(regular_season_id("2023-25"), None);
        assert_eq!(regular_season_id("2023"), None);
        assert_eq!(regular_season_id("23-24"), None);
    }

    #[test]
    fn test_partitions_are_season_major() {
        let source = StaticPartitionSource::new(vec!["2023-24".to_string(), "2024-25".to_string()]);
        let partitions = source.partitions();

        assert_eq!(partitions.len(), 60);
        assert_eq!(partitions[0].key, PartitionKey::new("2023-24", "ATL"));
        assert_eq!(partitions[0].season_id, "22023");
        assert_eq!(partitions[29].key, PartitionKey::new("2023-24", "CHA"));
        assert_eq!(partitions[30].key, PartitionKey::new("2024-25", "ATL"));
        assert_eq!(partitions[30].season_id, "22024");
    }

    #[test]
    fn test_bad_season_skipped() {
        let source = StaticPartitionSource::new(vec!["next year".to_string(), "2024-25".to_string()]);
        let partitions = source.partitions();
        assert_eq!(partitions.len(), 30);
        assert!(partitions.iter().all(|p| p.key.season == "2024-25"));
    }

    #[test]
    fn test_team_ids_unique() {
        let mut ids: Vec<_> = TEAMS.iter().map(|t| t.0).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 30);
    }
}
