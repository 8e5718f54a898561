//! Rating histories indexed by player and by (player, surface)

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::RatingTimeline;
use crate::RatingObservation;

static EMPTY_TIMELINE: RatingTimeline = RatingTimeline::empty();

/// Timelines keyed by player name
pub type OverallIndex = HashMap<String, RatingTimeline>;

/// Timelines keyed by player name, then surface tag
pub type SurfaceIndex = HashMap<String, HashMap<String, RatingTimeline>>;

/// Read-only store of every rating timeline
///
/// Built once from raw observations; lookups for unknown keys return an
/// empty timeline rather than failing.
#[derive(Debug, Clone, Default)]
pub struct RatingStore {
    overall: OverallIndex,
    by_surface: SurfaceIndex,
}

impl RatingStore {
    /// Build a store from overall and surface-tagged observations
    pub fn new<O, S>(overall: O, by_surface: S) -> Self
    where
        O: IntoIterator<Item = RatingObservation>,
        S: IntoIterator<Item = RatingObservation>,
    {
        let store = RatingStore {
            overall: Self::build_overall(overall),
            by_surface: Self::build_by_surface(by_surface),
        };
        log::info!(
            "Rating store: {} players, {} surface timelines, {} observations",
            store.overall.len(),
            store.surface_timeline_count(),
            store.observation_count()
        );
        store
    }

    /// Build a store from a mixed list, routing rows by their surface tag
    pub fn from_observations<I>(observations: I) -> Self
    where
        I: IntoIterator<Item = RatingObservation>,
    {
        let (by_surface, overall): (Vec<_>, Vec<_>) = observations
            .into_iter()
            .partition(|obs| obs.surface.is_some());
        Self::new(overall, by_surface)
    }

    /// Group observations by player and sort each group once
    ///
    /// Any surface tag on the rows is ignored.
    pub fn build_overall<I>(observations: I) -> OverallIndex
    where
        I: IntoIterator<Item = RatingObservation>,
    {
        let mut grouped: HashMap<String, Vec<(NaiveDateTime, f32)>> = HashMap::new();
        for obs in observations {
            grouped
                .entry(obs.player)
                .or_default()
                .push((obs.recorded_at, obs.rating));
        }

        grouped
            .into_iter()
            .map(|(player, entries)| (player, RatingTimeline::from_unsorted(entries)))
            .collect()
    }

    /// Group surface-tagged observations by (player, surface) and sort each group once
    ///
    /// Rows without a surface tag cannot be placed and are skipped.
    pub fn build_by_surface<I>(observations: I) -> SurfaceIndex
    where
        I: IntoIterator<Item = RatingObservation>,
    {
        let mut grouped: HashMap<String, HashMap<String, Vec<(NaiveDateTime, f32)>>> = HashMap::new();
        let mut skipped = 0usize;
        for obs in observations {
            let Some(surface) = obs.surface else {
                skipped += 1;
                continue;
            };
            grouped
                .entry(obs.player)
                .or_default()
                .entry(surface)
                .or_default()
                .push((obs.recorded_at, obs.rating));
        }
        if skipped > 0 {
            log::debug!("Skipped {} surface rows without a surface tag", skipped);
        }

        grouped
            .into_iter()
            .map(|(player, surfaces)| {
                let timelines = surfaces
                    .into_iter()
                    .map(|(surface, entries)| (surface, RatingTimeline::from_unsorted(entries)))
                    .collect();
                (player, timelines)
            })
            .collect()
    }

    /// Overall timeline for a player (empty if unknown)
    pub fn overall(&self, player: &str) -> &RatingTimeline {
        self.overall.get(player).unwrap_or(&EMPTY_TIMELINE)
    }

    /// Surface timeline for a player (empty if unknown)
    pub fn surface(&self, player: &str, surface: &str) -> &RatingTimeline {
        self.by_surface
            .get(player)
            .and_then(|surfaces| surfaces.get(surface))
            .unwrap_or(&EMPTY_TIMELINE)
    }

    /// Whether a player has any overall history
    pub fn contains_player(&self, player: &str) -> bool {
        self.overall.contains_key(player)
    }

    /// Sorted player names from the overall history
    pub fn players(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.overall.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sorted players whose name contains `text`, ignoring case
    pub fn search_players(&self, text: &str) -> Vec<&str> {
        let needle = text.to_lowercase();
        self.players()
            .into_iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn player_count(&self) -> usize {
        self.overall.len()
    }

    pub fn surface_timeline_count(&self) -> usize {
        self.by_surface.values().map(HashMap::len).sum()
    }

    pub fn observation_count(&self) -> usize {
        let overall: usize = self.overall.values().map(RatingTimeline::len).sum();
        let surface: usize = self
            .by_surface
            .values()
            .flat_map(HashMap::values)
            .map(RatingTimeline::len)
            .sum();
        overall + surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_RATING;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_store() -> RatingStore {
        RatingStore::new(
            vec![
                RatingObservation::overall("Nadal", date(2021, 1, 1), 2100.0),
                RatingObservation::overall("Federer", date(2020, 1, 1), 2000.0),
                RatingObservation::overall("Nadal", date(2020, 1, 1), 2050.0),
            ],
            vec![
                RatingObservation::on_surface("Nadal", "Clay", date(2020, 1, 1), 2300.0),
                RatingObservation::on_surface("Nadal", "Grass", date(2020, 1, 1), 1900.0),
                RatingObservation::on_surface("Federer", "Grass", date(2020, 1, 1), 2200.0),
            ],
        )
    }

    #[test]
    fn test_overall_grouped_and_sorted() {
        let store = sample_store();
        let nadal = store.overall("Nadal");
        assert_eq!(nadal.len(), 2);
        assert_eq!(nadal.latest_rating_at(date(2020, 6, 1)), 2050.0);
        assert_eq!(nadal.latest_rating_at(date(2021, 6, 1)), 2100.0);
    }

    #[test]
    fn test_surface_lookup() {
        let store = sample_store();
        assert_eq!(
            store.surface("Nadal", "Clay").latest_rating_at(date(2021, 1, 1)),
            2300.0
        );
        assert_eq!(
            store.surface("Federer", "Grass").latest_rating_at(date(2021, 1, 1)),
            2200.0
        );
    }

    #[test]
    fn test_unknown_keys_are_empty() {
        let store = sample_store();
        assert!(store.overall("Nobody").is_empty());
        assert!(store.surface("Federer", "Clay").is_empty());
        assert!(store.surface("Nadal", "Indoor").is_empty());
        assert_eq!(
            store.overall("Nobody").latest_rating_at(date(2020, 1, 1)),
            DEFAULT_RATING
        );
    }

    #[test]
    fn test_from_observations_routes_by_tag() {
        let store = RatingStore::from_observations(vec![
            RatingObservation::overall("A", date(2020, 1, 1), 1600.0),
            RatingObservation::on_surface("A", "Hard", date(2020, 1, 1), 1650.0),
        ]);
        assert_eq!(store.overall("A").len(), 1);
        assert_eq!(store.surface("A", "Hard").len(), 1);
        assert_eq!(store.observation_count(), 2);
    }

    #[test]
    fn test_untagged_rows_skipped_for_surface_index() {
        let index = RatingStore::build_by_surface(vec![
            RatingObservation::overall("A", date(2020, 1, 1), 1600.0),
            RatingObservation::on_surface("A", "Clay", date(2020, 1, 1), 1700.0),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index["A"].len(), 1);
    }

    #[test]
    fn test_counts() {
        let store = sample_store();
        assert_eq!(store.player_count(), 2);
        assert_eq!(store.surface_timeline_count(), 3);
        assert_eq!(store.observation_count(), 6);
        assert!(store.contains_player("Nadal"));
        assert!(!store.contains_player("nadal"));
    }

    #[test]
    fn test_players_sorted_and_searchable() {
        let store = sample_store();
        assert_eq!(store.players(), vec!["Federer", "Nadal"]);
        assert_eq!(store.search_players("NAD"), vec!["Nadal"]);
        assert_eq!(store.search_players("e"), vec!["Federer"]);
        assert!(store.search_players("xyz").is_empty());
    }
}
