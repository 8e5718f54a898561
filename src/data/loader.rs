//! CSV ingestion for rating histories and the reference feature dataset

use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::features::{NormalizationParams, FEATURE_DIM};
use crate::predict::Fixture;
use crate::ratings::RatingStore;
use crate::{DataConfig, RatingObservation, Result, TennisError};

/// Name of the target column dropped from the reference dataset
const LABEL_COLUMN: &str = "label";

#[derive(Debug, Deserialize)]
struct OverallRow {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Rating")]
    rating: f32,
}

#[derive(Debug, Deserialize)]
struct SurfaceRow {
    #[serde(rename = "Player")]
    player: String,
    #[serde(rename = "Surface")]
    surface: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Rating")]
    rating: f32,
}

#[derive(Debug, Deserialize)]
struct FixtureRow {
    #[serde(rename = "PlayerA")]
    player_a: String,
    #[serde(rename = "PlayerB")]
    player_b: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Surface")]
    surface: String,
}

/// Parse a rating timestamp: `YYYY-MM-DD` (midnight) or `YYYY-MM-DD HH:MM:SS`
///
/// The time of day is kept, so a rating recorded during a day only becomes
/// visible to lookups from the following day.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().map(NaiveDateTime::from))
}

fn row_timestamp(raw: &str, line: usize) -> Result<NaiveDateTime> {
    parse_timestamp(raw)
        .ok_or_else(|| TennisError::Parse(format!("Invalid date '{}' on row {}", raw, line)))
}

fn row_date(raw: &str, line: usize) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| TennisError::Parse(format!("Invalid date '{}' on row {}", raw, line)))
}

/// Read overall rating rows (`Player, Date, Rating`)
pub fn read_overall_ratings<R: Read>(reader: R) -> Result<Vec<RatingObservation>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for (i, row) in rdr.deserialize::<OverallRow>().enumerate() {
        let row = row?;
        if row.player.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let recorded_at = row_timestamp(&row.date, i + 1)?;
        observations.push(RatingObservation::overall(row.player, recorded_at, row.rating));
    }

    if skipped > 0 {
        log::debug!("Skipped {} overall rows without a player", skipped);
    }
    Ok(observations)
}

/// Read surface rating rows (`Player, Surface, Date, Rating`)
pub fn read_surface_ratings<R: Read>(reader: R) -> Result<Vec<RatingObservation>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut observations = Vec::new();
    let mut skipped = 0usize;

    for (i, row) in rdr.deserialize::<SurfaceRow>().enumerate() {
        let row = row?;
        if row.player.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let recorded_at = row_timestamp(&row.date, i + 1)?;
        observations.push(RatingObservation::on_surface(
            row.player,
            row.surface,
            recorded_at,
            row.rating,
        ));
    }

    if skipped > 0 {
        log::debug!("Skipped {} surface rows without a player", skipped);
    }
    Ok(observations)
}

/// Read the reference feature rows, dropping the `label` column
///
/// Remaining columns are taken in file order and must match the feature
/// vector layout.
pub fn read_reference_features<R: Read>(reader: R) -> Result<Vec<[f32; FEATURE_DIM]>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();

    let columns: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.trim() != LABEL_COLUMN)
        .map(|(idx, _)| idx)
        .collect();

    if columns.len() != FEATURE_DIM {
        return Err(TennisError::Parse(format!(
            "Reference dataset has {} feature columns, expected {}",
            columns.len(),
            FEATURE_DIM
        )));
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let mut row = [0.0f32; FEATURE_DIM];
        for (slot, &col) in row.iter_mut().zip(&columns) {
            let raw = record.get(col).unwrap_or("").trim();
            *slot = raw.parse().map_err(|_| {
                TennisError::Parse(format!(
                    "Invalid value '{}' in column '{}' on row {}",
                    raw,
                    &headers[col],
                    i + 1
                ))
            })?;
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Read fixtures to predict (`PlayerA, PlayerB, Date, Surface`)
pub fn read_fixtures<R: Read>(reader: R) -> Result<Vec<Fixture>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut fixtures = Vec::new();

    for (i, row) in rdr.deserialize::<FixtureRow>().enumerate() {
        let row = row?;
        let date = row_date(&row.date, i + 1)?;
        fixtures.push(Fixture {
            player_a: row.player_a,
            player_b: row.player_b,
            date,
            surface: row.surface,
        });
    }

    Ok(fixtures)
}

fn open(path: &str) -> Result<std::fs::File> {
    std::fs::File::open(Path::new(path)).map_err(|e| {
        TennisError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open {}: {}", path, e),
        ))
    })
}

pub fn load_overall_ratings(path: &str) -> Result<Vec<RatingObservation>> {
    read_overall_ratings(open(path)?)
}

pub fn load_surface_ratings(path: &str) -> Result<Vec<RatingObservation>> {
    read_surface_ratings(open(path)?)
}

pub fn load_reference_features(path: &str) -> Result<Vec<[f32; FEATURE_DIM]>> {
    read_reference_features(open(path)?)
}

pub fn load_fixtures(path: &str) -> Result<Vec<Fixture>> {
    read_fixtures(open(path)?)
}

/// Load both rating histories and build the store
pub fn load_rating_store(config: &DataConfig) -> Result<RatingStore> {
    let overall = load_overall_ratings(&config.overall_ratings_path)?;
    let by_surface = load_surface_ratings(&config.surface_ratings_path)?;
    log::info!(
        "Loaded {} overall and {} surface rating rows",
        overall.len(),
        by_surface.len()
    );
    Ok(RatingStore::new(overall, by_surface))
}

/// Cached normalization parameters if present, else computed from the reference dataset
pub fn load_normalization_params(config: &DataConfig) -> Result<NormalizationParams> {
    if let Some(path) = config.normalization_path.as_deref() {
        if Path::new(path).exists() {
            log::debug!("Using cached normalization params from {}", path);
            return NormalizationParams::load(path);
        }
    }

    let rows = load_reference_features(&config.features_path)?;
    log::info!(
        "Computing normalization params from {} reference rows",
        rows.len()
    );
    NormalizationParams::from_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = NaiveDateTime::from(date(2020, 1, 5));
        assert_eq!(parse_timestamp("2020-01-05"), Some(midnight));
        assert_eq!(parse_timestamp(" 2020-01-05 "), Some(midnight));
        assert_eq!(parse_timestamp("2020-01-05 00:00:00"), Some(midnight));
        assert_eq!(
            parse_timestamp("2020-01-05 13:45:00"),
            date(2020, 1, 5).and_hms_opt(13, 45, 0)
        );
        assert_eq!(parse_timestamp("05/01/2020"), None);
        assert_eq!(parse_timestamp("2020-02-30"), None);
    }

    #[test]
    fn test_read_overall() {
        let csv = "Player,Date,Rating\nA,2020-01-01,1600.5\nB,2020-02-01 00:00:00,1450\n,2020-03-01,1500\n";
        let rows = read_overall_ratings(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RatingObservation::overall("A", date(2020, 1, 1), 1600.5));
        assert_eq!(rows[1].recorded_at, NaiveDateTime::from(date(2020, 2, 1)));
        assert!(rows.iter().all(|r| r.surface.is_none()));
    }

    #[test]
    fn test_read_surface_keeps_tag_verbatim() {
        let csv = "Player,Surface,Date,Rating\nA,Clay,2020-01-01,1700\nA,Indoor,2020-01-01,1550\n";
        let rows = read_surface_ratings(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].surface.as_deref(), Some("Clay"));
        assert_eq!(rows[1].surface.as_deref(), Some("Indoor"));
    }

    #[test]
    fn test_bad_date_is_parse_error() {
        let csv = "Player,Date,Rating\nA,yesterday,1600\n";
        assert!(matches!(
            read_overall_ratings(csv.as_bytes()),
            Err(TennisError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_rating_is_csv_error() {
        let csv = "Player,Date,Rating\nA,2020-01-01,high\n";
        assert!(matches!(
            read_overall_ratings(csv.as_bytes()),
            Err(TennisError::Csv(_))
        ));
    }

    #[test]
    fn test_read_reference_drops_label() {
        let csv = "p1_elo,p2_elo,p1_surf,p2_surf,elo_diff,surf_diff,label,clay,hard,grass,carpet\n\
                   1600,1500,1650,1450,100,200,1,1,0,0,0\n\
                   1500,1600,1450,1650,-100,-200,0,0,1,0,0\n";
        let rows = read_reference_features(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            [1600.0, 1500.0, 1650.0, 1450.0, 100.0, 200.0, 1.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(rows[1][7], 1.0);
    }

    #[test]
    fn test_read_reference_wrong_width() {
        let csv = "a,b,label\n1,2,0\n";
        assert!(matches!(
            read_reference_features(csv.as_bytes()),
            Err(TennisError::Parse(_))
        ));
    }

    #[test]
    fn test_read_fixtures() {
        let csv = "PlayerA,PlayerB,Date,Surface\nA,B,2024-06-01,Grass\nC,D,2024-06-02,Indoor\n";
        let fixtures = read_fixtures(csv.as_bytes()).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].player_b, "B");
        assert_eq!(fixtures[0].date, date(2024, 6, 1));
        assert_eq!(fixtures[1].surface, "Indoor");
    }

    #[test]
    fn test_load_rating_store_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let overall = dir.path().join("overall.csv");
        let surface = dir.path().join("surface.csv");
        std::fs::write(&overall, "Player,Date,Rating\nA,2020-01-01,1600\nA,2021-06-01,1700\n").unwrap();
        std::fs::write(&surface, "Player,Surface,Date,Rating\nA,Clay,2020-01-01,1800\n").unwrap();

        let config = DataConfig {
            overall_ratings_path: overall.to_string_lossy().into_owned(),
            surface_ratings_path: surface.to_string_lossy().into_owned(),
            features_path: String::new(),
            model_path: String::new(),
            normalization_path: None,
        };
        let store = load_rating_store(&config).unwrap();
        assert_eq!(store.overall("A").latest_rating_at(date(2020, 6, 15)), 1600.0);
        assert_eq!(store.surface("A", "Clay").latest_rating_at(date(2020, 6, 15)), 1800.0);
    }

    #[test]
    fn test_intraday_rating_not_visible_same_day() {
        let csv = "Player,Date,Rating\nA,2020-01-05 13:45:00,1800\n";
        let store = RatingStore::from_observations(read_overall_ratings(csv.as_bytes()).unwrap());
        let timeline = store.overall("A");
        assert_eq!(timeline.latest_rating_at(date(2020, 1, 5)), 1500.0);
        assert_eq!(timeline.latest_rating_at(date(2020, 1, 6)), 1800.0);

        let csv = "Player,Surface,Date,Rating\nA,Clay,2020-01-05 00:00:00,1700\nA,Clay,2020-01-05 18:00:00,1750\n";
        let store = RatingStore::from_observations(read_surface_ratings(csv.as_bytes()).unwrap());
        assert_eq!(store.surface("A", "Clay").latest_rating_at(date(2020, 1, 5)), 1700.0);
        assert_eq!(store.surface("A", "Clay").latest_rating_at(date(2020, 1, 6)), 1750.0);
    }

    #[test]
    fn test_fixture_date_must_be_plain_date() {
        let csv = "PlayerA,PlayerB,Date,Surface\nA,B,2024-06-01 13:00:00,Grass\n";
        assert!(matches!(read_fixtures(csv.as_bytes()), Err(TennisError::Parse(_))));
    }

    #[test]
    fn test_normalization_params_prefer_cache() {
        let dir = tempfile::tempdir().unwrap();
        let features = dir.path().join("features.csv");
        let cache = dir.path().join("norm.json");
        std::fs::write(
            &features,
            "a,b,c,d,e,f,g,h,i,j,label\n1,2,3,4,5,6,1,0,0,0,1\n3,4,5,6,7,8,0,1,0,0,0\n",
        )
        .unwrap();

        let mut config = DataConfig {
            overall_ratings_path: String::new(),
            surface_ratings_path: String::new(),
            features_path: features.to_string_lossy().into_owned(),
            model_path: String::new(),
            normalization_path: Some(cache.to_string_lossy().into_owned()),
        };

        // No cache yet: computed from the reference rows
        let computed = load_normalization_params(&config).unwrap();
        assert!((computed.mean[0] - 2.0).abs() < 1e-6);

        let cached = NormalizationParams::default();
        cached.save(cache.to_str().unwrap()).unwrap();
        assert_eq!(load_normalization_params(&config).unwrap(), cached);

        config.normalization_path = None;
        assert_eq!(load_normalization_params(&config).unwrap(), computed);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_overall_ratings("/definitely/not/here.csv"),
            Err(TennisError::Io(_))
        ));
    }
}
