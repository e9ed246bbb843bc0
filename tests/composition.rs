// Composition tests — the full build from files on disk.
//
// Lays out a realistic data directory in a tempdir (per-author speech files,
// two scoring runs, a rate file) and checks that the stages agree with each
// other: gating, shared date domain, caching, and the SQLite export.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

use fedlens::cache::LoadCache;
use fedlens::corpus::{group_by_date, SpeechCorpus};
use fedlens::pipeline::{build_dataset, load_cached_corpus, DatasetInputs};
use fedlens::scores::{score_curve, topic_names};
use fedlens::DatasetError;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_json(path: &Path, value: serde_json::Value) {
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

/// Data directory with two authors, one stale speech, and one id collision.
fn sample_data() -> (TempDir, DatasetInputs) {
    let tmp = TempDir::new().unwrap();
    let speech_dir = tmp.path().join("text_data");
    let score_dir = tmp.path().join("topic_scores");
    let rates_dir = tmp.path().join("price_data");
    fs::create_dir_all(&speech_dir).unwrap();
    fs::create_dir_all(&score_dir).unwrap();
    fs::create_dir_all(&rates_dir).unwrap();

    write_json(
        &speech_dir.join("powell.json"),
        json!([
            {"id": "p1", "date": "2019-01-04", "text": "Labor markets remain strong."},
            {"id": "p2", "date": "March 20, 2020", "text": "The pandemic."},
            {"id": "stale", "date": "2016-05-01", "text": "Before the window."},
            {"id": "shared", "date": "2020-03-20", "text": "Powell version."},
        ]),
    );
    write_json(
        &speech_dir.join("waller.json"),
        json!([
            {"id": "w1", "date": "2020/03/20", "text": "Balance sheet."},
            {"id": "w2", "date": "2021-07-01T10:00:00", "text": "Inflation outlook."},
            {"id": "shared", "date": "2020-03-20", "text": "Waller version."},
        ]),
    );

    write_json(
        &score_dir.join("01_first.json"),
        json!([
            {"id": "p1", "gpt-5": {"Labor": 0.8, "Inflation": 0.1}},
            {"id": "p2", "gpt-5": {"Labor": 0.2}},
            {"id": "w1", "gpt-5": {"Banking": 0.6}},
            {"id": "stale", "gpt-5": {"Stale": 1.0}},
        ]),
    );
    write_json(
        &score_dir.join("02_second.json"),
        json!([
            {"id": "p1", "gpt-5": {"Labor": 0.6}},
            {"id": "w2", "gpt-5": {"Inflation": 0.9}},
            {"id": "nobody", "gpt-5": {"Ghost": 1.0}},
        ]),
    );

    let rates_file = rates_dir.join("rates.json");
    write_json(
        &rates_file,
        json!([
            {"Date": "2018-12-20 00:00:00", "Rate": 2.40},
            {"Date": "2019-08-01 00:00:00", "Rate": 2.15},
            {"Date": "2020-03-16 00:00:00", "Rate": 0.25},
            {"Date": "2021-06-17 00:00:00", "Rate": 0.08},
        ]),
    );

    let inputs = DatasetInputs::new(&speech_dir, &score_dir, &rates_file);
    (tmp, inputs)
}

// ============================================================
// Full build
// ============================================================

#[test]
fn build_from_disk_applies_every_rule() {
    let (_tmp, inputs) = sample_data();
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();
    let dataset = build_dataset(&mut cache, &inputs, true).unwrap();

    // Cutoff and dedup
    let corpus = &dataset.corpus;
    assert!(!corpus.contains("stale"));
    assert_eq!(corpus.len(), 5);
    assert_eq!(corpus.get("shared").unwrap().author, "waller");

    // Gating: stale and unknown ids never appear anywhere
    assert!(!dataset.speech_scores.contains_key("stale"));
    assert!(!dataset.speech_scores.contains_key("nobody"));
    assert_eq!(dataset.index.topics.index_of("Stale"), None);
    assert_eq!(dataset.index.topics.index_of("Ghost"), None);

    // Later run wins per speech
    assert_eq!(dataset.speech_scores["p1"].len(), 1);
    assert_eq!(dataset.speech_scores["p1"]["Labor"], 0.6);

    // Per-date average over every row that day: (0.8 + 0.6) / 2, 0.1 / 2
    let jan = &dataset.date_scores[&ymd(2019, 1, 4)];
    assert!((jan["Labor"] - 0.7).abs() < 1e-12);
    assert!((jan["Inflation"] - 0.05).abs() < 1e-12);
}

#[test]
fn rates_cover_exactly_the_speech_dates() {
    let (_tmp, inputs) = sample_data();
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();
    let dataset = build_dataset(&mut cache, &inputs, true).unwrap();

    let speech_dates = dataset.corpus.dates();
    let rate_dates: Vec<NaiveDate> = dataset.rates.dates().collect();
    assert_eq!(rate_dates, speech_dates);
    assert_eq!(dataset.index.dates.values(), speech_dates.as_slice());

    let march = dataset.rates.get(ymd(2020, 3, 20)).unwrap();
    assert_eq!(march.rate, 0.25);
    assert_eq!(march.observed_on, ymd(2020, 3, 16));
    assert!((march.rate_change.unwrap() - (0.25 - 2.15)).abs() < 1e-12);

    let grouped = group_by_date(&dataset.corpus);
    assert_eq!(grouped[&ymd(2020, 3, 20)], vec!["p2", "shared", "w1"]);
}

#[test]
fn index_json_is_stable_across_builds() {
    let (_tmp, inputs) = sample_data();
    let mut first_cache: LoadCache<SpeechCorpus> = LoadCache::new();
    let mut second_cache: LoadCache<SpeechCorpus> = LoadCache::new();
    let a = build_dataset(&mut first_cache, &inputs, true).unwrap();
    let b = build_dataset(&mut second_cache, &inputs, false).unwrap();

    assert_eq!(topic_names(&a.speech_scores), a.index.topics.values());

    let json_a = serde_json::to_value(&a.index).unwrap();
    let json_b = serde_json::to_value(&b.index).unwrap();
    assert_eq!(json_a, json_b);
    assert_eq!(json_a["author2idx"]["powell"], 0);
    assert_eq!(json_a["author2idx"]["waller"], 1);
    assert_eq!(json_a["date2idx"]["2019-01-04"], 0);
    assert_eq!(json_a["dates"][0], "2019-01-04");
}

#[test]
fn score_curve_follows_author_dates() {
    let (_tmp, inputs) = sample_data();
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();
    let dataset = build_dataset(&mut cache, &inputs, true).unwrap();

    let curve = score_curve(&dataset.corpus, &dataset.runs, "powell", "Labor");
    let dates: Vec<NaiveDate> = curve.iter().map(|(d, _)| *d).collect();
    assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    assert!(dates.contains(&ymd(2019, 1, 4)));
    assert!(dates.contains(&ymd(2020, 3, 20)));
}

// ============================================================
// Failure paths
// ============================================================

#[test]
fn uncovered_speech_date_fails_the_build() {
    let (tmp, inputs) = sample_data();
    write_json(
        &inputs.rates_file,
        json!([{"Date": "2020-01-01 00:00:00", "Rate": 1.5}]),
    );
    let _keep = tmp;

    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();
    let err = build_dataset(&mut cache, &inputs, true).unwrap_err();
    match err {
        DatasetError::MissingRateCoverage { date, .. } => assert_eq!(date, ymd(2019, 1, 4)),
        other => panic!("expected MissingRateCoverage, got {other:?}"),
    }
}

#[test]
fn bad_speech_date_fails_the_build() {
    let (_tmp, inputs) = sample_data();
    write_json(
        &inputs.speech_dir.join("zzz.json"),
        json!([{"id": "z", "date": "20/03/2020", "text": "t"}]),
    );
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();
    assert!(matches!(
        build_dataset(&mut cache, &inputs, true),
        Err(DatasetError::UnrecognizedDateFormat { .. })
    ));
}

// ============================================================
// Caching
// ============================================================

#[test]
fn corpus_is_loaded_once_while_files_are_unchanged() {
    let (_tmp, inputs) = sample_data();
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();

    let first = load_cached_corpus(&mut cache, &inputs).unwrap();
    let second = load_cached_corpus(&mut cache, &inputs).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!(cache.stats(), (1, 1));
}

#[test]
fn changing_cutoff_reloads_corpus_from_same_directory() {
    let (_tmp, inputs) = sample_data();
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();

    let mut early = inputs.clone();
    early.cutoff = ymd(2010, 1, 1);
    let wide = load_cached_corpus(&mut cache, &early).unwrap();
    assert!(wide.contains("stale"));

    let narrow = load_cached_corpus(&mut cache, &inputs).unwrap();
    assert!(!narrow.contains("stale"));
    assert!(narrow.iter().all(|s| s.date >= inputs.cutoff));
    assert_eq!(narrow.cutoff(), Some(inputs.cutoff));

    // Both cutoffs stay cached side by side
    let wide_again = load_cached_corpus(&mut cache, &early).unwrap();
    assert!(std::sync::Arc::ptr_eq(&wide, &wide_again));
    assert_eq!(cache.stats(), (1, 2));
}

#[test]
fn new_speech_file_invalidates_cached_corpus() {
    let (_tmp, inputs) = sample_data();
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();

    let before = load_cached_corpus(&mut cache, &inputs).unwrap();
    write_json(
        &inputs.speech_dir.join("bowman.json"),
        json!([{"id": "b1", "date": "2022-01-01", "text": "t"}]),
    );
    let after = load_cached_corpus(&mut cache, &inputs).unwrap();
    assert_eq!(before.len() + 1, after.len());
    assert_eq!(after.get("b1").unwrap().author, "bowman");
}

// ============================================================
// SQLite export
// ============================================================

#[cfg(feature = "sqlite")]
#[test]
fn export_round_trips_index_order() {
    use fedlens::db::queries::{
        get_build_state, get_topic_series, read_index_axis, table_counts, write_dataset,
    };

    let (tmp, inputs) = sample_data();
    let mut cache: LoadCache<SpeechCorpus> = LoadCache::new();
    let dataset = build_dataset(&mut cache, &inputs, true).unwrap();

    let db_path = tmp.path().join("out").join("fedlens.db");
    let db_path = db_path.to_str().unwrap();
    let mut conn = fedlens::db::initialize(db_path).unwrap();
    write_dataset(&mut conn, &dataset, true).unwrap();

    assert_eq!(
        read_index_axis(&conn, "author").unwrap(),
        dataset.index.authors.values()
    );
    assert_eq!(
        read_index_axis(&conn, "speech").unwrap(),
        dataset.index.speeches.values()
    );
    let dates: Vec<String> = dataset.index.dates.values().iter().map(|d| d.to_string()).collect();
    assert_eq!(read_index_axis(&conn, "date").unwrap(), dates);

    let counts = table_counts(&conn).unwrap();
    let speeches = counts.iter().find(|(t, _)| *t == "speeches").unwrap().1;
    assert_eq!(speeches, dataset.corpus.len() as i64);
    assert!(get_build_state(&conn, "last_build_at").unwrap().is_some());

    let labor = get_topic_series(&conn, "Labor").unwrap();
    assert_eq!(labor[0].0, "2019-01-04");
    assert!((labor[0].1 - 0.7).abs() < 1e-12);

    // A second export replaces rather than appends
    write_dataset(&mut conn, &dataset, true).unwrap();
    let again = table_counts(&conn).unwrap();
    assert_eq!(counts, again);
}
