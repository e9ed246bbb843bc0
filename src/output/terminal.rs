// Terminal rendering for the CLI commands.
//
// Everything here prints to stdout; nothing returns data. Command handlers in
// main.rs build the dataset and pass the finished pieces in.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use colored::Colorize;

use crate::corpus::SpeechCorpus;
use crate::pipeline::Dataset;
use crate::rates::RateSeries;
use crate::scores::DateIndexedScores;

/// Display the headline numbers for a built dataset.
pub fn display_summary(dataset: &Dataset) {
    let corpus = &dataset.corpus;
    println!(
        "\n{}",
        format!("=== Dataset ({} speeches) ===", corpus.len()).bold()
    );
    println!();

    if let Some(cutoff) = corpus.cutoff() {
        println!("  Cutoff: {}", cutoff);
    }
    let dates = corpus.dates();
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        println!("  Speech dates: {} distinct ({} to {})", dates.len(), first, last);
    }
    println!("  Scoring runs: {}", dataset.runs.len());
    println!(
        "  Scored speeches: {} of {}",
        dataset.speech_scores.len(),
        corpus.len()
    );
    println!("  Per-date score rows: {}", dataset.date_scores.len());

    let filled = dataset.rates.points().iter().filter(|p| p.is_filled()).count();
    println!(
        "  Aligned rates: {} dates ({} carried forward)",
        dataset.rates.len(),
        filled
    );
    println!(
        "  Index sizes: {} authors, {} topics, {} speeches, {} dates",
        dataset.index.authors.len(),
        dataset.index.topics.len(),
        dataset.index.speeches.len(),
        dataset.index.dates.len()
    );

    display_authors(corpus);
    display_collisions(corpus);
}

/// Speeches per author.
fn display_authors(corpus: &SpeechCorpus) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for speech in corpus.iter() {
        *counts.entry(speech.author.as_str()).or_insert(0) += 1;
    }

    println!("\n  {}", "Speeches by author:".dimmed());
    for (author, count) in counts {
        println!("    {:<24} {:>5}", author, count);
    }
}

/// Id collisions from the merge, if any.
fn display_collisions(corpus: &SpeechCorpus) {
    let collisions = corpus.collisions();
    if collisions.is_empty() {
        return;
    }

    println!(
        "\n  {} {} speech ids appeared in more than one collection (later one kept):",
        "!".yellow(),
        collisions.len()
    );
    for c in collisions.iter().take(10) {
        println!(
            "    {:<32} {} -> {}",
            super::fit_column(&c.id, 32),
            c.previous_author.dimmed(),
            c.author
        );
    }
    if collisions.len() > 10 {
        println!("    ... and {} more", collisions.len() - 10);
    }
}

/// Display the per-date aggregate table, one row per date.
///
/// Topics become columns, ordered by name. `limit` keeps only the most
/// recent dates.
pub fn display_date_scores(scores: &DateIndexedScores, limit: Option<usize>) {
    if scores.is_empty() {
        println!("No scored speeches. Check FEDLENS_SCORE_DIR and FEDLENS_SCORER_KEY.");
        return;
    }

    let mut topics: Vec<&str> = scores
        .values()
        .flat_map(|t| t.keys().map(String::as_str))
        .collect();
    topics.sort_unstable();
    topics.dedup();

    let skip = limit.map_or(0, |n| scores.len().saturating_sub(n));

    print!("  {:<10}", "Date".dimmed());
    for topic in &topics {
        print!("  {:>12}", super::fit_column(topic, 12).dimmed());
    }
    println!();
    println!("  {}", "-".repeat(10 + topics.len() * 14).dimmed());

    for (date, row) in scores.iter().skip(skip) {
        print!("  {:<10}", date.to_string());
        for topic in &topics {
            match row.get(*topic) {
                Some(v) => print!("  {:>12.3}", v),
                None => print!("  {:>12}", "-".dimmed()),
            }
        }
        println!();
    }
}

/// Display one author's score curve for a topic as a bar chart.
pub fn display_curve(author: &str, topic: &str, curve: &BTreeMap<NaiveDate, f64>) {
    println!(
        "\n{}",
        format!("=== {author}: {topic} score over time ===").bold()
    );
    println!();

    if curve.is_empty() {
        println!("  No scored speeches for this author and topic.");
        return;
    }

    let max = curve.values().cloned().fold(f64::MIN, f64::max);
    let bar_width: usize = 30;

    for (date, value) in curve {
        let filled = if max > 0.0 {
            ((value / max) * bar_width as f64).round().max(0.0) as usize
        } else {
            0
        };
        let bar = format!(
            "[{}{}]",
            "=".repeat(filled),
            " ".repeat(bar_width.saturating_sub(filled))
        );
        println!("  {}  {} {:.3}", date, bar.bright_blue(), value);
    }
}

/// Display the aligned rate series. Carried-forward rows are dimmed.
pub fn display_rates(rates: &RateSeries) {
    if rates.is_empty() {
        println!("No speech dates to align rates to.");
        return;
    }

    println!(
        "  {:<10}  {:>8}  {:>8}  {:<10}",
        "Date".dimmed(),
        "Rate".dimmed(),
        "Change".dimmed(),
        "Observed".dimmed(),
    );
    println!("  {}", "-".repeat(44).dimmed());

    for point in rates.points() {
        let change = point
            .rate_change
            .map(|c| format!("{:+.3}", c))
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "  {:<10}  {:>8.3}  {:>8}  {:<10}",
            point.date.to_string(),
            point.rate,
            change,
            point.observed_on.to_string()
        );
        if point.is_filled() {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }
}
