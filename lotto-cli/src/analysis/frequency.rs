use std::collections::BTreeMap;

use lotto_db::models::{Draw, BALL_COUNT};

use super::{recent_draws, AnalysisError};

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyRow {
    pub number: u8,
    pub count: u32,
    /// Part des `6n` boules de la fenêtre, arrondie au centième
    pub percentage: f64,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Numéros sortis sur les `n` derniers tirages, les plus fréquents d'abord.
///
/// Les numéros jamais sortis sont absents. À égalité, le plus petit numéro
/// passe en premier.
pub fn top_numbers_by_recent(draws: &[Draw], n: usize) -> Result<Vec<FrequencyRow>, AnalysisError> {
    let window = recent_draws(draws, n)?;

    let mut counts: BTreeMap<u8, u32> = BTreeMap::new();
    for draw in &window {
        for &number in &draw.numbers {
            *counts.entry(number).or_insert(0) += 1;
        }
    }

    let total = (window.len() * BALL_COUNT) as f64;
    let mut rows: Vec<FrequencyRow> = counts
        .into_iter()
        .map(|(number, count)| FrequencyRow {
            number,
            count,
            percentage: round2(count as f64 / total * 100.0),
        })
        .collect();

    rows.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    Ok(rows)
}
