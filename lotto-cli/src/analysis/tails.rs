use lotto_db::models::{Draw, BALL_COUNT};

use super::{recent_draws, AnalysisError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailRow {
    pub round: u32,
    pub numbers: [u8; BALL_COUNT],
    /// Nombre de boules par chiffre final (0 à 6 par case)
    pub digit_counts: [u8; 10],
    /// Somme des chiffres finaux distincts, chacun compté une fois
    pub tail_sum: u32,
}

pub fn tail_row(draw: &Draw) -> TailRow {
    let mut digit_counts = [0u8; 10];
    for &n in &draw.numbers {
        digit_counts[usize::from(n % 10)] += 1;
    }
    let tail_sum = digit_counts
        .iter()
        .enumerate()
        .filter(|(_, &c)| c > 0)
        .map(|(d, _)| d as u32)
        .sum();

    TailRow {
        round: draw.round,
        numbers: draw.numbers,
        digit_counts,
        tail_sum,
    }
}

/// Matrice des chiffres finaux, du tirage le plus récent au plus ancien.
pub fn last_digit_matrix(draws: &[Draw], n: usize) -> Result<Vec<TailRow>, AnalysisError> {
    Ok(recent_draws(draws, n)?.into_iter().map(tail_row).collect())
}

/// Total par chiffre final sur la fenêtre. Les dix chiffres sont toujours
/// présents, y compris à zéro.
pub fn last_digit_freq_by_recent(draws: &[Draw], n: usize) -> Result<[u32; 10], AnalysisError> {
    let mut totals = [0u32; 10];
    for row in last_digit_matrix(draws, n)? {
        for (total, &count) in totals.iter_mut().zip(row.digit_counts.iter()) {
            *total += u32::from(count);
        }
    }
    Ok(totals)
}
