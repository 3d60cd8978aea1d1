use std::collections::{BTreeMap, BTreeSet};

use lotto_db::models::{validate_number, Draw, BALL_COUNT};

use super::AnalysisError;

/// Moins de deux numéros communs n'apprend rien face à un tirage de six.
pub const DEFAULT_MIN_MATCH: usize = 2;
pub const DEFAULT_MAX_MATCH: usize = BALL_COUNT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEntry {
    pub round: u32,
    pub date: String,
    pub numbers: [u8; BALL_COUNT],
}

/// Nombre de numéros communs → tirages concernés, dans l'ordre du stockage.
pub type MatchGroups = BTreeMap<usize, Vec<MatchEntry>>;

pub fn normalize_selection(selected: &[u8]) -> Result<BTreeSet<u8>, AnalysisError> {
    if selected.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }
    for &n in selected {
        if validate_number(n).is_err() {
            return Err(AnalysisError::NumberOutOfRange(n));
        }
    }
    Ok(selected.iter().copied().collect())
}

pub fn match_count(draw: &Draw, selected: &BTreeSet<u8>) -> usize {
    selected.iter().filter(|&&n| draw.contains(n)).count()
}

/// Regroupe les tirages selon leur nombre de numéros communs avec la sélection.
///
/// Seuls les comptes dans `[min_match, max_match]` sont conservés ; les
/// tirages hors bornes sont écartés.
pub fn group_by_match_count(
    draws: &[Draw],
    selected: &[u8],
    min_match: usize,
    max_match: usize,
) -> Result<MatchGroups, AnalysisError> {
    let selected = normalize_selection(selected)?;
    if min_match > max_match || max_match > BALL_COUNT {
        return Err(AnalysisError::InvalidMatchRange {
            min: min_match,
            max: max_match,
        });
    }

    let mut groups = MatchGroups::new();
    for draw in draws {
        let count = match_count(draw, &selected);
        if (min_match..=max_match).contains(&count) {
            groups.entry(count).or_default().push(MatchEntry {
                round: draw.round,
                date: draw.date.clone(),
                numbers: draw.numbers,
            });
        }
    }
    Ok(groups)
}
