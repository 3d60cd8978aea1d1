pub mod frequency;
pub mod matches;
pub mod tails;

use lotto_db::models::Draw;
use thiserror::Error;

/// Saisie refusée avant tout calcul.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Sélectionnez au moins un numéro")]
    EmptySelection,

    #[error("Numéro {0} hors limites (1-45)")]
    NumberOutOfRange(u8),

    #[error("Bornes de correspondance invalides ({min}-{max})")]
    InvalidMatchRange { min: usize, max: usize },

    #[error("La fenêtre doit contenir au moins un tirage")]
    EmptyWindow,

    #[error("Fenêtre de {requested} tirages demandée, seulement {available} disponibles")]
    WindowTooLarge { requested: usize, available: usize },
}

pub fn check_window(n: usize, available: usize) -> Result<(), AnalysisError> {
    if n == 0 {
        return Err(AnalysisError::EmptyWindow);
    }
    if n > available {
        return Err(AnalysisError::WindowTooLarge {
            requested: n,
            available,
        });
    }
    Ok(())
}

/// Les `n` tirages de plus grand numéro, du plus récent au plus ancien.
pub fn recent_draws(draws: &[Draw], n: usize) -> Result<Vec<&Draw>, AnalysisError> {
    check_window(n, draws.len())?;
    let mut sorted: Vec<&Draw> = draws.iter().collect();
    sorted.sort_by(|a, b| b.round.cmp(&a.round));
    sorted.truncate(n);
    Ok(sorted)
}

#[cfg(test)]
pub(crate) fn draw(round: u32, numbers: [u8; 6]) -> Draw {
    Draw {
        round,
        numbers,
        date: format!("2024-01-{:02}", round % 28 + 1),
    }
}
