use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

pub const BALL_COUNT: usize = 6;
pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 45;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub round: u32,
    pub numbers: [u8; BALL_COUNT],
    pub date: String,
}

impl Draw {
    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }
}

/// Couleur officielle des boules, par tranche de dix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallColor {
    Yellow,
    Blue,
    Red,
    Gray,
    Green,
    Undefined,
}

impl std::fmt::Display for BallColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallColor::Yellow => write!(f, "jaune"),
            BallColor::Blue => write!(f, "bleu"),
            BallColor::Red => write!(f, "rouge"),
            BallColor::Gray => write!(f, "gris"),
            BallColor::Green => write!(f, "vert"),
            BallColor::Undefined => write!(f, "?"),
        }
    }
}

pub fn ball_color(number: u8) -> BallColor {
    match number {
        1..=10 => BallColor::Yellow,
        11..=20 => BallColor::Blue,
        21..=30 => BallColor::Red,
        31..=40 => BallColor::Gray,
        41..=45 => BallColor::Green,
        _ => BallColor::Undefined,
    }
}

pub fn validate_number(number: u8) -> Result<()> {
    if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
        bail!("Numéro {} hors limites ({}-{})", number, MIN_NUMBER, MAX_NUMBER);
    }
    Ok(())
}

/// Vérifie un tirage avant de l'ajouter à l'historique.
///
/// Les doublons ne sont pas rejetés : le format amont ne les interdit pas.
pub fn validate_draw(draw: &Draw) -> Result<()> {
    if draw.round == 0 {
        bail!("Numéro de tirage nul");
    }
    for &n in &draw.numbers {
        validate_number(n).with_context(|| format!("Tirage {}", draw.round))?;
    }
    NaiveDate::parse_from_str(&draw.date, "%Y-%m-%d")
        .with_context(|| format!("Date invalide pour le tirage {}: '{}'", draw.round, draw.date))?;
    Ok(())
}
