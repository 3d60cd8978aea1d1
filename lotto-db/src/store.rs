use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{validate_draw, Draw};
use crate::source::DrawSource;

pub const HEADER: [&str; 8] = [
    "round_number",
    "number_1",
    "number_2",
    "number_3",
    "number_4",
    "number_5",
    "number_6",
    "draw_date",
];

#[derive(Debug, Serialize, Deserialize)]
struct DrawRow {
    round_number: u32,
    number_1: u8,
    number_2: u8,
    number_3: u8,
    number_4: u8,
    number_5: u8,
    number_6: u8,
    draw_date: String,
}

impl From<DrawRow> for Draw {
    fn from(row: DrawRow) -> Self {
        Draw {
            round: row.round_number,
            numbers: [
                row.number_1,
                row.number_2,
                row.number_3,
                row.number_4,
                row.number_5,
                row.number_6,
            ],
            date: row.draw_date,
        }
    }
}

impl From<&Draw> for DrawRow {
    fn from(draw: &Draw) -> Self {
        DrawRow {
            round_number: draw.round,
            number_1: draw.numbers[0],
            number_2: draw.numbers[1],
            number_3: draw.numbers[2],
            number_4: draw.numbers[3],
            number_5: draw.numbers[4],
            number_6: draw.numbers[5],
            draw_date: draw.date.clone(),
        }
    }
}

pub fn data_path() -> PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lotto_data.csv");
    path
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Dernier tirage annoncé par la source, `None` si elle n'a pas répondu.
    pub latest: Option<u32>,
    pub added: Vec<u32>,
    pub skipped: Vec<u32>,
}

impl RefreshReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.skipped.is_empty()
    }
}

/// Historique des tirages, persisté dans un fichier CSV.
///
/// Les lignes ne sont jamais modifiées ni supprimées : seul `refresh` ajoute
/// des tirages, dans l'ordre croissant des numéros.
#[derive(Debug, Clone)]
pub struct DrawStore {
    path: PathBuf,
    draws: Vec<Draw>,
}

impl DrawStore {
    /// Charge l'historique. Un fichier absent donne un historique vide.
    ///
    /// Chaque ligne doit être un tirage valide, et les numéros de tirage
    /// doivent être strictement croissants.
    pub fn load(path: &Path) -> Result<Self> {
        let mut store = DrawStore {
            path: path.to_path_buf(),
            draws: Vec::new(),
        };
        if !path.exists() {
            return Ok(store);
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

        for (idx, row) in reader.deserialize::<DrawRow>().enumerate() {
            let line = idx + 2;
            let row = row.with_context(|| format!("Ligne {} illisible dans {:?}", line, path))?;
            let draw = Draw::from(row);
            validate_draw(&draw).with_context(|| format!("Ligne {} invalide dans {:?}", line, path))?;
            if let Some(prev) = store.draws.last() {
                if draw.round <= prev.round {
                    bail!(
                        "Ligne {} dans {:?} : tirage {} après le tirage {}",
                        line,
                        path,
                        draw.round,
                        prev.round
                    );
                }
            }
            store.draws.push(draw);
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn draws(&self) -> &[Draw] {
        &self.draws
    }

    pub fn len(&self) -> usize {
        self.draws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    pub fn last_round(&self) -> u32 {
        self.draws.iter().map(|d| d.round).max().unwrap_or(0)
    }

    /// Les `limit` tirages les plus récents, du plus récent au plus ancien.
    pub fn last_draws(&self, limit: usize) -> Vec<&Draw> {
        let mut draws: Vec<&Draw> = self.draws.iter().collect();
        draws.sort_by(|a, b| b.round.cmp(&a.round));
        draws.truncate(limit);
        draws
    }

    /// Complète l'historique avec les tirages manquants.
    ///
    /// Chaque tirage entre le dernier enregistré et le dernier publié est
    /// demandé une seule fois, dans l'ordre. Un tirage indisponible est ignoré
    /// sans bloquer les suivants. Le lot est écrit en une fois à la fin.
    pub fn refresh<S: DrawSource>(&mut self, source: S) -> Result<RefreshReport> {
        let last_saved = self.last_round();
        let mut report = RefreshReport::default();

        let Some(latest) = source.latest_round() else {
            log::warn!("Dernier tirage indisponible, données locales conservées");
            return Ok(report);
        };
        report.latest = Some(latest);

        if last_saved >= latest {
            log::debug!("Historique à jour (tirage {})", last_saved);
            return Ok(report);
        }

        let mut batch = Vec::new();
        for round in (last_saved + 1)..=latest {
            match source.fetch_round(round) {
                Some(draw) if draw.round != round => {
                    log::warn!("Tirage {} : la source a renvoyé le tirage {}", round, draw.round);
                    report.skipped.push(round);
                }
                Some(draw) => match validate_draw(&draw) {
                    Ok(()) => {
                        report.added.push(round);
                        batch.push(draw);
                    }
                    Err(e) => {
                        log::warn!("Tirage {} rejeté : {:#}", round, e);
                        report.skipped.push(round);
                    }
                },
                None => {
                    log::warn!("Tirage {} indisponible", round);
                    report.skipped.push(round);
                }
            }
        }

        if !batch.is_empty() {
            let mut draws = self.draws.clone();
            draws.extend(batch);
            write_draws(&self.path, &draws)?;
            self.draws = draws;
            log::info!("{} tirage(s) ajouté(s) à {:?}", report.added.len(), self.path);
        }

        Ok(report)
    }

    /// Réécrit le fichier entier via un fichier temporaire puis un renommage.
    pub fn save(&self) -> Result<()> {
        write_draws(&self.path, &self.draws)
    }
}

/// Le fichier temporaire est supprimé si l'écriture ou le renommage échoue.
fn write_draws(path: &Path, draws: &[Draw]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
        }
    }

    let mut tmp = path.to_path_buf().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = write_csv(&tmp, draws).and_then(|()| {
        std::fs::rename(&tmp, path).with_context(|| format!("Impossible de remplacer {:?}", path))
    });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written
}

fn write_csv(path: &Path, draws: &[Draw]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    writer.write_record(HEADER)?;
    for draw in draws {
        writer.serialize(DrawRow::from(draw))?;
    }
    writer.flush().context("Échec de l'écriture du CSV")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeSource {
        latest: Option<u32>,
        draws: HashMap<u32, Draw>,
        calls: RefCell<Vec<u32>>,
    }

    impl FakeSource {
        fn new(latest: Option<u32>, draws: Vec<Draw>) -> Self {
            FakeSource {
                latest,
                draws: draws.into_iter().map(|d| (d.round, d)).collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl DrawSource for FakeSource {
        fn latest_round(&self) -> Option<u32> {
            self.latest
        }

        fn fetch_round(&self, round: u32) -> Option<Draw> {
            self.calls.borrow_mut().push(round);
            self.draws.get(&round).cloned()
        }
    }

    fn test_draw(round: u32) -> Draw {
        let base = (round % 39) as u8 + 1;
        Draw {
            round,
            numbers: [base, base + 1, base + 2, base + 3, base + 4, base + 5],
            date: format!("2024-01-{:02}", round % 28 + 1),
        }
    }

    fn rounds(store: &DrawStore) -> Vec<u32> {
        store.draws().iter().map(|d| d.round).collect()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DrawStore::load(&dir.path().join("absent.csv")).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.last_round(), 0);
    }

    #[test]
    fn test_save_writes_header_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("lotto.csv");
        let source = FakeSource::new(Some(2), vec![test_draw(1), test_draw(2)]);

        let mut store = DrawStore::load(&path).unwrap();
        store.refresh(&source).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let first_line = content.lines().next().unwrap();
        assert_eq!(
            first_line,
            "round_number,number_1,number_2,number_3,number_4,number_5,number_6,draw_date"
        );

        let reloaded = DrawStore::load(&path).unwrap();
        assert_eq!(reloaded.draws(), store.draws());
    }

    #[test]
    fn test_load_rejects_malformed_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        std::fs::write(
            &path,
            "round_number,number_1,number_2,number_3,number_4,number_5,number_6,draw_date\n\
             1,10,23,abc,33,37,40,2002-12-07\n",
        )
        .unwrap();
        assert!(DrawStore::load(&path).is_err());
    }

    const CSV_HEADER: &str = "round_number,number_1,number_2,number_3,number_4,number_5,number_6,draw_date\n";

    #[test]
    fn test_load_rejects_duplicate_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let content = format!(
            "{CSV_HEADER}1,10,23,29,33,37,40,2002-12-07\n1,9,13,21,25,32,42,2002-12-14\n"
        );
        std::fs::write(&path, content).unwrap();

        let err = DrawStore::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Ligne 3"));
    }

    #[test]
    fn test_load_rejects_rounds_out_of_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let content = format!(
            "{CSV_HEADER}2,9,13,21,25,32,42,2002-12-14\n1,10,23,29,33,37,40,2002-12-07\n"
        );
        std::fs::write(&path, content).unwrap();
        assert!(DrawStore::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_invalid_draw() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        std::fs::write(&path, format!("{CSV_HEADER}1,10,23,29,33,37,46,2002-12-07\n")).unwrap();
        let err = DrawStore::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Ligne 2"));

        std::fs::write(&path, format!("{CSV_HEADER}1,10,23,29,33,37,40,07/12/2002\n")).unwrap();
        assert!(DrawStore::load(&path).is_err());
    }

    #[test]
    fn test_load_accepts_gaps_between_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let content = format!(
            "{CSV_HEADER}1,10,23,29,33,37,40,2002-12-07\n3,11,16,19,21,27,31,2002-12-21\n"
        );
        std::fs::write(&path, content).unwrap();
        assert_eq!(rounds(&DrawStore::load(&path).unwrap()), vec![1, 3]);
    }

    #[test]
    fn test_refresh_failed_save_keeps_memory_in_sync() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        let path = dir.path().join("blocker").join("lotto.csv");
        let source = FakeSource::new(Some(2), vec![test_draw(1), test_draw(2)]);

        let mut store = DrawStore::load(&path).unwrap();
        assert!(store.refresh(&source).is_err());
        assert!(store.is_empty());
        assert_eq!(store.last_round(), 0);

        // Une seconde tentative refait le travail au lieu de se croire à jour.
        assert!(store.refresh(&source).is_err());
        assert!(store.is_empty());
        assert_eq!(*source.calls.borrow(), vec![1, 2, 1, 2]);
        assert!(!path.exists());
    }

    #[test]
    fn test_save_failure_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "").unwrap();

        let store = DrawStore {
            path: path.clone(),
            draws: vec![test_draw(1)],
        };
        assert!(store.save().is_err());
        assert!(!dir.path().join("lotto.csv.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_refresh_failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let source = FakeSource::new(Some(1), vec![test_draw(1)]);
        let mut store = DrawStore::load(&path).unwrap();

        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "").unwrap();

        assert!(store.refresh(&source).is_err());
        assert!(store.is_empty());
        assert!(!dir.path().join("lotto.csv.tmp").exists());
    }

    #[test]
    fn test_refresh_appends_missing_rounds_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let source = FakeSource::new(Some(4), (1..=4).map(test_draw).collect());

        let mut store = DrawStore::load(&path).unwrap();
        let report = store.refresh(&source).unwrap();

        assert_eq!(report.latest, Some(4));
        assert_eq!(report.added, vec![1, 2, 3, 4]);
        assert!(report.skipped.is_empty());
        assert_eq!(rounds(&store), vec![1, 2, 3, 4]);
        assert_eq!(*source.calls.borrow(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_refresh_only_fetches_after_last_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let mut store = DrawStore::load(&path).unwrap();
        store.refresh(FakeSource::new(Some(2), vec![test_draw(1), test_draw(2)])).unwrap();

        let source = FakeSource::new(Some(5), (1..=5).map(test_draw).collect());
        let report = store.refresh(&source).unwrap();

        assert_eq!(report.added, vec![3, 4, 5]);
        assert_eq!(*source.calls.borrow(), vec![3, 4, 5]);
        assert_eq!(rounds(&store), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_refresh_skips_unavailable_round() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let source = FakeSource::new(Some(4), vec![test_draw(1), test_draw(2), test_draw(4)]);

        let mut store = DrawStore::load(&path).unwrap();
        let report = store.refresh(&source).unwrap();

        assert_eq!(report.added, vec![1, 2, 4]);
        assert_eq!(report.skipped, vec![3]);
        assert_eq!(rounds(&DrawStore::load(&path).unwrap()), vec![1, 2, 4]);
    }

    #[test]
    fn test_refresh_skips_invalid_and_mismatched_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let mut bad = test_draw(2);
        bad.numbers[0] = 46;
        let mut wrong_round = test_draw(3);
        wrong_round.round = 7;

        let mut source = FakeSource::new(Some(3), vec![test_draw(1), bad]);
        source.draws.insert(3, wrong_round);

        let mut store = DrawStore::load(&path).unwrap();
        let report = store.refresh(&source).unwrap();

        assert_eq!(report.added, vec![1]);
        assert_eq!(report.skipped, vec![2, 3]);
        assert_eq!(rounds(&store), vec![1]);
    }

    #[test]
    fn test_refresh_without_latest_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let source = FakeSource::new(None, vec![test_draw(1)]);

        let mut store = DrawStore::load(&path).unwrap();
        let report = store.refresh(&source).unwrap();

        assert_eq!(report, RefreshReport::default());
        assert!(report.is_noop());
        assert!(store.is_empty());
        assert!(source.calls.borrow().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_refresh_all_failed_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let source = FakeSource::new(Some(3), Vec::new());

        let mut store = DrawStore::load(&path).unwrap();
        let report = store.refresh(&source).unwrap();

        assert_eq!(report.skipped, vec![1, 2, 3]);
        assert!(!path.exists());
    }

    #[test]
    fn test_refresh_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let source = FakeSource::new(Some(3), (1..=3).map(test_draw).collect());

        let mut store = DrawStore::load(&path).unwrap();
        store.refresh(&source).unwrap();
        let first = std::fs::read(&path).unwrap();

        let mut store = DrawStore::load(&path).unwrap();
        let report = store.refresh(&source).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert!(report.added.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_refresh_never_duplicates_rounds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let mut store = DrawStore::load(&path).unwrap();

        for latest in [2, 2, 5, 3, 8] {
            let source = FakeSource::new(Some(latest), (1..=8).map(test_draw).collect());
            store.refresh(&source).unwrap();
            store = DrawStore::load(&path).unwrap();
        }

        let stored = rounds(&store);
        assert_eq!(stored, (1..=8).collect::<Vec<_>>());
        assert!(stored.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_last_draws_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lotto.csv");
        let mut store = DrawStore::load(&path).unwrap();
        store.refresh(FakeSource::new(Some(5), (1..=5).map(test_draw).collect())).unwrap();

        let last: Vec<u32> = store.last_draws(3).iter().map(|d| d.round).collect();
        assert_eq!(last, vec![5, 4, 3]);
        assert_eq!(store.last_draws(10).len(), 5);
    }
}
