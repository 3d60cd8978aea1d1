mod analysis;
mod display;
mod fetch;
mod interactive;
mod retry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::analysis::frequency::top_numbers_by_recent;
use crate::analysis::matches::{group_by_match_count, normalize_selection, DEFAULT_MAX_MATCH, DEFAULT_MIN_MATCH};
use crate::analysis::tails::{last_digit_freq_by_recent, last_digit_matrix};
use crate::analysis::check_window;
use crate::display::{
    display_draws, display_frequency, display_match_groups, display_refresh_summary, display_status,
    display_tail_frequency, display_tail_matrix,
};
use crate::fetch::{DhLotterySource, ProgressSource, SourceConfig};
use crate::retry::RetryConfig;
use lotto_db::source::DrawSource;
use lotto_db::store::{data_path, DrawStore, RefreshReport};

#[derive(Parser)]
#[command(name = "lotto", about = "Analyseur d'historique Lotto 6/45")]
struct Cli {
    /// Fichier CSV de l'historique (défaut : ./data/lotto_data.csv)
    #[arg(long, global = true, env = "LOTTO_DATA")]
    data: Option<PathBuf>,

    /// Ne pas interroger la source distante
    #[arg(long, global = true)]
    offline: bool,

    /// Délai maximal d'une requête HTTP, en secondes
    #[arg(long, global = true, default_value = "10")]
    timeout: u64,

    /// Relances par requête en cas d'échec
    #[arg(long, global = true, default_value = "0")]
    retries: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Récupérer les tirages manquants
    Update,

    /// Afficher l'état de l'historique local et de la source
    Status,

    /// Afficher le chemin du fichier de données
    DataPath,

    /// Lister les derniers tirages
    List {
        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Chercher les tirages partageant des numéros avec une sélection
    Matches {
        /// Numéros sélectionnés (1-45)
        numbers: Vec<u8>,

        /// Nombre minimal de numéros communs
        #[arg(long, default_value_t = DEFAULT_MIN_MATCH)]
        min: usize,

        /// Nombre maximal de numéros communs
        #[arg(long, default_value_t = DEFAULT_MAX_MATCH)]
        max: usize,
    },

    /// Numéros les plus fréquents sur les derniers tirages
    Top {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "10")]
        window: usize,
    },

    /// Répartition des chiffres finaux sur les derniers tirages
    Tails {
        /// Fenêtre d'analyse (nombre de tirages)
        #[arg(short, long, default_value = "10")]
        window: usize,
    },

    /// Mode interactif
    Interactive,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let path = cli.data.clone().unwrap_or_else(data_path);
    let mut store = DrawStore::load(&path)?;

    let source = if cli.offline {
        None
    } else {
        let config = SourceConfig {
            timeout: Duration::from_secs(cli.timeout),
            retry: RetryConfig::with_retries(cli.retries),
            ..SourceConfig::default()
        };
        Some(DhLotterySource::new(config)?)
    };
    let source = source.as_ref();

    match cli.command {
        Command::DataPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::Status => {
            display_status(&store, source.and_then(|s| s.latest_round()));
            Ok(())
        }
        Command::Update => cmd_update(&mut store, source),
        Command::List { last } => {
            refresh_store(&mut store, source)?;
            cmd_list(&store, last)
        }
        Command::Matches { numbers, min, max } => {
            normalize_selection(&numbers)?;
            refresh_store(&mut store, source)?;
            cmd_matches(&store, &numbers, min, max)
        }
        Command::Top { window } => {
            refresh_store(&mut store, source)?;
            cmd_top(&store, window)
        }
        Command::Tails { window } => {
            refresh_store(&mut store, source)?;
            cmd_tails(&store, window)
        }
        Command::Interactive => interactive::run_interactive(&mut store, source),
    }
}

pub(crate) fn refresh_store(store: &mut DrawStore, source: Option<&DhLotterySource>) -> Result<RefreshReport> {
    let Some(source) = source else {
        return Ok(RefreshReport::default());
    };
    let progress = ProgressSource::new(source, store.last_round());
    let report = store.refresh(&progress)?;
    progress.finish();
    display_refresh_summary(&report);
    Ok(report)
}

fn cmd_update(store: &mut DrawStore, source: Option<&DhLotterySource>) -> Result<()> {
    if source.is_none() {
        println!("Mode hors ligne : aucune mise à jour.");
        return Ok(());
    }
    let report = refresh_store(store, source)?;
    if report.latest.is_some() && report.is_noop() {
        println!("Historique à jour ({} tirages).", store.len());
    }
    Ok(())
}

fn empty_store(store: &DrawStore) -> bool {
    if store.is_empty() {
        println!("Base vide. Lancez d'abord : lotto update");
        return true;
    }
    false
}

pub(crate) fn cmd_list(store: &DrawStore, last: usize) -> Result<()> {
    if empty_store(store) {
        return Ok(());
    }
    display_draws(&store.last_draws(last));
    Ok(())
}

pub(crate) fn cmd_matches(store: &DrawStore, numbers: &[u8], min: usize, max: usize) -> Result<()> {
    let selected = normalize_selection(numbers)?;
    if empty_store(store) {
        return Ok(());
    }
    let groups = group_by_match_count(store.draws(), numbers, min, max)?;
    display_match_groups(&groups, &selected);
    Ok(())
}

pub(crate) fn cmd_top(store: &DrawStore, window: usize) -> Result<()> {
    if empty_store(store) {
        return Ok(());
    }
    check_window(window, store.len())?;
    let rows = top_numbers_by_recent(store.draws(), window)?;
    display_frequency(&rows, window);
    Ok(())
}

pub(crate) fn cmd_tails(store: &DrawStore, window: usize) -> Result<()> {
    if empty_store(store) {
        return Ok(());
    }
    check_window(window, store.len())?;
    let rows = last_digit_matrix(store.draws(), window)?;
    display_tail_matrix(&rows, window);
    let totals = last_digit_freq_by_recent(store.draws(), window)?;
    display_tail_frequency(&totals, window);
    Ok(())
}
