use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::analysis::matches::{DEFAULT_MAX_MATCH, DEFAULT_MIN_MATCH};
use crate::fetch::DhLotterySource;
use lotto_db::store::DrawStore;

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Matches,
    Top,
    Tails,
    History,
    Update,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "1" | "communs" | "matches" | "comm" => Some(InteractiveCommand::Matches),
        "2" | "frequences" | "fréquences" | "top" | "freq" => Some(InteractiveCommand::Top),
        "3" | "finales" | "tails" | "fin" => Some(InteractiveCommand::Tails),
        "4" | "historique" | "history" | "hist" => Some(InteractiveCommand::History),
        "5" | "maj" | "update" => Some(InteractiveCommand::Update),
        "6" | "quitter" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

/// Lit une liste de numéros séparés par des espaces ou des virgules.
fn parse_numbers(input: &str) -> Result<Vec<u8>> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u8>().with_context(|| format!("Numéro invalide : '{}'", s)))
        .collect()
}

fn display_menu(store: &DrawStore) {
    println!();
    println!("── Mode interactif ({} tirages) ──", store.len());
    println!("  1. communs    Tirages partageant des numéros");
    println!("  2. frequences Numéros les plus fréquents");
    println!("  3. finales    Répartition des chiffres finaux");
    println!("  4. historique Derniers tirages");
    println!("  5. maj        Mettre à jour l'historique");
    println!("  6. quitter    Quitter");
    println!();
}

/// Lit une ligne. `None` signale la fin de l'entrée (Ctrl+D).
fn read_input<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut input = String::new();
    let read = reader.read_line(&mut input).context("Erreur de lecture")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn prompt_line(msg: &str) -> Result<Option<String>> {
    print!("{}", msg);
    io::stdout().flush().context("Erreur d'écriture")?;
    read_input(&mut io::stdin().lock())
}

fn prompt(msg: &str) -> Result<String> {
    prompt_line(msg)?.context("Fin de l'entrée")
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}] : ", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn prompt_window(store: &DrawStore) -> Result<usize> {
    let default = store.len().min(10).max(1).to_string();
    let input = prompt_with_default(&format!("Nombre de tirages (1-{})", store.len()), &default)?;
    input.parse().context("Nombre invalide")
}

fn cmd_matches_interactive(store: &mut DrawStore, source: Option<&DhLotterySource>) -> Result<()> {
    let input = prompt("Numéros (1-45, séparés par des espaces) : ")?;
    let numbers = parse_numbers(&input)?;
    crate::analysis::matches::normalize_selection(&numbers)?;
    super::refresh_store(store, source)?;
    super::cmd_matches(store, &numbers, DEFAULT_MIN_MATCH, DEFAULT_MAX_MATCH)
}

fn cmd_top_interactive(store: &mut DrawStore, source: Option<&DhLotterySource>) -> Result<()> {
    super::refresh_store(store, source)?;
    let window = prompt_window(store)?;
    super::cmd_top(store, window)
}

fn cmd_tails_interactive(store: &mut DrawStore, source: Option<&DhLotterySource>) -> Result<()> {
    super::refresh_store(store, source)?;
    let window = prompt_window(store)?;
    super::cmd_tails(store, window)
}

fn cmd_history_interactive(store: &DrawStore) -> Result<()> {
    let n_str = prompt_with_default("Nombre de tirages", "10")?;
    let n: usize = n_str.parse().context("Nombre invalide")?;
    super::cmd_list(store, n)
}

pub fn run_interactive(store: &mut DrawStore, source: Option<&DhLotterySource>) -> Result<()> {
    println!("Bienvenue dans le mode interactif de lotto !");

    loop {
        display_menu(store);
        let input = match prompt_line("> ") {
            Ok(Some(s)) => s,
            Ok(None) => break,
            Err(e) => {
                println!("Erreur: {e:#}");
                break;
            }
        };

        if input.is_empty() {
            continue;
        }

        let result = match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("Au revoir !");
                break;
            }
            Some(InteractiveCommand::Matches) => cmd_matches_interactive(store, source),
            Some(InteractiveCommand::Top) => cmd_top_interactive(store, source),
            Some(InteractiveCommand::Tails) => cmd_tails_interactive(store, source),
            Some(InteractiveCommand::History) => cmd_history_interactive(store),
            Some(InteractiveCommand::Update) => super::cmd_update(store, source),
            None => {
                println!("Commande inconnue : '{}'. Tapez un numéro (1-6) ou un nom de commande.", input);
                Ok(())
            }
        };

        if let Err(e) = result {
            println!("Erreur: {e:#}");
        }
    }

    Ok(())
}
