use std::collections::BTreeSet;

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::analysis::frequency::FrequencyRow;
use crate::analysis::matches::MatchGroups;
use crate::analysis::tails::TailRow;
use lotto_db::models::{ball_color, BallColor, Draw};
use lotto_db::store::{DrawStore, RefreshReport};

fn term_color(color: BallColor) -> Color {
    match color {
        BallColor::Yellow => Color::Yellow,
        BallColor::Blue => Color::Blue,
        BallColor::Red => Color::Red,
        BallColor::Gray => Color::DarkGrey,
        BallColor::Green => Color::Green,
        BallColor::Undefined => Color::White,
    }
}

fn ball_cell(number: u8) -> Cell {
    Cell::new(format!("{:2}", number))
        .fg(term_color(ball_color(number)))
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Center)
}

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn ball_headers() -> impl Iterator<Item = String> {
    (1..=6).map(|i| format!("N°{}", i))
}

pub fn display_draws(draws: &[&Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let header = ["Tirage".to_string(), "Date".to_string()]
        .into_iter()
        .chain(ball_headers())
        .collect();
    let mut table = new_table(header);

    for draw in draws {
        let mut row = vec![Cell::new(draw.round), Cell::new(&draw.date)];
        row.extend(draw.numbers.iter().map(|&n| ball_cell(n)));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_refresh_summary(report: &RefreshReport) {
    if report.latest.is_none() {
        println!("⚠ Source indisponible : analyse sur les données locales.");
        return;
    }
    if !report.added.is_empty() {
        println!("{} tirage(s) ajouté(s).", report.added.len());
    }
    if !report.skipped.is_empty() {
        let skipped = report
            .skipped
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("Tirages indisponibles ignorés : {}", skipped);
    }
}

pub fn display_status(store: &DrawStore, latest: Option<u32>) {
    println!("Fichier           : {}", store.path().display());
    println!("Tirages en local  : {}", store.len());
    match store.last_draws(1).first() {
        Some(draw) => println!("Dernier enregistré: {} ({})", draw.round, draw.date),
        None => println!("Dernier enregistré: —"),
    }
    match latest {
        Some(round) => println!("Dernier publié    : {}", round),
        None => println!("Dernier publié    : indisponible"),
    }
}

/// Tableaux par nombre de numéros communs, du plus grand au plus petit.
/// Les numéros sélectionnés apparaissent en rouge gras.
pub fn display_match_groups(groups: &MatchGroups, selected: &BTreeSet<u8>) {
    let found_any = groups.values().any(|entries| !entries.is_empty());
    if !found_any {
        println!("⚠ Aucun tirage ne partage 2 numéros ou plus avec la sélection.");
        return;
    }

    for (count, entries) in groups.iter().rev() {
        if entries.is_empty() {
            continue;
        }
        println!("\n🎯 {} numéros communs ({} tirages)", count, entries.len());

        let header = ["Tirage".to_string(), "Date".to_string()]
            .into_iter()
            .chain(ball_headers())
            .collect();
        let mut table = new_table(header);

        for entry in entries {
            let mut row = vec![Cell::new(entry.round), Cell::new(&entry.date)];
            row.extend(entry.numbers.iter().map(|&n| {
                if selected.contains(&n) {
                    Cell::new(format!("{:2}", n))
                        .fg(Color::Red)
                        .add_attribute(Attribute::Bold)
                        .set_alignment(CellAlignment::Center)
                } else {
                    Cell::new(format!("{:2}", n)).set_alignment(CellAlignment::Center)
                }
            }));
            table.add_row(row);
        }
        println!("{table}");
    }
}

pub fn display_frequency(rows: &[FrequencyRow], window: usize) {
    println!("\n📊 Numéros les plus fréquents sur les {} derniers tirages\n", window);

    if rows.is_empty() {
        println!("Aucun numéro trouvé.");
        return;
    }

    let mut table = new_table(vec![
        "Rang".to_string(),
        "Numéro".to_string(),
        "Sorties".to_string(),
        "Part (%)".to_string(),
        "Couleur".to_string(),
    ]);
    for (i, row) in rows.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            ball_cell(row.number),
            Cell::new(row.count),
            Cell::new(format!("{:.2}", row.percentage)),
            Cell::new(ball_color(row.number)).fg(term_color(ball_color(row.number))),
        ]);
    }
    println!("{table}");
}

pub fn display_tail_matrix(rows: &[TailRow], window: usize) {
    println!("\n🔢 Chiffres finaux des {} derniers tirages\n", window);

    if rows.is_empty() {
        println!("Aucun tirage trouvé.");
        return;
    }

    let header = ["Tirage".to_string()]
        .into_iter()
        .chain(ball_headers())
        .chain((0..10).map(|d| d.to_string()))
        .chain(["Somme".to_string()])
        .collect();
    let mut table = new_table(header);

    for row in rows {
        let mut cells = vec![Cell::new(row.round)];
        cells.extend(row.numbers.iter().map(|&n| ball_cell(n)));
        cells.extend(row.digit_counts.iter().map(|&c| {
            if c == 0 {
                Cell::new("·").set_alignment(CellAlignment::Center)
            } else {
                Cell::new(c).fg(Color::Cyan).set_alignment(CellAlignment::Center)
            }
        }));
        cells.push(Cell::new(row.tail_sum).add_attribute(Attribute::Bold));
        table.add_row(cells);
    }
    println!("{table}");
}

pub fn display_tail_frequency(totals: &[u32; 10], window: usize) {
    println!("\n── Total par chiffre final ({} tirages) ──", window);

    let max = totals.iter().copied().max().unwrap_or(0).max(1);
    let mut table = new_table(vec!["Chiffre".to_string(), "Sorties".to_string(), "".to_string()]);
    for (digit, &total) in totals.iter().enumerate() {
        let bar = "█".repeat((total as f64 / max as f64 * 30.0).round() as usize);
        table.add_row(vec![Cell::new(digit), Cell::new(total), Cell::new(bar)]);
    }
    println!("{table}");
}
