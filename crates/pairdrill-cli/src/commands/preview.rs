//! The `pairdrill preview` command.

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use pairdrill_core::loader::{list_sheets, load_table, Table as DeckTable};
use pairdrill_core::model::Deck;

use crate::context::DeckArgs;

pub fn execute(deck: DeckArgs, rows: usize) -> Result<()> {
    let opts = deck.load_options()?;

    let Some(path) = deck.resolve_path() else {
        println!("No deck file given and no dict.* found; showing the built-in sample.");
        print_builtin();
        return Ok(());
    };

    let sheets = list_sheets(&path)?;
    if !sheets.is_empty() {
        println!("Sheets: {}", sheets.join(", "));
    }

    let table = load_table(&path, &opts)
        .with_context(|| format!("failed to load deck: {}", path.display()))?;
    let (col_a, col_b) = (opts.column_a, opts.column_b());

    let mut out = Table::new();
    let width = table.width();
    let mut header = vec![Cell::new("#")];
    for i in 0..width {
        let name = table
            .headers
            .get(i)
            .cloned()
            .unwrap_or_else(|| format!("col{}", i + 1));
        let label = if i == col_a {
            format!("{name} (A)")
        } else if i == col_b {
            format!("{name} (B)")
        } else {
            name
        };
        header.push(Cell::new(label));
    }
    out.set_header(header);

    for (n, row) in table.preview(rows).iter().enumerate() {
        let mut cells = vec![Cell::new(n + 1)];
        cells.extend((0..width).map(|c| Cell::new(DeckTable::cell(row, c))));
        out.add_row(cells);
    }

    println!("{out}");
    println!(
        "Showing {} of {} rows from {}",
        table.preview(rows).len(),
        table.rows.len(),
        path.display()
    );
    if col_a.max(col_b) >= width {
        println!(
            "Warning: the table has {} columns; A/B columns {} and {} are not both present.",
            width,
            col_a + 1,
            col_b + 1
        );
    }

    Ok(())
}

fn print_builtin() {
    let deck = Deck::builtin();
    let mut out = Table::new();
    out.set_header(vec!["#", "A", "B"]);
    for (n, pair) in deck.pairs.iter().enumerate() {
        out.add_row(vec![Cell::new(n + 1), Cell::new(&pair.a), Cell::new(&pair.b)]);
    }
    println!("{out}");
}
