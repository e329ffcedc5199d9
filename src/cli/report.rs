use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::error::Result;
use crate::fmt::money;
use crate::models::Dataset;
use crate::summary::{compute, Statistics};

use super::load_with_progress;

fn freq_table(title: &str, label: &str, entries: &[(String, usize)]) -> String {
    let mut table = Table::new();
    table.set_header(vec![label, "Qtd."]);
    for (value, count) in entries {
        table.add_row(vec![
            Cell::new(value),
            Cell::new(count).set_alignment(CellAlignment::Right),
        ]);
    }
    format!("{}\n{table}", title.bold())
}

pub(crate) fn render(stats: &Statistics) -> String {
    let v = &stats.invoice_value;
    let dash = || "-".to_string();

    let mut overview = Table::new();
    overview.set_header(vec!["Indicador", "Valor"]);
    let rows = [
        ("Notas", stats.invoice_count.to_string()),
        ("Itens", stats.item_count.to_string()),
        ("Linhas combinadas", stats.joined_count.to_string()),
        ("Notas sem itens", stats.headers_without_items.to_string()),
        ("Valor total", money(&v.total)),
        ("Média por nota", v.mean.as_ref().map(money).unwrap_or_else(dash)),
        ("Maior nota", v.max.as_ref().map(money).unwrap_or_else(dash)),
        ("Menor nota", v.min.as_ref().map(money).unwrap_or_else(dash)),
    ];
    for (label, value) in rows {
        overview.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    [
        format!("{}\n{overview}", "Resumo".green().bold()),
        freq_table("Principais destinatários", "Destinatário", &stats.top_recipients),
        freq_table("Principais produtos", "Produto", &stats.top_products),
        freq_table("Tipos de operação", "Natureza", &stats.top_operations),
        freq_table("UF emitente", "UF", &stats.issuer_states),
        freq_table("UF destinatário", "UF", &stats.recipient_states),
    ]
    .join("\n\n")
}

pub(crate) fn print(dataset: &Dataset) {
    println!("{}", render(&compute(dataset)));
}

pub fn run(archive: &str) -> Result<()> {
    let dataset = load_with_progress(archive)?;
    print(&dataset);
    Ok(())
}
