//! dbf_reader - decode a DBF table file and print it
//!
//! Usage:
//!   dbf_reader <table.dbf> [memo.fpt]          - Print header, schema and records
//!   dbf_reader <table.dbf> [memo.fpt] --csv    - Emit the table as CSV

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use dbf_reader::{csv, Table, TableReader};

#[derive(Parser)]
#[command(name = "dbf_reader")]
#[command(about = "Decode a DBF table file and print it", long_about = None)]
struct Cli {
    /// Path to the .dbf table file
    dbf_file: PathBuf,

    /// Path to the companion memo file (.fpt/.dbt), if any
    memo_file: Option<PathBuf>,

    /// Emit CSV instead of the summary view
    #[arg(long)]
    csv: bool,
}

fn print_summary(table: &Table) {
    println!("version:       {} (0x{:02x})", table.version, table.version.code());
    match table.last_update {
        Some(date) => println!("last update:   {}", date),
        None => println!("last update:   -"),
    }
    println!("records:       {}", table.record_count);
    println!("header length: {}", table.header_length);
    println!("record length: {}", table.record_length);
    if let Some(block_size) = table.memo_block_size {
        println!("memo blocks:   {} bytes", block_size);
    }
    println!(
        "flags:         cdx={} memo={} dbc={}",
        table.has_structural_cdx, table.has_memo_field, table.is_dbc_database
    );

    println!();
    for field in &table.fields {
        println!(
            "  {:<10} {} size={} decimals={}",
            field.name, field.field_type, field.size, field.decimal_places
        );
    }

    println!();
    for (i, record) in table.records.iter().enumerate() {
        let marker = if record.deleted { "*" } else { " " };
        let cells: Vec<String> = record.values.iter().map(|v| v.to_string()).collect();
        println!("{}{:>6} {}", marker, i, cells.join(" | "));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let dbf = fs::read(&cli.dbf_file)
        .with_context(|| format!("Failed to read {}", cli.dbf_file.display()))?;
    let memo = match &cli.memo_file {
        Some(path) => Some(
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let table = TableReader::new(&dbf, memo.as_deref())
        .read()
        .with_context(|| format!("Failed to decode {}", cli.dbf_file.display()))?;

    if cli.csv {
        print!("{}", csv::to_csv(&table));
    } else {
        print_summary(&table);
    }

    Ok(())
}
