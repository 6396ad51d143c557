// Bookstock - Publisher/Book/Shop Sales Reporting
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;

use bookstock::config;
use bookstock::report::render_sales_table;
use bookstock::storage::models::{NewBook, NewPublisher, NewSale, NewShop, NewStock, Record};
use bookstock::storage::{queries, Database};

#[derive(Parser)]
#[command(name = "bookstock-cli")]
#[command(about = "Bookstock CLI - publisher sales reporting", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Seed the sample dataset, then prompt for a publisher and report
    Demo,
    /// Load seed records from a JSON file of tagged objects
    Load {
        /// Path to a JSON array of {"model", "pk", "fields"} items
        file: PathBuf,
    },
    /// Report shops selling a publisher's books
    Report {
        /// Publisher name or numeric id (prompted when omitted)
        publisher: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Missing connection configuration is the one fatal startup condition
    let url = match config::database_url() {
        Ok(url) => url,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let cli = Cli::parse();
    if let Err(e) = run(cli.command, &url).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, url: &str) -> bookstock::Result<()> {
    let db = Database::connect(url).await?;
    db.create_schema().await?;

    match command {
        Commands::Init => {
            println!("Schema created.");
        }
        Commands::Demo => {
            // a failed batch rolls back in full and the report still runs
            match db.add_records(&demo_records()).await {
                Ok(ids) => println!("Records added successfully ({}).", ids.len()),
                Err(e) => eprintln!("Error adding records: {e}"),
            }
            let publisher = prompt_publisher()?;
            print_report(&db, &publisher).await;
        }
        Commands::Load { file } => {
            match db.load_from_json_file(&file).await {
                Ok(report) => println!(
                    "Data from {} loaded successfully ({} added, {} skipped).",
                    file.display(),
                    report.added,
                    report.skipped
                ),
                Err(e) => eprintln!("Error loading data from {}: {e}", file.display()),
            }
        }
        Commands::Report { publisher } => {
            let publisher = match publisher {
                Some(publisher) => publisher,
                None => prompt_publisher()?,
            };
            print_report(&db, &publisher).await;
        }
    }

    Ok(())
}

async fn print_report(db: &Database, publisher: &str) {
    let rows = queries::shops_selling_publisher(db.pool(), publisher).await;
    if rows.is_empty() {
        println!("No sales found for that publisher.");
    } else {
        print!("{}", render_sales_table(&rows));
    }
}

fn prompt_publisher() -> io::Result<String> {
    print!("Enter publisher name or id: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// The sample dataset: two publishers, three books, two shops, stock and one
/// sale per stock entry. Explicit ids wire the foreign keys.
fn demo_records() -> Vec<Record> {
    let today = chrono::Local::now().date_naive();

    vec![
        Record::Publisher(NewPublisher {
            id: Some(1),
            name: "ПИТЕР".to_string(),
        }),
        Record::Publisher(NewPublisher {
            id: Some(2),
            name: "O'Reilly Media".to_string(),
        }),
        Record::Book(NewBook {
            id: Some(1),
            title: "Изучаем Python".to_string(),
            id_publisher: Some(1),
        }),
        Record::Book(NewBook {
            id: Some(2),
            title: "Чистый код".to_string(),
            id_publisher: Some(1),
        }),
        Record::Book(NewBook {
            id: Some(3),
            title: "PostgreSQL - Administration".to_string(),
            id_publisher: Some(2),
        }),
        Record::Shop(NewShop {
            id: Some(1),
            name: "Буквоед".to_string(),
        }),
        Record::Shop(NewShop {
            id: Some(2),
            name: "Подписные Издания".to_string(),
        }),
        Record::Stock(NewStock {
            id: Some(1),
            id_book: 1,
            id_shop: 1,
            count: 10,
        }),
        Record::Stock(NewStock {
            id: Some(2),
            id_book: 2,
            id_shop: 2,
            count: 5,
        }),
        Record::Stock(NewStock {
            id: Some(3),
            id_book: 3,
            id_shop: 2,
            count: 15,
        }),
        Record::Sale(NewSale {
            id: Some(1),
            price: 100.0,
            date_sale: today,
            count: 2,
            id_stock: 1,
        }),
        Record::Sale(NewSale {
            id: Some(2),
            price: 200.0,
            date_sale: today,
            count: 1,
            id_stock: 2,
        }),
        Record::Sale(NewSale {
            id: Some(3),
            price: 500.0,
            date_sale: today,
            count: 3,
            id_stock: 3,
        }),
    ]
}
