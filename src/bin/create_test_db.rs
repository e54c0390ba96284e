use std::{
    error::Error,
    path::Path,
    process::exit,
    sync::{Arc, Mutex},
};

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use fintrack_rs::{
    CategoryName, NewAccount, NewCategory, NewTransaction, Session, TransactionKind,
    initialize_db,
};

/// A utility for creating a test database for fintrack_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The owner ID to seed the sample data under.
    #[arg(long, default_value_t = 1)]
    owner_id: i64,
}

/// Create and populate a database for manual testing.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Seeding sample data for owner {}...", args.owner_id);

    let session = Session::sign_in(Arc::new(Mutex::new(conn)), args.owner_id);

    let salary = session
        .create_category(NewCategory {
            name: CategoryName::new("Salary")?,
            kind: TransactionKind::Income,
            icon: "banknote".to_owned(),
            color: "#22c55e".to_owned(),
        })
        .await?;
    let rent = session
        .create_category(NewCategory {
            name: CategoryName::new("Rent")?,
            kind: TransactionKind::Expense,
            icon: "home".to_owned(),
            color: "#ef4444".to_owned(),
        })
        .await?;
    let groceries = session
        .create_category(NewCategory {
            name: CategoryName::new("Groceries")?,
            kind: TransactionKind::Expense,
            icon: "cart".to_owned(),
            color: "#f97316".to_owned(),
        })
        .await?;

    let everyday = session
        .create_account(NewAccount {
            name: "Everyday".to_owned(),
            institution: "Kiwibank".to_owned(),
            color: "#336699".to_owned(),
        })
        .await?;

    let status_id = session
        .status_options()
        .await?
        .first()
        .ok_or("No statuses were seeded")?
        .value;

    let today = OffsetDateTime::now_utc().date();
    let samples = [
        (TransactionKind::Income, 4200.0, salary.id, "Monthly pay"),
        (TransactionKind::Expense, 1800.0, rent.id, "Flat rent"),
        (TransactionKind::Expense, 154.2, groceries.id, "Weekly shop"),
        (TransactionKind::Expense, 89.9, groceries.id, "Top-up shop"),
    ];

    for (kind, amount, category_id, description) in samples {
        session
            .create_transaction(NewTransaction {
                date: today,
                description: description.to_owned(),
                kind,
                amount,
                category_id,
                account_id: everyday.id,
                status_id,
            })
            .await?;
    }

    println!("Success!");

    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}
