use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use library_rs::{
    NewBook, PasswordHash, Role, Username, ValidatedPassword, create_book, create_user,
    initialize_db,
};

/// A utility for creating a test database for the library_rs web server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

const TEST_PASSWORD: &str = "test";

const TEST_BOOKS: [(&str, &str); 5] = [
    ("The Left Hand of Darkness", "Ursula K. Le Guin"),
    ("Kindred", "Octavia E. Butler"),
    ("Beloved", "Toni Morrison"),
    ("Solaris", "Stanisław Lem"),
    ("The Remains of the Day", "Kazuo Ishiguro"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
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

    println!("Creating test users...");

    for (username, role) in [("admin", Role::Admin), ("user", Role::User)] {
        let password_hash = PasswordHash::new(
            ValidatedPassword::new_unchecked(TEST_PASSWORD),
            PasswordHash::DEFAULT_COST,
        )?;

        create_user(Username::new(username)?, password_hash, role, &conn)?;
        println!("  {username} ({role}) with the password \"{TEST_PASSWORD}\"");
    }

    println!("Adding books...");

    for (title, author) in TEST_BOOKS {
        create_book(NewBook::new(title, author)?, &conn)?;
    }

    println!("Success!");

    Ok(())
}
