//! Seed helper: hashes a password and prints the SQL that creates an admin
//! account for it.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let mut args = env::args().skip(1);
    let (Some(email), Some(password)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --bin hash-password <EMAIL> <PASSWORD>");
        std::process::exit(1);
    };

    if let Err(e) = portfolio_site::validation::validate_sign_up(
        &portfolio_site::validation::SignUpPayload {
            email: email.clone(),
            password: password.clone(),
            repeat_password: password.clone(),
        },
    ) {
        eprintln!("Rejected: {}", e);
        std::process::exit(1);
    }

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            let email = email.trim().to_lowercase().replace('\'', "''");
            println!("\nCost     : {}", DEFAULT_COST);
            println!("Hash     : {}\n", hashed);
            println!("-- Run against the site database:");
            println!(
                "WITH u AS (INSERT INTO users (email, password_hash) VALUES ('{}', '{}') RETURNING id)\n\
                 INSERT INTO profiles (id, is_admin) SELECT id, TRUE FROM u;",
                email, hashed
            );
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
