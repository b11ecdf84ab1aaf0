use std::env;
use std::process;
use legal_oracle::services::auth_service::{hash_password, MIN_PASSWORD_LENGTH};

fn main() {
    let password = match env::args().nth(1) {
        Some(password) => password,
        None => {
            eprintln!("Usage: hash_password <password>");
            process::exit(1);
        }
    };
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        eprintln!("Password must be at least {} characters", MIN_PASSWORD_LENGTH);
        process::exit(1);
    }

    match hash_password(&password) {
        Ok(hash) => {
            println!("ADMIN_PASSWORD_HASH={}", hash);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}
