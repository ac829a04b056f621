#![cfg(not(tarpaulin_include))]

use std::env;
use std::process::ExitCode;

use storeplan::login::hash_password;

/// Print an argon2 hash of the given password, for use as `USER_PASSWORD`.
fn main() -> ExitCode {
    let Some(password) = env::args().nth(1) else {
        eprintln!("usage: hash_password <password>");
        return ExitCode::FAILURE;
    };

    match hash_password(&password) {
        Ok(hash) => {
            println!("{}", hash);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
