//! 初期管理者用のパスワードハッシュを生成する
//!
//! `cargo run --bin generate-password-hash -- <password>`

use clinic_backend::utils::password::{Argon2Config, PasswordManager, PasswordPolicy};
use std::io::{self, Write};
use std::process::ExitCode;

fn read_password() -> io::Result<String> {
    if let Some(password) = std::env::args().nth(1) {
        return Ok(password);
    }

    print!("Enter password to hash: ");
    io::stdout().flush()?;

    let mut password = String::new();
    io::stdin().read_line(&mut password)?;
    Ok(password.trim().to_string())
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let password = match read_password() {
        Ok(password) if !password.is_empty() => password,
        Ok(_) => {
            eprintln!("Error: Password cannot be empty");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error reading password: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // サーバーと同じ Argon2 パラメータとポリシーを使う
    let manager = match PasswordManager::new(Argon2Config::from_env(), PasswordPolicy::from_env())
    {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match manager.hash_password(&password) {
        Ok(password_hash) => {
            println!("\n=== Password Hash Generated ===");
            println!("Hash: {}", password_hash);
            println!("\nTo use in .env file:");
            println!("INITIAL_ADMIN_PASSWORD_HASH={}", password_hash);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error generating password hash: {}", e);
            ExitCode::FAILURE
        }
    }
}
