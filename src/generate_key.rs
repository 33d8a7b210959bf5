// generate_key.rs
// Utility to generate a new token encryption key

#[path = "services/encryption.rs"]
mod encryption;

use encryption::TokenCipher;

fn main() {
    println!("Generating new AES-256 token encryption key...\n");

    let key = TokenCipher::generate_key();

    println!("Add this to your .env file:");
    println!("─────────────────────────────────────────────────");
    println!("TOKEN_ENCRYPTION_KEY={}", key);
    println!("─────────────────────────────────────────────────");
    println!("\n⚠️  IMPORTANT:");
    println!("  • Keep this key secure and never commit it to version control");
    println!("  • If you lose this key, stored provider tokens cannot be recovered");
}
