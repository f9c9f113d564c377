//! `handoff secret generate` - Generate a new shared secret.

use handoff_token::SharedSecret;
use std::fs;
use std::path::PathBuf;

/// Generate a new shared secret.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let secret = SharedSecret::generate_encoded();

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, format!("{secret}\n"))?;

        println!("✔ Generated shared secret: {}", path.display());
        println!();
        println!("⚠️  Both platforms must use the same secret.");
        println!("   Never commit it to version control.");
        println!();
        println!("Point token.secret_file at it, or:");
        println!("  export HANDOFF_SSO_SECRET=$(cat {})", path.display());
    } else {
        println!("{secret}");
    }

    Ok(())
}
