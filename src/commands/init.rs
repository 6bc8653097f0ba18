use crate::config::{init_config, token_path};
use crate::credentials::TOKEN_ENV;
use crate::display;
use crate::error::Result;
use std::path::Path;

pub fn run(config_path: &Path) -> Result<()> {
    if !init_config(config_path)? {
        display::warn(&format!(
            "{} already exists, leaving it unchanged.",
            config_path.display()
        ));
        return Ok(());
    }

    display::success(&format!("Created {}", config_path.display()));
    println!(
        "Edit it, then provide a token via ${TOKEN_ENV} or {} and run `chperm --org` or `chperm --repos`.",
        token_path(config_path).display()
    );
    Ok(())
}
