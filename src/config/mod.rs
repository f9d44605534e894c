mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./sourcecast.toml",
        "~/.config/sourcecast/config.toml",
        "/etc/sourcecast/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    // Validate streams
    let mut names = HashSet::new();
    for stream in &config.streams {
        if stream.name.is_empty() {
            anyhow::bail!("Stream with url '{}' has no name", stream.url);
        }
        if !names.insert(stream.name.as_str()) {
            anyhow::bail!("Stream '{}' is defined more than once", stream.name);
        }
        stream
            .endpoint()
            .with_context(|| format!("Stream '{}' has an invalid url", stream.name))?;

        if let Some(ref encoder_name) = stream.encoder {
            let Some(encoder) = config.encoder(encoder_name) else {
                anyhow::bail!(
                    "Stream '{}' uses unknown encoder '{}'",
                    stream.name,
                    encoder_name
                );
            };
            if encoder.format != stream.format {
                anyhow::bail!(
                    "Stream '{}' is {} but encoder '{}' produces {}",
                    stream.name,
                    stream.format,
                    encoder.name,
                    encoder.format
                );
            }
        }
    }

    // Validate decoders
    for decoder in &config.decoders {
        if decoder.program.trim().is_empty() {
            anyhow::bail!("Decoder '{}' has no program", decoder.name);
        }
        if decoder.file_ext.is_empty() {
            anyhow::bail!("Decoder '{}' handles no file extensions", decoder.name);
        }
        if let Some(ext) = decoder.file_ext.iter().find(|e| !e.starts_with('.')) {
            anyhow::bail!(
                "Decoder '{}' extension '{}' must start with '.'",
                decoder.name,
                ext
            );
        }
    }

    // Validate encoders
    for encoder in &config.encoders {
        if encoder.program.trim().is_empty() {
            anyhow::bail!("Encoder '{}' has no program", encoder.name);
        }
    }

    if let Some(ref pid_file) = config.pid_file {
        if pid_file.as_os_str().is_empty() {
            anyhow::bail!("pid_file cannot be empty");
        }
    }

    Ok(())
}
