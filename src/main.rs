mod cli;

use sourcecast::{
    command::{self, CommandTemplate},
    config,
};
use sourcecast_util::{
    locale_codeset, locale_to_utf8, parse_stream_url, replace_first, shell_quote,
    utf8_to_locale, write_pid_file, ConversionMode,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::ffi::OsStr;
use std::io::{Read, Write};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "sourcecast=trace,sourcecast_util=trace".to_string()
        } else {
            "sourcecast=info,sourcecast_util=info".to_string()
        }
    });

    // stdout carries converted text, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            println!("sourcecast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        command => {
            let config = config::load_config_or_default(cli.config.as_deref())?;

            let pid_file = cli.pid_file.as_deref().or(config.pid_file.as_deref());
            write_pid_file(pid_file).context("Failed to write pid file")?;

            run_command(command, &config)
        }
    }
}

fn run_command(command: Commands, config: &config::Config) -> Result<()> {
    let default_mode = config.metadata.charset_mode;

    match command {
        Commands::ToUtf8 { mode } => to_utf8(mode.unwrap_or(default_mode)),
        Commands::FromUtf8 { mode } => from_utf8(mode.unwrap_or(default_mode)),
        Commands::Codeset => {
            println!("{}", locale_codeset());
            Ok(())
        }
        Commands::Quote { text } => {
            println!("{}", shell_quote(&text));
            Ok(())
        }
        Commands::Replace {
            source,
            needle,
            value,
        } => {
            println!("{}", replace_first(&source, &needle, &value));
            Ok(())
        }
        Commands::ParseUrl { url, json } => parse_url(&url, json),
        Commands::Decoder {
            file,
            artist,
            title,
            stream,
        } => {
            let mut template = CommandTemplate::new()
                .with_mode(default_mode)
                .with_track(&file);
            if let Some(ref artist) = artist {
                template = template.with_artist_bytes(&os_bytes(artist));
            }
            if let Some(ref title) = title {
                template = template.with_title_bytes(&os_bytes(title));
            }
            if let Some(ref stream) = stream {
                template = template.with_stream(stream);
            }
            show_decoder(config, &file, &template)
        }
        Commands::Validate { .. } | Commands::Version => Ok(()),
    }
}

fn to_utf8(mode: ConversionMode) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read stdin")?;

    tracing::debug!("Converting {} bytes from {} ({})", input.len(), locale_codeset(), mode);
    let output = locale_to_utf8(Some(&input), mode);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn from_utf8(mode: ConversionMode) -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read stdin")?;
    let text = String::from_utf8_lossy(&input);

    tracing::debug!("Converting {} bytes to {} ({})", input.len(), locale_codeset(), mode);
    let output = utf8_to_locale(Some(&text), mode);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}

fn parse_url(url: &str, json: bool) -> Result<()> {
    let parsed = parse_stream_url(url)?;

    if json {
        let json_str = serde_json::to_string_pretty(&parsed)?;
        println!("{}", json_str);
    } else {
        println!("Host: {}", parsed.host);
        println!("Port: {}", parsed.port);
        println!("Mount: {}", parsed.mount);
    }

    Ok(())
}

fn show_decoder(config: &config::Config, file: &Path, template: &CommandTemplate) -> Result<()> {
    let Some(decoder) = command::select_decoder(&config.decoders, file) else {
        anyhow::bail!("No decoder configured for {:?}", file);
    };

    tracing::info!("Using decoder '{}' for {:?}", decoder.name, file);
    println!("{}", template.render(&decoder.program));
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Pid file: {:?}", config.pid_file);
            println!("  Charset mode: {}", config.metadata.charset_mode);
            println!("  Streams: {}", config.streams.len());
            for stream in &config.streams {
                let endpoint = stream.endpoint()?;
                println!("    {} -> {} ({})", stream.name, endpoint, stream.format);
            }
            println!("  Decoders: {}", config.decoders.len());
            println!("  Encoders: {}", config.encoders.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Charset mode: {}", config.metadata.charset_mode);
        }
    }

    Ok(())
}

#[cfg(unix)]
fn os_bytes(value: &OsStr) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    value.as_bytes().to_vec()
}

#[cfg(not(unix))]
fn os_bytes(value: &OsStr) -> Vec<u8> {
    value.to_string_lossy().into_owned().into_bytes()
}
