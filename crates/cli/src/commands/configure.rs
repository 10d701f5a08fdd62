//! Local CLI configuration commands

use anyhow::Result;

use crate::config::Config;
use crate::output::{print_info, print_json, print_success, OutputFormat};

/// Show the stored configuration
pub fn show(format: OutputFormat) -> Result<()> {
    let config = Config::load()?;

    match format {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Table => {
            print_info(&format!("Config file: {}", Config::config_path()?.display()));
            println!("API URL:                {}", config.api_url.as_deref().unwrap_or("(default)"));
            println!(
                "Default format:         {}",
                config.default_format.as_deref().unwrap_or("(default)")
            );
        }
    }

    Ok(())
}

/// Update stored defaults; unset arguments keep their current value
pub fn set(api_url: Option<String>, default_format: Option<OutputFormat>) -> Result<()> {
    let mut config = Config::load()?;

    if let Some(url) = api_url {
        url::Url::parse(&url)?;
        config.api_url = Some(url);
    }
    if let Some(format) = default_format {
        let name = match format {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        };
        config.default_format = Some(name.to_string());
    }

    let path = config.save()?;
    print_success(&format!("Saved {}", path.display()));

    Ok(())
}
