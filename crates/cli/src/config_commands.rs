use {anyhow::Result, clap::Subcommand};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the path of the configuration file in use.
    Path,
}

pub fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => show(),
        ConfigAction::Path => {
            let path = wheelhouse_config::find_or_default_config_path();
            println!("{}", path.display());
            Ok(())
        },
    }
}

/// Print the effective configuration after file discovery and defaults.
fn show() -> Result<()> {
    let path = wheelhouse_config::find_or_default_config_path();
    if path.exists() {
        eprintln!("# {}", path.display());
    } else {
        eprintln!("# no config file found; showing defaults");
    }

    let config = wheelhouse_config::discover_and_load();
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
