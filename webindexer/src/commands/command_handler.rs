use crate::commands::args::{Args, Command, ListArgs, OutputMode};
use crate::config::{is_within_root, resolve_settings, Config};
use crate::error::{ConfigErrorKind, IndexerError, Result};
use crate::filter::access_resolver;
use crate::formatter::TableFormatter;
use crate::lister::{list_entries, ListingContext};
use crate::server::{self, Indexer};
use colored::*;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub fn handle_command(args: &Args, config: Config, config_path: &Path) -> Result<()> {
    match &args.command {
        Command::Serve { root, bind } => serve(config, root.as_deref(), bind.as_deref()),
        Command::List(list) => list_directory(args, list, config),
        Command::Settings { directory, root } => {
            print_settings(config, directory, root.as_deref())
        }
        Command::InitConfig => initialize_config(config_path),
    }
}

fn with_root(mut config: Config, root: Option<&Path>) -> Config {
    if let Some(root) = root {
        config.root = root.to_path_buf();
    }
    config
}

/// Canonical `directory` and its web path relative to `root`.
fn locate(directory: &Path, root: &Path) -> Result<(PathBuf, String)> {
    let directory = directory.canonicalize().map_err(|err| {
        IndexerError::Config(ConfigErrorKind::InvalidPath(format!(
            "Cannot open {}: {}",
            directory.display(),
            err
        )))
    })?;
    if !directory.is_dir() || !is_within_root(&directory, root) {
        return Err(IndexerError::Config(ConfigErrorKind::InvalidPath(format!(
            "{} is not a directory inside {}",
            directory.display(),
            root.display()
        ))));
    }

    let mut web_path = String::from("/");
    if let Ok(relative) = directory.strip_prefix(root) {
        for component in relative.components() {
            web_path.push_str(&component.as_os_str().to_string_lossy());
            web_path.push('/');
        }
    }
    Ok((directory, web_path))
}

fn serve(config: Config, root: Option<&Path>, bind: Option<&str>) -> Result<()> {
    let mut config = with_root(config, root);
    if let Some(bind) = bind {
        config.bind = bind.to_string();
    }
    config.validate()?;

    let indexer = Arc::new(Indexer::from_config(&config)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server::serve(indexer, &config.bind))
}

fn list_directory(args: &Args, list: &ListArgs, config: Config) -> Result<()> {
    let config = with_root(config, list.root.as_deref());
    let root = config.canonical_root()?;
    let (directory, web_path) = locate(&list.directory, &root)?;

    let mut settings = resolve_settings(&directory, &root);
    if !settings.is_authorized(list.credentials.as_ref()) {
        return Err(IndexerError::Other(format!(
            "Login required to list {}",
            web_path
        )));
    }
    if let Some(style) = list.sort_style {
        settings.sort_style = style;
    }
    if let Some(dir) = list.sort_dir {
        settings.sort_dir = dir;
    }
    debug!(directory = %directory.display(), web_path = %web_path, "listing");

    let ctx = ListingContext {
        base_url: &config.base_url,
        web_path: &web_path,
        local_path: &directory,
    };
    let access = access_resolver(&config.access_attributes);
    let entries = list_entries(&ctx, &settings, list.credentials.as_ref(), access.as_ref())?;

    match list.output_mode {
        OutputMode::Json { pretty } => {
            let output = if pretty {
                serde_json::to_string_pretty(&entries)?
            } else {
                serde_json::to_string(&entries)?
            };
            println!("{}", output);
        }
        OutputMode::Human => {
            let use_color = !args.no_color && std::io::stdout().is_terminal();
            print!("{}", TableFormatter::new(use_color).format_entries(&entries));
        }
    }
    Ok(())
}

fn print_settings(config: Config, directory: &Path, root: Option<&Path>) -> Result<()> {
    let config = with_root(config, root);
    let root = config.canonical_root()?;
    let (directory, _) = locate(directory, &root)?;
    let settings = resolve_settings(&directory, &root);
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

pub fn initialize_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!(
            "Config file already exists at {}",
            config_path.display().to_string().cyan()
        );
        return Ok(());
    }

    Config::default().save(config_path)?;
    println!(
        "{} Created default configuration at {}",
        "✓".green(),
        config_path.display().to_string().cyan()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn web_path_of_nested_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("a").join("b c")).unwrap();

        let (_, web_path) = locate(&root.join("a").join("b c"), &root).unwrap();
        assert_eq!(web_path, "/a/b c/");
        let (_, web_path) = locate(&root, &root).unwrap();
        assert_eq!(web_path, "/");
    }

    #[test]
    fn directory_outside_root_is_rejected() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().canonicalize().unwrap().join("served");
        fs::create_dir_all(&root).unwrap();
        assert!(locate(outer.path(), &root).is_err());
        assert!(locate(&root.join("missing"), &root).is_err());
    }

    #[test]
    fn init_writes_loadable_config_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("webindexer").join("config.toml");
        initialize_config(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(Config::load(&path).is_ok());

        initialize_config(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), written);
    }
}
