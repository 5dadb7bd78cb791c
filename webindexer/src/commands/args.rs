use crate::config::{Credentials, SortDir, SortStyle};
use crate::error::Result;
use clap::{App, Arg, ArgMatches, SubCommand};
use std::ffi::OsString;
use std::path::PathBuf;

pub struct Args {
    pub config_path: Option<PathBuf>,
    pub no_color: bool,
    pub command: Command,
}

pub enum Command {
    Serve {
        root: Option<PathBuf>,
        bind: Option<String>,
    },
    List(ListArgs),
    Settings {
        directory: PathBuf,
        root: Option<PathBuf>,
    },
    InitConfig,
}

pub struct ListArgs {
    pub directory: PathBuf,
    pub root: Option<PathBuf>,
    pub credentials: Option<Credentials>,
    pub sort_style: Option<SortStyle>,
    pub sort_dir: Option<SortDir>,
    pub output_mode: OutputMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json { pretty: bool },
}

fn root_arg() -> Arg<'static> {
    Arg::with_name("root")
        .long("root")
        .takes_value(true)
        .value_name("DIR")
        .help("Directory served as \"/\" (overrides the config file)")
}

impl Args {
    fn build_cli() -> App<'static> {
        App::new(env!("CARGO_PKG_NAME"))
            .version(env!("CARGO_PKG_VERSION"))
            .about(env!("CARGO_PKG_DESCRIPTION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .arg(
                Arg::with_name("config")
                    .long("config")
                    .takes_value(true)
                    .value_name("PATH")
                    .global(true)
                    .help("Use this configuration file instead of the default one"),
            )
            .arg(
                Arg::with_name("no-color")
                    .long("no-color")
                    .global(true)
                    .help("Disable colored output"),
            )
            .subcommand(
                SubCommand::with_name("serve")
                    .about("Serve the directory tree over HTTP")
                    .arg(root_arg())
                    .arg(
                        Arg::with_name("bind")
                            .long("bind")
                            .takes_value(true)
                            .value_name("ADDR")
                            .help("Address to listen on, e.g. 0.0.0.0:8080"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("list")
                    .about("Print the listing a directory would get")
                    .arg(
                        Arg::with_name("directory")
                            .help("Directory to list")
                            .index(1)
                            .default_value("."),
                    )
                    .arg(root_arg())
                    .arg(
                        Arg::with_name("user")
                            .long("user")
                            .takes_value(true)
                            .value_name("USER:PASSWORD")
                            .help("List as this user instead of anonymously"),
                    )
                    .arg(
                        Arg::with_name("sort-style")
                            .long("sort-style")
                            .takes_value(true)
                            .possible_values(&["name", "size", "date"])
                            .help("Override the directory's sort style"),
                    )
                    .arg(
                        Arg::with_name("sort-dir")
                            .long("sort-dir")
                            .takes_value(true)
                            .possible_values(&["asc", "desc"])
                            .help("Override the directory's sort direction"),
                    )
                    .arg(
                        Arg::with_name("json")
                            .long("json")
                            .help("Output a single JSON array"),
                    )
                    .arg(
                        Arg::with_name("pretty")
                            .long("pretty")
                            .requires("json")
                            .help("Pretty print JSON"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("settings")
                    .about("Print the effective settings of a directory as JSON")
                    .arg(
                        Arg::with_name("directory")
                            .help("Directory to inspect")
                            .index(1)
                            .default_value("."),
                    )
                    .arg(root_arg()),
            )
            .subcommand(
                SubCommand::with_name("init").about("Write the default configuration file"),
            )
    }

    pub fn get_cli() -> App<'static> {
        Self::build_cli()
    }

    pub fn parse() -> Result<Self> {
        Self::from_matches(&Self::build_cli().get_matches())
    }

    pub fn parse_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_matches(&Self::build_cli().get_matches_from(args))
    }

    fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let command = match matches.subcommand() {
            Some(("serve", serve)) => Command::Serve {
                root: serve.value_of("root").map(PathBuf::from),
                bind: serve.value_of("bind").map(String::from),
            },
            Some(("list", list)) => Command::List(Self::list_args(list)?),
            Some(("settings", settings)) => Command::Settings {
                directory: PathBuf::from(settings.value_of("directory").unwrap_or(".")),
                root: settings.value_of("root").map(PathBuf::from),
            },
            _ => Command::InitConfig,
        };

        Ok(Args {
            config_path: matches.value_of("config").map(PathBuf::from),
            no_color: matches.is_present("no-color"),
            command,
        })
    }

    fn list_args(matches: &ArgMatches) -> Result<ListArgs> {
        let output_mode = if matches.is_present("json") {
            OutputMode::Json {
                pretty: matches.is_present("pretty"),
            }
        } else {
            OutputMode::Human
        };

        Ok(ListArgs {
            directory: PathBuf::from(matches.value_of("directory").unwrap_or(".")),
            root: matches.value_of("root").map(PathBuf::from),
            credentials: matches.value_of("user").map(str::parse).transpose()?,
            sort_style: matches.value_of("sort-style").map(str::parse).transpose()?,
            sort_dir: matches.value_of("sort-dir").map(str::parse).transpose()?,
            output_mode,
        })
    }
}
