use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rants::build::{build_site, render_page, Request};
use rants::config::Config;

fn main() -> Result<()> {
    init_tracing();

    let matches = App::new("rants")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("directory")
                .short("C")
                .long("directory")
                .takes_value(true)
                .help("The project directory (or any directory inside it)"),
        )
        .subcommand(
            SubCommand::with_name("render")
                .about("Renders one route and prints the page")
                .arg(
                    Arg::with_name("fragment")
                        .default_value("#/")
                        .help("The route, e.g. `#/post/some-slug`"),
                )
                .arg(
                    Arg::with_name("tag")
                        .long("tag")
                        .takes_value(true)
                        .help("Only list posts with this tag (`All` for every post)"),
                )
                .arg(
                    Arg::with_name("search")
                        .long("search")
                        .takes_value(true)
                        .help("Only list posts containing this text"),
                ),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Pre-renders every route into a static directory")
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .default_value("public")
                        .help("The output directory, relative to the project root"),
                ),
        )
        .get_matches();

    let cwd = env::current_dir()?;
    let directory = match matches.value_of("directory") {
        Some(dir) => cwd.join(dir),
        None => cwd,
    };

    match matches.subcommand() {
        ("render", Some(sub)) => render(&directory, sub),
        ("build", Some(sub)) => build(&directory, sub),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn render(directory: &Path, matches: &ArgMatches) -> Result<()> {
    let config = Config::from_directory(directory, Path::new("public"))?;
    let request = Request {
        fragment: matches.value_of("fragment").unwrap_or("#/").to_owned(),
        tag: matches.value_of("tag").map(str::to_owned),
        search: matches.value_of("search").map(str::to_owned),
    };
    println!("{}", render_page(&config, &request)?);
    Ok(())
}

fn build(directory: &Path, matches: &ArgMatches) -> Result<()> {
    let output = PathBuf::from(matches.value_of("output").unwrap_or("public"));
    let config = Config::from_directory(directory, &output)?;
    build_site(&config)?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RANTS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("rants=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
