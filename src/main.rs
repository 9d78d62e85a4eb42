use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::{Path, PathBuf};
use timenotes::build::{build_site, load_blog};
use timenotes::comment::{save_comments, CommentForm};
use timenotes::config::Config;
use tracing::{info, warn, Level};

const DEFAULT_OUTPUT_DIRECTORY: &str = "_site";

fn main() {
    let matches = App::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .global(true)
                .help("Logs more (-v for debug, -vv for trace)"),
        )
        .arg(
            Arg::with_name("project")
                .short("C")
                .long("project")
                .takes_value(true)
                .global(true)
                .help("The project directory (defaults to the current directory)"),
        )
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site")
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("The output directory (defaults to `_site`)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("search")
                .about("Lists the posts whose title or body contains QUERY")
                .arg(Arg::with_name("query").index(1)),
        )
        .subcommand(
            SubCommand::with_name("comment")
                .about("Adds a comment to a post")
                .arg(Arg::with_name("post").index(1).required(true))
                .arg(
                    Arg::with_name("name")
                        .long("name")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("email")
                        .long("email")
                        .takes_value(true)
                        .required(true),
                )
                .arg(Arg::with_name("url").long("url").takes_value(true))
                .arg(
                    Arg::with_name("text")
                        .long("text")
                        .takes_value(true)
                        .required(true),
                ),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_max_level(match matches.occurrences_of("verbose") {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        })
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&matches) {
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let project = PathBuf::from(matches.value_of("project").unwrap_or("."));
    match matches.subcommand() {
        ("build", Some(sub)) => {
            let output = Path::new(sub.value_of("output").unwrap_or(DEFAULT_OUTPUT_DIRECTORY));
            build_site(Config::from_directory(&project, output)?)?;
        }
        ("search", Some(sub)) => search(&project, sub.value_of("query"))?,
        ("comment", Some(sub)) => comment(&project, sub)?,
        (name, _) => return Err(anyhow!("unknown command `{}`", name)),
    }
    Ok(())
}

fn search(project: &Path, query: Option<&str>) -> Result<()> {
    let config = Config::from_directory(project, Path::new(DEFAULT_OUTPUT_DIRECTORY))?;
    let blog = load_blog(&config)?;
    let hits = blog.search(query)?;
    if hits.is_empty() {
        warn!(query = query.unwrap_or_default(), "no posts matched");
    }
    for post in hits {
        println!("{}\t{}", post.title, post.url);
    }
    Ok(())
}

fn comment(project: &Path, matches: &ArgMatches) -> Result<()> {
    let config = Config::from_directory(project, Path::new(DEFAULT_OUTPUT_DIRECTORY))?;
    let mut blog = load_blog(&config)?;
    let post = matches.value_of("post").unwrap_or_default();
    let form = CommentForm {
        name: matches.value_of("name").unwrap_or_default().to_owned(),
        email: matches.value_of("email").unwrap_or_default().to_owned(),
        url: matches.value_of("url").unwrap_or_default().to_owned(),
        text: matches.value_of("text").unwrap_or_default().to_owned(),
    };

    blog.post_comment(post, &form, Local::now().naive_local())?;
    let path = save_comments(&config.comments_directory, post, blog.comments(post))
        .with_context(|| format!("Saving comments for `{}`", post))?;
    info!(path = %path.display(), "stored comment");
    Ok(())
}
