use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quire::build::{build_site, load};
use quire::config::Config;

/// Builds a static blog from a directory of markdown posts.
#[derive(Parser)]
#[command(name = "quire", version, about)]
struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the site into the output directory.
    Build(BuildArgs),

    /// Print every post route and the post it resolves to.
    Routes(ProjectArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// A directory containing `quire.yaml`, or any directory beneath one.
    #[arg(short, long, default_value = ".")]
    project: PathBuf,
}

#[derive(Args)]
struct BuildArgs {
    #[command(flatten)]
    project: ProjectArgs,

    /// Where the generated site is written.
    #[arg(short, long, default_value = "_site")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "quire=debug" } else { "info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Build(args) => {
            let config = Config::from_directory(&args.project.project, &args.output)
                .context("loading project")?;
            build_site(&config).context("building site")?;
        }
        Command::Routes(args) => {
            let config = Config::from_directory(&args.project, &PathBuf::new())
                .context("loading project")?;
            let (snapshot, table) = load(&config).context("loading posts")?;
            let duplicates = table.duplicates(&snapshot);
            for (route, post) in table.routes().iter().zip(snapshot.posts()) {
                let draft = if post.published { "" } else { " (draft)" };
                println!("/{}/\t{}{}", route.path(), post.title, draft);
            }
            for duplicate in duplicates {
                println!("duplicate: {}", duplicate);
            }
        }
    }
    Ok(())
}
