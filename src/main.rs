use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    coursescrape::logging::init("info").context("init logging")?;

    let cli = coursescrape::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match &cli.command {
        coursescrape::cli::Command::Terms => {
            coursescrape::crawl::run_terms(&cli.connection).context("terms")?;
        }
        coursescrape::cli::Command::Subjects(args) => {
            coursescrape::crawl::run_subjects(&cli.connection, args).context("subjects")?;
        }
        coursescrape::cli::Command::Search(args) => {
            coursescrape::crawl::run_search(&cli.connection, args).context("search")?;
        }
    }

    Ok(())
}
