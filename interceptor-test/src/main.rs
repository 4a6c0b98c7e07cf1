use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use interceptor_test::*;

#[derive(Parser)]
struct Command {
    /// The kind of panic to raise
    #[clap(long, value_enum)]
    flavor: Option<Flavor>,
    /// Raises the panic on a separate thread rather than the main thread
    #[clap(long)]
    use_thread: bool,
    /// Lists the available flavors
    #[clap(long)]
    list: bool,
    /// Keeps the report in this directory rather than a temporary one
    #[clap(long)]
    dir: Option<PathBuf>,
}

fn run(flavor: Flavor, use_thread: bool, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let tmp;
    let dir = match dir {
        Some(dir) => dir,
        None => {
            tmp = tempfile::tempdir()?;
            tmp.path().to_owned()
        }
    };

    run_client(&dir, flavor, use_thread);

    let report = read_report(&dir);
    assert_report(&report, flavor, use_thread);

    for (key, value) in report.environment.iter() {
        println!("{key}: {value}");
    }
    println!("{}", report.trace);

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Command::parse();
    capture_output();

    if cli.list {
        for variant in Flavor::value_variants() {
            println!("{variant}");
        }
    } else if let Some(flavor) = cli.flavor {
        run(flavor, cli.use_thread, cli.dir)?;
    } else {
        println!("must pass --flavor (see available choices with --list)");
    }

    Ok(())
}
