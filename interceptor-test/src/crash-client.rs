use clap::Parser;
use fault_interceptor::{FaultInterceptor, FsReportStore, InstallOptions};
use interceptor_test::Flavor;
use sadness_generator::SadnessFlavor;
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
struct Command {
    /// The directory crash reports are written to
    #[clap(long)]
    dir: PathBuf,
    /// The kind of panic to raise
    #[clap(long, value_enum)]
    flavor: Flavor,
    /// Raises the panic on a separate thread rather than the main thread
    #[clap(long)]
    use_thread: bool,
    /// Also hands the fault to the default panic hook
    #[clap(long)]
    force_delegate: bool,
}

fn real_main() -> anyhow::Result<()> {
    let cmd = Command::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    println!("pid: {}", std::process::id());

    let _interceptor = FaultInterceptor::attach(
        fault_interceptor::app_context!(interceptor_test::BUILD)
            .with_entry("pid", std::process::id().to_string()),
        InstallOptions {
            force_delegate: cmd.force_delegate,
            store: Some(Arc::new(FsReportStore::with_root(&cmd.dir))),
            ..Default::default()
        },
    )?;

    let flavor = SadnessFlavor::from(cmd.flavor);

    if cmd.use_thread {
        // The interceptor exits the process before the join returns
        let _res = sadness_generator::panic_on_thread(flavor).join();
    } else {
        flavor.make_sad();
    }

    anyhow::bail!("we should have panicked and exited");
}

fn main() {
    // We want this program to crash and have a report written, it _shouldn't_
    // have errors that prevent that from happening, so emit an error code if we
    // do encounter an error so that we can fail the test
    if let Err(e) = real_main() {
        eprintln!("error: {e:#}");
        std::process::exit(222);
    }
}
