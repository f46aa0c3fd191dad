//! Combinatorial-auction front end. The program shares the solving argument
//! surface of `mrcpsp2smt`; the auction model itself has never been wired
//! up, so after validating the arguments it exits cleanly.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use mrcpsp2smt::cli::{buffer_writers, SolvingArgs};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Solve the combinatorial auctions problem",
    long_about = None
)]
struct AuctionArgs {
    /// Instance file path
    filename: PathBuf,
    #[command(flatten)]
    solving: SolvingArgs,
}

fn main() -> ExitCode {
    let args = AuctionArgs::parse();
    let (stdout, _) = buffer_writers(&args.solving.color);
    let mut buffer = stdout.buffer();
    use std::io::Write;
    let _ = writeln!(buffer, "c auction2smt: instance {}", args.filename.display());
    let _ = stdout.print(&buffer);
    ExitCode::SUCCESS
}
