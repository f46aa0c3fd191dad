//! # Command Line Interface for the Solver Binaries

use std::fmt;
use std::io::Error as IOError;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{crate_name, crate_version, Args, Parser, ValueEnum};
use mrcpsp2smt_core::types::SolveStats;
use mrcpsp2smt_core::{Config, EncodingKind, Limits, OptStrategy, Schedule, WriteSolveLog};
use mrcpsp2smt_core::options::{AmoEncoding, EncodingConfig, PbEncoding, SearchOptions};
use termcolor::{BufferWriter, Color, ColorSpec, WriteColor};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Solve the Multi-mode Resource-Constrained Project Scheduling Problem (MRCPSP)",
    long_about = None
)]
pub struct CliArgs {
    /// Instance file name
    pub filename: PathBuf,
    /// Compute a better upper bound than the trivial one using a greedy
    /// heuristic; ignored when an upper bound is given with -u
    #[arg(short = 'U', long = "upper", default_value_t = Bool::True)]
    pub upper: Bool,
    /// Encoding of the problem
    #[arg(short = 'E', long = "encoding", default_value_t = EncodingArg::Smttime)]
    pub encoding: EncodingArg,
    #[command(flatten)]
    pub solving: SolvingArgs,
}

/// Solving options shared by all programs.
#[derive(Args)]
pub struct SolvingArgs {
    /// Explicit initial upper bound
    #[arg(short = 'u', long = "upper-bound")]
    pub upper_bound: Option<i32>,
    /// Explicit initial lower bound
    #[arg(short = 'l', long = "lower-bound")]
    pub lower_bound: Option<i32>,
    /// Emit the formula to stdout without solving
    #[arg(long = "output-encoding", default_value_t = Bool::False)]
    pub output_encoding: Bool,
    /// Submit bounds as retractable assumptions instead of clauses
    #[arg(long = "assumptions", default_value_t = Bool::False)]
    pub assumptions: Bool,
    /// Tighten the formula in place when the bounds shrink
    #[arg(long = "narrow-bounds", default_value_t = Bool::False)]
    pub narrow_bounds: Bool,
    /// AMO-PB encoding variant
    #[arg(long = "amopb", default_value_t = PbArg::Gte)]
    pub amopb: PbArg,
    /// PB encoding variant
    #[arg(long = "pb", default_value_t = PbArg::Gte)]
    pub pb: PbArg,
    /// AMO encoding variant
    #[arg(long = "amo", default_value_t = AmoArg::Pairwise)]
    pub amo: AmoArg,
    /// Optimization strategy
    #[arg(long = "optimizer", default_value_t = OptimizerArg::LinearUb)]
    pub optimizer: OptimizerArg,
    /// Wall-clock limit in seconds; 0 disables the limit
    #[arg(long = "timeout", default_value_t = 0)]
    pub timeout: u64,
    /// Print proved bounds after every decider call
    #[arg(long = "print-checks", default_value_t = Bool::False)]
    pub print_checks: Bool,
    /// Print decider call statistics
    #[arg(long = "print-checks-statistics", default_value_t = Bool::False)]
    pub print_checks_statistics: Bool,
    /// Print solutions that are not yet proved optimal
    #[arg(long = "print-nooptimal-solutions", default_value_t = Bool::False)]
    pub print_nooptimal_solutions: Bool,
    /// Print the schedule of the reported solution
    #[arg(long = "produce-models", default_value_t = Bool::True)]
    pub produce_models: Bool,
    #[command(flatten)]
    pub color: concolor_clap::Color,
}

/// Display through the clap value name, so help texts and defaults match.
macro_rules! fmt_value_enum {
    () => {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.to_possible_value()
                .expect("no skipped variants")
                .get_name()
                .fmt(f)
        }
    };
}

/// Boolean option with an explicit `true`/`false` argument.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Bool {
    /// Turn on feature
    True,
    /// Turn off feature
    False,
}

impl From<Bool> for bool {
    fn from(val: Bool) -> bool {
        val == Bool::True
    }
}

impl fmt::Display for Bool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bool::True => write!(f, "true"),
            Bool::False => write!(f, "false"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum EncodingArg {
    /// Time-indexed encoding with integer start times
    Smttime,
    /// Task-indexed encoding with per-activity pulses
    Smttask,
    /// Boolean encoding with a hard PB makespan selector
    Omtsatpb,
    /// Boolean encoding with soft makespan clauses
    Omtsoftpb,
    /// Order encoding of the start times
    Order,
    /// Order encoding with pairwise ordering variables
    Doubleorder,
}

impl From<EncodingArg> for EncodingKind {
    fn from(arg: EncodingArg) -> EncodingKind {
        match arg {
            EncodingArg::Smttime => EncodingKind::SmtTime,
            EncodingArg::Smttask => EncodingKind::SmtTask,
            EncodingArg::Omtsatpb => EncodingKind::OmtSatPb,
            EncodingArg::Omtsoftpb => EncodingKind::OmtSoftPb,
            EncodingArg::Order => EncodingKind::Order,
            EncodingArg::Doubleorder => EncodingKind::DoubleOrder,
        }
    }
}

impl fmt::Display for EncodingArg {
    fmt_value_enum!();
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PbArg {
    /// Generalized totalizer
    Gte,
    /// Dynamic polynomial watchdog
    Gpw,
    /// Binary adder network
    Adder,
}

impl From<PbArg> for PbEncoding {
    fn from(arg: PbArg) -> PbEncoding {
        match arg {
            PbArg::Gte => PbEncoding::Gte,
            PbArg::Gpw => PbEncoding::Gpw,
            PbArg::Adder => PbEncoding::Adder,
        }
    }
}

impl fmt::Display for PbArg {
    fmt_value_enum!();
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum AmoArg {
    /// Pairwise encoding
    Pairwise,
    /// Ladder encoding
    Ladder,
    /// Commander encoding
    Commander,
    /// Bimander encoding
    Bimander,
}

impl From<AmoArg> for AmoEncoding {
    fn from(arg: AmoArg) -> AmoEncoding {
        match arg {
            AmoArg::Pairwise => AmoEncoding::Pairwise,
            AmoArg::Ladder => AmoEncoding::Ladder,
            AmoArg::Commander => AmoEncoding::Commander,
            AmoArg::Bimander => AmoEncoding::Bimander,
        }
    }
}

impl fmt::Display for AmoArg {
    fmt_value_enum!();
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OptimizerArg {
    /// Single satisfiability call at the initial bounds
    Check,
    /// Decrease the upper bound below every solution found
    LinearUb,
    /// Increase the lower bound until it is reachable
    LinearLb,
    /// Bisect the remaining window
    Binary,
    /// One native optimization call
    Omt,
}

impl From<OptimizerArg> for OptStrategy {
    fn from(arg: OptimizerArg) -> OptStrategy {
        match arg {
            OptimizerArg::Check => OptStrategy::Check,
            OptimizerArg::LinearUb => OptStrategy::LinearUb,
            OptimizerArg::LinearLb => OptStrategy::LinearLb,
            OptimizerArg::Binary => OptStrategy::Binary,
            OptimizerArg::Omt => OptStrategy::Omt,
        }
    }
}

impl fmt::Display for OptimizerArg {
    fmt_value_enum!();
}

/// Processed command line of the `mrcpsp2smt` binary.
pub struct Cli {
    pub filename: PathBuf,
    pub config: Config,
    pub output_encoding: bool,
    pub print_checks: bool,
    pub print_checks_statistics: bool,
    pub print_nooptimal_solutions: bool,
    pub produce_models: bool,
    stdout: BufferWriter,
    stderr: BufferWriter,
}

/// Maps the solving arguments onto the core configuration.
pub fn build_config(encoding: EncodingKind, compute_ub: bool, solving: &SolvingArgs) -> Config {
    Config {
        encoding,
        enc_cfg: EncodingConfig {
            amopb: solving.amopb.into(),
            pb: solving.pb.into(),
            amo: solving.amo.into(),
        },
        search: SearchOptions {
            strategy: solving.optimizer.into(),
            use_assumptions: solving.assumptions.into(),
            narrow_bounds: solving.narrow_bounds.into(),
            limits: Limits {
                time: (solving.timeout > 0).then(|| Duration::from_secs(solving.timeout)),
            },
        },
        compute_ub,
        lower_bound: solving.lower_bound,
        upper_bound: solving.upper_bound,
    }
}

pub fn buffer_writers(color: &concolor_clap::Color) -> (BufferWriter, BufferWriter) {
    let choice = match color.color {
        concolor_clap::ColorChoice::Always => termcolor::ColorChoice::Always,
        concolor_clap::ColorChoice::Never => termcolor::ColorChoice::Never,
        concolor_clap::ColorChoice::Auto => termcolor::ColorChoice::Auto,
    };
    (BufferWriter::stdout(choice), BufferWriter::stderr(choice))
}

impl Cli {
    pub fn init() -> Self {
        let args = CliArgs::parse();
        let (stdout, stderr) = buffer_writers(&args.solving.color);
        let compute_ub = bool::from(args.upper) && args.solving.upper_bound.is_none();
        Cli {
            config: build_config(args.encoding.into(), compute_ub, &args.solving),
            output_encoding: args.solving.output_encoding.into(),
            print_checks: args.solving.print_checks.into(),
            print_checks_statistics: args.solving.print_checks_statistics.into(),
            print_nooptimal_solutions: args.solving.print_nooptimal_solutions.into(),
            produce_models: args.solving.produce_models.into(),
            filename: args.filename,
            stdout,
            stderr,
        }
    }

    /// A `c `-prefixed comment line on stdout.
    pub fn comment(&self, msg: &str) -> Result<(), IOError> {
        let mut buffer = self.stdout.buffer();
        writeln!(buffer, "c {msg}")?;
        self.stdout.print(&buffer)
    }

    /// The solution line of a schedule followed by its makespan.
    pub fn print_solution(&self, sched: &Schedule) -> Result<(), IOError> {
        let mut buffer = self.stdout.buffer();
        writeln!(buffer, "v {sched}")?;
        writeln!(buffer, "{}", sched.makespan())?;
        self.stdout.print(&buffer)
    }

    pub fn print_header(&self) -> Result<(), IOError> {
        self.comment(&format!("{} ({})", crate_name!(), crate_version!()))?;
        self.comment(&format!(
            "encoding {} optimizer {}",
            self.config.encoding, self.config.search.strategy
        ))
    }

    pub fn error(&self, msg: &str) -> Result<(), IOError> {
        let mut buffer = self.stderr.buffer();
        buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Red)))?;
        write!(buffer, "error")?;
        buffer.reset()?;
        writeln!(buffer, ": {msg}")?;
        self.stderr.print(&buffer)
    }

    pub fn warning(&self, msg: &str) -> Result<(), IOError> {
        let mut buffer = self.stderr.buffer();
        buffer.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Yellow)))?;
        write!(buffer, "warning")?;
        buffer.reset()?;
        writeln!(buffer, ": {msg}")?;
        self.stderr.print(&buffer)
    }

    pub fn new_logger(&self) -> CliLogger<'_> {
        CliLogger { cli: self }
    }
}

/// Observer printing optimizer progress as comment lines, honoring the
/// reporting flags.
pub struct CliLogger<'a> {
    cli: &'a Cli,
}

impl WriteSolveLog for CliLogger<'_> {
    fn log_new_bounds(&mut self, lb: i32, ub: i32) {
        if self.cli.print_checks {
            let _ = self.cli.comment(&format!("bounds proved lb={lb} ub={ub}"));
        }
    }

    fn log_solution(&mut self, obj: i32, sched: &Schedule) {
        if self.cli.produce_models && self.cli.print_nooptimal_solutions {
            let _ = self.cli.comment(&format!("solution with makespan {obj}"));
            let _ = self.cli.print_solution(sched);
        }
    }

    fn log_check(&mut self, lb: i32, ub: i32, answer: &'static str, stats: &SolveStats) {
        if self.cli.print_checks_statistics {
            let _ = self.cli.comment(&format!(
                "check [{lb},{ub}] -> {answer} ({} calls, {} encodes, {} narrows, {:.3}s solving)",
                stats.n_checks,
                stats.n_encodes,
                stats.n_narrows,
                stats.cpu_solve_time.as_secs_f64()
            ));
        }
    }

    fn log_native_call(&mut self, lb: i32, ub: i32, _stats: &SolveStats) {
        if self.cli.print_checks_statistics {
            let _ = self
                .cli
                .comment(&format!("native optimization over [{lb},{ub}] returned"));
        }
    }

    fn log_optimum(&mut self, obj: i32) {
        if self.cli.print_checks {
            let _ = self.cli.comment(&format!("optimum {obj} proved"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_follow_the_documented_option_table() {
        let args = CliArgs::try_parse_from(["mrcpsp2smt", "inst.mm"]).unwrap();
        assert_eq!(args.encoding, EncodingArg::Smttime);
        assert_eq!(bool::from(args.upper), true);
        let config = build_config(args.encoding.into(), true, &args.solving);
        assert_eq!(config.encoding, EncodingKind::SmtTime);
        assert_eq!(config.search.strategy, OptStrategy::LinearUb);
        assert!(!config.search.use_assumptions);
        assert!(!config.search.narrow_bounds);
        assert!(config.search.limits.time.is_none());
        assert!(config.compute_ub);
    }

    #[test]
    fn explicit_upper_bound_disables_the_greedy_heuristic() {
        let args =
            CliArgs::try_parse_from(["mrcpsp2smt", "inst.mm", "-u", "17", "-l", "3"]).unwrap();
        let compute_ub = bool::from(args.upper) && args.solving.upper_bound.is_none();
        assert!(!compute_ub);
        let config = build_config(args.encoding.into(), compute_ub, &args.solving);
        assert_eq!(config.upper_bound, Some(17));
        assert_eq!(config.lower_bound, Some(3));
    }

    #[test]
    fn encoding_and_optimizer_names_match_the_interface() {
        let args = CliArgs::try_parse_from([
            "mrcpsp2smt",
            "inst.mm",
            "-E",
            "doubleorder",
            "--optimizer",
            "binary",
            "--assumptions",
            "true",
            "--narrow-bounds",
            "true",
            "--amopb",
            "gpw",
            "--timeout",
            "60",
        ])
        .unwrap();
        let config = build_config(args.encoding.into(), true, &args.solving);
        assert_eq!(config.encoding, EncodingKind::DoubleOrder);
        assert_eq!(config.search.strategy, OptStrategy::Binary);
        assert!(config.search.use_assumptions);
        assert!(config.search.narrow_bounds);
        assert_eq!(config.enc_cfg.amopb, PbEncoding::Gpw);
        assert_eq!(config.search.limits.time, Some(Duration::from_secs(60)));
    }
}
