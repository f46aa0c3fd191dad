use std::io::Write;
use std::process::ExitCode;

use mrcpsp2smt::cli::Cli;
use mrcpsp2smt_core::types::OptStatus;
use mrcpsp2smt_core::{controller, parsing, Error};

fn io_err(err: std::io::Error) -> Error {
    Error::Backend(err.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::init();
    match run(&cli) {
        Ok(code) => code,
        Err(Error::Infeasible(msg)) => {
            let _ = cli.comment(&format!("infeasible: {msg}"));
            let _ = cli.comment(&format!("status {}", OptStatus::Unsat));
            ExitCode::from(20)
        }
        Err(err) => {
            let _ = cli.error(&err.to_string());
            ExitCode::from(1)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, Error> {
    cli.print_header().map_err(io_err)?;

    let instance = parsing::parse_instance(&cli.filename)?.preprocess()?;

    if cli.output_encoding {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        controller::output_encoding(&instance, &cli.config, &mut lock)?;
        lock.flush().map_err(io_err)?;
        return Ok(ExitCode::SUCCESS);
    }

    let mut logger = cli.new_logger();
    let report = controller::solve(&instance, &cli.config, &mut logger)?;

    cli.comment(&format!("status {}", report.status))
        .map_err(io_err)?;
    match report.status {
        OptStatus::Timeout => {
            let _ = cli.warning("time limit reached; the incumbent is not proved optimal");
        }
        OptStatus::Optimum | OptStatus::Sat | OptStatus::Unsat => (),
    }
    if let Some((makespan, sched)) = &report.best {
        if cli.produce_models {
            cli.print_solution(sched).map_err(io_err)?;
        } else {
            cli.comment(&format!("makespan {makespan}"))
                .map_err(io_err)?;
        }
        debug_assert!(instance.validate(sched).is_ok());
    }

    Ok(match report.status {
        OptStatus::Optimum | OptStatus::Timeout => ExitCode::SUCCESS,
        OptStatus::Sat => ExitCode::from(10),
        OptStatus::Unsat => ExitCode::from(20),
    })
}
