//! # Instance Parsers
//!
//! Readers for the PSPLIB-family instance formats, normalizing everything to
//! the common [`Mrcpsp`] schema. Dispatch is by file extension:
//!
//! - `.rcp` — Patterson layout: total job count (including the two
//!   dummies) and resource count, per-period capacities, then one block per
//!   job with duration, demands, and successor list (1-based).
//! - `.mm` / `.sm` — PSPLIB project files with `PRECEDENCE RELATIONS`,
//!   `REQUESTS/DURATIONS` and `RESOURCEAVAILABILITIES` sections.
//! - `.prb` — Boctor-style mode table: `J R` header, `R` capacities, per
//!   job a mode count followed by `duration demands...` rows, then the
//!   successor lists over real jobs.
//! - `.data` — like `.prb` with nonrenewable resources: `J RR NR` header
//!   and capacities for both resource classes.
//!
//! The numeric tokens are consumed through one nom-based lexer shared by all
//! four drivers.

use std::path::Path;

use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{map_res, opt, recognize};
use nom::sequence::{pair, preceded};
use nom::IResult;

use crate::instance::Mrcpsp;
use crate::Error;

fn int_token(input: &str) -> IResult<&str, i32> {
    map_res(
        preceded(
            multispace0,
            recognize(pair(opt(char('-')), digit1)),
        ),
        str::parse,
    )(input)
}

/// Token cursor over an instance file, with a context name for error
/// messages.
struct Tokens<'a> {
    rest: &'a str,
    what: &'static str,
}

impl<'a> Tokens<'a> {
    fn new(input: &'a str, what: &'static str) -> Self {
        Tokens { rest: input, what }
    }

    fn int(&mut self) -> Result<i32, Error> {
        match int_token(self.rest) {
            Ok((rest, value)) => {
                self.rest = rest;
                Ok(value)
            }
            Err(_) => Err(Error::parse(format!(
                "{}: expected an integer near {:?}",
                self.what,
                self.rest.trim_start().chars().take(20).collect::<String>()
            ))),
        }
    }

    fn count(&mut self) -> Result<usize, Error> {
        let value = self.int()?;
        usize::try_from(value)
            .map_err(|_| Error::parse(format!("{}: expected a nonnegative count", self.what)))
    }
}

/// Parses an instance file, dispatching on its extension.
pub fn parse_instance(path: &Path) -> Result<Mrcpsp, Error> {
    let input = std::fs::read_to_string(path)
        .map_err(|e| Error::parse(format!("{}: {e}", path.display())))?;
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("rcp") => parse_rcp(&input),
        Some("mm" | "sm") => parse_mm(&input),
        Some("prb") => parse_prb(&input),
        Some("data") => parse_data(&input),
        other => Err(Error::parse(format!(
            "unsupported instance extension {:?}",
            other.unwrap_or("none")
        ))),
    }
}

/// Patterson `.rcp`: jobs include the dummy source and sink.
pub fn parse_rcp(input: &str) -> Result<Mrcpsp, Error> {
    let mut tok = Tokens::new(input, "rcp");
    let jobs = tok.count()?;
    let n_res = tok.count()?;
    if jobs < 2 {
        return Err(Error::parse("rcp: instance needs at least the two dummies"));
    }
    let caps = (0..n_res)
        .map(|_| tok.int())
        .collect::<Result<Vec<_>, _>>()?;
    let n = jobs - 2;
    let mut ins = Mrcpsp::new(n, caps, Vec::new());
    for job in 1..=jobs {
        let duration = tok.int()?;
        let demands = (0..n_res)
            .map(|_| tok.int())
            .collect::<Result<Vec<_>, _>>()?;
        if job != 1 && job != jobs {
            ins.add_mode(job - 1, duration, demands);
        }
        let n_succ = tok.count()?;
        for _ in 0..n_succ {
            let succ = tok.count()?;
            if succ < 1 || succ > jobs {
                return Err(Error::parse(format!("rcp: successor {succ} out of range")));
            }
            ins.add_precedence(job - 1, succ - 1);
        }
    }
    Ok(ins)
}

/// First integer found on a line, for the PSPLIB header fields.
fn line_int(line: &str, what: &'static str) -> Result<i32, Error> {
    line.split(|c: char| !c.is_ascii_digit())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::parse(format!("mm: no number on the {what} line")))
}

/// Lines of a PSPLIB section that carry data: everything up to the next
/// separator that starts with a digit.
fn section_body(lines: &[&str], start: usize) -> String {
    lines[start + 1..]
        .iter()
        .take_while(|l| !l.trim_start().starts_with('*'))
        .filter(|l| l.trim_start().starts_with(|c: char| c.is_ascii_digit()))
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}

/// PSPLIB `.mm`/`.sm` project files.
pub fn parse_mm(input: &str) -> Result<Mrcpsp, Error> {
    let lines: Vec<&str> = input.lines().collect();
    let find = |pat: &str| {
        lines
            .iter()
            .position(|l| l.contains(pat))
            .ok_or_else(|| Error::parse(format!("mm: missing {pat:?} section")))
    };

    let jobs = line_int(lines[find("jobs (incl.")?], "job count")? as usize;
    let n_renewable = line_int(lines[find("- renewable")?], "renewable count")? as usize;
    let n_nonrenewable = line_int(lines[find("- nonrenewable")?], "nonrenewable count")? as usize;
    if jobs < 2 {
        return Err(Error::parse("mm: instance needs at least the two dummies"));
    }
    let n = jobs - 2;

    let prec_body = section_body(&lines, find("PRECEDENCE RELATIONS")?);
    let mut tok = Tokens::new(&prec_body, "mm precedences");
    let mut n_modes = vec![0usize; jobs + 1];
    let mut precedences = Vec::new();
    for _ in 0..jobs {
        let job = tok.count()?;
        if job < 1 || job > jobs {
            return Err(Error::parse(format!("mm: job {job} out of range")));
        }
        n_modes[job] = tok.count()?;
        let n_succ = tok.count()?;
        for _ in 0..n_succ {
            let succ = tok.count()?;
            if succ < 1 || succ > jobs {
                return Err(Error::parse(format!("mm: successor {succ} out of range")));
            }
            precedences.push((job - 1, succ - 1));
        }
    }

    let avail_body = section_body(&lines, find("RESOURCEAVAILABILITIES")?);
    let mut tok = Tokens::new(&avail_body, "mm availabilities");
    let renewable_caps = (0..n_renewable)
        .map(|_| tok.int())
        .collect::<Result<Vec<_>, _>>()?;
    let nonrenewable_caps = (0..n_nonrenewable)
        .map(|_| tok.int())
        .collect::<Result<Vec<_>, _>>()?;

    let mut ins = Mrcpsp::new(n, renewable_caps, nonrenewable_caps);
    for (i, j) in precedences {
        ins.add_precedence(i, j);
    }

    let req_body = section_body(&lines, find("REQUESTS/DURATIONS")?);
    let mut tok = Tokens::new(&req_body, "mm requests");
    for job in 1..=jobs {
        for mode in 0..n_modes[job] {
            if mode == 0 {
                let declared = tok.count()?;
                if declared != job {
                    return Err(Error::parse(format!(
                        "mm: requests for job {declared} where job {job} was expected"
                    )));
                }
            }
            let _mode_nr = tok.count()?;
            let duration = tok.int()?;
            let demands = (0..n_renewable + n_nonrenewable)
                .map(|_| tok.int())
                .collect::<Result<Vec<_>, _>>()?;
            if job != 1 && job != jobs {
                ins.add_mode(job - 1, duration, demands);
            }
        }
    }
    Ok(ins)
}

/// Shared driver of the `.prb`/`.data` mode-table layout.
fn parse_mode_table(
    tok: &mut Tokens,
    n: usize,
    n_renewable: usize,
    n_nonrenewable: usize,
) -> Result<Mrcpsp, Error> {
    let renewable_caps = (0..n_renewable)
        .map(|_| tok.int())
        .collect::<Result<Vec<_>, _>>()?;
    let nonrenewable_caps = (0..n_nonrenewable)
        .map(|_| tok.int())
        .collect::<Result<Vec<_>, _>>()?;
    let mut ins = Mrcpsp::new(n, renewable_caps, nonrenewable_caps);
    for i in 1..=n {
        let modes = tok.count()?;
        if modes == 0 {
            return Err(Error::parse(format!("activity {i} declares no modes")));
        }
        for _ in 0..modes {
            let duration = tok.int()?;
            let demands = (0..n_renewable + n_nonrenewable)
                .map(|_| tok.int())
                .collect::<Result<Vec<_>, _>>()?;
            ins.add_mode(i, duration, demands);
        }
    }
    for i in 1..=n {
        let n_succ = tok.count()?;
        for _ in 0..n_succ {
            let succ = tok.count()?;
            if succ < 1 || succ > n {
                return Err(Error::parse(format!("successor {succ} out of range")));
            }
            ins.add_precedence(i, succ);
        }
    }
    Ok(ins)
}

/// Boctor-style `.prb`: renewable resources only.
pub fn parse_prb(input: &str) -> Result<Mrcpsp, Error> {
    let mut tok = Tokens::new(input, "prb");
    let n = tok.count()?;
    let n_renewable = tok.count()?;
    parse_mode_table(&mut tok, n, n_renewable, 0)
}

/// `.data` mode table with renewable and nonrenewable resources.
pub fn parse_data(input: &str) -> Result<Mrcpsp, Error> {
    let mut tok = Tokens::new(input, "data");
    let n = tok.count()?;
    let n_renewable = tok.count()?;
    let n_nonrenewable = tok.count()?;
    parse_mode_table(&mut tok, n, n_renewable, n_nonrenewable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rcp_round_trip() {
        // 2 real jobs in a chain, one resource of capacity 3
        let input = "4 1\n3\n0 0 1 2\n2 2 1 3\n3 1 1 4\n0 0 0\n";
        let ins = parse_rcp(input).unwrap().preprocess().unwrap();
        assert_eq!(ins.n_activities(), 2);
        assert_eq!(ins.n_renewable(), 1);
        assert_eq!(ins.capacity(0), 3);
        assert_eq!(ins.duration(1, 0), 2);
        assert_eq!(ins.demand(2, 0, 0), 1);
        assert!(ins.is_pred(1, 2));
        assert_eq!(ins.trivial_lb(), 5);
    }

    #[test]
    fn data_mode_table() {
        // one activity, two modes, one nonrenewable budget
        let input = "1 0 1\n3\n2\n3 4\n5 2\n0\n";
        let ins = parse_data(input).unwrap().preprocess().unwrap();
        assert_eq!(ins.n_activities(), 1);
        assert_eq!(ins.n_modes(1), 2);
        assert_eq!(ins.duration(1, 1), 5);
        // budget reduced by the committed minimum of 2
        assert_eq!(ins.capacity(0), 1);
    }

    #[test]
    fn prb_is_data_without_nonrenewables() {
        let input = "2 1\n2\n1\n4 1\n1\n2 2\n1 2\n0\n";
        let ins = parse_prb(input).unwrap().preprocess().unwrap();
        assert_eq!(ins.n_activities(), 2);
        assert!(ins.is_pred(1, 2));
        assert_eq!(ins.trivial_lb(), 6);
    }

    #[test]
    fn mm_sections() {
        let input = "\
************************************************************************
file with basedata            : fake.bas
************************************************************************
PROJECT INFORMATION:
jobs (incl. supersource/sink ):  4
RESOURCES
  - renewable                 :  1   R
  - nonrenewable              :  1   N
************************************************************************
PRECEDENCE RELATIONS:
jobnr.    #modes  #successors   successors
   1        1          2           2   3
   2        2          1           4
   3        1          1           4
   4        1          0
************************************************************************
REQUESTS/DURATIONS:
jobnr. mode duration  R 1  N 1
------------------------------------------------------------------------
  1      1     0       0    0
  2      1     3       2    1
         2     5       1    1
  3      1     2       1    2
  4      1     0       0    0
************************************************************************
RESOURCEAVAILABILITIES:
  R 1  N 1
   2    3
************************************************************************
";
        let ins = parse_mm(input).unwrap().preprocess().unwrap();
        assert_eq!(ins.n_activities(), 2);
        assert_eq!(ins.n_renewable(), 1);
        assert_eq!(ins.n_nonrenewable(), 1);
        assert_eq!(ins.capacity(0), 2);
        assert_eq!(ins.n_modes(1), 2);
        assert_eq!(ins.duration(1, 1), 5);
        assert_eq!(ins.duration(2, 0), 2);
        assert!(ins.is_pred(1, ins.sink()));
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert!(matches!(parse_rcp("2"), Err(Error::Parse(_))));
        assert!(matches!(parse_data("x"), Err(Error::Parse(_))));
    }
}
