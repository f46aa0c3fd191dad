//! # mrcpsp2smt
//!
//! Binary shell around [`mrcpsp2smt_core`]: command-line parsing, colored
//! diagnostics, and the `c `/`v ` solution protocol shared by the
//! `mrcpsp2smt` and `auction2smt` programs.

pub mod cli;
