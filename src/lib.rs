//! Bias correction and drought-frequency statistics for annual precipitation
//! ensembles.
//!
//! The crate covers three steps of a drought attribution workflow:
//!
//! - [`fit_and_build_transfer`] fits Gamma distributions to modeled and
//!   observed reference samples and builds the quantile-mapping function that
//!   [`apply_transfer`] runs over a whole [`Ensemble`].
//! - [`extract_quantile`] reads one quantile per run over a period.
//! - [`estimate_exceedance_probability`] bootstraps the probability of a run
//!   falling at or below a threshold.
//!
//! [`DroughtReport::compute`] chains them into intensity-frequency curves and
//! hyper-drought statistics per comparison period.
//!
//! Randomness is always injected: every stochastic entry point takes an
//! `&mut impl Rng`, and a fixed seed reproduces the result on any schedule.

mod analysis;
mod config;
mod correction;
mod display;
mod distribution;
mod error;
mod resample;
mod series;
mod smoothing;
mod statistics;
pub mod units;

pub use crate::analysis::*;
pub use crate::config::*;
pub use crate::correction::*;
pub use crate::display::*;
pub use crate::distribution::*;
pub use crate::error::{Error, Result};
pub use crate::resample::*;
pub use crate::series::*;
pub use crate::smoothing::lowess;
pub use crate::statistics::*;
pub use rand;
