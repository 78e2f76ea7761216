use std::fmt::{self, Display, Formatter};

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;

use crate::analysis::{DroughtReport, PeriodSummary, Spread};
use crate::distribution::{FitSummary, FittedDistribution};
use crate::error::Result;
use crate::series::RunMap;

fn title(text: &str) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .add_row(vec![Cell::new(text).set_alignment(CellAlignment::Center)]);
    table
}

fn with_header(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            columns
                .iter()
                .map(|c| Cell::new(c).set_alignment(CellAlignment::Center))
                .collect::<Vec<_>>(),
        );
    table
}

fn left(text: impl ToString) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Left)
}

fn right(text: impl ToString) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn band_label(band: (f64, f64)) -> String {
    format!("P{:.0}–P{:.0}", band.0, band.1)
}

fn spread_cells(s: &Spread) -> [Cell; 3] {
    [
        right(format!("{:.1}", s.mean)),
        right(format!("{:.1}", s.median)),
        right(format!("{:.1} – {:.1}", s.lower, s.upper)),
    ]
}

/// Renders per-run values as a two-column table.
pub fn run_table(heading: &str, values: &RunMap<f64>) -> String {
    let mut table = with_header(&["Run", heading]);
    for (run, value) in values {
        table.add_row(vec![left(run), right(format!("{value:.2}"))]);
    }
    table.to_string()
}

impl Display for FittedDistribution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FittedDistribution::Gamma(p) => {
                write!(f, "Gamma(shape = {:.3}, scale = {:.3})", p.shape(), p.scale())
            }
            FittedDistribution::Normal { mean, std } => {
                write!(f, "Normal(mean = {mean:.3}, std = {std:.3})")
            }
            FittedDistribution::LogNormal { mu, sigma } => {
                write!(f, "LogNormal(mu = {mu:.3}, sigma = {sigma:.3})")
            }
        }
    }
}

/// Side-by-side comparison of fitted families, as returned by
/// [`compare_families`](crate::compare_families).
pub struct FitTable<'a>(pub &'a [FitSummary]);

impl Display for FitTable<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let best = self
            .0
            .iter()
            .map(|s| s.log_likelihood)
            .fold(f64::NEG_INFINITY, f64::max);

        let mut table = with_header(&["Family", "Parameters", "Log-likelihood", "KS D", "KS p", "Verdict"]);
        for summary in self.0 {
            let verdict = if summary.ks.p_value < 0.05 {
                "🔴 Rejected"
            } else if summary.log_likelihood.total_cmp(&best).is_eq() {
                "🟢 Best fit"
            } else {
                "🟡 Plausible"
            };
            let p_display = if summary.ks.p_value < 1e-4 {
                "< 0.0001".to_string()
            } else {
                format!("{:.4}", summary.ks.p_value)
            };
            table.add_row(vec![
                left(summary.fitted.family()),
                left(summary.fitted),
                right(format!("{:.2}", summary.log_likelihood)),
                right(format!("{:.4}", summary.ks.statistic)),
                right(p_display),
                left(verdict),
            ]);
        }
        write!(f, "{}\n{}", title("Distribution fit comparison"), table)
    }
}

impl PeriodSummary {
    fn render(&self, band: (f64, f64)) -> Result<String> {
        let mut hd = with_header(&["Hyper-drought", "Mean", "Median", &band_label(band)]);
        let frequency = Spread::of(&self.hd_frequency, band)?;
        let intensity = Spread::of(&self.hd_intensity, band)?;
        let mut row = vec![left("Frequency (%)")];
        row.extend(spread_cells(&frequency));
        hd.add_row(row);
        let mut row = vec![left("Intensity (% deficit)")];
        row.extend(spread_cells(&intensity));
        hd.add_row(row);

        let mut curve = with_header(&["Frequency (%)", "Mean deficit (%)", "Median", &band_label(band)]);
        for point in &self.curve {
            let mut row = vec![right(format!("{:.0}", point.frequency))];
            row.extend(spread_cells(&point.deficit));
            curve.add_row(row);
        }

        Ok(format!(
            "{}\n{}\n{}",
            title(&format!("{} ({})", self.name, self.period)),
            hd,
            curve
        ))
    }
}

impl DroughtReport {
    /// Human-readable summary of the report.
    pub fn display(&self) -> String {
        let transfer = self.transfer();
        let mut header = with_header(&["Quantity", "Value"]);
        header
            .add_row(vec![
                left("Modeled fit"),
                left(FittedDistribution::Gamma(transfer.modeled())),
            ])
            .add_row(vec![
                left("Observed fit"),
                left(FittedDistribution::Gamma(transfer.observed())),
            ])
            .add_row(vec![
                left("Observed baseline mean"),
                right(format!("{:.1}", self.observed_mean())),
            ])
            .add_row(vec![
                left("Hyper-drought threshold"),
                right(format!("{:.1}", self.hd_threshold())),
            ])
            .add_row(vec![left("Runs"), right(self.corrected().n_runs())]);

        let mut out = format!("{}\n{}", title("Drought frequency report"), header);
        for period in self.periods() {
            match period.render(self.band()) {
                Ok(text) => {
                    out.push('\n');
                    out.push_str(&text);
                }
                Err(e) => {
                    out.push_str(&format!("\n{}: {e}", period.name));
                }
            }
        }
        out
    }
}

impl Display for DroughtReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}
