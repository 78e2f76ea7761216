//! Unit conversions for climate-model output.
//!
//! Models report precipitation as a mass flux in kg m⁻² s⁻¹ and temperature
//! in kelvin. One kilogram of water over one square metre is one millimetre
//! of depth, so a flux times the seconds in a day is mm/day.

use crate::error::{Error, Result};
use crate::series::YearSeries;

/// Seconds in a day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

const ZERO_CELSIUS: f64 = 273.15;

/// Precipitation flux (kg m⁻² s⁻¹) to mm/day.
#[inline]
pub fn flux_to_mm_per_day(flux: f64) -> f64 {
    flux * SECONDS_PER_DAY
}

/// Kelvin to degrees Celsius.
#[inline]
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - ZERO_CELSIUS
}

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Days in `month` (1–12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    Ok(match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return Err(Error::invalid(format!("month {month} outside 1-12"))),
    })
}

/// Annual precipitation totals (mm/year) from monthly mean rates in mm/day.
///
/// `monthly` holds consecutive months starting in January of `first_year`;
/// its length must be a multiple of 12. Each month contributes its rate times
/// its number of days. A year with any non-finite month is left out of the
/// result rather than summed from a partial record.
pub fn annual_totals(first_year: i32, monthly: &[f64]) -> Result<YearSeries> {
    if monthly.len() % 12 != 0 {
        return Err(Error::invalid(format!(
            "{} monthly values do not make whole years",
            monthly.len()
        )));
    }

    let mut pairs = Vec::with_capacity(monthly.len() / 12);
    for (year, months) in (first_year..).zip(monthly.chunks_exact(12)) {
        if months.iter().any(|v| !v.is_finite()) {
            continue;
        }
        let mut total = 0.0;
        for (month, rate) in (1..=12).zip(months) {
            total += rate * f64::from(days_in_month(year, month)?);
        }
        pairs.push((year, total));
    }
    YearSeries::from_pairs(pairs)
}

/// Annual totals straight from monthly fluxes in kg m⁻² s⁻¹.
pub fn annual_totals_from_flux(first_year: i32, monthly_flux: &[f64]) -> Result<YearSeries> {
    let rates: Vec<f64> = monthly_flux.iter().map(|&f| flux_to_mm_per_day(f)).collect();
    annual_totals(first_year, &rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2023));
        assert_eq!(days_in_month(2000, 2).unwrap(), 29);
        assert_eq!(days_in_month(2100, 2).unwrap(), 28);
        assert!(days_in_month(2000, 13).is_err());
    }

    #[test]
    fn constant_rate_sums_to_days_in_year() {
        let totals = annual_totals(2023, &[1.0; 24]).unwrap();
        assert_eq!(totals.years(), &[2023, 2024]);
        assert_relative_eq!(totals.values()[0], 365.0);
        assert_relative_eq!(totals.values()[1], 366.0);
    }

    #[test]
    fn incomplete_year_is_dropped() {
        let mut monthly = vec![2.0; 36];
        monthly[14] = f64::NAN;
        let totals = annual_totals(1990, &monthly).unwrap();
        assert_eq!(totals.years(), &[1990, 1992]);
    }

    #[test]
    fn partial_year_is_rejected() {
        assert!(annual_totals(1990, &[1.0; 13]).is_err());
    }

    #[test]
    fn flux_conversion() {
        assert_relative_eq!(flux_to_mm_per_day(1.0 / SECONDS_PER_DAY), 1.0);
        let totals = annual_totals_from_flux(2001, &[1e-5; 12]).unwrap();
        assert_relative_eq!(totals.values()[0], 1e-5 * SECONDS_PER_DAY * 365.0, max_relative = 1e-12);
        assert_relative_eq!(kelvin_to_celsius(288.15), 15.0, max_relative = 1e-12);
    }
}
