//! Student's t distribution: CDF and quantile function.
//!
//! The CDF is expressed through the regularized incomplete beta function:
//!
//! ```text
//! P(T <= t) = 1 - 0.5 * I_{df/(df+t²)}(df/2, 1/2)    for t >= 0
//! ```
//!
//! The quantile is found by bracketing and bisecting the CDF, which is
//! monotone, so convergence only depends on the bracket.
//!
//! # References
//!
//! - Press et al. (2007). "Numerical Recipes", §6.2 and §6.4

use crate::error::StatsError;

/// Bisection steps; each halves the bracket, so 200 steps reach f64 resolution.
const MAX_BISECTION_STEPS: usize = 200;

/// Largest upper bracket tried before giving up.
const MAX_BRACKET: f64 = 1e12;

/// Cumulative distribution function of Student's t with `df` degrees of freedom.
pub fn cdf(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    if t.is_infinite() {
        return if t > 0.0 { 1.0 } else { 0.0 };
    }
    let x = df / (df + t * t);
    let tail = 0.5 * incomplete_beta(df / 2.0, 0.5, x);
    if t >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Quantile (inverse CDF) of Student's t: the `t` with `cdf(t, df) == p`.
///
/// # Errors
///
/// - [`StatsError::InvalidProbability`] if `p` is not in (0, 1)
/// - [`StatsError::InvalidDegreesOfFreedom`] if `df` is not positive and finite
/// - [`StatsError::QuantileDidNotConverge`] if the quantile cannot be bracketed
pub fn ppf(p: f64, df: f64) -> Result<f64, StatsError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(StatsError::InvalidProbability(p));
    }
    if !(df > 0.0 && df.is_finite()) {
        return Err(StatsError::InvalidDegreesOfFreedom(df));
    }
    if p == 0.5 {
        return Ok(0.0);
    }
    // Symmetric around zero: solve for the upper tail only.
    if p < 0.5 {
        return ppf(1.0 - p, df).map(|t| -t);
    }

    let mut lo = 0.0;
    let mut hi = 1.0;
    while cdf(hi, df) < p {
        lo = hi;
        hi *= 2.0;
        if hi > MAX_BRACKET {
            return Err(StatsError::QuantileDidNotConverge);
        }
    }

    for _ in 0..MAX_BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        if cdf(mid, df) < p {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo <= f64::EPSILON * hi.max(1.0) {
            break;
        }
    }

    let t = 0.5 * (lo + hi);
    if t.is_finite() {
        Ok(t)
    } else {
        Err(StatsError::QuantileDidNotConverge)
    }
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let bt = (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();

    // The continued fraction converges fastest below the distribution mean.
    if x < (a + 1.0) / (a + b + 2.0) {
        bt * beta_cf(a, b, x) / a
    } else {
        1.0 - bt * beta_cf(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta function (modified Lentz).
fn beta_cf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;
    const FPMIN: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;

    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;

        if (del - 1.0).abs() < EPS {
            break;
        }
    }

    h
}

/// Natural log of the gamma function (Lanczos approximation, g = 5).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];

    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();

    let mut ser = 1.000000000190015;
    for (i, &coeff) in COEFFS.iter().enumerate() {
        ser += coeff / (x + 1.0 + i as f64);
    }

    -tmp + (2.5066282746310005 * ser / x).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_is_symmetric() {
        assert!((cdf(0.0, 5.0) - 0.5).abs() < 1e-12);
        let upper = cdf(1.3, 7.0);
        let lower = cdf(-1.3, 7.0);
        assert!((upper + lower - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cdf_cauchy_case() {
        // df = 1 is the Cauchy distribution: F(1) = 0.75
        assert!((cdf(1.0, 1.0) - 0.75).abs() < 1e-8);
    }

    #[test]
    fn test_ppf_matches_tables() {
        // Two-sided 95% critical values
        let cases = [
            (1.0, 12.706),
            (2.0, 4.303),
            (4.0, 2.776),
            (10.0, 2.228),
            (30.0, 2.042),
        ];
        for (df, expected) in cases {
            let t = ppf(0.975, df).unwrap();
            assert!(
                (t - expected).abs() < 1e-3,
                "df={}: got {}, expected {}",
                df,
                t,
                expected
            );
        }
    }

    #[test]
    fn test_ppf_lower_tail_is_negative() {
        let t = ppf(0.025, 10.0).unwrap();
        assert!((t + 2.228).abs() < 1e-3);
        assert_eq!(ppf(0.5, 3.0).unwrap(), 0.0);
    }

    #[test]
    fn test_ppf_inverts_cdf() {
        for &p in &[0.6, 0.9, 0.995] {
            let t = ppf(p, 6.0).unwrap();
            assert!((cdf(t, 6.0) - p).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ppf_rejects_bad_arguments() {
        assert_eq!(ppf(1.0, 5.0), Err(StatsError::InvalidProbability(1.0)));
        assert_eq!(ppf(0.0, 5.0), Err(StatsError::InvalidProbability(0.0)));
        assert_eq!(ppf(0.9, 0.0), Err(StatsError::InvalidDegreesOfFreedom(0.0)));
        assert!(ppf(f64::NAN, 5.0).is_err());
    }
}
