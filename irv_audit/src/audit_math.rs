/*!
Sample size and risk formulas for ballot-level comparison audits.

These follow the Kaplan-Markov bound used for comparison audits in
Colorado. The counts of discrepancies enter the formulas as
understatements (favourable) and overstatements (adverse), each split
into one-vote and two-vote discrepancies.
*/

/// The error inflation factor used by default in the comparison audit formulas.
pub const GAMMA: f64 = 1.03905;

/// The number of ballots to sample (in total) if no further overstatement is found.
///
/// Returns 0 for a zero diluted margin: there is nothing to measure.
/// The result is never smaller than the number of discrepancies already observed.
pub fn optimistic(
    risk_limit: f64,
    diluted_margin: f64,
    gamma: f64,
    two_under: u64,
    one_under: u64,
    one_over: u64,
    two_over: u64,
) -> u64 {
    if diluted_margin == 0.0 {
        return 0;
    }
    let two_gamma = 2.0 * gamma;
    let z = (-two_gamma / diluted_margin)
        * (risk_limit.ln()
            + one_under as f64 * (1.0 + 1.0 / two_gamma).ln()
            + two_under as f64 * (1.0 + 1.0 / gamma).ln()
            + one_over as f64 * (1.0 - 1.0 / two_gamma).ln()
            + two_over as f64 * (1.0 - 1.0 / gamma).ln());
    // NaN and negative values collapse to 0 here.
    let n = z.ceil().max(0.0) as u64;
    let observed = two_under + one_under + one_over + two_over;
    n.max(observed)
}

/// The approximate p-value of the audit after `audited_samples` ballots.
///
/// The value is capped at 1.
pub fn p_value_approximation(
    audited_samples: u64,
    diluted_margin: f64,
    gamma: f64,
    one_under: u64,
    two_under: u64,
    one_over: u64,
    two_over: u64,
) -> f64 {
    let two_gamma = 2.0 * gamma;
    let p = (1.0 - diluted_margin / two_gamma).powf(audited_samples as f64)
        * (1.0 - 1.0 / two_gamma).powf(-(one_over as f64))
        * (1.0 - 1.0 / gamma).powf(-(two_over as f64))
        * (1.0 + 1.0 / two_gamma).powf(-(one_under as f64))
        * (1.0 + 1.0 / gamma).powf(-(two_under as f64));
    p.min(1.0)
}

/// `ceil(samples * (1 + overstatements / audited_samples))`, computed exactly.
///
/// The factor is 1 when nothing has been audited yet.
pub fn scaled_estimate(samples: u64, audited_samples: u64, overstatements: u64) -> u64 {
    if audited_samples == 0 {
        return samples;
    }
    let num = samples as u128 * (audited_samples as u128 + overstatements as u128);
    let den = audited_samples as u128;
    let res = (num + den - 1) / den;
    res.min(u64::MAX as u128) as u64
}

/// Rounds a risk value to 3 decimal places, halves going up.
///
/// The rounding applies to the shortest decimal form of the value, so that
/// `0.5005` gives `0.501` even though `0.5005 * 1000` is just below 500.5.
pub fn round_risk(p: f64) -> f64 {
    if !p.is_finite() || p < 0.0 {
        return p;
    }
    let s = p.to_string();
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), ""));
    let frac = frac_part.as_bytes();
    if frac.len() <= 3 {
        return p;
    }
    let thousandths = int_part
        .parse::<u64>()
        .ok()
        .zip(frac_part[..3].parse::<u64>().ok())
        .map(|(i, f)| i * 1000 + f + u64::from(frac[3] >= b'5'));
    match thousandths {
        Some(n) => n as f64 / 1000.0,
        None => (p * 1000.0).round() / 1000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimistic_no_discrepancies() {
        assert_eq!(optimistic(0.05, 0.1, GAMMA, 0, 0, 0, 0), 63);
        assert_eq!(optimistic(0.03, 0.02, GAMMA, 0, 0, 0, 0), 365);
    }

    #[test]
    fn optimistic_with_discrepancies() {
        assert_eq!(optimistic(0.05, 0.1, GAMMA, 0, 0, 1, 0), 76);
        assert_eq!(optimistic(0.05, 0.1, GAMMA, 0, 0, 0, 1), 131);
        assert_eq!(optimistic(0.05, 0.1, GAMMA, 0, 1, 0, 0), 55);
        assert_eq!(optimistic(0.05, 0.1, GAMMA, 0, 0, 2, 1), 158);
    }

    #[test]
    fn optimistic_zero_margin() {
        assert_eq!(optimistic(0.05, 0.0, GAMMA, 0, 0, 3, 1), 0);
    }

    #[test]
    fn optimistic_is_at_least_observed() {
        // Many understatements push the bound below zero.
        assert_eq!(optimistic(0.05, 0.5, GAMMA, 40, 0, 0, 0), 40);
    }

    #[test]
    fn p_value() {
        let p = p_value_approximation(50, 0.1, GAMMA, 0, 0, 0, 0);
        assert_eq!(round_risk(p), 0.085);
        let p = p_value_approximation(50, 0.1, GAMMA, 0, 0, 1, 0);
        assert_eq!(round_risk(p), 0.164);
        let p = p_value_approximation(50, 0.1, GAMMA, 1, 0, 0, 0);
        assert_eq!(round_risk(p), 0.057);
        let p = p_value_approximation(10, 0.1, GAMMA, 0, 0, 0, 0);
        assert_eq!(round_risk(p), 0.611);
    }

    #[test]
    fn p_value_is_capped() {
        assert_eq!(p_value_approximation(50, 0.1, GAMMA, 0, 0, 0, 1), 1.0);
        assert_eq!(p_value_approximation(3, 0.1, GAMMA, 0, 0, 2, 0), 1.0);
    }

    #[test]
    fn scaling() {
        assert_eq!(scaled_estimate(63, 0, 4), 63);
        assert_eq!(scaled_estimate(63, 10, 0), 63);
        // 63 * 1.1 = 69.3
        assert_eq!(scaled_estimate(63, 10, 1), 70);
        // 60 * 1.5 = 90 exactly
        assert_eq!(scaled_estimate(60, 2, 1), 90);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_risk(0.0845), 0.085);
        assert_eq!(round_risk(0.08449), 0.084);
        assert_eq!(round_risk(1.0), 1.0);
    }

    #[test]
    fn rounding_decimal_ties() {
        // 0.5005 * 1000 is 500.49999999999994 in binary.
        assert_eq!(round_risk(0.5005), 0.501);
        assert_eq!(round_risk(0.5015), 0.502);
        assert_eq!(round_risk(0.5025), 0.503);
        assert_eq!(round_risk(0.0005), 0.001);
        assert_eq!(round_risk(0.00049999), 0.0);
        assert_eq!(round_risk(0.9995), 1.0);
        assert_eq!(round_risk(0.25), 0.25);
    }
}
