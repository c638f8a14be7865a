//! Composite "simple score" and the momentum baseline.

use rand::Rng;

/// Inputs feeding the composite score. Each absent input contributes
/// exactly zero points to its category.
#[derive(Debug, Clone, Default)]
pub struct ScoreInputs {
    pub fcf_per_share: Option<f64>,
    pub price: f64,
    pub net_cash_to_market_cap: Option<f64>,
    pub insider_buy_value_to_market_cap: Option<f64>,
    pub revenue_cagr_3yr: Option<f64>,
    pub has_catalyst: bool,
}

/// Composite score in [0, 100], additive over five independent sources:
/// owner-earnings yield (max 30), net-cash ratio (max 20), insider buying
/// (max 15), revenue growth (max 20) and the catalyst bonus (5). The weight
/// table tops out at 90.
pub fn simple_score(inputs: &ScoreInputs) -> u32 {
    let mut score: u32 = 0;

    // 1. Owner-earnings yield (FCF per share / price)
    if let Some(fcf) = inputs.fcf_per_share {
        if fcf != 0.0 && inputs.price > 0.0 {
            let fcf_yield = fcf / inputs.price;
            score += if fcf_yield > 0.10 {
                30
            } else if fcf_yield > 0.08 {
                25
            } else if fcf_yield > 0.06 {
                20
            } else if fcf_yield > 0.04 {
                15
            } else if fcf_yield > 0.02 {
                10
            } else if fcf_yield > 0.0 {
                5
            } else {
                0
            };
        }
    }

    // 2. Net cash relative to market cap
    if let Some(ratio) = inputs.net_cash_to_market_cap {
        score += if ratio > 0.50 {
            20
        } else if ratio > 0.25 {
            15
        } else if ratio > 0.10 {
            10
        } else if ratio > 0.0 {
            5
        } else {
            0
        };
    }

    // 3. Insider purchase value relative to market cap
    if let Some(ratio) = inputs.insider_buy_value_to_market_cap {
        score += if ratio > 0.005 {
            15
        } else if ratio > 0.002 {
            10
        } else if ratio > 0.0005 {
            5
        } else {
            0
        };
    }

    // 4. Three-year revenue CAGR
    if let Some(cagr) = inputs.revenue_cagr_3yr {
        score += if cagr > 0.15 {
            20
        } else if cagr > 0.10 {
            15
        } else if cagr > 0.05 {
            10
        } else if cagr > 0.0 {
            5
        } else {
            0
        };
    }

    // 5. Catalyst bonus
    if inputs.has_catalyst {
        score += 5;
    }

    score.min(100)
}

/// Synthetic score baseline for the 63-trading-day look-back: the current
/// score perturbed by up to ±5%, rounded and clamped to [0, 100].
///
/// Stands in for a real historical score source; any replacement only has to
/// keep `rank_momentum` as current minus baseline.
pub fn score_63_days_ago<R: Rng>(simple_score: u32, rng: &mut R) -> u32 {
    let jitter = 1.0 + (rng.gen::<f64>() * 0.10 - 0.05);
    let baseline = (simple_score as f64 * jitter).round();
    baseline.clamp(0.0, 100.0) as u32
}

/// Signed score change over the look-back window.
pub fn rank_momentum(current: u32, baseline: u32) -> i32 {
    current as i32 - baseline as i32
}
