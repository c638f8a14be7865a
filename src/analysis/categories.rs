//! Mapping of raw and derived numerics onto the fixed screener buckets.
//!
//! Every function is a pure classification of one number; `None` input means
//! `None` output. Boundary ties always resolve to the stricter bucket.

use crate::models::{
    DebtBucket, DeepValueBucket, IncrementalRoicBucket, InsiderBuysBucket, InsiderOwnershipBucket,
    MarketCapBucket, PriceToNcav, RoeBucket, ShareCountCagrBucket, ValuationBucket, VolumeBucket,
};

pub fn market_cap_bucket(market_cap: Option<f64>) -> Option<MarketCapBucket> {
    let mcap = market_cap.filter(|v| v.is_finite())?;
    if mcap >= 2_000_000_000.0 {
        Some(MarketCapBucket::MidLarge)
    } else if mcap >= 300_000_000.0 {
        Some(MarketCapBucket::Small)
    } else if mcap >= 50_000_000.0 {
        Some(MarketCapBucket::Micro)
    } else if mcap > 0.0 {
        Some(MarketCapBucket::Nano)
    } else {
        None
    }
}

pub fn volume_bucket(avg_volume: Option<f64>) -> Option<VolumeBucket> {
    let volume = avg_volume.filter(|v| v.is_finite())?;
    if volume >= 1_000_000.0 {
        Some(VolumeBucket::High)
    } else if volume >= 100_000.0 {
        Some(VolumeBucket::Medium)
    } else if volume > 0.0 {
        Some(VolumeBucket::Low)
    } else {
        None
    }
}

pub fn debt_bucket(debt_equity_ratio: Option<f64>) -> Option<DebtBucket> {
    let ratio = debt_equity_ratio.filter(|v| v.is_finite())?;
    if ratio < 0.5 {
        Some(DebtBucket::Low)
    } else if ratio <= 1.0 {
        Some(DebtBucket::Medium)
    } else {
        Some(DebtBucket::High)
    }
}

pub fn valuation_bucket(pe_ratio: Option<f64>) -> Option<ValuationBucket> {
    let pe = pe_ratio.filter(|v| v.is_finite())?;
    if pe > 0.0 && pe < 15.0 {
        Some(ValuationBucket::Value)
    } else if pe > 25.0 {
        Some(ValuationBucket::Growth)
    } else if (15.0..=25.0).contains(&pe) {
        Some(ValuationBucket::Blend)
    } else {
        None
    }
}

/// `roe` is a fraction (0.15 == 15%).
pub fn roe_bucket(roe: Option<f64>) -> Option<RoeBucket> {
    let pct = roe.filter(|v| v.is_finite())? * 100.0;
    if pct > 20.0 {
        Some(RoeBucket::Excellent)
    } else if pct >= 15.0 {
        Some(RoeBucket::Good)
    } else if pct >= 10.0 {
        Some(RoeBucket::Average)
    } else {
        Some(RoeBucket::Poor)
    }
}

/// Ratios above 1.0, and the not-favorable marker, fall outside every
/// deep-value class.
pub fn deep_value_bucket(pnca: Option<&PriceToNcav>) -> Option<DeepValueBucket> {
    let ratio = pnca?.ratio()?;
    if ratio <= 0.5 {
        Some(DeepValueBucket::AtMostHalf)
    } else if ratio <= 0.8 {
        Some(DeepValueBucket::AtMostFourFifths)
    } else if ratio <= 1.0 {
        Some(DeepValueBucket::AtMostOne)
    } else {
        None
    }
}

pub fn share_count_cagr_bucket(cagr: Option<f64>) -> Option<ShareCountCagrBucket> {
    let cagr = cagr.filter(|v| v.is_finite())?;
    if cagr <= -0.05 {
        Some(ShareCountCagrBucket::ReductionLarge)
    } else if cagr < 0.0 {
        Some(ShareCountCagrBucket::ReductionSmall)
    } else if cagr <= 0.005 {
        Some(ShareCountCagrBucket::Flat)
    } else {
        Some(ShareCountCagrBucket::Increasing)
    }
}

/// `percentage` is already in percent (20.0 == 20%). Below 5% is not a
/// reportable class.
pub fn insider_ownership_bucket(percentage: Option<f64>) -> Option<InsiderOwnershipBucket> {
    let pct = percentage.filter(|v| v.is_finite())?;
    if pct >= 20.0 {
        Some(InsiderOwnershipBucket::AtLeast20)
    } else if pct >= 10.0 {
        Some(InsiderOwnershipBucket::AtLeast10)
    } else if pct >= 5.0 {
        Some(InsiderOwnershipBucket::AtLeast5)
    } else {
        None
    }
}

pub fn insider_buys_bucket(net_transactions: i32) -> InsiderBuysBucket {
    if net_transactions >= 1 {
        InsiderBuysBucket::NetBuying
    } else if net_transactions == 0 {
        InsiderBuysBucket::Neutral
    } else {
        InsiderBuysBucket::NetSelling
    }
}

/// Below 15% is not a reportable class.
pub fn incremental_roic_bucket(inc_roic: Option<f64>) -> Option<IncrementalRoicBucket> {
    let roic = inc_roic.filter(|v| v.is_finite())?;
    if roic >= 0.25 {
        Some(IncrementalRoicBucket::AtLeast25Pct)
    } else if roic >= 0.20 {
        Some(IncrementalRoicBucket::AtLeast20Pct)
    } else if roic >= 0.15 {
        Some(IncrementalRoicBucket::AtLeast15Pct)
    } else {
        None
    }
}
