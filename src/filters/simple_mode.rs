//! Translation of the three simple-mode sliders into the advanced filter
//! vocabulary.

use super::ActiveFilters;

/// Slider positions, each 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleSliderValues {
    /// Company size: 0 is nano cap, 100 is mid/large cap.
    pub size: u8,
    /// Valuation: 0 allows expensive stocks, 100 demands deep value.
    pub value: u8,
    /// Quality: 0 applies no quality bar, 100 demands top-tier quality.
    pub quality: u8,
}

/// Compile slider positions into the same filter keys the advanced controls
/// set. Deterministic: breakpoints evaluate top-down, first match wins.
pub fn simple_mode_filters(sliders: &SimpleSliderValues) -> ActiveFilters {
    let mut filters = ActiveFilters::new();
    let mut set = |key: &str, value: &str| {
        filters.insert(key.to_string(), value.to_string());
    };

    // 1. Company size: quartiles map straight onto market-cap classes.
    if sliders.size <= 25 {
        set("marketCap", "nano");
    } else if sliders.size <= 50 {
        set("marketCap", "micro");
    } else if sliders.size <= 75 {
        set("marketCap", "small");
    } else {
        set("marketCap", "midLarge");
    }

    // 2. Valuation, from deep-value NCAV demands down to growth pricing.
    if sliders.value > 95 {
        set("ncavSafety", "le0_66");
    } else if sliders.value > 80 {
        set("peRatio", "value");
        set("evToEbit", "le8x");
    } else if sliders.value > 50 {
        set("peRatio", "blend");
    } else if sliders.value > 20 {
        // No valuation filter; expensive stocks stay visible.
    } else {
        set("peRatio", "growth");
    }

    // 3. Quality, layering ROE, leverage, earnings quality and coverage.
    if sliders.quality > 90 {
        set("roe", "excellent");
        set("debtEquityRatio", "low");
        set("fcfToNetIncome", "ge1.2");
        set("interestCoverage", "10");
        set("gmTrend", "improving");
    } else if sliders.quality > 75 {
        set("roe", "good");
        set("debtEquityRatio", "low");
        set("fcfToNetIncome", "ge1.0");
        set("interestCoverage", "5");
    } else if sliders.quality > 50 {
        set("roe", "average");
        set("debtEquityRatio", "medium");
        set("fcfToNetIncome", "ge0.8");
    } else if sliders.quality > 25 {
        set("roe", "poor");
    }
    // At 25 or below no quality filters apply at all.

    filters
}
