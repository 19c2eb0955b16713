/// Priority-ordered symbols processed by batch forecasts (large caps first).
pub const SYMBOL_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "TSLA", "NVDA", "JPM", "JNJ", "V", //
    "PG", "UNH", "HD", "MA", "BAC", "XOM", "PFE", "DIS", "KO", "INTC", //
    "NFLX", "PEP", "MRK", "ABBV", "CSCO", "ADBE", "CRM", "T", "WMT", "NKE", //
    "ORCL", "VZ", "MCD", "CVX", "ABT", "LLY", "QCOM", "TXN", "NEE", "MDT", //
    "COST", "DHR", "AMGN", "BMY", "AVGO", "ACN", "UNP", "HON", "IBM", "PM", //
    "LOW", "LIN", "UPS", "INTU", "SBUX", "GE", "RTX", "CAT", "LMT", "GILD", //
    "DE", "ISRG", "NOW", "SPGI", "TMO", "EL", "ZTS", "BLK", "ADI", "PLD", //
    "MU", "MO", "SYK", "CI", "BDX", "CHTR", "MMC", "SO", "PNC", "FISV", //
    "USB", "CB", "ICE", "MDLZ", "C", "ADP", "DUK", "GM", "REGN", "EW", //
    "AXP", "VRTX", "SHW", "APD", "TGT", "CL", "ETN", "EMR", "HUM", "ECL",
];

/// Symbols forecast when no symbol is given
pub const DEFAULT_WATCHLIST: &[&str] = &["AAPL", "MSFT"];

pub fn default_universe() -> Vec<String> {
    SYMBOL_UNIVERSE.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_universe_has_no_duplicates() {
        let unique: HashSet<_> = SYMBOL_UNIVERSE.iter().collect();
        assert_eq!(unique.len(), SYMBOL_UNIVERSE.len());
        assert_eq!(SYMBOL_UNIVERSE.len(), 100);
    }
}
