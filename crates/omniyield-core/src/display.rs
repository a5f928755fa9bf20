//! Display-only formatting helpers. Accounting stays in integer motes; the
//! floating point here never feeds back into state.

use crate::constants::MOTES_PER_CSPR;

/// Format a motes amount as CSPR with K/M suffixes.
pub fn format_motes(motes: u64) -> String {
    let cspr = motes as f64 / MOTES_PER_CSPR as f64;
    if cspr >= 1_000_000.0 {
        format!("{:.2}M", cspr / 1_000_000.0)
    } else if cspr >= 1_000.0 {
        format!("{:.2}K", cspr / 1_000.0)
    } else {
        format!("{cspr:.4}")
    }
}

/// Shorten a public key or account hash for display.
pub fn format_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Render basis points as a percentage.
pub fn format_bps(bps: u32) -> String {
    format!("{:.2}%", bps as f64 / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_motes_suffixes() {
        assert_eq!(format_motes(1_500_000_000), "1.5000");
        assert_eq!(format_motes(1_500 * MOTES_PER_CSPR), "1.50K");
        assert_eq!(format_motes(2_500_000 * MOTES_PER_CSPR), "2.50M");
    }

    #[test]
    fn test_format_address() {
        let addr = "0202f5a92ab6c3e8b1d4";
        assert_eq!(format_address(addr), "0202f5...b1d4");
        assert_eq!(format_address("short"), "short");
    }

    #[test]
    fn test_format_bps() {
        assert_eq!(format_bps(420), "4.20%");
        assert_eq!(format_bps(1450), "14.50%");
    }
}
