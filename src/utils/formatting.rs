/// Format a USD amount with thousands separators: `$1,234,567`.
pub fn format_usd(usd: f64) -> String {
    let whole = usd.abs().round() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("${out}")
}

/// Compact USD for table display: `$1.5M`, `$23.4B`.
pub fn format_usd_compact(usd: f64) -> String {
    let abs = usd.abs();
    if abs >= 1e9 {
        format!("${:.1}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("${:.1}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("${:.1}k", abs / 1e3)
    } else {
        format!("${abs:.0}")
    }
}

/// Shorten a contract address for display: `0xdbdb4d16...90c8df`.
pub fn short_address(address: &str) -> String {
    if address.len() <= 16 {
        return address.to_string();
    }
    format!("{}...{}", &address[..10], &address[address.len() - 6..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_usd_separators() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.0), "$999");
        assert_eq!(format_usd(100_000.0), "$100,000");
        assert_eq!(format_usd(1_234_567.0), "$1,234,567");
    }

    #[test]
    fn test_format_usd_compact() {
        assert_eq!(format_usd_compact(450.0), "$450");
        assert_eq!(format_usd_compact(12_500.0), "$12.5k");
        assert_eq!(format_usd_compact(50_000_000.0), "$50.0M");
        assert_eq!(format_usd_compact(2_300_000_000.0), "$2.3B");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(
            short_address("0xdbdb4d16eda451d0503b854cf79d55697f90c8df"),
            "0xdbdb4d16...90c8df"
        );
        assert_eq!(short_address("0x1234"), "0x1234");
    }
}
