//! Compact size and count rendering for report lines.

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const COUNT_UNITS: [&str; 4] = ["", "K", "M", "G"];

fn scaled(value: u64, base: f64, units: &[&str]) -> String {
    let mut scaled = value as f64;
    let mut unit = 0;
    while scaled >= base && unit + 1 < units.len() {
        scaled /= base;
        unit += 1;
    }
    if unit == 0 {
        format!("{value}{}", units[0])
    } else if scaled < 10.0 {
        format!("{scaled:.1}{}", units[unit])
    } else {
        format!("{scaled:.0}{}", units[unit])
    }
}

/// `512B`, `1.5KB`, `12MB`.
pub fn size_short(bytes: u64) -> String {
    scaled(bytes, 1024.0, &SIZE_UNITS)
}

/// `size_short` right-aligned to six columns.
pub fn padded_size_short(bytes: u64) -> String {
    format!("{:>6}", size_short(bytes))
}

/// `999`, `1.2K`, `35K`, `2.0M`.
pub fn count_short(count: u64) -> String {
    scaled(count, 1000.0, &COUNT_UNITS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_size_short() {
        assert_eq!(size_short(0), "0B");
        assert_eq!(size_short(1023), "1023B");
        assert_eq!(size_short(1536), "1.5KB");
        assert_eq!(size_short(12 * 1024 * 1024), "12MB");
    }

    #[test]
    fn test_padded_size_short() {
        assert_eq!(padded_size_short(40), "   40B");
        assert_eq!(padded_size_short(1536), " 1.5KB");
    }

    #[test]
    fn test_count_short() {
        assert_eq!(count_short(999), "999");
        assert_eq!(count_short(1234), "1.2K");
        assert_eq!(count_short(35_000), "35K");
        assert_eq!(count_short(2_000_000), "2.0M");
    }
}
