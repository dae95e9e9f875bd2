//! Mod-10 (Luhn) checksum validation for receipt numbers.

/// Returns true if, after stripping spaces, `number` is a non-empty string of digits whose Luhn checksum is zero.
pub fn luhn_valid(number: &str) -> bool {
    let digits: Vec<u32> = match number.chars().filter(|c| *c != ' ').map(|c| c.to_digit(10).ok_or(())).collect() {
        Ok(d) => d,
        Err(()) => return false,
    };
    if digits.is_empty() {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
