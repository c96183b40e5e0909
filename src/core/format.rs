//! Fixed `pt-BR` rendering of the amounts and horizons the engine produces.

const CURRENCY_PREFIX: &str = "R$\u{a0}";

/// `R$ 1.234,56` with a no-break space. Rounds half away from zero on the
/// shortest decimal form of the value.
pub fn format_currency(value: f64) -> String {
    if value.is_nan() {
        return format!("{CURRENCY_PREFIX}NaN");
    }
    if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        return format!("{sign}{CURRENCY_PREFIX}∞");
    }

    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    let mut frac_digits = frac_part.chars();
    let mut cents = String::with_capacity(int_part.len() + 2);
    cents.push_str(int_part);
    cents.push(frac_digits.next().unwrap_or('0'));
    cents.push(frac_digits.next().unwrap_or('0'));
    if frac_digits.next().is_some_and(|d| d >= '5') {
        cents = increment_decimal(&cents);
    }

    let sign = if value < 0.0 && cents.bytes().any(|d| d != b'0') {
        "-"
    } else {
        ""
    };
    let (whole, fraction) = cents.split_at(cents.len() - 2);

    format!(
        "{sign}{CURRENCY_PREFIX}{},{fraction}",
        group_thousands(whole)
    )
}

fn increment_decimal(digits: &str) -> String {
    let mut out: Vec<u8> = digits.bytes().collect();
    for digit in out.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return String::from_utf8_lossy(&out).into_owned();
        }
    }
    let mut carried = String::with_capacity(out.len() + 1);
    carried.push('1');
    carried.push_str(&String::from_utf8_lossy(&out));
    carried
}

pub fn format_duration(months: u32) -> String {
    format!("{} anos e {} meses", months / 12, months % 12)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
