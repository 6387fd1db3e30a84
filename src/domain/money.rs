use std::fmt;

/// Amounts are kept as integer cents so sums and comparisons stay exact.
/// 12.50 is stored as 1250.
pub type Cents = i64;

/// Largest amount a single expense may carry: one billion in whole units.
/// Keeps every total over the table far inside `i64`.
pub const MAX_AMOUNT_CENTS: Cents = 100_000_000_000;

/// True when `cents` is within `-MAX_AMOUNT_CENTS..=MAX_AMOUNT_CENTS`.
pub fn is_within_limit(cents: Cents) -> bool {
    cents.unsigned_abs() <= MAX_AMOUNT_CENTS.unsigned_abs()
}

/// Render cents as a plain decimal string, e.g. 1250 -> "12.50".
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a user-entered amount into cents.
///
/// Accepts an optional leading `$`, whole units ("20"), or up to two decimal
/// places ("20.5", "20.05", ".99"). More precision than a cent is rejected
/// rather than silently truncated, and so is anything beyond
/// [`MAX_AMOUNT_CENTS`].
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let trimmed = input.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed),
    };
    let body = body.strip_prefix('$').unwrap_or(body);

    if body.is_empty() {
        return Err(ParseCentsError::Empty);
    }

    let (units_str, fraction_str) = body.split_once('.').unwrap_or((body, ""));

    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !fraction_str.chars().all(|c| c.is_ascii_digit())
        || (units_str.is_empty() && fraction_str.is_empty())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => fraction_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        2 => fraction_str.parse().map_err(|_| ParseCentsError::InvalidFormat)?,
        _ => return Err(ParseCentsError::TooPrecise),
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .filter(|c| is_within_limit(*c))
        .ok_or(ParseCentsError::Overflow)?;

    Ok(if negative { -cents } else { cents })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    Empty,
    InvalidFormat,
    TooPrecise,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::Empty => write!(f, "amount is empty"),
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::TooPrecise => write!(f, "amounts have at most two decimal places"),
            ParseCentsError::Overflow => {
                write!(f, "amount exceeds {}", format_cents(MAX_AMOUNT_CENTS))
            }
        }
    }
}

impl std::error::Error for ParseCentsError {}
