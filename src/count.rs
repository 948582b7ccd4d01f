/// Occupant estimate, rounded once and shown two ways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCount {
    pub value: u64,
    pub compact: String,
    pub accessible: String,
}

impl UserCount {
    pub fn new(value: u64) -> Self {
        UserCount {
            value,
            compact: compact(value),
            accessible: accessible(value),
        }
    }

    /// Prefers the moving average over the last observed count.
    pub fn resolve(moving_average: Option<f64>, nusers: Option<u32>) -> Option<Self> {
        let value = match moving_average.and_then(round_users) {
            Some(value) => value,
            None => u64::from(nusers?),
        };
        Some(UserCount::new(value))
    }
}

/// Half rounds away from zero. Negative estimates clamp to zero; NaN and
/// infinities have no count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_users(estimate: f64) -> Option<u64> {
    if !estimate.is_finite() {
        return None;
    }
    Some(estimate.max(0.0).round() as u64)
}

pub fn compact(value: u64) -> String {
    match value {
        0..=999 => value.to_string(),
        1_000..=999_999 => scaled(value, 1_000, "k"),
        _ => scaled(value, 1_000_000, "M"),
    }
}

// Truncates so the short form never overstates the count.
fn scaled(value: u64, unit: u64, suffix: &str) -> String {
    let whole = value / unit;
    if whole >= 10 {
        return format!("{whole}{suffix}");
    }
    let tenths = (value % unit) * 10 / unit;
    if tenths == 0 {
        format!("{whole}{suffix}")
    } else {
        format!("{whole}.{tenths}{suffix}")
    }
}

pub fn accessible(value: u64) -> String {
    let noun = if value == 1 { "user" } else { "users" };
    format!("{} {noun} online", group_thousands(value))
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
