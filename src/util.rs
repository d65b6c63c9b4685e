use crate::rate::Trend;

// 1234567 -> "1,234,567"
pub fn format_comma(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn format_eta(eta_secs: Option<u64>) -> String {
    let Some(secs) = eta_secs else {
        return "∞".to_string();
    };
    let hours = secs / 3600;
    let minutes = (secs / 60) % 60;
    if hours >= 24 {
        format!("{}d {}h", hours / 24, hours % 24)
    } else if hours >= 1 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", secs / 60)
    }
}

pub fn format_rate(blocks_per_sec: f64) -> String {
    format!("{:.2} blk/s", blocks_per_sec)
}

pub fn format_percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// Splits a bar of `width` cells into (filled, empty) for a ratio in `0..=1`.
pub fn bar_cells(ratio: f64, width: usize) -> (String, String) {
    let filled = ((ratio.clamp(0.0, 1.0)) * width as f64) as usize;
    ("■".repeat(filled), " ".repeat(width - filled))
}

pub fn trend_arrow(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "↗",
        Trend::Down => "↘",
        Trend::Flat => "→",
    }
}
