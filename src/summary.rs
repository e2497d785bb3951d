use crate::state::{CombinedSummary, StatusSnapshot};

pub const NO_NETWORK_LINE: &str = "[x] Can't connect to Wi-Fi";

const ERROR_STATUS: &str = "Error";
const ERROR_HEADLINE: &str = "Error from API.";

/// Builds the five panel lines for the two Pi-holes. A missing `local_ip`
/// appends the no-network warning as a sixth line.
pub fn build_summary(
    primary: &StatusSnapshot,
    secondary: &StatusSnapshot,
    local_ip: Option<&str>,
) -> CombinedSummary {
    let (a, b) = (primary, secondary);
    let mut lines = vec![
        format!(
            "[+] Total Queries: {}, (1) {} / (2) {}",
            a.queries_today.saturating_add(b.queries_today),
            a.queries_today,
            b.queries_today
        ),
        format!(
            "[+] Queries Cached: {}, (1) {} / (2) {}",
            a.queries_cached.saturating_add(b.queries_cached),
            a.queries_cached,
            b.queries_cached
        ),
        format!(
            "[x] Queries Blocked: {}, (1) {} / (2) {}",
            a.ads_blocked_today.saturating_add(b.ads_blocked_today),
            a.ads_blocked_today,
            b.ads_blocked_today
        ),
        format!(
            "[x] Percent Blocked: (1) {} / (2) {}",
            percent(a.ads_percentage_today),
            percent(b.ads_percentage_today)
        ),
        format!(
            "[x] Blocklist: (1) {} / (2) {}",
            a.domains_blocked, b.domains_blocked
        ),
    ];
    if local_ip.map_or(true, str::is_empty) {
        lines.push(NO_NETWORK_LINE.to_string());
    }

    CombinedSummary {
        body_text: lines.join("\n"),
        status_line: format!("(1) {} / (2) {}", a.status, b.status),
    }
}

/// Screen for a failed poll: the raw response, flattened and wrapped to
/// `columns`, clipped to `rows` lines including the headline.
pub fn error_summary(raw_response: &str, columns: usize, rows: usize) -> CombinedSummary {
    let columns = columns.max(1);
    let flat = raw_response.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<char> = flat.chars().collect();

    let mut lines = vec![ERROR_HEADLINE.to_string()];
    lines.extend(
        chars
            .chunks(columns)
            .take(rows.saturating_sub(1))
            .map(|chunk| chunk.iter().collect::<String>()),
    );

    CombinedSummary {
        body_text: lines.join("\n"),
        status_line: ERROR_STATUS.to_string(),
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}
