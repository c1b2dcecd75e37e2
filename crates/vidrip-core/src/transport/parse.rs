//! Parse raw response header lines into a [`ResponseHead`].

use super::ResponseHead;

/// Parses header lines collected from a transfer.
///
/// With redirects followed, curl reports the head of every hop; each status
/// line starts a new head, so only the last response's fields survive.
pub fn parse_headers(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head = ResponseHead {
                status: parse_status_line(line).unwrap_or(0),
                ..ResponseHead::default()
            };
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-length") {
            head.content_length = value.parse::<u64>().ok();
        } else if name.eq_ignore_ascii_case("content-range") {
            head.range_total = parse_content_range_total(value);
        }
    }

    head
}

fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}

/// `bytes 0-0/12345` -> 12345; `bytes */12345` -> 12345; `bytes 0-0/*` -> None.
fn parse_content_range_total(value: &str) -> Option<u64> {
    let rest = value.strip_prefix("bytes").unwrap_or(value).trim();
    let (_, total) = rest.rsplit_once('/')?;
    total.trim().parse().ok()
}
