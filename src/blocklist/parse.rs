//! Line parsers for blocklist content.
//!
//! Two formats show up in the wild lists we load: plain domain-per-line
//! files and hosts-style files (`0.0.0.0 domain`). Both use `#` for
//! comments. The parsers are line-oriented and infallible; a line that
//! fits neither shape is skipped.

/// Hostnames that appear in hosts files but are never blockable domains.
const SYSTEM_HOSTNAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "local",
    "broadcasthost",
    "ip6-localhost",
    "ip6-loopback",
    "ip6-localnet",
    "ip6-mcastprefix",
    "ip6-allnodes",
    "ip6-allrouters",
    "ip6-allhosts",
];

/// Sentinel addresses used on the left of hosts-file lines.
const HOSTS_SENTINELS: &[&str] = &["0.0.0.0", "127.0.0.1", "::", "::1"];

/// Extract domains from blocklist content.
///
/// Handles plain domain lists and hosts-format lines in the same pass,
/// since real-world lists mix both. Comments (whole-line and trailing),
/// blank lines, and system hostnames are skipped.
pub fn parse_lines(content: &str) -> Vec<String> {
    content.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<String> {
    let line = line.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }

    let mut fields = line.split_whitespace();
    let first = fields.next()?;

    let domain = if HOSTS_SENTINELS.contains(&first) {
        // Hosts format: sentinel address followed by the domain.
        fields.next()?
    } else {
        first
    };

    if SYSTEM_HOSTNAMES.contains(&domain) {
        return None;
    }

    Some(domain.to_string())
}
