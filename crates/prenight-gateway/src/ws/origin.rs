use prenight_core::error::PrenightError;

/// Check a WebSocket `Origin` header against `allowed` `host:port` entries.
///
/// An empty list allows every origin. Entries and origins without a port
/// use the scheme's default (80, or 443 for `https`).
pub fn check_origin(origin: Option<&str>, allowed: &[String]) -> Result<(), PrenightError> {
    if allowed.is_empty() {
        return Ok(());
    }
    let Some(origin) = origin else {
        return Err(PrenightError::OriginRejected {
            origin: "<missing>".to_string(),
        });
    };

    let (scheme, authority) = origin.split_once("://").unwrap_or(("http", origin));
    let default_port = if scheme.eq_ignore_ascii_case("https") { 443 } else { 80 };
    let wanted = normalize(authority.trim_end_matches('/'), default_port);

    if allowed.iter().any(|entry| normalize(entry.trim(), 80) == wanted) {
        Ok(())
    } else {
        Err(PrenightError::OriginRejected {
            origin: origin.to_string(),
        })
    }
}

fn normalize(authority: &str, default_port: u16) -> String {
    let authority = authority.to_ascii_lowercase();
    let has_port = authority
        .rsplit_once(':')
        .is_some_and(|(host, port)| {
            !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) && !host.is_empty()
        });
    if has_port {
        authority
    } else {
        format!("{authority}:{default_port}")
    }
}
