use url::Url;

/// Parse a line-oriented URL list
///
/// Blank lines and `#` comments are skipped; bare hosts get an `http://`
/// scheme. Lines that still fail to parse as URLs are dropped with a
/// warning rather than aborting the batch.
pub fn parse(content: &str) -> Vec<String> {
    let mut targets = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let candidate = if line.starts_with("http://") || line.starts_with("https://") {
            line.to_string()
        } else {
            format!("http://{}", line)
        };

        match Url::parse(&candidate) {
            Ok(_) => targets.push(candidate),
            Err(e) => {
                ::log::warn!("skipping unparseable target {:?}: {}", line, e);
            }
        }
    }
    targets
}
