//! Target extraction from nmap XML exports.

/// TCP ports treated as plain-HTTP web services
const HTTP_PORTS: [u16; 4] = [80, 8000, 8080, 8888];

/// TCP ports treated as HTTPS web services
const HTTPS_PORTS: [u16; 2] = [443, 8443];

/// Parse an nmap XML export into capture targets
///
/// Every up host contributes one URL per open web-service port. A port
/// counts as a web service when its service name starts with `http` or it
/// is one of the well-known web ports; `https`/`ssl` service names and the
/// well-known TLS ports select the `https` scheme.
pub fn parse(content: &str) -> Result<Vec<String>, String> {
    let document =
        roxmltree::Document::parse(content).map_err(|e| format!("invalid scan XML: {}", e))?;

    let root = document.root_element();
    if root.tag_name().name() != "nmaprun" {
        return Err(format!(
            "expected an nmaprun document, found <{}>",
            root.tag_name().name()
        ));
    }

    let mut targets = Vec::new();
    for host in root.children().filter(|n| n.has_tag_name("host")) {
        if !host_is_up(&host) {
            continue;
        }
        let Some(address) = host_address(&host) else {
            continue;
        };

        for port in host
            .children()
            .filter(|n| n.has_tag_name("ports"))
            .flat_map(|ports| ports.children().filter(|n| n.has_tag_name("port")))
        {
            if !port_is_open(&port) {
                continue;
            }
            let Some(number) = port.attribute("portid").and_then(|p| p.parse::<u16>().ok())
            else {
                continue;
            };
            let service = port
                .children()
                .find(|n| n.has_tag_name("service"))
                .and_then(|s| s.attribute("name"))
                .unwrap_or("");

            if let Some(url) = target_url(&address, number, service) {
                targets.push(url);
            }
        }
    }

    Ok(targets)
}

/// Whether the host's status element reports it as up
fn host_is_up(host: &roxmltree::Node) -> bool {
    host.children()
        .find(|n| n.has_tag_name("status"))
        .and_then(|s| s.attribute("state"))
        .map(|state| state == "up")
        .unwrap_or(false)
}

/// Preferred address for a host: its first hostname, else its address
fn host_address(host: &roxmltree::Node) -> Option<String> {
    let hostname = host
        .children()
        .filter(|n| n.has_tag_name("hostnames"))
        .flat_map(|h| h.children().filter(|n| n.has_tag_name("hostname")))
        .find_map(|n| n.attribute("name"));
    if let Some(name) = hostname {
        return Some(name.to_string());
    }

    host.children()
        .find(|n| n.has_tag_name("address"))
        .and_then(|a| a.attribute("addr"))
        .map(str::to_string)
}

/// Whether the port's state element reports it as open
fn port_is_open(port: &roxmltree::Node) -> bool {
    port.children()
        .find(|n| n.has_tag_name("state"))
        .and_then(|s| s.attribute("state"))
        .map(|state| state == "open")
        .unwrap_or(false)
}

/// Build the URL for a web-service port, or None for non-web services
fn target_url(address: &str, port: u16, service: &str) -> Option<String> {
    let https = service.starts_with("https")
        || service.starts_with("ssl")
        || HTTPS_PORTS.contains(&port);
    let http = service.starts_with("http") || HTTP_PORTS.contains(&port);
    if !https && !http {
        return None;
    }

    let scheme = if https { "https" } else { "http" };
    let default_port = if https { 443 } else { 80 };
    if port == default_port {
        Some(format!("{}://{}", scheme, address))
    } else {
        Some(format!("{}://{}:{}", scheme, address, port))
    }
}
