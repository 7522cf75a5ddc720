pub mod nmap;
pub mod urls;


/// Enum to represent the supported batch input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// One URL per line
    UrlList,
    /// A network-scan XML export
    NmapXml,
}

impl InputFormat {
    /// Guess the input format from the content itself
    ///
    /// Scan exports are XML documents with an `nmaprun` root; everything
    /// else is treated as a URL list.
    pub fn detect(content: &str) -> Self {
        let head = content.trim_start();
        if head.starts_with("<?xml") || head.starts_with("<nmaprun") {
            ::log::debug!("Classifying input as scan XML");
            InputFormat::NmapXml
        } else {
            ::log::debug!("Classifying input as URL list");
            InputFormat::UrlList
        }
    }
}

/// Parse batch input into the list of target URLs
pub fn parse(content: &str, format: InputFormat) -> Result<Vec<String>, String> {
    let targets = match format {
        InputFormat::UrlList => urls::parse(content),
        InputFormat::NmapXml => nmap::parse(content)?,
    };
    ::log::info!("parsed {} target urls from input", targets.len());
    Ok(targets)
}
