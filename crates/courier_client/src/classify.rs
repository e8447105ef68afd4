//! Report classification by file name.

use std::fmt;

/// Name fragments that mark a report as software composition analysis.
const SCA_MARKERS: &[&str] = &["sca", "supply", "dependency"];

/// Backend import endpoint a report is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportEndpoint {
    Sast,
    Sca,
}

impl ImportEndpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportEndpoint::Sast => "sast",
            ImportEndpoint::Sca => "sca",
        }
    }

    /// Path relative to the API base URL.
    pub fn path(&self) -> &'static str {
        match self {
            ImportEndpoint::Sast => "/import/sast",
            ImportEndpoint::Sca => "/import/sca",
        }
    }
}

impl fmt::Display for ImportEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the import endpoint from the file name alone.
///
/// A case-insensitive substring match: this is a naming heuristic, so a SAST
/// report named `dependency_scan.csv` or even `scan_results.csv` is routed to
/// SCA.
pub fn determine_endpoint(file_name: &str) -> ImportEndpoint {
    let lowered = file_name.to_lowercase();
    if SCA_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        ImportEndpoint::Sca
    } else {
        ImportEndpoint::Sast
    }
}
