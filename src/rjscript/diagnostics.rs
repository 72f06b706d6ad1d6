use std::fmt;

use tracing::{debug, error};

use crate::rjscript::ast::position::SourceSite;

/// One human-readable problem report, optionally tied to where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub site: Option<SourceSite>,
    pub message: String,
}

impl Diagnostic {
    #[inline]
    pub fn new(site: Option<SourceSite>, message: impl Into<String>) -> Self {
        Self {
            site,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.site {
            Some(site) => write!(f, "{} {}", site, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Forwards every diagnostic to `tracing` and counts them.
#[derive(Debug, Default)]
pub struct TracingSink {
    pub reported: usize,
}

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.reported += 1;
        match &diagnostic.site {
            Some(site) => error!(at = %site, "{}", diagnostic.message),
            None => error!("{}", diagnostic.message),
        }
    }
}

/// Holds diagnostics back until the caller knows whether they matter.
#[derive(Debug, Default)]
pub struct RetainingLog {
    retained: Vec<Diagnostic>,
}

impl RetainingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays everything retained into `sink`. Diagnostics without a site
    /// are attributed to `site`.
    pub fn flush_into(self, site: Option<&SourceSite>, sink: &mut dyn DiagnosticSink) {
        for mut diagnostic in self.retained {
            if diagnostic.site.is_none() {
                diagnostic.site = site.cloned();
            }
            sink.report(diagnostic);
        }
    }

    pub fn discard(self) {
        if !self.retained.is_empty() {
            debug!(count = self.retained.len(), "discarding retained diagnostics");
        }
    }
}

impl DiagnosticSink for RetainingLog {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.retained.push(diagnostic);
    }
}

/// 1st, 2nd, 3rd, 4th, ..., 11th, 12th, 13th, 21st.
pub fn fancy_order_number(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
