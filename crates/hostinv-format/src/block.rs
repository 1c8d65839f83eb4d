//! Human-readable stanzas
//!
//! ```text
//! web01:
//!   cores = 8
//!   site = AMS
//!
//! db01:
//!   cores = 16
//! ```

use std::fmt::Write;

use crate::error::FormatError;
use crate::traits::{FormatRequest, OutputFormatter};

/// One stanza per host, separated by a blank line
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFormatter;

impl OutputFormatter for BlockFormatter {
    fn name(&self) -> &'static str {
        "block"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let mut out = String::new();
        for (i, host) in request.hosts().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            // Writing into a String cannot fail
            let _ = writeln!(out, "{}:", host.name);
            for (field, value) in request.present(host) {
                let _ = writeln!(out, "  {field} = {value}");
            }
        }
        Ok(out)
    }
}
