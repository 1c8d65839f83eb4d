//! Shell-sourceable `export` lines
//!
//! ```text
//! export HOST_NAME='web01'
//! export CORES='8'
//! export OWNER='O'"'"'Brien'
//! ```
//!
//! Every value is single-quoted, so the output can be fed to `sh` or `eval`
//! without expansion of `$`, backticks or globs.
//!
//! Variable names come from [`shell_name`], which can map different
//! attributes to one variable (`os.name` and `os_name` are both `OS_NAME`).
//! Within a host the first attribute in field order keeps the variable and
//! later ones are skipped with a warning. `HOST_NAME` is always taken by the
//! host name. Names are not checked against the environment, so an attribute
//! called `path` or `home` exports `PATH` or `HOME`; source the output in a
//! subshell when that matters.

use std::collections::HashSet;
use std::fmt::Write;

use tracing::warn;

use crate::error::FormatError;
use crate::traits::{FormatRequest, OutputFormatter};

/// One block of `export` lines per host, separated by a blank line
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptFormatter;

impl OutputFormatter for ScriptFormatter {
    fn name(&self) -> &'static str {
        "script"
    }

    fn format(&self, request: &FormatRequest<'_>) -> Result<String, FormatError> {
        let mut out = String::new();
        for (i, host) in request.hosts().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "export HOST_NAME={}", shell_quote(&host.name));
            let mut taken = HashSet::from(["HOST_NAME".to_string()]);
            for (field, value) in request.present(host) {
                let variable = shell_name(field);
                if !taken.insert(variable.clone()) {
                    warn!(
                        host = %host.name,
                        field,
                        variable = %variable,
                        "shell variable already exported for this host, skipping attribute"
                    );
                    continue;
                }
                let _ = writeln!(
                    out,
                    "export {variable}={}",
                    shell_quote(&value.to_string())
                );
            }
        }
        Ok(out)
    }
}

/// Turn an attribute name into a shell variable name
///
/// Upper-cases ASCII letters and replaces anything outside `[A-Z0-9_]` with
/// `_`. A leading digit gets a `_` prefix.
#[must_use]
pub fn shell_name(field: &str) -> String {
    let mut name: String = field
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Single-quote `value` for POSIX shells
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\"'\"'"))
}
