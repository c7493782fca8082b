//! Filename templating.
//!
//! Templates use `<%= key %>` placeholders. The recognised keys are `name`,
//! `hash` and `ext`; anything else is left in the output verbatim.

use regex::Regex;
use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<%=\s*(\w+)\s*%>").unwrap());

/// Values substituted into a filename template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateVars<'a> {
    /// File name without its extension.
    pub name: &'a str,
    pub hash: &'a str,
    /// Extension without the leading dot. Empty if the file has none.
    pub ext: &'a str,
}

/// Splits the file name of `path` into its stem and extension (without the
/// dot). Non UTF-8 names are converted lossily.
///
/// Returns `None` when `path` has no file name (e.g. `dir/..` or `/`).
pub fn file_parts(path: &Path) -> Option<(Cow<'_, str>, Cow<'_, str>)> {
    path.file_name()?;
    let name = path.file_stem()?.to_string_lossy();
    let ext = path
        .extension()
        .map(|ext| ext.to_string_lossy())
        .unwrap_or_default();
    Some((name, ext))
}

impl<'a> TemplateVars<'a> {
    fn lookup(&self, key: &str) -> Option<&'a str> {
        match key {
            "name" => Some(self.name),
            "hash" => Some(self.hash),
            "ext" => Some(self.ext),
            _ => None,
        }
    }
}

/// Render `template` with `vars`.
///
/// When `ext` is empty, a single `.` written directly before the `ext`
/// placeholder is dropped so extension-less files don't end in a dot.
pub fn render(template: &str, vars: &TemplateVars<'_>) -> String {
    let mut out = String::with_capacity(template.len() + vars.hash.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let literal = &template[last..whole.start()];
        out.push_str(literal);
        last = whole.end();

        match vars.lookup(key.as_str()) {
            Some(value) => {
                if key.as_str() == "ext" && value.is_empty() && literal.ends_with('.') {
                    out.pop();
                }
                out.push_str(value);
            }
            None => out.push_str(whole.as_str()),
        }
    }

    out.push_str(&template[last..]);
    out
}
