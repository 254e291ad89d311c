//! Rewriting of mode file templates into runnable shell pipelines.
//!
//! A mode file holds a shell pipeline written for a system-wide install,
//! e.g. `lt-proc '/usr/share/apertium/apertium-en-es/en-es.automorf.bin' | ...`.
//! Each stage below is a plain string transform; [`TemplateRewriter`] chains
//! them for one installation.

use regex::Regex;
use std::path::{Path, MAIN_SEPARATOR};
use std::sync::LazyLock;

/// Stage whose presence marks a pipeline as supported
pub const TRANSFER_MARKER: &str = "apertium-transfer";

/// System-wide resource prefix the templates refer to
pub const RESOURCE_PREFIX: &str = "/usr/share";

/// Replacement for the first positional placeholder (disables debug output)
pub const DEBUG_DISABLE_FLAG: &str = "-n";

pub const HTML_DEFORMAT: &str = "apertium-deshtml";
pub const HTML_REFORMAT: &str = "apertium-rehtml-noent";

static UNQUOTED_RESOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\s*)(/usr/share/\S+)(\s*)").expect("valid resource regex"));

pub fn is_transfer_pipeline(template: &str) -> bool {
    template.contains(TRANSFER_MARKER)
}

/// `$1` becomes the debug-disable flag, `$2` is dropped, whitespace trimmed
pub fn substitute_placeholders(template: &str) -> String {
    template
        .replace("$1", DEBUG_DISABLE_FLAG)
        .replace("$2", "")
        .trim()
        .to_string()
}

/// Double-quote bare resource paths, unless the template already single-quotes them
pub fn quote_resource_paths(template: &str) -> String {
    if template.contains(&format!("'{}", RESOURCE_PREFIX)) {
        return template.to_string();
    }
    UNQUOTED_RESOURCE
        .replace_all(template, "${1}\"${2}\"${3}")
        .into_owned()
}

/// Point every resource path at the managed installation
pub fn rebase_resource_paths(template: &str, pipeline_root: &str) -> String {
    template.replace(RESOURCE_PREFIX, &format!("{}{}", pipeline_root, RESOURCE_PREFIX))
}

/// Host path separators and double quotes throughout
pub fn normalize_platform_syntax(template: &str, separator: char) -> String {
    let template = if separator == '/' {
        template.to_string()
    } else {
        template.replace('/', &separator.to_string())
    };
    template.replace('\'', "\"")
}

/// Surround the pipeline with the HTML deformatter and reformatter
pub fn wrap_html_filters(body: &str) -> String {
    format!("{} | {} | {}", HTML_DEFORMAT, body, HTML_REFORMAT)
}

/// Applies all rewrite stages for one pipeline root
#[derive(Debug, Clone)]
pub struct TemplateRewriter {
    pipeline_root: String,
    separator: char,
}

impl TemplateRewriter {
    /// Rewriter for the host platform
    pub fn new<P: AsRef<Path>>(pipeline_root: P) -> Self {
        Self::with_separator(pipeline_root, MAIN_SEPARATOR)
    }

    pub fn with_separator<P: AsRef<Path>>(pipeline_root: P, separator: char) -> Self {
        Self {
            pipeline_root: pipeline_root.as_ref().to_string_lossy().into_owned(),
            separator,
        }
    }

    pub fn pipeline_root(&self) -> &str {
        &self.pipeline_root
    }

    pub fn rewrite(&self, template: &str) -> String {
        let command = substitute_placeholders(template);
        let command = quote_resource_paths(&command);
        let command = rebase_resource_paths(&command, &self.pipeline_root);
        let command = normalize_platform_syntax(&command, self.separator);
        wrap_html_filters(&command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_marker() {
        assert!(is_transfer_pipeline("lt-proc x | apertium-transfer -b a b"));
        assert!(!is_transfer_pipeline("lt-proc x | cg-proc y"));
    }

    #[test]
    fn test_substitute_placeholders() {
        assert_eq!(
            substitute_placeholders("  apertium-transfer $1 $2 foo.t1x\n"),
            "apertium-transfer -n  foo.t1x"
        );
    }

    #[test]
    fn test_quote_bare_paths() {
        assert_eq!(
            quote_resource_paths("lt-proc /usr/share/apertium/a.bin | lt-proc -g /usr/share/apertium/b.bin"),
            "lt-proc \"/usr/share/apertium/a.bin\" | lt-proc -g \"/usr/share/apertium/b.bin\""
        );
    }

    #[test]
    fn test_quote_adjacent_paths() {
        assert_eq!(
            quote_resource_paths("apertium-transfer /usr/share/a.t1x /usr/share/a.bin"),
            "apertium-transfer \"/usr/share/a.t1x\" \"/usr/share/a.bin\""
        );
    }

    #[test]
    fn test_single_quoted_templates_untouched() {
        let template = "lt-proc '/usr/share/apertium/a.bin' | lt-proc /usr/share/apertium/b.bin";
        assert_eq!(quote_resource_paths(template), template);
    }

    #[test]
    fn test_rebase_resource_paths() {
        assert_eq!(
            rebase_resource_paths("lt-proc '/usr/share/apertium/a.bin'", "/opt/apz/nightly"),
            "lt-proc '/opt/apz/nightly/usr/share/apertium/a.bin'"
        );
    }

    #[test]
    fn test_normalize_platform_syntax() {
        assert_eq!(
            normalize_platform_syntax("lt-proc '/a/b.bin'", '/'),
            "lt-proc \"/a/b.bin\""
        );
        assert_eq!(
            normalize_platform_syntax("lt-proc 'C:/a/b.bin'", '\\'),
            "lt-proc \"C:\\a\\b.bin\""
        );
    }

    #[test]
    fn test_wrap_html_filters() {
        assert_eq!(
            wrap_html_filters("lt-proc x"),
            "apertium-deshtml | lt-proc x | apertium-rehtml-noent"
        );
    }

    #[test]
    fn test_full_rewrite() {
        let rewriter = TemplateRewriter::with_separator("/opt/apz/nightly", '/');
        let command = rewriter.rewrite("apertium-transfer $1 $2 '/usr/share/apertium/foo'\n");
        assert_eq!(
            command,
            "apertium-deshtml | apertium-transfer -n  \"/opt/apz/nightly/usr/share/apertium/foo\" | apertium-rehtml-noent"
        );
    }

    #[test]
    fn test_full_rewrite_of_unquoted_template() {
        let rewriter = TemplateRewriter::with_separator("/opt/apz/nightly", '/');
        let command = rewriter.rewrite("lt-proc $1 /usr/share/apertium/en-es.automorf.bin | apertium-transfer -b /usr/share/apertium/en-es.t1x /usr/share/apertium/en-es.t1x.bin");
        assert_eq!(
            command,
            "apertium-deshtml | lt-proc -n \"/opt/apz/nightly/usr/share/apertium/en-es.automorf.bin\" | apertium-transfer -b \"/opt/apz/nightly/usr/share/apertium/en-es.t1x\" \"/opt/apz/nightly/usr/share/apertium/en-es.t1x.bin\" | apertium-rehtml-noent"
        );
    }
}
