/// Suffix every pipeline definition file carries
pub const MODE_SUFFIX: &str = ".mode";

/// Split a mode file name into its source and target codes.
///
/// Only plain `<xx>-<yy>.mode` names with two or three letter codes are
/// accepted. Locale and script variants such as `en-es_valencia.mode` or
/// `sr_Latn-hbs.mode` are not supported and yield `None`.
pub fn parse_mode_file_name(file_name: &str) -> Option<(&str, &str)> {
    let stem = file_name.strip_suffix(MODE_SUFFIX)?;
    let mut parts = stem.split('-');
    let source = parts.next()?;
    let target = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if is_code_length(source) && is_code_length(target) {
        Some((source, target))
    } else {
        None
    }
}

/// Whether a directory entry names a supported mode file
pub fn is_mode_file_name(file_name: &str) -> bool {
    parse_mode_file_name(file_name).is_some()
}

fn is_code_length(code: &str) -> bool {
    matches!(code.chars().count(), 2 | 3)
}
