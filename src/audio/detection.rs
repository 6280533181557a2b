/// Suffix that marks a file as a conversion candidate (matched case-sensitively)
pub const SOURCE_SUFFIX: &str = ".m4a";

/// Suffix given to converted files
pub const OUTPUT_SUFFIX: &str = ".mp3";

/// Check if a file name is an M4A source based on its literal suffix
pub fn is_m4a_name(name: &str) -> bool {
    name.ends_with(SOURCE_SUFFIX)
}

/// Derive the MP3 file name for an M4A source name
///
/// Returns `None` for names that are not conversion candidates.
pub fn output_file_name(name: &str) -> Option<String> {
    name.strip_suffix(SOURCE_SUFFIX)
        .map(|stem| format!("{stem}{OUTPUT_SUFFIX}"))
}
