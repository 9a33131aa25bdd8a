/// Trim whitespace. CSV quoting is already undone by the reader, so quote
/// marks left in a field are part of its value.
pub fn clean_str(raw: &str) -> &str {
    raw.trim()
}

/// Integer literal (`42`, `-7`, `+3`) that fits in an `i64`.
pub fn try_parse_int(s: &str) -> Option<i64> {
    clean_str(s).parse::<i64>().ok()
}

/// Finite floating-point literal. `inf` and `NaN` spellings are not numbers here.
pub fn try_parse_float(s: &str) -> Option<f64> {
    clean_str(s)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Quote a single SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
