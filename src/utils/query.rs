/// Escapes a drug name for openFDA's Lucene-style `search` parameter.
///
/// Every Lucene special character is escaped, so names such as
/// `ACETAMINOPHEN/CODEINE` stay a single phrase inside quotes.
pub(crate) fn escape_lucene_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' | '+' | '-' | '!' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '"' | '~' | '*'
            | '?' | ':' | '/' | '&' | '|' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}
