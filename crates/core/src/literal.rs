//! Rendering values as PostgreSQL literals and filling `$n` templates.
//!
//! Only used where statements have to travel as plain text (the `psql`
//! backend). The rendered SQL is only as trustworthy as the template and
//! values fed in: both come from the operator's own database.

use crate::SqlValue;

/// Single-quote `text`, doubling embedded quotes.
#[must_use]
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Literal form of a single value.
#[must_use]
pub fn render(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_owned(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::Text(s) => quote(s),
        SqlValue::Json(doc) => quote(&doc.to_string()),
    }
}

/// Replace every `$n` marker with the literal form of `values[n - 1]`.
///
/// One left-to-right pass: `$12` is read as a whole number and substituted
/// text is never scanned again. Markers without a matching value, and `$`
/// not followed by a digit, are copied through unchanged.
#[must_use]
pub fn fill_template(template: &str, values: &[SqlValue]) -> String {
    let mut out = String::with_capacity(template.len() + values.len() * 16);
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        let value = after[..digits]
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| values.get(idx));

        match value {
            Some(v) => out.push_str(&render(v)),
            None => {
                out.push('$');
                out.push_str(&after[..digits]);
            },
        }
        rest = &after[digits..];
    }
    out.push_str(rest);
    out
}
