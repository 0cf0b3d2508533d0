//! Token substitution engine
//!
//! Pure text rendering: replaces `{token_name}` markers in a template
//! with values from a data record. Token names are matched
//! case-insensitively, unknown tokens stay verbatim, and the installment
//! pair `{numero_parcela}/{total_parcelas}` is handled as one unit before
//! either half is substituted on its own.

use serde_json::{Map, Value};

/// Numerator half of the installment composite token
pub const INSTALLMENT_NUMBER_TOKEN: &str = "numero_parcela";

/// Denominator half of the installment composite token
pub const INSTALLMENT_TOTAL_TOKEN: &str = "total_parcelas";

/// Word that precedes an installment token in prose; leftover tokens in
/// this position get the fallback repair pass.
const INSTALLMENT_CONTEXT_WORD: &str = "parcela ";

/// Render a template against a data record.
///
/// Side-effect free and idempotent for a fixed `(template, data)` pair:
/// every occurrence of a known token is replaced globally, tokens absent
/// from `data` are left in place, and nothing is ever interpreted as code.
pub fn render(template: &str, data: &Map<String, Value>) -> String {
    if data.is_empty() {
        return template.to_string();
    }

    let number = lookup(data, INSTALLMENT_NUMBER_TOKEN);
    let total = lookup(data, INSTALLMENT_TOTAL_TOKEN);

    let mut output = template.to_string();

    // The combined "current/total" form must go first. Substituting the
    // halves independently while only one is known would leave a
    // mismatched partial like "2/{total_parcelas}".
    if let (Some(number), Some(total)) = (&number, &total) {
        output = replace_ignore_case(
            &output,
            &format!(
                "{{{}}}/{{{}}}",
                INSTALLMENT_NUMBER_TOKEN, INSTALLMENT_TOTAL_TOKEN
            ),
            &format!("{}/{}", number, total),
        );
    }

    // Independent global pass per known token.
    for (name, value) in data {
        output = replace_ignore_case(&output, &format!("{{{}}}", name), &value_text(value));
    }

    repair_installment_tokens(output, number.as_deref(), total.as_deref())
}

/// Fallback pass for installment tokens that survived substitution while
/// sitting directly after the word "parcela". Papers over incomplete data
/// records so raw markers never reach the recipient; a warning is logged
/// because the caller should have supplied the values.
fn repair_installment_tokens(
    mut output: String,
    number: Option<&str>,
    total: Option<&str>,
) -> String {
    let number_marker = format!("{{{}}}", INSTALLMENT_NUMBER_TOKEN);
    let total_marker = format!("{{{}}}", INSTALLMENT_TOTAL_TOKEN);

    for (marker, value) in [(&number_marker, number), (&total_marker, total)] {
        let in_context = format!("{}{}", INSTALLMENT_CONTEXT_WORD, marker);
        if output.to_ascii_lowercase().contains(&in_context) {
            tracing::warn!(
                "installment token {} survived substitution; data record was incomplete",
                marker
            );
            output = replace_after_prefix_ignore_case(
                &output,
                INSTALLMENT_CONTEXT_WORD,
                marker,
                value.unwrap_or(""),
            );
        }
    }

    output
}

/// Case-insensitive lookup of a token value in the data record
fn lookup(data: &Map<String, Value>, name: &str) -> Option<String> {
    data.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value_text(value))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Replace every case-insensitive occurrence of `pattern` in `input`.
///
/// Token names are ASCII, so ASCII-lowercasing keeps byte offsets aligned
/// between `input` and its lowered copy.
fn replace_ignore_case(input: &str, pattern: &str, replacement: &str) -> String {
    if pattern.is_empty() {
        return input.to_string();
    }

    let lowered = input.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lowered[cursor..].find(&pattern) {
        let start = cursor + found;
        output.push_str(&input[cursor..start]);
        output.push_str(replacement);
        cursor = start + pattern.len();
    }

    output.push_str(&input[cursor..]);
    output
}

/// Replace `token` with `replacement` only where it directly follows
/// `prefix` (both matched case-insensitively). The prefix itself keeps
/// its original casing.
fn replace_after_prefix_ignore_case(
    input: &str,
    prefix: &str,
    token: &str,
    replacement: &str,
) -> String {
    let lowered = input.to_ascii_lowercase();
    let pattern = format!("{}{}", prefix, token).to_ascii_lowercase();

    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(found) = lowered[cursor..].find(&pattern) {
        let start = cursor + found;
        let token_start = start + prefix.len();
        output.push_str(&input[cursor..token_start]);
        output.push_str(replacement);
        cursor = token_start + token.len();
    }

    output.push_str(&input[cursor..]);
    output
}
