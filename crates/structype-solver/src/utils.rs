//! Small helpers shared by the interner, the evaluator and the formatter.

/// Render a number the way a numeric literal key or template hole would
/// print it (`1`, `0.5`, `1e+21`, `NaN`).
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value.is_sign_negative() {
            "-Infinity".to_string()
        } else {
            "Infinity".to_string()
        };
    }

    let abs = value.abs();
    if !(1e-6..1e21).contains(&abs) {
        let mut formatted = format!("{value:e}");
        if let Some(split) = formatted.find('e') {
            let (mantissa, exp) = formatted.split_at(split);
            let exp_digits = &exp[1..];
            let (sign, digits) = match exp_digits.strip_prefix('-') {
                Some(rest) => ('-', rest),
                None => ('+', exp_digits),
            };
            formatted = format!("{mantissa}e{sign}{digits}");
        }
        return formatted;
    }

    value.to_string()
}

/// Whether a property name is the canonical spelling of a number, i.e. it
/// can index a tuple or array (`"0"`, `"12"`, `"1.5"`).
pub fn is_numeric_literal_name(name: &str) -> bool {
    if name == "NaN" || name == "Infinity" || name == "-Infinity" {
        return true;
    }
    match name.parse::<f64>() {
        Ok(value) if value.is_finite() => number_to_string(value) == name,
        _ => false,
    }
}

/// Parse a property name as a non-negative tuple index.
pub fn tuple_index(name: &str) -> Option<usize> {
    if name.len() > 1 && name.starts_with('0') {
        return None;
    }
    name.parse().ok()
}
