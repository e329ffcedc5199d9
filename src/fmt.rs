use bigdecimal::BigDecimal;

/// Round half-up to the cent.
pub fn cents(val: &BigDecimal) -> BigDecimal {
    // with_scale truncates toward zero
    let half_cent = BigDecimal::from(5) / BigDecimal::from(1000);
    let shifted = if *val < BigDecimal::from(0) {
        val - &half_cent
    } else {
        val + &half_cent
    };
    shifted.with_scale(2)
}

/// Format a decimal as a real amount with thousands separators: R$ 1,234.56
pub fn money(val: &BigDecimal) -> String {
    let rounded = cents(val).to_string();
    let (negative, abs) = match rounded.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, rounded.as_str()),
    };
    let (int_part, dec_part) = abs.split_once('.').unwrap_or((abs, "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("R$ -{with_commas}.{dec_part}")
    } else {
        format!("R$ {with_commas}.{dec_part}")
    }
}

/// Quote a string the way a Python `repr` does: single quotes unless the text
/// holds a single quote and no double quote.
fn repr(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() && (c as u32) < 0x100 => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Render a frequency table as `{'value': count, ...}`.
pub fn freq_dict(entries: &[(String, usize)]) -> String {
    let body: Vec<String> = entries
        .iter()
        .map(|(value, count)| format!("{}: {count}", repr(value)))
        .collect();
    format!("{{{}}}", body.join(", "))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(&dec("1234.56")), "R$ 1,234.56");
        assert_eq!(money(&dec("-500.00")), "R$ -500.00");
        assert_eq!(money(&dec("0")), "R$ 0.00");
        assert_eq!(money(&dec("1000000.99")), "R$ 1,000,000.99");
        assert_eq!(money(&dec("42.1")), "R$ 42.10");
    }

    #[test]
    fn test_money_rounds_half_up() {
        assert_eq!(money(&dec("0.005")), "R$ 0.01");
        assert_eq!(money(&dec("66.666666")), "R$ 66.67");
        assert_eq!(money(&dec("10.004")), "R$ 10.00");
    }

    #[test]
    fn test_freq_dict() {
        let entries = vec![("SP".to_string(), 3), ("PÃO".to_string(), 1)];
        assert_eq!(freq_dict(&entries), "{'SP': 3, 'PÃO': 1}");
        assert_eq!(freq_dict(&[]), "{}");
    }

    #[test]
    fn test_freq_dict_quotes_like_repr() {
        let entries = vec![("D'ÁGUA".to_string(), 2)];
        assert_eq!(freq_dict(&entries), r#"{"D'ÁGUA": 2}"#);

        let both = vec![(r#"O'BRIEN "X""#.to_string(), 1)];
        assert_eq!(freq_dict(&both), r#"{'O\'BRIEN "X"': 1}"#);

        let escaped = vec![("C:\\TEMP\tA".to_string(), 1)];
        assert_eq!(freq_dict(&escaped), r"{'C:\\TEMP\tA': 1}");
    }
}
