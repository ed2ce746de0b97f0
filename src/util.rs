use chrono::{Local, NaiveDate};

/// Date stamp embedded in snapshot file names.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Quote a CSV field when it contains a delimiter, quote or line break.
pub fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Split one CSV line into fields, honouring double-quoted fields.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header.
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if is_next {
            target
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(str::to_string)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn next_link_picks_next_relation() {
        let header = "<https://api.github.com/repositories/1/commits?page=1>; rel=\"prev\", \
                      <https://api.github.com/repositories/1/commits?page=3>; rel=\"next\", \
                      <https://api.github.com/repositories/1/commits?page=9>; rel=\"last\"";
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/commits?page=3")
        );
    }

    #[test]
    fn next_link_absent_on_last_page() {
        let header = "<https://api.github.com/x?page=1>; rel=\"first\", <https://api.github.com/x?page=8>; rel=\"prev\"";
        assert_eq!(next_link(header), None);
    }

    #[test]
    fn csv_fields_are_quoted_only_when_needed() {
        assert_eq!(csv_field("dataview"), "dataview");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn split_csv_line_undoes_quoting() {
        let line = format!("{},{}", csv_field("x, \"y\""), 42);
        assert_eq!(split_csv_line(&line), vec!["x, \"y\"".to_string(), "42".to_string()]);
    }

    #[test]
    fn date_stamp_is_iso() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
        assert_eq!(date_stamp(date), "2024-02-09");
    }
}
