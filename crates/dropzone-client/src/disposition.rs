//! `Content-Disposition` filename extraction.

/// Filename advertised by a `Content-Disposition` header.
///
/// Prefers the RFC 5987 `filename*` parameter over plain `filename`. Any
/// directory components are stripped.
#[must_use]
pub fn attachment_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for parameter in header.split(';').skip(1) {
        let Some((key, value)) = parameter.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_extended(value.trim()),
            "filename" => plain = Some(unquote(value.trim())),
            _ => {}
        }
    }
    extended
        .or(plain)
        .map(|name| basename(&name).to_string())
        .filter(|name| !name.trim().is_empty())
}

fn unquote(value: &str) -> String {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map_or_else(|| value.to_string(), |inner| inner.replace("\\\"", "\""))
}

fn decode_extended(value: &str) -> Option<String> {
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    percent_decode(encoded)
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let hex = input.get(index + 1..index + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_filename() {
        assert_eq!(
            attachment_filename(r#"attachment; filename="tokio_cheatsheet.pdf""#).as_deref(),
            Some("tokio_cheatsheet.pdf")
        );
    }

    #[test]
    fn extended_filename_wins_and_is_decoded() {
        let header = r#"attachment; filename="fallback.pdf"; filename*=UTF-8''R%C3%A9sum%C3%A9.pdf"#;
        assert_eq!(attachment_filename(header).as_deref(), Some("Résumé.pdf"));
    }

    #[test]
    fn directories_are_stripped_and_missing_names_ignored() {
        assert_eq!(
            attachment_filename("attachment; filename=drops/files/a.md").as_deref(),
            Some("a.md")
        );
        assert_eq!(attachment_filename("inline"), None);
        assert_eq!(attachment_filename(r#"attachment; filename="""#), None);
    }
}
