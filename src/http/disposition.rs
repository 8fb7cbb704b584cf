//! Content-Disposition module
//!
//! Builds attachment headers for arbitrary entry names. Plain ASCII names go
//! into a quoted `filename`; anything else also gets an RFC 5987
//! `filename*` so browsers keep the original name.

/// Build an `attachment` disposition naming `file_name`
pub fn attachment(file_name: &str) -> String {
    let fallback = ascii_fallback(file_name);
    let mut value = format!("attachment; filename=\"{fallback}\"");

    if fallback != file_name {
        value.push_str("; filename*=UTF-8''");
        // Unreserved characters are a subset of `attr-char`
        value.push_str(&urlencoding::encode(file_name));
    }

    value
}

/// Replace characters that cannot appear inside a quoted header string
fn ascii_fallback(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name() {
        assert_eq!(
            attachment("report.mgz"),
            "attachment; filename=\"report.mgz\""
        );
    }

    #[test]
    fn test_name_with_spaces() {
        assert_eq!(
            attachment("my game.mgx"),
            "attachment; filename=\"my game.mgx\""
        );
    }

    #[test]
    fn test_quotes_are_replaced() {
        let value = attachment("a\"b.txt");
        assert!(value.starts_with("attachment; filename=\"a_b.txt\""));
        assert!(value.ends_with("filename*=UTF-8''a%22b.txt"));
    }

    #[test]
    fn test_non_ascii_name() {
        let value = attachment("对局.mgz");
        assert_eq!(
            value,
            "attachment; filename=\"__.mgz\"; filename*=UTF-8''%E5%AF%B9%E5%B1%80.mgz"
        );
        assert!(value.is_ascii());
    }

    #[test]
    fn test_space_in_extended_name_is_percent_encoded() {
        assert_eq!(
            attachment("my 对局.mgz"),
            "attachment; filename=\"my __.mgz\"; filename*=UTF-8''my%20%E5%AF%B9%E5%B1%80.mgz"
        );
    }
}
