use crate::fetcher::{
    errors::FetchError,
    types::{Charset, FeedResponse},
};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use url::Url;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static XML_DECL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<\?xml[^>]*?encoding\s*=\s*["']([^"']+)["']"#).unwrap());

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    content_type: String,
    body_bytes: Bytes,
) -> Result<FeedResponse, FetchError> {
    if body_bytes.is_empty() {
        return Err(FetchError::InvalidPayload("empty body".to_string()));
    }

    let charset = detect_charset(&content_type, &body_bytes);
    let body = decode_to_utf8(&body_bytes, &charset)?;

    if body.contains('\0') {
        return Err(FetchError::InvalidPayload(
            "body contains NUL bytes".to_string(),
        ));
    }
    if body.trim().is_empty() {
        return Err(FetchError::InvalidPayload("blank body".to_string()));
    }

    Ok(FeedResponse {
        url_final,
        status,
        content_type,
        body,
        charset,
        fetched_at: Utc::now(),
    })
}

fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    // 1. Byte order mark wins outright
    if let Some((encoding, _bom_len)) = Encoding::for_bom(body_bytes) {
        return Charset::from_encoding(encoding);
    }

    // 2. Content-Type header charset
    if let Some(captures) = CHARSET_REGEX.captures(content_type)
        && let Some(charset_str) = captures.get(1)
        && let Some(encoding) = Encoding::for_label(charset_str.as_str().trim().as_bytes())
    {
        return Charset::from_encoding(encoding);
    }

    // 3. XML declaration in the first 1KB: <?xml version="1.0" encoding="..."?>
    let search_bytes = &body_bytes[..body_bytes.len().min(1024)];
    let search_str = String::from_utf8_lossy(search_bytes);
    if let Some(captures) = XML_DECL_REGEX.captures(&search_str)
        && let Some(charset_str) = captures.get(1)
        && let Some(encoding) = Encoding::for_label(charset_str.as_str().trim().as_bytes())
    {
        return Charset::from_encoding(encoding);
    }

    // 4. Heuristic detection over the document head
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&body_bytes[..body_bytes.len().min(4096)], false);
    let detected = detector.guess(None, true);

    Charset::from_encoding(detected)
}

fn decode_to_utf8(body_bytes: &[u8], charset: &Charset) -> Result<String, FetchError> {
    let encoding = match charset {
        Charset::Utf8 => encoding_rs::UTF_8,
        Charset::Windows1252 => encoding_rs::WINDOWS_1252,
        Charset::ShiftJis => encoding_rs::SHIFT_JIS,
        Charset::Gbk => encoding_rs::GBK,
        Charset::Big5 => encoding_rs::BIG5,
        Charset::Other(name) => Encoding::for_label(name.as_bytes()).unwrap_or(encoding_rs::UTF_8),
    };

    let (decoded, _encoding, had_errors) = encoding.decode(body_bytes);

    if had_errors {
        return Err(FetchError::InvalidPayload(format!(
            "undecodable as {}",
            encoding.name()
        )));
    }

    Ok(decoded.into_owned())
}
