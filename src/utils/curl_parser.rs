use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::Url;
use std::str::FromStr;

// Set by reqwest per request, or would break decoding without the matching features.
const SKIPPED_HEADERS: [&str; 4] = ["content-type", "content-length", "accept-encoding", "host"];

/// Borrows a logged-in browser session from a "Copy as cURL" command.
#[derive(Clone, Default)]
pub struct CurlParser {
    pub headers: Option<HeaderMap>,
    pub base_url: Option<String>,
}

impl CurlParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, curl_text: &str) -> Result<(), String> {
        let url = first_quoted_after(curl_text, "curl ")
            .ok_or("Could not find a request URL in curl command".to_string())?;
        let url = Url::parse(&url).map_err(|e| format!("Invalid URL in curl command: {}", e))?;
        let base_url = url.origin().ascii_serialization();

        let mut headers = HeaderMap::new();
        for line in curl_text.lines() {
            let line = line.trim().trim_end_matches('\\').trim();

            if let Some(value) = flag_value(line, &["-b ", "--cookie "]) {
                if let Ok(value) = HeaderValue::from_str(&value) {
                    headers.insert(COOKIE, value);
                }
                continue;
            }

            let Some(content) = flag_value(line, &["-H ", "--header "]) else {
                continue;
            };
            let Some((key, value)) = content.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            if SKIPPED_HEADERS.contains(&key.as_str()) {
                continue;
            }

            if let Ok(header_name) = HeaderName::from_str(&key) {
                if let Ok(header_value) = HeaderValue::from_str(value.trim()) {
                    headers.insert(header_name, header_value);
                }
            }
        }

        if !headers.contains_key(COOKIE) {
            return Err("No cookie found in curl command; copy it from a logged-in tab".to_string());
        }

        self.base_url = Some(base_url);
        self.headers = Some(headers);
        Ok(())
    }
}

fn flag_value(line: &str, flags: &[&str]) -> Option<String> {
    flags
        .iter()
        .find_map(|flag| line.strip_prefix(flag))
        .and_then(|rest| unquote(rest.trim()))
}

fn first_quoted_after(text: &str, marker: &str) -> Option<String> {
    let start = text.find(marker)? + marker.len();
    unquote(text[start..].trim_start())
}

fn unquote(s: &str) -> Option<String> {
    let quote = s.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let rest = &s[1..];
    rest.find(quote).map(|end| rest[..end].to_string())
}
