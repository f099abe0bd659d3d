use crate::{Error, Result};
use std::str::FromStr;

/// `WWW-Authenticate` challenge parsed from an HTTP header value (RFC 7616 section 3.3)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Authentication scheme, the token before the parameters (normally `Digest`)
    pub scheme: String,
    /// Authorization realm (i.e. hostname, serial number...)
    pub realm: String,
    /// URIs that accept the same credentials. Empty if not given (i.e applies to all)
    pub domain: Vec<String>,
    /// Server nonce
    pub nonce: String,
    /// Server opaque string, echoed back verbatim
    pub opaque: Option<String>,
    /// True if the server nonce expired.
    /// This is sent in response to an auth attempt with an older digest.
    pub stale: bool,
    /// Hashing algorithm as sent by the server, possibly with a `-sess` suffix.
    /// Empty when the field was absent, which means MD5.
    pub algorithm: String,
    /// Offered qop options, in the order the server listed them
    pub qop: Vec<String>,
    /// Server-supported charset
    pub charset: Option<String>,
    /// Flag that the server supports user-hashes
    pub userhash: bool,
}

impl Challenge {
    /// Construct from the `WWW-Authenticate` header string
    ///
    /// # Errors
    /// [`Error::BadChallenge`] if the header is malformed (missing `=`, unterminated quoted
    /// string) or carries a field outside the set defined by RFC 7616.
    pub fn parse(input: &str) -> Result<Self> {
        let (scheme, params) = split_scheme(input);

        let mut challenge = Challenge {
            scheme: scheme.to_string(),
            ..Default::default()
        };

        for (key, value) in parse_header_map(params)? {
            match key.to_ascii_lowercase().as_str() {
                "realm" => challenge.realm = value,
                "domain" => {
                    challenge.domain = value.split_whitespace().map(str::to_string).collect()
                }
                "nonce" => challenge.nonce = value,
                "opaque" => challenge.opaque = Some(value),
                "stale" => challenge.stale = value.eq_ignore_ascii_case("true"),
                "algorithm" => challenge.algorithm = value,
                "qop" => {
                    challenge.qop = value
                        .split(',')
                        .map(str::trim)
                        .filter(|q| !q.is_empty())
                        .map(str::to_string)
                        .collect()
                }
                "charset" => challenge.charset = Some(value),
                "userhash" => challenge.userhash = value.eq_ignore_ascii_case("true"),
                _ => {
                    return Err(Error::BadChallenge(format!("unrecognized field \"{}\"", key)))
                }
            }
        }

        Ok(challenge)
    }

    /// True if the scheme is `Digest` (case-insensitive)
    pub fn is_digest(&self) -> bool {
        is_digest_scheme(&self.scheme)
    }
}

/// Split a header value into its scheme token and the parameter list.
/// The scheme is empty if the value starts straight with parameters.
pub(crate) fn split_scheme(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((first, rest)) if !first.contains('=') => (first, rest),
        None if !input.contains('=') => (input, ""),
        _ => ("", input),
    }
}

pub(crate) fn is_digest_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("Digest")
}

impl FromStr for Challenge {
    type Err = Error;

    /// Parse HTTP header
    fn from_str(input: &str) -> Result<Self> {
        Self::parse(input)
    }
}

/// RFC 7230 `tchar`
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Helper func that splits the parameter list received from server into key-value pairs,
/// in order of appearance. Quoted values are unescaped.
pub(crate) fn parse_header_map(input: &str) -> Result<Vec<(String, String)>> {
    #[derive(Debug)]
    #[allow(non_camel_case_types)]
    enum ParserState {
        P_WHITE,
        P_NAME(usize),
        P_VALUE_BEGIN,
        P_VALUE_QUOTED,
        P_VALUE_QUOTED_NEXTLITERAL,
        P_VALUE_PLAIN,
    }

    let bad = |what: String| Error::BadChallenge(what);

    let mut state = ParserState::P_WHITE;

    let mut parsed = Vec::new();
    let mut current_token = "";
    let mut current_value = String::new();

    for (pos, c) in input.char_indices() {
        match state {
            ParserState::P_WHITE => {
                if is_token_char(c) {
                    state = ParserState::P_NAME(pos);
                } else if !(c == ',' || c.is_whitespace()) {
                    return Err(bad(format!("unexpected '{}' at {}", c, pos)));
                }
            }
            ParserState::P_NAME(name_start) => {
                if c == '=' {
                    current_token = input[name_start..pos].trim_end();
                    if !current_token.chars().all(is_token_char) {
                        return Err(bad(format!("invalid field name \"{}\"", current_token)));
                    }
                    state = ParserState::P_VALUE_BEGIN;
                } else if c == ',' {
                    return Err(bad(format!(
                        "field \"{}\" has no value",
                        &input[name_start..pos]
                    )));
                }
            }
            ParserState::P_VALUE_BEGIN => {
                current_value.clear();
                match c {
                    '"' => state = ParserState::P_VALUE_QUOTED,
                    ',' => {
                        parsed.push((current_token.to_string(), String::new()));
                        state = ParserState::P_WHITE;
                    }
                    c if c.is_whitespace() => {}
                    _ => {
                        current_value.push(c);
                        state = ParserState::P_VALUE_PLAIN;
                    }
                }
            }
            ParserState::P_VALUE_QUOTED => match c {
                '"' => {
                    parsed.push((current_token.to_string(), std::mem::take(&mut current_value)));
                    state = ParserState::P_WHITE;
                }
                '\\' => state = ParserState::P_VALUE_QUOTED_NEXTLITERAL,
                _ => current_value.push(c),
            },
            ParserState::P_VALUE_QUOTED_NEXTLITERAL => {
                current_value.push(c);
                state = ParserState::P_VALUE_QUOTED
            }
            ParserState::P_VALUE_PLAIN => {
                if c == ',' {
                    let value = current_value.trim_end().to_string();
                    parsed.push((current_token.to_string(), value));
                    current_value.clear();
                    state = ParserState::P_WHITE;
                } else {
                    current_value.push(c);
                }
            }
        }
    }

    match state {
        ParserState::P_WHITE => {}
        ParserState::P_VALUE_BEGIN => parsed.push((current_token.to_string(), String::new())),
        ParserState::P_VALUE_PLAIN => {
            parsed.push((current_token.to_string(), current_value.trim_end().to_string()))
        }
        ParserState::P_NAME(name_start) => {
            return Err(bad(format!(
                "field \"{}\" has no value",
                input[name_start..].trim_end()
            )))
        }
        _ => return Err(bad("unterminated quoted string".into())),
    }

    Ok(parsed)
}
