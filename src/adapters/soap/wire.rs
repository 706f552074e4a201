//! SOAP wire format: envelope templates, credential masking, response parsing
//!
//! The service speaks a small fixed SOAP dialect, so requests are rendered
//! from templates rather than a generated binding. Responses are walked with
//! a quick-xml event reader. Wire tag names stay in the service's vocabulary
//! (`uzel` = node, `hodnota` = value, `cas` = timestamp).

use crate::domain::{ApiError, DateWindow, RawRecord};
use chrono::{Duration, NaiveDate};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

/// SOAPAction header value for the logon operation
pub const LOGON_ACTION: &str = "logonex";
/// SOAPAction header value for the data export operation
pub const XEXPORT_ACTION: &str = "xexport";
/// Content type for all SOAP requests
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// SOAP fault text the service returns when the account still holds an open
/// session. Treated as transient: the session expires shortly.
const ALREADY_LOGGED_IN_FAULT: &str = "již v systému přihlášen";

/// Render the logonex request envelope
pub fn logon_request(username: &str, password: &str) -> String {
    format!(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"
       soap:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"
       xmlns:ene="ENERGIS-URL">
    <soap:Body>
        <ene:logonex>
            <username>{username}</username>
            <password>{password}</password>
        </ene:logonex>
    </soap:Body>
</soap:Envelope>"#
    )
}

/// Render the xexport request envelope for one chunk
///
/// The `cas` range is inclusive of both endpoints on the wire, while
/// [`DateWindow`] is half-open, so the end bound steps back one day.
pub fn xexport_request(username: &str, key: &str, nodes: &[i64], window: &DateWindow) -> String {
    let nodes_str = nodes
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let from = format_range_bound(window.start.date());
    let to = format_range_bound((window.end - Duration::days(1)).date());

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"
               soap:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"
               xmlns:ene="ENERGIS-URL">
    <soap:Header>
        <ene:Auth>
            <exuziv>{username}</exuziv>
            <exklic>{key}</exklic>
        </ene:Auth>
    </soap:Header>
    <soap:Body>
        <ene:xexport>
            <uzel>{nodes_str}</uzel>
            <typuz>2</typuz>
            <per>{per}</per>
            <cas>{from},{to}</cas>
            <typhodn>hodnota</typhodn>
        </ene:xexport>
    </soap:Body>
</soap:Envelope>"#,
        per = window.granularity.short_code(),
    )
}

/// Format a range bound the way the service expects: `MMDDYYYYHHMM`
fn format_range_bound(date: NaiveDate) -> String {
    date.format("%m%d%Y0000").to_string()
}

/// Mask credential-bearing tags in a SOAP body before it is logged
///
/// Keeps the first character (lowercased) and masks the rest, so logs stay
/// diagnosable without exposing secrets.
pub fn mask_sensitive_fields(body: &str) -> String {
    let mut masked = body.to_string();
    for field in ["username", "password", "exuziv", "exklic"] {
        let pattern = Regex::new(&format!("(?is)<{field}>(.*?)</{field}>"))
            .expect("static masking pattern is valid");
        masked = pattern
            .replace_all(&masked, |caps: &regex::Captures<'_>| {
                let value = &caps[1];
                let replacement = match value.chars().next() {
                    Some(first) if value.chars().count() > 1 => format!(
                        "{}{}",
                        first.to_lowercase(),
                        "*".repeat(value.chars().count() - 1)
                    ),
                    _ => "*".to_string(),
                };
                format!("<{field}>{replacement}</{field}>")
            })
            .into_owned();
    }
    masked
}

/// Extract the `<faultstring>` text from a SOAP fault body, if any
pub fn parse_fault(body: &str) -> Option<String> {
    element_text(body, "faultstring")
}

/// Whether a fault message is the "already logged in" case
pub fn is_already_logged_in(fault: &str) -> bool {
    fault.contains(ALREADY_LOGGED_IN_FAULT)
}

/// Parse the logonex response and extract the session key
///
/// # Errors
///
/// A fault maps to [`ApiError::Transient`] for the already-logged-in case
/// and [`ApiError::AuthenticationFailed`] otherwise; a well-formed response
/// without a `<key>` is also an authentication failure. Broken XML maps to
/// [`ApiError::InvalidResponse`].
pub fn parse_logon_response(body: &str) -> Result<String, ApiError> {
    if let Some(fault) = parse_fault(body) {
        if is_already_logged_in(&fault) {
            return Err(ApiError::Transient(format!("session still open: {fault}")));
        }
        return Err(ApiError::AuthenticationFailed(fault));
    }

    match element_text_checked(body, "key")? {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ApiError::AuthenticationFailed(
            "no key found in the logon response".to_string(),
        )),
    }
}

/// Parse the xexport response into raw records
///
/// Records missing any of the three fields are dropped, matching the
/// service's own notion of an incomplete row. An empty list is a valid
/// response (no data for the period).
///
/// # Errors
///
/// A fault maps to [`ApiError::Fault`]; broken XML maps to
/// [`ApiError::InvalidResponse`].
pub fn parse_xexport_response(body: &str) -> Result<Vec<RawRecord>, ApiError> {
    if let Some(fault) = parse_fault(body) {
        return Err(ApiError::Fault(fault));
    }

    let mut reader = Reader::from_str(body);
    reader.trim_text(true);

    let mut records = Vec::new();
    let mut in_record = false;
    let mut current_field: Option<&'static str> = None;
    let mut node = None;
    let mut value = None;
    let mut timestamp = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"responseData" => {
                    in_record = true;
                    node = None;
                    value = None;
                    timestamp = None;
                }
                b"uzel" if in_record => current_field = Some("uzel"),
                b"hodnota" if in_record => current_field = Some("hodnota"),
                b"cas" if in_record => current_field = Some("cas"),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(field) = current_field {
                    let text = t
                        .unescape()
                        .map_err(|e| ApiError::InvalidResponse(e.to_string()))?
                        .into_owned();
                    match field {
                        "uzel" => node = Some(text),
                        "hodnota" => value = Some(text),
                        "cas" => timestamp = Some(text),
                        _ => unreachable!(),
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"responseData" => {
                    if let (Some(node), Some(value), Some(timestamp)) =
                        (node.take(), value.take(), timestamp.take())
                    {
                        records.push(RawRecord {
                            node,
                            value,
                            timestamp,
                        });
                    }
                    in_record = false;
                }
                _ => current_field = None,
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ApiError::InvalidResponse(e.to_string())),
        }
    }

    Ok(records)
}

/// Text content of the first element with the given local name, ignoring XML
/// errors (used for best-effort fault extraction)
fn element_text(body: &str, name: &str) -> Option<String> {
    element_text_checked(body, name).ok().flatten()
}

fn element_text_checked(body: &str, name: &str) -> Result<Option<String>, ApiError> {
    let mut reader = Reader::from_str(body);
    reader.trim_text(true);
    let mut capture = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == name.as_bytes() => capture = true,
            Ok(Event::Text(t)) if capture => {
                let text = t
                    .unescape()
                    .map_err(|e| ApiError::InvalidResponse(e.to_string()))?
                    .into_owned();
                return Ok(Some(text));
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == name.as_bytes() => {
                return Ok(Some(String::new()))
            }
            Ok(Event::Eof) => return Ok(None),
            Ok(_) => {}
            Err(e) => return Err(ApiError::InvalidResponse(e.to_string())),
        }
    }
}
