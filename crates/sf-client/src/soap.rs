//! SOAP response helpers.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// A SOAP fault returned by Salesforce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapFault {
    /// Fault code, kept verbatim (for example `sf:INVALID_SESSION_ID`).
    pub fault_code: String,
    /// Human-readable fault string.
    pub fault_string: String,
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SOAP Fault: {} - {}", self.fault_code, self.fault_string)
    }
}

/// Extract the text of the first element whose local name is `tag`.
///
/// Namespace prefixes are ignored, so `tag = "sessionId"` matches both
/// `<sessionId>` and `<sf:sessionId>`. Returns `None` when the element is
/// absent or the document cannot be read up to it.
pub fn extract_element(xml: &str, tag: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut inside = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if !inside && e.local_name().as_ref() == tag.as_bytes() => {
                inside = true;
            }
            Ok(Event::Empty(e)) if !inside && e.local_name().as_ref() == tag.as_bytes() => {
                return Some(String::new());
            }
            Ok(Event::Text(t)) if inside => {
                text.push_str(&t.unescape().ok()?);
            }
            Ok(Event::CData(c)) if inside => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(e)) if inside && e.local_name().as_ref() == tag.as_bytes() => {
                return Some(text);
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Parse a SOAP fault out of a response body.
///
/// Returns `None` when the body has no `faultcode` element.
pub fn parse_fault(xml: &str) -> Option<SoapFault> {
    let fault_code = extract_element(xml, "faultcode")?;
    let fault_string =
        extract_element(xml, "faultstring").unwrap_or_else(|| "Unknown error".to_string());

    Some(SoapFault {
        fault_code,
        fault_string,
    })
}
