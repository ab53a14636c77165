// SPDX-FileCopyrightText: 2025 Robin Vobruba <hoijui.quaero@gmail.com>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Parsing and DTD validation through libxml2 (the `libxml` crate).
//! XML Schema validation uses the crate's safe API directly,
//! see [`super::mets_xml`].

use std::{ffi::c_int, ptr, sync::Once};

use libxml::{
    bindings,
    error::StructuredError,
    parser::{Parser, ParserOptions, XmlParseError},
    tree::Document,
};

// libxml2 `xmlParserOption` flags
const XML_PARSE_DTDVALID: c_int = 1 << 4;
const XML_PARSE_NOERROR: c_int = 1 << 5;
const XML_PARSE_NOWARNING: c_int = 1 << 6;
const XML_PARSE_NONET: c_int = 1 << 11;

static INIT: Once = Once::new();

/// Sets up the global state of libxml2,
/// which has to happen before threads use it concurrently.
pub fn init() {
    // SAFETY: takes no arguments; repeated calls are no-ops in libxml2
    INIT.call_once(|| unsafe { bindings::xmlInitParser() });
}

/// Parses `content` without recovering from errors,
/// and without network access.
pub fn parse(content: &[u8]) -> Result<Document, XmlParseError> {
    init();
    let options = ParserOptions {
        recover: false,
        no_error: true,
        no_warning: true,
        no_net: true,
        ..ParserOptions::default()
    };
    Parser::default().parse_string_with_options(content, options)
}

/// The messages of `errors`, on one line.
#[must_use]
pub fn describe(errors: &[StructuredError]) -> String {
    errors
        .iter()
        .filter_map(|error| error.message.as_deref())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtdValidity {
    Valid,
    NotValid,
    NotWellFormed,
}

/// Splits off a leading XML declaration, if there is one.
fn split_xml_declaration(text: &str) -> (&str, &str) {
    let is_declaration = text
        .strip_prefix("<?xml")
        .is_some_and(|rest| rest.starts_with(|chr: char| chr.is_ascii_whitespace()));
    match text.find("?>") {
        Some(end) if is_declaration => text.split_at(end + 2),
        _ => ("", text),
    }
}

/// Checks the UTF-8 document `text` against `dtd`,
/// which is used as the internal subset of a document type declaration
/// for the root element `root`.
///
/// `text` must not have a document type declaration of its own.
#[must_use]
pub fn validate_with_dtd(text: &str, root: &str, dtd: &str) -> DtdValidity {
    init();
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let (declaration, body) = split_xml_declaration(text);
    let document = format!("{declaration}<!DOCTYPE {root} [\n{dtd}]>{body}");
    let Ok(size) = c_int::try_from(document.len()) else {
        return DtdValidity::NotValid;
    };
    let options = XML_PARSE_DTDVALID | XML_PARSE_NOERROR | XML_PARSE_NOWARNING | XML_PARSE_NONET;
    // SAFETY: The parser context is checked for null and freed exactly once.
    // `document` outlives the read, which does not keep a pointer to it.
    // The resulting tree is only checked for null and then freed.
    unsafe {
        let ctxt = bindings::xmlNewParserCtxt();
        if ctxt.is_null() {
            return DtdValidity::NotValid;
        }
        let doc = bindings::xmlCtxtReadMemory(
            ctxt,
            document.as_ptr().cast(),
            size,
            ptr::null(),
            c"UTF-8".as_ptr(),
            options,
        );
        let validity = if doc.is_null() || (*ctxt).wellFormed == 0 {
            DtdValidity::NotWellFormed
        } else if (*ctxt).valid == 0 {
            DtdValidity::NotValid
        } else {
            DtdValidity::Valid
        };
        if !doc.is_null() {
            bindings::xmlFreeDoc(doc);
        }
        bindings::xmlFreeParserCtxt(ctxt);
        validity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DTD: &str = "<!ELEMENT list (item+)>\n<!ELEMENT item (#PCDATA)>\n";

    #[test]
    fn parses_strictly() {
        assert!(parse(b"<list><item>1</item></list>").is_ok());
        assert!(parse(b"<list><item>1</list>").is_err());
        assert!(parse(b"").is_err());
    }

    #[test]
    fn xml_declarations() {
        assert_eq!(
            split_xml_declaration("<?xml version=\"1.0\"?>\n<list/>"),
            ("<?xml version=\"1.0\"?>", "\n<list/>")
        );
        assert_eq!(split_xml_declaration("<list/>"), ("", "<list/>"));
        assert_eq!(
            split_xml_declaration("<?xml-stylesheet href=\"a.xsl\"?><list/>"),
            ("", "<?xml-stylesheet href=\"a.xsl\"?><list/>")
        );
    }

    #[test]
    fn validates_against_a_dtd() {
        let validity = |text| validate_with_dtd(text, "list", DTD);
        assert_eq!(validity("<list><item>1</item><item/></list>"), DtdValidity::Valid);
        assert_eq!(
            validity("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<list><item>1</item></list>"),
            DtdValidity::Valid
        );
        assert_eq!(validity("\u{feff}<list><item/></list>"), DtdValidity::Valid);
        assert_eq!(validity("<list/>"), DtdValidity::NotValid);
        assert_eq!(validity("<list><item a=\"b\"/></list>"), DtdValidity::NotValid);
        assert_eq!(validity("<items><item/></items>"), DtdValidity::NotValid);
        assert_eq!(validity("<list><item></list>"), DtdValidity::NotWellFormed);
    }
}
