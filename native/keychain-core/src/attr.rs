//! Item classes, attribute codes and the host-facing name tables.
//!
//! Every item attribute in Keychain Services is identified by a
//! four-character code (`'acct'`, `'svce'`, ...). The `kSecAttr*` keys of
//! the SecItem API are CFStrings holding those same codes, so the tables
//! here double as dictionary keys when queries are built.

use crate::error::{KeychainError, Result};
use serde::Serialize;
use std::fmt;

/// Password item classes handled by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ItemClass {
    GenericPassword,
    InternetPassword,
}

impl ItemClass {
    pub fn code(&self) -> &'static str {
        match self {
            ItemClass::GenericPassword => "genp",
            ItemClass::InternetPassword => "inet",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemClass::GenericPassword => "generic",
            ItemClass::InternetPassword => "internet",
        }
    }

    /// Accepts either the class code or the host name.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "genp" | "generic" => Ok(ItemClass::GenericPassword),
            "inet" | "internet" => Ok(ItemClass::InternetPassword),
            other => Err(KeychainError::invalid_argument(format!(
                "unknown item class '{}'",
                other
            ))),
        }
    }

    /// Whether an item of this class can carry `key`.
    pub fn accepts(&self, key: AttrKey) -> bool {
        match self {
            ItemClass::GenericPassword => !matches!(
                key,
                AttrKey::Server
                    | AttrKey::SecurityDomain
                    | AttrKey::Port
                    | AttrKey::Path
                    | AttrKey::Protocol
                    | AttrKey::AuthenticationType
            ),
            ItemClass::InternetPassword => !matches!(key, AttrKey::Service | AttrKey::Generic),
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the value stored under an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Text,
    Data,
    Integer,
    Boolean,
    Date,
    /// Four-character code packed into a `UInt32`.
    FourCc,
}

macro_rules! attr_keys {
    ($( $variant:ident => $code:literal, $shape:ident; )*) => {
        /// Item attribute, identified by its four-character code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub enum AttrKey {
            $( $variant, )*
        }

        impl AttrKey {
            pub const ALL: &'static [AttrKey] = &[ $( AttrKey::$variant, )* ];

            pub fn code(&self) -> &'static str {
                match self {
                    $( AttrKey::$variant => $code, )*
                }
            }

            pub fn shape(&self) -> Shape {
                match self {
                    $( AttrKey::$variant => Shape::$shape, )*
                }
            }

            pub fn from_code(code: &str) -> Option<AttrKey> {
                match code {
                    $( $code => Some(AttrKey::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

attr_keys! {
    CreationDate => "cdat", Date;
    ModDate => "mdat", Date;
    Description => "desc", Text;
    Comment => "icmt", Text;
    Creator => "crtr", FourCc;
    Type => "type", FourCc;
    ScriptCode => "scrp", Integer;
    Label => "labl", Text;
    Invisible => "invi", Boolean;
    Negative => "nega", Boolean;
    CustomIcon => "cusi", Boolean;
    Account => "acct", Text;
    Service => "svce", Text;
    Generic => "gena", Data;
    SecurityDomain => "sdmn", Text;
    Server => "srvr", Text;
    AuthenticationType => "atyp", Text;
    Port => "port", Integer;
    Path => "path", Text;
    Volume => "vlme", Text;
    Address => "addr", Text;
    Signature => "ssig", Data;
    Protocol => "ptcl", Text;
    CertificateType => "ctyp", Integer;
    CertificateEncoding => "cenc", Integer;
    CrlType => "crtp", Integer;
    CrlEncoding => "crnc", Integer;
    Alias => "alis", Data;
}

/// Host-facing attribute names, in snake case.
const HOST_NAMES: &[(&str, AttrKey)] = &[
    ("created_at", AttrKey::CreationDate),
    ("updated_at", AttrKey::ModDate),
    ("description", AttrKey::Description),
    ("comment", AttrKey::Comment),
    ("label", AttrKey::Label),
    ("negative", AttrKey::Negative),
    ("invisible", AttrKey::Invisible),
    ("account", AttrKey::Account),
    ("service", AttrKey::Service),
    ("generic", AttrKey::Generic),
    ("security_domain", AttrKey::SecurityDomain),
    ("host", AttrKey::Server),
    ("port", AttrKey::Port),
    ("path", AttrKey::Path),
    ("protocol", AttrKey::Protocol),
    ("authentication_type", AttrKey::AuthenticationType),
    ("creator", AttrKey::Creator),
    ("type", AttrKey::Type),
];

impl AttrKey {
    /// Host name of the attribute, if it is exposed to the host.
    pub fn host_name(&self) -> Option<&'static str> {
        HOST_NAMES
            .iter()
            .find(|(_, key)| key == self)
            .map(|(name, _)| *name)
    }

    /// Resolves a host name (snake or camel case) or a raw four-character code.
    pub fn lookup(name: &str) -> Result<AttrKey> {
        let snake = to_snake_case(name);
        HOST_NAMES
            .iter()
            .find(|(host, _)| *host == snake)
            .map(|(_, key)| *key)
            .or_else(|| AttrKey::from_code(name))
            .ok_or_else(|| {
                KeychainError::invalid_argument(format!("unknown keychain attribute '{}'", name))
            })
    }

    /// Maintained by the keychain itself.
    pub fn is_read_only(&self) -> bool {
        matches!(self, AttrKey::CreationDate | AttrKey::ModDate)
    }
}

impl fmt::Display for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_name().unwrap_or_else(|| self.code()))
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Converts snake case to the camel case used on JS objects.
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for ch in name.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.push(ch.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

const PROTOCOLS: &[(&str, &str)] = &[
    ("ftp", "ftp "),
    ("ftp_account", "ftpa"),
    ("http", "http"),
    ("irc", "irc "),
    ("nntp", "nntp"),
    ("pop3", "pop3"),
    ("smtp", "smtp"),
    ("socks", "sox "),
    ("imap", "imap"),
    ("ldap", "ldap"),
    ("appletalk", "atlk"),
    ("afp", "afp "),
    ("telnet", "teln"),
    ("ssh", "ssh "),
    ("ftps", "ftps"),
    ("https", "htps"),
    ("http_proxy", "htpx"),
    ("https_proxy", "htsx"),
    ("ftp_proxy", "ftpx"),
    ("smb", "smb "),
    ("rtsp", "rtsp"),
    ("rtsp_proxy", "rtsx"),
    ("daap", "daap"),
    ("eppc", "eppc"),
    ("ipp", "ipp "),
    ("nntps", "ntps"),
    ("ldaps", "ldps"),
    ("telnets", "tels"),
    ("imaps", "imps"),
    ("ircs", "ircs"),
    ("pop3s", "pops"),
    ("cvs_pserver", "cvsp"),
    ("svn", "svn "),
];

const AUTHENTICATION_TYPES: &[(&str, &str)] = &[
    ("ntlm", "ntlm"),
    ("msn", "msna"),
    ("dpa", "dpaa"),
    ("rpa", "rpaa"),
    ("http_basic", "http"),
    ("http_digest", "httd"),
    ("html_form", "form"),
    ("default", "dflt"),
];

/// Maps a protocol name to its code; four-character codes pass through.
pub fn protocol_code(name: &str) -> Result<String> {
    name_to_code(PROTOCOLS, name, "protocol")
}

pub fn protocol_name(code: &str) -> String {
    code_to_name(PROTOCOLS, code)
}

pub fn authentication_type_code(name: &str) -> Result<String> {
    name_to_code(AUTHENTICATION_TYPES, name, "authentication type")
}

pub fn authentication_type_name(code: &str) -> String {
    code_to_name(AUTHENTICATION_TYPES, code)
}

fn name_to_code(table: &[(&str, &str)], name: &str, what: &str) -> Result<String> {
    let lowered = name.to_ascii_lowercase();
    if let Some((_, code)) = table.iter().find(|(n, _)| *n == lowered) {
        return Ok(code.to_string());
    }
    if name.len() == 4 && name.is_ascii() {
        return Ok(name.to_string());
    }
    Err(KeychainError::invalid_argument(format!(
        "unknown {} '{}'",
        what, name
    )))
}

fn code_to_name(table: &[(&str, &str)], code: &str) -> String {
    table
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Packs a four-character code big-endian, as `FourCharCode` does.
pub fn four_cc_to_u32(code: &str) -> Result<u32> {
    let bytes = code.as_bytes();
    if bytes.len() != 4 || !code.is_ascii() {
        return Err(KeychainError::invalid_argument(format!(
            "'{}' is not a four-character code",
            code
        )));
    }
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

pub fn u32_to_four_cc(value: u32) -> String {
    value.to_be_bytes().iter().map(|b| *b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        for (i, a) in AttrKey::ALL.iter().enumerate() {
            assert_eq!(a.code().len(), 4, "{:?}", a);
            for b in &AttrKey::ALL[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
            assert_eq!(AttrKey::from_code(a.code()), Some(*a));
        }
    }

    #[test]
    fn test_lookup_host_names() {
        assert_eq!(AttrKey::lookup("created_at").unwrap(), AttrKey::CreationDate);
        assert_eq!(AttrKey::lookup("createdAt").unwrap(), AttrKey::CreationDate);
        assert_eq!(AttrKey::lookup("securityDomain").unwrap(), AttrKey::SecurityDomain);
        assert_eq!(AttrKey::lookup("host").unwrap(), AttrKey::Server);
        assert_eq!(AttrKey::lookup("vlme").unwrap(), AttrKey::Volume);
        assert!(AttrKey::lookup("colour").is_err());
    }

    #[test]
    fn test_host_name_round_trip() {
        for (name, key) in HOST_NAMES {
            assert_eq!(key.host_name(), Some(*name));
        }
        assert_eq!(AttrKey::Volume.host_name(), None);
        assert_eq!(AttrKey::Volume.to_string(), "vlme");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("security_domain"), "securityDomain");
        assert_eq!(to_camel_case("authentication_type"), "authenticationType");
        assert_eq!(to_camel_case("port"), "port");
    }

    #[test]
    fn test_item_class() {
        assert_eq!(ItemClass::parse("genp").unwrap(), ItemClass::GenericPassword);
        assert_eq!(ItemClass::parse("internet").unwrap(), ItemClass::InternetPassword);
        assert!(ItemClass::parse("cert").is_err());

        assert!(ItemClass::GenericPassword.accepts(AttrKey::Service));
        assert!(!ItemClass::GenericPassword.accepts(AttrKey::Server));
        assert!(ItemClass::InternetPassword.accepts(AttrKey::Port));
        assert!(!ItemClass::InternetPassword.accepts(AttrKey::Service));
    }

    #[test]
    fn test_protocols() {
        assert_eq!(protocol_code("https").unwrap(), "htps");
        assert_eq!(protocol_code("SSH").unwrap(), "ssh ");
        assert_eq!(protocol_code("xmpp").unwrap(), "xmpp");
        assert!(protocol_code("gopher").is_err());
        assert_eq!(protocol_name("htps"), "https");
        assert_eq!(protocol_name("zzzz"), "zzzz");
    }

    #[test]
    fn test_authentication_types() {
        assert_eq!(authentication_type_code("http_basic").unwrap(), "http");
        assert_eq!(authentication_type_name("dflt"), "default");
    }

    #[test]
    fn test_four_cc_packing() {
        let packed = four_cc_to_u32("aapl").unwrap();
        assert_eq!(packed, 0x6161_706c);
        assert_eq!(u32_to_four_cc(packed), "aapl");
        assert!(four_cc_to_u32("toolong").is_err());
    }
}
