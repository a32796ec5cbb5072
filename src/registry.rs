//! Resource type registry.
//!
//! Maps between the canonical names of the predefined resource types and their numeric `RT_*` codes,
//! and resolves user supplied type strings into a [`ResourceType`].
//! See <https://learn.microsoft.com/en-us/windows/win32/menurc/resource-types> for the predefined types.

use core::{convert::Infallible, fmt, str::FromStr};

use crate::constants::*;

/// Name returned for numeric resource types that are not predefined.
/// It is upper case and therefore never equal to a predefined type name.
pub const UNKNOWN_TYPE_NAME: &str = "UNKNOWN";

/// Predefined resource types.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum KnownType {
    Accelerator,
    Anicursor,
    Aniicon,
    Bitmap,
    Cursor,
    Dialog,
    Dlginclude,
    Font,
    Fontdir,
    Groupcursor,
    Groupicon,
    Html,
    Icon,
    Manifest,
    Menu,
    Messagetable,
    Plugplay,
    Rcdata,
    String,
    Version,
    Vxd,
}

// sorted by name and in variant order
const KNOWN_TYPES: [(&str, KnownType, WORD); 21] = [
    ("accelerator", KnownType::Accelerator, RT_ACCELERATOR),
    ("anicursor", KnownType::Anicursor, RT_ANICURSOR),
    ("aniicon", KnownType::Aniicon, RT_ANIICON),
    ("bitmap", KnownType::Bitmap, RT_BITMAP),
    ("cursor", KnownType::Cursor, RT_CURSOR),
    ("dialog", KnownType::Dialog, RT_DIALOG),
    ("dlginclude", KnownType::Dlginclude, RT_DLGINCLUDE),
    ("font", KnownType::Font, RT_FONT),
    ("fontdir", KnownType::Fontdir, RT_FONTDIR),
    ("groupcursor", KnownType::Groupcursor, RT_GROUP_CURSOR),
    ("groupicon", KnownType::Groupicon, RT_GROUP_ICON),
    ("html", KnownType::Html, RT_HTML),
    ("icon", KnownType::Icon, RT_ICON),
    ("manifest", KnownType::Manifest, RT_MANIFEST),
    ("menu", KnownType::Menu, RT_MENU),
    ("messagetable", KnownType::Messagetable, RT_MESSAGETABLE),
    ("plugplay", KnownType::Plugplay, RT_PLUGPLAY),
    ("rcdata", KnownType::Rcdata, RT_RCDATA),
    ("string", KnownType::String, RT_STRING),
    ("version", KnownType::Version, RT_VERSION),
    ("vxd", KnownType::Vxd, RT_VXD),
];

impl KnownType {
    /// Look up a predefined type by its canonical name. The lookup is case sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN_TYPES
            .binary_search_by(|(known, ..)| (*known).cmp(name))
            .ok()
            .map(|index| KNOWN_TYPES[index].1)
    }

    /// Look up a predefined type by its numeric code.
    pub fn from_code(code: WORD) -> Option<Self> {
        KNOWN_TYPES.iter().find(|(.., known)| *known == code).map(|(_, known, _)| *known)
    }

    /// Returns the canonical name.
    pub fn name(self) -> &'static str { self.entry().0 }

    /// Returns the numeric `RT_*` code.
    pub fn code(self) -> WORD { self.entry().2 }

    fn entry(self) -> &'static (&'static str, KnownType, WORD) {
        // table order matches variant order
        &KNOWN_TYPES[self as usize]
    }
}

/// Returns all predefined resource types as `(name, code)` pairs, sorted by name.
pub fn known_types() -> impl Iterator<Item = (&'static str, WORD)> {
    KNOWN_TYPES.iter().map(|(name, _, code)| (*name, *code))
}

/// Resource type of a resource entry.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ResourceType {
    /// One of the predefined types.
    Known(KnownType),
    /// A numeric type that is not predefined. Only produced when enumerating modules.
    Numeric(WORD),
    /// A custom type identified by name.
    Custom(String),
}

impl ResourceType {
    /// Resolve a user supplied type string.
    ///
    /// A string wrapped in double quotes always resolves to a custom type carrying the unwrapped content,
    /// even if it matches a predefined name. Other strings resolve to the predefined type of that name,
    /// or to a custom type carrying the string verbatim.
    pub fn resolve(name: &str) -> Self {
        if let Some(unquoted) = unquote(name) {
            return ResourceType::Custom(unquoted.to_string());
        }
        match KnownType::from_name(name) {
            Some(known) => ResourceType::Known(known),
            None => ResourceType::Custom(name.to_string()),
        }
    }

    /// Create a type from a numeric code, preferring the predefined variant.
    pub fn from_code(code: WORD) -> Self {
        match KnownType::from_code(code) {
            Some(known) => ResourceType::Known(known),
            None => ResourceType::Numeric(code),
        }
    }

    /// Returns the display name of the type.
    ///
    /// Predefined types return their canonical name, numeric types [`UNKNOWN_TYPE_NAME`],
    /// and custom types their name wrapped in double quotes so that it resolves back to the same type.
    pub fn name(&self) -> String {
        match self {
            ResourceType::Known(known) => known.name().to_string(),
            ResourceType::Numeric(_) => UNKNOWN_TYPE_NAME.to_string(),
            ResourceType::Custom(name) => format!("\"{}\"", name),
        }
    }

    /// Returns the numeric code, or `None` for custom types.
    pub fn code(&self) -> Option<WORD> {
        match self {
            ResourceType::Known(known) => Some(known.code()),
            ResourceType::Numeric(code) => Some(*code),
            ResourceType::Custom(_) => None,
        }
    }

    /// Returns whether the type is one of the predefined types.
    pub fn is_known(&self) -> bool { matches!(self, ResourceType::Known(_)) }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.name()) }
}

impl FromStr for ResourceType {
    type Err = Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> { Ok(Self::resolve(name)) }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self { Self::resolve(name) }
}

impl From<KnownType> for ResourceType {
    fn from(known: KnownType) -> Self { ResourceType::Known(known) }
}

fn unquote(name: &str) -> Option<&str> {
    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        Some(&name[1..name.len() - 1])
    } else {
        None
    }
}
