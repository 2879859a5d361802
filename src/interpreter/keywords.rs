use crate::symbol::Destination;
use std::fmt;
// The `SpecialFunction` variant stays qualified; it shares its name with the enum.
use KeywordDescriptor::{CharLiteral, DestinationChange, PropertySet};

/// Control words whose semantics need custom decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialFunction {
    /// `\binN`: N bytes of raw binary data follow.
    Binary,
    /// `\uN`: a signed 16-bit UTF-16 code unit.
    Unicode,
    /// `\'` dispatched as a control word; the parameter is the byte value.
    HexPair,
}

/// How a control word is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordDescriptor {
    CharLiteral(char),
    DestinationChange(Destination),
    PropertySet,
    SpecialFunction(SpecialFunction),
}

impl fmt::Display for KeywordDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CharLiteral(ch) => write!(f, "char {:?}", ch),
            DestinationChange(dest) => write!(f, "destination {:?}", dest),
            PropertySet => write!(f, "property"),
            KeywordDescriptor::SpecialFunction(func) => write!(f, "special {:?}", func),
        }
    }
}

const SKIP: KeywordDescriptor = DestinationChange(Destination::Skip);
const BINARY: KeywordDescriptor = KeywordDescriptor::SpecialFunction(SpecialFunction::Binary);
const UNICODE: KeywordDescriptor = KeywordDescriptor::SpecialFunction(SpecialFunction::Unicode);
const HEX_PAIR: KeywordDescriptor = KeywordDescriptor::SpecialFunction(SpecialFunction::HexPair);

/// Dispatch table, sorted by name (byte order) for binary search.
pub const KEYWORDS: &[(&str, KeywordDescriptor)] = &[
    ("'", HEX_PAIR),
    ("ansicpg", PropertySet),
    ("author", SKIP),
    ("bin", BINARY),
    ("bkmkend", SKIP),
    ("bkmkstart", SKIP),
    ("bullet", CharLiteral('\u{2022}')),
    ("colorschememapping", SKIP),
    ("colortbl", SKIP),
    ("comment", SKIP),
    ("company", SKIP),
    ("datastore", SKIP),
    ("doccomm", SKIP),
    ("emdash", CharLiteral('\u{2014}')),
    ("emspace", CharLiteral(' ')),
    ("endash", CharLiteral('\u{2013}')),
    ("enspace", CharLiteral(' ')),
    ("expandedcolortbl", SKIP),
    ("filetbl", SKIP),
    ("fldinst", SKIP),
    ("fonttbl", SKIP),
    ("footer", SKIP),
    ("footerf", SKIP),
    ("footerl", SKIP),
    ("footerr", SKIP),
    ("generator", SKIP),
    ("header", SKIP),
    ("headerf", SKIP),
    ("headerl", SKIP),
    ("headerr", SKIP),
    ("info", SKIP),
    ("keywords", SKIP),
    ("latentstyles", SKIP),
    ("ldblquote", CharLiteral('"')),
    ("line", CharLiteral('\n')),
    ("list", SKIP),
    ("listlevel", SKIP),
    ("listname", SKIP),
    ("listoverridetable", SKIP),
    ("listtable", SKIP),
    ("lquote", CharLiteral('\'')),
    ("lsdlocked", SKIP),
    ("mmathPr", SKIP),
    ("nonshppict", SKIP),
    ("object", SKIP),
    ("operator", SKIP),
    ("panose", SKIP),
    ("par", CharLiteral('\n')),
    ("pgdscnxt", SKIP),
    ("pict", SKIP),
    ("pntxta", SKIP),
    ("pntxtb", SKIP),
    ("private", SKIP),
    ("qmspace", CharLiteral(' ')),
    ("rdblquote", CharLiteral('"')),
    ("revtbl", SKIP),
    ("rquote", CharLiteral('\'')),
    ("rsidtbl", SKIP),
    ("shp", SKIP),
    ("sn", SKIP),
    ("stylesheet", SKIP),
    ("subject", SKIP),
    ("tab", CharLiteral('\t')),
    ("themedata", SKIP),
    ("title", SKIP),
    ("u", UNICODE),
    ("wgrffmtfilter", SKIP),
    ("xmlnstbl", SKIP),
];

/// Look up a control word by name.
#[must_use]
pub fn lookup(name: &str) -> Option<KeywordDescriptor> {
    KEYWORDS
        .binary_search_by(|(key, _)| (*key).cmp(name))
        .ok()
        .map(|index| KEYWORDS[index].1)
}
