//! The COS object model (§3): the tagged sum every PDF value parses into.

use std::collections::HashMap;

/// A PDF dictionary. Keys are unique; first occurrence wins when a parser
/// encounters a duplicate key (§3), which [`insert_first_wins`] encodes.
pub type Dict = HashMap<String, Object>;

/// A COS object (§3). Strings are never silently decoded into text here —
/// that's deferred to the font layer, since a string's meaning depends on
/// context (it can be a date, a name component, or font-encoded glyphs).
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// `null`
    Null,
    /// `true` / `false`
    Boolean(bool),
    /// Any PDF number; PDF does not distinguish int/real at the object-model
    /// level (§3: "may be integer-valued").
    Number(f64),
    /// A name, e.g. the dictionary value `/Page`.
    Name(String),
    /// Literal or hex string bytes, already unescaped/un-hexed by the parser
    /// but not yet interpreted as text.
    String(Vec<u8>),
    /// An ordered array of objects.
    Array(Vec<Object>),
    /// A dictionary.
    Dictionary(Dict),
    /// A stream: its dictionary plus raw (still filtered/encrypted) bytes.
    Stream {
        /// The stream dictionary (holds `/Filter`, `/Length`, etc).
        dict: Dict,
        /// Raw payload exactly as it appeared between `stream`/`endstream`.
        data: Vec<u8>,
    },
    /// An indirect reference, `num gen R`.
    Reference(ObjectRef),
}

/// Reference to an indirect object: object number + generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number.
    pub num: u32,
    /// Generation number.
    pub gen: u16,
}

impl ObjectRef {
    /// Construct a reference.
    pub fn new(num: u32, gen: u16) -> Self {
        Self { num, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.num, self.gen)
    }
}

impl Object {
    /// Human-readable type name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "Null",
            Object::Boolean(_) => "Boolean",
            Object::Number(_) => "Number",
            Object::Name(_) => "Name",
            Object::String(_) => "String",
            Object::Array(_) => "Array",
            Object::Dictionary(_) => "Dictionary",
            Object::Stream { .. } => "Stream",
            Object::Reference(_) => "Reference",
        }
    }

    /// Cast to an integer (truncating toward zero), if this is a `Number`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Object::Number(n) => Some(*n as i64),
            _ => None,
        }
    }

    /// Cast to an `f64`, if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Cast to a name's string, if this is a `Name`.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(s) => Some(s),
            _ => None,
        }
    }

    /// Cast to a dictionary. Works for both `Dictionary` and `Stream`
    /// (a stream's dict is always reachable this way, per §3).
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream { dict, .. } => Some(dict),
            _ => None,
        }
    }

    /// Cast to an array.
    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Cast to an indirect reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Object::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Cast to a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Cast to raw string bytes.
    pub fn as_string_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    /// Cast to the raw stream payload and its dict.
    pub fn as_stream(&self) -> Option<(&Dict, &[u8])> {
        match self {
            Object::Stream { dict, data } => Some((dict, data)),
            _ => None,
        }
    }

    /// True for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }
}

/// Insert into a dict honoring the "first occurrence wins" rule (§3).
pub fn insert_first_wins(dict: &mut Dict, key: String, value: Object) {
    dict.entry(key).or_insert(value);
}
