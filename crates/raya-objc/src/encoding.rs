//! Type-encoding translation
//!
//! Converts symbolic type lists into the foreign runtime's compact method
//! encoding. The first element is the return type, the rest are parameters;
//! the implicit receiver and selector are inserted after the return type:
//!
//! ```text
//! ["id", "int", "float"]  =>  "@" + "@:" + "i" + "f"  =  "@@:if"
//! ```
//!
//! A raw encoding string passes through trimmed and unchecked.

use rustc_hash::FxHashMap;

use crate::error::{BridgeError, BridgeResult};

/// Symbolic type tags and their encodings
pub const TYPE_TAGS: &[(&str, &str)] = &[
    ("id", "@"),
    ("class", "#"),
    ("BOOL", "c"),
    ("char", "c"),
    ("uchar", "C"),
    ("short", "s"),
    ("ushort", "S"),
    ("int", "i"),
    ("uint", "I"),
    ("long", "l"),
    ("ulong", "L"),
    ("float", "f"),
    ("double", "d"),
    ("bool", "B"),
    ("void", "v"),
    ("selector", ":"),
    ("sel", ":"),
    ("longlong", "q"),
    ("ulonglong", "Q"),
    ("cstr", "*"),
];

/// Receiver and selector encodings every method starts with
pub const RECEIVER_AND_SELECTOR: &str = "@:";

/// Encoding of a tag from the fixed vocabulary
pub fn tag_encoding(tag: &str) -> Option<&'static str> {
    TYPE_TAGS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, code)| *code)
}

/// A boxed value type (struct) carrying its own encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxedType {
    /// Type name, usable as a tag once registered
    pub name: String,
    /// Full aggregate encoding, e.g. `{_NSPoint=ff}`
    pub encoding: String,
}

impl BoxedType {
    /// Create a boxed type
    pub fn new(name: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoding: encoding.into(),
        }
    }
}

/// One element of a type list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    /// Symbolic tag (or registered boxed type name)
    Tag(String),
    /// Boxed type given directly
    Boxed(BoxedType),
}

impl From<&str> for TypeArg {
    fn from(tag: &str) -> Self {
        TypeArg::Tag(tag.to_string())
    }
}

impl From<BoxedType> for TypeArg {
    fn from(boxed: BoxedType) -> Self {
        TypeArg::Boxed(boxed)
    }
}

/// Method types as given by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// Encoding string used as-is
    Raw(String),
    /// Return type followed by parameter types
    List(Vec<TypeArg>),
}

impl TypeSpec {
    /// Build a list spec from tags
    pub fn tags(tags: &[&str]) -> Self {
        TypeSpec::List(tags.iter().map(|t| TypeArg::from(*t)).collect())
    }
}

impl Default for TypeSpec {
    /// `["id"]`: returns an object, takes nothing
    fn default() -> Self {
        TypeSpec::tags(&["id"])
    }
}

impl From<&str> for TypeSpec {
    fn from(raw: &str) -> Self {
        TypeSpec::Raw(raw.to_string())
    }
}

impl From<Vec<TypeArg>> for TypeSpec {
    fn from(list: Vec<TypeArg>) -> Self {
        TypeSpec::List(list)
    }
}

/// Translator from type specs to encodings, aware of boxed types
#[derive(Debug, Clone, Default)]
pub struct TypeEncoder {
    boxed: FxHashMap<String, BoxedType>,
}

impl TypeEncoder {
    /// Create an encoder with no boxed types
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a boxed type usable by name in type lists
    pub fn register_boxed(&mut self, boxed: BoxedType) {
        self.boxed.insert(boxed.name.clone(), boxed);
    }

    /// Look up a registered boxed type
    pub fn boxed(&self, name: &str) -> Option<&BoxedType> {
        self.boxed.get(name)
    }

    /// Translate a spec into an encoding string
    pub fn encode(&self, spec: &TypeSpec) -> BridgeResult<String> {
        let args = match spec {
            TypeSpec::Raw(raw) => return Ok(raw.trim().to_string()),
            TypeSpec::List(args) => args,
        };

        let (ret, params) = args.split_first().ok_or(BridgeError::EmptyTypeList)?;

        let mut encoding = self.encode_arg(ret)?;
        encoding.push_str(RECEIVER_AND_SELECTOR);
        for param in params {
            encoding.push_str(&self.encode_arg(param)?);
        }
        Ok(encoding)
    }

    fn encode_arg(&self, arg: &TypeArg) -> BridgeResult<String> {
        match arg {
            TypeArg::Boxed(boxed) => Ok(boxed.encoding.clone()),
            TypeArg::Tag(tag) => {
                let tag = tag.trim();
                if let Some(code) = tag_encoding(tag) {
                    return Ok(code.to_string());
                }
                if let Some(boxed) = self.boxed.get(tag) {
                    return Ok(boxed.encoding.clone());
                }
                Err(BridgeError::InvalidType {
                    got: tag.to_string(),
                    expected: TYPE_TAGS
                        .iter()
                        .map(|(name, _)| *name)
                        .collect::<Vec<_>>()
                        .join(", "),
                })
            }
        }
    }
}

/// Check whether an encoding describes a method without parameters.
///
/// A leading aggregate return type (`{...}`) is skipped with a balanced
/// brace scan; what remains must be exactly the receiver and selector.
pub fn takes_no_arguments(encoding: &str) -> BridgeResult<bool> {
    if !encoding.starts_with('{') {
        return Ok(match encoding.find(RECEIVER_AND_SELECTOR) {
            Some(i) => i + RECEIVER_AND_SELECTOR.len() == encoding.len(),
            None => false,
        });
    }

    let mut depth = 0usize;
    for (i, c) in encoding.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&encoding[i + 1..] == RECEIVER_AND_SELECTOR);
                }
            }
            _ => {}
        }
    }

    Err(BridgeError::IllegalTypeEncoding(encoding.to_string()))
}
