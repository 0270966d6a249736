//! Outbound field paths.
//!
//! Popup fields address their payload slot either by a plain key or by the
//! nested-array form `name[index].prop` (e.g. `batches[0].batchId`). The
//! path is parsed once at schema compile time and evaluated structurally
//! afterwards.

use std::str::FromStr;

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::eof,
    token::take_while,
};

#[derive(Debug, thiserror::Error)]
#[error("failed to parse field path {0:?}")]
pub struct ParseError(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPath {
    Scalar(String),
    Indexed {
        array: String,
        index: usize,
        prop: String,
    },
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(key) => write!(f, "{key}"),
            Self::Indexed { array, index, prop } => write!(f, "{array}[{index}].{prop}"),
        }
    }
}

type ParseResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

fn identifier<'a>(input: &mut &'a str) -> ParseResult<&'a str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '-').parse_next(input)
}

fn indexed(input: &mut &str) -> ParseResult<FieldPath> {
    let array = identifier.parse_next(input)?;
    let _: char = '['.parse_next(input)?;
    let index = digit1.parse_next(input)?;
    let _: char = ']'.parse_next(input)?;
    let _: char = '.'.parse_next(input)?;
    let prop = identifier.parse_next(input)?;
    eof.parse_next(input)?;
    let index = index
        .parse::<usize>()
        .map_err(|_| winnow::error::ErrMode::Backtrack(winnow::error::ContextError::new()))?;
    Ok(FieldPath::Indexed {
        array: array.to_owned(),
        index,
        prop: prop.to_owned(),
    })
}

impl FieldPath {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        if input.is_empty() {
            return Err(ParseError(input.to_owned()));
        }
        if input.contains('[') {
            let mut rest = input;
            indexed(&mut rest).map_err(|_| ParseError(input.to_owned()))
        } else {
            Ok(Self::Scalar(input.to_owned()))
        }
    }

    /// Read the addressed value off a row object.
    pub fn read<'v>(&self, row: &'v serde_json::Value) -> Option<&'v serde_json::Value> {
        match self {
            Self::Scalar(key) => row.get(key),
            Self::Indexed { array, index, prop } => {
                row.get(array)?.as_array()?.get(*index)?.get(prop)
            }
        }
    }

    /// Write a value into an outbound payload. Indexed writes grow the
    /// array with null slots up to the index; unpopulated slots are
    /// filtered before submission.
    pub fn write(&self, payload: &mut serde_json::Map<String, serde_json::Value>, value: serde_json::Value) {
        match self {
            Self::Scalar(key) => {
                payload.insert(key.clone(), value);
            }
            Self::Indexed { array, index, prop } => {
                let slot = payload
                    .entry(array.clone())
                    .or_insert_with(|| serde_json::Value::Array(Vec::new()));
                let Some(items) = slot.as_array_mut() else {
                    return;
                };
                while items.len() <= *index {
                    items.push(serde_json::Value::Null);
                }
                if !items[*index].is_object() {
                    items[*index] = serde_json::Value::Object(Default::default());
                }
                if let Some(entry) = items[*index].as_object_mut() {
                    entry.insert(prop.clone(), value);
                }
            }
        }
    }
}

impl FromStr for FieldPath {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
