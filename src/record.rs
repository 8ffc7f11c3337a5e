//! Top-level shape check for basket payloads.
//!
//! Basket bodies must be records: a struct with named fields, possibly behind
//! newtype wrappers or `Some`, and including structs with flattened fields. The check drives the value's `Serialize` impl
//! with a serializer that stops at the first call and reports which shape
//! serde was asked to produce, so no bytes are encoded and no request is made
//! for a payload that would be rejected.

use crate::error::PantryError;
use serde::ser::{self, Impossible, Serialize, Serializer};
use std::fmt;

/// Returns `Ok(())` if `value` serializes as a struct with named fields.
pub fn ensure_record<T: Serialize + ?Sized>(value: &T) -> crate::error::Result<()> {
    match value.serialize(ShapeProbe) {
        Err(Stop::Shape("struct")) => Ok(()),
        Err(Stop::Shape(found)) => Err(PantryError::TypeMismatch { found }),
        Err(Stop::Custom(_)) | Ok(()) => Err(PantryError::TypeMismatch { found: "unknown" }),
    }
}

#[derive(Debug)]
enum Stop {
    Shape(&'static str),
    Custom(String),
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stop::Shape(s) => write!(f, "top-level shape is {}", s),
            Stop::Custom(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Stop {}

impl ser::Error for Stop {
    fn custom<M: fmt::Display>(msg: M) -> Self {
        Stop::Custom(msg.to_string())
    }
}

struct ShapeProbe;

type Never = Impossible<(), Stop>;

impl Serializer for ShapeProbe {
    type Ok = ();
    type Error = Stop;
    type SerializeSeq = Never;
    type SerializeTuple = Never;
    type SerializeTupleStruct = Never;
    type SerializeTupleVariant = Never;
    type SerializeMap = Never;
    type SerializeStruct = Never;
    type SerializeStructVariant = Never;

    fn serialize_bool(self, _: bool) -> Result<(), Stop> {
        Err(Stop::Shape("bool"))
    }
    fn serialize_i8(self, _: i8) -> Result<(), Stop> {
        Err(Stop::Shape("int"))
    }
    fn serialize_i16(self, _: i16) -> Result<(), Stop> {
        Err(Stop::Shape("int"))
    }
    fn serialize_i32(self, _: i32) -> Result<(), Stop> {
        Err(Stop::Shape("int"))
    }
    fn serialize_i64(self, _: i64) -> Result<(), Stop> {
        Err(Stop::Shape("int"))
    }
    fn serialize_u8(self, _: u8) -> Result<(), Stop> {
        Err(Stop::Shape("uint"))
    }
    fn serialize_u16(self, _: u16) -> Result<(), Stop> {
        Err(Stop::Shape("uint"))
    }
    fn serialize_u32(self, _: u32) -> Result<(), Stop> {
        Err(Stop::Shape("uint"))
    }
    fn serialize_u64(self, _: u64) -> Result<(), Stop> {
        Err(Stop::Shape("uint"))
    }
    fn serialize_f32(self, _: f32) -> Result<(), Stop> {
        Err(Stop::Shape("float"))
    }
    fn serialize_f64(self, _: f64) -> Result<(), Stop> {
        Err(Stop::Shape("float"))
    }
    fn serialize_char(self, _: char) -> Result<(), Stop> {
        Err(Stop::Shape("char"))
    }
    fn serialize_str(self, _: &str) -> Result<(), Stop> {
        Err(Stop::Shape("string"))
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), Stop> {
        Err(Stop::Shape("bytes"))
    }
    fn serialize_none(self) -> Result<(), Stop> {
        Err(Stop::Shape("none"))
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), Stop> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<(), Stop> {
        Err(Stop::Shape("unit"))
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), Stop> {
        Err(Stop::Shape("unit struct"))
    }
    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Result<(), Stop> {
        Err(Stop::Shape("enum"))
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Stop> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> Result<(), Stop> {
        Err(Stop::Shape("enum"))
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Never, Stop> {
        Err(Stop::Shape("slice"))
    }
    fn serialize_tuple(self, _: usize) -> Result<Never, Stop> {
        Err(Stop::Shape("tuple"))
    }
    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Never, Stop> {
        Err(Stop::Shape("tuple struct"))
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Never, Stop> {
        Err(Stop::Shape("enum"))
    }
    // Structs with `#[serde(flatten)]` fields serialize as a map of unknown
    // length; real maps report theirs.
    fn serialize_map(self, len: Option<usize>) -> Result<Never, Stop> {
        match len {
            None => Err(Stop::Shape("struct")),
            Some(_) => Err(Stop::Shape("map")),
        }
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Never, Stop> {
        Err(Stop::Shape("struct"))
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Never, Stop> {
        Err(Stop::Shape("enum"))
    }
}
