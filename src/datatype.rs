// used for date and time literals
use chrono::{NaiveDate, NaiveDateTime};
// used for decimal numbers
use bigdecimal::BigDecimal;

use lazy_static::lazy_static;

// used when parsing a lexical form
use std::str::FromStr;

use crate::locator::Locator;

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
pub const XSD_INT: &str = "http://www.w3.org/2001/XMLSchema#int";
pub const XSD_LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
pub const XSD_FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
pub const XSD_DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

/// Subject identifier of the default name type.
pub const TOPIC_NAME: &str = "http://psi.topicmaps.org/iso13250/model/topic-name";
pub const TYPE_INSTANCE: &str = "http://psi.topicmaps.org/iso13250/model/type-instance";
pub const TYPE: &str = "http://psi.topicmaps.org/iso13250/model/type";
pub const INSTANCE: &str = "http://psi.topicmaps.org/iso13250/model/instance";

lazy_static! {
    pub static ref XSD_STRING_LOCATOR: Locator = Locator::trusted(XSD_STRING);
    pub static ref XSD_ANY_URI_LOCATOR: Locator = Locator::trusted(XSD_ANY_URI);
    pub static ref TOPIC_NAME_LOCATOR: Locator = Locator::trusted(TOPIC_NAME);
    pub static ref TYPE_INSTANCE_LOCATOR: Locator = Locator::trusted(TYPE_INSTANCE);
    pub static ref TYPE_LOCATOR: Locator = Locator::trusted(TYPE);
    pub static ref INSTANCE_LOCATOR: Locator = Locator::trusted(INSTANCE);
}

/// A value that can be stored in an occurrence or a variant.
///
/// Values are kept in their lexical form together with the datatype
/// identified by `DATATYPE`; `parse` recovers the value from that form.
pub trait Literal: Sized {
    const DATATYPE: &'static str;
    fn lexical(&self) -> String;
    fn parse(lexical: &str) -> Option<Self>;
    fn datatype(&self) -> Locator {
        Locator::trusted(Self::DATATYPE)
    }
}

// ------------- Literals --------------
impl Literal for String {
    const DATATYPE: &'static str = XSD_STRING;
    fn lexical(&self) -> String {
        self.clone()
    }
    fn parse(lexical: &str) -> Option<String> {
        Some(lexical.to_string())
    }
}
impl Literal for Locator {
    const DATATYPE: &'static str = XSD_ANY_URI;
    fn lexical(&self) -> String {
        self.reference().to_string()
    }
    fn parse(lexical: &str) -> Option<Locator> {
        Locator::new(lexical).ok()
    }
}
impl Literal for i32 {
    const DATATYPE: &'static str = XSD_INT;
    fn lexical(&self) -> String {
        self.to_string()
    }
    fn parse(lexical: &str) -> Option<i32> {
        i32::from_str(lexical.trim()).ok()
    }
}
impl Literal for i64 {
    const DATATYPE: &'static str = XSD_LONG;
    fn lexical(&self) -> String {
        self.to_string()
    }
    fn parse(lexical: &str) -> Option<i64> {
        i64::from_str(lexical.trim()).ok()
    }
}
impl Literal for f32 {
    const DATATYPE: &'static str = XSD_FLOAT;
    fn lexical(&self) -> String {
        self.to_string()
    }
    fn parse(lexical: &str) -> Option<f32> {
        f32::from_str(lexical.trim()).ok()
    }
}
impl Literal for f64 {
    const DATATYPE: &'static str = XSD_DOUBLE;
    fn lexical(&self) -> String {
        self.to_string()
    }
    fn parse(lexical: &str) -> Option<f64> {
        f64::from_str(lexical.trim()).ok()
    }
}
impl Literal for bool {
    const DATATYPE: &'static str = XSD_BOOLEAN;
    fn lexical(&self) -> String {
        self.to_string()
    }
    fn parse(lexical: &str) -> Option<bool> {
        // xsd:boolean also admits the numeric forms
        match lexical.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        }
    }
}
impl Literal for BigDecimal {
    const DATATYPE: &'static str = XSD_DECIMAL;
    fn lexical(&self) -> String {
        self.to_string()
    }
    fn parse(lexical: &str) -> Option<BigDecimal> {
        BigDecimal::from_str(lexical.trim()).ok()
    }
}
impl Literal for NaiveDate {
    const DATATYPE: &'static str = XSD_DATE;
    fn lexical(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
    fn parse(lexical: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(lexical.trim(), "%Y-%m-%d").ok()
    }
}
impl Literal for NaiveDateTime {
    const DATATYPE: &'static str = XSD_DATE_TIME;
    fn lexical(&self) -> String {
        self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }
    fn parse(lexical: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(lexical.trim(), "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}
