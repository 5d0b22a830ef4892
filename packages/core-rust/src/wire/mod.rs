//! Request and response codecs for the two transports.

pub mod json;
pub mod soap;
