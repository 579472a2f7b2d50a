//! A DNS message codec and stub resolver.
//!
//! Messages are decoded leniently: a truncated or corrupt message still
//! produces a [`Response`], with missing bytes read as zero. The
//! [`clients::Resolver`] sends queries over UDP or TCP, retrying across its
//! servers, and caches successful answers until their TTLs run out.
//!
//! # Example
//!
//! ```rust
//! use stubdns::{Class, Question, Request, Response, Type};
//!
//! let mut request = Request::new();
//! request.header.set_rd(true);
//! request.add_question(Question::new("bramp.net", Type::A, Class::IN));
//!
//! let buf = request.to_vec().unwrap();
//! let parsed = Response::from_slice("127.0.0.1:53".parse().unwrap(), &buf);
//! assert_eq!(parsed.questions, request.questions);
//! ```

#[macro_use]
extern crate lazy_static;

pub mod clients;
mod display;
mod dns;
mod errors;
mod from_str;
pub mod header;
pub mod io;
pub mod resource;
pub mod types;

pub use crate::dns::{Request, Response};
pub use crate::errors::{Error, Result};
pub use crate::from_str::FromStrError;
pub use crate::header::Header;
pub use crate::resource::*;
pub use crate::types::*;
