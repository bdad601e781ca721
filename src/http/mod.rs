//! Minimal HTTP/1.1 over raw TCP
//!
//! The crawler only ever issues `GET` requests with `Host`, `Connection:
//! close` and `User-Agent` headers, and only speaks plain HTTP.

mod client;
mod response;

pub use client::{build_request, HttpClient};
pub use response::{parse_response, HttpResponse};
