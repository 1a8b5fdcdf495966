mod json_body;

pub use json_body::{BodyLimit, JsonBody, Payload, parse_json_body};
