//! Last.fm request signing.
//!
//! `api_sig` is the MD5 of every parameter as `key + value`, sorted by key,
//! followed by the shared secret. `format` and `callback` are never signed.

use std::collections::BTreeMap;

/// Form parameters of one API call, kept sorted by name
pub type Params = BTreeMap<&'static str, String>;

const UNSIGNED: [&str; 3] = ["format", "callback", "api_sig"];

pub fn sign(params: &Params, api_secret: &str) -> String {
    let mut base = String::new();
    for (key, value) in params.iter().filter(|(k, _)| !UNSIGNED.contains(*k)) {
        base.push_str(key);
        base.push_str(value);
    }
    base.push_str(api_secret);
    format!("{:x}", md5::compute(base.as_bytes()))
}
