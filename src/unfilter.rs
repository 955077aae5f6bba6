//! Stream unfiltering pass.
//!
//! The extraction core expects stream payloads in the clear. This module
//! provides the pure `unfilter(objects) -> objects` pass that inflates
//! FlateDecode streams (the dominant PDF compression filter) in place.
//! Streams with other filters, or bodies that fail to inflate, pass
//! through untouched and degrade downstream.

use crate::object::Object;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// Decompress a FlateDecode (zlib) stream body.
///
/// Falls back to raw deflate for bodies with corrupt zlib headers, and to
/// partial output when the tail of the data is damaged.
pub fn flate_decode(input: &[u8]) -> Option<Vec<u8>> {
    let mut output = Vec::new();
    match ZlibDecoder::new(input).read_to_end(&mut output) {
        Ok(_) => return Some(output),
        Err(e) => {
            if !output.is_empty() {
                log::warn!("FlateDecode partial recovery: {} bytes before corruption: {}", output.len(), e);
                return Some(output);
            }
        },
    }

    // Some producers emit raw deflate without the zlib wrapper
    output.clear();
    match DeflateDecoder::new(input).read_to_end(&mut output) {
        Ok(_) if !output.is_empty() => Some(output),
        Err(_) if !output.is_empty() => Some(output),
        _ => None,
    }
}

/// Filter entry names, normalized from a Name or an Array of Names.
fn filter_names(filter_obj: &Object) -> Vec<String> {
    match filter_obj {
        Object::Name(name) => vec![name.clone()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| obj.as_name().map(|s| s.to_string()))
            .collect(),
        _ => vec![],
    }
}

/// Apply the unfilter pass to a batch of lexed objects.
///
/// Walks every value (including nested `Indirect` envelopes, arrays, and
/// dictionary members) and replaces stream payloads whose filter chain is
/// exactly FlateDecode with the inflated bytes, stripping the `Filter`
/// entry on success. Everything else is returned unchanged.
pub fn unfilter(objects: Vec<Object>) -> Vec<Object> {
    objects.into_iter().map(unfilter_object).collect()
}

fn unfilter_object(object: Object) -> Object {
    match object {
        Object::Array(items) => Object::Array(items.into_iter().map(unfilter_object).collect()),
        Object::Dictionary(dict) => Object::Dictionary(
            dict.into_iter()
                .map(|(k, v)| (k, unfilter_object(v)))
                .collect(),
        ),
        Object::Indirect { id, gen, object } => Object::Indirect {
            id,
            gen,
            object: Box::new(unfilter_object(*object)),
        },
        Object::Stream { mut dict, data } => {
            let filters = dict.get("Filter").map(filter_names).unwrap_or_default();
            let is_flate_only =
                filters.len() == 1 && matches!(filters[0].as_str(), "FlateDecode" | "Fl");

            if is_flate_only {
                if let Some(decoded) = flate_decode(&data) {
                    dict.remove("Filter");
                    dict.remove("DecodeParms");
                    dict.insert("Length".to_string(), Object::Number(decoded.len() as f64));
                    return Object::Stream {
                        dict: dict.into_iter().map(|(k, v)| (k, unfilter_object(v))).collect(),
                        data: bytes::Bytes::from(decoded),
                    };
                }
                log::warn!("FlateDecode failed; leaving stream compressed");
            }

            Object::Stream {
                dict: dict.into_iter().map(|(k, v)| (k, unfilter_object(v))).collect(),
                data,
            }
        },
        other => other,
    }
}
