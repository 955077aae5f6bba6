//! Object graph resolution.
//!
//! Builds the flat id-indexed object table from the lexed value stream,
//! follows indirect references, and mines object streams (PDF 1.5+
//! `/Type /ObjStm`) for the page and font objects they hide.
//!
//! The table registers nested `Indirect` envelopes via a depth-first walk
//! that never follows `Reference` edges, so construction terminates without
//! cycle detection. After building, every reference encountered during
//! extraction resolves with one lookup; dangling references degrade to
//! missing fields and never abort extraction.

use crate::object::Object;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

lazy_static! {
    static ref CONTENTS_RE: Regex = Regex::new(r"/Contents\s+(\d+)\s+\d+\s+R").unwrap();
    static ref TOUNICODE_RE: Regex = Regex::new(r"/ToUnicode\s+(\d+)\s+\d+\s+R").unwrap();
}

/// Flat id-indexed view of the document's object graph.
///
/// Iteration follows object-id order (the table is a `BTreeMap`), which is
/// what makes page enumeration deterministic.
#[derive(Debug, Default)]
pub struct Resolver {
    objects: BTreeMap<u32, Object>,
}

impl Resolver {
    /// Build the object table from lexed top-level values.
    ///
    /// Top-level `Indirect` envelopes are flattened; nested envelopes found
    /// inside arrays, dictionaries, and stream dictionaries are registered
    /// too. Later registrations of the same id win (incremental updates
    /// append replacement objects).
    pub fn from_objects(objects: Vec<Object>) -> Self {
        let mut table = BTreeMap::new();

        for obj in objects {
            match obj {
                Object::Indirect { id, object, .. } => {
                    register_nested(&object, &mut table);
                    table.insert(id, *object);
                },
                other => register_nested(&other, &mut table),
            }
        }

        log::debug!("object table holds {} objects", table.len());
        Self { objects: table }
    }

    /// Look up the body of an indirect object.
    pub fn resolve(&self, id: u32) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Collapse at most one `Reference` level (and unwrap stray `Indirect`
    /// envelopes). Returns `None` for dangling references.
    pub fn resolve_if_ref<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(r) => self.objects.get(&r.id),
            Object::Indirect { object, .. } => Some(object),
            other => Some(other),
        }
    }

    /// Resolve a dictionary entry through an optional reference.
    pub fn dict_get<'a>(
        &'a self,
        dict: &'a HashMap<String, Object>,
        key: &str,
    ) -> Option<&'a Object> {
        self.resolve_if_ref(dict.get(key)?)
    }

    /// All `(id, dict)` pairs whose `/Type` is `Page`, in id order.
    pub fn pages(&self) -> impl Iterator<Item = (u32, &HashMap<String, Object>)> {
        self.objects.iter().filter_map(|(id, obj)| {
            let dict = obj.as_dict()?;
            if dict.get("Type")?.as_name()? == "Page" {
                Some((*id, dict))
            } else {
                None
            }
        })
    }

    /// All `(id, object)` entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Object)> {
        self.objects.iter().map(|(id, obj)| (*id, obj))
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the table is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Mine object streams for pages and fonts.
    ///
    /// PDF 1.5+ files may keep page and font dictionaries inside
    /// `/Type /ObjStm` streams. Rather than re-lexing every embedded body,
    /// this pass reads the ASCII id/offset header and scans each body for
    /// `/Type /Page` and `/Type /Font` markers, registering minimal
    /// synthetic dictionaries that point at the `Contents`/`ToUnicode`
    /// streams the coordinator needs. Deliberately narrow; see DESIGN.md.
    pub fn expand_object_streams(&mut self) {
        let mut synthesized: Vec<(u32, Object)> = Vec::new();

        for obj in self.objects.values() {
            let (dict, data) = match obj.as_stream() {
                Some(parts) => parts,
                None => continue,
            };
            if dict.get("Type").and_then(|o| o.as_name()) != Some("ObjStm") {
                continue;
            }

            let n = dict.get("N").and_then(|o| o.as_int()).unwrap_or(0).max(0) as usize;
            let first = dict
                .get("First")
                .and_then(|o| o.as_int())
                .unwrap_or(0)
                .max(0) as usize;
            if n == 0 || first == 0 || first > data.len() {
                log::warn!("skipping malformed ObjStm (N={}, First={})", n, first);
                continue;
            }

            // Header: N pairs of ASCII integers `<objId> <offset>`
            let header = String::from_utf8_lossy(&data[..first]);
            let numbers: Vec<usize> = header
                .split_whitespace()
                .filter_map(|tok| tok.parse().ok())
                .collect();
            let pairs: Vec<(u32, usize)> = numbers
                .chunks(2)
                .take(n)
                .filter(|c| c.len() == 2)
                .map(|c| (c[0] as u32, c[1]))
                .collect();

            let bodies = &data[first..];
            for (i, &(obj_id, offset)) in pairs.iter().enumerate() {
                if offset >= bodies.len() {
                    log::warn!("ObjStm object {} offset {} beyond data", obj_id, offset);
                    continue;
                }
                let end = pairs
                    .get(i + 1)
                    .map(|&(_, next)| next.clamp(offset, bodies.len()))
                    .unwrap_or(bodies.len());
                let body = String::from_utf8_lossy(&bodies[offset..end]);

                if body.contains("/Type /Page") || body.contains("/Type/Page") {
                    let mut page = HashMap::new();
                    page.insert("Type".to_string(), Object::Name("Page".to_string()));
                    if let Some(caps) = CONTENTS_RE.captures(&body) {
                        if let Ok(contents_id) = caps[1].parse::<u32>() {
                            page.insert(
                                "Contents".to_string(),
                                Object::Reference(crate::object::ObjectRef::new(contents_id, 0)),
                            );
                        }
                    }
                    log::debug!("ObjStm: synthesized page object {}", obj_id);
                    synthesized.push((obj_id, Object::Dictionary(page)));
                } else if body.contains("/Type /Font") || body.contains("/Type/Font") {
                    if let Some(caps) = TOUNICODE_RE.captures(&body) {
                        if let Ok(tounicode_id) = caps[1].parse::<u32>() {
                            let mut font = HashMap::new();
                            font.insert("Type".to_string(), Object::Name("Font".to_string()));
                            font.insert(
                                "ToUnicode".to_string(),
                                Object::Reference(crate::object::ObjectRef::new(tounicode_id, 0)),
                            );
                            log::debug!("ObjStm: synthesized font object {}", obj_id);
                            synthesized.push((obj_id, Object::Dictionary(font)));
                        }
                    }
                }
            }
        }

        for (id, obj) in synthesized {
            self.objects.entry(id).or_insert(obj);
        }
    }
}

/// Depth-first registration of nested `Indirect` envelopes.
///
/// Follows only ownership edges (arrays, dictionaries, stream dicts),
/// never `Reference` edges.
fn register_nested(obj: &Object, table: &mut BTreeMap<u32, Object>) {
    match obj {
        Object::Array(items) => {
            for item in items {
                register_nested(item, table);
            }
        },
        Object::Dictionary(dict) => {
            for value in dict.values() {
                register_nested(value, table);
            }
        },
        Object::Stream { dict, .. } => {
            for value in dict.values() {
                register_nested(value, table);
            }
        },
        Object::Indirect { id, object, .. } => {
            register_nested(object, table);
            table.insert(*id, (**object).clone());
        },
        _ => {},
    }
}
