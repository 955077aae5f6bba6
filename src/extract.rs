//! Extraction coordinator.
//!
//! Drives the whole pipeline: unfilter → object table → ObjStm expansion →
//! font registration → page traversal → output assembly. When no page
//! yields text (broken page tree, exotic structure), a fallback sweep
//! tokenizes every stream that looks like it carries text operators.
//!
//! The contract is best-effort: extraction always returns a string,
//! possibly empty, and never an error.

use crate::config::ExtractOptions;
use crate::content::{tokenize, FontScope};
use crate::fonts::{FontInfo, FontRegistry};
use crate::object::Object;
use crate::parser::parse_document;
use crate::resolver::Resolver;
use crate::unfilter::unfilter;
use std::collections::HashMap;
use std::sync::Arc;

/// Page texts are joined with a blank line regardless of the configured
/// soft divider.
const PAGE_SEPARATOR: &str = "\n\n";

/// Extract text from lexed objects with default options.
pub fn extract_text(objects: Vec<Object>) -> String {
    TextExtractor::new().extract(objects)
}

/// Extract text straight from raw PDF bytes with default options.
pub fn extract_text_from_bytes(data: &[u8]) -> String {
    TextExtractor::new().extract(parse_document(data))
}

/// One-shot text extractor.
///
/// Each extraction owns its mutable state exclusively (object table, font
/// registry); run concurrent extractions on independent instances.
#[derive(Debug, Default)]
pub struct TextExtractor {
    options: ExtractOptions,
}

impl TextExtractor {
    /// Extractor with default options.
    pub fn new() -> Self {
        Self {
            options: ExtractOptions::default(),
        }
    }

    /// Extractor with explicit options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Run the pipeline over lexed top-level objects.
    pub fn extract(&self, objects: Vec<Object>) -> String {
        let objects = unfilter(objects);
        let mut resolver = Resolver::from_objects(objects);
        resolver.expand_object_streams();
        let mut registry = FontRegistry::build(&resolver, &self.options);

        if self.options.debug {
            log::debug!(
                "extraction: {} objects, {} font keys",
                resolver.len(),
                registry.len()
            );
        }

        let mut out = String::new();
        let page_ids: Vec<u32> = resolver.pages().map(|(id, _)| id).collect();
        for page_id in page_ids {
            let page_text = self.extract_page(page_id, &resolver, &mut registry);
            if !page_text.is_empty() {
                out.push_str(&page_text);
                out.push_str(PAGE_SEPARATOR);
            }
        }

        if out.is_empty() {
            log::debug!("no page text; trying fallback stream sweep");
            out = self.fallback_sweep(&resolver, &registry);
        }

        out
    }

    /// Run the pipeline straight from raw PDF bytes.
    pub fn extract_from_bytes(&self, data: &[u8]) -> String {
        self.extract(parse_document(data))
    }

    fn extract_page(
        &self,
        page_id: u32,
        resolver: &Resolver,
        registry: &mut FontRegistry,
    ) -> String {
        let page_dict = match resolver.resolve(page_id).and_then(|o| o.as_dict()) {
            Some(d) => d,
            None => return String::new(),
        };

        let page_fonts = self.page_font_scope(page_dict, resolver, registry);
        let streams = self.content_streams(page_dict, resolver);
        if streams.is_empty() {
            log::debug!("page {} has no content streams", page_id);
            return String::new();
        }

        let scope = FontScope::new(page_fonts, registry);
        let mut page_text = String::new();
        for data in &streams {
            page_text.push_str(&tokenize(data, &scope, &self.options));
        }
        page_text
    }

    /// Resolve `Resources.Font` into a name → decoder scope.
    ///
    /// Resources are taken from the page dictionary alone; resources
    /// inherited from a `/Pages` parent node are not traversed.
    fn page_font_scope(
        &self,
        page_dict: &HashMap<String, Object>,
        resolver: &Resolver,
        registry: &mut FontRegistry,
    ) -> HashMap<String, Arc<FontInfo>> {
        let mut fonts = HashMap::new();

        let font_dict = resolver
            .dict_get(page_dict, "Resources")
            .and_then(|o| o.as_dict())
            .and_then(|resources| resolver.dict_get(resources, "Font"))
            .and_then(|o| o.as_dict());
        let font_dict = match font_dict {
            Some(d) => d,
            None => return fonts,
        };

        for (name, value) in font_dict {
            let font = match value.as_reference() {
                Some(r) => registry.get_or_register(r.id, resolver, &self.options),
                None => value.as_dict().and_then(|d| {
                    // Inline font dictionary, parsed on the spot
                    let font = FontInfo::from_dict(d, resolver, &self.options);
                    font.is_selectable().then(|| Arc::new(font))
                }),
            };
            if let Some(font) = font {
                fonts.insert(name.clone(), font);
            }
        }

        fonts
    }

    /// Resolve `Contents` into the page's stream buffers (single stream or
    /// array of streams, each possibly behind a reference).
    fn content_streams(
        &self,
        page_dict: &HashMap<String, Object>,
        resolver: &Resolver,
    ) -> Vec<bytes::Bytes> {
        let mut streams = Vec::new();

        match resolver.dict_get(page_dict, "Contents") {
            Some(Object::Stream { data, .. }) => streams.push(data.clone()),
            Some(Object::Array(items)) => {
                for item in items {
                    match resolver.resolve_if_ref(item) {
                        Some(Object::Stream { data, .. }) => streams.push(data.clone()),
                        _ => log::debug!("unresolvable content stream entry"),
                    }
                }
            },
            _ => {},
        }

        streams
    }

    /// Tokenize every stream that plausibly carries text operators,
    /// skipping structural, image, and font-program streams.
    fn fallback_sweep(&self, resolver: &Resolver, registry: &FontRegistry) -> String {
        let scope = FontScope::global(registry);
        let mut parts = Vec::new();

        for (id, obj) in resolver.iter() {
            let (dict, data) = match obj.as_stream() {
                Some(stream) => stream,
                None => continue,
            };

            let type_name = dict.get("Type").and_then(|o| o.as_name()).unwrap_or("");
            if matches!(type_name, "XRef" | "ObjStm" | "XObject" | "Font" | "Metadata") {
                continue;
            }
            let subtype = dict.get("Subtype").and_then(|o| o.as_name()).unwrap_or("");
            if matches!(
                subtype,
                "Image" | "Type1" | "TrueType" | "CIDFontType2" | "OpenType"
            ) {
                continue;
            }

            if !has_text_signature(data) {
                continue;
            }

            let text = tokenize(data, &scope, &self.options);
            if !text.is_empty() {
                log::debug!("fallback sweep recovered text from stream {}", id);
                parts.push(text);
            }
        }

        parts.join(&self.options.divider)
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// A stream looks textual when it holds a `BT`...`ET` pair or any `Tj`/`TJ`
/// operator.
fn has_text_signature(data: &[u8]) -> bool {
    if let Some(bt) = find_subslice(data, b"BT") {
        if find_subslice(&data[bt..], b"ET").is_some() {
            return true;
        }
    }
    find_subslice(data, b"Tj").is_some() || find_subslice(data, b"TJ").is_some()
}
