//! Font registry.
//!
//! Walks the object table for font dictionaries, builds their decoders,
//! and registers each under a synthetic `F<id>` key plus every
//! resource-dict font name that references it. Fonts are immutable after
//! registration and shared via `Arc`; per-page scopes hold handles into
//! this registry.

use crate::config::ExtractOptions;
use crate::fonts::font_dict::FontInfo;
use crate::object::Object;
use crate::resolver::Resolver;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// All fonts known to the document, keyed by synthetic id and resource name.
#[derive(Debug, Default)]
pub struct FontRegistry {
    fonts: IndexMap<String, Arc<FontInfo>>,
}

impl FontRegistry {
    /// Eagerly register every font in the object table.
    ///
    /// Only fonts with at least one populated decoding map are registered;
    /// an empty decoder can never produce text and selecting it would only
    /// mask the ASCII fallback.
    pub fn build(resolver: &Resolver, options: &ExtractOptions) -> Self {
        let mut registry = FontRegistry::default();

        for (id, obj) in resolver.iter() {
            if obj.dict_type() != Some("Font") {
                continue;
            }
            let dict = match obj.as_dict() {
                Some(d) => d,
                None => continue,
            };
            let font = FontInfo::from_dict(dict, resolver, options);
            if font.is_selectable() {
                registry.fonts.insert(synthetic_key(id), Arc::new(font));
            } else {
                log::warn!("font object {} has no decoding signals; skipped", id);
            }
        }

        // Cross-reference resource names: any dict carrying a Font sub-dict
        // (a bare resources dict, or a page with inline /Resources) names
        // fonts this registry already parsed by id
        let mut named: Vec<(String, Arc<FontInfo>)> = Vec::new();
        for (_, obj) in resolver.iter() {
            let dict = match obj.as_dict() {
                Some(d) => d,
                None => continue,
            };
            for font_dict in font_sub_dicts(dict, resolver) {
                for (name, value) in font_dict {
                    if let Some(r) = value.as_reference() {
                        if let Some(font) = registry.fonts.get(&synthetic_key(r.id)) {
                            named.push((name.clone(), Arc::clone(font)));
                        }
                    }
                }
            }
        }
        for (name, font) in named {
            registry.fonts.insert(name, font);
        }

        log::debug!("registered {} font keys", registry.fonts.len());
        registry
    }

    /// Look up a font by registry key (resource name or `F<id>`).
    pub fn get(&self, key: &str) -> Option<Arc<FontInfo>> {
        self.fonts.get(key).cloned()
    }

    /// Fetch the font for an object id, parsing it on first use.
    ///
    /// Covers fonts the eager walk could not see as fonts (for example
    /// synthetic ObjStm entries pointing at dictionaries without a
    /// `/Type /Font` marker).
    pub fn get_or_register(
        &mut self,
        id: u32,
        resolver: &Resolver,
        options: &ExtractOptions,
    ) -> Option<Arc<FontInfo>> {
        let key = synthetic_key(id);
        if let Some(font) = self.fonts.get(&key) {
            return Some(Arc::clone(font));
        }

        let dict = resolver.resolve(id)?.as_dict()?;
        let font = FontInfo::from_dict(dict, resolver, options);
        if !font.is_selectable() {
            return None;
        }
        let font = Arc::new(font);
        self.fonts.insert(key, Arc::clone(&font));
        Some(font)
    }

    /// All registered `(key, font)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<FontInfo>)> {
        self.fonts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// True when no font was registered.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

fn synthetic_key(id: u32) -> String {
    format!("F{}", id)
}

/// The font sub-dictionaries reachable from a table object: a direct
/// `/Font` entry or one nested under `/Resources`.
fn font_sub_dicts<'a>(
    dict: &'a HashMap<String, Object>,
    resolver: &'a Resolver,
) -> Vec<&'a HashMap<String, Object>> {
    let mut out = Vec::new();
    if let Some(fonts) = resolver.dict_get(dict, "Font").and_then(|o| o.as_dict()) {
        out.push(fonts);
    }
    if let Some(resources) = resolver.dict_get(dict, "Resources").and_then(|o| o.as_dict()) {
        if let Some(fonts) = resolver.dict_get(resources, "Font").and_then(|o| o.as_dict()) {
            out.push(fonts);
        }
    }
    out
}
