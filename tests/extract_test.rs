//! End-to-end extraction tests over synthetic object graphs.

use pdftext::object::{Object, ObjectRef};
use pdftext::{extract_text, extract_text_from_bytes, ExtractOptions, TextExtractor};
use std::collections::HashMap;

fn indirect(id: u32, object: Object) -> Object {
    Object::Indirect {
        id,
        gen: 0,
        object: Box::new(object),
    }
}

fn stream(dict: Vec<(&str, Object)>, data: &[u8]) -> Object {
    let mut d: HashMap<String, Object> = dict
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    d.insert("Length".to_string(), Object::Number(data.len() as f64));
    Object::Stream {
        dict: d,
        data: bytes::Bytes::from(data.to_vec()),
    }
}

fn name(n: &str) -> Object {
    Object::Name(n.to_string())
}

fn reference(id: u32) -> Object {
    Object::Reference(ObjectRef::new(id, 0))
}

/// A page whose resources bind /F1 to the given font object id.
fn page(contents_id: u32, font_id: u32) -> Object {
    let mut font_names = HashMap::new();
    font_names.insert("F1".to_string(), reference(font_id));
    let mut resources = HashMap::new();
    resources.insert("Font".to_string(), Object::Dictionary(font_names));

    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), name("Page"));
    dict.insert("Contents".to_string(), reference(contents_id));
    dict.insert("Resources".to_string(), Object::Dictionary(resources));
    Object::Dictionary(dict)
}

fn winansi_font() -> Object {
    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), name("Font"));
    dict.insert("BaseFont".to_string(), name("Helvetica"));
    dict.insert("Encoding".to_string(), name("WinAnsiEncoding"));
    Object::Dictionary(dict)
}

fn tounicode_font(cmap: &[u8], cmap_id: u32) -> (Object, Object) {
    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), name("Font"));
    dict.insert("BaseFont".to_string(), name("Custom"));
    dict.insert("ToUnicode".to_string(), reference(cmap_id));
    (Object::Dictionary(dict), stream(vec![], cmap))
}

fn forbidden_controls(text: &str) -> Vec<char> {
    text.chars()
        .filter(|&c| {
            let v = c as u32;
            v < 9 || v == 11 || (14..32).contains(&v)
        })
        .collect()
}

#[test]
fn s1_trivial_tj() {
    let docs = vec![
        indirect(1, page(2, 3)),
        indirect(2, stream(vec![], b"BT /F1 12 Tf (Hello) Tj ET")),
        indirect(3, winansi_font()),
    ];
    let text = extract_text(docs);
    assert!(text.contains("Hello"), "got {:?}", text);
}

#[test]
fn s2_tj_spacing() {
    let docs = |adjust: &str| {
        vec![
            indirect(1, page(2, 3)),
            indirect(
                2,
                stream(
                    vec![],
                    format!("BT /F1 12 Tf [ (Hello) {} (World) ] TJ ET", adjust).as_bytes(),
                ),
            ),
            indirect(3, winansi_font()),
        ]
    };

    assert!(extract_text(docs("-200")).contains("Hello World"));
    assert!(extract_text(docs("-50")).contains("HelloWorld"));
}

#[test]
fn s3_hex_with_tounicode() {
    let (font, cmap) = tounicode_font(b"beginbfchar\n<0041> <00E9>\nendbfchar", 4);
    let docs = vec![
        indirect(1, page(2, 3)),
        indirect(2, stream(vec![], b"BT /F1 12 Tf <0041> Tj ET")),
        indirect(3, font),
        indirect(4, cmap),
    ];
    let text = extract_text(docs);
    assert!(text.contains('\u{e9}'), "got {:?}", text);
}

#[test]
fn s4_bfrange_scalar_through_font() {
    let (font, cmap) = tounicode_font(b"beginbfrange <20> <22> <0041> endbfrange", 4);
    let docs = vec![
        indirect(1, page(2, 3)),
        // Single-byte codes 0x20 0x21 0x22 via a hex string
        indirect(2, stream(vec![], b"BT /F1 12 Tf <202122> Tj ET")),
        indirect(3, font),
        indirect(4, cmap),
    ];
    let text = extract_text(docs);
    assert!(text.contains("ABC"), "got {:?}", text);
}

#[test]
fn s5_escape_sequences() {
    let docs = vec![
        indirect(1, page(2, 3)),
        indirect(2, stream(vec![], b"BT /F1 12 Tf (Line1\\nLine2\\101) Tj ET")),
        indirect(3, winansi_font()),
    ];
    let text = extract_text(docs);
    assert!(text.contains("Line1\nLine2A"), "got {:?}", text);
}

#[test]
fn pages_joined_in_id_order() {
    let docs = vec![
        // Declared out of order on purpose
        indirect(11, page(12, 3)),
        indirect(12, stream(vec![], b"BT /F1 9 Tf (second) Tj ET")),
        indirect(1, page(2, 3)),
        indirect(2, stream(vec![], b"BT /F1 9 Tf (first) Tj ET")),
        indirect(3, winansi_font()),
    ];
    let text = extract_text(docs);
    let first = text.find("first").unwrap();
    let second = text.find("second").unwrap();
    assert!(first < second);
    assert!(text.contains("first\n\nsecond"), "got {:?}", text);
}

#[test]
fn contents_array_concatenated() {
    let mut dict = HashMap::new();
    dict.insert("Type".to_string(), name("Page"));
    dict.insert(
        "Contents".to_string(),
        Object::Array(vec![reference(2), reference(5)]),
    );
    let docs = vec![
        indirect(1, Object::Dictionary(dict)),
        indirect(2, stream(vec![], b"BT (part one ) Tj ET")),
        indirect(5, stream(vec![], b"BT (part two) Tj ET")),
    ];
    let text = extract_text(docs);
    assert!(text.contains("part one part two"), "got {:?}", text);
}

#[test]
fn dangling_references_degrade() {
    let docs = vec![indirect(1, page(99, 98))];
    assert_eq!(extract_text(docs), "");
}

#[test]
fn fallback_sweep_without_pages() {
    let docs = vec![
        indirect(7, stream(vec![], b"BT (orphaned text) Tj ET")),
        // An image stream must not be swept even with stray operator bytes
        indirect(
            8,
            stream(
                vec![("Subtype", name("Image"))],
                b"BT binary ET Tj \xFF\xFE\x00",
            ),
        ),
    ];
    let text = extract_text(docs);
    assert!(text.contains("orphaned text"), "got {:?}", text);
    assert!(!text.contains("binary"));
}

#[test]
fn fallback_joins_with_divider() {
    let docs = vec![
        indirect(7, stream(vec![], b"BT (alpha) Tj ET")),
        indirect(9, stream(vec![], b"BT (beta) Tj ET")),
    ];
    let extractor = TextExtractor::with_options(ExtractOptions::default().with_divider(" | "));
    let text = extractor.extract(docs);
    assert_eq!(text, "alpha | beta");
}

#[test]
fn objstm_page_recovered() {
    // The object stream hides page 10; its contents live in object 12
    let bodies = b"<< /Type /Page /Contents 12 0 R >>";
    let header = b"10 0 ";
    let mut data = Vec::new();
    data.extend_from_slice(header);
    data.extend_from_slice(bodies);

    let docs = vec![
        indirect(
            1,
            stream(
                vec![
                    ("Type", name("ObjStm")),
                    ("N", Object::Number(1.0)),
                    ("First", Object::Number(header.len() as f64)),
                ],
                &data,
            ),
        ),
        indirect(12, stream(vec![], b"BT (hidden page text) Tj ET")),
    ];
    let text = extract_text(docs);
    assert!(text.contains("hidden page text"), "got {:?}", text);
}

#[test]
fn extraction_is_deterministic() {
    let docs = || {
        vec![
            indirect(1, page(2, 3)),
            indirect(2, stream(vec![], b"BT /F1 12 Tf (Stable output) Tj T* (again) Tj ET")),
            indirect(3, winansi_font()),
        ]
    };
    let a = extract_text(docs());
    let b = extract_text(docs());
    assert_eq!(a, b);
}

#[test]
fn output_charset_invariant() {
    // Binary-heavy input exercising every decode fallback
    let mut noisy = b"BT /F1 4 Tf (ok\\ttab) Tj <00010203> Tj (".to_vec();
    noisy.extend(0u8..=255);
    noisy.extend(b") Tj ET");
    let docs = vec![
        indirect(1, page(2, 3)),
        indirect(2, stream(vec![], &noisy)),
        indirect(3, winansi_font()),
    ];
    let text = extract_text(docs);
    assert!(
        forbidden_controls(&text).is_empty(),
        "forbidden control characters in {:?}",
        text
    );
}

#[test]
fn whole_file_roundtrip() {
    let file = b"%PDF-1.4\n\
        1 0 obj\n<< /Type /Page /Contents 2 0 R /Resources << /Font << /F1 3 0 R >> >> >>\nendobj\n\
        2 0 obj\n<< /Length 36 >>\nstream\nBT /F1 12 Tf (From whole file) Tj ET\nendstream\nendobj\n\
        3 0 obj\n<< /Type /Font /BaseFont /Courier /Encoding /WinAnsiEncoding >>\nendobj\n\
        trailer\n<< /Size 4 /Root 9 0 R >>\nstartxref\n0\n%%EOF";
    let text = extract_text_from_bytes(file);
    assert!(text.contains("From whole file"), "got {:?}", text);
}

#[test]
fn extraction_from_file_on_disk() {
    let file: &[u8] = b"%PDF-1.4\n\
        1 0 obj\n<< /Type /Page /Contents 2 0 R >>\nendobj\n\
        2 0 obj\n<< /Length 18 >>\nstream\nBT (on disk) Tj ET\nendstream\nendobj\n\
        %%EOF";
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.pdf");
    std::fs::write(&path, file).unwrap();

    let data = std::fs::read(&path).unwrap();
    let text = extract_text_from_bytes(&data);
    assert!(text.contains("on disk"), "got {:?}", text);
}

#[test]
fn flate_compressed_contents_roundtrip() {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"BT /F1 12 Tf (Compressed text) Tj ET").unwrap();
    let compressed = encoder.finish().unwrap();

    let docs = vec![
        indirect(1, page(2, 3)),
        indirect(
            2,
            stream(vec![("Filter", name("FlateDecode"))], &compressed),
        ),
        indirect(3, winansi_font()),
    ];
    let text = extract_text(docs);
    assert!(text.contains("Compressed text"), "got {:?}", text);
}

#[test]
fn tounicode_roundtrip_unknown_codes() {
    let (font, cmap) = tounicode_font(b"beginbfchar\n<0120> <0041>\nendbfchar", 4);
    let docs = vec![
        indirect(1, page(2, 3)),
        // Code 0x0120 maps to A; the trailing 0x7F byte has no mapping
        // anywhere and yields nothing
        indirect(2, stream(vec![], b"BT /F1 12 Tf <01207F20> Tj ET")),
        indirect(3, font),
        indirect(4, cmap),
    ];
    let text = extract_text(docs);
    assert!(text.contains('A'));
    assert!(!text.contains('\u{7f}'));
}
