use super::*;

const FIXTURE: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Fixture page</title></head>
<body>
    <p>Intro text about the page.</p>
    <h1>Foo</h1>
    <p>Some intro text about Foo.</p>
    <h2>Bar main section</h2>
    <p>Some intro text about Bar.</p>
    <h3>Bar subsection 1</h3>
    <p>Some text about the first subtopic of Bar.</p>
    <h2>Baz</h2>
    <p>Some text about Baz.</p>
</body>
</html>
"#;

fn path_of(chunk: &Chunk) -> Vec<(&str, &str)> {
    chunk
        .heading_path
        .iter()
        .map(|(label, text)| (label.as_str(), text.as_str()))
        .collect()
}

#[test]
fn fixture_produces_five_metadata_states() {
    let chunks = chunk(FIXTURE, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 5, "chunks: {:?}", chunks);

    assert_eq!(chunks[0].text, "Intro text about the page.");
    assert_eq!(path_of(&chunks[0]), Vec::<(&str, &str)>::new());

    assert_eq!(chunks[1].text, "Some intro text about Foo.");
    assert_eq!(path_of(&chunks[1]), vec![("Header 1", "Foo")]);

    assert_eq!(
        path_of(&chunks[2]),
        vec![("Header 1", "Foo"), ("Header 2", "Bar main section")]
    );

    assert_eq!(
        path_of(&chunks[3]),
        vec![
            ("Header 1", "Foo"),
            ("Header 2", "Bar main section"),
            ("Header 3", "Bar subsection 1"),
        ]
    );

    // The second H2 closes the H3; its chunk must not carry a stale
    // subsection entry.
    assert_eq!(chunks[4].text, "Some text about Baz.");
    assert_eq!(
        path_of(&chunks[4]),
        vec![("Header 1", "Foo"), ("Header 2", "Baz")]
    );
    assert_eq!(chunks[4].heading("Header 3"), None);
}

#[test]
fn unconfigured_headings_become_body_text() {
    let config = ChunkerConfig {
        headers_to_split_on: vec![("h1".to_string(), "Title".to_string())],
        ..ChunkerConfig::default()
    };
    let chunks = chunk(FIXTURE, &config);

    assert_eq!(chunks.len(), 2, "chunks: {:?}", chunks);
    assert_eq!(path_of(&chunks[0]), Vec::<(&str, &str)>::new());
    assert_eq!(path_of(&chunks[1]), vec![("Title", "Foo")]);

    // H2/H3 tags are not split points, so their text flows into the body.
    let body = &chunks[1].text;
    assert!(body.contains("Bar main section"));
    assert!(body.contains("Some intro text about Bar."));
    assert!(body.contains("Bar subsection 1"));
    assert!(body.contains("Some text about the first subtopic of Bar."));
    assert!(body.contains("Baz"));
    assert!(body.contains("Some text about Baz."));
}

#[test]
fn heading_text_never_appears_in_chunk_body() {
    let html = "<h1>Unrepeated heading token</h1><p>body text</p><h2>Another marker</h2><p>more body</p>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 2);
    for piece in &chunks {
        assert!(
            !piece.text.contains("Unrepeated heading token"),
            "chunk body: {}",
            piece.text
        );
        assert!(
            !piece.text.contains("Another marker"),
            "chunk body: {}",
            piece.text
        );
    }
}

#[test]
fn text_only_document_yields_single_unlabeled_chunk() {
    let html = "<html><body><p>First   paragraph.</p><div>Second\n\tfragment</div> tail</body></html>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "First paragraph. Second fragment tail");
    assert!(chunks[0].heading_path.is_empty());
}

#[test]
fn empty_input_yields_no_chunks() {
    assert!(chunk("", &ChunkerConfig::default()).is_empty());
    assert!(chunk("   \n\t ", &ChunkerConfig::default()).is_empty());
}

#[test]
fn document_with_no_visible_text_yields_no_chunks() {
    let html = "<html><head><title>Only a title</title></head><body><div></div></body></html>";
    assert!(chunk(html, &ChunkerConfig::default()).is_empty());
}

#[test]
fn same_level_heading_replaces_previous_without_empty_chunk() {
    let html = "<p>preamble</p><h2>First</h2><h2>Second</h2><p>body</p>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 2, "chunks: {:?}", chunks);
    assert_eq!(chunks[0].text, "preamble");
    assert!(chunks[0].heading_path.is_empty());
    assert_eq!(chunks[1].text, "body");
    assert_eq!(path_of(&chunks[1]), vec![("Header 2", "Second")]);
}

#[test]
fn higher_level_heading_purges_descendants() {
    let html = "<h1>Top</h1><h3>Deep</h3><p>deep text</p><h2>Mid</h2><p>mid text</p>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 2);
    assert_eq!(
        path_of(&chunks[0]),
        vec![("Header 1", "Top"), ("Header 3", "Deep")]
    );
    // H2 closes the H3 even though it is a different level.
    assert_eq!(
        path_of(&chunks[1]),
        vec![("Header 1", "Top"), ("Header 2", "Mid")]
    );
}

#[test]
fn trailing_heading_registers_its_metadata_state_once() {
    let html = "<p>body</p><h1>Closing heading</h1>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 2, "chunks: {:?}", chunks);
    assert_eq!(chunks[0].text, "body");
    assert_eq!(chunks[1].text, "");
    assert_eq!(path_of(&chunks[1]), vec![("Header 1", "Closing heading")]);
}

#[test]
fn document_opening_with_a_heading_emits_no_preamble_chunk() {
    let html = "<h1>Title</h1><p>body</p>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 1, "chunks: {:?}", chunks);
    assert_eq!(chunks[0].text, "body");
    assert_eq!(path_of(&chunks[0]), vec![("Header 1", "Title")]);
}

#[test]
fn heading_only_document_yields_single_empty_chunk() {
    let html = "<h1>Alpha</h1><h2>Beta</h2>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "");
    assert_eq!(
        path_of(&chunks[0]),
        vec![("Header 1", "Alpha"), ("Header 2", "Beta")]
    );
}

#[test]
fn malformed_html_degrades_to_text_extraction() {
    let html = "<p>unclosed paragraph <h1>Heading</h1><div>nested <b>text";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 2, "chunks: {:?}", chunks);
    assert_eq!(chunks[0].text, "unclosed paragraph");
    assert!(chunks[0].heading_path.is_empty());
    assert_eq!(path_of(&chunks[1]), vec![("Header 1", "Heading")]);
    assert_eq!(chunks[1].text, "nested text");
}

#[test]
fn script_and_style_content_is_ignored() {
    let html = "<style>p { color: red; }</style><p>Visible</p><script>var hidden = 1;</script>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Visible");
}

#[test]
fn nested_heading_markup_joins_into_path_text() {
    let html = "<h1>The <em>Great</em> Title</h1><p>body</p>";
    let chunks = chunk(html, &ChunkerConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(path_of(&chunks[0]), vec![("Header 1", "The Great Title")]);
}

#[test]
fn oversized_chunks_are_subdivided_with_metadata_preserved() {
    let sentence = "This sentence pads the section body out past the bound. ";
    let html = format!("<h1>Long</h1><p>{}</p>", sentence.repeat(10));
    let config = ChunkerConfig {
        max_chunk_size: 120,
        chunk_overlap: 10,
        ..ChunkerConfig::default()
    };

    let chunks = chunk(&html, &config);

    assert!(chunks.len() > 1, "expected subdivision, got {:?}", chunks);
    for piece in &chunks {
        assert!(
            piece.text.chars().count() <= config.max_chunk_size,
            "sub-chunk exceeds bound: {} chars",
            piece.text.chars().count()
        );
        assert_eq!(path_of(piece), vec![("Header 1", "Long")]);
        assert!(!piece.text.is_empty());
    }
}

#[test]
fn within_bound_chunks_are_never_modified() {
    let html = "<h1>Short</h1><p>Tiny body.</p>";
    let config = ChunkerConfig {
        max_chunk_size: 500,
        chunk_overlap: 100,
        ..ChunkerConfig::default()
    };

    let chunks = chunk(html, &config);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Tiny body.");
}

#[test]
fn subdivision_inserts_overlap_between_adjacent_pieces() {
    // Single long "sentence" with no terminators forces word-level packing.
    let words: Vec<String> = (0..40).map(|i| format!("word{:02}", i)).collect();
    let text = words.join(" ");
    let html = format!("<p>{}</p>", text);
    let config = ChunkerConfig {
        max_chunk_size: 60,
        chunk_overlap: 6,
        ..ChunkerConfig::default()
    };

    let chunks = chunk(&html, &config);
    assert!(chunks.len() > 1);

    for window in chunks.windows(2) {
        let previous = &window[0].text;
        let current = &window[1].text;
        // Each piece after the first starts with the tail of its
        // predecessor's own content.
        let overlap: String = current.chars().take(6).collect();
        assert!(
            previous.ends_with(overlap.trim_end()),
            "no overlap between {:?} and {:?}",
            previous,
            current
        );
    }
}

#[test]
fn split_text_packs_greedily_at_word_boundaries() {
    let pieces = split_text("aaaa bbbb cccc dddd", 9);
    assert_eq!(pieces, vec!["aaaa bbbb", "cccc dddd"]);
}

#[test]
fn split_text_hard_cuts_single_oversized_words() {
    let pieces = split_text("abcdefghij", 4);
    assert_eq!(pieces, vec!["abcd", "efgh", "ij"]);
}

#[test]
fn default_headers_cover_h1_through_h5() {
    let headers = default_headers();
    assert_eq!(headers.len(), 5);
    assert_eq!(headers[0], ("h1".to_string(), "Header 1".to_string()));
    assert_eq!(headers[4], ("h5".to_string(), "Header 5".to_string()));
}
