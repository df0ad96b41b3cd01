//! End-to-end filter tests through the public facade: body in, headers and
//! transformed bytes out.

use std::sync::Arc;
use xflow::{
    BodyChunk, BufferSink, Decl, FilterStatus, OptionFlags, RecordedResponse, ScopeOptions,
    StylesheetCache, TransformFilter, parse_options,
};

const PAGE_SHEET: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
    <xsl:output method="html" encoding="UTF-8"/>
    <xsl:template match="/page">
        <html>
            <head><title><xsl:value-of select="title"/></title></head>
            <body><xsl:apply-templates select="body"/></body>
        </html>
    </xsl:template>
    <xsl:template match="body">
        <xsl:for-each select="para">
            <p><xsl:value-of select="."/></p>
        </xsl:for-each>
    </xsl:template>
</xsl:stylesheet>"#;

const PAGE_BODY: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<page>
    <title>Hello</title>
    <body>
        <para>first</para>
        <para>second</para>
    </body>
</page>"#;

fn run_filter(
    filter: &TransformFilter,
    path: &str,
    body: &[u8],
) -> (FilterStatus, BufferSink, RecordedResponse) {
    let mut request = filter.new_request(path, (1, 1), false);
    let mut sink = BufferSink::new();
    let mut meta = RecordedResponse::new();
    let status = filter.process(
        &mut request,
        [BodyChunk::Data(body), BodyChunk::End],
        &mut sink,
        &mut meta,
    );
    (status, sink, meta)
}

#[test]
fn transforms_page_to_html_with_cached_stylesheet() {
    let mut cache = StylesheetCache::new();
    cache.insert_compiled("page", xflow::compile(PAGE_SHEET).unwrap());
    let filter = TransformFilter::new(
        ScopeOptions::new(Decl::default()).with_stylesheet("page"),
        Arc::new(cache),
    );

    let (status, sink, meta) = run_filter(&filter, "/site/index.xml", PAGE_BODY);

    assert_eq!(status, FilterStatus::Ok);
    let html = String::from_utf8(sink.data).unwrap();
    assert!(html.contains("<title>Hello</title>"));
    assert!(html.contains("<p>first</p>"));
    assert!(html.contains("<p>second</p>"));
    assert!(!html.starts_with("<?xml"));
    assert_eq!(meta.content_type.as_deref(), Some("text/html"));
    assert!(meta.chunked);
}

#[test]
fn autodiscovers_stylesheet_from_directive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("page.xsl"), PAGE_SHEET).unwrap();
    let document_path = format!("{}/index.xml", dir.path().display());

    let body = br#"<?xml-stylesheet type="text/xsl" href="page.xsl"?>
<page><title>Found</title><body/></page>"#;

    let filter = TransformFilter::new(
        ScopeOptions::new(Decl::default()),
        Arc::new(StylesheetCache::new()),
    );
    let (status, sink, _meta) = run_filter(&filter, &document_path, body);

    assert_eq!(status, FilterStatus::Ok);
    let html = String::from_utf8(sink.data).unwrap();
    assert!(html.contains("<title>Found</title>"));
}

#[test]
fn directive_load_is_refused_when_host_fs_is_disabled() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("page.xsl"), PAGE_SHEET).unwrap();
    let document_path = format!("{}/index.xml", dir.path().display());

    let body = br#"<?xml-stylesheet type="text/xsl" href="page.xsl"?>
<page><title>Found</title><body/></page>"#;

    let options = ScopeOptions::new(Decl::Incremental {
        added: OptionFlags::NO_HOST_FS,
        removed: OptionFlags::NONE,
    });
    let filter = TransformFilter::new(options, Arc::new(StylesheetCache::new()));
    let (status, sink, _meta) = run_filter(&filter, &document_path, body);

    assert_eq!(status, FilterStatus::InternalServerError);
    assert!(sink.data.is_empty());
}

#[test]
fn malformed_body_produces_error_and_no_output() {
    let mut cache = StylesheetCache::new();
    cache.insert_compiled("page", xflow::compile(PAGE_SHEET).unwrap());
    let filter = TransformFilter::new(
        ScopeOptions::new(Decl::default()).with_stylesheet("page"),
        Arc::new(cache),
    );

    let (status, sink, _meta) = run_filter(&filter, "/site/index.xml", b"<page><unclosed></page>");

    assert_eq!(status, FilterStatus::InternalServerError);
    assert!(sink.data.is_empty());
    assert!(!sink.ended);
}

#[test]
fn scope_merge_then_parse_controls_include_expansion() {
    let sheet = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
        <xsl:output method="text"/>
        <xsl:template match="/doc"><xsl:value-of select="other"/></xsl:template>
    </xsl:stylesheet>"#;
    let body = br#"<doc xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="other.xml"/></doc>"#;

    let run = |decl: Decl| {
        let provider = Arc::new(xflow::InMemoryResourceProvider::new());
        provider
            .add("/site/other.xml", b"<other>extra</other>".to_vec())
            .unwrap();
        let mut cache = StylesheetCache::new();
        cache.insert_compiled("doc", xflow::compile(sheet).unwrap());
        let filter = TransformFilter::new(
            ScopeOptions::new(decl).with_stylesheet("doc"),
            Arc::new(cache),
        )
        .with_provider(provider);
        run_filter(&filter, "/site/index.xml", body)
    };

    // Parent scope enables includes; child directive revokes them.
    let parent = ScopeOptions::new(
        parse_options("XIncludes ProviderFs NoHostFs", &Decl::default()).unwrap(),
    );
    let child = ScopeOptions::new(parse_options("-XIncludes", &Decl::default()).unwrap());
    let merged = ScopeOptions::merge(&parent, &child);
    assert!(!merged.flags().contains(OptionFlags::XINCLUDES));

    let (status, sink, _meta) = run(parent.decl.clone());
    assert_eq!(status, FilterStatus::Ok);
    assert_eq!(sink.data, b"extra");

    let (status, sink, _meta) = run(merged.decl);
    assert_eq!(status, FilterStatus::Ok);
    assert!(sink.data.is_empty());
}

#[test]
fn xml_output_carries_declaration_and_fixed_length_on_http_10() {
    let sheet = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
        <xsl:output method="xml" encoding="ISO-8859-1" media-type="application/xml"/>
        <xsl:template match="/page"><result/></xsl:template>
    </xsl:stylesheet>"#;
    let mut cache = StylesheetCache::new();
    cache.insert_compiled("page", xflow::compile(sheet).unwrap());
    let filter = TransformFilter::new(
        ScopeOptions::new(Decl::default()).with_stylesheet("page"),
        Arc::new(cache),
    );

    let mut request = filter.new_request("/site/index.xml", (1, 0), false);
    let mut sink = BufferSink::new();
    let mut meta = RecordedResponse::new();
    let status = filter.process(
        &mut request,
        [BodyChunk::Data(b"<page/>"), BodyChunk::End],
        &mut sink,
        &mut meta,
    );

    assert_eq!(status, FilterStatus::Ok);
    let out = String::from_utf8(sink.data.clone()).unwrap();
    assert!(out.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));
    assert!(out.contains("<result/>"));
    assert_eq!(
        meta.content_type.as_deref(),
        Some("application/xml; charset=ISO-8859-1")
    );
    assert!(!meta.chunked);
    assert_eq!(meta.content_length, Some(sink.data.len() as u64));
}

#[test]
fn entity_references_survive_transformation() {
    let sheet = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
        <xsl:output method="text"/>
        <xsl:template match="/doc"><xsl:value-of select="."/></xsl:template>
    </xsl:stylesheet>"#;
    let mut cache = StylesheetCache::new();
    cache.insert_compiled("doc", xflow::compile(sheet).unwrap());
    let filter = TransformFilter::new(
        ScopeOptions::new(Decl::default()).with_stylesheet("doc"),
        Arc::new(cache),
    );

    let (status, sink, _meta) =
        run_filter(&filter, "/site/index.xml", b"<doc>Tom &amp; Jerry &lt;3</doc>");

    assert_eq!(status, FilterStatus::Ok);
    assert_eq!(sink.data, b"Tom & Jerry <3");
}

#[test]
fn one_filter_serves_many_requests() {
    let mut cache = StylesheetCache::new();
    cache.insert_compiled("page", xflow::compile(PAGE_SHEET).unwrap());
    let filter = TransformFilter::new(
        ScopeOptions::new(Decl::default()).with_stylesheet("page"),
        Arc::new(cache),
    );

    for _ in 0..3 {
        let (status, sink, _meta) = run_filter(&filter, "/site/index.xml", PAGE_BODY);
        assert_eq!(status, FilterStatus::Ok);
        assert!(sink.ended);
    }
}
