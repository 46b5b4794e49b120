//! Document storage trait and the XML implementation

use crate::document::{
    Attribute, Entry, Node, Section, SettingsDocument, ENTRY_ELEMENT, KEY_ATTRIBUTE,
    VALUE_ATTRIBUTE,
};
use crate::error::{Error, Result};

use log::debug;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::ops::Range;
use std::path::Path;

/// Trait for document storage implementations
///
/// The store only talks to its file through this trait, so tests can count or
/// fail saves and hosts can plug in a different serializer.
pub trait DocumentStorage: Clone + Send + Sync {
    /// Parse a document from its textual form
    fn parse(&self, content: &str) -> Result<SettingsDocument>;

    /// Serialize a document to its textual form
    fn serialize(&self, document: &SettingsDocument) -> Result<String>;

    /// Read and parse a document from file
    fn read(&self, path: &Path) -> Result<SettingsDocument> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                Error::Load {
                    path: path.to_path_buf(),
                    reason: "file is not valid UTF-8".into(),
                }
            } else {
                Error::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        self.parse(&content).map_err(|e| match e {
            Error::Parse(reason) => Error::Load {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Serialize and write a document to file
    ///
    /// Uses atomic write: writes to temp file then renames to prevent corruption.
    fn write(&self, path: &Path, document: &SettingsDocument) -> Result<()> {
        let content = self.serialize(document)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let file_name = path.file_name().ok_or_else(|| {
            Error::Config(format!(
                "Invalid path '{}': must have a filename",
                path.display()
            ))
        })?;
        let mut temp_filename = file_name.to_os_string();
        temp_filename.push(".tmp");
        let temp_path = path.with_file_name(temp_filename);

        std::fs::write(&temp_path, &content).map_err(|e| Error::FileWrite {
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            Error::FileWrite {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }

    /// Load the document at `path`, or create an empty in-memory one if the
    /// file does not exist yet. Nothing is written to disk here.
    fn load_or_create(&self, root: &str, path: &Path) -> Result<SettingsDocument> {
        match std::fs::metadata(path) {
            Ok(_) => {
                let document = self.read(path)?;
                if document.root() != root {
                    return Err(Error::Load {
                        path: path.to_path_buf(),
                        reason: format!(
                            "expected root element '{root}', found '{}'",
                            document.root()
                        ),
                    });
                }
                debug!(
                    "Loaded settings document {} ({} sections)",
                    path.display(),
                    document.sections().count()
                );
                Ok(document)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, starting empty", path.display());
                Ok(SettingsDocument::new(root))
            }
            Err(e) => Err(Error::FileRead {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

// =============================================================================
// XML Storage Implementation
// =============================================================================

/// XML storage backend (default)
#[derive(Clone, Debug)]
pub struct XmlStorage {
    /// Spaces per nesting level, `None` for compact output
    indent: Option<usize>,
}

impl Default for XmlStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlStorage {
    /// Create a new XML storage backend with two-space indentation
    pub fn new() -> Self {
        Self { indent: Some(2) }
    }

    /// Create a compact XML storage (no indentation or line breaks)
    pub fn compact() -> Self {
        Self { indent: None }
    }

    /// Create an XML storage indenting each level by `spaces`
    pub fn with_indent(spaces: usize) -> Self {
        Self {
            indent: Some(spaces),
        }
    }
}

impl DocumentStorage for XmlStorage {
    fn parse(&self, content: &str) -> Result<SettingsDocument> {
        // Files written by other tools often start with a BOM
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut builder = DocumentBuilder::default();
        // Text, CDATA and entity references are split into several events
        let mut text: Option<Range<usize>> = None;

        loop {
            let start = position(&reader);
            let event = reader.read_event().map_err(|e| {
                Error::Parse(format!("{e} (at byte {})", reader.error_position()))
            })?;
            let end = position(&reader);

            if let Event::Text(_) | Event::CData(_) | Event::GeneralRef(_) = event {
                if matches!(builder.level(), Level::Prolog | Level::Epilog) {
                    return Err(Error::Parse("text outside the root element".into()));
                }
                text = Some(text.map_or(start, |run| run.start)..end);
                continue;
            }
            if let Some(run) = text.take() {
                builder.markup(raw_slice(content, run));
            }

            match event {
                Event::Start(e) => match builder.level() {
                    Level::Prolog => {
                        builder.open_root(element_name(&e), attributes(&reader, &e)?);
                    }
                    Level::Root => {
                        builder.open_section(element_name(&e), attributes(&reader, &e)?);
                    }
                    Level::Section if is_entry(&e) => {
                        let mut entry = read_entry(&reader, &e)?;
                        let inner = reader
                            .read_to_end(e.name())
                            .map_err(|err| Error::Parse(err.to_string()))?;
                        let inner = raw_slice(content, span(inner));
                        if !inner.is_empty() {
                            entry.content = Some(inner.to_string());
                        }
                        builder.entry(entry);
                    }
                    Level::Section => {
                        reader
                            .read_to_end(e.name())
                            .map_err(|err| Error::Parse(err.to_string()))?;
                        builder.markup(raw_slice(content, start..position(&reader)));
                    }
                    Level::Epilog => return Err(Error::Parse("multiple root elements".into())),
                },
                Event::Empty(e) => match builder.level() {
                    Level::Prolog => {
                        builder.open_root(element_name(&e), attributes(&reader, &e)?);
                        builder.close();
                    }
                    Level::Root => {
                        builder.open_section(element_name(&e), attributes(&reader, &e)?);
                        builder.close();
                    }
                    Level::Section if is_entry(&e) => builder.entry(read_entry(&reader, &e)?),
                    Level::Section => builder.markup(raw_slice(content, start..end)),
                    Level::Epilog => return Err(Error::Parse("multiple root elements".into())),
                },
                Event::End(_) => match builder.level() {
                    Level::Root | Level::Section => builder.close(),
                    Level::Prolog | Level::Epilog => {
                        return Err(Error::Parse("unexpected closing tag".into()));
                    }
                },
                Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {
                    builder.markup(raw_slice(content, start..end));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        builder.finish()
    }

    fn serialize(&self, document: &SettingsDocument) -> Result<String> {
        let mut writer = match self.indent {
            Some(spaces) => Writer::new_with_indent(Vec::new(), b' ', spaces),
            None => Writer::new(Vec::new()),
        };

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_failed)?;
        for raw in document.prolog() {
            write_markup(&mut writer, raw)?;
        }

        let root = start_element(document.root(), document.attributes());
        if document.children().is_empty() {
            writer.write_event(Event::Empty(root)).map_err(write_failed)?;
        } else {
            writer.write_event(Event::Start(root)).map_err(write_failed)?;
            for node in document.children() {
                match node {
                    Node::Item(section) => write_section(&mut writer, section)?,
                    Node::Markup(raw) => write_markup(&mut writer, raw)?,
                }
            }
            writer
                .write_event(Event::End(BytesEnd::new(document.root())))
                .map_err(write_failed)?;
        }

        for raw in document.epilog() {
            write_markup(&mut writer, raw)?;
        }

        let mut content = String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Serialize(e.to_string()))?;
        if self.indent.is_some() {
            content.push('\n');
        }
        Ok(content)
    }
}

// =============================================================================
// Parser State
// =============================================================================

/// Where the reader is relative to the settings structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// Before the root element
    Prolog,
    /// Directly inside the root element
    Root,
    /// Directly inside a section
    Section,
    /// After the root element
    Epilog,
}

/// Assembles a [`SettingsDocument`] from reader events
#[derive(Default)]
struct DocumentBuilder {
    prolog: Vec<String>,
    document: Option<SettingsDocument>,
    section: Option<Section>,
    closed: bool,
}

impl DocumentBuilder {
    fn level(&self) -> Level {
        match (&self.document, &self.section) {
            (None, _) => Level::Prolog,
            (Some(_), Some(_)) => Level::Section,
            (Some(_), None) if self.closed => Level::Epilog,
            (Some(_), None) => Level::Root,
        }
    }

    fn open_root(&mut self, name: String, attributes: Vec<Attribute>) {
        let mut document = SettingsDocument::new(name);
        document.attributes = attributes;
        document.prolog = std::mem::take(&mut self.prolog);
        self.document = Some(document);
    }

    fn open_section(&mut self, name: String, attributes: Vec<Attribute>) {
        let mut section = Section::new(name);
        section.attributes = attributes;
        self.section = Some(section);
    }

    /// Close the innermost open element
    fn close(&mut self) {
        match (self.section.take(), self.document.as_mut()) {
            (Some(section), Some(document)) => document.children.push(Node::Item(section)),
            _ => self.closed = true,
        }
    }

    fn entry(&mut self, entry: Entry) {
        if let Some(section) = self.section.as_mut() {
            section.children.push(Node::Item(entry));
        }
    }

    fn markup(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let raw = raw.to_string();
        match (self.section.as_mut(), self.document.as_mut()) {
            (Some(section), _) => section.children.push(Node::Markup(raw)),
            (None, Some(document)) if self.closed => document.epilog.push(raw),
            (None, Some(document)) => document.children.push(Node::Markup(raw)),
            (None, None) => self.prolog.push(raw),
        }
    }

    fn finish(self) -> Result<SettingsDocument> {
        match self.document {
            None => Err(Error::Parse("missing root element".into())),
            Some(_) if !self.closed || self.section.is_some() => {
                Err(Error::Parse("unexpected end of document".into()))
            }
            Some(document) => Ok(document),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn write_failed(e: impl std::fmt::Display) -> Error {
    Error::Serialize(e.to_string())
}

fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

fn span(span: quick_xml::reader::Span) -> Range<usize> {
    span.start as usize..span.end as usize
}

/// Source text of a node, without surrounding whitespace
fn raw_slice(content: &str, range: Range<usize>) -> &str {
    content.get(range).unwrap_or_default().trim()
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn is_entry(e: &BytesStart) -> bool {
    e.name().as_ref() == ENTRY_ELEMENT.as_bytes()
}

/// Decode every attribute of an element, in source order
fn attributes(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<Vec<Attribute>> {
    e.attributes()
        .map(|attr| {
            let attr = attr.map_err(|err| Error::Parse(err.to_string()))?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = reader
                .decoder()
                .decode(&attr.value)
                .map_err(|err| Error::Parse(err.to_string()))?;
            let value = unescape(&normalize_whitespace(&raw))
                .map_err(|err| Error::Parse(err.to_string()))?
                .into_owned();
            Ok(Attribute { name, value })
        })
        .collect()
}

/// Replace literal tab, newline and carriage return with spaces, as XML
/// attribute-value normalization requires. Character references such as
/// `&#10;` are decoded afterwards and keep their meaning.
fn normalize_whitespace(raw: &str) -> Cow<'_, str> {
    if raw.contains(['\t', '\n', '\r']) {
        Cow::Owned(raw.replace("\r\n", " ").replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Read an `<add>` element, splitting `key`/`value` from other attributes
fn read_entry(reader: &Reader<&[u8]>, e: &BytesStart) -> Result<Entry> {
    let mut entry = Entry::from_attributes(None, None);
    for attr in attributes(reader, e)? {
        match attr.name.as_str() {
            KEY_ATTRIBUTE => entry.key = Some(attr.value),
            VALUE_ATTRIBUTE => entry.value = Some(attr.value),
            _ => entry.attributes.push(attr),
        }
    }
    Ok(entry)
}

fn start_element<'a>(name: &'a str, attributes: &[Attribute]) -> BytesStart<'a> {
    let mut element = BytesStart::new(name);
    for attr in attributes {
        push_attribute(&mut element, &attr.name, &attr.value);
    }
    element
}

fn push_attribute(element: &mut BytesStart, name: &str, value: &str) {
    let escaped = escape_attribute(value);
    element.push_attribute((name.as_bytes(), escaped.as_bytes()));
}

fn write_section(writer: &mut Writer<Vec<u8>>, section: &Section) -> Result<()> {
    let start = start_element(section.name(), section.attributes());
    if section.children().is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_failed);
    }

    writer.write_event(Event::Start(start)).map_err(write_failed)?;
    for node in section.children() {
        match node {
            Node::Item(entry) => write_entry(writer, entry)?,
            Node::Markup(raw) => write_markup(writer, raw)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(section.name())))
        .map_err(write_failed)
}

/// Write an `<add>` element; missing attributes stay missing
fn write_entry(writer: &mut Writer<Vec<u8>>, entry: &Entry) -> Result<()> {
    let mut element = BytesStart::new(ENTRY_ELEMENT);
    if let Some(key) = entry.key() {
        push_attribute(&mut element, KEY_ATTRIBUTE, key);
    }
    if let Some(value) = entry.value() {
        push_attribute(&mut element, VALUE_ATTRIBUTE, value);
    }
    for attr in entry.attributes() {
        push_attribute(&mut element, &attr.name, &attr.value);
    }

    match entry.content() {
        None => writer.write_event(Event::Empty(element)).map_err(write_failed),
        Some(content) => {
            writer.write_event(Event::Start(element)).map_err(write_failed)?;
            writer
                .write_event(Event::Text(BytesText::from_escaped(content)))
                .map_err(write_failed)?;
            writer
                .write_event(Event::End(BytesEnd::new(ENTRY_ELEMENT)))
                .map_err(write_failed)
        }
    }
}

/// Write kept markup verbatim on its own line
fn write_markup(writer: &mut Writer<Vec<u8>>, raw: &str) -> Result<()> {
    writer.write_indent().map_err(write_failed)?;
    writer.get_mut().extend_from_slice(raw.as_bytes());
    Ok(())
}

/// Escape an attribute value.
///
/// Tab, newline and carriage return become character references; XML readers
/// normalize them to spaces when they appear literally in attributes.
fn escape_attribute(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            c => escaped.push(c),
        }
    }
    escaped
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<settings>
  <General>
    <add key="theme" value="dark" />
    <add key="greeting" value="a &amp; b &lt;c&gt; &quot;d&quot;" />
    <!-- hand-written comment -->
    <add key="orphan" />
    <note>ignored</note>
  </General>
  <Empty />
</settings>
"#;

    #[test]
    fn test_parse_sample() {
        let doc = XmlStorage::new().parse(SAMPLE).unwrap();

        assert_eq!(doc.root(), "settings");
        assert_eq!(doc.section_names(), vec!["General", "Empty"]);

        let general = doc.section("General").unwrap();
        assert_eq!(general.len(), 3);
        assert_eq!(general.find("theme").unwrap().value(), Some("dark"));
        assert_eq!(
            general.find("greeting").unwrap().value(),
            Some(r#"a & b <c> "d""#)
        );
        assert_eq!(general.find("orphan").unwrap().value(), None);
        assert!(doc.section("Empty").unwrap().is_empty());
    }

    #[test]
    fn test_parse_accepts_bom_and_self_closing_root() {
        let doc = XmlStorage::new()
            .parse("\u{feff}<?xml version=\"1.0\"?><settings/>")
            .unwrap();

        assert_eq!(doc.root(), "settings");
        assert!(doc.sections().next().is_none());
    }

    #[test]
    fn test_parse_rejects_malformed_documents() {
        let storage = XmlStorage::new();

        for content in [
            "",
            "not xml at all",
            "<settings><General></settings>",
            "<settings>",
            "<settings/><other/>",
            "<settings><S><add key=\"a\" key=\"b\" value=\"c\"/></S></settings>",
        ] {
            let result = storage.parse(content);
            assert!(
                matches!(result, Err(Error::Parse(_))),
                "expected parse error for {content:?}, got {result:?}"
            );
        }
    }

    #[test]
    fn test_serialize_layout() {
        let mut doc = SettingsDocument::default();
        doc.section_or_insert("General").upsert("theme", "dark");
        doc.section_or_insert("Blank");

        let xml = XmlStorage::new().serialize(&doc).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains("<settings>"));
        assert!(xml.contains("  <General>"));
        assert!(xml.contains("<add key=\"theme\" value=\"dark\"/>"));
        assert!(xml.contains("<Blank/>"));
        assert!(xml.trim_end().ends_with("</settings>"));
    }

    #[test]
    fn test_serialize_compact() {
        let mut doc = SettingsDocument::default();
        doc.section_or_insert("General").upsert("theme", "dark");

        let xml = XmlStorage::compact().serialize(&doc).unwrap();
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_special_characters_survive_reparse() {
        let storage = XmlStorage::new();
        let mut doc = SettingsDocument::default();
        let value = "line one\nline two\ttabbed\r\n<&>\"'";
        doc.section_or_insert("Text").upsert("multi", value);

        let xml = storage.serialize(&doc).unwrap();
        assert!(xml.contains("&#10;"));

        let parsed = storage.parse(&xml).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn test_unknown_content_is_written_back() {
        let storage = XmlStorage::new();
        let doc = storage.parse(SAMPLE).unwrap();

        let xml = storage.serialize(&doc).unwrap();
        assert!(xml.contains("<add key=\"orphan\"/>"));
        assert!(xml.contains("<!-- hand-written comment -->"));
        assert!(xml.contains("<note>ignored</note>"));
        assert_eq!(storage.parse(&xml).unwrap(), doc);
    }

    #[test]
    fn test_hand_edits_survive_update() {
        let storage = XmlStorage::new();
        let content = r#"<?xml version="1.0"?>
<!-- managed by hand -->
<settings version="2">
  <!-- keep me -->
  <S scope="user">
    <add key="a" value="1" note="x"/>
    <group><add key="nested" value="n"/></group>
    <add key="rich" value="r"><meta>kept</meta></add>
  </S>
  stray &amp; text
</settings>
<?app trailer?>
"#;
        let mut doc = storage.parse(content).unwrap();
        doc.section_mut("S").unwrap().upsert("b", "2");

        let xml = storage.serialize(&doc).unwrap();
        for kept in [
            "<!-- managed by hand -->",
            "<settings version=\"2\">",
            "<!-- keep me -->",
            "<S scope=\"user\">",
            "<add key=\"a\" value=\"1\" note=\"x\"/>",
            "<group><add key=\"nested\" value=\"n\"/></group>",
            "<add key=\"rich\" value=\"r\"><meta>kept</meta></add>",
            "stray &amp; text",
            "<?app trailer?>",
        ] {
            assert!(xml.contains(kept), "{kept} missing from:\n{xml}");
        }

        // New entries go after everything already in the section
        let group = xml.find("<group>").unwrap();
        let added = xml.find("<add key=\"b\" value=\"2\"/>").unwrap();
        assert!(group < added);

        let reparsed = storage.parse(&xml).unwrap();
        assert_eq!(reparsed, doc);
        let section = reparsed.section("S").unwrap();
        assert_eq!(section.attributes(), &[Attribute::new("scope", "user")]);
        assert_eq!(section.find("a").unwrap().attributes(), &[Attribute::new("note", "x")]);
        assert_eq!(section.find("rich").unwrap().content(), Some("<meta>kept</meta>"));
        assert!(section.find("nested").is_none());
    }

    #[test]
    fn test_literal_whitespace_in_attributes_is_normalized() {
        let doc = XmlStorage::new()
            .parse("<settings><S><add key=\"k\" value=\"a\nb\tc\r\nd&#10;e\"/></S></settings>")
            .unwrap();

        assert_eq!(
            doc.section("S").unwrap().find("k").unwrap().value(),
            Some("a b c d\ne")
        );
    }

    #[test]
    fn test_write_then_read() {
        let storage = XmlStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/dir/settings.xml");

        let mut doc = SettingsDocument::default();
        doc.section_or_insert("General").upsert("theme", "dark");

        storage.write(&path, &doc).unwrap();
        assert!(!path.with_file_name("settings.xml.tmp").exists());

        let loaded = storage.read(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_read_nonexistent_file() {
        let storage = XmlStorage::new();
        let result = storage.read(Path::new("/nonexistent/settings.xml"));

        assert!(matches!(result.unwrap_err(), Error::FileRead { .. }));
    }

    #[test]
    fn test_read_malformed_file_is_load_error() {
        let storage = XmlStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.xml");
        std::fs::write(&path, "<settings><broken></settings>").unwrap();

        match storage.read(&path).unwrap_err() {
            Error::Load { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_or_create_missing_file() {
        let storage = XmlStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.xml");

        let doc = storage.load_or_create("settings", &path).unwrap();

        assert_eq!(doc, SettingsDocument::new("settings"));
        assert!(!path.exists());
    }

    #[test]
    fn test_load_or_create_rejects_other_root() {
        let storage = XmlStorage::new();
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.xml");
        std::fs::write(&path, "<configuration/>").unwrap();

        let err = storage.load_or_create("settings", &path).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
        assert!(err.to_string().contains("configuration"));
    }
}
