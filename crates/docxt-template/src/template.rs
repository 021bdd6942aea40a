//! Template bound to a package.

use std::borrow::Cow;

use docxt_params::{Params, Placeholder};
use docxt_xml::Document;
use docxt_xml::merge::MARKER_OPEN;
use docxt_xml::wordml::PARAGRAPH;

use crate::download::{Downloader, HttpDownloader};
use crate::error::TemplateError;
use crate::images::{PackageImageResolver, has_images, resolve_images};
use crate::package::{MAIN_DOCUMENT, Package};
use crate::pipeline::{self, markup, own_texts};

/// Package parts processed by default, matched as substrings of part names.
pub const DEFAULT_PARTS: &[&str] = &[MAIN_DOCUMENT, "word/header", "word/footer"];

/// A docx template ready to receive parameters.
///
/// # Example
///
/// ```
/// use docxt_params::Params;
/// use docxt_template::{Package, Template};
///
/// let package = Package::from_parts([(
///     "word/document.xml",
///     "<w:document><w:body><w:p><w:r><w:t>Hello {{Name}}</w:t></w:r></w:p></w:body></w:document>",
/// )]);
/// let mut template = Template::open(package).unwrap();
/// template.apply(&Params::from_json(br#"{"Name": "Alice"}"#).unwrap());
///
/// assert_eq!(template.plaintext(), "Hello Alice");
/// assert!(template.placeholders().is_empty());
/// ```
pub struct Template {
    package: Package,
    parts: Vec<String>,
    downloader: Box<dyn Downloader>,
}

impl Template {
    /// Bind a package.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingMainDocument`] when the package has no
    /// `word/document.xml`.
    pub fn open(package: Package) -> Result<Self, TemplateError> {
        if !package.contains(MAIN_DOCUMENT) {
            return Err(TemplateError::MissingMainDocument(MAIN_DOCUMENT));
        }
        Ok(Self {
            package,
            parts: DEFAULT_PARTS.iter().map(|&part| part.to_owned()).collect(),
            downloader: Box::new(HttpDownloader::default()),
        })
    }

    /// Process the parts whose names contain one of `parts`.
    #[must_use]
    pub fn with_parts<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parts = parts.into_iter().map(Into::into).collect();
        self
    }

    /// Fetch remote images with `downloader`.
    #[must_use]
    pub fn with_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
        self.downloader = Box::new(downloader);
        self
    }

    /// Expand every processed part with `params`.
    ///
    /// Parts that are not valid XML are logged and left untouched, as are
    /// parts without placeholders. Images are embedded once per call and
    /// linked from the parts that reference them. Returns the number of
    /// expanded parts.
    pub fn apply(&mut self, params: &Params) -> usize {
        let with_images = has_images(params);
        let parts = self.content_parts();
        let mut resolver = PackageImageResolver::new(&mut self.package, self.downloader.as_ref());
        let mut expanded = 0;

        for name in parts {
            let Some(mut doc) = load_part(resolver.package(), &name) else {
                continue;
            };
            let root = doc.root();
            let text = doc.all_text(root);
            if !text.contains(MARKER_OPEN) {
                continue;
            }

            let params = if with_images {
                let mut own = params.clone();
                resolve_images(&mut own, &mut resolver, &name, &text);
                Cow::Owned(own)
            } else {
                Cow::Borrowed(params)
            };

            pipeline::run(&mut doc, &params);
            resolver.package_mut().set(name.as_str(), doc.to_xml());
            tracing::debug!(part = %name, "Expanded part");
            expanded += 1;
        }
        expanded
    }

    /// Text of the processed parts, one line per non-empty paragraph.
    pub fn plaintext(&self) -> String {
        let mut lines = Vec::new();
        for name in self.content_parts() {
            let Some(mut doc) = load_part(&self.package, &name) else {
                continue;
            };
            markup::repair_runs(&mut doc);
            let root = doc.root();
            for paragraph in doc.find_all(root, &[PARAGRAPH]) {
                let line: String = own_texts(&doc, paragraph)
                    .into_iter()
                    .map(|text| doc.text(text))
                    .collect();
                if !line.is_empty() {
                    lines.push(line);
                }
            }
        }
        lines.join("\n")
    }

    /// Placeholder markers still present in the processed parts, in order.
    pub fn placeholders(&self) -> Vec<String> {
        Placeholder::scan(&self.plaintext())
            .into_iter()
            .map(|token| token.raw().to_owned())
            .collect()
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn into_package(self) -> Package {
        self.package
    }

    /// Names of the XML parts matching the configured patterns.
    fn content_parts(&self) -> Vec<String> {
        self.package
            .part_names()
            .filter(|name| {
                name.ends_with(".xml") && self.parts.iter().any(|part| name.contains(part.as_str()))
            })
            .map(str::to_owned)
            .collect()
    }
}

fn load_part(package: &Package, name: &str) -> Option<Document> {
    let bytes = package.get(name)?;
    let xml = match std::str::from_utf8(bytes) {
        Ok(xml) => xml,
        Err(err) => {
            tracing::warn!(part = %name, error = %err, "Skipping part that is not UTF-8");
            return None;
        }
    };
    match Document::parse(xml) {
        Ok(doc) => Some(doc),
        Err(err) => {
            tracing::warn!(part = %name, error = %err, "Skipping unparsable part");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownloadError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        )
    }

    fn paragraph(text: &str) -> String {
        format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
    }

    fn row(cells: &[&str]) -> String {
        let cells: String = cells
            .iter()
            .map(|text| format!("<w:tc>{}</w:tc>", paragraph(text)))
            .collect();
        format!("<w:tr>{cells}</w:tr>")
    }

    fn from_body(body: &str) -> Template {
        Template::open(Package::from_parts([(MAIN_DOCUMENT, document(body))])).unwrap()
    }

    fn params(value: serde_json::Value) -> Params {
        Params::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_main_document() {
        let result = Template::open(Package::from_parts([("word/header1.xml", "<w:hdr />")]));
        assert!(matches!(
            result,
            Err(TemplateError::MissingMainDocument(MAIN_DOCUMENT))
        ));
    }

    #[test]
    fn test_document_without_placeholders_is_unchanged() {
        let body = format!(
            "{}{}",
            paragraph("Plain text &amp; more"),
            "<w:p><w:r><w:t xml:space=\"preserve\"> spaced </w:t></w:r><w:r><w:t>run</w:t></w:r></w:p>"
        );
        let mut template = from_body(&body);
        let before = template.package().clone();
        assert_eq!(template.apply(&params(json!({"Name": "x"}))), 0);
        assert_eq!(template.package(), &before);
    }

    #[test]
    fn test_unresolved_placeholders_stay_visible() {
        let mut template = from_body(&paragraph("{{Name}} and {{Undefined}}"));
        template.apply(&Params::default());
        assert_eq!(template.plaintext(), "{{Name}} and {{Undefined}}");
        assert_eq!(template.placeholders(), vec!["{{Name}}", "{{Undefined}}"]);
    }

    #[test]
    fn test_placeholders_of_split_runs() {
        let template = from_body(
            "<w:p><w:r><w:t>{{Na</w:t></w:r><w:r><w:rPr><w:b /></w:rPr><w:t>me}}</w:t></w:r></w:p>",
        );
        assert_eq!(template.placeholders(), vec!["{{Name}}"]);
    }

    #[test]
    fn test_formatters() {
        let mut template = from_body(&format!(
            "{}{}{}",
            paragraph("{{Text :upper}}"),
            paragraph("{{Text :capitalize}}"),
            paragraph("{{Text :title}}")
        ));
        template.apply(&params(json!({"Text": "lorem ipsum"})));
        assert_eq!(template.plaintext(), "LOREM IPSUM\nLorem ipsum\nLorem Ipsum");
    }

    #[test]
    fn test_list_cardinality_and_one_based_index() {
        let mut template = from_body(&format!(
            "<w:tbl>{}{}</w:tbl>",
            row(&["No", "Name"]),
            row(&["{{#Users}}", "{{Users.Name}}"])
        ));
        template.apply(&params(json!({"Users": [{"Name": "Ann"}, {"Name": "Dan"}, {"Name": "Eve"}]})));
        assert_eq!(
            template.plaintext(),
            "No\nName\n1\nAnn\n2\nDan\n3\nEve"
        );
        let xml = String::from_utf8(template.package().get(MAIN_DOCUMENT).unwrap().to_vec()).unwrap();
        assert_eq!(xml.matches("<w:tr>").count(), 4);
        assert!(!xml.contains("{{"));
        assert!(!xml.contains("docxt:list"));
    }

    #[test]
    fn test_nested_lists_keep_items_under_their_parent() {
        let mut template = from_body(&format!(
            "{}{}",
            paragraph("User {{Users.Name}}"),
            paragraph("- {{Users.Friends.Name}} ({{#Users.Friends}})")
        ));
        template.apply(&params(json!({
            "Users": [
                {"Name": "Ann", "Friends": [{"Name": "Bob"}, {"Name": "Cid"}]},
                {"Name": "Dan", "Friends": [{"Name": "Eve"}]}
            ]
        })));
        assert_eq!(
            template.plaintext(),
            "User Ann\nUser Dan\n- Bob (1)\n- Cid (2)\n- Eve (1)"
        );
    }

    #[test]
    fn test_nested_table_rows() {
        let inner = format!("<w:tbl>{}</w:tbl>", row(&["{{Users.Friends.Name}}"]));
        let outer = format!(
            "<w:tbl><w:tr><w:tc>{}{inner}</w:tc></w:tr></w:tbl>",
            paragraph("{{Users.Name}}")
        );
        let mut template = from_body(&outer);
        template.apply(&params(json!({
            "Users": [
                {"Name": "Ann", "Friends": [{"Name": "Bob"}, {"Name": "Cid"}]},
                {"Name": "Dan", "Friends": [{"Name": "Eve"}]}
            ]
        })));
        assert_eq!(template.plaintext(), "Ann\nBob\nCid\nDan\nEve");
    }

    #[test]
    fn test_empty_trigger_removes_row() {
        let body = format!(
            "<w:tbl>{}</w:tbl>",
            row(&["{{Friends.Name :empty:remove:row}}", "{{Friends.Age}}"])
        );
        let mut template = from_body(&format!("{}{body}", paragraph("Hi {{Name}}")));
        template.apply(&params(json!({
            "Name": "Alice",
            "Friends": [{"Name": "Bob", "Age": 28}, {"Name": "", "Age": 999}]
        })));
        assert_eq!(template.plaintext(), "Hi Alice\nBob\n28");
        let xml = String::from_utf8(template.package().get(MAIN_DOCUMENT).unwrap().to_vec()).unwrap();
        assert_eq!(xml.matches("<w:tr>").count(), 1);
        assert!(!xml.contains("999"));
    }

    #[test]
    fn test_empty_trigger_keeps_row_with_value() {
        let mut template = from_body(&paragraph("Phone: {{Phone :empty:remove:row}}"));
        template.apply(&params(json!({"Phone": "555"})));
        assert_eq!(template.plaintext(), "Phone: 555");

        let mut template = from_body(&paragraph("Phone: {{Phone :empty:remove:row}}"));
        template.apply(&params(json!({"Phone": ""})));
        assert_eq!(template.plaintext(), "");

        let mut template = from_body(&paragraph("Phone: {{Phone :empty:remove:row}}"));
        template.apply(&Params::default());
        assert_eq!(template.plaintext(), "");
    }

    #[test]
    fn test_inline_list() {
        let mut template = from_body(&paragraph("Numbers: {{Numbers , }}."));
        template.apply(&params(json!({"Numbers": [1, 2, 3]})));
        assert_eq!(template.plaintext(), "Numbers: 1, 2, 3.");
    }

    #[test]
    fn test_inline_empty_list() {
        let mut template = from_body(&format!(
            "{}{}",
            paragraph("Tags: {{Tags , }}"),
            paragraph("Gone {{Tags , :empty:remove:row}}")
        ));
        template.apply(&params(json!({"Tags": []})));
        assert_eq!(template.plaintext(), "Tags: ");
        assert!(template.placeholders().is_empty());
    }

    #[test]
    fn test_multiline_value() {
        let mut template = from_body(&paragraph("Address: {{Address}}"));
        template.apply(&params(json!({"Address": "Main St\n12345 Town"})));
        assert_eq!(template.plaintext(), "Address: Main St\n12345 Town");
        let xml = String::from_utf8(template.package().get(MAIN_DOCUMENT).unwrap().to_vec()).unwrap();
        assert_eq!(xml.matches("<w:p>").count(), 2);
    }

    #[test]
    fn test_headers_and_footers() {
        let package = Package::from_parts([
            (MAIN_DOCUMENT, document(&paragraph("Body"))),
            ("word/header1.xml", format!("<w:hdr>{}</w:hdr>", paragraph("{{Title}}"))),
            ("word/styles.xml", format!("<w:styles>{}</w:styles>", paragraph("{{Title}}"))),
        ]);
        let mut template = Template::open(package).unwrap();
        assert_eq!(template.apply(&params(json!({"Title": "Report"}))), 1);
        assert_eq!(template.plaintext(), "Body\nReport");

        let package = template.into_package();
        let styles = String::from_utf8(package.get("word/styles.xml").unwrap().to_vec()).unwrap();
        assert!(styles.contains("{{Title}}"));
    }

    #[test]
    fn test_custom_parts() {
        let package = Package::from_parts([
            (MAIN_DOCUMENT, document(&paragraph("{{Title}}"))),
            ("word/footnotes.xml", format!("<w:footnotes>{}</w:footnotes>", paragraph("{{Title}}"))),
        ]);
        let mut template = Template::open(package)
            .unwrap()
            .with_parts(["word/footnotes"]);
        template.apply(&params(json!({"Title": "Report"})));
        let package = template.into_package();
        let main = String::from_utf8(package.get(MAIN_DOCUMENT).unwrap().to_vec()).unwrap();
        let notes = String::from_utf8(package.get("word/footnotes.xml").unwrap().to_vec()).unwrap();
        assert!(main.contains("{{Title}}"));
        assert!(notes.contains("Report"));
    }

    #[test]
    fn test_invalid_part_is_skipped() {
        let package = Package::from_parts([
            (MAIN_DOCUMENT.to_owned(), document(&paragraph("{{Title}}")).into_bytes()),
            ("word/footer1.xml".to_owned(), vec![0xff, 0xfe, b'{']),
        ]);
        let mut template = Template::open(package).unwrap();
        assert_eq!(template.apply(&params(json!({"Title": "Report"}))), 1);
        assert_eq!(template.plaintext(), "Report");
    }

    struct StaticDownloader;

    impl Downloader for StaticDownloader {
        fn download(&self, _url: &str) -> Result<NamedTempFile, DownloadError> {
            let mut file = NamedTempFile::new()?;
            file.write_all(b"GIF89a")?;
            Ok(file)
        }
    }

    #[test]
    fn test_image_placeholder() {
        let package = Package::from_parts([
            (MAIN_DOCUMENT, document(&paragraph("Logo: {{Logo}}!"))),
            (crate::package::CONTENT_TYPES, r#"<Types xmlns="urn:ct" />"#.to_owned()),
        ]);
        let mut template = Template::open(package)
            .unwrap()
            .with_downloader(StaticDownloader);
        template.apply(&params(json!({
            "Logo": {"$image": {"url": "https://example.com/logo.gif", "width": 10, "height": 20}}
        })));

        let package = template.into_package();
        assert_eq!(package.get("word/media/image1.gif"), Some(&b"GIF89a"[..]));
        let xml = String::from_utf8(package.get(MAIN_DOCUMENT).unwrap().to_vec()).unwrap();
        assert!(xml.contains(
            r#"<w:t xml:space="preserve">Logo: </w:t><w:pict><v:shape style="width:10pt;height:20pt"><v:imagedata r:id="rId1" /></v:shape></w:pict><w:t>!</w:t>"#
        ));
        let rels = String::from_utf8(package.get("word/_rels/document.xml.rels").unwrap().to_vec())
            .unwrap();
        assert!(rels.contains(r#"Target="media/image1.gif""#));
    }

    #[test]
    fn test_failed_image_leaves_gap() {
        let mut template = from_body(&paragraph("[{{Logo}}]"));
        template.apply(&params(json!({"Logo": {"$image": {"path": "/nonexistent/logo.png"}}})));
        assert_eq!(template.plaintext(), "[]");
    }

    #[test]
    fn test_image_shared_by_parts_is_stored_once() {
        let package = Package::from_parts([
            (MAIN_DOCUMENT, document(&paragraph("{{Logo}}"))),
            ("word/footer1.xml", format!("<w:ftr>{}</w:ftr>", paragraph("{{Logo}}"))),
            ("word/header1.xml", format!("<w:hdr>{}</w:hdr>", paragraph("{{Title}}"))),
            (crate::package::CONTENT_TYPES, r#"<Types xmlns="urn:ct" />"#.to_owned()),
        ]);
        let mut template = Template::open(package)
            .unwrap()
            .with_downloader(StaticDownloader);
        assert_eq!(
            template.apply(&params(json!({
                "Title": "Report",
                "Logo": {"$image": {"url": "https://example.com/logo.gif", "width": 1, "height": 1}}
            }))),
            3
        );

        let package = template.into_package();
        assert!(package.contains("word/media/image1.gif"));
        assert!(!package.contains("word/media/image2.gif"));
        assert!(!package.contains("word/_rels/header1.xml.rels"));
        for rels in ["word/_rels/document.xml.rels", "word/_rels/footer1.xml.rels"] {
            let xml = String::from_utf8(package.get(rels).unwrap().to_vec()).unwrap();
            assert!(xml.contains(r#"Target="media/image1.gif""#), "{rels}");
        }
        let types = String::from_utf8(package.get(crate::package::CONTENT_TYPES).unwrap().to_vec()).unwrap();
        assert_eq!(types.matches("image/gif").count(), 1);
    }
}
