//! Image parameters: package bookkeeping and inline markup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use docxt_params::{Image, Params, Placeholder, key};
use docxt_xml::{Document, wordml};

use crate::download::Downloader;
use crate::error::ImageError;
use crate::package::{CONTENT_TYPES, Package};

/// Relationship type of embedded images.
const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
/// Namespace of relationship parts.
const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
/// Extension used when the source has none.
const FALLBACK_EXTENSION: &str = "png";

/// Turns an image descriptor into inline markup for a document part.
pub trait ImageResolver {
    /// Store the image for `part` and return the markup that shows it.
    ///
    /// # Errors
    ///
    /// Returns an error when the image bytes cannot be obtained.
    fn resolve(&mut self, image: &Image, part: &str) -> Result<String, ImageError>;
}

/// [`ImageResolver`] that embeds images into a [`Package`].
///
/// Image bytes go to `word/media/`, the extension is registered in
/// `[Content_Types].xml` and a relationship is added to the rels part of the
/// document part being processed. An image used by several parts is stored
/// once; each part gets its own relationship to it.
pub struct PackageImageResolver<'a> {
    package: &'a mut Package,
    downloader: &'a dyn Downloader,
    media: HashMap<String, String>,
}

impl<'a> PackageImageResolver<'a> {
    pub fn new(package: &'a mut Package, downloader: &'a dyn Downloader) -> Self {
        Self {
            package,
            downloader,
            media: HashMap::new(),
        }
    }

    pub fn package(&self) -> &Package {
        self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        self.package
    }

    /// Media part holding the image, embedding it on first use.
    fn media_part(&mut self, image: &Image) -> Result<String, ImageError> {
        let (source, bytes) = match (&image.path, &image.url) {
            (Some(path), _) => {
                if let Some(part) = self.media.get(path) {
                    return Ok(part.clone());
                }
                let bytes = fs::read(path).map_err(|source| ImageError::Read {
                    path: path.clone(),
                    source,
                })?;
                (path, bytes)
            }
            (None, Some(url)) => {
                if let Some(part) = self.media.get(url) {
                    return Ok(part.clone());
                }
                let file = self.downloader.download(url)?;
                let bytes = fs::read(file.path()).map_err(|source| ImageError::Read {
                    path: file.path().display().to_string(),
                    source,
                })?;
                (url, bytes)
            }
            (None, None) => return Err(ImageError::MissingSource),
        };

        let extension = extension_of(source);
        let part = self.next_media_name(&extension);
        self.package.set(part.clone(), bytes);
        self.register_content_type(&extension);
        self.media.insert(source.clone(), part.clone());
        tracing::debug!(source = %source, part = %part, "Embedded image");
        Ok(part)
    }

    fn next_media_name(&self, extension: &str) -> String {
        (1..)
            .map(|n| format!("word/media/image{n}.{extension}"))
            .find(|name| !self.package.contains(name))
            .unwrap_or_default()
    }

    fn register_content_type(&mut self, extension: &str) {
        let Some(mut types) = self.load_xml(CONTENT_TYPES) else {
            tracing::warn!("Package has no readable content types part");
            return;
        };
        let root = types.root();
        let known = types.children(root).iter().any(|&node| {
            types
                .attr(node, "Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if known {
            return;
        }
        let default = types.create_element("Default");
        types.set_attr(default, "Extension", extension);
        types.set_attr(default, "ContentType", content_type(extension));
        types.append_child(root, default);
        self.package.set(CONTENT_TYPES, types.to_xml());
    }

    /// Add an image relationship to the rels part of `part`.
    fn add_relationship(&mut self, part: &str, target: &str) -> String {
        let rels_name = rels_part(part);
        let mut rels = self.load_xml(&rels_name).unwrap_or_else(|| {
            let mut doc = Document::new("Relationships");
            let root = doc.root();
            doc.set_attr(root, "xmlns", RELATIONSHIPS_NAMESPACE);
            doc
        });
        let root = rels.root();

        let next = rels
            .children(root)
            .iter()
            .filter_map(|&node| rels.attr(node, "Id")?.strip_prefix("rId")?.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{next}");

        let relationship = rels.create_element("Relationship");
        rels.set_attr(relationship, "Id", id.as_str());
        rels.set_attr(relationship, "Type", IMAGE_RELATIONSHIP);
        rels.set_attr(relationship, "Target", target);
        rels.append_child(root, relationship);
        self.package.set(rels_name, rels.to_xml());
        id
    }

    fn load_xml(&self, name: &str) -> Option<Document> {
        let bytes = self.package.get(name)?;
        let xml = std::str::from_utf8(bytes).ok()?;
        Document::parse(xml).ok()
    }
}

impl ImageResolver for PackageImageResolver<'_> {
    fn resolve(&mut self, image: &Image, part: &str) -> Result<String, ImageError> {
        let media = self.media_part(image)?;
        let target = relative_target(part, &media);
        let id = self.add_relationship(part, &target);
        Ok(inline_markup(&id, image.width, image.height))
    }
}

/// Resolve the image parameters referenced by placeholders in `text`, the
/// content of `part`.
///
/// Images that fail are logged and become empty text values. Images the part
/// does not reference are left unresolved.
pub fn resolve_images(
    params: &mut Params,
    resolver: &mut dyn ImageResolver,
    part: &str,
    text: &str,
) {
    let referenced: Vec<String> = Placeholder::scan(text)
        .iter()
        .flat_map(|token| params.resolve(token.key()))
        .map(|param| param.absolute_key().to_owned())
        .collect();
    if referenced.is_empty() {
        return;
    }

    params.walk_mut(|param| {
        let Some(image) = param.image().cloned() else {
            return;
        };
        let used = referenced
            .iter()
            .any(|prefix| key::has_prefix(param.absolute_key(), prefix));
        if !used {
            return;
        }
        match resolver.resolve(&image, part) {
            Ok(markup) => param.resolve_image(markup),
            Err(err) => {
                tracing::warn!(
                    key = %param.absolute_key(),
                    error = %err,
                    "Failed to resolve image, leaving a gap"
                );
                param.drop_image();
            }
        }
    });
}

/// VML picture sized in points.
fn inline_markup(relationship: &str, width: u32, height: u32) -> String {
    format!(
        r#"<w:pict><v:shape style="width:{width}pt;height:{height}pt"><v:imagedata r:id="{relationship}" /></v:shape></w:pict>"#
    )
}

/// `word/document.xml` → `word/_rels/document.xml.rels`.
fn rels_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Media path relative to the directory of `part`.
fn relative_target(part: &str, media: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, _)) => media
            .strip_prefix(dir)
            .and_then(|rest| rest.strip_prefix('/'))
            .map_or_else(|| format!("/{media}"), str::to_owned),
        None => media.to_owned(),
    }
}

fn extension_of(source: &str) -> String {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(char::is_alphanumeric))
        .map_or_else(|| FALLBACK_EXTENSION.to_owned(), str::to_ascii_lowercase)
}

fn content_type(extension: &str) -> String {
    match extension {
        "jpg" | "jpeg" => "image/jpeg".to_owned(),
        "svg" => "image/svg+xml".to_owned(),
        "tif" | "tiff" => "image/tiff".to_owned(),
        other => format!("image/{other}"),
    }
}

/// Whether any parameter is an image.
pub(crate) fn has_images(params: &Params) -> bool {
    let mut found = false;
    params.walk(|param| found |= param.image().is_some());
    found
}

/// Split a text node around inline image markup.
///
/// `pieces` alternate between text and markup; text pieces become new text
/// nodes, markup pieces are grafted in place, and the original node is
/// deleted. Returns the first inserted node, if any.
pub(crate) fn splice_pieces(
    doc: &mut Document,
    text: docxt_xml::NodeId,
    pieces: &[Piece],
) -> Option<docxt_xml::NodeId> {
    let mut anchor = text;
    let mut first = None;
    for piece in pieces {
        let inserted: Vec<docxt_xml::NodeId> = match piece {
            Piece::Text(value) if value.is_empty() => continue,
            Piece::Text(value) => {
                let node = doc.create_element(wordml::TEXT);
                doc.set_text(node, value.as_str());
                wordml::preserve_space(doc, node);
                vec![node]
            }
            Piece::Markup(markup) => match Document::parse_fragment(markup) {
                Ok(fragment) => fragment
                    .children(fragment.root())
                    .iter()
                    .map(|&child| doc.import(&fragment, child))
                    .collect(),
                Err(err) => {
                    tracing::warn!(error = %err, "Invalid image markup");
                    continue;
                }
            },
        };
        for node in inserted {
            doc.insert_after(anchor, node);
            anchor = node;
            first.get_or_insert(node);
        }
    }
    doc.delete(text);
    first
}

/// Segment of a text node being split around images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Text(String),
    Markup(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DownloadError;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct StaticDownloader(Vec<u8>);

    impl Downloader for StaticDownloader {
        fn download(&self, _url: &str) -> Result<NamedTempFile, DownloadError> {
            let mut file = NamedTempFile::new()?;
            file.write_all(&self.0)?;
            Ok(file)
        }
    }

    fn package() -> Package {
        Package::from_parts([
            (
                CONTENT_TYPES,
                r#"<Types xmlns="urn:ct"><Default Extension="xml" ContentType="application/xml" /></Types>"#,
            ),
            (
                "word/_rels/document.xml.rels",
                r#"<Relationships xmlns="urn:rels"><Relationship Id="rId1" Type="t" Target="styles.xml" /><Relationship Id="rId7" Type="t" Target="x.xml" /></Relationships>"#,
            ),
        ])
    }

    #[test]
    fn test_resolve_downloaded_image() {
        let mut package = package();
        let downloader = StaticDownloader(vec![0x89, b'P', b'N', b'G']);
        let mut resolver = PackageImageResolver::new(&mut package, &downloader);

        let image = Image::from_url("https://example.com/logo.PNG?size=2", 25, 30);
        let markup = resolver.resolve(&image, "word/document.xml").unwrap();

        assert_eq!(
            markup,
            r#"<w:pict><v:shape style="width:25pt;height:30pt"><v:imagedata r:id="rId8" /></v:shape></w:pict>"#
        );
        assert_eq!(
            package.get("word/media/image1.png"),
            Some(&[0x89, b'P', b'N', b'G'][..])
        );
        let types = String::from_utf8(package.get(CONTENT_TYPES).unwrap().to_vec()).unwrap();
        assert!(types.contains(r#"<Default Extension="png" ContentType="image/png" />"#));
        let rels = String::from_utf8(package.get("word/_rels/document.xml.rels").unwrap().to_vec())
            .unwrap();
        assert!(rels.contains(r#"Id="rId8""#));
        assert!(rels.contains(r#"Target="media/image1.png""#));
    }

    #[test]
    fn test_same_image_is_embedded_once() {
        let mut package = package();
        let downloader = StaticDownloader(vec![1]);
        let mut resolver = PackageImageResolver::new(&mut package, &downloader);
        let image = Image::from_url("https://example.com/a.jpg", 1, 1);

        resolver.resolve(&image, "word/document.xml").unwrap();
        resolver.resolve(&image, "word/header1.xml").unwrap();

        assert!(package.contains("word/media/image1.jpg"));
        assert!(!package.contains("word/media/image2.jpg"));
        assert!(package.contains("word/_rels/header1.xml.rels"));
        let types = String::from_utf8(package.get(CONTENT_TYPES).unwrap().to_vec()).unwrap();
        assert_eq!(types.matches("image/jpeg").count(), 1);
    }

    #[test]
    fn test_missing_local_file_fails() {
        let mut package = package();
        let downloader = StaticDownloader(Vec::new());
        let mut resolver = PackageImageResolver::new(&mut package, &downloader);
        let result = resolver.resolve(&Image::from_path("/nonexistent/a.png", 1, 1), "word/document.xml");
        assert!(matches!(result, Err(ImageError::Read { .. })));
    }

    #[test]
    fn test_failed_image_becomes_gap() {
        let mut params = Params::from_value(serde_json::json!({
            "Logo": {"$image": {}}
        }))
        .unwrap();
        let mut package = package();
        let downloader = StaticDownloader(Vec::new());
        let mut resolver = PackageImageResolver::new(&mut package, &downloader);

        resolve_images(&mut params, &mut resolver, "word/document.xml", "{{Logo}}");

        let logo = params.get("Logo").unwrap();
        assert_eq!(logo.image(), None);
        assert_eq!(logo.value(), "");
    }

    #[test]
    fn test_only_referenced_images_are_resolved() {
        let mut params = Params::from_value(serde_json::json!({
            "Logo": Image::from_url("https://example.com/logo.gif", 1, 1),
            "Users": [{"Avatar": Image::from_url("https://example.com/a.gif", 2, 2)}],
        }))
        .unwrap();
        let mut package = package();
        let downloader = StaticDownloader(vec![7]);
        let mut resolver = PackageImageResolver::new(&mut package, &downloader);

        resolve_images(
            &mut params,
            &mut resolver,
            "word/document.xml",
            "Avatar: {{Users.Avatar}}",
        );

        assert!(!params.get("Logo").unwrap().is_resolved_image());
        assert!(params.get("Users.1.Avatar").unwrap().is_resolved_image());
        assert!(package.contains("word/media/image1.gif"));
        assert!(!package.contains("word/media/image2.gif"));
    }

    #[test]
    fn test_part_paths() {
        assert_eq!(rels_part("word/footer2.xml"), "word/_rels/footer2.xml.rels");
        assert_eq!(relative_target("word/document.xml", "word/media/a.png"), "media/a.png");
        assert_eq!(extension_of("images/Avatar.JPEG"), "jpeg");
        assert_eq!(extension_of("https://example.com/download"), "png");
    }

    #[test]
    fn test_splice_pieces() {
        let mut doc = Document::parse("<w:p><w:r><w:t>A {{Logo}} B</w:t></w:r></w:p>").unwrap();
        let text = doc.find_first(doc.root(), &["w:t"]).unwrap();
        splice_pieces(
            &mut doc,
            text,
            &[
                Piece::Text("A ".to_owned()),
                Piece::Markup("<w:pict />".to_owned()),
                Piece::Text(" B".to_owned()),
            ],
        );
        assert_eq!(
            doc.to_xml(),
            r#"<w:p><w:r><w:t xml:space="preserve">A </w:t><w:pict /><w:t xml:space="preserve"> B</w:t></w:r></w:p>"#
        );
    }
}
