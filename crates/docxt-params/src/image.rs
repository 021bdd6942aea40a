//! Image parameter values.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Map key marking a serialized [`Image`].
pub const IMAGE_TAG: &str = "$image";

/// Image to insert in place of a placeholder.
///
/// Set either `path` or `url`; when both are set the local path wins. Width
/// and height are in points.
///
/// An image serializes to `{"$image": {...}}`, so it can sit anywhere inside
/// a serializable parameter struct and still be recognized as an image:
///
/// ```
/// use docxt_params::{Image, ParamKind, Params};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Card {
///     name: String,
///     photo: Image,
/// }
///
/// let card = Card {
///     name: "Alice".into(),
///     photo: Image::from_path("alice.png", 60, 80),
/// };
/// let params = Params::from_serialize(&card).unwrap();
/// assert!(matches!(params.get("photo").unwrap().kind(), ParamKind::Image(_)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub path: Option<String>,
    pub url: Option<String>,
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Deserialize)]
struct ImageFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

impl Image {
    /// Image read from a local file.
    pub fn from_path(path: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            path: Some(path.into()),
            url: None,
            width,
            height,
        }
    }

    /// Image fetched from a remote URL.
    pub fn from_url(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            path: None,
            url: Some(url.into()),
            width,
            height,
        }
    }

    /// Recognize the `{"$image": {...}}` shape.
    pub(crate) fn from_tagged(map: &Map<String, Value>) -> Option<Self> {
        if map.len() != 1 {
            return None;
        }
        let fields = map.get(IMAGE_TAG)?;
        match serde_json::from_value::<ImageFields>(fields.clone()) {
            Ok(fields) => Some(Self {
                path: fields.path.filter(|path| !path.is_empty()),
                url: fields.url.filter(|url| !url.is_empty()),
                width: fields.width,
                height: fields.height,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "Malformed image parameter");
                None
            }
        }
    }
}

impl Serialize for Image {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = ImageFields {
            path: self.path.clone(),
            url: self.url.clone(),
            width: self.width,
            height: self.height,
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(IMAGE_TAG, &fields)?;
        map.end()
    }
}
