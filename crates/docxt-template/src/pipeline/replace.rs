//! Placeholder substitution in text nodes and attribute values.

use docxt_params::{ParamKind, Params, Placeholder, Trigger};
use docxt_xml::merge::MARKER_OPEN;
use docxt_xml::wordml::{self, TEXT};
use docxt_xml::{Document, NodeId, Walk};

use super::triggers;
use crate::images::{Piece, splice_pieces};

/// Value a single placeholder is replaced by.
enum Substitution {
    Text(String),
    Markup(String),
}

/// Trigger to evaluate once the walk is over.
struct Fired {
    text: NodeId,
    run: Option<NodeId>,
    trigger: Trigger,
    value: String,
}

impl Fired {
    fn evaluate(&self, doc: &mut Document) {
        let origin = if doc.is_live(self.text) {
            Some(self.text)
        } else {
            self.run
        };
        if let Some(origin) = origin {
            triggers::evaluate(doc, origin, self.trigger, &self.value);
        }
    }
}

/// Replace placeholders that address one parameter by its absolute key.
///
/// Scalars take their formatted value, `{{#Key}}` takes the key segment and
/// resolved images are spliced in as markup. Lists, objects and unknown keys
/// are left for later passes. Returns the number of replaced placeholders.
pub(crate) fn replace_singles(doc: &mut Document, params: &Params) -> usize {
    let root = doc.root();
    let mut replaced = 0;
    let mut fired = Vec::new();

    replaced += replace_in_attrs(doc, root, params);
    doc.walk(root, |doc, node| {
        replaced += replace_in_attrs(doc, node, params);
        if doc.tag(node) == TEXT {
            replaced += replace_in_text(doc, node, params, &mut fired);
        }
        Walk::Continue
    });

    for trigger in &fired {
        trigger.evaluate(doc);
    }
    replaced
}

fn substitution(token: &Placeholder, params: &Params) -> Option<(Substitution, String)> {
    let param = params.get(token.key())?;
    if token.is_key() {
        if param.is_list() {
            return None;
        }
        let key = param.key().to_owned();
        return Some((Substitution::Text(token.format(&key)), key));
    }
    let value = param.value().to_owned();
    let substitution = match param.kind() {
        ParamKind::Scalar => Substitution::Text(token.format(&value)),
        ParamKind::Image(_) if param.is_resolved_image() => Substitution::Markup(value.clone()),
        ParamKind::Image(_) => Substitution::Text(String::new()),
        ParamKind::Object | ParamKind::List => return None,
    };
    Some((substitution, value))
}

fn replace_in_text(
    doc: &mut Document,
    text: NodeId,
    params: &Params,
    fired: &mut Vec<Fired>,
) -> usize {
    let original = doc.text(text).to_owned();
    if !original.contains(MARKER_OPEN) {
        return 0;
    }

    let run = doc.parent(text);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut last = 0;
    let mut replaced = 0;

    for token in Placeholder::scan(&original) {
        let Some((substitution, value)) = substitution(&token, params) else {
            continue;
        };
        let span = token.span();
        current.push_str(&original[last..span.start]);
        match substitution {
            Substitution::Text(value) => current.push_str(&value),
            Substitution::Markup(markup) => {
                pieces.push(Piece::Text(std::mem::take(&mut current)));
                pieces.push(Piece::Markup(markup));
            }
        }
        last = span.end;
        replaced += 1;
        if let Some(trigger) = token.trigger() {
            fired.push(Fired {
                text,
                run,
                trigger,
                value,
            });
        }
    }
    if replaced == 0 {
        return 0;
    }
    current.push_str(&original[last..]);

    if pieces.is_empty() {
        doc.set_text(text, current);
        wordml::preserve_space(doc, text);
    } else {
        pieces.push(Piece::Text(current));
        splice_pieces(doc, text, &pieces);
    }
    replaced
}

/// Replace scalar placeholders inside attribute values.
fn replace_in_attrs(doc: &mut Document, node: NodeId, params: &Params) -> usize {
    let mut replaced = 0;
    let updates: Vec<(usize, String)> = doc
        .attrs(node)
        .iter()
        .enumerate()
        .filter(|(_, attr)| attr.value.contains(MARKER_OPEN))
        .filter_map(|(index, attr)| {
            let mut out = String::new();
            let mut last = 0;
            let mut count = 0;
            for token in Placeholder::scan(&attr.value) {
                let Some((Substitution::Text(value), _)) = substitution(&token, params) else {
                    continue;
                };
                let span = token.span();
                out.push_str(&attr.value[last..span.start]);
                out.push_str(&value);
                last = span.end;
                count += 1;
            }
            if count == 0 {
                return None;
            }
            out.push_str(&attr.value[last..]);
            replaced += count;
            Some((index, out))
        })
        .collect();

    let attrs = doc.attrs_mut(node);
    for (index, value) in updates {
        attrs[index].value = value;
    }
    replaced
}

/// Replace `{{Key sep}}` placeholders by every matching value joined with
/// the separator.
///
/// List positions continue across branches, so `{{#Users.Friends , }}`
/// numbers all friends of all users in one sequence. Returns the number of
/// replaced placeholders.
pub(crate) fn replace_inline(doc: &mut Document, params: &Params) -> usize {
    let root = doc.root();
    let mut replaced = 0;
    let mut fired = Vec::new();

    for text in doc.find_all(root, &[TEXT]) {
        let original = doc.text(text).to_owned();
        let mut out = String::new();
        let mut last = 0;
        let mut count = 0;

        for token in Placeholder::scan(&original) {
            let Some(separator) = token.separator() else {
                continue;
            };
            let Some(values) = inline_values(&token, params) else {
                continue;
            };
            let joined = values.join(separator);
            let span = token.span();
            out.push_str(&original[last..span.start]);
            out.push_str(&joined);
            last = span.end;
            count += 1;
            if let Some(trigger) = token.trigger() {
                fired.push(Fired {
                    text,
                    run: doc.parent(text),
                    trigger,
                    value: joined,
                });
            }
        }
        if count > 0 {
            out.push_str(&original[last..]);
            doc.set_text(text, out);
            wordml::preserve_space(doc, text);
            replaced += count;
        }
    }

    for trigger in &fired {
        trigger.evaluate(doc);
    }
    replaced
}

/// Formatted values, or positions for `{{#Key sep}}`, of an inline token.
///
/// `None` when nothing matches the key. A matched list without items yields
/// no values.
fn inline_values(token: &Placeholder, params: &Params) -> Option<Vec<String>> {
    let found = params.find_all_by_key(token.key());
    if found.is_empty() {
        return None;
    }
    let mut values = Vec::new();
    for found in found {
        let param = found.param;
        if param.is_list() {
            for item in param.children() {
                if token.is_key() {
                    values.push(item.key().to_owned());
                } else if item.kind() == &ParamKind::Scalar {
                    values.push(token.format(item.value()));
                }
            }
        } else if token.is_key() {
            values.push(found.index.to_string());
        } else if param.kind() == &ParamKind::Scalar {
            values.push(token.format(param.value()));
        }
    }
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn params() -> Params {
        Params::from_value(json!({
            "Name": "lorem ipsum",
            "Empty": "",
            "Link": "https://example.com",
            "Numbers": [1, 2, 3],
            "Tags": [],
            "Users": [
                {"Name": "Ann", "Friends": [{"Name": "Bob"}, {"Name": "Cid"}]},
                {"Name": "Dan", "Friends": [{"Name": "Eve"}]}
            ]
        }))
        .unwrap()
    }

    fn render(xml: &str, pass: fn(&mut Document, &Params) -> usize) -> String {
        let mut doc = Document::parse(xml).unwrap();
        pass(&mut doc, &params());
        doc.to_xml()
    }

    #[test]
    fn test_scalar_with_formatters() {
        assert_eq!(
            render(
                "<w:p><w:r><w:t>{{Name :upper}} / {{Name :capitalize}} / {{Name :title}}</w:t></w:r></w:p>",
                replace_singles
            ),
            "<w:p><w:r><w:t>LOREM IPSUM / Lorem ipsum / Lorem Ipsum</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_unknown_and_list_placeholders_stay() {
        let xml = "<w:p><w:r><w:t>{{Undefined}} {{Users.Name}} {{#Users}} {{Users.1}}</w:t></w:r></w:p>";
        assert_eq!(render(xml, replace_singles), xml);
    }

    #[test]
    fn test_absolute_key_and_item_position() {
        assert_eq!(
            render(
                "<w:p><w:r><w:t>{{#Users.2}}: {{Users.2.Friends.1.Name}}</w:t></w:r></w:p>",
                replace_singles
            ),
            "<w:p><w:r><w:t>2: Eve</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_leading_space_is_preserved() {
        assert_eq!(
            render("<w:p><w:r><w:t>{{Empty}} tail</w:t></w:r></w:p>", replace_singles),
            r#"<w:p><w:r><w:t xml:space="preserve"> tail</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_attribute_placeholder() {
        assert_eq!(
            render(
                r#"<w:hyperlink w:tooltip="Go to {{Link}}" w:anchor="{{Missing}}"><w:r><w:t>x</w:t></w:r></w:hyperlink>"#,
                replace_singles
            ),
            r#"<w:hyperlink w:tooltip="Go to https://example.com" w:anchor="{{Missing}}"><w:r><w:t>x</w:t></w:r></w:hyperlink>"#
        );
    }

    #[test]
    fn test_trigger_after_replacement() {
        assert_eq!(
            render(
                "<w:body><w:p><w:r><w:t>{{Empty :empty:remove:row}}</w:t></w:r></w:p><w:p><w:r><w:t>{{Name :empty:remove:row}}</w:t></w:r></w:p></w:body>",
                replace_singles
            ),
            "<w:body><w:p><w:r><w:t>lorem ipsum</w:t></w:r></w:p></w:body>"
        );
    }

    #[test]
    fn test_resolved_image_is_spliced() {
        let mut params = Params::from_value(json!({"Logo": {"$image": {"path": "a.png"}}})).unwrap();
        params.walk_mut(|param| {
            if param.image().is_some() {
                param.resolve_image("<w:pict />");
            }
        });
        let mut doc = Document::parse("<w:p><w:r><w:t>See {{Logo}}.</w:t></w:r></w:p>").unwrap();
        replace_singles(&mut doc, &params);
        assert_eq!(
            doc.to_xml(),
            r#"<w:p><w:r><w:t xml:space="preserve">See </w:t><w:pict /><w:t>.</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_inline_list() {
        assert_eq!(
            render(
                "<w:p><w:r><w:t>{{Numbers , }} | {{#Numbers ; }} | {{Users.Friends.Name :upper}}</w:t></w:r></w:p>",
                replace_inline
            ),
            "<w:p><w:r><w:t>1, 2, 3 | 1; 2; 3 | {{Users.Friends.Name :upper}}</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_inline_nested_running_index() {
        assert_eq!(
            render(
                "<w:p><w:r><w:t>{{Users.Friends.Name , }} ({{#Users.Friends.Name ,}})</w:t></w:r></w:p>",
                replace_inline
            ),
            "<w:p><w:r><w:t>Bob, Cid, Eve (1,2,3)</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn test_inline_without_matches_stays() {
        let xml = "<w:p><w:r><w:t>{{Missing , }}</w:t></w:r></w:p>";
        assert_eq!(render(xml, replace_inline), xml);
    }

    #[test]
    fn test_inline_empty_list_is_replaced_and_fires_trigger() {
        assert_eq!(
            render(
                "<w:body><w:p><w:r><w:t>Tags: {{Tags , }}</w:t></w:r></w:p><w:p><w:r><w:t>Gone {{Tags , :empty:remove:row}}</w:t></w:r></w:p></w:body>",
                replace_inline
            ),
            r#"<w:body><w:p><w:r><w:t xml:space="preserve">Tags: </w:t></w:r></w:p></w:body>"#
        );
    }
}
