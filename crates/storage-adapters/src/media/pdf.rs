//! # PDF renderer
//!
//! Composes a badge onto a single page with `lopdf`.
//!
//! The page is either a fresh blank page or the first page of a template
//! document. The existing content is wrapped in `q`/`Q` so nothing it leaves
//! on the graphics state leaks into the name and code drawn on top. When
//! re-projection is requested, the finished page becomes a form XObject
//! drawn unscaled on the larger sheet, centered horizontally and aligned to
//! the top edge.

use domains::layout::{centered_origin, top_centered_offset};
use domains::{
    DocumentRenderer, DomainError, PageBase, PageSize, Placement, Raster, RenderPlan,
    RenderedDocument, Result, TemplateCode,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use super::font::{encode_win_ansi, PdfFont};

const NAME_FONT_RESOURCE: &str = "BadgeName";
const CODE_IMAGE_RESOURCE: &str = "BadgeCode";
const SHEET_RESOURCE: &str = "BadgeSheet";

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, plan: &RenderPlan) -> Result<RenderedDocument> {
        let (mut doc, page_id) = match &plan.base {
            PageBase::Blank(size) => blank_document(*size)?,
            PageBase::Template { code, document } => template_document(*code, document)?,
        };
        let pages_id = pages_root(&doc)?;
        let media_box = media_box(&doc, page_id)?;
        let badge_size = PageSize::new(media_box[2] - media_box[0], media_box[3] - media_box[1]);

        // Name: measured in the font it will be drawn in
        let (font, embedded_font_used) = PdfFont::load(&plan.font);
        let encoded_name = encode_win_ansi(&plan.holder_name);
        let name_width = font.width_of_text_at_size(&encoded_name, plan.font_size);
        let name_origin_x = centered_origin(&plan.name_field, name_width);
        let font_id = font.add_to(&mut doc);

        let image_id = doc.add_object(code_image(&plan.code));

        // Resources are inlined on the page so the additions never touch a
        // dictionary shared with other pages.
        let mut resources = inherited(&doc, page_id, b"Resources")
            .map(|res| resolve_dict(&doc, res))
            .transpose()?
            .unwrap_or_default();
        add_resource(&doc, &mut resources, b"Font", NAME_FONT_RESOURCE, font_id)?;
        add_resource(&doc, &mut resources, b"XObject", CODE_IMAGE_RESOURCE, image_id)?;

        let (llx, lly) = (media_box[0], media_box[1]);
        let overlay = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new("rg", vec![real(0.0), real(0.0), real(0.0)]),
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(NAME_FONT_RESOURCE.into()), real(plan.font_size)]),
                Operation::new("Td", vec![real(llx + name_origin_x), real(lly + plan.name_field.baseline_y)]),
                Operation::new("Tj", vec![Object::String(encoded_name, StringFormat::Literal)]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(plan.code_field.size),
                        real(0.0),
                        real(0.0),
                        real(plan.code_field.size),
                        real(llx + plan.code_field.x),
                        real(lly + plan.code_field.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(CODE_IMAGE_RESOURCE.into())]),
                Operation::new("Q", vec![]),
            ],
        };
        let prefix_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let overlay_id = doc.add_object(Stream::new(dictionary! {}, encode_content(overlay)?));

        let mut contents = vec![Object::Reference(prefix_id)];
        contents.extend(doc.get_page_contents(page_id).into_iter().map(Object::Reference));
        contents.push(Object::Reference(overlay_id));

        {
            let page = page_dict_mut(&mut doc, page_id)?;
            page.set("Parent", pages_id);
            page.set("MediaBox", rect(media_box));
            page.set("Resources", resources);
            page.set("Contents", contents);
        }

        let (output_page, page_size, badge) = match plan.reproject_onto {
            None => (
                page_id,
                badge_size,
                Placement { x: 0.0, y: 0.0, width: badge_size.width, height: badge_size.height },
            ),
            Some(sheet) => {
                let (dx, dy) = top_centered_offset(sheet, badge_size);
                let sheet_page = reproject(&mut doc, page_id, pages_id, media_box, sheet, (dx, dy))?;
                (
                    sheet_page,
                    sheet,
                    Placement { x: dx, y: dy, width: badge_size.width, height: badge_size.height },
                )
            }
        };

        // Single-page output
        {
            let pages = page_dict_mut(&mut doc, pages_id)?;
            pages.set("Kids", vec![Object::Reference(output_page)]);
            pages.set("Count", 1);
            pages.remove(b"Rotate");
        }
        doc.prune_objects();
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| DomainError::Render(format!("failed to serialize document: {e}")))?;

        debug!(
            width = page_size.width,
            height = page_size.height,
            name_width,
            embedded_font_used,
            "badge document rendered"
        );

        Ok(RenderedDocument {
            bytes,
            page_size,
            badge,
            name_origin_x,
            name_width,
            embedded_font_used,
        })
    }
}

fn render_err(e: lopdf::Error) -> DomainError {
    DomainError::Render(e.to_string())
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn rect(r: [f64; 4]) -> Vec<Object> {
    r.iter().map(|&v| real(v)).collect()
}

fn encode_content(content: Content) -> Result<Vec<u8>> {
    content.encode().map_err(render_err)
}

fn blank_document(size: PageSize) -> Result<(Document, ObjectId)> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => rect([0.0, 0.0, size.width, size.height]),
        "Contents" => Vec::<Object>::new(),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok((doc, page_id))
}

fn template_document(code: TemplateCode, bytes: &[u8]) -> Result<(Document, ObjectId)> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| DomainError::template(code, format!("unreadable document: {e}")))?;
    let page_id = doc
        .get_pages()
        .values()
        .next()
        .copied()
        .ok_or_else(|| DomainError::template(code, "document has no pages"))?;
    Ok((doc, page_id))
}

fn pages_root(doc: &Document) -> Result<ObjectId> {
    doc.catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(render_err)
}

fn page_dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary> {
    doc.get_object_mut(id)
        .and_then(Object::as_dict_mut)
        .map_err(render_err)
}

/// Looks an inheritable attribute (`MediaBox`, `Resources`) up on the page,
/// then on each ancestor.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok();
    // Guards against Parent cycles in malformed files.
    for _ in 0..64 {
        let dict = node?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|parent| doc.get_dictionary(parent))
            .ok();
    }
    None
}

fn deref<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).map_err(render_err),
        other => Ok(other),
    }
}

fn resolve_dict(doc: &Document, obj: &Object) -> Result<Dictionary> {
    deref(doc, obj)?.as_dict().cloned().map_err(render_err)
}

fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4]> {
    let raw = inherited(doc, page_id, b"MediaBox")
        .ok_or_else(|| DomainError::Render("page has no MediaBox".to_string()))?;
    let values = deref(doc, raw)?.as_array().map_err(render_err)?;
    if values.len() != 4 {
        return Err(DomainError::Render("malformed MediaBox".to_string()));
    }

    let mut out = [0.0; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = f64::from(deref(doc, value)?.as_float().map_err(render_err)?);
    }
    // Normalize to lower-left / upper-right.
    Ok([
        out[0].min(out[2]),
        out[1].min(out[3]),
        out[0].max(out[2]),
        out[1].max(out[3]),
    ])
}

/// Adds `name -> id` to the `category` sub-dictionary, inlining it first.
fn add_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    name: &str,
    id: ObjectId,
) -> Result<()> {
    let mut entries = match resources.get(category) {
        Ok(existing) => resolve_dict(doc, existing)?,
        Err(_) => Dictionary::new(),
    };
    entries.set(name, id);
    resources.set(category, entries);
    Ok(())
}

fn code_image(raster: &Raster) -> Stream {
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(raster.width),
            "Height" => i64::from(raster.height),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            // Keep module edges hard when the viewer scales the image.
            "Interpolate" => false,
        },
        raster.luma.clone(),
    )
    // Stored unfiltered so the samples read back byte for byte.
    .with_compression(false)
}

/// Concatenated, decoded content of every stream on the page.
fn page_content(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for id in doc.get_page_contents(page_id) {
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(render_err)?;
        let data = if stream.dict.has(b"Filter") {
            stream.decompressed_content().map_err(render_err)?
        } else {
            stream.content.clone()
        };
        out.extend_from_slice(&data);
        out.push(b'\n');
    }
    Ok(out)
}

/// Wraps the composed page in a form XObject and places it on a new page
/// of `sheet` size at `offset`. Returns the new page id.
fn reproject(
    doc: &mut Document,
    page_id: ObjectId,
    pages_id: ObjectId,
    media_box: [f64; 4],
    sheet: PageSize,
    offset: (f64, f64),
) -> Result<ObjectId> {
    let content = page_content(doc, page_id)?;
    let resources = doc
        .get_dictionary(page_id)
        .and_then(|page| page.get(b"Resources"))
        .cloned()
        .map_err(render_err)?;

    let form_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => rect(media_box),
            "Resources" => resources,
        },
        content,
    ));

    let placement = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    real(1.0),
                    real(0.0),
                    real(0.0),
                    real(1.0),
                    real(offset.0 - media_box[0]),
                    real(offset.1 - media_box[1]),
                ],
            ),
            Operation::new("Do", vec![Object::Name(SHEET_RESOURCE.into())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, encode_content(placement)?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => rect([0.0, 0.0, sheet.width, sheet.height]),
        "Resources" => dictionary! {
            "XObject" => dictionary! { SHEET_RESOURCE => form_id },
        },
        "Contents" => content_id,
    }))
}
