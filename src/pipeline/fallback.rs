//! Page-concatenation fallback: append every page of every source verbatim.
//!
//! Used when the pdfium rasteriser is unavailable (or explicitly forced).
//! No layout, no image work — lopdf copies the page objects of each source
//! into one document, offsetting object IDs so references never collide.
//! A source that fails to parse is logged and skipped, matching the grid
//! path's per-source failure policy.

use crate::error::{MergeError, SourceError};
use crate::pipeline::input::StagedSource;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Result of a concatenation merge.
#[derive(Debug)]
pub struct ConcatOutcome {
    pub pdf: Vec<u8>,
    pub merged_sources: usize,
    pub pages: usize,
    pub skipped: Vec<SourceError>,
}

/// Concatenate all pages of all staged sources, in source order.
pub fn concat_pages(staged: &[StagedSource]) -> Result<ConcatOutcome, MergeError> {
    let mut loaded = Vec::with_capacity(staged.len());
    let mut skipped = Vec::new();

    for source in staged {
        match Document::load(&source.path) {
            Ok(doc) => loaded.push(doc),
            Err(e) => {
                let err = SourceError::ParseFailed {
                    index: source.index,
                    filename: source.filename.clone(),
                    detail: e.to_string(),
                };
                warn!("Skipping source: {err}");
                skipped.push(err);
            }
        }
    }

    if loaded.is_empty() {
        return Err(MergeError::EmptyOutput {
            total: staged.len(),
        });
    }
    let merged_sources = loaded.len();

    // The first parsable source becomes the destination; the rest are
    // appended with their object IDs shifted past the current maximum.
    let mut dest = loaded.remove(0);
    let mut page_order = page_refs(&dest);

    for source in loaded {
        let offset = dest.max_id;
        let source_pages = page_refs(&source);

        let mut shifted: BTreeMap<ObjectId, Object> = BTreeMap::new();
        for (id, object) in source.objects {
            shifted.insert((id.0 + offset, id.1), shift_refs(object, offset));
        }
        dest.objects.extend(shifted);

        page_order.extend(source_pages.iter().map(|id| (id.0 + offset, id.1)));
        dest.max_id = (source.max_id + offset).max(dest.max_id);
    }

    let pages = page_order.len();
    rewrite_page_tree(&mut dest, page_order)?;
    dest.compress();

    let mut pdf = Vec::new();
    dest.save_to(&mut pdf)
        .map_err(|e| MergeError::Assemble(format!("save failed: {e}")))?;

    info!(
        "Concatenated {} pages from {} sources ({} skipped)",
        pages,
        merged_sources,
        skipped.len()
    );

    Ok(ConcatOutcome {
        pdf,
        merged_sources,
        pages,
        skipped,
    })
}

/// All page object IDs of a document, in page order.
fn page_refs(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Recursively shift every object reference by `offset`.
fn shift_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(items) => {
            Object::Array(items.into_iter().map(|o| shift_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = shift_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = shift_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the destination's page tree at the combined page list.
fn rewrite_page_tree(doc: &mut Document, page_order: Vec<ObjectId>) -> Result<(), MergeError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| MergeError::Assemble(format!("no document catalog: {e}")))?;

    let pages_id = doc
        .objects
        .get(&catalog_id)
        .ok_or_else(|| MergeError::Assemble("catalog object missing".into()))?
        .as_dict()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| MergeError::Assemble(format!("no page tree root: {e}")))?;

    match doc.objects.get_mut(&pages_id) {
        Some(Object::Dictionary(pages_dict)) => {
            let kids: Vec<Object> = page_order.iter().map(|&id| Object::Reference(id)).collect();
            pages_dict.set("Count", Object::Integer(kids.len() as i64));
            pages_dict.set("Kids", Object::Array(kids));
            Ok(())
        }
        _ => Err(MergeError::Assemble("page tree root is not a dictionary".into())),
    }
}
