//! PDF merge. Concatenates single-page PDFs from the renderer into one document.
//!
//! Each input is renumbered into a shared object space; its page tree is dropped and every
//! page is re-parented under one new `Pages` node. Attributes a page inherits from its old
//! tree (`MediaBox`, `Resources`, ...) are copied onto the page first.

use std::collections::BTreeMap;

use lopdf::{dictionary, Document, Object, ObjectId};

use crate::document::DocumentError;

const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];
/// Guards against cyclic `Parent` chains in malformed input.
const MAX_TREE_DEPTH: usize = 64;

/// Merges PDFs in the given order.
pub fn merge_pdfs<B: AsRef<[u8]>>(documents: &[B]) -> Result<Vec<u8>, DocumentError> {
    if documents.is_empty() {
        return Err(DocumentError::NoPages);
    }

    let mut next_id = 1;
    let mut page_ids: Vec<ObjectId> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for bytes in documents {
        let mut doc = Document::load_mem(bytes.as_ref())?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        for &page_id in &pages {
            inline_inherited(&mut doc, page_id)?;
        }
        page_ids.extend(pages);

        for (id, object) in doc.objects {
            match type_name(&object) {
                Some(b"Catalog" | b"Pages" | b"ObjStm" | b"XRef") => {}
                _ => {
                    objects.insert(id, object);
                }
            }
        }
    }

    if page_ids.is_empty() {
        return Err(DocumentError::NoPages);
    }

    let pages_id: ObjectId = (next_id, 0);
    let catalog_id: ObjectId = (next_id + 1, 0);

    for page_id in &page_ids {
        if let Some(Object::Dictionary(page)) = objects.get_mut(page_id) {
            page.set("Parent", pages_id);
        }
    }
    objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => page_ids.iter().map(|&id| Object::Reference(id)).collect::<Vec<_>>(),
        }),
    );
    objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        }),
    );

    let mut merged = Document::with_version("1.5");
    merged.objects = objects;
    merged.max_id = next_id + 1;
    merged.trailer.set("Root", catalog_id);
    merged.renumber_objects();

    let mut out = Vec::new();
    merged.save_to(&mut out)?;
    Ok(out)
}

fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    dict.get(b"Type").and_then(Object::as_name).ok()
}

fn inline_inherited(doc: &mut Document, page_id: ObjectId) -> Result<(), DocumentError> {
    let mut inherited: Vec<(&[u8], Object)> = Vec::new();
    let mut parent = doc
        .get_dictionary(page_id)?
        .get(b"Parent")
        .and_then(Object::as_reference)
        .ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(node_id) = parent else { break };
        let node = doc.get_dictionary(node_id)?;
        for key in INHERITABLE {
            if inherited.iter().all(|(k, _)| *k != key) {
                if let Ok(value) = node.get(key) {
                    inherited.push((key, value.clone()));
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        if !page.has(key) {
            page.set(key.to_vec(), value);
        }
    }
    Ok(())
}
