//! Human-readable files bundled into archives.

/// README for an image-only archive.
pub(crate) fn images_readme(source: &str, export_date: &str, total_images: usize) -> String {
    format!(
        r#"# Image export

**Source:** {source}
**Export date:** {export_date}
**Images:** {total_images}

## Layout

- `manifest.json` - metadata for every image (hash, page, type, size)
- `page_NNN_hash_XXXXXXXX.<ext>` - original images from the document

## Referencing images from RAG documents

Every RAG document built from an image element carries an `image_hash`
attribute. Look the hash up in `manifest.json` to find the file:

```json
{{
  "metadataAttributes": {{
    "image_hash": "abc123...",
    "image_url": "s3://your-bucket/images/{source}/page_001_hash_abc12345.png"
  }}
}}
```

The images can also stay local: the RAG documents already contain the
searchable text, the hashes and the page metadata.
"#
    )
}

/// Import guide for a knowledge-base import package.
pub(crate) fn import_guide(
    source: &str,
    export_date: &str,
    document_count: usize,
    image_count: usize,
    described: bool,
) -> String {
    let described = if described { "yes" } else { "no" };
    format!(
        r#"# Knowledge base import package

## Contents

```
rag_data.jsonl          RAG documents, one JSON object per line
rag_data_preview.json   first documents as a pretty JSON array
images/                 original images, page_NNN_XXXXXXXX.<ext>
manifest.json           metadata and hash-to-file mapping
IMPORT_GUIDE.md         this file
```

## Import

1. Unpack the archive.
2. Load `manifest.json`.
3. Read `rag_data.jsonl` line by line; each line is one document with
   `metadataAttributes` and `content`.
4. Resolve image references through `manifest.json`: every entry of
   `images` maps a `hash` to a `filename` under `images/`.

## Hash-based image references

In a RAG document:

```json
{{
  "metadataAttributes": {{ "image_hash": "abc12345def67890", "image_available": true, "page": 5 }},
  "content": "Bar chart showing..."
}}
```

In the manifest:

```json
{{ "hash": "abc12345def67890", "filename": "images/page_005_abc12345.png" }}
```

## Package statistics

- **Source:** {source}
- **Export date:** {export_date}
- **RAG documents:** {document_count}
- **Images:** {image_count}
- **Image descriptions:** {described}
"#
    )
}
