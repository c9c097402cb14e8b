//! Text extraction for uploaded documents (PDF, DOCX, plain text).
//!
//! Extraction turns raw [`Document`] bytes into one UTF-8 string. Texts are
//! concatenated in document order with no separator. Any unreadable
//! document aborts the whole batch with [`Error::Extraction`] naming it.

use anyhow::{bail, Context};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use docqa_core::models::{Document, DocumentFormat};
use docqa_core::{Error, Result};

use crate::config::IngestConfig;

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extract the text of a single document.
pub fn extract_text(doc: &Document) -> Result<String> {
    match doc.format {
        DocumentFormat::Pdf => extract_pdf(&doc.bytes),
        DocumentFormat::Docx => extract_docx(&doc.bytes),
        DocumentFormat::Text => String::from_utf8(doc.bytes.clone())
            .map_err(|e| format!("not valid UTF-8: {}", e)),
    }
    .map_err(|message| Error::extraction(&doc.name, message))
}

/// Extract and concatenate the text of every document, in order.
///
/// An empty slice yields an empty string.
pub fn extract_all(docs: &[Document]) -> Result<String> {
    let mut text = String::new();
    for doc in docs {
        let part = extract_text(doc)?;
        debug!(document = %doc.name, format = doc.format.as_str(), chars = part.chars().count(), "extracted");
        text.push_str(&part);
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> std::result::Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| format!("PDF extraction failed: {}", e))
}

fn extract_docx(bytes: &[u8]) -> std::result::Result<String, String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| format!("DOCX extraction failed: {}", e))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| "word/document.xml not found".to_string())?;
    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| format!("DOCX extraction failed: {}", e))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(format!(
            "word/document.xml exceeds size limit ({} bytes)",
            MAX_XML_ENTRY_BYTES
        ));
    }
    docx_paragraphs(&doc_xml)
}

/// Collect `<w:t>` runs, one line per `<w:p>` paragraph.
fn docx_paragraphs(xml: &[u8]) -> std::result::Result<String, String> {
    use quick_xml::events::Event;

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::Text(te)) if in_text => {
                let text = te
                    .unescape()
                    .map_err(|e| format!("DOCX extraction failed: {}", e))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"tab" => current.push('\t'),
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("DOCX extraction failed: {}", e)),
            _ => {}
        }
        buf.clear();
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}

/// Read documents from disk.
///
/// Files are taken as given; directories are walked recursively and
/// filtered by the configured include/exclude globs, in sorted order.
/// Arguments are processed in the order they were passed.
pub fn load_documents(paths: &[PathBuf], ingest: &IngestConfig) -> anyhow::Result<Vec<Document>> {
    let include_set = build_globset(&ingest.include_globs)?;
    let exclude_set = build_globset(&ingest.exclude_globs)?;

    let mut docs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = Vec::new();
            for entry in WalkDir::new(path).follow_links(ingest.follow_symlinks) {
                let entry = entry?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry.path().strip_prefix(path).unwrap_or(entry.path());
                let rel_str = relative.to_string_lossy();
                if exclude_set.is_match(rel_str.as_ref()) || !include_set.is_match(rel_str.as_ref())
                {
                    continue;
                }
                found.push(entry.path().to_path_buf());
            }
            found.sort();
            for file in found {
                docs.push(read_document(&file)?);
            }
        } else if path.is_file() {
            docs.push(read_document(path)?);
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }
    Ok(docs)
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let format = DocumentFormat::from_extension(&ext).ok_or_else(|| {
        Error::extraction(
            &name,
            format!("unsupported file type '{}' (expected pdf, docx, txt, or md)", ext),
        )
    })?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Document {
        name,
        format,
        bytes,
    })
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, format: DocumentFormat, bytes: &[u8]) -> Document {
        Document {
            name: name.to_string(),
            format,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn invalid_pdf_names_document() {
        let err = extract_text(&doc("act.pdf", DocumentFormat::Pdf, b"not a pdf")).unwrap_err();
        match err {
            Error::Extraction { document, .. } => assert_eq!(document, "act.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let err = extract_text(&doc("act.docx", DocumentFormat::Docx, b"not a zip")).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn invalid_utf8_text_is_error() {
        let err = extract_text(&doc("notes.txt", DocumentFormat::Text, &[0xff, 0xfe, 0x00])).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn concatenates_without_separator() {
        let docs = vec![
            doc("a.txt", DocumentFormat::Text, b"first"),
            doc("b.txt", DocumentFormat::Text, b"second"),
        ];
        assert_eq!(extract_all(&docs).unwrap(), "firstsecond");
    }

    #[test]
    fn empty_batch_is_empty_text() {
        assert_eq!(extract_all(&[]).unwrap(), "");
    }

    #[test]
    fn one_bad_document_aborts_batch() {
        let docs = vec![
            doc("a.txt", DocumentFormat::Text, b"fine"),
            doc("b.pdf", DocumentFormat::Pdf, b"broken"),
        ];
        assert!(extract_all(&docs).is_err());
    }

    #[test]
    fn paragraphs_become_lines() {
        let xml = br#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>Section 1</w:t></w:r><w:r><w:t xml:space="preserve"> Title</w:t></w:r></w:p><w:p><w:r><w:t>Body &amp; more</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(docx_paragraphs(xml).unwrap(), "Section 1 Title\nBody & more");
    }
}
