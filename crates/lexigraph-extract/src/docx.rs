//! Word (`.docx`) extraction: the text runs of `word/document.xml`, one line
//! per paragraph.

use std::io::{Cursor, Read};

use quick_xml::{Reader, events::Event};

use crate::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";

/// Upper bound on the decompressed size of the document part.
const MAX_PART_BYTES: u64 = 50 * 1024 * 1024;

pub fn extract(bytes: &[u8]) -> Result<String> {
  let xml = read_document_part(bytes)?;
  paragraphs(&xml).map(|paragraphs| paragraphs.join("\n"))
}

fn read_document_part(bytes: &[u8]) -> Result<Vec<u8>> {
  let mut archive =
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| Error::Docx(e.to_string()))?;
  let part = archive
    .by_name(DOCUMENT_PART)
    .map_err(|e| Error::Docx(format!("{DOCUMENT_PART}: {e}")))?;

  let mut xml = Vec::new();
  part
    .take(MAX_PART_BYTES)
    .read_to_end(&mut xml)
    .map_err(|e| Error::Docx(e.to_string()))?;
  if xml.len() as u64 >= MAX_PART_BYTES {
    return Err(Error::Docx(format!("{DOCUMENT_PART} exceeds {MAX_PART_BYTES} bytes")));
  }
  Ok(xml)
}

/// Concatenated `<w:t>` text of every `<w:p>`, in document order. Tabs and
/// line breaks inside a paragraph are kept as `\t` and `\n`.
fn paragraphs(xml: &[u8]) -> Result<Vec<String>> {
  let mut reader = Reader::from_reader(xml);
  let mut buf = Vec::new();
  let mut paragraphs = Vec::new();
  let mut current = String::new();
  let mut in_text = false;

  loop {
    match reader.read_event_into(&mut buf) {
      Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text = true,
      Ok(Event::End(e)) => match e.local_name().as_ref() {
        b"t" => in_text = false,
        b"p" => paragraphs.push(std::mem::take(&mut current)),
        _ => {}
      },
      Ok(Event::Empty(e)) => match e.local_name().as_ref() {
        b"tab" => current.push('\t'),
        b"br" | b"cr" => current.push('\n'),
        b"p" => paragraphs.push(String::new()),
        _ => {}
      },
      Ok(Event::Text(t)) if in_text => {
        let text = t.unescape().map_err(|e| Error::Docx(e.to_string()))?;
        current.push_str(&text);
      }
      Ok(Event::Eof) => break,
      Err(e) => return Err(Error::Docx(e.to_string())),
      _ => {}
    }
    buf.clear();
  }

  Ok(paragraphs)
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use zip::write::SimpleFileOptions;

  use super::*;

  fn document_xml(body: &str) -> String {
    format!(
      r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
  }

  fn docx(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in parts {
      writer.start_file(*name, SimpleFileOptions::default()).unwrap();
      writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
  }

  #[test]
  fn paragraphs_are_joined_with_newlines() {
    let xml = document_xml(
      "<w:p><w:r><w:t>This is a </w:t></w:r><w:r><w:t>DOCX file.</w:t></w:r></w:p>\
       <w:p><w:r><w:t>Кот &amp; пёс.</w:t></w:r></w:p>",
    );
    let bytes = docx(&[(DOCUMENT_PART, &xml)]);
    assert_eq!(extract(&bytes).unwrap(), "This is a DOCX file.\nКот & пёс.");
  }

  #[test]
  fn empty_paragraphs_and_tabs_are_preserved() {
    let xml = document_xml(
      "<w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>c</w:t></w:r></w:p>",
    );
    let bytes = docx(&[(DOCUMENT_PART, &xml)]);
    assert_eq!(extract(&bytes).unwrap(), "a\tb\n\nc");
  }

  #[test]
  fn archive_without_document_part_is_rejected() {
    let bytes = docx(&[("word/styles.xml", "<w:styles/>")]);
    assert!(matches!(extract(&bytes), Err(Error::Docx(msg)) if msg.contains(DOCUMENT_PART)));
  }

  #[test]
  fn non_zip_input_is_rejected() {
    assert!(matches!(extract(b"plain text"), Err(Error::Docx(_))));
  }
}
