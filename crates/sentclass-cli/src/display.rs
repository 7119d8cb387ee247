//! Output rendering for classification results.
//!
//! JSON is the default and is what downstream services consume; the text
//! format is a compact human-readable listing.

use std::io::Write;

use clap::ValueEnum;
use sentclass_core::{ClassificationResult, DocumentResult};

const MAX_TEXT_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Text,
}

// ── Public API ──

/// Write one classification per input text.
pub fn write_preds(
    out: &mut impl Write,
    format: Format,
    texts: &[String],
    results: &[ClassificationResult],
) -> anyhow::Result<()> {
    match format {
        Format::Json => write_json(out, results),
        Format::Text => {
            for (i, (text, result)) in texts.iter().zip(results).enumerate() {
                writeln!(
                    out,
                    "{i:>4}  {:<10} {:.4}  {}",
                    result.predict,
                    result.score,
                    truncate(text)
                )?;
            }
            Ok(())
        }
    }
}

/// Write per-sentence classifications grouped by document.
pub fn write_documents(
    out: &mut impl Write,
    format: Format,
    documents: &[DocumentResult],
) -> anyhow::Result<()> {
    match format {
        Format::Json => write_json(out, documents),
        Format::Text => {
            for (i, doc) in documents.iter().enumerate() {
                writeln!(out, "=== document {i} ({} sentences) ===", doc.sentence_predictions.len())?;
                for sent in &doc.sentence_predictions {
                    writeln!(
                        out,
                        "  [{:>3}] {:<10} {:.4}  {}",
                        sent.index,
                        sent.predict,
                        sent.score,
                        truncate(&sent.text)
                    )?;
                }
            }
            Ok(())
        }
    }
}

// ── Helpers ──

fn write_json<T: serde::Serialize + ?Sized>(out: &mut impl Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Shorten text for display, on a char boundary.
fn truncate(text: &str) -> String {
    let flat = text.replace('\n', " ");
    match flat.char_indices().nth(MAX_TEXT_CHARS) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}
