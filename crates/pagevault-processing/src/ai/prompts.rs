//! Prompt templates sent to the generative model.

/// Maximum characters of extracted text included in a summary prompt
pub const SUMMARY_MAX_INPUT_CHARS: usize = 30_000;

pub fn table_detection(page_text: &str) -> String {
    format!(
        "You are analyzing text extracted by OCR from a single document page.\n\
         Decide whether the page contains tabular data (rows and columns of related values).\n\
         Respond with JSON only, in exactly this shape:\n\
         {{\"tableDetected\": <true|false>, \"confidenceScore\": <number between 0 and 1>}}\n\n\
         Page text:\n{}",
        page_text
    )
}

pub fn html_generation(page_text: &str) -> String {
    format!(
        "The attached image is a scanned document page that contains one or more tables.\n\
         Reproduce the page as a complete, standalone HTML document. Use <table> elements for \
         tables and keep the original reading order. Use inline CSS only and no external \
         resources. Return only the HTML.\n\n\
         OCR text of the page, for reference:\n{}",
        page_text
    )
}

pub fn summary(text: &str) -> String {
    format!(
        "Summarize the following document in a few short paragraphs. Mention its purpose, \
         the key facts and figures, and any tables it contains. Respond in plain text.\n\n\
         Document text:\n{}",
        truncate_chars(text, SUMMARY_MAX_INPUT_CHARS)
    )
}

/// Cut `text` to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
