//! HTML templates for the upload console.

use crate::models::CandidateRow;
use crate::utils::html_escape;

/// Base HTML template.
pub fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - ocrelay</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <header id="main-header">
        <nav>
            <a href="/" class="logo">ocrelay</a>
        </nav>
    </header>
    <main>
        <h1>{}</h1>
        {}
    </main>
    <script src="/static/app.js"></script>
</body>
</html>"#,
        title, title, content
    )
}

/// Render the upload console page with the current queue snapshot.
pub fn index_page(rows: &[CandidateRow]) -> String {
    let file_items: String = rows.iter().map(file_row).collect();
    let process_disabled = if rows.is_empty() { " disabled" } else { "" };

    let content = format!(
        r#"<div id="gpu-info" class="device-box">
            <span id="device-info">Device: checking...</span>
        </div>
        <div id="message-container"></div>
        <div id="upload-area">
            <p>Drop images here or</p>
            <input type="file" id="file-input" accept="image/*" multiple>
            <p class="hint">Up to 5 files. PNG, JPG, TIFF or BMP.</p>
        </div>
        <div id="file-list">{}</div>
        <div class="actions">
            <button id="process-button"{}>Extract Text</button>
            <span id="process-loader" class="loader" style="display: none;"></span>
            <span id="processing-time"></span>
        </div>
        <div id="results-container" style="display: none;">
            <div id="results-toggle">Results</div>
            <div id="results-content">
                <div id="ocr-results"></div>
            </div>
        </div>"#,
        file_items, process_disabled
    );

    base_template("OCR Upload", &content)
}

/// Render one queue row.
fn file_row(row: &CandidateRow) -> String {
    let name = html_escape(&row.name);

    let mut extras = String::new();
    if let Some(artifact) = &row.artifact {
        extras.push_str(&format!(
            r#"<a class="view-pdf-button" href="{}" target="_blank">PDF</a>"#,
            html_escape(artifact)
        ));
    }
    if let Some(text) = &row.text {
        extras.push_str(&format!(
            r#"<div class="file-text"><pre>{}</pre></div>"#,
            html_escape(text)
        ));
    }
    if let Some(error) = &row.error {
        extras.push_str(&format!(
            r#"<span class="file-error">{}</span>"#,
            html_escape(error)
        ));
    }

    format!(
        r#"<div class="file-item" data-index="{}">
            <span class="file-name">{}</span>
            <span class="file-status {}">{}</span>
            {}
            <button class="remove-button" data-index="{}">Remove</button>
        </div>"#,
        row.index, name, row.status, row.status, extras, row.index
    )
}
