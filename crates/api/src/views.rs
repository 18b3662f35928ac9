//! Server-side HTML views.

use axum::response::Html;

use seedscan_common::types::{JobSnapshot, JobStatus};

/// Seconds between automatic reloads of an unfinished job page.
const REFRESH_SECS: u32 = 5;

fn page(title: &str, head_extra: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n{head_extra}</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape(title),
    ))
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn upload_form() -> Html<String> {
    page(
        "SeedScan: upload",
        "",
        "<h1>Check balances</h1>\n\
         <p>Upload a text file with one mnemonic phrase per line.</p>\n\
         <form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".txt,text/plain\" required>\n\
         <button type=\"submit\">Upload</button>\n\
         </form>",
    )
}

pub fn job_submitted(job: &JobSnapshot) -> Html<String> {
    let body = format!(
        "<h1>Job submitted</h1>\n\
         <p>Job <code>{id}</code> is processing <code>{input}</code>.</p>\n\
         <p>Results will be written to <code>{output}</code>.</p>\n\
         <p><a href=\"/jobs/{id}\">Follow progress</a></p>",
        id = job.id,
        input = escape(&job.input_file),
        output = escape(&job.output_file),
    );
    page("SeedScan: job submitted", "", &body)
}

pub fn job_status(job: &JobSnapshot) -> Html<String> {
    let refresh = if job.status.is_finished() {
        String::new()
    } else {
        format!("<meta http-equiv=\"refresh\" content=\"{REFRESH_SECS}\">\n")
    };

    let mut body = format!(
        "<h1>Job {id}</h1>\n\
         <p>Status: <strong>{status}</strong></p>\n\
         <ul>\n\
         <li>Phrases: {processed} / {total}</li>\n\
         <li>Balances checked: {checked}</li>\n\
         <li>Balances saved: {saved}</li>\n\
         </ul>",
        id = job.id,
        status = job.status,
        processed = job.progress.processed,
        total = job.progress.total,
        checked = job.progress.checked,
        saved = job.progress.saved,
    );

    if let Some(error) = &job.error {
        body.push_str(&format!("\n<p>Error: {}</p>", escape(error)));
    }

    if matches!(job.status, JobStatus::Completed | JobStatus::Cancelled) {
        body.push_str(&format!(
            "\n<p><a href=\"/download/{name}\">Download {name}</a></p>",
            name = escape(&job.output_file),
        ));
    } else if !job.status.is_finished() {
        body.push_str(&format!(
            "\n<form method=\"post\" action=\"/jobs/{}/cancel\">\
             <button type=\"submit\">Cancel</button></form>",
            job.id
        ));
    }

    page("SeedScan: job status", &refresh, &body)
}
