//! Upload notification email content.

use intake_core::NotificationMessage;

pub fn subject(message: &NotificationMessage) -> String {
    format!("New File Upload: {}", message.file_name)
}

pub fn html_body(message: &NotificationMessage) -> String {
    let name = escape(&message.file_name);
    let file_type = escape(&message.file_type);
    let url = escape(&message.public_url);

    format!(
        "<h2>New File Upload Notification</h2>\n\
         <p>A new file has been successfully uploaded:</p>\n\
         <ul>\n\
         <li><strong>File Name:</strong> {name}</li>\n\
         <li><strong>File Type:</strong> {file_type}</li>\n\
         <li><strong>File URL:</strong> <a href=\"{url}\">{url}</a></li>\n\
         </ul>\n\
         <p>This is an automated notification from the FTP intake relay.</p>\n"
    )
}

/// Plain-text alternative for transports that send multipart mail.
pub fn text_body(message: &NotificationMessage) -> String {
    format!(
        "New File Upload Notification\n\n\
         File Name: {}\n\
         File Type: {}\n\
         File URL: {}\n",
        message.file_name, message.file_type, message.public_url
    )
}

// File names come from untrusted clients.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
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
