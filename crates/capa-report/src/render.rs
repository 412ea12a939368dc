//! Message rendering.
//!
//! WhatsApp text uses `*bold*` and triple-backtick monospace. Text meant for
//! the Telegram operations chat is HTML, so sheet content is escaped there.

use crate::directory::Directory;
use crate::phone::is_valid_phone;
use crate::record::CapaRecord;
use crate::report::{Node, Report};
use crate::validation::CheckSummary;

const CALL_TO_ACTION: &str = "Apa ada progress terbaru? Mohon untuk diupdate ya";
const NO_CAPA: &str = "*No CAPA* 🥳";
const RULE: &str = "==========================";

/// Contact details resolved for one PIC. Unknown PICs get `-` everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    pub phone: String,
    pub superior: String,
    pub superior_phone: String,
}

impl Default for Contact {
    fn default() -> Self {
        Self {
            phone: "-".to_string(),
            superior: "-".to_string(),
            superior_phone: "-".to_string(),
        }
    }
}

impl Contact {
    pub fn resolve(directory: &Directory, pic: &str) -> Self {
        directory
            .lookup(pic)
            .map(|entry| Self {
                phone: entry.phone.clone(),
                superior: entry.superior.clone(),
                superior_phone: entry.superior_phone.clone(),
            })
            .unwrap_or_default()
    }
}

/// A rendered reminder for one PIC.
#[derive(Debug, Clone, PartialEq)]
pub enum Reminder {
    /// Ready for the reminder group; `mentions` are the phone numbers tagged in `text`.
    Mention { text: String, mentions: Vec<String> },
    /// The PIC cannot be tagged; HTML text for manual follow-up.
    Manual { text: String },
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// `*=== SOURCE ===*` blocks with monospace bullets, as sent to WhatsApp.
fn chat_sections(sources: &Node, out: &mut String) {
    for (source, items) in sources.children() {
        out.push_str(&format!("*=== {source} ===*\n"));
        for item in items.leaves() {
            out.push_str(&format!("```- {item}```\n"));
        }
        out.push('\n');
    }
}

/// Plain `=== SOURCE ===` blocks for Telegram, HTML-escaped.
fn html_sections(sources: &Node, out: &mut String, gap: bool) {
    for (source, items) in sources.children() {
        out.push_str(&format!("=== {} ===\n", escape_html(source)));
        for item in items.leaves() {
            out.push_str(&format!("- {}\n", escape_html(item)));
        }
        if gap {
            out.push('\n');
        }
    }
}

/// Render the reminder for `pic`. `sources` is the PIC's `source → lines` node.
pub fn render_reminder(pic: &str, sources: &Node, contact: &Contact) -> Reminder {
    if !is_valid_phone(&contact.phone) {
        let mut text = String::from("\n<b>✖️✖️ CAPA PIC Number ✖️✖️</b> \n\n");
        text.push_str(&format!("<b>PIC: {}</b> \n\n", escape_html(pic)));
        html_sections(sources, &mut text, true);
        text.push_str(CALL_TO_ACTION);
        text.push_str(" \n");
        text.push_str("----------------------------------------------------");
        return Reminder::Manual { text };
    }

    let phone = contact.phone.trim();
    let mut mentions = vec![phone.to_string()];
    let mut text = format!("*PIC: {pic} @{phone}* \n\n");
    chat_sections(sources, &mut text);
    text.push_str(CALL_TO_ACTION);

    if is_valid_phone(&contact.superior_phone) {
        let cc_phone = contact.superior_phone.trim();
        text.push_str(&format!("\n\ncc: {} @{cc_phone}", contact.superior));
        if cc_phone != phone {
            mentions.push(cc_phone.to_string());
        }
    }

    Reminder::Mention { text, mentions }
}

/// Warning body for open CAPAs that have no PIC at all.
pub fn render_unassigned(sources: &Node) -> String {
    let mut text = String::from("\n<b>✖️✖️ CAPA PIC ✖️✖️</b> \n\n");
    html_sections(sources, &mut text, false);
    text
}

/// Reply for `!getcapapic`. `report` is the PIC-filtered grouping.
pub fn render_pic_lookup(pic: &str, report: &Report) -> String {
    let mut text = format!("*PIC: {pic}*\n\n");
    match report.get(pic) {
        Some(sources) if sources.leaf_count() > 0 => chat_sections(sources, &mut text),
        _ => text.push_str(NO_CAPA),
    }
    text
}

/// Reply for `!getcapadept` and `!getcapaoverdue`.
pub fn render_department_lookup(dept: &str, report: &Report) -> String {
    let mut text = format!("*Department: {dept}*\n\n");
    match report.get(dept) {
        Some(pics) if pics.leaf_count() > 0 => {
            for (pic, sources) in pics.children() {
                text.push_str(&format!("*PIC: {pic}* \n"));
                chat_sections(sources, &mut text);
            }
        }
        _ => text.push_str(NO_CAPA),
    }
    text
}

/// Reply for `!checkcapa`.
pub fn render_check_summary(summary: &CheckSummary) -> String {
    format!(
        "CAPA tanpa status\nNo: *{}*\n{RULE}\n\
         CAPA Open tanpa PIC\nNo: *{}*\n{RULE}\n\
         CAPA Open tetapi PIC tidak terdaftar pada sheet PHONENUMBER\nInit: *{}*",
        summary.no_status.join(","),
        summary.open_without_pic.join(","),
        summary.unknown_pics.join(","),
    )
}

/// Warning body listing CAPAs whose target date could not be read.
pub fn render_unparseable_dates(records: &[CapaRecord]) -> String {
    let mut text = String::from("\n<b>✖️✖️ CAPA Target Date ✖️✖️</b> \n\n");
    for record in records {
        text.push_str(&format!(
            "No: {} | PIC: {} | Target: {}\n",
            escape_html(&record.number),
            escape_html(record.pic.as_deref().unwrap_or("NOPIC")),
            escape_html(record.target_date.as_deref().unwrap_or("-")),
        ));
    }
    text
}
