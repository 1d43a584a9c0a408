use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::form::{format_amount, InvoiceForm};

const BUSINESS_NAME: &str = "Pest Control Service";

/// Paths of one exported memo.
#[derive(Debug, Clone)]
pub struct ExportedMemo {
    pub markdown: PathBuf,
    pub pdf: PathBuf,
}

/// Writes memos as Markdown and hands them to pandoc for a printable PDF
pub struct MemoGenerator {
    output_dir: PathBuf,
}

impl MemoGenerator {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let path = output_dir.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create memo directory {}", path.display()))?;
        }

        Ok(Self {
            output_dir: path.to_path_buf(),
        })
    }

    /// Export the form. Once the files are written the form has no further
    /// stake in them.
    pub fn export_or_print(&self, form: &InvoiceForm) -> Result<ExportedMemo> {
        let markdown = render_markdown(form);

        let (mut file, md_path, pdf_path) = self.create_memo_file(form.header().date)?;
        file.write_all(markdown.as_bytes())?;

        let pdf_result = Command::new("pandoc")
            .arg(&md_path)
            .arg("-o")
            .arg(&pdf_path)
            .output();

        match pdf_result {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                let error = String::from_utf8_lossy(&output.stderr);
                warn!("pandoc failed to produce a PDF: {}", error.trim());
                fs::copy(&md_path, &pdf_path)?;
            }
            Err(e) => {
                warn!("could not run pandoc: {}", e);
                fs::copy(&md_path, &pdf_path)?;
            }
        }

        info!(path = %md_path.display(), total = form.grand_total(), "memo exported");

        Ok(ExportedMemo {
            markdown: md_path,
            pdf: pdf_path,
        })
    }
}

impl MemoGenerator {
    /// Claim the first free `memo_<date>_<n>` stem, counting from 1. The
    /// Markdown file is created exclusively so no earlier memo is overwritten.
    fn create_memo_file(&self, date: NaiveDate) -> Result<(File, PathBuf, PathBuf)> {
        let date = date.format("%Y%m%d");
        for n in 1u32.. {
            let stem = format!("memo_{}_{}", date, n);
            let md_path = self.output_dir.join(format!("{}.md", stem));
            let pdf_path = self.output_dir.join(format!("{}.pdf", stem));
            if pdf_path.exists() {
                continue;
            }

            match OpenOptions::new().write(true).create_new(true).open(&md_path) {
                Ok(file) => return Ok((file, md_path, pdf_path)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create {}", md_path.display()));
                }
            }
        }
        anyhow::bail!("No free memo file name in {}", self.output_dir.display())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Markdown body of the memo
pub fn render_markdown(form: &InvoiceForm) -> String {
    let header = form.header();
    let mut content = String::new();

    content.push_str(&format!("# {}\n\n", BUSINESS_NAME));
    content.push_str("## Cash Memo\n");
    content.push_str(&format!("Date: {}\n\n", header.date.format("%d/%m/%Y")));

    content.push_str(&format!("**Customer:** {}<br>\n", escape(&header.customer_name)));
    content.push_str(&format!("**Address:** {}<br>\n", escape(&header.customer_address)));
    content.push_str(&format!("**Phone:** {}\n\n", escape(&header.customer_phone)));

    content.push_str("<table style=\"width: 100%; border-collapse: collapse;\">\n");
    content.push_str("<tr>\n");
    content.push_str("<th style=\"text-align: left;\">Sl. No.</th>\n");
    content.push_str("<th style=\"text-align: left;\">Description</th>\n");
    content.push_str("<th style=\"text-align: right;\">Qty</th>\n");
    content.push_str("<th style=\"text-align: right;\">Rate</th>\n");
    content.push_str("<th style=\"text-align: right;\">Total</th>\n");
    content.push_str("</tr>\n");

    for item in form.items() {
        content.push_str("<tr>\n");
        content.push_str(&format!("<td>{}</td>\n", item.serial));
        content.push_str(&format!("<td>{}</td>\n", escape(&item.description)));
        content.push_str(&format!("<td style=\"text-align: right;\">{}</td>\n", escape(&item.quantity)));
        content.push_str(&format!("<td style=\"text-align: right;\">{}</td>\n", escape(&item.unit_price)));
        content.push_str(&format!("<td style=\"text-align: right;\">{}</td>\n", format_amount(item.row_total())));
        content.push_str("</tr>\n");
    }

    content.push_str("<tr>\n");
    content.push_str("<td colspan=\"4\" style=\"text-align: right;\">Total</td>\n");
    content.push_str(&format!(
        "<td style=\"text-align: right; font-weight: bold;\">{}</td>\n",
        format_amount(form.grand_total())
    ));
    content.push_str("</tr>\n");
    content.push_str("</table>\n");

    content
}
