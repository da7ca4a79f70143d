//! Terminal rendering for analyses, evidence, and system status.
//!
//! The analysis text is printed verbatim; evidence follows as one card per
//! retrieved section headed `Section {id}: {offense_name}`.

use std::fmt::Write;

use nyaya_advisor::{Consultation, SystemStatus};
use nyaya_core::Document;

const INDENT: &str = "    ";

// ── Public API ──

pub fn print_consultation(c: &Consultation) {
    print!("{}", render_consultation(c));
}

pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("Error: {err}");
}

pub fn print_status(status: &SystemStatus, corpus_dir: &str) {
    print!("{}", render_status(status, corpus_dir));
}

// ── Rendering ──

fn render_consultation(c: &Consultation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Legal Analysis ===");
    let _ = writeln!(out, "{}", c.answer.text.trim_end());
    let _ = writeln!(out);
    out.push_str(&render_evidence(&c.evidence));
    let _ = writeln!(
        out,
        "({} · {})",
        c.answer.model,
        c.answered_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    out
}

fn render_evidence(docs: &[Document]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Source Sections (Evidence) ===");
    if docs.is_empty() {
        let _ = writeln!(out, "{INDENT}no matching sections in the corpus");
        let _ = writeln!(out);
        return out;
    }
    for doc in docs {
        let _ = writeln!(out, "{}", doc.citation());
        for line in doc.content.lines() {
            let _ = writeln!(out, "{INDENT}{line}");
        }
        let _ = writeln!(out);
    }
    out
}

fn render_status(status: &SystemStatus, corpus_dir: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== System Status ===");

    match &status.corpus {
        Ok(n) => {
            let _ = writeln!(out, "  {:<12} connected (local, {n} sections)", "Database");
        }
        Err(e) => {
            let _ = writeln!(out, "  {:<12} unavailable: {e}", "Database");
        }
    }
    let _ = writeln!(out, "  {:<12} {corpus_dir}", "Path");

    match &status.model_server {
        Ok(s) if s.model_ready => {
            let _ = writeln!(out, "  {:<12} {} (offline, {})", "Model", s.model, s.url);
        }
        Ok(s) => {
            let _ = writeln!(
                out,
                "  {:<12} {} not installed at {}; run `ollama pull {}`",
                "Model", s.model, s.url, s.model
            );
        }
        Err(e) => {
            let _ = writeln!(out, "  {:<12} unreachable: {e}", "Model");
        }
    }
    let _ = writeln!(out, "  {:<12} Bharatiya Nyaya Sanhita, 2023", "Data source");
    out
}
