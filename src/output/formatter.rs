//! Output formatters for console, JSON and Markdown

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::*;
use colored::{Color, Colorize};
use std::path::Path;

const PREVIEW_CHARS: usize = 160;

pub trait OutputFormatter {
    fn format_match(&self, response: &MatchResponse) -> Result<String>;
    fn format_batch(&self, response: &BatchResponse) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with optional colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for API integration and structured data
pub struct JsonFormatter {
    pretty: bool,
}

/// Markdown formatter for sharing results
pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: f64) -> String {
        let label = score_label(score);
        let color = match label {
            "STRONG" => Color::Green,
            "GOOD" => Color::BrightGreen,
            "FAIR" => Color::Yellow,
            _ => Color::Red,
        };

        if self.use_colors {
            format!("[{}]", label.color(color).bold())
        } else {
            format!("[{}]", label)
        }
    }

    fn format_skills(&self, skills: &SkillsBreakdown) -> String {
        let matched: Vec<String> = skills
            .matched
            .iter()
            .map(|s| self.colorize(s, Color::Green))
            .collect();
        let missing: Vec<String> = skills
            .missing
            .iter()
            .map(|s| self.colorize(s, Color::Red))
            .collect();

        format!(
            "Matched skills: {}\nMissing skills: {}\n",
            join_or_none(&matched),
            join_or_none(&missing)
        )
    }

    fn format_chunks(&self, chunks: &[crate::processing::chunk_index::RetrievedChunk]) -> String {
        let mut output = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            output.push_str(&format!(
                "  {}. ({:.2}) chars {}-{}: {}\n",
                i + 1,
                chunk.relevance,
                chunk.start_offset,
                chunk.end_offset,
                preview(&chunk.text)
            ));
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_match(&self, response: &MatchResponse) -> Result<String> {
        let mut output = String::new();
        let scores = &response.scores;

        output.push_str(&self.format_header("RESUME MATCH", 1));
        output.push_str(&format!(
            "Hybrid score: {:.1} {}\n",
            scores.hybrid_score,
            self.format_score_badge(scores.hybrid_score)
        ));

        output.push_str(&self.format_header("Score Breakdown", 2));
        output.push_str(&format!("Skills:   {:>6.1}\n", scores.skill_score));
        output.push_str(&format!("Lexical:  {:>6.1}\n", scores.lexical_score));
        output.push_str(&format!("Semantic: {:>6.1}\n", scores.semantic_score));

        output.push_str(&self.format_header("Skills", 2));
        output.push_str(&self.format_skills(&response.skills));

        if self.detailed {
            output.push_str(&format!("Resume skills: {}\n", join_or_none(&response.resume_skills)));
            output.push_str(&format!("Job skills:    {}\n", join_or_none(&response.job_skills)));

            output.push_str(&self.format_header("Extracted Fields", 2));
            output.push_str(&format!("Resume: {}\n", describe_fields(&response.resume_fields)));
            output.push_str(&format!("Job:    {}\n", describe_fields(&response.job_fields)));
        }

        output.push_str(&self.format_header("Most Relevant Passages", 2));
        output.push_str(&self.format_chunks(&response.top_chunks));

        output.push_str(&self.colorize(
            &format!(
                "\nProcessed in {} ms with {}\n",
                response.metadata.processing_time_ms, response.metadata.embedder
            ),
            Color::BrightBlack,
        ));

        Ok(output)
    }

    fn format_batch(&self, response: &BatchResponse) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("CANDIDATE RANKING", 1));
        let status = match response.status {
            crate::batch::BatchStatus::Completed => self.colorize("completed", Color::Green),
            crate::batch::BatchStatus::Partial => self.colorize("partial", Color::Yellow),
        };
        output.push_str(&format!(
            "Status: {} | Ranked: {} | Excluded: {}\n",
            status,
            response.ranked.len(),
            response.excluded_count
        ));

        for candidate in &response.ranked {
            output.push_str(&self.format_header(
                &format!("#{} {} ({:.1})", candidate.rank, candidate.identity, candidate.scores.hybrid_score),
                2,
            ));
            output.push_str(&format!(
                "Skills {:.1} | Lexical {:.1} | Semantic {:.1} {}\n",
                candidate.scores.skill_score,
                candidate.scores.lexical_score,
                candidate.scores.semantic_score,
                self.format_score_badge(candidate.scores.hybrid_score)
            ));
            output.push_str(&self.format_skills(&candidate.skills));
            if self.detailed {
                output.push_str(&format!("Document: {}\n", candidate.document_id));
                output.push_str(&format!("Fields: {}\n", describe_fields(&candidate.fields)));
                output.push_str(&self.format_chunks(&candidate.top_chunks));
            }
        }

        if !response.failures.is_empty() {
            output.push_str(&self.format_header("Excluded", 3));
            for failure in &response.failures {
                output.push_str(&format!(
                    "{} {} ({}): {}\n",
                    self.colorize("✗", Color::Red),
                    failure.identity,
                    failure.document_id,
                    failure.reason
                ));
            }
        }

        output.push_str(&self.colorize(
            &format!("\nFinished in {} ms\n", response.metadata.processing_time_ms),
            Color::BrightBlack,
        ));

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render<T: serde::Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_match(&self, response: &MatchResponse) -> Result<String> {
        self.render(response)
    }

    fn format_batch(&self, response: &BatchResponse) -> Result<String> {
        self.render(response)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn metadata(&self, metadata: &ReportMetadata) -> String {
        if !self.include_metadata {
            return String::new();
        }
        format!(
            "\n---\n*Generated {} by resume-ranker {} ({}, {} ms)*\n",
            metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            metadata.version,
            metadata.embedder,
            metadata.processing_time_ms
        )
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_match(&self, response: &MatchResponse) -> Result<String> {
        let scores = &response.scores;
        let mut md = String::new();

        md.push_str("# Resume Match\n\n");
        md.push_str(&format!(
            "**Hybrid score: {:.1}** ({})\n\n",
            scores.hybrid_score,
            score_label(scores.hybrid_score)
        ));
        md.push_str("| Signal | Score |\n|---|---|\n");
        md.push_str(&format!("| Skills | {:.1} |\n", scores.skill_score));
        md.push_str(&format!("| Lexical | {:.1} |\n", scores.lexical_score));
        md.push_str(&format!("| Semantic | {:.1} |\n\n", scores.semantic_score));

        md.push_str("## Skills\n\n");
        md.push_str(&format!("- Matched: {}\n", join_or_none(&response.skills.matched)));
        md.push_str(&format!("- Missing: {}\n\n", join_or_none(&response.skills.missing)));

        md.push_str("## Extracted Fields\n\n");
        md.push_str(&format!("- Resume: {}\n", describe_fields(&response.resume_fields)));
        md.push_str(&format!("- Job: {}\n\n", describe_fields(&response.job_fields)));

        md.push_str("## Most Relevant Passages\n\n");
        for chunk in &response.top_chunks {
            md.push_str(&format!("> {} *(relevance {:.2})*\n\n", preview(&chunk.text), chunk.relevance));
        }

        md.push_str(&self.metadata(&response.metadata));
        Ok(md)
    }

    fn format_batch(&self, response: &BatchResponse) -> Result<String> {
        let mut md = String::new();

        md.push_str("# Candidate Ranking\n\n");
        md.push_str(&format!(
            "Status: **{}** | Excluded: {}\n\n",
            match response.status {
                crate::batch::BatchStatus::Completed => "completed",
                crate::batch::BatchStatus::Partial => "partial",
            },
            response.excluded_count
        ));

        md.push_str("| # | Candidate | Hybrid | Skills | Lexical | Semantic | Missing skills |\n");
        md.push_str("|---|---|---|---|---|---|---|\n");
        for candidate in &response.ranked {
            md.push_str(&format!(
                "| {} | {} | {:.1} | {:.1} | {:.1} | {:.1} | {} |\n",
                candidate.rank,
                candidate.identity,
                candidate.scores.hybrid_score,
                candidate.scores.skill_score,
                candidate.scores.lexical_score,
                candidate.scores.semantic_score,
                join_or_none(&candidate.skills.missing)
            ));
        }

        if !response.failures.is_empty() {
            md.push_str("\n## Excluded\n\n");
            for failure in &response.failures {
                md.push_str(&format!("- {} (`{}`): {}\n", failure.identity, failure.document_id, failure.reason));
            }
        }

        md.push_str(&self.metadata(&response.metadata));
        Ok(md)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    pub fn with_options(use_colors: bool, detailed: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    fn formatter(&self, format: OutputFormat) -> &dyn OutputFormatter {
        match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        }
    }

    pub fn generate_match(&self, response: &MatchResponse, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_match(response)
    }

    pub fn generate_batch(&self, response: &BatchResponse, format: OutputFormat) -> Result<String> {
        self.formatter(format).format_batch(response)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

fn join_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

fn describe_fields(fields: &crate::processing::fields::DocumentFields) -> String {
    let mut parts = Vec::new();
    if let Some(degree) = &fields.degree {
        parts.push(degree.clone());
    }
    if let Some(branch) = &fields.branch {
        parts.push(branch.clone());
    }
    if let Some(cgpa) = fields.cgpa {
        parts.push(format!("CGPA {:.2}", cgpa));
    }
    if let Some(years) = fields.experience_years {
        parts.push(format!("{} yrs experience", years));
    }
    if parts.is_empty() {
        "none detected".to_string()
    } else {
        parts.join(", ")
    }
}
