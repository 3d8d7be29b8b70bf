//! Persona-driven section ranking over a document collection.
//!
//! A collection directory holds `challenge1b_input.json` naming a persona, a
//! job to be done and the PDFs under `PDFs/`. Every physical line long enough
//! to carry content becomes a section; sections are scored against the
//! persona query, the best few are reported and their sentences refined.
//!
//! Scoring sits behind [`RelevanceScorer`] so an embedding model can be
//! plugged in; [`LexicalScorer`] is the built-in term-frequency cosine.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RankingConfig;
use crate::error::{Error, Result};
use crate::model::RawLine;
use crate::parser;

/// Input file name inside a collection directory.
pub const INPUT_FILE: &str = "challenge1b_input.json";
/// Output file name inside a collection directory.
pub const OUTPUT_FILE: &str = "challenge1b_output.json";
/// Subdirectory holding the collection's PDFs.
pub const PDF_DIR: &str = "PDFs";

/// Parsed collection input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionSpec {
    pub persona: Persona,
    pub job_to_be_done: JobToBeDone,
    pub documents: Vec<DocumentRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Persona {
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobToBeDone {
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
}

impl CollectionSpec {
    /// Parse from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidInput(e.to_string()))
    }

    /// Read and parse a collection input file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Query text the sections are scored against.
    pub fn query(&self) -> String {
        format!("{}. Task: {}", self.persona.role, self.job_to_be_done.task)
    }

    /// Document file names in input order.
    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }
}

/// One candidate section: the text of a single physical line.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    pub document: String,
    /// 1-based page number
    pub page_number: u32,
    pub section_title: String,
    pub text: String,
}

/// A section together with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSection {
    pub section: SectionRecord,
    pub score: f32,
}

/// Similarity between a query and a piece of text.
pub trait RelevanceScorer {
    /// Cosine-style similarity in [-1, 1].
    fn similarity(&self, query: &str, text: &str) -> f32;
}

/// Cosine similarity over lowercase alphanumeric term counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    fn term_counts(text: &str) -> HashMap<String, f32> {
        let mut counts = HashMap::new();
        for term in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            *counts.entry(term.to_lowercase()).or_insert(0.0) += 1.0;
        }
        counts
    }
}

impl RelevanceScorer for LexicalScorer {
    fn similarity(&self, query: &str, text: &str) -> f32 {
        let q = Self::term_counts(query);
        let t = Self::term_counts(text);

        let dot: f32 = q
            .iter()
            .filter_map(|(term, qc)| t.get(term).map(|tc| qc * tc))
            .sum();
        let norm = |v: &HashMap<String, f32>| v.values().map(|c| c * c).sum::<f32>().sqrt();
        let denom = norm(&q) * norm(&t);
        if denom == 0.0 {
            0.0
        } else {
            dot / denom
        }
    }
}

/// Turn the physical lines of one document into candidate sections.
///
/// Lines must already carry 1-based page numbers.
pub fn section_records(document: &str, lines: &[RawLine], config: &RankingConfig) -> Vec<SectionRecord> {
    lines
        .iter()
        .filter_map(|line| {
            let parts: Vec<&str> = line
                .spans
                .iter()
                .map(|s| s.text.as_str())
                .filter(|t| t.trim().chars().count() > config.min_span_chars)
                .collect();
            if parts.is_empty() {
                return None;
            }

            let text = parts.join(" ").trim().to_string();
            let len = text.chars().count();
            if len <= config.min_section_chars || len >= config.max_section_chars {
                return None;
            }

            Some(SectionRecord {
                document: document.to_string(),
                page_number: line.page,
                section_title: text.chars().take(config.title_chars).collect(),
                text,
            })
        })
        .collect()
}

/// Score every section against the query, best first.
///
/// Equal scores keep their input order.
pub fn rank_sections<S: RelevanceScorer + ?Sized>(
    sections: Vec<SectionRecord>,
    query: &str,
    scorer: &S,
) -> Vec<ScoredSection> {
    let mut scored: Vec<ScoredSection> = sections
        .into_iter()
        .map(|section| ScoredSection {
            score: scorer.similarity(query, &section.text),
            section,
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Sentence-level passages of the top sections that match the query.
pub fn refine_sections<S: RelevanceScorer + ?Sized>(
    top: &[ScoredSection],
    query: &str,
    scorer: &S,
    config: &RankingConfig,
) -> Vec<SubsectionAnalysis> {
    let mut refined = Vec::new();
    for scored in top {
        for passage in scored.section.text.split(". ").map(str::trim) {
            if passage.chars().count() <= config.min_passage_chars {
                continue;
            }
            if scorer.similarity(query, passage) > config.similarity_threshold {
                refined.push(SubsectionAnalysis {
                    document: scored.section.document.clone(),
                    refined_text: passage.to_string(),
                    page_number: scored.section.page_number,
                });
            }
        }
    }
    refined
}

/// Output document of a ranking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingReport {
    pub metadata: RankingMetadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job_to_be_done: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedSection {
    pub document: String,
    pub section_title: String,
    /// 1-based rank
    pub importance_rank: usize,
    pub page_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub refined_text: String,
    pub page_number: u32,
}

/// Rank already extracted sections for a collection.
pub fn build_report<S: RelevanceScorer + ?Sized>(
    spec: &CollectionSpec,
    sections: Vec<SectionRecord>,
    scorer: &S,
    config: &RankingConfig,
) -> RankingReport {
    let query = spec.query();
    let mut ranked = rank_sections(sections, &query, scorer);
    ranked.truncate(config.top_n);
    let subsection_analysis = refine_sections(&ranked, &query, scorer, config);

    let extracted_sections = ranked
        .iter()
        .enumerate()
        .map(|(i, s)| ExtractedSection {
            document: s.section.document.clone(),
            section_title: s.section.section_title.clone(),
            importance_rank: i + 1,
            page_number: s.section.page_number,
        })
        .collect();

    RankingReport {
        metadata: RankingMetadata {
            input_documents: spec.filenames(),
            persona: spec.persona.role.clone(),
            job_to_be_done: spec.job_to_be_done.task.clone(),
            timestamp: Utc::now(),
        },
        extracted_sections,
        subsection_analysis,
    }
}

/// Rank one collection directory and write its output file.
///
/// A document that cannot be read is logged and contributes no sections.
pub fn process_collection<P, S>(dir: P, scorer: &S, config: &RankingConfig) -> Result<RankingReport>
where
    P: AsRef<Path>,
    S: RelevanceScorer + ?Sized,
{
    let dir = dir.as_ref();
    let spec = CollectionSpec::from_file(dir.join(INPUT_FILE))?;

    let mut sections = Vec::new();
    for filename in spec.filenames() {
        let path = dir.join(PDF_DIR).join(&filename);
        match parser::read_lines(&path, 1) {
            Ok(lines) => sections.extend(section_records(&filename, &lines, config)),
            Err(e) => log::warn!("skipping {}: {}", path.display(), e),
        }
    }
    log::debug!("{}: {} candidate sections", dir.display(), sections.len());

    let report = build_report(&spec, sections, scorer, config);
    let output = dir.join(OUTPUT_FILE);
    fs::write(&output, serde_json::to_string_pretty(&report)?)?;
    log::info!("Output written to {}", output.display());
    Ok(report)
}

/// Subdirectories of `base` that contain a collection input file, sorted.
pub fn find_collections<P: AsRef<Path>>(base: P) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(base)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.join(INPUT_FILE).is_file())
        .collect();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawSpan;
    use tempfile::TempDir;

    /// Scores by whether the text mentions a keyword.
    struct KeywordScorer(&'static str);

    impl RelevanceScorer for KeywordScorer {
        fn similarity(&self, _query: &str, text: &str) -> f32 {
            if text.contains(self.0) {
                0.9
            } else {
                0.1
            }
        }
    }

    fn section(document: &str, page: u32, text: &str) -> SectionRecord {
        SectionRecord {
            document: document.to_string(),
            page_number: page,
            section_title: text.to_string(),
            text: text.to_string(),
        }
    }

    fn spec() -> CollectionSpec {
        CollectionSpec::from_json(
            r#"{
                "challenge_info": {"challenge_id": "round_1b_002"},
                "documents": [{"filename": "a.pdf", "title": "A"}, {"filename": "b.pdf"}],
                "persona": {"role": "Travel Planner"},
                "job_to_be_done": {"task": "Plan a trip of 4 days"}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_spec_parsing_and_query() {
        let spec = spec();
        assert_eq!(spec.filenames(), ["a.pdf", "b.pdf"]);
        assert_eq!(spec.query(), "Travel Planner. Task: Plan a trip of 4 days");
    }

    #[test]
    fn test_spec_missing_fields() {
        let err = CollectionSpec::from_json(r#"{"documents": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_lexical_scorer() {
        let s = LexicalScorer;
        assert!((s.similarity("Beach Trip", "beach trip") - 1.0).abs() < 1e-6);
        assert_eq!(s.similarity("beach", "mountain"), 0.0);
        assert_eq!(s.similarity("", "anything"), 0.0);
        let partial = s.similarity("coastal beach guide", "beach towns and nightlife");
        assert!(partial > 0.0 && partial < 1.0);
    }

    #[test]
    fn test_section_records_bounds() {
        let config = RankingConfig::default();
        let lines = vec![
            RawLine::new(
                1,
                vec![
                    RawSpan::new("Coastal", 12.0, "Helvetica"),
                    RawSpan::new("  x  ", 12.0, "Helvetica"),
                    RawSpan::new("Adventures", 12.0, "Helvetica"),
                ],
            ),
            RawLine::single(1, "Short", 12.0),
            RawLine::single(2, "Tiny words", 12.0),
            RawLine::single(3, "a".repeat(300), 12.0),
            RawLine::single(3, format!("Long {}", "b".repeat(150)), 12.0),
        ];

        let records = section_records("guide.pdf", &lines, &config);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "Coastal Adventures");
        assert_eq!(records[0].page_number, 1);
        assert_eq!(records[1].section_title.chars().count(), 120);
        assert_eq!(records[1].text.chars().count(), 155);
    }

    #[test]
    fn test_rank_is_stable_and_descending() {
        let sections = vec![
            section("a.pdf", 1, "General notes"),
            section("a.pdf", 2, "Beach guide one"),
            section("b.pdf", 1, "Beach guide two"),
        ];
        let ranked = rank_sections(sections, "q", &KeywordScorer("Beach"));
        let texts: Vec<_> = ranked.iter().map(|s| s.section.text.as_str()).collect();
        assert_eq!(texts, ["Beach guide one", "Beach guide two", "General notes"]);
    }

    #[test]
    fn test_refine_keeps_long_matching_passages() {
        let long_match = format!("Beach {}", "sand ".repeat(20).trim());
        let long_other = format!("Museum {}", "art ".repeat(25).trim());
        let text = format!("{}. Short Beach bit. {}", long_match, long_other);
        let top = vec![ScoredSection {
            section: section("a.pdf", 4, &text),
            score: 0.9,
        }];

        let refined = refine_sections(&top, "q", &KeywordScorer("Beach"), &RankingConfig::default());
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].refined_text, long_match);
        assert_eq!(refined[0].page_number, 4);

        let strict = RankingConfig::new().with_threshold(0.95);
        assert!(refine_sections(&top, "q", &KeywordScorer("Beach"), &strict).is_empty());
        let loose = RankingConfig::new().with_threshold(0.05);
        assert_eq!(refine_sections(&top, "q", &KeywordScorer("Beach"), &loose).len(), 2);
    }

    #[test]
    fn test_build_report_top_n() {
        let sections = (0..8)
            .map(|i| section("a.pdf", i + 1, &format!("Beach section {}", i)))
            .collect();
        let report = build_report(&spec(), sections, &KeywordScorer("Beach"), &RankingConfig::default());

        assert_eq!(report.extracted_sections.len(), 5);
        let ranks: Vec<_> = report.extracted_sections.iter().map(|s| s.importance_rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4, 5]);
        assert_eq!(report.metadata.persona, "Travel Planner");
        assert_eq!(report.metadata.input_documents, ["a.pdf", "b.pdf"]);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["metadata"]["timestamp"].is_string());
        assert!(json["subsection_analysis"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_process_collection_with_missing_pdfs() {
        let base = TempDir::new().unwrap();
        let dir = base.path().join("travel");
        fs::create_dir(&dir).unwrap();
        fs::create_dir(base.path().join("unrelated")).unwrap();
        fs::write(
            dir.join(INPUT_FILE),
            r#"{"documents": [{"filename": "gone.pdf"}],
                "persona": {"role": "Analyst"},
                "job_to_be_done": {"task": "Review"}}"#,
        )
        .unwrap();

        assert_eq!(find_collections(base.path()).unwrap(), vec![dir.clone()]);

        let report = process_collection(&dir, &LexicalScorer, &RankingConfig::default()).unwrap();
        assert!(report.extracted_sections.is_empty());
        assert!(dir.join(OUTPUT_FILE).is_file());
    }
}
