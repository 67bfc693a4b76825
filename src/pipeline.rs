use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::allocator::allocate;
use crate::error::Result;
use crate::extractor::{is_receipt_file, Extractor};
use crate::ledger::LedgerWriter;
use crate::models::ReceiptId;
use crate::parser::StructuredParser;

pub const RUN_LOG_NAME: &str = "run_log.txt";

/// Append-only run log. Opened, appended and closed per message, same as
/// the rest of the run: single process, single thread.
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, message: &str) -> std::io::Result<()> {
        let timestamp = chrono::Local::now().format("[%Y-%m-%d %H:%M:%S]");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{timestamp} {message}")
    }
}

/// Where a file ended up. Nothing beyond the log line and the file's new
/// location persists this.
#[derive(Debug)]
pub enum PipelineOutcome {
    Success(ReceiptId),
    Failure(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub archived: usize,
    pub errored: usize,
}

/// Drives one pass over the watched folder: extract, parse, allocate,
/// append, then archive or quarantine. Collaborators are injected so the
/// whole pipeline runs against fakes in tests.
pub struct Pipeline {
    extractor: Extractor,
    parser: StructuredParser,
    ledger: Box<dyn LedgerWriter>,
    folder: PathBuf,
}

impl Pipeline {
    pub fn new(
        extractor: Extractor,
        parser: StructuredParser,
        ledger: Box<dyn LedgerWriter>,
        folder: PathBuf,
    ) -> Self {
        Self {
            extractor,
            parser,
            ledger,
            folder,
        }
    }

    /// Process every eligible file once, sequentially, in listing order.
    /// A file's failure moves it to `errors/` and the run keeps going;
    /// only failures outside the per-file step (folder creation, the log
    /// itself, the final move) abort the run.
    pub fn run(&self) -> Result<RunSummary> {
        let archive_folder = self.folder.join("archive");
        let error_folder = self.folder.join("errors");
        std::fs::create_dir_all(&archive_folder)?;
        std::fs::create_dir_all(&error_folder)?;
        let log = RunLog::new(self.folder.join(RUN_LOG_NAME));

        let mut summary = RunSummary::default();
        for entry in std::fs::read_dir(&self.folder)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name == RUN_LOG_NAME || !is_receipt_file(&path) {
                continue;
            }

            println!("Processing: {name}");
            summary.processed += 1;

            match self.process_file(&path, &log) {
                PipelineOutcome::Success(id) => {
                    std::fs::rename(&path, archive_folder.join(&name))?;
                    log.append(&format!("Processed and archived: {name} as {id}"))?;
                    println!("  {} archived as {id}", "ok".green());
                    summary.archived += 1;
                }
                PipelineOutcome::Failure(reason) => {
                    std::fs::rename(&path, error_folder.join(&name))?;
                    log.append(&format!("Failed to process {name}: {reason}"))?;
                    println!("  {} {reason}", "failed:".red());
                    summary.errored += 1;
                }
            }
        }

        Ok(summary)
    }

    /// The per-file catch-all: every stage error collapses to a Failure.
    fn process_file(&self, path: &Path, log: &RunLog) -> PipelineOutcome {
        match self.try_process(path, log) {
            Ok(id) => PipelineOutcome::Success(id),
            Err(e) => PipelineOutcome::Failure(e.to_string()),
        }
    }

    fn try_process(&self, path: &Path, log: &RunLog) -> Result<ReceiptId> {
        let text = self.extractor.extract(path)?;
        let parsed = self.parser.parse(&text)?;
        log.append(&format!("Parsed using {}", parsed.model))?;
        let id = ReceiptId::generate();
        let rows = allocate(&id, &parsed.receipt)?;
        self.ledger.append(&rows)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::error::{ParseError, WriteError};
    use crate::extractor::{OcrEngine, PageRasterizer};
    use crate::llm::LlmClient;
    use crate::models::AllocatedRow;

    const GOOD_JSON: &str = r#"{
        "Store name": "TraderJoes",
        "Purchase date": "2025-11-02",
        "Total amount": 15.00,
        "Tax total": 1.00,
        "Items": [
            {"Item": "Bananas", "Category": "Groceries", "Price": 5.00, "Taxable": false},
            {"Item": "Shampoo", "Category": "Health", "Price": 9.00, "Taxable": true}
        ]
    }"#;

    /// Echoes file bytes back as "recognized" text, so each test file
    /// controls what the parser sees.
    struct EchoOcr;

    impl OcrEngine for EchoOcr {
        fn recognize(&self, image: &[u8]) -> Result<String, crate::error::ExtractionError> {
            Ok(String::from_utf8_lossy(image).to_string())
        }
    }

    struct NoopRasterizer;

    impl PageRasterizer for NoopRasterizer {
        fn rasterize(&self, _path: &Path) -> Result<Vec<Vec<u8>>, crate::error::ExtractionError> {
            Ok(vec![])
        }
    }

    /// Succeeds with GOOD_JSON unless the prompt carries the word
    /// "failme" (planted via file contents through EchoOcr).
    struct KeywordLlm;

    impl LlmClient for KeywordLlm {
        fn complete(&self, _model: &str, prompt: &str) -> Result<String, ParseError> {
            if prompt.contains("failme") {
                Err(ParseError::Backend("backend down".into()))
            } else {
                Ok(GOOD_JSON.to_string())
            }
        }
    }

    type LedgerSink = Rc<RefCell<Vec<Vec<AllocatedRow>>>>;

    struct RecordingLedger {
        appended: LedgerSink,
        fail: bool,
    }

    impl RecordingLedger {
        fn new(fail: bool) -> Self {
            Self {
                appended: Rc::new(RefCell::new(Vec::new())),
                fail,
            }
        }
    }

    impl LedgerWriter for RecordingLedger {
        fn append(&self, rows: &[AllocatedRow]) -> Result<(), WriteError> {
            if self.fail {
                return Err(WriteError::Request("quota exceeded".into()));
            }
            self.appended.borrow_mut().push(rows.to_vec());
            Ok(())
        }
    }

    fn pipeline_with(folder: PathBuf, ledger_fails: bool) -> Pipeline {
        Pipeline::new(
            Extractor::new(Box::new(EchoOcr), Box::new(NoopRasterizer)),
            StructuredParser::new(Box::new(KeywordLlm)),
            Box::new(RecordingLedger::new(ledger_fails)),
            folder,
        )
    }

    fn read_log(folder: &Path) -> String {
        std::fs::read_to_string(folder.join(RUN_LOG_NAME)).unwrap_or_default()
    }

    #[test]
    fn test_successful_file_is_archived_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("costco.jpg"), b"COSTCO receipt text").unwrap();

        let summary = pipeline_with(dir.path().to_path_buf(), false).run().unwrap();

        assert_eq!(summary, RunSummary { processed: 1, archived: 1, errored: 0 });
        assert!(dir.path().join("archive/costco.jpg").exists());
        assert!(!dir.path().join("costco.jpg").exists());
        let log = read_log(dir.path());
        assert!(log.contains("Parsed using gpt-4-turbo"));
        assert!(log.contains("Processed and archived: costco.jpg as RCT-"));
    }

    #[test]
    fn test_failing_file_is_quarantined_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        // "failme" makes every backend fail for this file only.
        std::fs::write(dir.path().join("bad.jpg"), b"failme").unwrap();
        std::fs::write(dir.path().join("good.png"), b"KROGER text").unwrap();

        let summary = pipeline_with(dir.path().to_path_buf(), false).run().unwrap();

        assert_eq!(summary, RunSummary { processed: 2, archived: 1, errored: 1 });
        assert!(dir.path().join("errors/bad.jpg").exists());
        assert!(dir.path().join("archive/good.png").exists());
        let log = read_log(dir.path());
        assert!(log.contains("Failed to process bad.jpg"));
        assert!(log.contains("All model attempts failed"));
    }

    #[test]
    fn test_unrecognized_and_log_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(RUN_LOG_NAME), "[old] entry\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a receipt").unwrap();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let summary = pipeline_with(dir.path().to_path_buf(), false).run().unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(dir.path().join("notes.txt").exists());
        assert!(read_log(dir.path()).contains("[old] entry"));
    }

    #[test]
    fn test_empty_extraction_routes_to_errors_with_reason() {
        // A blank scan: OCR yields empty text, the parser gets nothing it
        // can structure, and the file lands in errors/ with the parse
        // failure in the log.
        struct BlankOcr;
        impl OcrEngine for BlankOcr {
            fn recognize(&self, _image: &[u8]) -> Result<String, crate::error::ExtractionError> {
                Ok(String::new())
            }
        }
        struct NoJsonLlm;
        impl LlmClient for NoJsonLlm {
            fn complete(&self, _model: &str, _prompt: &str) -> Result<String, ParseError> {
                Ok("I could not find a receipt in this text.".to_string())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.webp"), b"").unwrap();
        let pipeline = Pipeline::new(
            Extractor::new(Box::new(BlankOcr), Box::new(NoopRasterizer)),
            StructuredParser::new(Box::new(NoJsonLlm)),
            Box::new(RecordingLedger::new(false)),
            dir.path().to_path_buf(),
        );

        let summary = pipeline.run().unwrap();
        assert_eq!(summary.errored, 1);
        assert!(dir.path().join("errors/blank.webp").exists());
        assert!(read_log(dir.path()).contains("No JSON object"));
    }

    #[test]
    fn test_ledger_failure_is_attributed_to_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("costco.jpg"), b"COSTCO receipt text").unwrap();

        let summary = pipeline_with(dir.path().to_path_buf(), true).run().unwrap();

        assert_eq!(summary, RunSummary { processed: 1, archived: 0, errored: 1 });
        assert!(dir.path().join("errors/costco.jpg").exists());
        assert!(read_log(dir.path()).contains("quota exceeded"));
    }

    #[test]
    fn test_rows_reach_the_ledger_in_receipt_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tj.jpg"), b"TRADER JOES text").unwrap();

        let ledger = RecordingLedger::new(false);
        let sink = Rc::clone(&ledger.appended);
        let pipeline = Pipeline::new(
            Extractor::new(Box::new(EchoOcr), Box::new(NoopRasterizer)),
            StructuredParser::new(Box::new(KeywordLlm)),
            Box::new(ledger),
            dir.path().to_path_buf(),
        );
        pipeline.run().unwrap();

        let batches = sink.borrow();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[0][0].item, "Bananas");
        assert_eq!(batches[0][1].item, "Shampoo");
        assert_eq!(batches[0][1].price_with_tax, 10.00);
    }
}
