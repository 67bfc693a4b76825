use crate::error::Result;
use crate::extractor::Extractor;
use crate::ledger::SheetsLedger;
use crate::llm::OpenAiChat;
use crate::parser::StructuredParser;
use crate::pdf::PdfiumRasterizer;
use crate::pipeline::Pipeline;
use crate::settings::{load_settings, shellexpand_path};
use crate::vision::GoogleVisionOcr;

pub fn run(folder: Option<&str>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = folder {
        settings.receipt_folder = shellexpand_path(dir);
    }

    let watched = settings.watched_folder()?;
    let google_token = settings.google_token()?;
    let spreadsheet_id = settings.spreadsheet_id()?;
    let openai_key = settings.openai_api_key()?;

    let extractor = Extractor::new(
        Box::new(GoogleVisionOcr::new(&google_token)),
        Box::new(PdfiumRasterizer),
    );
    let parser = StructuredParser::new(Box::new(OpenAiChat::new(openai_key)));
    let ledger = SheetsLedger::new(&google_token, spreadsheet_id, &settings.items_range);

    let pipeline = Pipeline::new(extractor, parser, Box::new(ledger), watched);
    let summary = pipeline.run()?;

    println!(
        "{} processed: {} archived, {} quarantined",
        summary.processed, summary.archived, summary.errored
    );
    Ok(())
}
