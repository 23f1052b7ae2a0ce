use pet_diagnosis::{
    DiagnosisConfig, HttpInferenceClient, IdentificationReport, IdentifySession, RunResult,
    SelectedImage,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let image_path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: identify_pet <image_path> [base_url]");
        std::process::exit(1);
    });

    let base_url = std::env::args()
        .nth(2)
        .unwrap_or("http://localhost:5000".to_string());

    let config = DiagnosisConfig::builder()
        .with_base_url(&base_url)
        .with_timeout(Duration::from_secs(30))
        .build()?;
    let session = IdentifySession::new(Arc::new(HttpInferenceClient::new(config)));

    println!("Identifying {} via {}...", image_path, base_url);

    let terminal = match session.select_image(SelectedImage::from_gallery(image_path)).await {
        RunResult::Completed(terminal) => terminal,
        RunResult::Superseded => return Ok(()),
        RunResult::Rejected(notice) => {
            eprintln!("{}: {}", notice.title, notice.message);
            return Ok(());
        }
    };

    if let Some(notice) = &terminal.notice {
        eprintln!("{}: {}", notice.title, notice.message);
    }

    if let Some(report) = IdentificationReport::from_outcome(&terminal.outcome) {
        println!("Classification: {}", report.classification_line());
        match &report.breed {
            Some(breed) => println!("Breed: {} (Confidence: {})", breed, report.breed_confidence),
            None => println!("Breed: unavailable"),
        }
    }

    Ok(())
}
