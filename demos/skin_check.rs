use pet_diagnosis::{
    DiagnosisConfig, HttpInferenceClient, RunResult, SelectedImage, SkinOutcome, SkinReport,
    SkinSession,
};
use std::sync::Arc;

/// Runs skin-condition detection on one photo and prints the findings
/// together with the address of the annotated image.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let image_path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: skin_check <image_path> [base_url]");
        std::process::exit(1);
    });

    let base_url = std::env::args()
        .nth(2)
        .unwrap_or("http://localhost:5000".to_string());

    let config = DiagnosisConfig::builder().with_base_url(&base_url).build()?;
    let session = SkinSession::new(Arc::new(HttpInferenceClient::new(config)));

    println!("Checking {} for skin conditions...", image_path);

    let terminal = match session.analyze(SelectedImage::from_camera(image_path)).await {
        RunResult::Completed(terminal) => terminal,
        RunResult::Superseded => return Ok(()),
        RunResult::Rejected(notice) => {
            eprintln!("{}: {}", notice.title, notice.message);
            return Ok(());
        }
    };

    if let Some(notice) = &terminal.notice {
        println!("{}: {}", notice.title, notice.message);
    }

    if let SkinOutcome::Detected { detections, .. } = &terminal.outcome {
        println!("\nDetections ({}):", detections.len());
        for detection in detections {
            match detection.region {
                Some(r) => println!(
                    "  - {} at ({:.0}, {:.0})-({:.0}, {:.0})",
                    detection.label, r.x_min, r.y_min, r.x_max, r.y_max
                ),
                None => println!("  - {}", detection.label),
            }
        }
    }

    if let Some(report) = SkinReport::from_outcome(&terminal.outcome) {
        println!("Condition: {}", report.conditions);
        if let Some(url) = &report.annotated_image_url {
            println!("Annotated image: {}", url);
        }
    }

    Ok(())
}
