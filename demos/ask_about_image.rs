//! Example: ask two questions about one image, then swap the image
//!
//! Run against any vision-capable OpenAI-compatible server:
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example ask_about_image -- cat.png dog.jpg
//! ```
//!
//! For a local Ollama model, set `PICTOQUERY_BASE_URL=http://localhost:11434/v1`
//! and `PICTOQUERY_MODEL=llava`.

use pictoquery::{
    ChatController, Session, SessionOptions, SubmitAction, SubmitOutcome, get_api_key,
    get_base_url, get_model,
};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let first = args.next().ok_or("usage: ask_about_image <image> [second image]")?;
    let second = args.next();

    let options = SessionOptions::builder()
        .model(get_model(None, true))
        .base_url(get_base_url(None, None))
        .api_key(get_api_key(None)?)
        .build()?;
    let controller = ChatController::new(options)?;
    let mut session = Session::new();

    println!("=== Image 1: {} ===\n", first.display());
    controller.upload_image_file(&mut session, &first).await?;

    for question in ["What is in this image?", "What colours dominate it?"] {
        match controller
            .submit_question(&mut session, question, SubmitAction::Send)
            .await?
        {
            SubmitOutcome::Answered { answer } => println!("Q: {}\nA: {}\n", question, answer),
            SubmitOutcome::Ignored(reason) => println!("(skipped: {:?})", reason),
        }
    }

    if let Some(second) = second {
        // Replaces the first image; later answers only see this one.
        println!("=== Image 2: {} ===\n", second.display());
        controller.upload_image_file(&mut session, &second).await?;

        if let SubmitOutcome::Answered { answer } = controller
            .submit_question(&mut session, "What is in this image?", SubmitAction::Send)
            .await?
        {
            println!("A: {}\n", answer);
        }
    }

    println!("Transcript has {} messages.", session.transcript().len());
    Ok(())
}
