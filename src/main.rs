use anyhow::{Context, Result};
use clap::Parser;
use pictoquery::{
    ChatController, Error, ImageDetail, MessageRole, Provider, Session, SessionOptions,
    SubmitAction, SubmitOutcome, get_api_key, get_base_url, get_model, strip_control_chars,
    transcript_html,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};

/// CLI arguments for pictoquery
#[derive(Parser, Debug)]
#[command(name = "pictoquery")]
#[command(about = "Upload an image and ask questions about it")]
#[command(version)]
struct Cli {
    /// Model identifier (defaults to gpt-4o)
    #[arg(long, value_name = "MODEL", env = "PICTOQUERY_MODEL")]
    model: Option<String>,

    /// OpenAI-compatible endpoint, e.g. http://localhost:11434/v1
    #[arg(long, value_name = "URL", env = "PICTOQUERY_BASE_URL")]
    base_url: Option<String>,

    /// Provider shortcut: openai, lmstudio, ollama, llamacpp, vllm
    #[arg(long, value_name = "NAME")]
    provider: Option<String>,

    /// TOML file with an [openai] api_key entry
    #[arg(long, value_name = "PATH")]
    secrets: Option<PathBuf>,

    /// Image to upload before the first question
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Optional system prompt sent before each question
    #[arg(long, value_name = "TEXT")]
    system_prompt: Option<String>,

    /// Image detail hint: low, high or auto
    #[arg(long, value_name = "LEVEL", default_value = "auto")]
    detail: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

const HELP: &str = "\
Commands:
  :upload <path>   upload a jpg, jpeg, png or webp image
  :history         show the transcript
  :export <path>   write the transcript as escaped HTML
  :clear           start over with an empty session
  :quit            exit
Anything else is sent as a question about the current image.";

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let provider = match cli.provider.as_deref() {
        Some(name) => Some(
            Provider::parse(name).with_context(|| format!("unknown provider '{}'", name))?,
        ),
        None => None,
    };
    let base_url = match cli.base_url.as_deref() {
        Some(url) => url.to_string(),
        None => get_base_url(provider, None),
    };
    let api_key = get_api_key(cli.secrets.as_deref())?;
    let detail: ImageDetail = cli.detail.parse()?;

    let mut builder = SessionOptions::builder()
        .model(get_model(cli.model.as_deref(), false))
        .base_url(base_url)
        .api_key(api_key)
        .timeout(cli.timeout)
        .image_detail(detail);
    if let Some(prompt) = cli.system_prompt {
        builder = builder.system_prompt(prompt);
    }
    let options = builder.build()?;

    log::info!("Using model {} at {}", options.model(), options.base_url());
    let controller = ChatController::new(options)?;
    let mut session = Session::new();

    println!("📸 PictoQuery - ask about the uploaded image");
    println!("{}", HELP);

    if let Some(path) = cli.image.as_deref() {
        upload(&controller, &mut session, path).await;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim_end();

        if let Some(command) = line.strip_prefix(':') {
            let (name, arg) = command
                .split_once(char::is_whitespace)
                .map(|(n, a)| (n, a.trim()))
                .unwrap_or((command, ""));
            match name {
                "quit" | "q" => break,
                "upload" if !arg.is_empty() => {
                    upload(&controller, &mut session, Path::new(arg)).await
                }
                "history" => print_history(&session),
                "export" if !arg.is_empty() => {
                    let html = transcript_html(&controller.render_transcript(&session));
                    match tokio::fs::write(arg, html).await {
                        Ok(()) => println!("Transcript written to {}", arg),
                        Err(e) => println!("❌ Error: {}", e),
                    }
                }
                "clear" => {
                    session.clear();
                    println!("Session cleared.");
                }
                _ => println!("{}", HELP),
            }
            continue;
        }

        match controller
            .submit_question(&mut session, line, SubmitAction::Send)
            .await
        {
            Ok(SubmitOutcome::Answered { .. }) => print_history(&session),
            Ok(SubmitOutcome::Ignored(_)) => {}
            Err(e) => report(&e),
        }
    }

    Ok(())
}

async fn upload(controller: &ChatController, session: &mut Session, path: &Path) {
    match controller.upload_image_file(session, path).await {
        Ok(()) => println!("Uploaded {}", path.display()),
        Err(e) => report(&e),
    }
}

/// Terminal output is not markup; control sequences are stripped instead.
fn print_history(session: &Session) {
    println!();
    for message in session.transcript() {
        let role = match message.role() {
            MessageRole::User => "💬 You",
            MessageRole::Assistant => "🤖 GPT",
        };
        println!("{}: {}\n", role, strip_control_chars(message.content()));
    }
}

fn report(err: &Error) {
    if err.is_warning() {
        println!("⚠️ {}", err);
    } else {
        println!("❌ Error: {}", err);
    }
}
