use anyhow::Context;
use aragornic_studio::config::{default_data_dir, StudioConfig};
use aragornic_studio::database::ScriptLength;
use aragornic_studio::metrics::ScriptMetrics;
use aragornic_studio::studio::CreateVideoState;
use aragornic_studio::{Action, Library, LibraryAction, Notice, Severity, Studio};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "aragornic-studio", version, about = "Create narrated videos with AI backends")]
struct Cli {
    /// Directory holding config.yaml, .env and the video store
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read settings from this YAML file instead of <data-dir>/config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// OpenAI API key (overrides .env / OPENAI_API_KEY)
    #[arg(long, global = true)]
    openai_key: Option<String>,

    /// ElevenLabs API key (overrides .env / ELEVENLABS_API_KEY)
    #[arg(long, global = true)]
    elevenlabs_key: Option<String>,

    /// Print the resulting screen state as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend answers
    Ping,
    /// Word count, spoken duration and token estimate of a script
    Metrics {
        /// Read the script from this file instead of the argument
        #[arg(long)]
        file: Option<PathBuf>,
        text: Option<String>,
    },
    /// Generate a video title for a topic
    Title {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        model: Option<String>,
    },
    /// Generate a narration script for a topic
    Script {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        model: Option<String>,
        /// 1m, 2m, 5m, 10m, 20m, 1h or 2h
        #[arg(long)]
        length: Option<ScriptLength>,
        /// Write the script here as well as printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate illustration images for a topic
    Images {
        #[arg(long)]
        topic: String,
        /// 256x256, 512x512 or 1024x1024
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        count: Option<u32>,
    },
    /// List available narration voices
    Voices,
    /// Narrate a script
    Audio {
        #[arg(long)]
        script_file: PathBuf,
        /// Voice id; the first available voice is used when omitted
        #[arg(long)]
        voice: Option<String>,
    },
    /// Upload local images or clips for use in a video
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Assemble the final video from narration and media
    Create {
        #[arg(long)]
        audio_url: String,
        #[arg(long = "media", required = true)]
        media_urls: Vec<String>,
        /// Seconds per media item; media share the narration equally when omitted
        #[arg(long)]
        duration_per_media: Option<String>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        topic: String,
        #[arg(long)]
        script_file: Option<PathBuf>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        length: Option<ScriptLength>,
    },
    /// Download a finished video
    Download {
        #[arg(long)]
        video_url: String,
        /// File name without extension (derived from --title when omitted)
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Ask the backend to render previews for every voice
    Previews,
    /// Manage saved videos
    Videos {
        #[command(subcommand)]
        command: VideosCommand,
    },
    /// Show whether the backend holds a TikTok session
    TiktokStatus,
}

#[derive(Subcommand, Debug)]
enum VideosCommand {
    /// List saved videos, newest first
    List,
    /// Delete a saved video
    Delete { id: String },
    /// Schedule a saved video on TikTok
    Schedule {
        id: String,
        /// e.g. 2024-05-02T09:30
        #[arg(long)]
        at: String,
        /// Calendar day the post must fall on (defaults to the day of --at)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let mut config = match &cli.config {
        Some(path) => StudioConfig::load_from(path, &data_dir)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => StudioConfig::load(&data_dir)
            .with_context(|| format!("loading config from {}", data_dir.display()))?,
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(key) = &cli.openai_key {
        config.openai_api_key = Some(key.clone());
    }
    if let Some(key) = &cli.elevenlabs_key {
        config.elevenlabs_api_key = Some(key.clone());
    }

    let (db, client) = aragornic_studio::open(&config)?;

    let notice = match cli.command {
        Command::Ping => {
            let message = client.ping().await?;
            Notice::success(format!("Backend says: {}", message))
        }
        Command::Metrics { file, text } => {
            let text = match (file, text) {
                (Some(path), _) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, Some(text)) => text,
                (None, None) => anyhow::bail!("give a script text or --file"),
            };
            print_metrics(&ScriptMetrics::of(&text, config.words_per_minute));
            return Ok(ExitCode::SUCCESS);
        }
        Command::Videos { command } => {
            let today = chrono::Local::now().date_naive();
            let mut library = Library::new(client, db, today);
            let notice = match command {
                VideosCommand::List => library.dispatch(LibraryAction::Refresh).await,
                VideosCommand::Delete { id } => {
                    library.dispatch(LibraryAction::Delete(id)).await
                }
                VideosCommand::Schedule { id, at, date } => {
                    let date = date
                        .or_else(|| aragornic_studio::studio::parse_schedule_time(&at).map(|t| t.date()))
                        .unwrap_or(today);
                    library.select_date(date);
                    library.dispatch(LibraryAction::CheckTikTok).await;
                    library
                        .dispatch(LibraryAction::Schedule {
                            id,
                            scheduled_time: at,
                        })
                        .await
                }
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(library.state())?);
            } else {
                for video in &library.state().videos {
                    println!(
                        "{}  {}  [{}]{}",
                        video.id,
                        video.title,
                        video.created_at,
                        video
                            .scheduled_post
                            .as_ref()
                            .map(|at| format!("  scheduled for {}", at))
                            .unwrap_or_default()
                    );
                }
            }
            notice
        }
        Command::TiktokStatus => {
            let today = chrono::Local::now().date_naive();
            let mut library = Library::new(client, db, today);
            library.dispatch(LibraryAction::CheckTikTok).await
        }
        command => {
            let mut state = CreateVideoState {
                openai_api_key: config.openai_api_key.clone().unwrap_or_default(),
                model: config.model.clone(),
                script_length: config.script_length.clone(),
                image_size: config.image_size.clone(),
                num_images: config.num_images,
                ..Default::default()
            };
            let elevenlabs_key = config.elevenlabs_api_key.clone().unwrap_or_default();
            let script_out = match &command {
                Command::Script { out, .. } => out.clone(),
                _ => None,
            };
            let (action, fetch_voices_first) = prepare_create_action(command, &mut state, &elevenlabs_key)?;

            let mut studio = Studio::with_state(client, db, state);
            if fetch_voices_first {
                if let Some(notice) = studio.set_elevenlabs_key(&elevenlabs_key).await {
                    if notice.is_error() {
                        report(&notice);
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }

            let notice = match action {
                Some(action) => studio.dispatch(action).await,
                None => studio
                    .state()
                    .notice
                    .clone()
                    .unwrap_or_else(|| Notice::warning("Please enter your Eleven Labs API key.")),
            };

            if let Some(path) = script_out.filter(|_| !studio.state().script.is_empty()) {
                std::fs::write(&path, &studio.state().script)
                    .with_context(|| format!("writing {}", path.display()))?;
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(studio.state())?);
            } else {
                print_create_state(studio.state(), config.words_per_minute);
            }
            notice
        }
    };

    report(&notice);
    Ok(match notice.severity {
        Severity::Success | Severity::Info => ExitCode::SUCCESS,
        Severity::Warning | Severity::Error => ExitCode::FAILURE,
    })
}

/// Fill the create screen from the command line. Returns the action to run
/// and whether the ElevenLabs key should be entered first (which fetches
/// voices and selects one).
fn prepare_create_action(
    command: Command,
    state: &mut CreateVideoState,
    elevenlabs_key: &str,
) -> anyhow::Result<(Option<Action>, bool)> {
    let read = |path: &PathBuf| {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    };

    let prepared = match command {
        Command::Title { topic, model } => {
            state.topic = topic;
            if let Some(model) = model {
                state.model = model;
            }
            (Some(Action::GenerateTitle), false)
        }
        Command::Script {
            topic,
            model,
            length,
            ..
        } => {
            state.topic = topic;
            if let Some(model) = model {
                state.model = model;
            }
            if let Some(length) = length {
                state.script_length = length;
            }
            (Some(Action::GenerateScript), false)
        }
        Command::Images { topic, size, count } => {
            state.topic = topic;
            if let Some(size) = size {
                state.image_size = size;
            }
            if let Some(count) = count {
                state.num_images = count;
            }
            (Some(Action::GenerateImages), false)
        }
        // Entering the key triggers the fetch on its own
        Command::Voices => (None, true),
        Command::Audio { script_file, voice } => {
            state.script = read(&script_file)?;
            match voice {
                Some(voice) => {
                    state.voice_id = voice;
                    state.elevenlabs_api_key = elevenlabs_key.to_string();
                    (Some(Action::GenerateAudio), false)
                }
                None => (Some(Action::GenerateAudio), true),
            }
        }
        Command::Upload { files } => (Some(Action::UploadMedia(files)), false),
        Command::Create {
            audio_url,
            media_urls,
            duration_per_media,
            title,
            topic,
            script_file,
            model,
            length,
        } => {
            state.audio_url = audio_url;
            state.media_urls = media_urls;
            if let Some(seconds) = duration_per_media {
                state.split_type = aragornic_studio::backend::SplitType::Custom;
                state.duration_per_media = seconds;
            }
            state.title = title;
            state.topic = topic;
            if let Some(path) = script_file {
                state.script = read(&path)?;
            }
            if let Some(model) = model {
                state.model = model;
            }
            if let Some(length) = length {
                state.script_length = length;
            }
            (Some(Action::CreateVideo), false)
        }
        Command::Download {
            video_url,
            name,
            title,
            out,
        } => {
            state.video_url = video_url;
            state.title = title;
            if let Some(name) = name {
                state.file_name = name;
            }
            (Some(Action::DownloadVideo(out)), false)
        }
        Command::Previews => {
            state.elevenlabs_api_key = elevenlabs_key.to_string();
            (Some(Action::GeneratePreviews), false)
        }
        other => anyhow::bail!("{:?} is not a create-screen command", other),
    };
    Ok(prepared)
}

fn report(notice: &Notice) {
    match notice.severity {
        Severity::Success | Severity::Info => println!("{}", notice.message),
        Severity::Warning | Severity::Error => eprintln!("{}", notice.message),
    }
}

fn print_metrics(metrics: &ScriptMetrics) {
    println!("Words:    {}", metrics.words);
    println!("Duration: {}", metrics.duration);
    println!("Tokens:   ~{}", metrics.tokens);
}

fn print_create_state(state: &CreateVideoState, words_per_minute: u32) {
    if !state.title.is_empty() {
        println!("Title: {}", state.title);
    }
    if !state.script.is_empty() {
        println!("{}\n", state.script);
        print_metrics(&state.script_metrics(words_per_minute));
    }
    if !state.voices.is_empty() {
        for voice in &state.voices {
            let marker = if voice.voice_id == state.voice_id { "*" } else { " " };
            println!("{} {}  {}", marker, voice.voice_id, voice.name);
        }
    }
    if !state.audio_url.is_empty() {
        println!("Audio: {}", state.audio_url);
    }
    for (i, url) in state.media_urls.iter().enumerate() {
        println!("Media {}: {}", i, url);
    }
    if !state.video_url.is_empty() {
        println!("Video: {}", state.video_url);
    }
    if let Some(id) = &state.saved_video_id {
        println!("Saved to My Videos as {}", id);
    }
    if let Some(path) = &state.downloaded_path {
        println!("Downloaded to {}", path);
    }
    if state.cost > 0.0 {
        println!("Cost so far: ${:.2}", state.cost);
    }
}
